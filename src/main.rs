// Copyright 2020 TwoCookingMice

use neecache::cache::diagnostics;
use neecache::cache::mis::{combine, solid_angle_pdf, StrategySample};
use neecache::cache::{CacheDriver, FrameContext, Observation, PointResult, ShadingPoint};
use neecache::core::config::NeeCacheConfig;
use neecache::core::config_loader::load_config;
use neecache::core::emitter::{EmitterList, EmitterTable, TriangleId};
use neecache::core::error::{NeeCacheError, Result};
use neecache::core::rng::LcgRng;
use neecache::emitters::triangle::TriangleLight;
use neecache::io::{exr_utils, obj_utils};
use neecache::math::aabb::AABB;
use neecache::math::constants::{Float, Vector3f, PI};
use neecache::math::spectrum::RGBSpectrum;
use neecache::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use std::env;

struct Options {
    config_path: String,
    lights_path: String,
    output_path: String,
    frames: u64,
    points: usize,
    seed: u64,
    radiance: RGBSpectrum,
}

fn parse_radiance(value: &str) -> Option<RGBSpectrum> {
    let parts: Vec<Float> = value.split(',').filter_map(|v| v.trim().parse::<Float>().ok()).collect();
    match parts.as_slice() {
        [v] => Some(RGBSpectrum::new(*v, *v, *v)),
        [r, g, b] => Some(RGBSpectrum::new(*r, *g, *b)),
        _ => None,
    }
}

fn parse_options(args: &[String]) -> Option<Options> {
    if args.len() < 4 {
        return None;
    }

    let mut options = Options {
        config_path: args[1].clone(),
        lights_path: args[2].clone(),
        output_path: args[3].clone(),
        frames: 64,
        points: 16384,
        seed: 0,
        radiance: RGBSpectrum::new(1.0, 1.0, 1.0),
    };

    let mut i = 4;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" => {
                i += 1;
                options.frames = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(options.frames);
            }
            "--points" => {
                i += 1;
                options.points = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(options.points);
            }
            "--seed" => {
                i += 1;
                options.seed = args.get(i).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
            }
            "--radiance" => {
                i += 1;
                match args.get(i).and_then(|v| parse_radiance(v)) {
                    Some(radiance) => options.radiance = radiance,
                    None => log::warn!("Ignoring malformed --radiance, expected r,g,b."),
                }
            }
            other => log::warn!("Ignoring unknown argument: {}.", other),
        }
        i += 1;
    }
    Some(options)
}

fn sample_uniform_sphere(rng: &mut LcgRng) -> Vector3f {
    let z = 1.0 - 2.0 * rng.next_f32();
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * rng.next_f32();
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

// Brute force closest emitter along a ray; the demo scene has no other geometry.
fn nearest_hit<'a>(emitters: &'a EmitterList, origin: &Vector3f, dir: &Vector3f) -> Option<(TriangleId, &'a TriangleLight, Float)> {
    let mut nearest: Option<(TriangleId, &TriangleLight, Float)> = None;
    for (id, triangle) in emitters.iter() {
        if let Some(t) = triangle.intersect(origin, dir, Float::MAX) {
            if nearest.map_or(true, |(_, _, best)| t < best) {
                nearest = Some((*id, triangle, t));
            }
        }
    }
    nearest
}

fn light_pdf(driver: &CacheDriver, config: &NeeCacheConfig, result: &PointResult,
             id: TriangleId, triangle: &TriangleLight, distance: Float, wi: &Vector3f) -> Float {
    let p_select = driver.selection_probability(config, result, id);
    let cos_light = triangle.geometric_normal().dot(wi);
    p_select * solid_angle_pdf(1.0 / triangle.area(), distance, cos_light)
}

// Direct irradiance at an upward facing point, combining the cache and cosine sampling.
fn estimate_irradiance(driver: &CacheDriver, config: &NeeCacheConfig, emitters: &EmitterList,
                       point: &ShadingPoint, result: &PointResult, rng: &mut LcgRng) -> Float {
    let origin = point.position;

    let cache_sample = result.sample.and_then(|picked| {
        let triangle = emitters.triangle(picked.triangle_id)?;
        let (y, _) = triangle.sample_position(&rng.next_2d());
        let offset = y - origin;
        let distance = offset.norm();
        if distance <= 0.0 {
            return None;
        }
        let wi = offset / distance;
        let visible = matches!(nearest_hit(emitters, &origin, &wi), Some((id, _, _)) if id == picked.triangle_id);
        let cos_surface = wi.z.max(0.0);
        Some(StrategySample {
            value: if visible { triangle.radiance().as_vec() * cos_surface } else { Vector3f::zeros() },
            pdf: light_pdf(driver, config, result, picked.triangle_id, triangle, distance, &wi),
            other_pdf: sample_cosine_hemisphere_pdf(cos_surface),
        })
    });

    let wi = sample_cosine_hemisphere(&rng.next_2d());
    let bsdf_sample = nearest_hit(emitters, &origin, &wi).map(|(id, triangle, t)| StrategySample {
        value: triangle.radiance().as_vec() * wi.z,
        pdf: sample_cosine_hemisphere_pdf(wi.z),
        other_pdf: light_pdf(driver, config, result, id, triangle, t, &wi),
    });

    let contribution = combine(cache_sample.as_ref(), bsdf_sample.as_ref(), config.enable_mis, config.mis_heuristic);
    RGBSpectrum::from_vec(contribution).luminance()
}

fn simulate_points(emitters: &EmitterList, domain: &AABB, frame_index: u64, seed: u64, count: usize) -> Vec<ShadingPoint> {
    (0..count)
        .into_par_iter()
        .map(|i| {
            let mut rng = LcgRng::for_point(frame_index ^ seed.rotate_left(32), i as u64);
            let position = domain.lerp(&Vector3f::new(rng.next_f32(), rng.next_f32(), rng.next_f32()));
            let dir = sample_uniform_sphere(&mut rng);
            let observation = nearest_hit(emitters, &position, &dir).map(|(triangle_id, _, _)| Observation {
                triangle_id,
                radiance_estimate: None,
            });
            ShadingPoint { position, bounce: rng.next_index(3) as u32, observation }
        })
        .collect()
}

fn run(options: &Options) -> Result<()> {
    let config = load_config(&options.config_path)?;
    let emitters = obj_utils::load_emitters_from_file(&options.lights_path, options.radiance)?;
    if emitters.is_empty() {
        return Err(NeeCacheError::Parse(format!("no emissive triangles in {}", options.lights_path)));
    }

    let mut domain = AABB::default();
    for (_, triangle) in emitters.iter() {
        domain.expand_by_aabb(&triangle.bounding_box());
    }
    let extent = domain.diagnal().max();
    domain.dilate(0.5 * extent);
    let frame_base = FrameContext { frame_index: 0, domain_center: domain.center() };

    let mut driver = CacheDriver::new(&config);
    let progress = ProgressBar::new(options.frames);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut last_frame: Option<(FrameContext, Vec<ShadingPoint>, Vec<PointResult>)> = None;
    for frame_index in 0..options.frames {
        let frame = FrameContext { frame_index, ..frame_base };
        let points = simulate_points(&emitters, &domain, frame_index, options.seed, options.points);
        let output = driver.run_frame(&config, &frame, &points, &emitters);
        last_frame = Some((frame, points, output.results));
        progress.inc(1);
    }
    progress.finish_and_clear();

    let grid = CacheDriver::grid(&config, &frame_base);
    let snapshot = diagnostics::snapshot(driver.cache(), &grid);
    log::info!(
        "Cache after {} frames: {} occupied cells, {} candidates, {:.2} per occupied cell.",
        driver.frames(),
        snapshot.occupied_cells,
        snapshot.total_candidates,
        snapshot.mean_candidates_per_occupied_cell()
    );

    if let Some((frame, points, results)) = last_frame {
        let total: f64 = points
            .par_iter()
            .zip(results.par_iter())
            .enumerate()
            .map(|(i, (point, result))| {
                let mut rng = LcgRng::for_point(frame.frame_index.wrapping_add(1) ^ options.seed, i as u64);
                estimate_irradiance(&driver, &config, &emitters, point, result, &mut rng) as f64
            })
            .sum();
        log::info!("Mean direct irradiance over {} points: {:.6}.", points.len(), total / points.len().max(1) as f64);
    }

    let resolution = grid.resolution();
    let slice = diagnostics::z_slice(driver.cache(), &grid, resolution / 2);
    exr_utils::write_exr_to_file(&slice, resolution, resolution, &options.output_path)
}

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let options = match parse_options(&args) {
        Some(options) => options,
        None => {
            eprintln!("Usage: {} <config.xml> <lights.obj> <heatmap.exr> [--frames N] [--points N] [--seed N] [--radiance r,g,b]", args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&options) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
