// Copyright @yucwang 2026

use std::fs;
use std::path::Path;

use wavefront_obj::obj;

use crate::core::emitter::{EmitterList, EmitterTable, TriangleId};
use crate::core::error::{NeeCacheError, Result};
use crate::emitters::triangle::TriangleLight;
use crate::math::constants::Vector3f;
use crate::math::spectrum::RGBSpectrum;

pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<obj::ObjSet> {
    let triangulated = triangulate_faces(input.as_ref());
    Ok(obj::parse(triangulated)?)
}

pub fn load_obj_from_file<P: AsRef<Path>>(path: P) -> Result<obj::ObjSet> {
    let data = fs::read_to_string(path)?;
    load_obj_from_str(data)
}

/// Turns every triangle of every object into an emitter of uniform `radiance`.
///
/// Each OBJ object becomes one surface, and its triangles are numbered in file
/// order. Zero-area triangles keep their primitive index but are left out.
pub fn emitters_from_obj(obj_set: &obj::ObjSet, radiance: RGBSpectrum) -> Result<EmitterList> {
    let mut emitters = EmitterList::new();
    let mut degenerate = 0;

    for (surface, object) in obj_set.objects.iter().enumerate() {
        let vertices: Vec<Vector3f> = object
            .vertices
            .iter()
            .map(|v| Vector3f::new(v.x as f32, v.y as f32, v.z as f32))
            .collect();
        let vertex = |idx: usize| {
            vertices.get(idx).cloned().ok_or_else(|| {
                NeeCacheError::Parse(format!("object `{}` references missing vertex {}", object.name, idx))
            })
        };

        let mut primitive = 0u32;
        for geom in object.geometry.iter() {
            for shape in geom.shapes.iter() {
                if let obj::Primitive::Triangle(a, b, c) = shape.primitive {
                    let triangle = TriangleLight::new(vertex(a.0)?, vertex(b.0)?, vertex(c.0)?, radiance);
                    if triangle.area() > 0.0 {
                        emitters.insert(TriangleId::new(surface as u32, primitive), triangle);
                    } else {
                        degenerate += 1;
                    }
                    primitive += 1;
                }
            }
        }
    }

    if degenerate > 0 {
        log::warn!("Skipped {} degenerate emissive triangles.", degenerate);
    }
    Ok(emitters)
}

pub fn load_emitters_from_file<P: AsRef<Path>>(path: P, radiance: RGBSpectrum) -> Result<EmitterList> {
    log::info!("Loading emissive triangles from: {}.", path.as_ref().display());
    let obj_set = load_obj_from_file(path)?;
    let emitters = emitters_from_obj(&obj_set, radiance)?;
    log::info!("Loaded {} emissive triangles from {} objects.", emitters.len(), obj_set.objects.len());
    Ok(emitters)
}

fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for i in 2..(parts.len() - 1) {
                    out.push_str("f ");
                    out.push_str(base);
                    out.push(' ');
                    out.push_str(parts[i]);
                    out.push(' ');
                    out.push_str(parts[i + 1]);
                    out.push('\n');
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quads_are_split_into_emitters() {
        let input = "\
o lamp
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
f 1 2 3 4
";
        let obj_set = load_obj_from_str(input).expect("failed to parse obj");
        let emitters = emitters_from_obj(&obj_set, RGBSpectrum::new(1.0, 2.0, 3.0)).expect("failed to build emitters");
        assert_eq!(emitters.len(), 2);
        let total: f32 = emitters.iter().map(|(_, t)| t.area()).sum();
        assert!((total - 1.0).abs() < 1e-6);
        let second = emitters.triangle(TriangleId::new(0, 1)).expect("second triangle");
        assert_eq!(second.radiance(), RGBSpectrum::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_objects_map_to_surfaces() {
        let input = "\
o a
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
o b
v 0.0 0.0 5.0
v 2.0 0.0 5.0
v 0.0 2.0 5.0
v 4.0 4.0 5.0
f 4 5 6
f 4 5 4
";
        let obj_set = load_obj_from_str(input).expect("failed to parse obj");
        let emitters = emitters_from_obj(&obj_set, RGBSpectrum::new(1.0, 1.0, 1.0)).expect("failed to build emitters");
        assert_eq!(emitters.len(), 2);
        let b = emitters.triangle(TriangleId::new(1, 0)).expect("surface 1 triangle");
        assert!((b.area() - 2.0).abs() < 1e-6);
        // face indices count vertices across the whole file
        assert_eq!(b.vertices().0, Vector3f::new(0.0, 0.0, 5.0));
        // the degenerate face keeps its slot but is not an emitter
        assert!(emitters.triangle(TriangleId::new(1, 1)).is_none());
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = load_obj_from_str("v 0.0 zero 0.0\n").expect_err("should not parse");
        assert!(matches!(err, NeeCacheError::ObjParse { .. }));
    }
}
