// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::config::{MisHeuristic, NeeCacheConfig};
use crate::core::error::{NeeCacheError, Result};
use crate::math::constants::Float;

// Options are read from a `<neeCache>` block:
//
//   <neeCache>
//       <boolean name="enableRandomReplacement" value="true"/>
//       <float name="range" value="$range"/>
//   </neeCache>
//
// `<default name=".." value=".."/>` entries define `$name` substitutions.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<NeeCacheConfig> {
    let path = path.as_ref();
    log::info!("Loading NEE cache options from: {}.", path.display());
    let xml = fs::read_to_string(path)?;
    parse_config(&xml)
}

pub fn parse_config(xml: &str) -> Result<NeeCacheConfig> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut defaults: HashMap<String, String> = HashMap::new();
    let mut config = NeeCacheConfig::default();
    let mut in_cache = false;
    let mut found_cache = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) if e.name().as_ref() == b"neeCache" => {
                in_cache = true;
                found_cache = true;
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"neeCache" => {
                in_cache = false;
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"neeCache" => {
                found_cache = true;
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let tag = e.name().as_ref().to_vec();
                match tag.as_slice() {
                    b"default" => {
                        let (key, value) = name_value(&e)?;
                        if let (Some(k), Some(v)) = (key, value) {
                            defaults.insert(k, v);
                        }
                    }
                    b"boolean" | b"float" | b"integer" | b"string" if in_cache => {
                        let kind = String::from_utf8_lossy(&tag).to_string();
                        let (key, value) = name_value(&e)?;
                        let key = key.ok_or_else(|| NeeCacheError::Parse(format!("<{}> without a name", kind)))?;
                        let value = value.ok_or_else(|| NeeCacheError::Parse(format!("option `{}` has no value", key)))?;
                        let value = resolve_value(&value, &defaults);
                        apply_option(&mut config, &kind, &key, &value)?;
                    }
                    _ => {}
                }
            }
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }

    if !found_cache {
        log::warn!("No <neeCache> block found, using default NEE cache options.");
    }

    config.validate()?;
    Ok(config)
}

fn name_value(e: &BytesStart) -> Result<(Option<String>, Option<String>)> {
    let mut key: Option<String> = None;
    let mut value: Option<String> = None;
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"name" => key = Some(attr.unescape_value()?.to_string()),
            b"value" => value = Some(attr.unescape_value()?.to_string()),
            _ => {}
        }
    }
    Ok((key, value))
}

fn apply_option(config: &mut NeeCacheConfig, kind: &str, name: &str, value: &str) -> Result<()> {
    match name {
        "enable" => config.enable = parse_bool(kind, name, value)?,
        "enableImportanceSampling" => config.enable_importance_sampling = parse_bool(kind, name, value)?,
        "enableMIS" => config.enable_mis = parse_bool(kind, name, value)?,
        "enableJittering" => config.enable_jittering = parse_bool(kind, name, value)?,
        "enableInFirstBounce" => config.enable_in_first_bounce = parse_bool(kind, name, value)?,
        "enableInSecondAndMoreBounces" => {
            config.enable_in_second_and_more_bounces = parse_bool(kind, name, value)?
        }
        "enableRandomReplacement" => config.enable_random_replacement = parse_bool(kind, name, value)?,
        "range" => config.range = parse_float(kind, name, value)?,
        "emissiveTextureSampleFootprintSize" => {
            config.emissive_texture_sample_footprint_size = parse_float(kind, name, value)?
        }
        "ageCullingSpeed" => config.age_culling_speed = parse_float(kind, name, value)?,
        "scoreBlendFactor" => config.score_blend_factor = parse_float(kind, name, value)?,
        "cullThreshold" => config.cull_threshold = parse_float(kind, name, value)?,
        "resolution" => config.resolution = parse_usize(kind, name, value)?,
        "candidateCapacity" => config.candidate_capacity = parse_usize(kind, name, value)?,
        "misHeuristic" => {
            expect_kind(kind, "string", name)?;
            config.mis_heuristic = MisHeuristic::from_name(value)
                .ok_or_else(|| NeeCacheError::Parse(format!("unknown MIS heuristic: {}", value)))?;
        }
        _ => return Err(NeeCacheError::Parse(format!("unknown NEE cache option: {}", name))),
    }
    Ok(())
}

fn expect_kind(kind: &str, expected: &str, name: &str) -> Result<()> {
    if kind == expected {
        Ok(())
    } else {
        Err(NeeCacheError::Parse(format!("option `{}` must be a <{}>, found <{}>", name, expected, kind)))
    }
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn parse_bool(kind: &str, name: &str, value: &str) -> Result<bool> {
    expect_kind(kind, "boolean", name)?;
    value.parse::<bool>().map_err(|_| NeeCacheError::Parse(format!("invalid boolean: {}", value)))
}

fn parse_float(kind: &str, name: &str, value: &str) -> Result<Float> {
    expect_kind(kind, "float", name)?;
    value.parse::<Float>().map_err(|_| NeeCacheError::Parse(format!("invalid float: {}", value)))
}

fn parse_usize(kind: &str, name: &str, value: &str) -> Result<usize> {
    expect_kind(kind, "integer", name)?;
    value.parse::<usize>().map_err(|_| NeeCacheError::Parse(format!("invalid integer: {}", value)))
}
