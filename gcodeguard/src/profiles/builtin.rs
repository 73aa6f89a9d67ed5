//! Built-in and External Material Profiles
//!
//! Profiles are loaded from:
//! 1. JSON files embedded into the binary (the five stock materials)
//! 2. External JSON files in a user-supplied directory (overlays)
//!
//! Users can add or override materials by dropping JSON files into a
//! directory without recompiling.

use crate::profiles::schema::*;
use std::path::Path;

const EMBEDDED_PLA: &str = include_str!("../../materials/pla.json");
const EMBEDDED_PETG: &str = include_str!("../../materials/petg.json");
const EMBEDDED_ABS: &str = include_str!("../../materials/abs.json");
const EMBEDDED_TPU: &str = include_str!("../../materials/tpu.json");
const EMBEDDED_ASA: &str = include_str!("../../materials/asa.json");
const EMBEDDED_SAFE_RANGES: &str = include_str!("../../materials/safe_ranges.json");

/// Get all material profiles from embedded JSON files
pub fn get_builtin_materials() -> Vec<MaterialProfile> {
    let embedded_jsons = [
        EMBEDDED_PLA,
        EMBEDDED_PETG,
        EMBEDDED_ABS,
        EMBEDDED_TPU,
        EMBEDDED_ASA,
    ];

    let mut materials = Vec::new();

    for json_str in embedded_jsons {
        match serde_json::from_str::<MaterialProfile>(json_str) {
            Ok(profile) => materials.push(profile),
            Err(e) => {
                tracing::warn!("Failed to parse embedded material profile: {}", e);
            }
        }
    }

    materials
}

/// Get the embedded safe range table
pub fn get_builtin_safe_ranges() -> SafeRangeTable {
    match serde_json::from_str::<Vec<SafeRange>>(EMBEDDED_SAFE_RANGES) {
        Ok(ranges) => SafeRangeTable::new(ranges),
        Err(e) => {
            tracing::warn!("Failed to parse embedded safe ranges: {}", e);
            SafeRangeTable::default()
        }
    }
}

/// Load material profiles from a directory of JSON files
/// Returns both successfully loaded profiles and any errors encountered
pub fn load_materials_from_directory(dir: &Path) -> (Vec<MaterialProfile>, Vec<String>) {
    let mut materials = Vec::new();
    let mut errors = Vec::new();

    if !dir.is_dir() {
        errors.push(format!("Not a directory: {}", dir.display()));
        return (materials, errors);
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(format!("Failed to read directory {}: {}", dir.display(), e));
            return (materials, errors);
        }
    };

    let mut paths: Vec<_> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();

    for path in paths {
        if path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }

        match load_material_from_file(&path) {
            Ok(profile) => {
                tracing::info!("Loaded material {} from {:?}", profile.name, path.file_name());
                materials.push(profile);
            }
            Err(e) => {
                let error_msg = format!("Failed to load {:?}: {}", path.file_name(), e);
                tracing::warn!("{}", error_msg);
                errors.push(error_msg);
            }
        }
    }

    (materials, errors)
}

/// Load a single material profile from a JSON file
pub fn load_material_from_file(path: &Path) -> Result<MaterialProfile, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;

    let profile: MaterialProfile =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse JSON: {}", e))?;

    if profile.nozzle_min_c > profile.nozzle_max_c {
        return Err(format!(
            "nozzle_min_c {} exceeds nozzle_max_c {}",
            profile.nozzle_min_c, profile.nozzle_max_c
        ));
    }

    Ok(profile)
}
