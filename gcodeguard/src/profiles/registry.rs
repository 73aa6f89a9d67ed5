use std::collections::BTreeMap;
use std::path::Path;

use crate::profiles::builtin::{
    get_builtin_materials, get_builtin_safe_ranges, load_materials_from_directory,
};
use crate::profiles::schema::{MaterialProfile, SafeRangeTable, DEFAULT_MATERIAL};

/// Immutable lookup of material profiles and safe ranges.
///
/// Built once and shared by reference into every analysis pass.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    materials: BTreeMap<String, MaterialProfile>,
    safe_ranges: SafeRangeTable,
    fallback: MaterialProfile,
}

impl ProfileRegistry {
    pub fn new(materials: Vec<MaterialProfile>, safe_ranges: SafeRangeTable) -> Self {
        let materials: BTreeMap<_, _> = materials
            .into_iter()
            .map(|m| (m.name.clone(), m))
            .collect();
        let fallback = materials
            .get(DEFAULT_MATERIAL)
            .cloned()
            .unwrap_or_default();
        Self {
            materials,
            safe_ranges,
            fallback,
        }
    }

    /// Stock materials and safe ranges.
    pub fn builtin() -> Self {
        Self::new(get_builtin_materials(), get_builtin_safe_ranges())
    }

    /// Stock registry overlaid with every profile found in `dir`.
    /// Files that fail to load are reported, not fatal.
    pub fn with_directory(dir: &Path) -> (Self, Vec<String>) {
        let (extra, errors) = load_materials_from_directory(dir);
        let mut materials = get_builtin_materials();
        materials.extend(extra);
        (Self::new(materials, get_builtin_safe_ranges()), errors)
    }

    pub fn get(&self, name: &str) -> Option<&MaterialProfile> {
        self.materials.get(name)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    /// Profile for `name`, or the PLA thresholds for unknown names.
    pub fn resolve(&self, name: &str) -> &MaterialProfile {
        self.materials.get(name).unwrap_or(&self.fallback)
    }

    pub fn materials(&self) -> impl Iterator<Item = &MaterialProfile> {
        self.materials.values()
    }

    pub fn safe_ranges(&self) -> &SafeRangeTable {
        &self.safe_ranges
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
