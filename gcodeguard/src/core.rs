//! Core analysis logic shared by the library API and the CLI.
//!
//! [`GCodeGuardCore`] owns the profile registry and merges the validator,
//! anomaly detector, metrics calculator and recommendation generator into
//! one [`AnalysisReport`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analyzer::anomalies::{Anomaly, AnomalyCounts, AnomalyDetector, AnomalyReport};
use crate::analyzer::metrics::{DetailedMetrics, FilamentParameters, MetricsCalculator, PrintMetrics};
use crate::analyzer::recommendations::{
    PriorityCounts, Recommendation, RecommendationGenerator, RecommendationReport,
};
use crate::analyzer::statistics::Statistics;
use crate::analyzer::validator::{Issue, ValidationReport, Validator};
use crate::parser::{CommandLine, GcodeParser};
use crate::profiles::{ProfileRegistry, DEFAULT_MATERIAL};

pub const DEFAULT_PRINTER_PROFILE: &str = "Ender3";

#[derive(Debug, thiserror::Error)]
pub enum GCodeGuardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Options for analysis runs (library or CLI).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub material: String,
    /// Echoed in reports; no threshold depends on it yet.
    pub printer_profile: String,
    pub filament: FilamentParameters,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            material: DEFAULT_MATERIAL.to_string(),
            printer_profile: DEFAULT_PRINTER_PROFILE.to_string(),
            filament: FilamentParameters::default(),
        }
    }
}

impl AnalysisOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, GCodeGuardError> {
        let content = std::fs::read_to_string(path)?;
        let options: AnalysisOptions = serde_json::from_str(&content).map_err(|e| {
            GCodeGuardError::Config(format!("{}: {}", path.display(), e))
        })?;
        options.filament.validate()?;
        Ok(options)
    }
}

/// Everything known about one G-code program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub anomalies: Vec<Anomaly>,
    pub anomaly_count: usize,
    pub anomalies_by_kind: AnomalyCounts,
    pub statistics: Statistics,
    pub metrics: PrintMetrics,
    pub detailed_metrics: DetailedMetrics,
    pub recommendations: Vec<Recommendation>,
    pub recommendation_count: usize,
    pub recommendations_by_priority: PriorityCounts,
    pub command_count: usize,
    pub material: String,
    pub printer_profile: String,
}

impl AnalysisReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_errors_or_warnings(&self) -> bool {
        self.has_errors() || !self.warnings.is_empty()
    }

    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }
}

/// Per-file analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub file: PathBuf,
    pub analyzed_at: DateTime<Utc>,
    pub report: AnalysisReport,
}

/// Recursively discover G-code files in a directory.
pub fn discover_gcode_files(dir: &Path) -> Result<Vec<PathBuf>, GCodeGuardError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), GCodeGuardError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "node_modules" || name == "target" || name == "build" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() {
            if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
                match ext.to_ascii_lowercase().as_str() {
                    "gcode" | "gco" | "g" => files.push(path),
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

/// Core analysis API used by both the library and the CLI.
#[derive(Debug, Clone, Default)]
pub struct GCodeGuardCore {
    registry: Arc<ProfileRegistry>,
}

impl GCodeGuardCore {
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Rule checks plus the nozzle temperature sequence check. Sequencing
    /// issues are reported as warnings but still clear `valid`.
    pub fn validate(
        &self,
        lines: &[CommandLine],
        material: &str,
        printer_profile: &str,
    ) -> ValidationReport {
        let mut report =
            Validator::with_default_rules(&self.registry).validate(lines, material, printer_profile);
        let sequence = Validator::check_temperature_sequence(lines);
        report.valid = report.valid && sequence.clean;
        report.warnings.extend(sequence.issues);
        report
    }

    pub fn detect_anomalies(&self, lines: &[CommandLine]) -> AnomalyReport {
        AnomalyDetector::detect(lines)
    }

    pub fn calculate_metrics(&self, lines: &[CommandLine], filament: &FilamentParameters) -> PrintMetrics {
        MetricsCalculator::estimate(lines, filament)
    }

    pub fn detailed_metrics(
        &self,
        lines: &[CommandLine],
        filament: &FilamentParameters,
    ) -> DetailedMetrics {
        MetricsCalculator::detailed(lines, filament)
    }

    pub fn recommendations(
        &self,
        lines: &[CommandLine],
        material: &str,
        printer_profile: &str,
    ) -> RecommendationReport {
        RecommendationGenerator::new(&self.registry).generate(lines, material, printer_profile)
    }

    /// Parse and analyze a complete program.
    pub fn analyze(&self, content: &str, options: &AnalysisOptions) -> AnalysisReport {
        let lines = GcodeParser::parse(content);
        self.analyze_lines(&lines, options)
    }

    /// Analyze an already parsed program. The four passes are independent
    /// and run in parallel over the same slice.
    pub fn analyze_lines(&self, lines: &[CommandLine], options: &AnalysisOptions) -> AnalysisReport {
        let material = options.material.as_str();
        let printer_profile = options.printer_profile.as_str();
        if !self.registry.is_known(material) {
            tracing::warn!(
                "Unknown material '{}', using {} thresholds",
                material,
                DEFAULT_MATERIAL
            );
        }

        let ((validation, anomalies), (detailed, recommendations)) = rayon::join(
            || {
                rayon::join(
                    || self.validate(lines, material, printer_profile),
                    || self.detect_anomalies(lines),
                )
            },
            || {
                rayon::join(
                    || self.detailed_metrics(lines, &options.filament),
                    || self.recommendations(lines, material, printer_profile),
                )
            },
        );

        AnalysisReport {
            valid: validation.valid,
            errors: validation.errors,
            warnings: validation.warnings,
            anomaly_count: anomalies.count(),
            anomalies_by_kind: anomalies.by_kind,
            anomalies: anomalies.anomalies,
            statistics: Statistics::collect(lines),
            metrics: detailed.basic,
            detailed_metrics: detailed,
            recommendation_count: recommendations.count,
            recommendations_by_priority: recommendations.by_priority,
            recommendations: recommendations.recommendations,
            command_count: lines.len(),
            material: validation.material,
            printer_profile: validation.printer_profile,
        }
    }

    /// Read, parse and analyze a single file.
    pub fn analyze_file(
        &self,
        path: &Path,
        options: &AnalysisOptions,
    ) -> Result<FileAnalysis, GCodeGuardError> {
        let lines = GcodeParser::parse_file(path)?;
        let report = self.analyze_lines(&lines, options);
        tracing::info!(
            "Analyzed {}: {} commands, {} errors, {} warnings",
            path.display(),
            report.command_count,
            report.errors.len(),
            report.warnings.len()
        );
        Ok(FileAnalysis {
            file: path.to_path_buf(),
            analyzed_at: Utc::now(),
            report,
        })
    }

    /// Analyze every G-code file under `dir`, in parallel. The first read
    /// failure aborts the run.
    pub fn analyze_project(
        &self,
        dir: &Path,
        options: &AnalysisOptions,
    ) -> Result<Vec<FileAnalysis>, GCodeGuardError> {
        let files = discover_gcode_files(dir)?;
        files
            .par_iter()
            .map(|path| self.analyze_file(path, options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_options() {
        let options = AnalysisOptions::default();
        assert_eq!(options.material, "PLA");
        assert_eq!(options.printer_profile, "Ender3");
        assert_eq!(options.filament, FilamentParameters::default());
    }

    #[test]
    fn test_options_from_partial_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, r#"{"material": "PETG", "filament": {"diameter_mm": 2.85}}"#).unwrap();

        let options = AnalysisOptions::from_json_file(&path).unwrap();
        assert_eq!(options.material, "PETG");
        assert_eq!(options.printer_profile, "Ender3");
        assert_eq!(options.filament.diameter_mm, 2.85);
        assert_eq!(options.filament.density_g_cm3, 1.24);
    }

    #[test]
    fn test_options_reject_bad_json_and_values() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ material: ").unwrap();
        assert!(matches!(
            AnalysisOptions::from_json_file(&broken),
            Err(GCodeGuardError::Config(_))
        ));

        let negative = dir.path().join("negative.json");
        fs::write(&negative, r#"{"filament": {"density_g_cm3": -1}}"#).unwrap();
        assert!(matches!(
            AnalysisOptions::from_json_file(&negative),
            Err(GCodeGuardError::Config(_))
        ));

        assert!(matches!(
            AnalysisOptions::from_json_file(&dir.path().join("missing.json")),
            Err(GCodeGuardError::Io(_))
        ));
    }

    #[test]
    fn test_temperature_sequence_clears_validity() {
        let core = GCodeGuardCore::default();
        let lines = GcodeParser::parse("M104 S140\nM104 S200");
        let report = core.validate(&lines, "PLA", "Ender3");
        assert!(report.errors.is_empty());
        assert!(!report.valid);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.rule_id == "temperature_sequence"));
    }

    #[test]
    fn test_analyze_echoes_unknown_material() {
        let core = GCodeGuardCore::default();
        let options = AnalysisOptions {
            material: "Nylon".to_string(),
            printer_profile: "Prusa MK4".to_string(),
            ..AnalysisOptions::default()
        };
        let report = core.analyze("M104 S260", &options);
        assert_eq!(report.material, "Nylon");
        assert_eq!(report.printer_profile, "Prusa MK4");
        // PLA thresholds apply.
        assert_eq!(report.errors.len(), 1);
        assert!(!report.valid);
    }

    #[test]
    fn test_analyze_empty_program() {
        let report = GCodeGuardCore::default().analyze("", &AnalysisOptions::default());
        assert!(report.valid);
        assert_eq!(report.command_count, 0);
        assert_eq!(report.anomaly_count, 0);
        assert_eq!(report.recommendation_count, 0);
        assert_eq!(report.metrics.total_moves, 0);
        assert_eq!(report.detailed_metrics.average_speed_mm_min, 3000.0);
    }

    #[test]
    fn test_discover_gcode_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.gcode"), "G28").unwrap();
        fs::write(dir.path().join("b.GCO"), "G28").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.g"), "G28").unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache").join("d.gcode"), "G28").unwrap();

        let files = discover_gcode_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["a.gcode", "b.GCO", "c.g"]);
    }

    #[test]
    fn test_analyze_project() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ok.gcode"), "G28\nM104 S200\n").unwrap();
        fs::write(dir.path().join("hot.gcode"), "M104 S300\n").unwrap();

        let results = GCodeGuardCore::default()
            .analyze_project(dir.path(), &AnalysisOptions::default())
            .unwrap();
        assert_eq!(results.len(), 2);
        let hot = results
            .iter()
            .find(|r| r.file.ends_with("hot.gcode"))
            .unwrap();
        assert!(hot.report.has_errors());
        assert!(results.iter().all(|r| r.analyzed_at <= Utc::now()));
    }
}
