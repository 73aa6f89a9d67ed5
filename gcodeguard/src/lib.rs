//! GCodeGuard - G-code analysis library for FDM 3D printing
//!
//! This library parses G-code programs and checks them against material
//! temperature profiles and absolute safe ranges, detects geometric and
//! thermal anomalies, estimates print time, filament weight and cost, and
//! suggests slicer setting improvements.
//!
//! # Quick Start
//!
//! ```no_run
//! use gcodeguard::{AnalysisOptions, GCodeGuardCore};
//! use std::path::Path;
//!
//! let core = GCodeGuardCore::default();
//! let result = core
//!     .analyze_file(Path::new("benchy.gcode"), &AnalysisOptions::default())
//!     .unwrap();
//!
//! for issue in result.report.errors.iter().chain(&result.report.warnings) {
//!     println!("{:?}: {}", issue.severity, issue.message);
//! }
//! ```
//!
//! # Features
//!
//! - **Validation**: nozzle/bed temperatures per material, feed rates, extrusion, safe ranges
//! - **Anomalies**: sharp direction reversals, temperature ramps, long extrusion runs
//! - **Metrics**: print time, filament weight and cost, layer count
//! - **Recommendations**: temperature, speed, retract, layer height and travel advice
//! - **Generation**: canonical start, end and purge-line sequences

pub mod analyzer;
pub mod core;
pub mod generator;
pub mod parser;
pub mod profiles;

// Re-export main types
pub use crate::core::{
    discover_gcode_files, AnalysisOptions, AnalysisReport, FileAnalysis, GCodeGuardCore,
    GCodeGuardError,
};
pub use analyzer::anomalies::{Anomaly, AnomalyKind, AnomalySeverity};
pub use analyzer::metrics::{DetailedMetrics, ExtrusionMode, FilamentParameters, PrintMetrics};
pub use analyzer::recommendations::{Priority, Recommendation, Topic};
pub use analyzer::validator::{Issue, Severity, ValidationRule, Validator};
pub use generator::GcodeGenerator;
pub use parser::{Command, CommandLine, GcodeParser};
pub use profiles::{MaterialProfile, ProfileRegistry};

/// Parse G-code text (convenience wrapper).
pub fn parse_gcode(content: &str) -> Vec<CommandLine> {
    GcodeParser::parse(content)
}

/// Analyze G-code text with the built-in profiles (convenience wrapper).
pub fn analyze_gcode(content: &str, material: &str, printer_profile: &str) -> AnalysisReport {
    let options = AnalysisOptions {
        material: material.to_string(),
        printer_profile: printer_profile.to_string(),
        ..AnalysisOptions::default()
    };
    GCodeGuardCore::default().analyze(content, &options)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisOptions, AnalysisReport, CommandLine, FileAnalysis, GCodeGuardCore,
        GCodeGuardError, GcodeParser, Issue, Severity,
    };
}
