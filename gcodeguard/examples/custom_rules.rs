//! Example: using Validator and parser directly (without GCodeGuardCore).
//! Run with: cargo run --example custom_rules [path/to/file.gcode]

use gcodeguard::analyzer::validator::RuleContext;
use gcodeguard::{
    CommandLine, GcodeParser, Issue, ProfileRegistry, Severity, ValidationRule, Validator,
};
use std::path::Path;
use std::sync::Arc;

/// Rejects programs that travel above a printer's build height.
struct BuildHeightRule {
    max_z: f64,
}

impl ValidationRule for BuildHeightRule {
    fn id(&self) -> &str {
        "build_height"
    }

    fn name(&self) -> &str {
        "Build height"
    }

    fn description(&self) -> &str {
        "Z moves above the printer's build volume"
    }

    fn check(&self, line: &CommandLine, _ctx: &RuleContext<'_>) -> Vec<Issue> {
        match line.param('Z') {
            Some(z) if z > self.max_z => vec![Issue {
                line_number: Some(line.line_number),
                rule_id: self.id().to_string(),
                severity: Severity::Error,
                message: format!(
                    "Line {}: Z{} is above the {} mm build height",
                    line.line_number, z, self.max_z
                ),
            }],
            _ => vec![],
        }
    }
}

fn main() -> Result<(), gcodeguard::GCodeGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/calibration_square.gcode".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_rules [path/to/file.gcode]");
        std::process::exit(1);
    }

    let lines = GcodeParser::parse_file(path)?;
    let registry = ProfileRegistry::builtin();
    let mut validator = Validator::with_default_rules(&registry);
    validator.add_rule(Arc::new(BuildHeightRule { max_z: 250.0 }));
    let report = validator.validate(&lines, "PETG", "Ender3");

    println!(
        "Custom validation found {} issues for {}",
        report.errors.len() + report.warnings.len(),
        path.display()
    );
    for issue in report.errors.iter().chain(&report.warnings) {
        println!("  [{:?}] {}", issue.severity, issue.message);
    }

    if !report.valid {
        std::process::exit(1);
    }
    Ok(())
}
