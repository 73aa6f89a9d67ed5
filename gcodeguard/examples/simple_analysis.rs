//! Simple analysis example: analyze a G-code file and print results.

use gcodeguard::prelude::*;
use std::path::Path;

fn main() -> Result<(), GCodeGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/calibration_square.gcode".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_analysis [path/to/file.gcode]");
        std::process::exit(1);
    }

    let options = AnalysisOptions::default();
    let result = GCodeGuardCore::default().analyze_file(path, &options)?;
    let report = &result.report;

    println!("Analysis results for: {}", result.file.display());
    println!("Commands: {}", report.command_count);
    println!("Total issues: {}", report.total_issues());
    println!();

    if report.has_errors() {
        println!("ERRORS:");
        for issue in &report.errors {
            println!("  - {}", issue.message);
        }
    }

    for anomaly in &report.anomalies {
        println!("  [{:?}] {}", anomaly.severity, anomaly.description);
    }

    println!(
        "\nEstimated {:.1} min, {:.2} g of filament, ${:.2}",
        report.detailed_metrics.estimated_time_minutes,
        report.metrics.filament_weight_g,
        report.metrics.estimated_cost_usd
    );

    if !report.valid {
        println!("\nValidation failed.");
        std::process::exit(1);
    }

    println!("\nValidation passed.");
    Ok(())
}
