//! Integration tests for GCodeGuard library

use approx::assert_relative_eq;
use gcodeguard::prelude::*;
use gcodeguard::{
    analyze_gcode, AnomalyKind, AnomalySeverity, ExtrusionMode, FilamentParameters, Priority,
    Topic,
};
use std::f64::consts::PI;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn analyze_fixture(name: &str) -> AnalysisReport {
    GCodeGuardCore::default()
        .analyze_file(&fixture_path(name), &AnalysisOptions::default())
        .expect("fixture should be readable")
        .report
}

#[test]
fn test_analyze_calibration_square() {
    let report = analyze_fixture("calibration_square.gcode");

    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(report.command_count, 26);
    assert_eq!(report.material, "PLA");
    assert_eq!(report.printer_profile, "Ender3");

    // Heat-up and cool-down alternate between bed and nozzle targets.
    assert_eq!(report.anomaly_count, 4);
    assert_eq!(report.anomalies_by_kind.temperature_ramp, 4);
    assert_eq!(report.anomalies_by_kind.direction_change, 0);
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.kind == AnomalyKind::TemperatureRamp && a.severity == AnomalySeverity::High));

    assert!(report.recommendations.is_empty());
    assert_eq!(report.recommendation_count, 0);
}

#[test]
fn test_calibration_square_statistics() {
    let stats = analyze_fixture("calibration_square.gcode").statistics;
    assert_eq!(stats.total_commands, 26);
    assert_eq!(stats.g_commands, 19);
    assert_eq!(stats.m_commands, 7);
    assert!(stats.has_temperature);
    assert!(stats.has_extrusion);
    assert_eq!(stats.max_temperature, 205.0);
    assert_eq!(stats.min_temperature, 0.0);
}

#[test]
fn test_calibration_square_metrics() {
    let report = analyze_fixture("calibration_square.gcode");
    let metrics = &report.detailed_metrics;

    let distance = 800.0_f64.sqrt() + 3.0 * 80.0;
    let speed = (4.0 * 3000.0 + 3.0 * 1800.0) / 7.0;
    let weight = 9.6 * PI * 0.875 * 0.875 / 1000.0 * 1.24;

    assert_eq!(report.metrics, metrics.basic);
    assert_eq!(metrics.basic.total_moves, 16);
    assert_eq!(metrics.basic.layer_count, 3);
    assert_eq!(metrics.retract_count, 0);
    assert_eq!(metrics.temperature_changes, 6);
    assert_relative_eq!(metrics.total_distance_mm, distance, epsilon = 1e-9);
    assert_relative_eq!(metrics.average_speed_mm_min, speed, epsilon = 1e-9);
    assert_relative_eq!(
        metrics.basic.estimated_time_hours,
        distance / (speed * 60.0),
        epsilon = 1e-12
    );
    assert_relative_eq!(metrics.filament_length_m, 0.0096, epsilon = 1e-12);
    assert_relative_eq!(metrics.basic.filament_weight_g, weight, epsilon = 1e-9);
    assert_relative_eq!(metrics.basic.estimated_cost_usd, weight * 0.02, epsilon = 1e-9);
}

#[test]
fn test_analyze_unsafe_settings() {
    let report = analyze_fixture("unsafe_settings.gcode");

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 4);
    assert_eq!(report.warnings.len(), 5);

    assert_eq!(report.anomalies_by_kind.direction_change, 1);
    assert_eq!(report.anomalies_by_kind.temperature_ramp, 1);
    assert_eq!(report.anomalies_by_kind.excessive_extrusion, 0);

    let topics: Vec<Topic> = report.recommendations.iter().map(|r| r.topic).collect();
    assert_eq!(
        topics,
        vec![
            Topic::Temperature,
            Topic::Speed,
            Topic::SpeedVariation,
            Topic::Extrusion,
            Topic::Retract
        ]
    );
    assert_eq!(report.recommendations_by_priority.high, 2);
    assert_eq!(report.recommendations_by_priority.medium, 2);
    assert_eq!(report.recommendations_by_priority.low, 1);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.topic == Topic::Temperature && r.priority == Priority::High));
}

#[test]
fn test_direction_change_contract() {
    let turn = analyze_gcode("G1 X0 Y0\nG1 X0 Y10\nG1 X10 Y10", "PLA", "Ender3");
    assert_eq!(turn.anomalies_by_kind.direction_change, 0);

    let reversal = analyze_gcode("G1 X0 Y10\nG1 X0 Y-10", "PLA", "Ender3");
    assert_eq!(reversal.anomalies_by_kind.direction_change, 1);
    assert_eq!(reversal.anomalies[0].line, Some(2));
}

#[test]
fn test_excessive_extrusion_contract() {
    let program = |count: usize| {
        (0..count)
            .map(|i| format!("G1 X{} Y{} E0.05", i % 50, (i / 50) % 2))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let long = analyze_gcode(&program(1001), "PLA", "Ender3");
    assert_eq!(long.anomalies_by_kind.excessive_extrusion, 1);
    let anomaly = long
        .anomalies
        .iter()
        .find(|a| a.kind == AnomalyKind::ExcessiveExtrusion)
        .unwrap();
    assert_eq!(anomaly.severity, AnomalySeverity::Low);
    assert_eq!(anomaly.line, None);

    let short = analyze_gcode(&program(999), "PLA", "Ender3");
    assert_eq!(short.anomalies_by_kind.excessive_extrusion, 0);
}

#[test]
fn test_extrusion_modes() {
    let program = "G92 E0\nG1 X10 E1\nG1 X20 E2\nG1 X30 E3";
    let core = GCodeGuardCore::default();

    let raw = core.analyze(program, &AnalysisOptions::default());
    assert_relative_eq!(raw.detailed_metrics.filament_length_m, 0.006);

    let absolute = AnalysisOptions {
        filament: FilamentParameters {
            extrusion_mode: ExtrusionMode::Absolute,
            ..FilamentParameters::default()
        },
        ..AnalysisOptions::default()
    };
    let report = core.analyze(program, &absolute);
    assert_relative_eq!(report.detailed_metrics.filament_length_m, 0.003);
}

#[test]
fn test_report_json_contract() {
    let report = analyze_fixture("unsafe_settings.gcode");
    let json = serde_json::to_value(&report).unwrap();

    for key in [
        "valid",
        "errors",
        "warnings",
        "anomalies",
        "anomaly_count",
        "anomalies_by_kind",
        "statistics",
        "metrics",
        "detailed_metrics",
        "recommendations",
        "recommendation_count",
        "recommendations_by_priority",
        "command_count",
        "material",
        "printer_profile",
    ] {
        assert!(json.get(key).is_some(), "missing key {}", key);
    }

    assert_eq!(json["anomalies_by_kind"]["excessive_extrusion"], 0);
    assert_eq!(json["errors"][0]["severity"], "error");
    assert_eq!(json["anomalies"][0]["kind"], "direction_change");
    assert!(json["detailed_metrics"].get("estimated_time_hours").is_some());
    assert!(json["detailed_metrics"].get("retract_count").is_some());

    let back: AnalysisReport = serde_json::from_value(json).unwrap();
    assert_eq!(back.errors, report.errors);
}

#[test]
fn test_unreadable_file_surfaces_io_error() {
    let result = GCodeGuardCore::default()
        .analyze_file(&fixture_path("missing.gcode"), &AnalysisOptions::default());
    assert!(matches!(result, Err(GCodeGuardError::Io(_))));
}
