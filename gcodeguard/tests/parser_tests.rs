//! Tests for G-code file parsing

use gcodeguard::{parse_gcode, Command, GCodeGuardError, GcodeParser};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_parse_calibration_square() {
    let lines = GcodeParser::parse_file(&fixture_path("calibration_square.gcode"))
        .expect("Should parse fixture");

    // Blank and comment-only lines are skipped.
    assert_eq!(lines.len(), 26);
    assert_eq!(lines[0].command, Command::Home);
    assert_eq!(lines[0].line_number, 2);
    assert_eq!(lines[0].comment.as_deref(), Some("Home all axes"));

    let linear_moves = lines.iter().filter(|l| l.is_linear_move()).count();
    assert_eq!(linear_moves, 16);
}

#[test]
fn test_line_numbers_strictly_increase() {
    let lines = GcodeParser::parse_file(&fixture_path("calibration_square.gcode")).unwrap();
    assert!(lines.windows(2).all(|w| w[0].line_number < w[1].line_number));
}

#[test]
fn test_parse_invalid_file() {
    let result = GcodeParser::parse_file(&PathBuf::from("not_a_real_file.gcode"));
    assert!(matches!(result, Err(GCodeGuardError::Io(_))));
}

#[test]
fn test_parse_dialect_noise() {
    let lines = GcodeParser::parse_file(&fixture_path("dialect_noise.gcode")).unwrap();
    assert_eq!(lines.len(), 11);
    assert_eq!(lines[0].command, Command::Other("T0".to_string()));

    // "G1 X Y7 E0.4 f100 Fast": only Y and E survive.
    let noisy = lines.iter().find(|l| l.line_number == 9).unwrap();
    assert_eq!(noisy.parameters.len(), 2);
    assert_eq!(noisy.param('Y'), Some(7.0));
    assert_eq!(noisy.param('E'), Some(0.4));

    let repeated = lines.iter().find(|l| l.line_number == 10).unwrap();
    assert_eq!(repeated.param('E'), Some(0.9));

    let message = lines.iter().find(|l| l.line_number == 11).unwrap();
    assert_eq!(message.command, Command::Other("M117".to_string()));
    assert!(message.parameters.is_empty());
}

#[test]
fn test_parse_is_idempotent() {
    let text = std::fs::read_to_string(fixture_path("dialect_noise.gcode")).unwrap();
    assert_eq!(parse_gcode(&text), parse_gcode(&text));
}

#[test]
fn test_command_serializes_as_mnemonic() {
    let lines = parse_gcode("M104 S200\nG1 X1\nT1");
    let json = serde_json::to_value(&lines).unwrap();
    assert_eq!(json[0]["command"], "M104");
    assert_eq!(json[1]["command"], "G1");
    assert_eq!(json[2]["command"], "T1");
    assert_eq!(json[0]["parameters"]["S"], 200.0);
}
