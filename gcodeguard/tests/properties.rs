//! Property-based tests over generated G-code programs.
//!
//! Run with: cargo test -p gcodeguard --test properties

use gcodeguard::analyzer::anomalies::{turn_angle_deg, AnomalyDetector};
use gcodeguard::analyzer::metrics::MetricsCalculator;
use gcodeguard::analyzer::validator::Validator;
use gcodeguard::{
    parse_gcode, ExtrusionMode, FilamentParameters, GCodeGuardCore, ProfileRegistry,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_mnemonic() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "G0", "G1", "G1", "G1", "G28", "G92", "M104", "M109", "M140", "M190", "M112", "M106",
        "T0",
    ])
    .prop_map(|s| s.to_string())
}

fn arb_parameter() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!['X', 'Y', 'Z', 'E', 'F', 'S']),
        -1000.0..12000.0f64,
    )
        .prop_map(|(letter, value)| format!("{}{:.3}", letter, value))
}

/// Tokens a sloppy slicer or a human might leave behind.
fn arb_junk() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["X", "f100", "E1.2.3", "Fast", "Snan", "Xinf", "*42", "N10"])
        .prop_map(|s| s.to_string())
}

fn arb_line() -> impl Strategy<Value = String> {
    (
        arb_mnemonic(),
        prop::collection::vec(prop_oneof![4 => arb_parameter(), 1 => arb_junk()], 0..5),
        prop::option::of("[a-z ]{0,12}"),
    )
        .prop_map(|(mnemonic, params, comment)| {
            let mut line = mnemonic;
            for p in params {
                line.push(' ');
                line.push_str(&p);
            }
            if let Some(comment) = comment {
                line.push_str(" ;");
                line.push_str(&comment);
            }
            line
        })
}

fn arb_program() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![8 => arb_line(), 1 => Just(String::new())], 0..60)
        .prop_map(|lines| lines.join("\n"))
}

fn arb_unit_vector() -> impl Strategy<Value = (f64, f64)> {
    (0.0..std::f64::consts::TAU).prop_map(|theta| (theta.cos(), theta.sin()))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn parse_is_total_on_arbitrary_text(text in "\\PC*(\n\\PC*){0,8}") {
        let lines = parse_gcode(&text);
        let physical = text.split('\n').count();
        prop_assert!(lines.len() <= physical);
        prop_assert!(lines.windows(2).all(|w| w[0].line_number < w[1].line_number));
        prop_assert!(lines.iter().all(|l| l.line_number >= 1 && l.line_number <= physical));
        prop_assert!(lines
            .iter()
            .all(|l| l.parameters.iter().all(|(k, v)| k.is_ascii_uppercase() && v.is_finite())));
    }

    #[test]
    fn parse_is_idempotent(program in arb_program()) {
        prop_assert_eq!(parse_gcode(&program), parse_gcode(&program));
    }

    #[test]
    fn validity_matches_errors(
        program in arb_program(),
        material in prop::sample::select(vec!["PLA", "PETG", "ABS", "TPU", "ASA", "Wood"]),
    ) {
        let registry = ProfileRegistry::builtin();
        let lines = parse_gcode(&program);
        let report = Validator::with_default_rules(&registry).validate(&lines, material, "Ender3");
        prop_assert_eq!(report.valid, report.errors.is_empty());
        prop_assert_eq!(report.material.as_str(), material);

        let combined = GCodeGuardCore::default().validate(&lines, material, "Ender3");
        prop_assert!(!combined.valid || combined.errors.is_empty());
    }

    #[test]
    fn turn_angle_is_bounded(a in arb_unit_vector(), b in arb_unit_vector()) {
        let angle = turn_angle_deg(a, b);
        prop_assert!(angle.is_finite());
        prop_assert!((0.0..=180.0).contains(&angle));
    }

    #[test]
    fn metrics_are_non_negative(program in arb_program(), absolute in any::<bool>()) {
        let params = FilamentParameters {
            extrusion_mode: if absolute { ExtrusionMode::Absolute } else { ExtrusionMode::RawSum },
            ..FilamentParameters::default()
        };
        let lines = parse_gcode(&program);
        let metrics = MetricsCalculator::detailed(&lines, &params);

        prop_assert!(metrics.total_distance_mm >= 0.0);
        prop_assert!(metrics.filament_length_m >= 0.0);
        prop_assert!(metrics.basic.filament_weight_g >= 0.0);
        prop_assert!(metrics.basic.estimated_cost_usd >= 0.0);
        prop_assert!(metrics.basic.estimated_time_hours >= 0.0);
        prop_assert!(metrics.basic.layer_count <= metrics.basic.total_moves);
        prop_assert_eq!(
            metrics.basic.total_moves,
            lines.iter().filter(|l| l.is_linear_move()).count()
        );
    }

    #[test]
    fn anomaly_counts_add_up(program in arb_program()) {
        let report = AnomalyDetector::detect(&parse_gcode(&program));
        prop_assert_eq!(report.by_kind.total(), report.count());
        prop_assert!(report.by_kind.excessive_extrusion <= 1);
    }
}
