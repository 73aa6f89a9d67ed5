//! Canonical G-code snippets: printer start-up, shutdown and purge line.

use crate::parser::CommandLine;

pub const DEFAULT_BED_TEMP_C: f64 = 60.0;
pub const DEFAULT_NOZZLE_TEMP_C: f64 = 200.0;
pub const DEFAULT_PURGE_LENGTH_MM: f64 = 20.0;
/// Filament pushed per millimetre of purge line.
pub const PURGE_EXTRUSION_RATIO: f64 = 0.5;

const PURGE_START_MM: f64 = 5.0;

pub struct GcodeGenerator;

impl GcodeGenerator {
    /// Home, heat bed and nozzle, wait for both, reset the extruder and drop
    /// to first-layer height.
    pub fn start_sequence(bed_temp: f64, nozzle_temp: f64) -> Vec<String> {
        vec![
            "G28 ; Home all axes".to_string(),
            format!("M140 S{} ; Set bed temperature", bed_temp),
            format!("M104 S{} ; Set nozzle temperature", nozzle_temp),
            format!("M190 S{} ; Wait for bed temperature", bed_temp),
            format!("M109 S{} ; Wait for nozzle temperature", nozzle_temp),
            "G92 E0 ; Reset extruder".to_string(),
            "G1 Z0.2 F3000 ; Move to layer height".to_string(),
        ]
    }

    pub fn end_sequence() -> Vec<String> {
        vec![
            "M104 S0 ; Turn off nozzle heater".to_string(),
            "M140 S0 ; Turn off bed heater".to_string(),
            "G28 X0 Y0 ; Home X and Y".to_string(),
            "M84 ; Disable steppers".to_string(),
        ]
    }

    /// A straight line along X. Negative lengths are treated as zero.
    pub fn purge_line(length: f64) -> Vec<String> {
        let length = length.max(0.0);
        vec![
            format!(
                "G1 X{} Y{} Z0.2 F3000 ; Move to start",
                PURGE_START_MM, PURGE_START_MM
            ),
            format!(
                "G1 X{} Y{} E{} F1500 ; Purge line",
                PURGE_START_MM + length,
                PURGE_START_MM,
                length * PURGE_EXTRUSION_RATIO
            ),
        ]
    }

    /// Drop lines that repeat the previous kept line's command and parameters.
    pub fn optimize(lines: &[CommandLine]) -> Vec<CommandLine> {
        let mut optimized: Vec<CommandLine> = Vec::with_capacity(lines.len());
        for line in lines {
            let duplicate = optimized
                .last()
                .is_some_and(|last| last.command == line.command && last.parameters == line.parameters);
            if !duplicate {
                optimized.push(line.clone());
            }
        }
        optimized
    }
}
