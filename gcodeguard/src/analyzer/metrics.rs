//! Print time, filament and cost estimates.
//!
//! Print time is planar distance divided by the mean programmed feed rate.
//! Acceleration, jerk and cornering are not modelled.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;

use crate::analyzer::toolpath::PositionTracker;
use crate::core::GCodeGuardError;
use crate::parser::{Command, CommandLine};

/// Feed rate assumed when a program never sets one (mm/min).
pub const DEFAULT_SPEED_MM_MIN: f64 = 3000.0;

/// How `E` values on linear moves turn into filament length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrusionMode {
    /// Sum every positive `E` as if each were a relative length.
    #[default]
    RawSum,
    /// `E` is an absolute extruder position. Only advances past the furthest
    /// position since the last `G92 E` re-base count, so a retract followed
    /// by a prime adds nothing.
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilamentParameters {
    pub diameter_mm: f64,
    pub density_g_cm3: f64,
    pub cost_per_gram_usd: f64,
    pub extrusion_mode: ExtrusionMode,
}

impl Default for FilamentParameters {
    fn default() -> Self {
        Self {
            diameter_mm: 1.75,
            density_g_cm3: 1.24,
            cost_per_gram_usd: 0.02,
            extrusion_mode: ExtrusionMode::RawSum,
        }
    }
}

impl FilamentParameters {
    pub fn validate(&self) -> Result<(), GCodeGuardError> {
        let fields = [
            ("diameter_mm", self.diameter_mm),
            ("density_g_cm3", self.density_g_cm3),
            ("cost_per_gram_usd", self.cost_per_gram_usd),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(GCodeGuardError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Filament cross-section in mm².
    pub fn cross_section_mm2(&self) -> f64 {
        PI * (self.diameter_mm / 2.0).powi(2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintMetrics {
    pub estimated_time_hours: f64,
    pub filament_weight_g: f64,
    pub estimated_cost_usd: f64,
    pub layer_count: usize,
    pub total_moves: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetailedMetrics {
    #[serde(flatten)]
    pub basic: PrintMetrics,
    pub estimated_time_minutes: f64,
    pub filament_weight_kg: f64,
    pub retract_count: usize,
    pub temperature_changes: usize,
    pub filament_length_m: f64,
    pub total_distance_mm: f64,
    pub average_speed_mm_min: f64,
}

#[derive(Default)]
struct Accumulator {
    distance_mm: f64,
    speed_sum: f64,
    speed_count: usize,
    layers: HashSet<u64>,
    filament_mm: f64,
    extruder_high_water: f64,
    linear_moves: usize,
    retracts: usize,
    temperature_changes: usize,
}

impl Accumulator {
    fn extrude(&mut self, e: f64, mode: ExtrusionMode) {
        match mode {
            ExtrusionMode::RawSum => {
                if e > 0.0 {
                    self.filament_mm += e;
                }
            }
            ExtrusionMode::Absolute => {
                if e > self.extruder_high_water {
                    self.filament_mm += e - self.extruder_high_water;
                    self.extruder_high_water = e;
                }
            }
        }
    }
}

pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn estimate(lines: &[CommandLine], params: &FilamentParameters) -> PrintMetrics {
        Self::detailed(lines, params).basic
    }

    /// Single forward pass producing both the basic and the detailed view.
    pub fn detailed(lines: &[CommandLine], params: &FilamentParameters) -> DetailedMetrics {
        let mut acc = Accumulator::default();
        let mut tracker = PositionTracker::new();

        for line in lines {
            if line.command.is_temperature() {
                acc.temperature_changes += 1;
            }
            if line.command == Command::SetPosition {
                if let Some(e) = line.param('E') {
                    acc.extruder_high_water = e;
                }
            }

            let Some(mv) = tracker.step(line) else {
                continue;
            };
            acc.linear_moves += 1;
            acc.distance_mm += mv.planar_distance();

            if let Some(speed) = line.param('F').filter(|f| *f > 0.0) {
                acc.speed_sum += speed;
                acc.speed_count += 1;
            }
            if let Some(z) = mv.to.z {
                // -0.0 and 0.0 are the same layer.
                acc.layers.insert((z + 0.0).to_bits());
            }
            if let Some(e) = line.param('E') {
                if e < 0.0 {
                    acc.retracts += 1;
                }
                acc.extrude(e, params.extrusion_mode);
            }
        }

        let average_speed = if acc.speed_count > 0 {
            acc.speed_sum / acc.speed_count as f64
        } else {
            DEFAULT_SPEED_MM_MIN
        };
        let estimated_time_hours = acc.distance_mm / (average_speed * 60.0);

        let volume_mm3 = acc.filament_mm * params.cross_section_mm2();
        let filament_weight_g = volume_mm3 / 1000.0 * params.density_g_cm3;
        let estimated_cost_usd = filament_weight_g * params.cost_per_gram_usd;

        tracing::debug!(
            "Metrics: {:.1} mm travel, {:.1} mm filament, {} layers",
            acc.distance_mm,
            acc.filament_mm,
            acc.layers.len()
        );

        DetailedMetrics {
            basic: PrintMetrics {
                estimated_time_hours,
                filament_weight_g,
                estimated_cost_usd,
                layer_count: acc.layers.len(),
                total_moves: acc.linear_moves,
            },
            estimated_time_minutes: estimated_time_hours * 60.0,
            filament_weight_kg: filament_weight_g / 1000.0,
            retract_count: acc.retracts,
            temperature_changes: acc.temperature_changes,
            filament_length_m: acc.filament_mm / 1000.0,
            total_distance_mm: acc.distance_mm,
            average_speed_mm_min: average_speed,
        }
    }
}
