//! Geometric and thermal anomaly detection.
//!
//! Three independent read-only passes: sharp reversals of travel direction,
//! abrupt temperature steps, and unusually long unbroken extrusion runs.

use serde::{Deserialize, Serialize};

use crate::analyzer::toolpath::Toolpath;
use crate::parser::CommandLine;

/// Turn angle above which a direction change is reported.
pub const DIRECTION_CHANGE_DEG: f64 = 135.0;
pub const TEMPERATURE_RAMP_C: f64 = 30.0;
/// Ramps larger than this are high severity.
pub const TEMPERATURE_RAMP_HIGH_C: f64 = 50.0;
/// Longest run of consecutive extruding moves before it is reported.
pub const MAX_EXTRUSION_RUN: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    DirectionChange,
    TemperatureRamp,
    ExcessiveExtrusion,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub line: Option<usize>,
    pub description: String,
    pub severity: AnomalySeverity,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnomalyCounts {
    pub direction_change: usize,
    pub temperature_ramp: usize,
    pub excessive_extrusion: usize,
}

impl AnomalyCounts {
    pub fn total(&self) -> usize {
        self.direction_change + self.temperature_ramp + self.excessive_extrusion
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomalies: Vec<Anomaly>,
    pub by_kind: AnomalyCounts,
}

impl AnomalyReport {
    pub fn count(&self) -> usize {
        self.anomalies.len()
    }
}

pub struct AnomalyDetector;

impl AnomalyDetector {
    pub fn detect(lines: &[CommandLine]) -> AnomalyReport {
        let mut anomalies = Self::direction_changes(lines);
        anomalies.extend(Self::temperature_ramps(lines));
        anomalies.extend(Self::excessive_extrusion(lines));

        let mut by_kind = AnomalyCounts::default();
        for anomaly in &anomalies {
            match anomaly.kind {
                AnomalyKind::DirectionChange => by_kind.direction_change += 1,
                AnomalyKind::TemperatureRamp => by_kind.temperature_ramp += 1,
                AnomalyKind::ExcessiveExtrusion => by_kind.excessive_extrusion += 1,
            }
        }

        tracing::debug!("Detected {} anomalies", anomalies.len());

        AnomalyReport { anomalies, by_kind }
    }

    pub fn direction_changes(lines: &[CommandLine]) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        let mut last_direction: Option<(f64, f64)> = None;

        for mv in Toolpath::new(lines) {
            let Some(direction) = mv.direction() else {
                continue;
            };
            if let Some(previous) = last_direction {
                let angle = turn_angle_deg(previous, direction);
                if angle > DIRECTION_CHANGE_DEG {
                    anomalies.push(Anomaly {
                        kind: AnomalyKind::DirectionChange,
                        line: Some(mv.line.line_number),
                        description: format!(
                            "Sudden direction change detected (angle: {:.1}°)",
                            angle
                        ),
                        severity: AnomalySeverity::Medium,
                    });
                }
            }
            last_direction = Some(direction);
        }

        anomalies
    }

    pub fn temperature_ramps(lines: &[CommandLine]) -> Vec<Anomaly> {
        let temps: Vec<(&CommandLine, f64)> = lines
            .iter()
            .filter(|l| l.command.is_temperature())
            .filter_map(|l| l.param('S').map(|s| (l, s)))
            .collect();

        temps
            .windows(2)
            .filter_map(|pair| {
                let (prev_line, prev_temp) = pair[0];
                let (line, temp) = pair[1];
                let diff = (temp - prev_temp).abs();
                if diff <= TEMPERATURE_RAMP_C {
                    return None;
                }
                Some(Anomaly {
                    kind: AnomalyKind::TemperatureRamp,
                    line: Some(line.line_number),
                    description: format!(
                        "Rapid temperature change from {}°C ({}) to {}°C ({}) (change: {:.1}°C)",
                        prev_temp, prev_line.command, temp, line.command, diff
                    ),
                    severity: if diff > TEMPERATURE_RAMP_HIGH_C {
                        AnomalySeverity::High
                    } else {
                        AnomalySeverity::Medium
                    },
                })
            })
            .collect()
    }

    /// One aggregate anomaly when the longest extruding run is too long.
    pub fn excessive_extrusion(lines: &[CommandLine]) -> Option<Anomaly> {
        let longest = longest_extrusion_run(lines);
        (longest > MAX_EXTRUSION_RUN).then(|| Anomaly {
            kind: AnomalyKind::ExcessiveExtrusion,
            line: None,
            description: format!(
                "Very long sequence of extrusion moves ({} consecutive)",
                longest
            ),
            severity: AnomalySeverity::Low,
        })
    }
}

/// Angle in degrees between two unit vectors, always within [0, 180].
pub fn turn_angle_deg(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dot = (a.0 * b.0 + a.1 * b.1).clamp(-1.0, 1.0);
    dot.acos().to_degrees()
}

fn longest_extrusion_run(lines: &[CommandLine]) -> usize {
    let mut current = 0;
    let mut longest = 0;
    for line in lines {
        if line.is_extruding() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
