//! Advisory recommendations.
//!
//! Each topic is analysed independently and contributes at most one
//! recommendation; a topic with nothing to say contributes nothing.

use serde::{Deserialize, Serialize};

use crate::parser::{Command, CommandLine};
use crate::profiles::{MaterialProfile, ProfileRegistry};

pub const HIGH_AVERAGE_SPEED: f64 = 6000.0;
pub const LOW_AVERAGE_SPEED: f64 = 1500.0;
pub const ABRUPT_SPEED_CHANGE: f64 = 2000.0;
pub const SUSPICIOUS_EXTRUSION: f64 = 50.0;
pub const LARGE_RETRACT_MM: f64 = 5.0;
pub const SMALL_RETRACT_MM: f64 = 1.0;
/// Minimum retract count before small retracts are worth mentioning.
pub const SMALL_RETRACT_MIN_COUNT: usize = 10;
pub const COARSE_LAYER_MM: f64 = 0.3;
pub const FINE_LAYER_MM: f64 = 0.05;
pub const MAX_RAPID_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Temperature,
    Speed,
    SpeedVariation,
    Extrusion,
    Retract,
    Layer,
    Movement,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub topic: Topic,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub fn tally(recommendations: &[Recommendation]) -> Self {
        let mut counts = Self::default();
        for r in recommendations {
            match r.priority {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub recommendations: Vec<Recommendation>,
    pub count: usize,
    pub by_priority: PriorityCounts,
}

pub struct RecommendationGenerator<'r> {
    registry: &'r ProfileRegistry,
}

impl<'r> RecommendationGenerator<'r> {
    pub fn new(registry: &'r ProfileRegistry) -> Self {
        Self { registry }
    }

    /// `printer_profile` does not influence any threshold yet.
    pub fn generate(
        &self,
        lines: &[CommandLine],
        material: &str,
        _printer_profile: &str,
    ) -> RecommendationReport {
        let profile = self.registry.resolve(material);

        let recommendations: Vec<Recommendation> = [
            analyze_temperature(lines, material, profile),
            analyze_speed(lines),
            analyze_speed_variation(lines),
            analyze_extrusion(lines),
            analyze_retracts(lines),
            analyze_layers(lines),
            analyze_movements(lines),
        ]
        .into_iter()
        .flatten()
        .collect();

        tracing::debug!("Generated {} recommendations", recommendations.len());

        RecommendationReport {
            count: recommendations.len(),
            by_priority: PriorityCounts::tally(&recommendations),
            recommendations,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn linear_feed_rates(lines: &[CommandLine]) -> Vec<f64> {
    lines
        .iter()
        .filter(|l| l.is_linear_move())
        .filter_map(|l| l.param('F'))
        .collect()
}

fn analyze_temperature(
    lines: &[CommandLine],
    material: &str,
    profile: &MaterialProfile,
) -> Option<Recommendation> {
    let temps: Vec<f64> = lines
        .iter()
        .filter(|l| l.command.is_nozzle_temp())
        .filter_map(|l| l.active_temperature())
        .collect();
    let avg = mean(&temps)?;
    let (min, max) = (profile.nozzle_min_c, profile.nozzle_max_c);

    if avg < min {
        Some(Recommendation {
            topic: Topic::Temperature,
            priority: Priority::Medium,
            title: "Nozzle temperature too low".to_string(),
            description: format!(
                "Average nozzle temperature {:.1}°C is below the recommended minimum for {} ({}°C)",
                avg, material, min
            ),
            action: format!(
                "Raise the nozzle temperature to {}-{}°C for better layer adhesion",
                min, max
            ),
        })
    } else if avg > max {
        Some(Recommendation {
            topic: Topic::Temperature,
            priority: Priority::High,
            title: "Nozzle temperature too high".to_string(),
            description: format!(
                "Average nozzle temperature {:.1}°C is above the recommended maximum for {} ({}°C)",
                avg, material, max
            ),
            action: format!(
                "Lower the nozzle temperature to {}-{}°C to avoid degrading the material",
                min, max
            ),
        })
    } else {
        None
    }
}

fn analyze_speed(lines: &[CommandLine]) -> Option<Recommendation> {
    let avg = mean(&linear_feed_rates(lines))?;

    if avg > HIGH_AVERAGE_SPEED {
        Some(Recommendation {
            topic: Topic::Speed,
            priority: Priority::Medium,
            title: "High print speed".to_string(),
            description: format!(
                "Average speed {:.0} mm/min ({:.1} mm/s) may reduce print quality",
                avg,
                avg / 60.0
            ),
            action: "Consider lowering speed to 3000-4500 mm/min, especially for outer perimeters"
                .to_string(),
        })
    } else if avg < LOW_AVERAGE_SPEED {
        Some(Recommendation {
            topic: Topic::Speed,
            priority: Priority::Low,
            title: "Low print speed".to_string(),
            description: format!(
                "Average speed {:.0} mm/min will noticeably lengthen the print",
                avg
            ),
            action: "Consider raising speed to 3000-4500 mm/min; most prints keep their quality"
                .to_string(),
        })
    } else {
        None
    }
}

fn analyze_speed_variation(lines: &[CommandLine]) -> Option<Recommendation> {
    let speeds = linear_feed_rates(lines);
    let max_change = speeds
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))))?;

    (max_change > ABRUPT_SPEED_CHANGE).then(|| Recommendation {
        topic: Topic::SpeedVariation,
        priority: Priority::Low,
        title: "Abrupt speed changes".to_string(),
        description: format!(
            "Consecutive feed rates differ by up to {:.0} mm/min",
            max_change
        ),
        action: "Smooth speed transitions between features improve surface quality".to_string(),
    })
}

fn analyze_extrusion(lines: &[CommandLine]) -> Option<Recommendation> {
    let max_extrusion = lines
        .iter()
        .filter(|l| l.is_extruding())
        .filter_map(|l| l.param('E'))
        .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.max(e))))?;

    (max_extrusion > SUSPICIOUS_EXTRUSION).then(|| Recommendation {
        topic: Topic::Extrusion,
        priority: Priority::High,
        title: "Implausibly large extrusion".to_string(),
        description: format!(
            "Extrusion values reach {:.2} mm, which usually points to a slicer scale error",
            max_extrusion
        ),
        action: "Check slicer scale settings: nozzle diameter, line width and extrusion multiplier"
            .to_string(),
    })
}

fn analyze_retracts(lines: &[CommandLine]) -> Option<Recommendation> {
    let retracts: Vec<f64> = lines
        .iter()
        .filter(|l| l.is_retract())
        .filter_map(|l| l.param('E'))
        .map(f64::abs)
        .collect();
    let avg = mean(&retracts)?;

    if avg > LARGE_RETRACT_MM {
        Some(Recommendation {
            topic: Topic::Retract,
            priority: Priority::Medium,
            title: "Retract too large".to_string(),
            description: format!("Average retract of {:.2} mm is likely excessive", avg),
            action: "Most printers need 2-4 mm of retract; try 3-4 mm".to_string(),
        })
    } else if avg < SMALL_RETRACT_MM && retracts.len() >= SMALL_RETRACT_MIN_COUNT {
        Some(Recommendation {
            topic: Topic::Retract,
            priority: Priority::Low,
            title: "Retract too small".to_string(),
            description: format!(
                "Average retract of {:.2} mm may not prevent stringing",
                avg
            ),
            action: "Increase retract to 2-4 mm to control stringing".to_string(),
        })
    } else {
        None
    }
}

fn analyze_layers(lines: &[CommandLine]) -> Option<Recommendation> {
    let mut z_values: Vec<f64> = lines
        .iter()
        .filter(|l| l.is_linear_move())
        .filter_map(|l| l.param('Z'))
        .collect();
    z_values.sort_by(f64::total_cmp);
    z_values.dedup();

    let heights: Vec<f64> = z_values
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|h| *h > 0.0)
        .collect();
    let avg = mean(&heights)?;

    if avg > COARSE_LAYER_MM {
        Some(Recommendation {
            topic: Topic::Layer,
            priority: Priority::Medium,
            title: "Coarse layers".to_string(),
            description: format!(
                "Average layer height {:.2} mm limits fine detail",
                avg
            ),
            action: "Use 0.1-0.2 mm layers for quality, 0.2-0.3 mm for fast prints".to_string(),
        })
    } else if avg < FINE_LAYER_MM {
        Some(Recommendation {
            topic: Topic::Layer,
            priority: Priority::Low,
            title: "Excessively fine layers".to_string(),
            description: format!(
                "Layer height {:.3} mm will greatly increase print time",
                avg
            ),
            action: "0.1-0.2 mm suits most models; reserve very thin layers for fine detail"
                .to_string(),
        })
    } else {
        None
    }
}

fn analyze_movements(lines: &[CommandLine]) -> Option<Recommendation> {
    let rapid = lines
        .iter()
        .filter(|l| l.command == Command::RapidMove)
        .count();
    let linear = lines.iter().filter(|l| l.is_linear_move()).count();
    let total = rapid + linear;
    if total == 0 {
        return None;
    }

    let ratio = rapid as f64 / total as f64;
    (ratio > MAX_RAPID_RATIO).then(|| Recommendation {
        topic: Topic::Movement,
        priority: Priority::Low,
        title: "Inefficient travel path".to_string(),
        description: format!("{:.1}% of moves are rapid travel moves (G0)", ratio * 100.0),
        action: "Optimize the print path to reduce travel moves".to_string(),
    })
}
