//! Safety validation of parsed G-code.
//!
//! Each [`ValidationRule`] inspects one line at a time against the resolved
//! material profile and the safe range table. Rules are independent: a
//! single line can trip several of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::parser::CommandLine;
use crate::profiles::{MaterialProfile, ProfileRegistry, SafeRangeTable};

/// Margin above the material maximum before a nozzle temperature is an error.
pub const NOZZLE_OVER_MARGIN_C: f64 = 20.0;
/// Margin below the material minimum before a nozzle temperature is a warning.
pub const NOZZLE_UNDER_MARGIN_C: f64 = 10.0;
/// Margin above the bed target before a bed temperature is a warning.
pub const BED_OVER_MARGIN_C: f64 = 30.0;
pub const MAX_FEED_RATE: f64 = 9000.0;
pub const MIN_FEED_RATE: f64 = 100.0;
pub const MAX_EXTRUSION: f64 = 100.0;
pub const MAX_RETRACT: f64 = -10.0;
/// Largest nozzle temperature step between consecutive set commands.
pub const MAX_TEMPERATURE_STEP_C: f64 = 50.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn at(line: &CommandLine, rule_id: &str, severity: Severity, message: String) -> Self {
        Self {
            line_number: Some(line.line_number),
            rule_id: rule_id.to_string(),
            severity,
            message: format!("Line {}: {}", line.line_number, message),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What a rule sees besides the line under inspection.
pub struct RuleContext<'a> {
    /// Name as requested by the caller, echoed in messages.
    pub material_name: &'a str,
    pub material: &'a MaterialProfile,
    pub safe_ranges: &'a SafeRangeTable,
}

pub trait ValidationRule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn check(&self, line: &CommandLine, ctx: &RuleContext<'_>) -> Vec<Issue>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub total_lines_analyzed: usize,
    pub material: String,
    pub printer_profile: String,
}

/// Outcome of the nozzle temperature sequencing check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureSequenceCheck {
    pub clean: bool,
    pub issues: Vec<Issue>,
}

pub struct Validator<'r> {
    registry: &'r ProfileRegistry,
    rules: Vec<Arc<dyn ValidationRule>>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r ProfileRegistry) -> Self {
        Self {
            registry,
            rules: Vec::new(),
        }
    }

    pub fn with_default_rules(registry: &'r ProfileRegistry) -> Self {
        let mut validator = Self::new(registry);
        validator.add_rule(Arc::new(NozzleTemperatureRule));
        validator.add_rule(Arc::new(BedTemperatureRule));
        validator.add_rule(Arc::new(FeedRateRule));
        validator.add_rule(Arc::new(ExtrusionRule));
        validator.add_rule(Arc::new(DangerousCommandRule));
        validator.add_rule(Arc::new(SafeRangeRule));
        validator
    }

    pub fn add_rule(&mut self, rule: Arc<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Arc<dyn ValidationRule>] {
        &self.rules
    }

    /// Run every rule over every line. `printer_profile` is echoed only.
    pub fn validate(
        &self,
        lines: &[CommandLine],
        material: &str,
        printer_profile: &str,
    ) -> ValidationReport {
        let ctx = RuleContext {
            material_name: material,
            material: self.registry.resolve(material),
            safe_ranges: self.registry.safe_ranges(),
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for line in lines {
            for rule in &self.rules {
                for issue in rule.check(line, &ctx) {
                    match issue.severity {
                        Severity::Error => errors.push(issue),
                        Severity::Warning => warnings.push(issue),
                    }
                }
            }
        }

        tracing::debug!(
            "Validation of {} lines: {} errors, {} warnings",
            lines.len(),
            errors.len(),
            warnings.len()
        );

        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            total_lines_analyzed: lines.len(),
            material: material.to_string(),
            printer_profile: printer_profile.to_string(),
        }
    }

    /// Flag adjacent nozzle temperature commands more than 50° apart.
    /// `S0` (heater off) is skipped.
    pub fn check_temperature_sequence(lines: &[CommandLine]) -> TemperatureSequenceCheck {
        let mut issues = Vec::new();
        let mut last_temp: Option<f64> = None;

        for line in lines.iter().filter(|l| l.command.is_nozzle_temp()) {
            let Some(temp) = line.active_temperature() else {
                continue;
            };
            if let Some(prev) = last_temp {
                if (temp - prev).abs() > MAX_TEMPERATURE_STEP_C {
                    issues.push(Issue::at(
                        line,
                        "temperature_sequence",
                        Severity::Warning,
                        format!("Sudden temperature change from {}°C to {}°C", prev, temp),
                    ));
                }
            }
            last_temp = Some(temp);
        }

        TemperatureSequenceCheck {
            clean: issues.is_empty(),
            issues,
        }
    }
}

// Rule implementations

pub struct NozzleTemperatureRule;

impl ValidationRule for NozzleTemperatureRule {
    fn id(&self) -> &str {
        "nozzle_temperature"
    }

    fn name(&self) -> &str {
        "Nozzle temperature"
    }

    fn description(&self) -> &str {
        "M104/M109 more than 20°C above the material maximum (error) or 10°C below its minimum (warning)"
    }

    fn check(&self, line: &CommandLine, ctx: &RuleContext<'_>) -> Vec<Issue> {
        if !line.command.is_nozzle_temp() {
            return vec![];
        }
        let Some(temp) = line.active_temperature() else {
            return vec![];
        };

        let profile = ctx.material;
        if temp > profile.nozzle_max_c + NOZZLE_OVER_MARGIN_C {
            vec![Issue::at(
                line,
                self.id(),
                Severity::Error,
                format!(
                    "Temperature {}°C is dangerously high for {} (max recommended: {}°C)",
                    temp, ctx.material_name, profile.nozzle_max_c
                ),
            )]
        } else if temp < profile.nozzle_min_c - NOZZLE_UNDER_MARGIN_C {
            vec![Issue::at(
                line,
                self.id(),
                Severity::Warning,
                format!(
                    "Temperature {}°C is low for {} (min recommended: {}°C)",
                    temp, ctx.material_name, profile.nozzle_min_c
                ),
            )]
        } else {
            vec![]
        }
    }
}

pub struct BedTemperatureRule;

impl ValidationRule for BedTemperatureRule {
    fn id(&self) -> &str {
        "bed_temperature"
    }

    fn name(&self) -> &str {
        "Bed temperature"
    }

    fn description(&self) -> &str {
        "M140/M190 more than 30°C above the material bed temperature"
    }

    fn check(&self, line: &CommandLine, ctx: &RuleContext<'_>) -> Vec<Issue> {
        if !line.command.is_bed_temp() {
            return vec![];
        }
        match line.active_temperature() {
            Some(temp) if temp > ctx.material.bed_c + BED_OVER_MARGIN_C => vec![Issue::at(
                line,
                self.id(),
                Severity::Warning,
                format!(
                    "Bed temperature {}°C is high (recommended: {}°C for {})",
                    temp, ctx.material.bed_c, ctx.material_name
                ),
            )],
            _ => vec![],
        }
    }
}

pub struct FeedRateRule;

impl ValidationRule for FeedRateRule {
    fn id(&self) -> &str {
        "feed_rate"
    }

    fn name(&self) -> &str {
        "Feed rate"
    }

    fn description(&self) -> &str {
        "G1 feed rate above 9000 mm/min (150 mm/s) or below 100 mm/min"
    }

    fn check(&self, line: &CommandLine, _ctx: &RuleContext<'_>) -> Vec<Issue> {
        if !line.is_linear_move() {
            return vec![];
        }
        match line.param('F') {
            Some(speed) if speed > MAX_FEED_RATE => vec![Issue::at(
                line,
                self.id(),
                Severity::Warning,
                format!(
                    "High speed {} mm/min detected (>150 mm/s may cause quality issues)",
                    speed
                ),
            )],
            Some(speed) if speed != 0.0 && speed < MIN_FEED_RATE => vec![Issue::at(
                line,
                self.id(),
                Severity::Warning,
                format!("Very low speed {} mm/min detected", speed),
            )],
            _ => vec![],
        }
    }
}

pub struct ExtrusionRule;

impl ValidationRule for ExtrusionRule {
    fn id(&self) -> &str {
        "extrusion"
    }

    fn name(&self) -> &str {
        "Extrusion amount"
    }

    fn description(&self) -> &str {
        "G1 E above 100 (likely a slicer scale error) or retract beyond 10 mm"
    }

    fn check(&self, line: &CommandLine, _ctx: &RuleContext<'_>) -> Vec<Issue> {
        if !line.is_linear_move() {
            return vec![];
        }
        match line.param('E') {
            Some(e) if e > MAX_EXTRUSION => vec![Issue::at(
                line,
                self.id(),
                Severity::Error,
                format!("Suspicious E value: {} (likely slicer error)", e),
            )],
            Some(e) if e < MAX_RETRACT => vec![Issue::at(
                line,
                self.id(),
                Severity::Warning,
                format!("Large retract: {} mm", e),
            )],
            _ => vec![],
        }
    }
}

pub struct DangerousCommandRule;

impl ValidationRule for DangerousCommandRule {
    fn id(&self) -> &str {
        "dangerous_command"
    }

    fn name(&self) -> &str {
        "Dangerous command"
    }

    fn description(&self) -> &str {
        "Emergency stop (M112) and quick stop (M410)"
    }

    fn check(&self, line: &CommandLine, _ctx: &RuleContext<'_>) -> Vec<Issue> {
        if line.command.is_dangerous() {
            vec![Issue::at(
                line,
                self.id(),
                Severity::Warning,
                format!("Dangerous command {} detected", line.command),
            )]
        } else {
            vec![]
        }
    }
}

pub struct SafeRangeRule;

impl ValidationRule for SafeRangeRule {
    fn id(&self) -> &str {
        "safe_range"
    }

    fn name(&self) -> &str {
        "Safe parameter range"
    }

    fn description(&self) -> &str {
        "Every E/F/X/Y/Z/S value on any line must lie inside its absolute range"
    }

    fn check(&self, line: &CommandLine, ctx: &RuleContext<'_>) -> Vec<Issue> {
        line.parameters
            .iter()
            .filter_map(|(&letter, &value)| {
                let range = ctx.safe_ranges.violation(letter, value)?;
                Some(Issue::at(
                    line,
                    self.id(),
                    Severity::Error,
                    format!(
                        "Parameter {}={} out of safe range [{}, {}]",
                        letter, value, range.min, range.max
                    ),
                ))
            })
            .collect()
    }
}
