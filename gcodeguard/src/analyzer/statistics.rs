//! Basic command and temperature statistics.

use serde::{Deserialize, Serialize};

use crate::parser::CommandLine;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Statistics {
    pub total_commands: usize,
    pub g_commands: usize,
    pub m_commands: usize,
    /// Any M-command carrying an `S` value.
    pub has_temperature: bool,
    /// Any linear move carrying an `E` value.
    pub has_extrusion: bool,
    /// Over every `S` value seen, 0 when there is none.
    pub max_temperature: f64,
    pub min_temperature: f64,
}

impl Statistics {
    pub fn collect(lines: &[CommandLine]) -> Self {
        let mut stats = Statistics {
            total_commands: lines.len(),
            ..Statistics::default()
        };
        let mut temps: Option<(f64, f64)> = None;

        for line in lines {
            if line.command.is_g_code() {
                stats.g_commands += 1;
            } else if line.command.is_m_code() {
                stats.m_commands += 1;
                stats.has_temperature |= line.has_param('S');
            }
            if line.is_linear_move() && line.has_param('E') {
                stats.has_extrusion = true;
            }
            if let Some(s) = line.param('S') {
                temps = Some(match temps {
                    Some((min, max)) => (min.min(s), max.max(s)),
                    None => (s, s),
                });
            }
        }

        if let Some((min, max)) = temps {
            stats.min_temperature = min;
            stats.max_temperature = max;
        }
        stats
    }
}
