use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter letter to value, ordered by letter.
pub type Parameters = BTreeMap<char, f64>;

/// Recognized G-code mnemonics.
///
/// Anything the parser does not recognize is kept verbatim in
/// [`Command::Other`] so unsupported dialects never abort an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    RapidMove,
    LinearMove,
    ArcCw,
    ArcCcw,
    Home,
    BedLevel,
    SetPosition,
    SetNozzleTemp,
    WaitNozzleTemp,
    SetBedTemp,
    WaitBedTemp,
    EmergencyStop,
    QuickStop,
    Other(String),
}

impl Command {
    pub fn from_mnemonic(token: &str) -> Self {
        match token {
            "G0" => Command::RapidMove,
            "G1" => Command::LinearMove,
            "G2" => Command::ArcCw,
            "G3" => Command::ArcCcw,
            "G28" => Command::Home,
            "G29" => Command::BedLevel,
            "G92" => Command::SetPosition,
            "M104" => Command::SetNozzleTemp,
            "M109" => Command::WaitNozzleTemp,
            "M140" => Command::SetBedTemp,
            "M190" => Command::WaitBedTemp,
            "M112" => Command::EmergencyStop,
            "M410" => Command::QuickStop,
            other => Command::Other(other.to_string()),
        }
    }

    pub fn mnemonic(&self) -> &str {
        match self {
            Command::RapidMove => "G0",
            Command::LinearMove => "G1",
            Command::ArcCw => "G2",
            Command::ArcCcw => "G3",
            Command::Home => "G28",
            Command::BedLevel => "G29",
            Command::SetPosition => "G92",
            Command::SetNozzleTemp => "M104",
            Command::WaitNozzleTemp => "M109",
            Command::SetBedTemp => "M140",
            Command::WaitBedTemp => "M190",
            Command::EmergencyStop => "M112",
            Command::QuickStop => "M410",
            Command::Other(token) => token,
        }
    }

    pub fn is_nozzle_temp(&self) -> bool {
        matches!(self, Command::SetNozzleTemp | Command::WaitNozzleTemp)
    }

    pub fn is_bed_temp(&self) -> bool {
        matches!(self, Command::SetBedTemp | Command::WaitBedTemp)
    }

    /// Nozzle or bed temperature set/wait.
    pub fn is_temperature(&self) -> bool {
        self.is_nozzle_temp() || self.is_bed_temp()
    }

    /// Emergency and quick-stop class commands.
    pub fn is_dangerous(&self) -> bool {
        matches!(self, Command::EmergencyStop | Command::QuickStop)
    }

    pub fn is_g_code(&self) -> bool {
        self.mnemonic().starts_with('G')
    }

    pub fn is_m_code(&self) -> bool {
        self.mnemonic().starts_with('M')
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl Serialize for Command {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mnemonic())
    }
}

impl<'de> Deserialize<'de> for Command {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Command::from_mnemonic(&token))
    }
}

/// One non-empty line of a G-code program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLine {
    /// 1-based line index in the source text.
    pub line_number: usize,
    pub command: Command,
    pub parameters: Parameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CommandLine {
    pub fn param(&self, letter: char) -> Option<f64> {
        self.parameters.get(&letter).copied()
    }

    pub fn has_param(&self, letter: char) -> bool {
        self.parameters.contains_key(&letter)
    }

    /// `S` value, treating `S0` (heater off) as absent.
    pub fn active_temperature(&self) -> Option<f64> {
        self.param('S').filter(|s| *s != 0.0)
    }

    pub fn is_linear_move(&self) -> bool {
        self.command == Command::LinearMove
    }

    /// Linear move carrying a positive `E`.
    pub fn is_extruding(&self) -> bool {
        self.is_linear_move() && self.param('E').is_some_and(|e| e > 0.0)
    }

    /// Linear move carrying a negative `E`.
    pub fn is_retract(&self) -> bool {
        self.is_linear_move() && self.param('E').is_some_and(|e| e < 0.0)
    }
}
