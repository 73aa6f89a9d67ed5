//! Line-oriented G-code parser.
//!
//! Parsing is total: any input text produces a (possibly empty) sequence of
//! [`CommandLine`] records. Tokens that are not a single uppercase letter
//! followed by a finite number are dropped without failing the line.

use std::path::Path;

use crate::core::GCodeGuardError;
use crate::parser::schema::{Command, CommandLine, Parameters};

pub struct GcodeParser;

impl GcodeParser {
    /// Parse a complete program. Line numbers count every physical line,
    /// including blank and comment-only ones.
    pub fn parse(content: &str) -> Vec<CommandLine> {
        let lines: Vec<CommandLine> = content
            .split('\n')
            .enumerate()
            .filter_map(|(index, raw)| Self::parse_line(raw, index + 1))
            .collect();
        tracing::debug!("Parsed {} G-code commands", lines.len());
        lines
    }

    /// Parse one line; `None` when nothing but whitespace or a comment remains.
    pub fn parse_line(raw: &str, line_number: usize) -> Option<CommandLine> {
        let (code, comment) = match raw.split_once(';') {
            Some((code, comment)) => (code, Some(comment.trim().to_string())),
            None => (raw, None),
        };

        let mut tokens = code.split_whitespace();
        let command = Command::from_mnemonic(tokens.next()?);

        let mut parameters = Parameters::new();
        for token in tokens {
            if let Some((letter, value)) = parse_parameter(token) {
                parameters.insert(letter, value);
            }
        }

        Some(CommandLine {
            line_number,
            command,
            parameters,
            comment,
        })
    }

    /// Read and parse a file. Read failures are returned unchanged.
    pub fn parse_file(path: &Path) -> Result<Vec<CommandLine>, GCodeGuardError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }
}

fn parse_parameter(token: &str) -> Option<(char, f64)> {
    let mut chars = token.chars();
    let letter = chars.next().filter(|c| c.is_ascii_uppercase())?;
    let value: f64 = chars.as_str().parse().ok()?;
    value.is_finite().then_some((letter, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_linear_move() {
        let lines = GcodeParser::parse("G1 X10 Y10 Z0.2 E1.5 F1500");
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.line_number, 1);
        assert_eq!(line.command, Command::LinearMove);
        assert_eq!(line.param('X'), Some(10.0));
        assert_eq!(line.param('Y'), Some(10.0));
        assert_eq!(line.param('Z'), Some(0.2));
        assert_eq!(line.param('E'), Some(1.5));
        assert_eq!(line.param('F'), Some(1500.0));
        assert_eq!(line.parameters.len(), 5);
        assert!(line.comment.is_none());
    }

    #[test]
    fn test_malformed_token_dropped() {
        let lines = GcodeParser::parse("G1 X Y20 x5 F1.2.3 E-0.8");
        assert_eq!(lines.len(), 1);
        let params = &lines[0].parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params.get(&'Y'), Some(&20.0));
        assert_eq!(params.get(&'E'), Some(&-0.8));
    }

    #[test]
    fn test_non_finite_values_dropped() {
        let line = GcodeParser::parse_line("G1 Xinf Ynan Z1", 3).unwrap();
        assert_eq!(line.parameters.len(), 1);
        assert_eq!(line.param('Z'), Some(1.0));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let line = GcodeParser::parse_line("G1 X1 X2", 1).unwrap();
        assert_eq!(line.param('X'), Some(2.0));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let text = "; header\n\nG28 ; Home all axes\n   \nM104 S200;set";
        let lines = GcodeParser::parse(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_number, 3);
        assert_eq!(lines[0].command, Command::Home);
        assert_eq!(lines[0].comment.as_deref(), Some("Home all axes"));
        assert_eq!(lines[1].line_number, 5);
        assert_eq!(lines[1].comment.as_deref(), Some("set"));
    }

    #[test]
    fn test_crlf_lines() {
        let lines = GcodeParser::parse("G1 X1\r\nG1 X2\r\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].param('X'), Some(2.0));
    }

    #[test]
    fn test_unknown_mnemonic_kept() {
        let lines = GcodeParser::parse("T0\nfoo bar X1");
        assert_eq!(lines[0].command, Command::Other("T0".to_string()));
        assert_eq!(lines[1].command, Command::Other("foo".to_string()));
        assert_eq!(lines[1].param('X'), Some(1.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(GcodeParser::parse("").is_empty());
        assert!(GcodeParser::parse("\n\n;only comments\n").is_empty());
    }
}
