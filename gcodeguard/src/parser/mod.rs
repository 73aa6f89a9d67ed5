pub mod gcode;
pub mod schema;

// Re-export for convenience
pub use gcode::GcodeParser;
pub use schema::{Command, CommandLine, Parameters};
