//! GCodeGuard CLI - G-code validation and print analysis from the command line.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gcodeguard::analyzer::metrics::MetricsCalculator;
use gcodeguard::generator::{
    DEFAULT_BED_TEMP_C, DEFAULT_NOZZLE_TEMP_C, DEFAULT_PURGE_LENGTH_MM,
};
use gcodeguard::{
    AnalysisOptions, ExtrusionMode, FileAnalysis, GCodeGuardCore, GcodeGenerator, GcodeParser,
    ProfileRegistry, Validator,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gcodeguard")]
#[command(about = "G-code validation and print analysis tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more G-code files
    Check {
        /// Paths to .gcode files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if findings at this severity or higher exist
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Analyze all G-code files in a directory
    Project {
        /// Path to project directory
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if findings at this severity or higher exist
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Print time, filament and cost estimates for a file
    Metrics {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// List material profiles and safe ranges
    Materials {
        /// Also show descriptions and safe ranges
        #[arg(short, long)]
        verbose: bool,

        /// Directory of extra material profile JSON files
        #[arg(long, value_name = "DIR")]
        profiles_dir: Option<PathBuf>,
    },

    /// Print a canonical G-code sequence
    Generate {
        #[command(subcommand)]
        sequence: GenerateCommand,
    },

    /// List available validation rules
    Rules {
        /// Show detailed rule descriptions
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Home, heat and prime
    Start {
        #[arg(long, default_value_t = DEFAULT_BED_TEMP_C)]
        bed: f64,
        #[arg(long, default_value_t = DEFAULT_NOZZLE_TEMP_C)]
        nozzle: f64,
    },
    /// Heaters off, home X/Y, motors off
    End,
    /// Purge line along X
    Purge {
        /// Line length in mm
        #[arg(long, default_value_t = DEFAULT_PURGE_LENGTH_MM)]
        length: f64,
    },
}

#[derive(Args)]
struct AnalysisArgs {
    /// Material profile (PLA, PETG, ABS, TPU, ASA)
    #[arg(short, long)]
    material: Option<String>,

    /// Printer profile name, echoed in reports
    #[arg(short, long)]
    printer: Option<String>,

    /// Filament diameter in mm
    #[arg(long)]
    diameter: Option<f64>,

    /// Filament density in g/cm³
    #[arg(long)]
    density: Option<f64>,

    /// Filament cost per gram in USD
    #[arg(long)]
    cost_per_gram: Option<f64>,

    /// How E values are read when summing filament
    #[arg(long, value_enum)]
    extrusion_mode: Option<ExtrusionModeArg>,

    /// JSON file with analysis options; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of extra material profile JSON files
    #[arg(long, value_name = "DIR")]
    profiles_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExtrusionModeArg {
    /// Sum every positive E as a length
    RawSum,
    /// E is an absolute extruder position
    Absolute,
}

impl From<ExtrusionModeArg> for ExtrusionMode {
    fn from(arg: ExtrusionModeArg) -> Self {
        match arg {
            ExtrusionModeArg::RawSum => ExtrusionMode::RawSum,
            ExtrusionModeArg::Absolute => ExtrusionMode::Absolute,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let result = match cli.command {
        Commands::Check {
            files,
            format,
            fail_on,
            analysis,
        } => handle_check(&files, format, fail_on, &analysis),
        Commands::Project {
            dir,
            format,
            fail_on,
            analysis,
        } => handle_project(&dir, format, fail_on, &analysis),
        Commands::Metrics {
            file,
            json,
            analysis,
        } => handle_metrics(&file, json, &analysis).map(|_| 0),
        Commands::Materials {
            verbose,
            profiles_dir,
        } => {
            handle_materials(verbose, profiles_dir.as_deref());
            Ok(0)
        }
        Commands::Generate { sequence } => {
            handle_generate(sequence);
            Ok(0)
        }
        Commands::Rules { verbose } => {
            handle_rules(verbose);
            Ok(0)
        }
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(profiles_dir: Option<&Path>) -> ProfileRegistry {
    match profiles_dir {
        Some(dir) => {
            let (registry, errors) = ProfileRegistry::with_directory(dir);
            for error in errors {
                tracing::warn!("{}", error);
            }
            registry
        }
        None => ProfileRegistry::builtin(),
    }
}

fn build_analysis(args: &AnalysisArgs) -> anyhow::Result<(GCodeGuardCore, AnalysisOptions)> {
    let mut options = match &args.config {
        Some(path) => AnalysisOptions::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisOptions::default(),
    };
    if let Some(material) = &args.material {
        options.material = material.clone();
    }
    if let Some(printer) = &args.printer {
        options.printer_profile = printer.clone();
    }
    if let Some(diameter) = args.diameter {
        options.filament.diameter_mm = diameter;
    }
    if let Some(density) = args.density {
        options.filament.density_g_cm3 = density;
    }
    if let Some(cost) = args.cost_per_gram {
        options.filament.cost_per_gram_usd = cost;
    }
    if let Some(mode) = args.extrusion_mode {
        options.filament.extrusion_mode = mode.into();
    }
    options.filament.validate()?;

    let registry = load_registry(args.profiles_dir.as_deref());
    Ok((GCodeGuardCore::new(Arc::new(registry)), options))
}

fn handle_check(
    files: &[PathBuf],
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    args: &AnalysisArgs,
) -> anyhow::Result<i32> {
    let (core, options) = build_analysis(args)?;

    let results = files
        .par_iter()
        .map(|file| {
            core.analyze_file(file, &options)
                .with_context(|| format!("failed to analyze {}", file.display()))
        })
        .collect::<anyhow::Result<Vec<FileAnalysis>>>()?;

    output_results(&results, &format)?;
    Ok(exit_code_for(&results, fail_on.as_ref()))
}

fn handle_project(
    dir: &Path,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    args: &AnalysisArgs,
) -> anyhow::Result<i32> {
    let (core, options) = build_analysis(args)?;
    let results = core
        .analyze_project(dir, &options)
        .with_context(|| format!("failed to analyze project {}", dir.display()))?;

    if results.is_empty() {
        eprintln!("No G-code files found in {}", dir.display());
    }
    output_results(&results, &format)?;
    Ok(exit_code_for(&results, fail_on.as_ref()))
}

fn exit_code_for(results: &[FileAnalysis], fail_on: Option<&FailOnSeverity>) -> i32 {
    match fail_on {
        Some(severity) if results.iter().any(|r| should_fail(r, severity)) => 1,
        _ => 0,
    }
}

fn should_fail(result: &FileAnalysis, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => result.report.has_errors(),
        FailOnSeverity::Warning => result.report.has_errors_or_warnings(),
    }
}

fn output_results(results: &[FileAnalysis], format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Human => {
            output_human(results);
            Ok(())
        }
        OutputFormat::Json => output_json(results),
        OutputFormat::Github => {
            output_github(results);
            Ok(())
        }
    }
}

fn output_human(results: &[FileAnalysis]) {
    for result in results {
        let report = &result.report;
        println!("\nFile: {}", result.file.display());
        println!("{}", "─".repeat(60));
        println!(
            "  Material: {}  Printer: {}  Commands: {}",
            report.material, report.printer_profile, report.command_count
        );

        if !report.errors.is_empty() {
            println!("\n  ERRORS:");
            for issue in &report.errors {
                println!("    - {}", issue.message);
            }
        }
        if !report.warnings.is_empty() {
            println!("\n  WARNINGS:");
            for issue in &report.warnings {
                println!("    - {}", issue.message);
            }
        }
        if !report.anomalies.is_empty() {
            println!("\n  ANOMALIES:");
            for anomaly in &report.anomalies {
                match anomaly.line {
                    Some(line) => println!(
                        "    - [{:?}] Line {}: {}",
                        anomaly.severity, line, anomaly.description
                    ),
                    None => println!("    - [{:?}] {}", anomaly.severity, anomaly.description),
                }
            }
        }
        if !report.recommendations.is_empty() {
            println!("\n  RECOMMENDATIONS:");
            for rec in &report.recommendations {
                println!("    - [{:?}] {}: {}", rec.priority, rec.title, rec.description);
                println!("      {}", rec.action);
            }
        }
        if report.total_issues() == 0 && report.anomaly_count == 0 {
            println!("\n  No issues found");
        }

        let metrics = &report.detailed_metrics;
        println!("\n  Summary:");
        println!("    Errors:          {}", report.errors.len());
        println!("    Warnings:        {}", report.warnings.len());
        println!("    Anomalies:       {}", report.anomaly_count);
        println!("    Recommendations: {}", report.recommendation_count);
        println!("    Print time:      {:.1} min", metrics.estimated_time_minutes);
        println!("    Filament:        {:.2} g", metrics.basic.filament_weight_g);
        println!("    Cost:            ${:.2}", metrics.basic.estimated_cost_usd);
        println!("    Layers:          {}", metrics.basic.layer_count);
    }
}

fn output_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "results": results,
        "summary": {
            "total_files": results.len(),
            "valid_files": results.iter().filter(|r| r.report.valid).count(),
            "total_errors": results.iter().map(|r| r.report.errors.len()).sum::<usize>(),
            "total_warnings": results.iter().map(|r| r.report.warnings.len()).sum::<usize>(),
        }
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_github(results: &[FileAnalysis]) {
    for result in results {
        let file = result.file.display();
        let findings = result
            .report
            .errors
            .iter()
            .map(|i| ("error", i))
            .chain(result.report.warnings.iter().map(|i| ("warning", i)));
        for (level, issue) in findings {
            match issue.line_number {
                Some(line) => println!("::{} file={},line={}::{}", level, file, line, issue.message),
                None => println!("::{} file={}::{}", level, file, issue.message),
            }
        }
        for anomaly in &result.report.anomalies {
            match anomaly.line {
                Some(line) => println!(
                    "::notice file={},line={}::{}",
                    file, line, anomaly.description
                ),
                None => println!("::notice file={}::{}", file, anomaly.description),
            }
        }
    }
}

fn handle_metrics(file: &Path, json: bool, args: &AnalysisArgs) -> anyhow::Result<()> {
    let (_, options) = build_analysis(args)?;
    let lines = GcodeParser::parse_file(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let metrics = MetricsCalculator::detailed(&lines, &options.filament);

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("Metrics for: {}", file.display());
    println!(
        "  Estimated time:  {:.1} min ({:.2} h)",
        metrics.estimated_time_minutes, metrics.basic.estimated_time_hours
    );
    println!(
        "  Filament:        {:.2} m, {:.2} g",
        metrics.filament_length_m, metrics.basic.filament_weight_g
    );
    println!("  Cost:            ${:.2}", metrics.basic.estimated_cost_usd);
    println!("  Layers:          {}", metrics.basic.layer_count);
    println!("  Moves:           {}", metrics.basic.total_moves);
    println!("  Distance:        {:.1} mm", metrics.total_distance_mm);
    println!("  Average speed:   {:.0} mm/min", metrics.average_speed_mm_min);
    println!("  Retracts:        {}", metrics.retract_count);
    println!("  Temp changes:    {}", metrics.temperature_changes);
    Ok(())
}

fn handle_materials(verbose: bool, profiles_dir: Option<&Path>) {
    let registry = load_registry(profiles_dir);

    println!("Material profiles:\n");
    println!("  {:<8} {:>10} {:>10} {:>6}", "Name", "Nozzle min", "Nozzle max", "Bed");
    for material in registry.materials() {
        println!(
            "  {:<8} {:>10} {:>10} {:>6}",
            material.name, material.nozzle_min_c, material.nozzle_max_c, material.bed_c
        );
        if verbose {
            if let Some(description) = &material.description {
                println!("           {}", description);
            }
        }
    }

    if verbose {
        println!("\nSafe ranges:\n");
        for range in registry.safe_ranges().iter() {
            println!(
                "  {}  [{}, {}]  {}",
                range.letter,
                range.min,
                range.max,
                range.description.as_deref().unwrap_or("")
            );
        }
    }
}

fn handle_generate(sequence: GenerateCommand) {
    let lines = match sequence {
        GenerateCommand::Start { bed, nozzle } => GcodeGenerator::start_sequence(bed, nozzle),
        GenerateCommand::End => GcodeGenerator::end_sequence(),
        GenerateCommand::Purge { length } => GcodeGenerator::purge_line(length),
    };
    for line in lines {
        println!("{}", line);
    }
}

fn handle_rules(verbose: bool) {
    println!("Available validation rules:\n");

    let registry = ProfileRegistry::builtin();
    let validator = Validator::with_default_rules(&registry);
    let sequence = (
        "temperature_sequence",
        "Temperature sequence",
        "Adjacent nozzle temperature commands more than 50°C apart",
    );
    let rules = validator
        .rules()
        .iter()
        .map(|r| (r.id(), r.name(), r.description()))
        .chain(std::iter::once(sequence));

    for (id, name, description) in rules {
        println!("  {}", id);
        println!("    {}", name);
        if verbose {
            println!("    {}", description);
        }
        println!();
    }
}
