use clap::{Parser, Subcommand, ValueEnum};
use lsystem_gen::presets::{self, PRESETS};
use lsystem_gen::{CoverageMode, Grammar, LSystem, RunConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Stochastic L-system generator
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grammar file
    #[arg(help = "Path to the grammar file")]
    grammar_file: Option<PathBuf>,

    /// Number of generations to run
    #[arg(short = 'n', long)]
    generations: Option<usize>,

    /// Rotation angle in degrees, passed through to the renderer
    #[arg(long)]
    angle: Option<u32>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// JSON run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the coverage policy
    #[arg(long, value_enum)]
    coverage: Option<CoverageMode>,

    /// Emit every generation instead of only the last
    #[arg(long)]
    each: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write instructions here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a built-in example grammar file
    Example {
        /// Name of the preset (plant, koch, algae)
        #[arg(help = "Name of the preset grammar", default_value = "plant")]
        name: String,

        /// Output file path
        #[arg(help = "Output file path")]
        output: Option<PathBuf>,
    },
    /// Print the parsed rule table and coverage issues as JSON
    Inspect {
        #[arg(help = "Path to the grammar file")]
        grammar_file: PathBuf,
    },
}

/// One emitted generation, as handed to the renderer
#[derive(Serialize)]
struct GenerationReport<'a> {
    generation: usize,
    length: usize,
    angle_degrees: u32,
    instructions: &'a str,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(generations) = cli.generations {
        config.generations = generations;
    }
    if let Some(angle) = cli.angle {
        config.angle_degrees = angle;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(coverage) = cli.coverage {
        config.coverage = coverage;
    }

    init_logging(&config.log_level);

    if let Some(command) = cli.command {
        return match command {
            Commands::Example { name, output } => write_example(&name, output),
            Commands::Inspect { grammar_file } => inspect(&grammar_file, &config),
        };
    }

    let grammar_file = cli.grammar_file.ok_or("Grammar file path required")?;
    let grammar = Grammar::from_file(&grammar_file)?;
    check_coverage(&grammar, &config)?;

    info!(
        file = %grammar_file.display(),
        rules = grammar.rules().len(),
        generations = config.generations,
        "generating"
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut system = LSystem::new(grammar);
    if cli.each {
        emit(&mut out, &system, &config, cli.format)?;
        for _ in 0..config.generations {
            system.step(&mut rng)?;
            emit(&mut out, &system, &config, cli.format)?;
        }
    } else {
        system.run(config.generations, &mut rng)?;
        emit(&mut out, &system, &config, cli.format)?;
    }

    out.flush()?;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn check_coverage(grammar: &Grammar, config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    match config.coverage {
        CoverageMode::Ignore => {}
        CoverageMode::Warn => {
            for issue in grammar.coverage_issues(config.tolerance) {
                warn!("{}", issue);
            }
        }
        CoverageMode::Deny => grammar.validate(config.tolerance)?,
    }
    Ok(())
}

fn emit(
    out: &mut dyn Write,
    system: &LSystem,
    config: &RunConfig,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        Format::Text => writeln!(out, "{}", system.current())?,
        Format::Json => {
            let report = GenerationReport {
                generation: system.generation(),
                length: system.current().chars().count(),
                angle_degrees: config.angle_degrees,
                instructions: system.current(),
            };
            serde_json::to_writer(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_example(name: &str, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let preset = presets::find(name).ok_or_else(|| {
        let known: Vec<_> = PRESETS.iter().map(|p| p.name).collect();
        format!("Unknown preset: {} (known: {})", name, known.join(", "))
    })?;

    let output_path = output.unwrap_or_else(|| PathBuf::from(format!("{}.txt", preset.name)));
    fs::write(&output_path, preset.source)?;

    println!(
        "Created example {} grammar ({}) at: {}",
        preset.name,
        preset.description,
        output_path.display()
    );
    Ok(())
}

fn inspect(path: &Path, config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let grammar = Grammar::from_file(path)?;
    let issues = grammar.coverage_issues(config.tolerance);

    let report = serde_json::json!({
        "axiom": grammar.axiom(),
        "rules": grammar.rules(),
        "issues": issues,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
