//! # contract-rs
//!
//! CLI tool for generating TypeScript, Zod and OpenAPI output from contract
//! documents, and for checking payloads against them.
//!
//! ## Usage
//!
//! ```bash
//! # Generate every target for every namespace
//! contract-rs generate
//!
//! # Only Zod schemas, to a specific output directory
//! contract-rs generate --target zod --output ./web/src/generated
//!
//! # Dry run to preview changes
//! contract-rs generate --dry-run
//!
//! # Fail if generated files are stale
//! contract-rs check --path ./generated
//!
//! # Validate a payload file against a type
//! contract-rs validate-payload --namespace billing --type InvoiceCreatePayload --payload invoice.json
//!
//! # Initialize configuration
//! contract-rs init
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

use contract_rs::pipeline::Direction;
use contract_rs_cli::{
    config::{CliArgs, Config, ConfigManager, CONFIG_FILENAME},
    error::{CliError, CliResult, LoadError},
    generator::{ContractGenerator, ContractSet, Drift},
    loader::ContractLoader,
    writer::{FileWriter, WriteResult},
};

#[derive(Parser)]
#[command(name = "contract-rs")]
#[command(author, version, about = "Generate TypeScript, Zod and OpenAPI output from API contracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate output files from contract documents
    Generate {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory containing contract documents
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for generated files
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Preview changes without writing files
        #[arg(long)]
        dry_run: bool,

        /// Only run one generator (ts, typescript, zod, openapi)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Check that generated files are up-to-date
    Check {
        /// Directory holding the generated files
        #[arg(short, long)]
        path: PathBuf,

        /// Directory containing contract documents
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a JSON payload against a contract type
    ValidatePayload {
        /// Type name, e.g. InvoiceCreatePayload
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Namespace the type is declared in
        #[arg(short, long)]
        namespace: String,

        /// JSON file holding the payload
        #[arg(short, long)]
        payload: PathBuf,

        /// How the payload arrives
        #[arg(short, long, value_enum, default_value_t = DirectionArg::Body)]
        direction: DirectionArg,

        /// Directory containing contract documents
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize a new contract-rs configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    Query,
    Body,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Query => Direction::Query,
            DirectionArg::Body => Direction::Body,
        }
    }
}

fn main() -> ExitCode {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Generate {
            config,
            input,
            output,
            dry_run,
            target,
        } => {
            let config = load_config(
                config.as_deref(),
                CliArgs {
                    input,
                    output,
                    target,
                    ..Default::default()
                },
            )?;
            cmd_generate(&config, dry_run)
        }

        Commands::Check {
            path,
            input,
            config,
        } => {
            let config = load_config(
                config.as_deref(),
                CliArgs {
                    input,
                    ..Default::default()
                },
            )?;
            cmd_check(&config, &path)
        }

        Commands::ValidatePayload {
            type_name,
            namespace,
            payload,
            direction,
            input,
            config,
        } => {
            let config = load_config(
                config.as_deref(),
                CliArgs {
                    input,
                    ..Default::default()
                },
            )?;
            cmd_validate_payload(&config, &namespace, &type_name, &payload, direction.into())
        }

        Commands::Init { output, force } => cmd_init(output, force),
    }
}

fn load_config(path: Option<&Path>, args: CliArgs) -> CliResult<Config> {
    let config = ConfigManager::merge_cli_args(ConfigManager::load(path)?, &args);
    config.validate()?;
    Ok(config)
}

/// Load contracts and build the registry.
fn build(generator: &ContractGenerator) -> CliResult<ContractSet> {
    let config = generator.config();
    println!("{}", "Loading contract documents...".cyan());

    let mut loader = ContractLoader::new(&config.input.dir);
    if let Some(ref pattern) = config.input.filter {
        loader = loader.with_filter(pattern)?;
    }
    let contracts = loader.load()?;
    println!(
        "  Found {} document(s)",
        contracts.len().to_string().green()
    );

    let set = generator.build(&contracts)?;
    println!(
        "  Registered {} type(s) in {} namespace(s)",
        set.registry.len().to_string().green(),
        set.namespaces.len().to_string().green()
    );
    Ok(set)
}

/// Generate command implementation.
fn cmd_generate(config: &Config, dry_run: bool) -> CliResult<()> {
    let generator = ContractGenerator::new(config.clone());
    let set = build(&generator)?;

    println!("{}", "Generating output...".cyan());
    let output = generator.generate(&set)?;

    let writer = FileWriter::new(dry_run);
    for result in writer.write_all(&config.output.dir, &output)? {
        match result {
            WriteResult::Written { path, bytes } => {
                println!("{} Written {} bytes to {}", "✓".green(), bytes, path.display());
            }
            WriteResult::Unchanged { path } => {
                println!("{} Unchanged {}", "·".dimmed(), path.display());
            }
            WriteResult::DryRun { path, content } => {
                println!("{} Would write to {}:", "[dry-run]".yellow(), path.display());
                println!("{}", "─".repeat(60).dimmed());
                println!("{}", content);
                println!("{}", "─".repeat(60).dimmed());
            }
        }
    }

    Ok(())
}

/// Check command implementation.
fn cmd_check(config: &Config, path: &Path) -> CliResult<()> {
    if !path.exists() {
        return Err(LoadError::not_found(path.to_path_buf()).into());
    }

    let generator = ContractGenerator::new(config.clone());
    let set = build(&generator)?;

    println!("{}", "Checking generated files...".cyan());
    let output = generator.generate(&set)?;
    let drift = generator.check(&output, path)?;

    if drift.is_empty() {
        println!("{} {} file(s) up-to-date", "✓".green(), output.files.len());
        return Ok(());
    }

    for entry in &drift {
        match entry {
            Drift::Missing(file) => println!("  {} missing {}", "✗".red(), file.display()),
            Drift::Changed(file) => println!("  {} changed {}", "✗".red(), file.display()),
        }
    }
    println!("  Run 'contract-rs generate' to update");
    Err(CliError::Validation(format!(
        "{} generated file(s) out of date",
        drift.len()
    )))
}

/// Validate-payload command implementation.
fn cmd_validate_payload(
    config: &Config,
    namespace: &str,
    type_name: &str,
    payload: &Path,
    direction: Direction,
) -> CliResult<()> {
    let content = std::fs::read_to_string(payload)?;
    let raw: Value = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: payload.to_path_buf(),
        source,
    })?;

    let generator = ContractGenerator::new(config.clone());
    let set = build(&generator)?;
    let outcome = set.validate_payload(config, namespace, type_name, direction, raw)?;

    if outcome.issues.is_empty() {
        println!("{} Payload matches {}", "✓".green(), type_name);
        println!("{}", render_json(&outcome.params));
        return Ok(());
    }

    println!("{} Payload does not match {}", "✗".red(), type_name);
    println!("{}", render_json(&outcome.issues));
    Err(CliError::Validation(format!(
        "{} issue(s) in {}",
        outcome.issues.len(),
        payload.display()
    )))
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> CliResult<()> {
    if output.exists() && !force {
        println!(
            "{} Configuration file already exists: {}",
            "Error:".red(),
            output.display()
        );
        println!("  Use --force to overwrite");
        return Err(CliError::Validation(
            "Configuration file already exists".to_string(),
        ));
    }

    std::fs::write(&output, ConfigManager::default_config_content())?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

fn render_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
