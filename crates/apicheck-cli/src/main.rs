//! apicheck CLI - Schema conformance auditing for recorded API traffic

mod audit;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use apicheck_core::checks::{ALL_CHECKS, Check, DEFAULT_CHECKS, OPTIONAL_CHECKS, find_check};
use apicheck_core::schema::ApiSchema;
use apicheck_core::{Config, interchange};

#[derive(Parser)]
#[command(name = "apicheck")]
#[command(about = "Audit recorded HTTP interactions against an API schema")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run conformance checks over a recorded interaction log
    Audit {
        /// API schema: local YAML/JSON file or http(s) URL
        #[arg(short, long)]
        schema: Option<String>,

        /// JSONL interaction log
        #[arg(short, long)]
        interactions: Option<String>,

        /// Checks to run: "default", "all", or comma-separated names
        #[arg(long)]
        checks: Option<String>,

        /// Config file (default: .apicheck.toml)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// List available checks
    Checks,

    /// Initialize config file
    Init,

    /// Export JSON Schema for the interaction log format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Audit {
            schema,
            interactions,
            checks,
            config,
        } => {
            let cfg = if let Some(path) = config {
                Config::load(Path::new(&path))?
            } else {
                Config::load_default()?
            };

            let schema_source = schema.unwrap_or_else(|| cfg.schema.clone());
            let interactions_path = interactions
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|| cfg.interactions.clone());

            let selected = match checks {
                Some(spec) => select_checks(&spec)?,
                None if cfg.checks.is_empty() => DEFAULT_CHECKS.to_vec(),
                None => select_checks(&cfg.checks.join(","))?,
            };

            let schema = Arc::new(load_schema(&schema_source)?);
            let interactions = interchange::read_jsonl(&interactions_path)
                .with_context(|| format!("loading {}", interactions_path.display()))?;

            if cli.output != OutputFormat::Silent {
                eprintln!("Schema:       {schema_source}");
                eprintln!("Interactions: {}", interactions_path.display());
                eprintln!(
                    "Checks:       {}",
                    selected
                        .iter()
                        .map(|c| c.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                eprintln!();
            }

            let outcome = audit::run(&schema, &interactions, &selected);

            if outcome.total == 0 && outcome.errors.is_empty() {
                eprintln!("Error: No interactions were audited. Check the interaction log.");
            }

            match cli.output {
                OutputFormat::Terminal => print!("{}", outcome.to_terminal()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                OutputFormat::Silent => {}
            }

            Ok(outcome.exit_code())
        }

        Commands::Checks => {
            println!("Default checks (always run):");
            for check in DEFAULT_CHECKS {
                println!("  {}", check.name);
            }
            println!("\nOptional checks (enable with --checks):");
            for check in OPTIONAL_CHECKS {
                println!("  {}", check.name);
            }
            Ok(0)
        }

        Commands::Init => {
            let config_path = ".apicheck.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - schema: path or URL of your API schema");
            println!("  - interactions: recorded interaction log to audit");
            println!("  - checks: which checks to run");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", interchange::generate_schema());
            Ok(0)
        }
    }
}

/// Resolve a `--checks` spec into registry entries.
fn select_checks(spec: &str) -> Result<Vec<Check>> {
    match spec.trim() {
        "default" => Ok(DEFAULT_CHECKS.to_vec()),
        "all" => Ok(ALL_CHECKS.to_vec()),
        names => names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                find_check(name).copied().with_context(|| {
                    let available = ALL_CHECKS
                        .iter()
                        .map(|c| c.name)
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("unknown check '{name}' (available: {available})")
                })
            })
            .collect(),
    }
}

/// Load a schema document from a local file or over HTTP.
fn load_schema(source: &str) -> Result<ApiSchema> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::blocking::get(source)
            .and_then(reqwest::blocking::Response::error_for_status)
            .with_context(|| format!("fetching {source}"))?;
        let text = response.text().context("reading schema response body")?;
        ApiSchema::parse(&text).map_err(Into::into)
    } else {
        ApiSchema::load(Path::new(source)).map_err(Into::into)
    }
}
