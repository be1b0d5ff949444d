//! licscope: license-compatibility inference over dependency graphs

#![allow(clippy::struct_excessive_bools, clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use licscope::{
    cli::{self, CheckOptions},
    config::{AnalysisConfig, OutputConfig, ParsingConfig},
    graph::Relation,
    parsers::ParserKind,
    pipeline::{exit_codes, AnalysisInput},
    reports::ReportFormat,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with input support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported Inputs:",
        "\n  SBOM:      SPDX 2.x JSON, CycloneDX JSON",
        "\n  Native:    GN-style build graph JSON",
        "\n  Scanner:   ScanCode JSON",
        "\n  Graph:     canonical node-link JSON",
        "\n\nOutput Formats:",
        "\n  summary, json"
    )
}

#[derive(Parser)]
#[command(name = "licscope")]
#[command(version, long_version = build_long_version())]
#[command(about = "License-compatibility inference over dependency graphs", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Every edge is compatible
    1  Some edge needs review or has unknown licensing
    2  An incompatible edge was found
    3  Error occurred

EXAMPLES:
    # Check a GN build graph together with a ScanCode scan
    licscope check --native out/project.json --scancode scan.json

    # Auto-detect input formats and write JSON
    licscope check sbom.spdx.json -f json -o report.json

    # Reuse verdicts across runs
    licscope check build.json --save-kg

    # Ask about a single pair
    licscope pair MIT GPL-2.0-only --relation links-static")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Settings shared by every command that runs inference
#[derive(clap::Args)]
struct InferenceArgs {
    /// Treat unknown license ids as compatible instead of needs-review
    #[arg(long)]
    permissive_unknown: bool,

    /// Ignore the persisted knowledge graph and recompute every verdict
    #[arg(long)]
    reinfer: bool,

    /// Persist the knowledge graph after the run
    #[arg(long)]
    save_kg: bool,

    /// Knowledge graph file (defaults to the user cache directory)
    #[arg(long)]
    kg_path: Option<PathBuf>,

    /// Directory with licenses.yaml, exceptions.yaml and actions.yaml
    #[arg(long)]
    rules_dir: Option<PathBuf>,
}

/// Arguments for the `check` subcommand
#[derive(Parser)]
struct CheckArgs {
    /// Input files with auto-detected format
    inputs: Vec<PathBuf>,

    /// SPDX or CycloneDX JSON document
    #[arg(long = "sbom", value_name = "FILE")]
    sbom: Vec<PathBuf>,

    /// Native build graph (GN `desc --format=json` style)
    #[arg(long = "native", alias = "gn", value_name = "FILE")]
    native: Vec<PathBuf>,

    /// ScanCode JSON scan
    #[arg(long = "scancode", value_name = "FILE")]
    scancode: Vec<PathBuf>,

    /// Canonical graph exported by an earlier run
    #[arg(long = "graph", value_name = "FILE")]
    graph: Vec<PathBuf>,

    #[command(flatten)]
    inference: InferenceArgs,

    /// Skip `testonly` targets in native build graphs
    #[arg(long)]
    skip_testonly: bool,

    /// Keep `LicenseRef-scancode-*` ids as reported by ScanCode
    #[arg(long)]
    no_strip_scancode_refs: bool,

    /// Output format
    #[arg(short = 'f', long, default_value = "summary")]
    format: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the resolved graph as canonical JSON
    #[arg(long, value_name = "FILE")]
    export_graph: Option<PathBuf>,
}

impl CheckArgs {
    fn analysis_inputs(&self) -> Vec<AnalysisInput> {
        let explicit = [
            (ParserKind::Sbom, &self.sbom),
            (ParserKind::Native, &self.native),
            (ParserKind::Scancode, &self.scancode),
        ];
        let mut inputs: Vec<AnalysisInput> = explicit
            .into_iter()
            .flat_map(|(kind, paths)| {
                paths
                    .iter()
                    .map(move |path| AnalysisInput::with_parser(path, kind))
            })
            .collect();
        inputs.extend(self.graph.iter().map(AnalysisInput::canonical_graph));
        inputs.extend(self.inputs.iter().map(AnalysisInput::detect));
        inputs
    }
}

/// Arguments for the `pair` subcommand
#[derive(Parser)]
struct PairArgs {
    /// License expression of the component that uses the other
    source: String,

    /// License expression of the component being used
    target: String,

    /// Edge relation (deps, sources, links-static, links-dynamic)
    #[arg(short, long, default_value = "links-static")]
    relation: Relation,

    #[command(flatten)]
    inference: InferenceArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer license compatibility for every edge of the input graphs
    Check(CheckArgs),

    /// Infer the verdict for a single license pair
    Pair(PairArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate an example .licscope.yaml in the current directory
    InitConfig,
}

/// CLI flags as a config record; merged over the config file.
fn cli_overrides(inference: &InferenceArgs, parsing: ParsingConfig, output: OutputConfig) -> AnalysisConfig {
    AnalysisConfig {
        permissive_unknown: inference.permissive_unknown,
        reinfer: inference.reinfer,
        save_kg: inference.save_kg,
        kg_path: inference.kg_path.clone(),
        rules_dir: inference.rules_dir.clone(),
        parsing,
        output,
    }
}

fn load_config(path: Option<&std::path::Path>, overrides: &AnalysisConfig, quiet: bool) -> AnalysisConfig {
    let (config, loaded_from) = AnalysisConfig::from_file_with_overrides(path, overrides);
    if let Some(path) = loaded_from {
        if !quiet {
            tracing::info!("Loaded config from {}", path.display());
        }
    }
    config
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check(args) => {
            let inputs = args.analysis_inputs();
            if inputs.is_empty() {
                anyhow::bail!("no inputs given; pass files or use --sbom/--native/--scancode/--graph");
            }
            let overrides = cli_overrides(
                &args.inference,
                ParsingConfig {
                    skip_testonly: args.skip_testonly,
                    strip_scancode_refs: !args.no_strip_scancode_refs,
                },
                OutputConfig {
                    format: args.format,
                    file: args.output,
                    export_graph: args.export_graph,
                },
            );
            let config = load_config(cli.config.as_deref(), &overrides, cli.quiet);
            cli::run_check(
                config,
                inputs,
                CheckOptions {
                    no_color: cli.no_color,
                    quiet: cli.quiet,
                },
            )
        }

        Commands::Pair(args) => {
            let overrides = cli_overrides(&args.inference, ParsingConfig::default(), OutputConfig::default());
            let config = load_config(cli.config.as_deref(), &overrides, cli.quiet);
            cli::run_pair(config, &args.source, &args.target, args.relation)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "licscope", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }

        Commands::ConfigSchema { output } => {
            let schema = licscope::config::generate_json_schema();
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => {
                    println!("{schema}");
                }
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::InitConfig => {
            let target = std::env::current_dir()
                .context("cannot determine current directory")?
                .join(".licscope.yaml");
            if target.exists() {
                anyhow::bail!(
                    "{} already exists. Remove it first to re-initialize.",
                    target.display()
                );
            }
            std::fs::write(&target, licscope::config::generate_example_config())
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Created {}", target.display());
            Ok(exit_codes::SUCCESS)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match run(cli) {
        Ok(code) => {
            if code != exit_codes::SUCCESS {
                std::process::exit(code);
            }
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}
