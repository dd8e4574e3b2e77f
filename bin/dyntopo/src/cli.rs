//! dyntopo CLI entry point.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dyntopo_node_core::args::{LogArgs, TopologyArgs};
use dyntopo_node_core::config::NodeConfig;
use dyntopo_node_core::logging;
use dyntopo_node_core::replay::{ReplayOptions, replay};
use dyntopo_node_core::trace::Trace;
use eyre::Result;
use tracing::{debug, warn};

/// dyntopo - live switch/host topology tracking
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Path to a TOML configuration file.
    #[arg(long, short = 'c', global = true, value_name = "PATH", env = "DYNTOPO_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Feed a recorded event trace through the topology engine.
    Replay(ReplayArgs),
    /// Print the effective configuration as TOML.
    Config(ConfigArgs),
}

/// Output format of the final topology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

/// Arguments for the `replay` command.
#[derive(Debug, Args)]
pub(crate) struct ReplayArgs {
    /// Trace file with `[[event]]` tables.
    #[arg(value_name = "TRACE")]
    pub(crate) trace: PathBuf,

    /// Verify topology invariants after every event.
    #[arg(long)]
    pub(crate) check: bool,

    /// Output format of the final topology.
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub(crate) format: OutputFormat,

    /// Topology engine overrides.
    #[command(flatten)]
    pub(crate) topology: TopologyArgs,
}

/// Arguments for the `config` command.
#[derive(Debug, Args)]
pub(crate) struct ConfigArgs {
    /// Topology engine overrides.
    #[command(flatten)]
    pub(crate) topology: TopologyArgs,
}

/// Parse arguments, set up logging, and dispatch.
pub(crate) async fn run() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    let mut config = NodeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Replay(args) => {
            config.apply_args(&args.topology);
            debug!(?config, "Effective configuration");

            let trace = Trace::load(&args.trace)?;
            let report = replay(
                trace,
                &config.topology,
                ReplayOptions { check: args.check },
            )
            .await?;

            for (step, error) in &report.dropped {
                warn!(step, %error, "Dropped event");
            }
            match args.format {
                OutputFormat::Pretty => print!("{}", report.snapshot),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report.snapshot)?)
                }
            }
        }
        Commands::Config(args) => {
            config.apply_args(&args.topology);
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
