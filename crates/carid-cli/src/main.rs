//! carid - platform lookup and ECU fingerprinting
//!
//! Inspects the built-in platform table, resolves control parameters and
//! identifies the attached variant over the configured transport.

mod commands;
mod config;
mod output;

use anyhow::Result;
use carid_core::BusRole;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "carid")]
#[command(author, version, about = "Vehicle platform registry and ECU fingerprinting")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CARID_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered variants
    List,

    /// Show everything known about one variant
    Show {
        /// Variant key (e.g. TESLA_MODEL_3)
        variant: String,
    },

    /// Show the dialect a variant uses on each bus role
    Dialect {
        /// Variant key
        variant: String,

        /// Only this bus role (e.g. party, pt, radar)
        role: Option<BusRole>,
    },

    /// List variants that name a dialect explicitly
    Users {
        /// Dialect name
        dialect: String,
    },

    /// Print the documentation table
    Docs,

    /// Resolve control parameters for a variant
    Resolve {
        /// Variant key
        variant: String,

        /// Enable our own longitudinal control
        #[arg(long)]
        experimental_long: bool,

        /// The SDM1 message was not seen on the bus
        #[arg(long)]
        no_sdm1: bool,
    },

    /// Probe the attached vehicle and resolve its parameters
    Identify {
        /// Variant to pick when the probes cannot tell candidates apart
        #[arg(long)]
        fallback: Option<String>,

        /// Print the probe log only, skip resolution
        #[arg(long)]
        no_resolve: bool,
    },

    /// Map a drive inverter gear code or value label
    Gear {
        /// Raw code (e.g. 4) or label (e.g. DI_GEAR_D)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = config::load(cli.config.as_deref())?;
    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);

    match &cli.command {
        Commands::List => commands::list(&config, &ctx)?,

        Commands::Show { variant } => commands::show(&config, variant, &ctx)?,

        Commands::Dialect { variant, role } => commands::dialect(&config, variant, *role, &ctx)?,

        Commands::Users { dialect } => commands::users(&config, dialect, &ctx)?,

        Commands::Docs => commands::docs(&config, &ctx)?,

        Commands::Resolve {
            variant,
            experimental_long,
            no_sdm1,
        } => {
            commands::resolve(&config, variant, *experimental_long, *no_sdm1, &ctx)?;
        }

        Commands::Identify {
            fallback,
            no_resolve,
        } => {
            commands::identify(&config, fallback.as_deref(), *no_resolve, &ctx).await?;
        }

        Commands::Gear { value } => commands::gear(value, &ctx)?,
    }

    Ok(())
}
