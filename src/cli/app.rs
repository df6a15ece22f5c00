//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{show, stages, validate};

#[derive(Parser)]
#[command(name = "pipelane")]
#[command(author, version, about = "Pipeline stage layout for continuous-delivery deployments")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the stage layout of a deployment file
    Show {
        /// Path to the deployment file (.json, .yaml or .yml)
        file: String,

        /// How to treat requirements that reference unknown stage IDs
        #[arg(long, value_enum, default_value = "error")]
        dangling: show::DanglingFlag,

        /// Reproduce the historical column scan (stages with requirements
        /// spanning non-adjacent columns appear more than once)
        #[arg(long)]
        legacy_duplicates: bool,
    },

    /// Check a deployment file for structural problems
    Validate {
        /// Path to the deployment file
        file: String,
    },

    /// List the stages of a deployment file
    Stages {
        /// Path to the deployment file
        file: String,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    match cli.command {
        Commands::Show {
            file,
            dangling,
            legacy_duplicates,
        } => show::run(&output, &file, dangling, legacy_duplicates)?,

        Commands::Validate { file } => validate::run(&output, &file)?,

        Commands::Stages { file } => stages::run(&output, &file)?,
    }

    Ok(())
}
