// photomerge - merge photo sidecar metadata into media files
// Copyright (C) 2026  photomerge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! `photomerge` command line entry point.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use photomerge_cli::commands::{CheckCmd, CliContext, MergeCmd, SettingsCmd};
use photomerge_cli::output;
use photomerge_observability::init_tracing_with_config;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photomerge")]
#[command(version, about = "Merge photo export sidecar metadata back into your media files")]
#[command(
    long_about = "photomerge pairs exported photos and videos with their JSON sidecars and writes
the title, description, capture time, source URL and GPS position back into the
files' embedded metadata using exiftool."
)]
#[command(propagate_version = true)]
#[command(author = "photomerge Contributors")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Colored output
    #[arg(long, global = true, value_name = "WHEN", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Settings file to use instead of the per-user one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge sidecar metadata into media files
    Merge(MergeCmd),

    /// View and change settings
    Settings(SettingsCmd),

    /// Check that exiftool is available
    Check(CheckCmd),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        }
        ColorChoice::Auto => {}
    }

    let ctx = CliContext {
        config: cli.config,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    if let Some(log_config) = ctx.log_config().await {
        init_tracing_with_config(&log_config).ok(); // Ignore errors if already initialized
    }

    let result = match cli.command {
        Commands::Merge(cmd) => cmd.execute(&ctx).await,
        Commands::Settings(cmd) => cmd.execute(&ctx).await,
        Commands::Check(cmd) => cmd.execute(&ctx).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        output::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

fn print_version() {
    println!("photomerge {}", env!("CARGO_PKG_VERSION"));
    println!("rust-version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!("license: {}", env!("CARGO_PKG_LICENSE"));
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "photomerge", &mut io::stdout());
}
