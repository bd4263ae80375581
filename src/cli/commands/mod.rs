//! CLI parser and command dispatch.

mod scrape;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use orderacquire::{Credentials, RunConfig};

#[derive(Parser)]
#[command(name = "orderacquire")]
#[command(about = "Export purchased products from an online order history")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Account and browser options for commands that sign in.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, env = "AZ_USER")]
    email: Option<String>,

    /// Account password
    #[arg(long, env = "AZ_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Order history time filter (visible option text, e.g. 2022)
    #[arg(long)]
    year: Option<String>,
}

impl LoginArgs {
    fn credentials(&self) -> anyhow::Result<Credentials> {
        Ok(Credentials::new(self.email.clone(), self.password.clone())?)
    }

    fn apply(&self, config: &mut RunConfig) {
        if let Some(year) = &self.year {
            config.year = year.clone();
        }
        if self.headless {
            config.browser.headless = true;
        }
    }
}

/// Options for the resolution and export stage.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// CSV output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Concurrent detail page fetches
    #[arg(short, long)]
    workers: Option<usize>,
}

impl ExportArgs {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(workers) = self.workers {
            config.http.workers = workers;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, walk the order history and export products (full run)
    Scrape {
        #[command(flatten)]
        login: LoginArgs,
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Sign in and save order links to the link store (no export)
    Harvest {
        #[command(flatten)]
        login: LoginArgs,
    },

    /// Resolve links already in the link store and export products
    Resolve {
        #[command(flatten)]
        export: ExportArgs,
    },
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load_from_path(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RunConfig::load().await?),
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Scrape { login, export } => {
            login.apply(&mut config);
            export.apply(&mut config);
            let credentials = login.credentials()?;
            scrape::cmd_scrape(config, &credentials).await
        }
        Commands::Harvest { login } => {
            login.apply(&mut config);
            let credentials = login.credentials()?;
            scrape::cmd_harvest(config, &credentials).await
        }
        Commands::Resolve { export } => {
            export.apply(&mut config);
            scrape::cmd_resolve(config).await
        }
    }
}
