use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use services::ApiConfig;

mod commands;
mod db;
mod terminal;

#[derive(Parser)]
#[command(name = "skillpath", about = "Assess your skills and hand off to a learning roadmap")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// SQLite database for saved sessions and results
    #[arg(long = "db", global = true, env = "SKILLPATH_DB_URL", default_value = "sqlite://skillpath.sqlite3")]
    db_url: String,

    /// Base URL of the assessment service
    #[arg(long, global = true, env = "SKILLPATH_API_BASE_URL")]
    api_url: Option<String>,

    /// Bearer token for the assessment service
    #[arg(long, global = true, env = "SKILLPATH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "SKILLPATH_API_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// How long the score is shown before the roadmap hand-off, in milliseconds
    #[arg(long, global = true, env = "SKILLPATH_DISPLAY_DELAY_MS", default_value_t = 2_000)]
    display_delay_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure, take and score a new assessment
    Run(commands::RunArgs),
    /// Continue a saved or remote assessment by id
    Resume(commands::ResumeArgs),
    /// List recent scored assessments
    History(commands::HistoryArgs),
}

impl Cli {
    fn api_config(&self) -> Result<ApiConfig> {
        let base_url = self
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow::anyhow!("--api-url or SKILLPATH_API_BASE_URL is required"))?;
        Ok(ApiConfig::new(base_url)
            .with_api_key(self.api_key.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }

    fn context(&self) -> Result<commands::Context> {
        Ok(commands::Context {
            db_url: db::normalize_sqlite_url(self.db_url.clone()),
            api: self.api_config()?,
            display_delay: Duration::from_millis(self.display_delay_ms),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Run(args) => commands::run(cli.context()?, args).await,
        Commands::Resume(args) => commands::resume(cli.context()?, args).await,
        Commands::History(args) => {
            commands::history(&db::normalize_sqlite_url(cli.db_url.clone()), args).await
        }
    }
}
