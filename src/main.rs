use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tutor_backend::db::{self, TopicRepo, UserRepo};
use tutor_backend::materials::DEFAULT_MATERIALS_PATH;
use tutor_backend::{
    ApiServerBuilder, Config, OllamaModel, ProgressTracker, StudyMaterials, Tutor,
};

/// Tutor - AI tutoring backend with goals, plans and gamified progress
#[derive(Parser)]
#[command(name = "tutor", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server (default)
    Serve,
    /// Print a user's XP, level and streak
    Progress {
        /// User ID
        #[arg(short, long)]
        user: i64,
    },
    /// List tutoring topics
    Topics,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,tutor_backend=info",
        1 => "info,tutor_backend=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    let pool = db::init(config.db_path())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::Progress { user } => show_progress(&config, pool, user),
        Command::Topics => list_topics(pool),
    }
}

async fn serve(config: Config, pool: db::DbPool) -> anyhow::Result<()> {
    let model = OllamaModel::new(
        &config.tutor.base_url,
        &config.tutor.model,
        config.tutor.timeout,
    )?;
    tracing::info!(
        base_url = %config.tutor.base_url,
        model = %config.tutor.model,
        "using ollama model"
    );

    let materials_path = config
        .materials_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MATERIALS_PATH));
    let materials = StudyMaterials::load_or_empty(&materials_path);

    let server = ApiServerBuilder::new(pool, config.api_server.port)
        .tutor(Tutor::new(Arc::new(model)))
        .progress_config(config.progress)
        .context_config(config.context)
        .materials(materials)
        .static_dir(config.api_server.static_dir)
        .rate_limit(config.api_server.rate_limit)
        .build();

    tracing::info!(port = config.api_server.port, "starting tutor backend");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}

fn show_progress(config: &Config, pool: db::DbPool, user_id: i64) -> anyhow::Result<()> {
    let tracker = ProgressTracker::new(UserRepo::new(pool), config.progress.clone());
    let report = tracker.report(user_id)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn list_topics(pool: db::DbPool) -> anyhow::Result<()> {
    for topic in TopicRepo::new(pool).list()? {
        match topic.description {
            Some(description) => println!("{:>3}  {}  ({description})", topic.id, topic.name),
            None => println!("{:>3}  {}", topic.id, topic.name),
        }
    }
    Ok(())
}
