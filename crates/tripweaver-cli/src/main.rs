mod api;
mod config;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tripweaver_core::generate::{Preprompts, TripGenerator};
use tripweaver_core::itinerary::ItineraryRequest;
use tripweaver_core::llm::OpenAiClient;
use tripweaver_core::users;
use tripweaver_db::config::DbConfig;
use tripweaver_db::pool;

use config::TripweaverConfig;

#[derive(Parser)]
#[command(name = "tripweaver", about = "Trip-planning backend with AI-generated itineraries")]
struct Cli {
    /// Database URL (overrides DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a tripweaver config file with fresh signing secrets
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and run migrations
    DbInit,
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides TRIPWEAVER_BIND)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides TRIPWEAVER_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one itinerary and print it as JSON (no database required)
    Generate {
        /// Number of days
        #[arg(long)]
        days: u32,
        /// Destination country
        #[arg(long)]
        country: String,
        /// Destination city
        #[arg(long)]
        city: String,
    },
}

/// Execute the `tripweaver init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        auth: config::AuthSection {
            jwt_secret: config::generate_secret(),
            refresh_secret: config::generate_secret(),
        },
        llm: config::LlmSection::default(),
        server: config::ServerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  auth.jwt_secret, auth.refresh_secret = <generated>");
    println!();
    println!("Next: set OPENAI_API_KEY (or [llm] api_key), then run `tripweaver db-init`.");

    Ok(())
}

/// Execute the `tripweaver db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let file = config::load_config().ok();
    let db_config = config::resolve_db_config(cli_db_url, file.as_ref());

    println!("Initializing tripweaver database...");

    pool::ensure_database_exists(&db_config).await?;
    let db_pool = pool::connect_and_migrate(&db_config).await?;

    let counts = pool::table_counts(&db_pool).await;
    db_pool.close().await;

    println!("Database ready. Tables:");
    for (table, count) in &counts? {
        println!("  {table}: {count} rows");
    }
    println!("tripweaver db-init complete.");
    Ok(())
}

/// Execute the `tripweaver serve` command.
async fn cmd_serve(
    cli_db_url: Option<&str>,
    bind: Option<&str>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let resolved = TripweaverConfig::resolve(cli_db_url, bind, port)?;
    tracing::info!(
        model = %resolved.llm_config.model,
        base_url = %resolved.llm_config.base_url,
        "using completion endpoint"
    );

    let db_pool = pool::connect_and_migrate(&resolved.db_config).await?;
    users::purge_expired_refresh_tokens(&db_pool).await?;

    let client = OpenAiClient::new(resolved.llm_config).context("failed to build LLM client")?;
    let generator = TripGenerator::new(Arc::new(client), Preprompts::from_env());

    let state = api::AppState {
        pool: db_pool.clone(),
        jwt: Arc::new(resolved.jwt_config),
        generator: Arc::new(generator),
        api_password: resolved.server.api_password.as_deref().map(Arc::from),
    };

    let result = serve_cmd::run_serve(state, &resolved.server.bind, resolved.server.port).await;
    db_pool.close().await;
    result
}

/// Execute the `tripweaver generate` command.
async fn cmd_generate(days: u32, country: String, city: String) -> anyhow::Result<()> {
    let file = config::load_config().ok();
    let llm_config = config::resolve_llm_config(file.as_ref())?;
    let client = OpenAiClient::new(llm_config).context("failed to build LLM client")?;
    let generator = TripGenerator::new(Arc::new(client), Preprompts::from_env());

    let request = ItineraryRequest::new(days, country, city);
    let itinerary = generator.generate(&request).await?;
    println!("{}", serde_json::to_string_pretty(&itinerary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => cmd_init(&db_url, force)?,
        Commands::DbInit => cmd_db_init(cli.database_url.as_deref()).await?,
        Commands::Serve { bind, port } => {
            cmd_serve(cli.database_url.as_deref(), bind.as_deref(), port).await?
        }
        Commands::Generate {
            days,
            country,
            city,
        } => cmd_generate(days, country, city).await?,
    }

    Ok(())
}
