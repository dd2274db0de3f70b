use careflow_core::{
    CareOrchestrator, GeminiClient, GenerationClient, RetrievalPipeline, Settings,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "careflow", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (JSON); defaults apply when the file is missing.
    #[arg(long, default_value = "careflow.json")]
    config: PathBuf,

    /// Override the knowledge base path from the settings file.
    #[arg(long)]
    knowledge_base: Option<String>,

    /// Gemini API key; without one the assistant runs with offline responses.
    #[arg(long, env = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full six-agent care pipeline for one patient query.
    Ask {
        /// Patient query in plain language.
        #[arg(long)]
        query: String,
        /// Citizen profile as a JSON object; a demo profile applies otherwise.
        #[arg(long)]
        profile_json: Option<String>,
    },
    /// Query the knowledge base directly and print the ranked passages.
    Retrieve {
        /// Retrieval query.
        #[arg(long)]
        query: String,
        /// Number of passages to return.
        #[arg(long, default_value = "4")]
        top_k: usize,
    },
    /// Print retrieval pipeline diagnostics.
    Describe,
}

fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.config)?;
    if let Some(knowledge_base) = cli.knowledge_base {
        settings.knowledge_base_path = knowledge_base;
    }
    if cli.gemini_api_key.is_some() {
        settings.gemini_api_key = cli.gemini_api_key;
    }

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        knowledge_base = %settings.knowledge_base_path,
        "careflow boot"
    );

    match cli.command {
        Command::Ask {
            query,
            profile_json,
        } => {
            let profile = profile_json
                .map(|raw| parse_profile(&raw))
                .transpose()?;

            let client = GeminiClient::new(
                settings.gemini_api_key.clone(),
                &settings.gemini_model,
                settings.temperature,
            );
            if client.is_offline() {
                info!(model = %client.model(), "no API key configured; using offline responses");
            }

            let client: Arc<dyn GenerationClient + Send + Sync> = Arc::new(client);
            let orchestrator = CareOrchestrator::new(settings, client)?;
            let report = orchestrator.run(&query, profile)?;
            println!("{}", report.to_json()?);
        }
        Command::Retrieve { query, top_k } => {
            let pipeline = RetrievalPipeline::new(
                &settings.knowledge_base_path,
                settings.chunk_size,
                settings.chunk_overlap,
            )?;

            let context = pipeline.retrieve(&query, top_k);
            if context.is_empty() {
                println!("no passages scored above zero for: {query}");
            } else {
                println!("{}", context.as_bullet_list());
            }
        }
        Command::Describe => {
            let pipeline = RetrievalPipeline::new(
                &settings.knowledge_base_path,
                settings.chunk_size,
                settings.chunk_overlap,
            )?;
            println!("{}", serde_json::to_string_pretty(&pipeline.describe())?);
        }
    }

    Ok(())
}

fn parse_profile(raw: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("--profile-json must be a JSON object"),
    }
}
