//! Stride CLI - chat with the coaching agent or exercise the tool gate.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use stride_app::commands::{self, Persona};
use stride_app::{AppConfig, Args, Caller, Command};
use stride_runtime::{AgentLoop, Message, OpenAiClient};
use stride_tools::{Binder, Store};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Manifest { persona } => {
            let entries = commands::manifest(persona)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Command::Dispatch {
            caller,
            tool,
            args,
            persona,
        } => {
            let store: Arc<dyn Store> = Arc::new(config.load_store()?);
            let ctx = commands::open_context(store, &caller).await?;
            let binder = Binder::with_timeout(config.tool_timeout());
            let result = commands::dispatch_once(&ctx, persona, binder, &tool, &args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Chat { caller, persona } => chat(&config, &caller, persona).await?,
    }

    Ok(())
}

async fn chat(config: &AppConfig, caller: &Caller, persona: Persona) -> Result<()> {
    let store: Arc<dyn Store> = Arc::new(config.load_store()?);
    let tool_set = persona.tool_set()?;
    let binder = Binder::with_timeout(config.tool_timeout());

    let mut client = OpenAiClient::new(&config.model.base_url, &config.model.model)
        .with_max_retries(config.model.max_retries);
    match config.api_key() {
        Some(key) => client = client.with_api_key(key),
        None => warn!(env = %config.model.api_key_env, "No API key set"),
    }
    let agent = AgentLoop::new(Arc::new(client), config.agent.clone());

    info!(user = %caller.user, ?persona, model = %config.model.model, "Chat session started");
    println!("Stride ({persona:?}). Type a message, or 'exit' to quit.");

    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        // Role is resolved for every turn.
        let ctx = commands::open_context(store.clone(), caller).await?;
        let bound = binder.bind(&ctx, &tool_set);

        match agent.run(&bound, history.clone(), line).await {
            Ok(outcome) => {
                println!("{}", outcome.answer);
                if let Some(notice) = &outcome.plan_notice {
                    println!("[{}]", notice);
                }
                history = outcome.messages;
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}
