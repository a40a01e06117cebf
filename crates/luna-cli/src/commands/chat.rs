use anyhow::{Context, Result};
use console::style;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use luna_core::config::{get_groq_api_key, Config};
use luna_core::memory::SessionMemoryManager;
use luna_core::services::llm::{GroqClient, GroqConfig};
use luna_core::logging::log_error;
use luna_core::{ConversationAgent, LunaError};

use super::search::load_store;

pub struct ChatOptions {
    pub session: String,
    pub model: Option<String>,
    pub memory_len: Option<usize>,
    pub docs: Option<PathBuf>,
    pub top_k: Option<usize>,
}

fn resolve_config(options: &ChatOptions) -> Result<Config> {
    let mut config = Config::load()?.with_env_overrides()?;

    if let Some(model) = &options.model {
        config.set("model.name", model)?;
    }
    if let Some(memory_len) = options.memory_len {
        config.set("memory.memory-len", &memory_len.to_string())?;
    }
    if let Some(top_k) = options.top_k {
        config.set("retrieval.top-k", &top_k.to_string())?;
    }

    config.validate()?;
    Ok(config)
}

/// Handle chat command
pub async fn handle_chat(options: ChatOptions) -> Result<()> {
    let config = resolve_config(&options)?;

    let api_key = get_groq_api_key()?.context(
        "No Groq API key found. Export GROQ_API_KEY or run: luna config set model.api-key YOUR_KEY",
    )?;
    let client = GroqClient::new(GroqConfig::new(api_key).with_model(config.model.name))?;

    let memory = Arc::new(SessionMemoryManager::new(config.memory_config())?);
    let mut agent = ConversationAgent::new(memory, Arc::new(client))
        .with_settings(config.generation_settings());

    if let Some(path) = &options.docs {
        let store = load_store(path).await?;
        println!(
            "{} Loaded {} documents from {}",
            style("📚").bold(),
            store.len(),
            style(path.display()).dim()
        );
        agent = agent.with_retriever(store, config.retrieval.top_k)?;
    }

    print_banner(&config, &options.session);
    run_repl(&agent, &options.session).await
}

fn print_banner(config: &Config, session: &str) {
    println!(
        "{}",
        style("────────────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} {}",
        style("🌙").bold(),
        style("LUNA").bold().cyan()
    );
    println!(
        "  model {} · memory {} exchanges · session {}",
        style(config.model.name).yellow(),
        style(config.memory.memory_len).yellow(),
        style(session).yellow()
    );
    println!(
        "  {}",
        style("/history  /clear  /exit").dim()
    );
    println!(
        "{}",
        style("────────────────────────────────────────────────────────────").dim()
    );
    println!();
}

async fn run_repl(agent: &ConversationAgent, session: &str) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", style("you ›").bold().green());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/exit" | "/quit" => break,
            "/history" => print_history(agent, session),
            "/clear" => {
                agent.memory().clear(session);
                println!("{} History cleared", style("✓").green());
            }
            _ => match agent.respond(session, input).await {
                Ok(reply) => {
                    println!("{} {}", style("luna ›").bold().cyan(), reply.turn.agent);
                    println!(
                        "  {}",
                        style(format!(
                            "Thought for {:.1}s · {} context documents",
                            reply.elapsed.as_secs_f64(),
                            reply.context.len()
                        ))
                        .dim()
                    );
                    println!();
                }
                Err(err) => {
                    log_error(&err, err.category());
                    let message = match &err {
                        LunaError::Model(model_err) => model_err.user_message(),
                        other => other.to_string(),
                    };
                    eprintln!("{} {message}", style("✗").red());
                }
            },
        }
    }

    Ok(())
}

fn print_history(agent: &ConversationAgent, session: &str) {
    let history = agent.memory().history_view(session);
    if history.is_empty() {
        println!("{}", style("No history yet.").dim());
        return;
    }

    for turn in history {
        let time = turn
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string();
        println!("{} {} {}", style(&time).dim(), style("you ›").green(), turn.human);
        println!("{} {} {}", style(&time).dim(), style("luna ›").cyan(), turn.agent);
    }
    println!();
}
