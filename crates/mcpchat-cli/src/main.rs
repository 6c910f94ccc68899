//! mcpchat CLI: chat about MCP-served documents with an OpenAI or Anthropic model.

mod documents;

use anyhow::{Context, Result};
use clap::Parser;
use documents::DocumentIndex;
use mcpchat_api::{
    AnthropicClient, OpenAiClient, ProviderShim, add_assistant_message, add_user_message,
    text_from_message,
};
use mcpchat_config::{ChatConfig, CliOverrides, ProviderKind};
use mcpchat_mcp::{McpClient, McpManager};
use mcpchat_types::{ChatBackend, ChatOptions, Turn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Name under which the document server is registered.
const DOC_CLIENT: &str = "doc_client";

#[derive(Parser)]
#[command(name = "mcpchat", version, about = "Chat with an LLM about documents served over MCP")]
struct Cli {
    /// Extra MCP server scripts, each started with `uv run <script>`
    servers: Vec<String>,

    /// Chat backend: openai or claude (overrides PROVIDER)
    #[arg(long)]
    provider: Option<String>,

    /// Model to use (overrides OPENAI_MODEL / CLAUDE_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// API key (overrides OPENAI_API_KEY / ANTHROPIC_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// System prompt sent with every request
    #[arg(long)]
    system: Option<String>,

    /// Document server script
    #[arg(long)]
    doc_server: Option<String>,

    /// Config file to use instead of ~/.mcpchat/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = ChatConfig::load(CliOverrides {
        provider: cli.provider,
        model: cli.model,
        api_key: cli.api_key,
        temperature: cli.temperature,
        system_prompt: cli.system,
        doc_server: cli.doc_server,
        config_file: cli.config,
    })
    .context("Failed to load configuration")?;

    let shim = ProviderShim::new(create_backend(&config)?, config.model.clone());

    let doc_client = McpClient::connect(DOC_CLIENT, &config.doc_server_config())
        .await
        .with_context(|| format!("Failed to start document server '{}'", config.doc_server))?;
    let mut manager = McpManager::default();
    manager.add(doc_client);
    manager
        .connect_all(&config.extra_servers(&cli.servers))
        .await;

    let index = DocumentIndex::build(&manager).await;

    let result = repl(&shim, &manager, &index, &config).await;
    manager.shutdown().await;
    result
}

fn create_backend(config: &ChatConfig) -> Result<Arc<dyn ChatBackend>> {
    let backend: Arc<dyn ChatBackend> = match config.provider {
        ProviderKind::OpenAi => Arc::new(
            OpenAiClient::new(&config.api_key, &config.api_base_url)
                .context("Failed to create OpenAI client")?,
        ),
        ProviderKind::Claude => Arc::new(
            AnthropicClient::new(&config.api_key, &config.api_base_url)
                .context("Failed to create Anthropic client")?
                .with_max_tokens(config.max_tokens),
        ),
    };
    Ok(backend)
}

async fn repl(
    shim: &ProviderShim,
    manager: &McpManager,
    index: &DocumentIndex,
    config: &ChatConfig,
) -> Result<()> {
    let mut options = ChatOptions::default().with_temperature(config.temperature);
    if let Some(system) = &config.system_prompt {
        options = options.with_system(system.clone());
    }

    let mut history: Vec<Turn> = Vec::new();
    let stdin = io::stdin();

    eprintln!(
        "mcpchat v{} ({}: {}, {} MCP servers, {} documents)",
        env!("CARGO_PKG_VERSION"),
        shim.backend_name(),
        shim.model(),
        manager.client_count(),
        index.len()
    );
    eprintln!("Type your message, mention documents with @name. Press Ctrl+D to exit.\n");

    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut input = String::new();
        let bytes_read = stdin.lock().read_line(&mut input)?;
        if bytes_read == 0 {
            eprintln!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(handled) = handle_slash_command(input, &mut history, manager, index) {
            match handled {
                SlashResult::Continue => continue,
                SlashResult::Break => break,
                SlashResult::Unknown => {
                    eprintln!("Unknown command: {input}. Type /help for available commands.");
                    continue;
                }
            }
        }

        let prompt = documents::resolve_mentions(manager, index, input).await;
        add_user_message(&mut history, prompt);

        match shim.chat(&history, &options).await {
            Ok(reply) => {
                println!("{}", text_from_message(&reply));
                add_assistant_message(&mut history, &reply);
            }
            Err(e) => {
                eprintln!("\nError: {e}");
                // Remove the unanswered user turn
                history.pop();
            }
        }

        println!();
    }

    Ok(())
}

enum SlashResult {
    Continue,
    Break,
    Unknown,
}

fn handle_slash_command(
    input: &str,
    history: &mut Vec<Turn>,
    manager: &McpManager,
    index: &DocumentIndex,
) -> Option<SlashResult> {
    if !input.starts_with('/') {
        return None;
    }

    let cmd = input.split_whitespace().next().unwrap_or(input);
    match cmd {
        "/quit" | "/exit" => Some(SlashResult::Break),
        "/clear" => {
            history.clear();
            eprintln!("Conversation cleared.");
            Some(SlashResult::Continue)
        }
        "/help" => {
            print_help();
            Some(SlashResult::Continue)
        }
        "/servers" => {
            for server in manager.server_summary() {
                eprintln!(
                    "  {}  {} tools, {} resources",
                    server.name, server.tools, server.resources
                );
            }
            Some(SlashResult::Continue)
        }
        "/resources" => {
            if index.is_empty() {
                eprintln!("No documents available.");
            }
            for (name, doc) in index.iter() {
                eprintln!("  @{name}  {} ({})", doc.uri, doc.server);
            }
            Some(SlashResult::Continue)
        }
        _ => Some(SlashResult::Unknown),
    }
}

fn print_help() {
    eprintln!("Available commands:");
    eprintln!("  /help      Show this help");
    eprintln!("  /servers   List connected MCP servers");
    eprintln!("  /resources List documents that can be mentioned");
    eprintln!("  /clear     Clear conversation");
    eprintln!("  /quit      Exit");
    eprintln!();
    eprintln!("Mention a document with @name to include its contents in your message.");
}
