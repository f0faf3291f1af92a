//! ordo - conversational TODO board assistant

mod actions;
mod config;

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;
use ordo_agent::{
    ActionSet, AssistantAgent, ConversationGraph, HistoryPolicy, ResponseSink, SessionConfig,
    SessionStore, TaskOpsAgent, TaskOpsGraph,
};
use ordo_ai::OpenAiChatClient;
use ordo_board::{BoardClient, InMemoryTaskIndex, NotionBoardClient, TaskIndex};
use tracing_subscriber::EnvFilter;

use crate::actions::{RetrievalAction, task_ops_actions};
use crate::config::Config;

/// ordo - conversational TODO board assistant
#[derive(Parser, Debug)]
#[command(name = "ordo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL for an OpenAI-compatible endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Board database id
    #[arg(short, long)]
    database_id: Option<String>,

    /// Maximum assistant turns per user input
    #[arg(long)]
    max_turns: Option<usize>,

    /// Disable token streaming (print complete answers only)
    #[arg(long)]
    no_stream: bool,

    /// Start each user input from a fresh conversation history
    #[arg(long)]
    reset_history: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Prints streamed tokens as they arrive
struct StdoutSink {
    streamed: AtomicBool,
}

impl StdoutSink {
    fn new() -> Self {
        Self {
            streamed: AtomicBool::new(false),
        }
    }

    fn saw_tokens(&self) -> bool {
        self.streamed.load(Ordering::Relaxed)
    }
}

impl ResponseSink for StdoutSink {
    fn on_token(&self, token: &str) {
        self.streamed.store(true, Ordering::Relaxed);
        print!("{token}");
        let _ = std::io::stdout().flush();
    }

    fn on_done(&self) {
        if self.saw_tokens() {
            println!();
        }
    }
}

fn read_user_input() -> Option<String> {
    print!("Your response: ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim().to_string()),
        Err(_) => None,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("ordo_agent=debug,ordo_board=debug,ordo_ai=debug,ordo_cli=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.init_config {
        let path = Config::init().context("failed to initialize config")?;
        println!("Config file: {}", path.display());
        return Ok(());
    }

    let config = Config::load();

    let model_id = args
        .model
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| "gpt-4o-mini".to_string());
    let openai_key = config
        .openai_api_key()
        .context("no OpenAI API key: set OPENAI_API_KEY or api_keys.openai in the config")?;
    let notion_key = config
        .notion_api_key()
        .context("no board API key: set NOTION_API_KEY or api_keys.notion in the config")?;
    let database_id = args
        .database_id
        .or_else(|| config.database_id.clone())
        .or_else(|| std::env::var("NOTION_DATABASE_ID").ok())
        .context("no board database id: pass --database-id or set NOTION_DATABASE_ID")?;

    let mut model = OpenAiChatClient::new(openai_key, model_id);
    if let Some(base_url) = args.base_url.or_else(|| config.base_url.clone()) {
        model = model.with_base_url(base_url);
    }
    let model: Arc<dyn ordo_ai::ModelClient> = Arc::new(model);

    let board: Arc<dyn BoardClient> = Arc::new(NotionBoardClient::new(notion_key, database_id));
    let index: Arc<dyn TaskIndex> = Arc::new(InMemoryTaskIndex::new());

    // Seed the retrieval index with the current board contents.
    match board.list().await {
        Ok(tasks) => {
            tracing::info!(count = tasks.len(), "indexed board tasks");
            for task in &tasks {
                index.upsert(task).await;
            }
        }
        Err(e) => tracing::warn!("could not list board tasks, starting with an empty index: {e}"),
    }

    let max_turns = args.max_turns.or(config.max_turns).unwrap_or(10);
    let task_ops = TaskOpsGraph::new(
        TaskOpsAgent::new(model.clone()),
        ActionSet::new(task_ops_actions(board, index.clone())),
    )
    .with_max_steps(config.task_ops_max_steps.unwrap_or(10));

    let graph = ConversationGraph::new(
        AssistantAgent::new(model.clone()),
        task_ops,
        Arc::new(RetrievalAction::new(index, model)),
    );

    let history = if args.reset_history || config.persist_history == Some(false) {
        HistoryPolicy::ResetOnInput
    } else {
        HistoryPolicy::Persist
    };
    let store = SessionStore::new(
        Arc::new(graph),
        SessionConfig { max_turns, history },
    );
    let (_, session) = store.create();
    let mut session = session.lock_owned().await;

    let opening = session.init().await?;
    println!("{}", opening.content);
    println!("{}", "=".repeat(10));

    for _ in 0..max_turns {
        let Some(input) = read_user_input() else {
            return Ok(());
        };
        if input.is_empty() {
            continue;
        }
        println!("{}", "=".repeat(10));

        let response = if args.no_stream {
            let response = session.step(&input).await?;
            println!("{}", response.content);
            response
        } else {
            let sink = StdoutSink::new();
            let response = session.stream(&input, &sink).await?;
            if !sink.saw_tokens() {
                println!("{}", response.content);
            }
            response
        };
        println!("{}", "=".repeat(10));

        if response.is_final {
            return Ok(());
        }
    }

    println!("Maximum number of turns reached - ending the conversation.");
    Ok(())
}
