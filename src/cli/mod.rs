//! Command-line driver: replay a recorded execution against a session history.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use futures::StreamExt;

use crate::adapter::MessageWindow;
use crate::agent::{ChatAgent, InvokeAgent, StreamAgent};
use crate::config::ChainstreamConfig;
use crate::error::Result;
use crate::executor::ReplayExecutor;
use crate::store::JsonFileSessionStore;
use crate::trace::{RecordingTraceSink, TraceSink};

/// chainstream CLI
#[derive(Parser, Debug)]
#[command(name = "chainstream", version, about = "Interpret agent execution events")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every normalized event as one JSON line
    Stream(RunArgs),
    /// Print only the final answer
    Invoke(RunArgs),
}

/// Arguments shared by `stream` and `invoke`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON file mapping session ids to message arrays
    #[arg(long)]
    pub history: PathBuf,

    /// JSON-lines recording of executor events
    #[arg(long)]
    pub events: PathBuf,

    /// Session to load
    #[arg(short, long, default_value = "default")]
    pub session: String,

    /// Number of recent messages to use, or "all"
    #[arg(short, long)]
    pub window: Option<MessageWindow>,

    /// Top-level agent name (overrides configuration)
    #[arg(long)]
    pub agent_name: Option<String>,

    /// Record tool spans in memory and print them to stderr when done
    #[arg(long)]
    pub print_spans: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    run_with_output(cli, &mut std::io::stdout(), &mut std::io::stderr()).await
}

/// Execute a parsed command line, writing results to `out` and span records
/// to `spans_out`.
///
/// Spans are flushed and printed even when the run fails.
pub async fn run_with_output<O, S>(cli: Cli, out: &mut O, spans_out: &mut S) -> Result<()>
where
    O: Write,
    S: Write,
{
    let mut config = ChainstreamConfig::load(cli.config.as_deref())?;
    let (streaming, args) = match cli.command {
        Commands::Stream(args) => (true, args),
        Commands::Invoke(args) => (false, args),
    };
    if let Some(name) = &args.agent_name {
        config.agent_name = name.clone();
    }
    let window = args.window.unwrap_or(config.window_size);

    let executor = Arc::new(ReplayExecutor::new(&args.events));
    let store = Arc::new(JsonFileSessionStore::new(&args.history));
    let recorder = args.print_spans.then(RecordingTraceSink::new);
    let ingestion = if recorder.is_some() {
        None
    } else {
        config.ingestion_sink()?
    };
    let sink: Option<Arc<dyn TraceSink>> = match (&recorder, &ingestion) {
        (Some(recorder), _) => Some(Arc::new(recorder.clone())),
        (None, Some(ingestion)) => Some(Arc::new(ingestion.clone())),
        (None, None) => None,
    };

    let agent = ChatAgent::new(config.agent_config(), executor, store).with_trace_sink(sink);

    let outcome = if streaming {
        stream_to(&agent, &args.session, window, out).await
    } else {
        invoke_to(&agent, &args.session, window, out).await
    };

    if let Some(ingestion) = ingestion {
        ingestion.flush().await;
    }
    if let Some(recorder) = recorder {
        for span in recorder.spans() {
            writeln!(spans_out, "{}", serde_json::to_string(&span)?)?;
        }
    }
    outcome
}

async fn stream_to<O: Write>(
    agent: &ChatAgent,
    session_id: &str,
    window: MessageWindow,
    out: &mut O,
) -> Result<()> {
    let mut events = agent.stream(session_id, window).await?;
    while let Some(event) = events.next().await {
        let event = event?;
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
    }
    Ok(())
}

async fn invoke_to<O: Write>(
    agent: &ChatAgent,
    session_id: &str,
    window: MessageWindow,
    out: &mut O,
) -> Result<()> {
    let answer = agent.invoke(session_id, window).await?;
    writeln!(out, "{answer}")?;
    Ok(())
}
