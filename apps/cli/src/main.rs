use std::{
    io::{IsTerminal, Write as _},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use indicatif::ProgressBar;
use output::{OutputFormat, Renderer};
use progress::spinner;
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};
use yt_agent_client::types::Credential;
use yt_agent_core::{
    bootstrap,
    dialogue::Orchestrator,
    extract, intent,
    session::SessionStatsSnapshot,
    ServerMode, DEFAULT_SESSION_ID,
};
use yt_agent_mcp::{load_settings, run_with_settings, Settings};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "yt-agent",
    version,
    about = "Talk to a YouTube tool backend in plain language from the shell."
)]
struct Cli {
    /// Preferred renderer for command output.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Override the backend base URL from settings.
    #[arg(long, global = true)]
    backend_url: Option<String>,
    /// Settings file to load instead of the platform default.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Bearer token forwarded to the backend.
    #[arg(long, global = true, env = "YT_AGENT_BEARER_TOKEN", hide_env_values = true)]
    bearer_token: Option<String>,
    /// Cookie header forwarded to the backend.
    #[arg(long, global = true, env = "YT_AGENT_COOKIE", hide_env_values = true)]
    cookie: Option<String>,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators while remote calls run.
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Run the conversational server over STDIO (JSON-RPC transport).
    Serve,
    /// Send one message, or read messages line by line from stdin.
    Chat {
        /// Conversation to continue.
        #[arg(long, default_value = DEFAULT_SESSION_ID)]
        session: String,
        message: Option<String>,
    },
    /// Show how a message would be understood, without calling the backend.
    Classify { text: String },
    /// Inspect the backend tool catalogue.
    Tools {
        #[command(subcommand)]
        command: ToolCommand,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand, Clone)]
enum ToolCommand {
    /// List tools the backend exposes.
    List,
}

#[derive(Clone, Debug, Serialize)]
struct Classification {
    intent: String,
    video_id: Option<String>,
    channel_id: Option<String>,
    handle: Option<String>,
    comment: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct SessionReport {
    ttl_secs: i64,
    capacity: usize,
    #[serde(flatten)]
    stats: SessionStatsSnapshot,
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }

    fn credential(&self) -> Credential {
        Credential::new(self.bearer_token.clone(), self.cookie.clone())
    }

    fn settings(&self) -> Result<Settings> {
        let mut settings = load_settings(self.config.as_deref())?;
        if let Some(url) = &self.backend_url {
            settings.backend_url.clone_from(url);
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let renderer = Renderer::new(cli.format);
    match &cli.command {
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "yt-agent", &mut std::io::stdout());
            return Ok(());
        }
        Command::Classify { text } => return handle_classify(text, &cli, &renderer),
        Command::Serve => {
            let mut settings = cli.settings()?;
            settings.headless = false;
            return run_with_settings(&settings).await;
        }
        _ => {}
    }

    let mut config = cli.settings()?.server_config()?;
    config.mode = ServerMode::Headless;
    let runtime = bootstrap(config).await?;
    let orchestrator = runtime.orchestrator();

    match &cli.command {
        Command::Chat { session, message } => {
            handle_chat(&cli, &renderer, &orchestrator, session, message.as_deref()).await
        }
        Command::Tools {
            command: ToolCommand::List,
        } => handle_tools_list(&cli, &renderer, &orchestrator).await,
        Command::Completions { .. } | Command::Classify { .. } | Command::Serve => Ok(()),
    }
}

fn handle_classify(text: &str, cli: &Cli, renderer: &Renderer) -> Result<()> {
    let classification = Classification {
        intent: intent::classify(text).to_string(),
        video_id: extract::video_id(text),
        channel_id: extract::channel_id(text),
        handle: extract::handle(text),
        comment: extract::comment_text(text),
    };
    if cli.quiet {
        return Ok(());
    }
    renderer.classification(&classification)
}

async fn handle_chat(
    cli: &Cli,
    renderer: &Renderer,
    orchestrator: &Orchestrator,
    session: &str,
    message: Option<&str>,
) -> Result<()> {
    let credential = cli.credential();
    if let Some(message) = message {
        return send(cli, renderer, orchestrator, session, &credential, message).await;
    }

    let interactive = std::io::stdin().is_terminal() && !cli.quiet;
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        if interactive {
            eprint!("> ");
            std::io::stderr().flush().ok();
        }
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/sessions" => handle_sessions(cli, renderer, orchestrator)?,
            "/telemetry" => handle_telemetry(0, cli, renderer, orchestrator).await?,
            command if command.starts_with("/telemetry ") => {
                // `/telemetry N` keeps the newest N entries.
                let limit = command["/telemetry ".len()..].trim().parse().unwrap_or(0);
                handle_telemetry(limit, cli, renderer, orchestrator).await?;
            }
            "/clear" => {
                orchestrator.context().sessions.remove(session);
                debug!(target: "yt_agent_cli", session, "session cleared");
            }
            message => send(cli, renderer, orchestrator, session, &credential, message).await?,
        }
    }
    info!(target: "yt_agent_cli", session, "chat input closed");
    Ok(())
}

async fn send(
    cli: &Cli,
    renderer: &Renderer,
    orchestrator: &Orchestrator,
    session: &str,
    credential: &Credential,
    message: &str,
) -> Result<()> {
    let progress = spinner(cli.progress_enabled(), "Thinking...");
    let envelope = orchestrator.handle(message, session, credential).await;
    finish_spinner(progress, None);
    renderer.envelope(&envelope)
}

async fn handle_tools_list(cli: &Cli, renderer: &Renderer, orchestrator: &Orchestrator) -> Result<()> {
    let progress = spinner(cli.progress_enabled(), "Fetching tool catalogue...");
    let result = orchestrator.context().invoker.list_tools().await;
    match result {
        Ok(tools) => {
            finish_spinner(progress, Some(format!("{} tools available", tools.len())));
            if cli.quiet {
                return Ok(());
            }
            renderer.remote_tools(&tools)
        }
        Err(error) => {
            finish_spinner(progress, None);
            Err(anyhow!(error).context("failed to list backend tools"))
        }
    }
}

fn handle_sessions(cli: &Cli, renderer: &Renderer, orchestrator: &Orchestrator) -> Result<()> {
    if cli.quiet {
        return Ok(());
    }
    let context = orchestrator.context();
    let report = SessionReport {
        ttl_secs: context.sessions.ttl().whole_seconds(),
        capacity: context.sessions.capacity(),
        stats: context.sessions.stats(),
    };
    renderer.sessions(&report)
}

async fn handle_telemetry(
    limit: usize,
    cli: &Cli,
    renderer: &Renderer,
    orchestrator: &Orchestrator,
) -> Result<()> {
    if cli.quiet {
        return Ok(());
    }

    let entries = orchestrator.context().telemetry_snapshot().await;
    if entries.is_empty() {
        return renderer.no_telemetry();
    }

    let total = entries.len();
    let start = if limit == 0 {
        0
    } else {
        total.saturating_sub(limit)
    };
    let sliced: Vec<_> = entries.into_iter().skip(start).collect();
    renderer.telemetry(&sliced)
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let default_level = if cli.quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn finish_spinner(spinner: Option<ProgressBar>, message: Option<String>) {
    if let Some(progress) = spinner {
        if let Some(msg) = message {
            progress.finish_with_message(msg);
        } else {
            progress.finish_and_clear();
        }
    }
}

mod output {
    use std::fmt::Write;

    use anyhow::Result;
    use clap::ValueEnum;
    use yt_agent_client::types::{format_views, RemoteTool};
    use yt_agent_core::{state::TelemetryEntry, ResponseEnvelope};

    use crate::{Classification, SessionReport};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
    pub enum OutputFormat {
        Json,
        Text,
        Table,
    }

    pub struct Renderer {
        format: OutputFormat,
    }

    impl Renderer {
        pub fn new(format: OutputFormat) -> Self {
            Self { format }
        }

        pub fn envelope(&self, envelope: &ResponseEnvelope) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(envelope)?);
                }
                OutputFormat::Text => {
                    println!("{}", envelope.reply);
                    for (idx, item) in envelope.items().iter().enumerate() {
                        let mut line = format!("{:>2}. {}", idx + 1, sanitize(&item.title));
                        if let Some(channel) = &item.channel_title {
                            let _ = write!(line, " ({channel})");
                        }
                        if item.view_count.is_some() {
                            let _ = write!(line, ", {} views", format_views(item.view_count));
                        }
                        println!("{line}");
                        println!("    {}", item.watch_url());
                    }
                }
                OutputFormat::Table => {
                    println!("{}", envelope.reply);
                    if envelope.items().is_empty() {
                        return Ok(());
                    }
                    let rows: Vec<Vec<String>> = envelope
                        .items()
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| {
                            vec![
                                (idx + 1).to_string(),
                                truncate(&sanitize(&item.title), 60),
                                item.channel_title.clone().unwrap_or_default(),
                                format_views(item.view_count),
                                item.id.clone(),
                            ]
                        })
                        .collect();
                    render_table(&["#", "Title", "Channel", "Views", "Id"], &rows);
                }
            }
            Ok(())
        }

        pub fn classification(&self, classification: &Classification) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(classification)?);
                }
                OutputFormat::Text => {
                    println!("intent: {}", classification.intent);
                    let fields = [
                        ("video_id", &classification.video_id),
                        ("channel_id", &classification.channel_id),
                        ("handle", &classification.handle),
                        ("comment", &classification.comment),
                    ];
                    for (name, value) in fields {
                        if let Some(value) = value {
                            println!("{name}: {value}");
                        }
                    }
                }
                OutputFormat::Table => {
                    let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".into());
                    let rows = vec![
                        vec!["Intent".to_string(), classification.intent.clone()],
                        vec!["Video id".to_string(), show(&classification.video_id)],
                        vec!["Channel id".to_string(), show(&classification.channel_id)],
                        vec!["Handle".to_string(), show(&classification.handle)],
                        vec!["Comment".to_string(), show(&classification.comment)],
                    ];
                    render_table(&["Field", "Value"], &rows);
                }
            }
            Ok(())
        }

        pub fn remote_tools(&self, tools: &[RemoteTool]) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(tools)?);
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = tools
                        .iter()
                        .map(|tool| {
                            vec![tool.name.clone(), truncate(&sanitize(&tool.description), 80)]
                        })
                        .collect();
                    render_table(&["Tool", "Description"], &rows);
                }
                OutputFormat::Text => {
                    for tool in tools {
                        println!("{}: {}", tool.name, sanitize(&tool.description));
                    }
                }
            }
            Ok(())
        }

        pub fn sessions(&self, report: &SessionReport) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(report)?);
                }
                OutputFormat::Table => {
                    let rows = vec![
                        vec!["TTL (s)".to_string(), report.ttl_secs.to_string()],
                        vec!["Capacity".to_string(), report.capacity.to_string()],
                        vec!["Live".to_string(), report.stats.entry_count.to_string()],
                        vec!["Hits".to_string(), report.stats.hits.to_string()],
                        vec!["Misses".to_string(), report.stats.misses.to_string()],
                        vec!["Evictions".to_string(), report.stats.evictions.to_string()],
                    ];
                    render_table(&["Property", "Value"], &rows);
                }
                OutputFormat::Text => {
                    println!(
                        "{} live of {} (ttl {}s); hits {}, misses {}, evictions {}",
                        report.stats.entry_count,
                        report.capacity,
                        report.ttl_secs,
                        report.stats.hits,
                        report.stats.misses,
                        report.stats.evictions
                    );
                }
            }
            Ok(())
        }

        pub fn telemetry(&self, entries: &[TelemetryEntry]) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(entries)?);
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = entries
                        .iter()
                        .map(|entry| {
                            vec![
                                entry.timestamp.to_string(),
                                entry.tool.clone(),
                                entry.latency_ms.to_string(),
                                if entry.success { "yes" } else { "no" }.to_string(),
                                entry.error.clone().unwrap_or_default(),
                            ]
                        })
                        .collect();
                    render_table(
                        &["Timestamp", "Tool", "Latency (ms)", "Success", "Error"],
                        &rows,
                    );
                }
                OutputFormat::Text => {
                    for entry in entries {
                        let mut line = format!(
                            "[{}] {} {}ms",
                            entry.timestamp, entry.tool, entry.latency_ms
                        );
                        match &entry.error {
                            Some(error) => {
                                let _ = write!(line, " failed: {error}");
                            }
                            None => line.push_str(" ok"),
                        }
                        println!("{line}");
                    }
                }
            }
            Ok(())
        }

        pub fn no_telemetry(&self) -> Result<()> {
            match self.format {
                OutputFormat::Json => println!("[]"),
                OutputFormat::Text | OutputFormat::Table => {
                    println!("No telemetry recorded yet.");
                }
            }
            Ok(())
        }
    }

    fn render_table(headers: &[&str], rows: &[Vec<String>]) {
        fn render_line(columns: &[&str], widths: &[usize]) -> String {
            let mut line = String::new();
            for (idx, value) in columns.iter().enumerate() {
                let width = widths[idx];
                let _ = write!(line, "| {value:width$} ");
            }
            line.push('|');
            line
        }

        let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
        for row in rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }

        println!("{}", render_line(headers, &widths));
        let separator: String = widths
            .iter()
            .map(|width| format!("|{:-^1$}", "", width + 2))
            .collect();
        println!("{separator}|");

        for row in rows {
            let cols: Vec<&str> = row.iter().map(String::as_str).collect();
            println!("{}", render_line(&cols, &widths));
        }
    }

    fn sanitize(value: &str) -> String {
        value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn truncate(value: &str, max: usize) -> String {
        if value.chars().count() <= max {
            value.to_string()
        } else {
            let mut truncated = value
                .chars()
                .take(max.saturating_sub(1))
                .collect::<String>();
            truncated.push('…');
            truncated
        }
    }
}

mod progress {
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};

    pub fn spinner(message_enabled: bool, message: impl Into<String>) -> Option<ProgressBar> {
        if !message_enabled {
            return None;
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.into());
        progress.enable_steady_tick(Duration::from_millis(80));
        Some(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_inspection_lives_in_chat_only() {
        assert!(Cli::try_parse_from(["yt-agent", "sessions"]).is_err());
        assert!(Cli::try_parse_from(["yt-agent", "telemetry"]).is_err());
        let cli = Cli::try_parse_from(["yt-agent", "chat", "--session", "s1"]).expect("chat parses");
        assert!(matches!(cli.command, Command::Chat { ref session, message: None } if session == "s1"));
    }
}
