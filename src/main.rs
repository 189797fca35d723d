use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use javabot::format::strip_markup;
use javabot::{ApiClient, ChatWidget, Config, MessageKind};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "javabot", version)]
#[command(about = "Ask Java questions or get pasted code compiled and analysed")]
struct Cli {
    /// Backend query URL (overrides the saved config)
    #[arg(short, long, global = true, env = "JAVABOT_ENDPOINT")]
    endpoint: Option<String>,

    /// Give up on a request after this many seconds (0 waits forever)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send one message and print the reply
    Ask {
        /// Message text; omit or pass "-" to read from stdin
        text: Vec<String>,
        /// Print the reply markup as-is instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Check whether the backend is up
    Health,
    /// Show or change saved settings
    Config {
        /// Save a default backend query URL
        #[arg(long, value_name = "URL")]
        set_endpoint: Option<String>,
        /// Save a default request timeout in seconds (0 disables)
        #[arg(long, value_name = "SECS")]
        set_timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    init_logging(LogTarget::for_command(&command))?;

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {e}");
        Config::new()
    });

    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());
    let timeout = config.resolve_timeout(cli.timeout_secs);
    let build_client = || {
        let client = ApiClient::with_timeout(&endpoint, timeout)
            .with_context(|| format!("Cannot use endpoint {endpoint}"))?;
        info!(endpoint = %endpoint, timeout = ?timeout, "client ready");
        anyhow::Ok(client)
    };

    match command {
        Commands::Chat => {
            run_chat(build_client()?).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ask { text, html } => ask(&build_client()?, text, html).await,
        Commands::Health => health(&build_client()?).await,
        Commands::Config { set_endpoint, set_timeout } => {
            configure(&mut config, set_endpoint, set_timeout)
        }
    }
}

async fn run_chat(client: ApiClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(client);
    app.check_health();

    let result = run_loop(&mut terminal, &mut app).await;
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }

    Ok(())
}

async fn ask(client: &ApiClient, text: Vec<String>, html: bool) -> Result<ExitCode> {
    let text = if text.is_empty() || text == ["-"] {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read message from stdin")?;
        buffer
    } else {
        text.join(" ")
    };

    let mut widget = ChatWidget::new();
    let Some(reply) = widget.submit(client, &text).await else {
        eprintln!("Nothing to send.");
        return Ok(ExitCode::from(2));
    };

    if html {
        println!("{}", reply.content);
    } else {
        println!("{}", strip_markup(&reply.content));
    }

    Ok(match reply.kind {
        MessageKind::Error => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

async fn health(client: &ApiClient) -> Result<ExitCode> {
    match client.health().await {
        Ok(status) if status.is_ok() => {
            println!("{}: {}", status.status, status.message);
            Ok(ExitCode::SUCCESS)
        }
        Ok(status) => {
            println!("{}: {}", status.status, status.message);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            eprintln!("Backend unreachable at {}: {e}", client.endpoint());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn configure(
    config: &mut Config,
    set_endpoint: Option<String>,
    set_timeout: Option<u64>,
) -> Result<ExitCode> {
    let changed = set_endpoint.is_some() || set_timeout.is_some();

    if let Some(endpoint) = set_endpoint {
        config.set_endpoint(&endpoint)?;
    }
    if let Some(secs) = set_timeout {
        config.timeout_secs = Some(secs);
    }
    if changed {
        config.save()?;
        println!("Saved {}", Config::config_path()?.display());
    }

    println!("endpoint: {}", config.resolve_endpoint(None));
    match config.resolve_timeout(None) {
        Some(timeout) => println!("timeout:  {}s", timeout.as_secs()),
        None => println!("timeout:  none"),
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogTarget {
    /// The TUI owns the terminal, so logs go to a file.
    File,
    Stderr,
}

impl LogTarget {
    fn for_command(command: &Commands) -> Self {
        match command {
            Commands::Chat => LogTarget::File,
            _ => LogTarget::Stderr,
        }
    }

    /// Filter used when `RUST_LOG` is unset. One-shot commands share stderr
    /// with the user, so they only report warnings.
    fn default_directive(self) -> &'static str {
        match self {
            LogTarget::File => "javabot=info",
            LogTarget::Stderr => "javabot=warn",
        }
    }
}

fn init_logging(target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(target.default_directive()));

    match target {
        LogTarget::File => {
            let path = log_path();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(io::stderr)
                .init();
        }
    }

    Ok(())
}

fn log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("javabot")
        .join("javabot.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_logs_to_file_at_info() {
        let target = LogTarget::for_command(&Commands::Chat);
        assert_eq!(target, LogTarget::File);
        assert_eq!(target.default_directive(), "javabot=info");
    }

    #[test]
    fn test_one_shot_commands_log_warnings_to_stderr() {
        let target = LogTarget::for_command(&Commands::Health);
        assert_eq!(target, LogTarget::Stderr);
        assert_eq!(target.default_directive(), "javabot=warn");
    }
}
