//! backboard - command-line client for the Backboard team-knowledge assistant
//!
//! Asks questions of a Backboard backend, shows where each answer came from
//! (Telegram chats, git history, Google Drive documents), and reports on the
//! backend's ingestion sources.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/backboard/config.toml (~/.config/backboard/config.toml)
//! - Logs: $XDG_STATE_HOME/backboard/backboard.log (~/.local/state/backboard/backboard.log)

mod render;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use backboard_core::tools::CreateFileRequest;
use backboard_core::workspace::write_workspace_file;
use backboard_core::{BackboardClient, Config, FileContext, SourceClassifier};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "backboard")]
#[command(about = "Ask Backboard about your team's knowledge")]
#[command(version)]
struct Args {
    /// Backend URL (overrides config.toml and BACKBOARD_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Client ID (overrides config.toml and BACKBOARD_CLIENT_ID)
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question; `@tool` directives are sent to the tool endpoint
    Ask {
        /// The question
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,

        /// Attach a file as context
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Attach only these lines of the file (e.g. 10-24, 1-based)
        #[arg(short, long, requires = "file", value_parser = parse_line_range)]
        lines: Option<(u32, u32)>,

        /// Workspace root for files created by `@create_file`
        #[arg(short, long, default_value = ".")]
        workspace: PathBuf,

        /// Show tool results without writing any files
        #[arg(long)]
        no_write: bool,
    },

    /// Classify source strings (arguments, or one per line on stdin)
    Classify {
        sources: Vec<String>,
    },

    /// Check that the backend is up
    Health,

    /// Show which ingestion sources are connected
    Status,

    /// Show recent ingestion activity
    Activity {
        /// Maximum number of entries
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show the effective configuration
    Config,
}

/// Parse `START-END` or a single line number
fn parse_line_range(s: &str) -> std::result::Result<(u32, u32), String> {
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid line number {:?}: {}", v, e))
    };

    let (start, end) = match s.split_once('-') {
        Some((start, end)) => (parse(start)?, parse(end)?),
        None => {
            let line = parse(s)?;
            (line, line)
        }
    };

    if start == 0 || end < start {
        return Err(format!("invalid line range {}: lines are 1-based and START <= END", s));
    }
    Ok((start, end))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    config.apply_overrides(args.api_url.clone(), args.client_id.clone());

    // Initialize logging (to file; stdout carries command output)
    let _log_guard =
        backboard_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(api_url = %config.backend.api_url, "backboard starting");

    match args.command {
        Command::Ask {
            prompt,
            file,
            lines,
            workspace,
            no_write,
        } => {
            let prompt = prompt.join(" ");
            cmd_ask(&config, &prompt, file.as_deref(), lines, &workspace, no_write, args.json)
                .await
        }
        Command::Classify { sources } => cmd_classify(&config, sources, args.json),
        Command::Health => cmd_health(&config).await,
        Command::Status => cmd_status(&config, args.json).await,
        Command::Activity { limit } => cmd_activity(&config, limit, args.json).await,
        Command::Config => cmd_config(&config),
    }
}

async fn cmd_ask(
    config: &Config,
    prompt: &str,
    file: Option<&Path>,
    lines: Option<(u32, u32)>,
    workspace: &Path,
    no_write: bool,
    json: bool,
) -> Result<()> {
    let client = BackboardClient::from_config(config).context("failed to create client")?;

    let context = file
        .map(|path| {
            FileContext::from_file(path, lines)
                .with_context(|| format!("failed to attach {}", path.display()))
        })
        .transpose()?;

    tracing::info!(client_id = client.client_id(), attached = context.is_some(), "Asking backend");
    let reply = client.dispatch(prompt, context.as_ref()).await;
    tracing::info!(sources = reply.source_count(), "Received reply");

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", render::message_text(&reply));
    }

    if let Some(tool) = &reply.tool_result {
        if let Some(request) = CreateFileRequest::from_tool_result(tool)? {
            if no_write {
                tracing::info!(filename = %request.filename, "Skipping file write (--no-write)");
            } else {
                let path = write_workspace_file(workspace, &request)
                    .with_context(|| format!("refused to create {}", request.filename))?;
                // keep stdout parseable in JSON mode
                if json {
                    eprintln!("Created {}", path.display());
                } else {
                    println!();
                    println!("Created {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn cmd_classify(config: &Config, sources: Vec<String>, json: bool) -> Result<()> {
    let sources = if sources.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("failed to read sources from stdin")?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        sources
    };

    let classifier = SourceClassifier::from_config(&config.classifier);
    let classified = classifier.classify_all(&sources);

    if json {
        println!("{}", serde_json::to_string_pretty(&classified)?);
        return Ok(());
    }

    for source in &classified {
        println!(
            "{:<10} {:<45} {}",
            source.source_type.as_str(),
            source.source_label,
            render::preview(&source.content, 40)
        );
    }

    Ok(())
}

async fn cmd_health(config: &Config) -> Result<()> {
    let client = BackboardClient::from_config(config).context("failed to create client")?;

    if client.health_check().await? {
        println!("Backend {}: ok", client.base_url());
        Ok(())
    } else {
        anyhow::bail!("Backend {} is not healthy or unreachable", client.base_url())
    }
}

async fn cmd_status(config: &Config, json: bool) -> Result<()> {
    let client = BackboardClient::from_config(config).context("failed to create client")?;
    let status = client
        .system_status()
        .await
        .context("failed to fetch system status")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Backboard Sources");
    println!("=================");
    println!();
    println!(
        "Client:    {} ({}{})",
        status.client.id,
        if status.client.exists {
            "registered"
        } else {
            "not registered"
        },
        if status.client.has_api_key {
            ", api key set"
        } else {
            ""
        }
    );
    println!();
    println!("{:<12} {:>10} {:>10} {:>24}", "Source", "Connected", "Docs", "Last Updated");
    println!("{:-<59}", "");

    for (name, service) in [
        ("Drive", &status.drive),
        ("Telegram", &status.telegram),
        ("Codebase", &status.codebase),
    ] {
        println!(
            "{:<12} {:>10} {:>10} {:>24}",
            name,
            if service.connected { "yes" } else { "no" },
            service
                .document_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            service.last_updated.as_deref().unwrap_or("never")
        );
    }

    Ok(())
}

async fn cmd_activity(config: &Config, limit: usize, json: bool) -> Result<()> {
    let client = BackboardClient::from_config(config).context("failed to create client")?;
    let items = client
        .activity(limit)
        .await
        .context("failed to fetch activity")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No recent activity.");
        return Ok(());
    }

    for item in &items {
        println!("{:<22} {:<10} {}", item.time, item.source, item.title);
        if !item.summary.is_empty() {
            println!("{:<33} {}", "", item.summary);
        }
    }

    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("Backboard Configuration");
    println!("=======================");
    println!();
    println!("Config File:   {}", Config::config_path().display());
    println!("Log File:      {}", backboard_core::logging::log_file_path().display());
    println!();
    println!("API URL:       {}", config.backend.api_url);
    println!("Client ID:     {}", config.backend.client_id);
    println!("Timeout:       {}s", config.backend.timeout_secs);
    println!("Team Members:  {}", config.classifier.team_members.join(", "));
    println!("Log Level:     {}", config.logging.level);

    if let Err(e) = config.backend.validate() {
        println!();
        println!("Warning: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_range() {
        assert_eq!(parse_line_range("10-24"), Ok((10, 24)));
        assert_eq!(parse_line_range("7"), Ok((7, 7)));
        assert!(parse_line_range("0-3").is_err());
        assert!(parse_line_range("9-3").is_err());
        assert!(parse_line_range("a-b").is_err());
    }

    #[test]
    fn test_args_parse() {
        use clap::CommandFactory;
        Args::command().debug_assert();

        let args = Args::try_parse_from([
            "backboard", "ask", "--file", "src/lib.rs", "--lines", "3-5", "what", "is", "this",
        ])
        .unwrap();
        match args.command {
            Command::Ask {
                prompt, lines, file, ..
            } => {
                assert_eq!(prompt.join(" "), "what is this");
                assert_eq!(lines, Some((3, 5)));
                assert_eq!(file, Some(PathBuf::from("src/lib.rs")));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_lines_requires_file() {
        assert!(Args::try_parse_from(["backboard", "ask", "--lines", "1-2", "q"]).is_err());
    }
}
