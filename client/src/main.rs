//! Command-line driver for the generation backend
//!
//! Runs the full flow against a live backend: register, save the
//! generation parameters, submit a novel, optionally review the
//! storyboard, wait for the video and download it.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use client::{ClientConfig, PollOutcome, SessionClient};
use shared::{AudioVideoConfig, ModelConfig, NovelSubmitRequest, VideoStatus, logging, session_info};

const COMPONENT: &str = "client";

#[derive(Parser, Debug)]
#[command(name = "client")]
#[command(about = "Session client for the novel-to-video generation backend")]
struct Args {
    /// Backend origin; overrides API_BASE_URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a client, print its identity and disconnect
    Register,

    /// Print this client's backend status and the server-wide session stats
    Status,

    /// Submit a novel and download the rendered video
    Generate {
        /// UTF-8 text file with the novel
        #[arg(long)]
        input: PathBuf,

        /// Generate a storyboard for review before rendering
        #[arg(long)]
        storyboard: bool,

        /// Extra prompt passed to the generator
        #[arg(long)]
        prompt: Option<String>,

        /// Model configuration as a JSON file
        #[arg(long)]
        model_config: Option<PathBuf>,

        /// Audio/video configuration as a JSON file
        #[arg(long)]
        av_config: Option<PathBuf>,

        /// Replace the dialogue of storyboard cell N, as N=TEXT
        #[arg(long, value_parser = parse_dialogue_edit)]
        edit_dialogue: Vec<(usize, String)>,

        /// Where to write the video
        #[arg(long, default_value = "output.mp4")]
        output: PathBuf,
    },
}

fn parse_dialogue_edit(raw: &str) -> Result<(usize, String), String> {
    let (index, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected N=TEXT, got {raw}"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid cell index {index}: {e}"))?;
    Ok((index, text.to_string()))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &args.base_url {
        let overridden = ClientConfig::with_base_url(base_url)?;
        config.base_url = overridden.base_url;
    }

    logging::log_startup(COMPONENT, &format!("session client for {}", config.base_url));
    let session = SessionClient::over_http(config)?;

    let result = run(&session, args.command).await;
    session.disconnect().await;

    match &result {
        Ok(()) => tracing::info!(component = COMPONENT, "🛑 Finished"),
        Err(e) => logging::log_error(COMPONENT, "Command", &format!("{e:#}")),
    }
    result
}

async fn run(session: &SessionClient, command: Command) -> Result<()> {
    let info = session.register().await.context("registering client")?;
    println!("client_id: {}", info.client_id);
    if let Some(created_at) = info.created_at {
        println!("created_at: {}", created_at.to_rfc3339());
    }

    match command {
        Command::Register => Ok(()),
        Command::Status => {
            println!("status: {}", session.check_client_status().await);
            let stats = session.session_stats().await?;
            println!(
                "clients: {} total, {} online, {} offline",
                stats.total_clients, stats.online_clients, stats.offline_clients
            );
            Ok(())
        }
        Command::Generate {
            input,
            storyboard,
            prompt,
            model_config,
            av_config,
            edit_dialogue,
            output,
        } => {
            let text = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;

            if let Some(path) = &model_config {
                let config: ModelConfig = read_json(path).await?;
                session.save_model_config(&config).await.context("saving model config")?;
            }
            if let Some(path) = &av_config {
                let config: AudioVideoConfig = read_json(path).await?;
                session.save_audio_video_config(&config).await.context("saving audio/video config")?;
            }

            let mut request = NovelSubmitRequest::new(text).with_storyboard(storyboard);
            if let Some(prompt) = prompt {
                request = request.with_prompt(prompt);
            }
            session.submit_novel(&request).await.context("submitting novel")?;
            let label = session_label(session).await;
            session_info!(label, input = %input.display(), "📋 Novel submitted");

            if storyboard {
                review_storyboard(session, &edit_dialogue).await?;
            }

            render_video(session, &output).await
        }
    }
}

async fn review_storyboard(session: &SessionClient, edits: &[(usize, String)]) -> Result<()> {
    let mut table = match session.wait_for_storyboard().await? {
        PollOutcome::Completed(table) => table,
        PollOutcome::Failed(message) => bail!("storyboard generation failed: {message}"),
        PollOutcome::TimedOut => bail!("timed out waiting for the storyboard"),
        PollOutcome::Cancelled => bail!("storyboard polling was cancelled"),
    };

    for cell in &table.cells {
        println!("#{:<3} {} | {}", cell.shot_number, cell.main_character, cell.dialogue);
    }

    if edits.is_empty() {
        return Ok(());
    }
    for (index, text) in edits {
        table.edit_cell(*index, |cell| cell.dialogue = text.clone())?;
    }
    session.save_storyboard(&table).await.context("saving storyboard")?;
    let label = session_label(session).await;
    session_info!(label, edits = edits.len(), "✅ Storyboard saved");
    Ok(())
}

async fn render_video(session: &SessionClient, output: &PathBuf) -> Result<()> {
    let label = session_label(session).await;
    let (tx, mut rx) = mpsc::channel::<VideoStatus>(16);
    let progress = tokio::spawn(async move {
        while let Some(status) = rx.recv().await {
            if let Some(percent) = progress_percent(&status) {
                session_info!(label, progress = %percent, "📋 Rendering");
            }
        }
    });

    let outcome = session.wait_for_video_with_updates(tx).await;
    let _ = progress.await;

    match outcome? {
        PollOutcome::Completed(_) => {
            let bytes = session.download_video_to(output).await.context("downloading video")?;
            let label = session_label(session).await;
            session_info!(label, bytes, output = %output.display(), "✅ Video written");
            println!("{}", output.display());
            Ok(())
        }
        PollOutcome::Failed(message) => bail!("video generation failed: {message}"),
        PollOutcome::TimedOut => bail!("timed out waiting for the video"),
        PollOutcome::Cancelled => bail!("video polling was cancelled"),
    }
}

/// Identity to tag log lines with; it changes when the session reconnects
async fn session_label(session: &SessionClient) -> String {
    session
        .client_id()
        .await
        .map_or_else(|| "unregistered".to_string(), |id| id.to_string())
}

fn progress_percent(status: &VideoStatus) -> Option<String> {
    status.progress_fraction().map(|fraction| format!("{:.0}%", fraction * 100.0))
}
