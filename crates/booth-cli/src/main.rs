use anyhow::{Context, Result};
use booth_capture::{CapturePipeline, Layers, UploadStatus};
use booth_core::filter::FilterInterpreter;
use booth_core::text_command::{self, TextInterpreter};
use booth_core::{BoothState, Filter};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod collab;
mod config;
mod script;

use collab::{CannedFilter, CannedText, DirectorySink};
use config::Config;
use script::{Collaborators, Script};

#[derive(Parser)]
#[command(name = "booth", about = "Photo booth overlay engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an interaction script and print the final frame as JSON
    Replay {
        /// Script file (.json or .toml)
        script: PathBuf,
        /// Canned text collaborator reply (JSON file)
        #[arg(long)]
        text_reply: Option<PathBuf>,
        /// Canned filter collaborator reply (JSON file)
        #[arg(long)]
        filter_reply: Option<PathBuf>,
    },
    /// Flatten a video frame with overlay and drawing layers into a PNG
    Capture {
        /// Video frame image
        #[arg(long)]
        video: PathBuf,
        /// Rendered overlay layer, same size as the video
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Pre-rendered drawing layer, same size as the video
        #[arg(long, conflicts_with = "script")]
        drawing: Option<PathBuf>,
        /// Replay this script first; its strokes and filter are used
        #[arg(long)]
        script: Option<PathBuf>,
        /// Filter name (overrides the script's filter)
        #[arg(short, long)]
        filter: Option<String>,
        /// Output PNG path
        #[arg(short, long)]
        out: PathBuf,
        /// Store the photo and its metadata in this directory
        #[arg(long)]
        upload_dir: Option<PathBuf>,
    },
    /// Interpret a text command with the local fallback and print it as JSON
    ParseText {
        command: String,
        /// Canned text collaborator reply (JSON file)
        #[arg(long)]
        reply: Option<PathBuf>,
    },
    /// List filters, or resolve a mood description to one
    Filters {
        /// Free-text description, e.g. "old film"
        #[arg(short, long)]
        describe: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Replay { script, text_reply, filter_reply } => {
            let text = read_optional(text_reply.as_deref())?.map(CannedText);
            let filter = read_optional(filter_reply.as_deref())?.map(CannedFilter);
            let collaborators = Collaborators {
                text: text.as_ref().map(|t| t as &dyn TextInterpreter),
                filter: filter.as_ref().map(|f| f as &dyn FilterInterpreter),
            };
            let (_, report) = run_script(&config, &script, &collaborators)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Capture { video, overlay, drawing, script, filter, out, upload_dir } => {
            let video_img = load_rgba(&video)?;
            let overlay_img = overlay.as_deref().map(load_rgba).transpose()?;
            let filter = filter
                .map(|name| name.parse::<Filter>())
                .transpose()
                .context("invalid --filter")?;

            let outcome = match script {
                Some(path) => {
                    let (mut state, _) = run_script(&config, &path, &Collaborators::default())?;
                    if let Some(filter) = filter {
                        state.set_filter(filter);
                    }
                    let mut pipeline = CapturePipeline::from_state(&state);
                    let mut sink = upload_dir.map(DirectorySink::new);
                    let outcome = pipeline.capture(
                        &state,
                        &video_img,
                        overlay_img.as_ref(),
                        sink.as_mut().map(|s| s as &mut dyn booth_capture::UploadSink),
                    )?;
                    report_upload(&outcome.upload);
                    outcome.image
                }
                None => {
                    let drawing_img = drawing.as_deref().map(load_rgba).transpose()?;
                    let layers = Layers { video: &video_img, overlay: overlay_img.as_ref(), drawing: drawing_img.as_ref() };
                    booth_capture::composite(&layers, filter.unwrap_or_default())?
                }
            };

            outcome.save(&out).with_context(|| format!("writing {}", out.display()))?;
            println!("{} ({}x{})", out.display(), outcome.width(), outcome.height());
        }
        Commands::ParseText { command, reply } => {
            let canned = read_optional(reply.as_deref())?.map(CannedText);
            let interpreter = canned.as_ref().map(|c| c as &dyn TextInterpreter);
            let parsed = text_command::interpret(interpreter, &command, &config.booth.text_style);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Commands::Filters { describe } => match describe {
            Some(description) => {
                let choice = booth_core::filter::resolve_filter(None, &description);
                println!("{}\t{}", choice.filter, choice.interpretation);
            }
            None => {
                for filter in Filter::ALL {
                    println!("{:<10} {}", filter.name(), filter.css());
                }
            }
        },
    }

    Ok(())
}

fn run_script(
    config: &Config,
    path: &Path,
    collaborators: &Collaborators,
) -> Result<(BoothState, script::ReplayReport)> {
    let loaded = Script::load(path)?;
    let canvas = loaded.canvas.unwrap_or(config.canvas);
    let mut state = BoothState::new(config.booth.clone(), canvas);
    let report = script::replay(&mut state, &loaded.steps, collaborators);
    tracing::info!(steps = loaded.steps.len(), path = %path.display(), "script replayed");
    Ok((state, report))
}

fn load_rgba(path: &Path) -> Result<image::RgbaImage> {
    let img = image::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(img.to_rgba8())
}

fn read_optional(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|p| std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()
}

fn report_upload(status: &UploadStatus) {
    match status {
        UploadStatus::Uploaded(receipt) => {
            println!("uploaded {} {}", receipt.photo_id, receipt.filename.as_deref().unwrap_or(""));
        }
        UploadStatus::Failed(e) => eprintln!("upload failed: {e}"),
        UploadStatus::InProgress | UploadStatus::Skipped => {}
    }
}
