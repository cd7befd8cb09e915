//! Text-to-music CLI.
//!
//! Sends a description to a resident inference server (see
//! [`musicgen_rs::model::daemon`]), saves the clip as WAV and optionally writes
//! an HTML page with an inline player and a download link.
//!
//! # Output
//!
//! One JSON line per submission on stdout:
//!
//! ```json
//! {"ok":true,"path":"audio_output/3f2a.../audio_0.wav","sample_rate":32000,"duration_s":5.0}
//! {"ok":false,"error":"Music generation failed.","detail":"error loading model: ..."}
//! ```
//!
//! Without `--description` the CLI prompts on stdin and keeps the model
//! loaded between submissions until EOF.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use musicgen_rs::audio::wav_info;
use musicgen_rs::config::{
    AppConfig, DEFAULT_DURATION_S, DEFAULT_OUTPUT_DIR, DEFAULT_SOCKET, MAX_DURATION_S, MODEL_ID,
    OutputLayout, SAMPLE_RATE,
};
use musicgen_rs::model::ModelLoader;
use musicgen_rs::model::daemon::DaemonLoader;
use musicgen_rs::provider::ModelProvider;
use musicgen_rs::shell::{GenerationRequest, Interaction, Stage, render_page};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum LayoutChoice {
    /// Always write <output-dir>/audio_0.wav.
    Fixed,
    /// Write <output-dir>/<uuid>/audio_0.wav for each submission.
    PerRequest,
}

impl From<LayoutChoice> for OutputLayout {
    fn from(choice: LayoutChoice) -> Self {
        match choice {
            LayoutChoice::Fixed => OutputLayout::Fixed,
            LayoutChoice::PerRequest => OutputLayout::PerRequest,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "musicgen",
    about = "Generate a short music clip from a text description",
    long_about = "Generate a short music clip from a text description.\n\
                  Talks to a resident inference server over a Unix socket.\n\
                  Omit --description to enter descriptions interactively."
)]
struct Args {
    /// Text description of the music: genre, mood, instruments.
    #[arg(long, short = 'd')]
    description: Option<String>,

    /// Duration in seconds (0–20).
    #[arg(
        long,
        short = 't',
        default_value_t = DEFAULT_DURATION_S,
        value_parser = clap::value_parser!(u32).range(0..=MAX_DURATION_S as i64)
    )]
    duration: u32,

    /// Directory generated WAV files are written to.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// How output files are named across submissions.
    #[arg(long, value_enum, default_value_t = LayoutChoice::PerRequest)]
    layout: LayoutChoice,

    /// Unix socket of the inference server.
    #[arg(long, default_value = DEFAULT_SOCKET)]
    socket: PathBuf,

    /// Pretrained checkpoint to load.
    #[arg(long, default_value = MODEL_ID)]
    model: String,

    /// Seconds to wait for the server to answer a request.
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Write a results page (player + download link) to this path.
    #[arg(long)]
    html: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outcome {
    Done {
        path: String,
        sample_rate: u32,
        duration_s: f64,
    },
    Failed {
        error: String,
        detail: String,
    },
}

/// Summary line printed for each submission.
#[derive(Debug, Serialize)]
struct Summary {
    ok: bool,
    #[serde(flatten)]
    outcome: Outcome,
}

impl From<Outcome> for Summary {
    fn from(outcome: Outcome) -> Self {
        Self {
            ok: matches!(outcome, Outcome::Done { .. }),
            outcome,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = AppConfig {
        model_id: args.model.clone(),
        sample_rate: SAMPLE_RATE,
        output_dir: args.output_dir.clone(),
        layout: args.layout.into(),
        socket: args.socket.clone(),
        timeout_secs: args.timeout_secs,
    };

    let loader = DaemonLoader::new(&config.socket, Duration::from_secs(config.timeout_secs));
    let provider = ModelProvider::new(loader, config.model_id.clone());
    let mut interaction = Interaction::new(&provider, &config);

    match args.description {
        Some(description) => {
            let request = GenerationRequest::new(description, args.duration)?;
            if !request.is_ready() {
                anyhow::bail!("description must not be empty");
            }
            let ok = submit(&mut interaction, &request, args.html.as_ref())?;
            if !ok {
                std::process::exit(1);
            }
        }
        None => prompt_loop(&mut interaction, args.duration, args.html.as_ref())?,
    }

    Ok(())
}

/// Read description/duration pairs from stdin until EOF.
fn prompt_loop<L: ModelLoader>(
    interaction: &mut Interaction<'_, L>,
    default_duration: u32,
    html: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        eprint!("description> ");
        std::io::stderr().flush()?;
        let Some(description) = lines.next().transpose()? else {
            break;
        };
        if description.is_empty() {
            continue;
        }

        eprint!("duration [{default_duration}]> ");
        std::io::stderr().flush()?;
        let Some(duration_line) = lines.next().transpose()? else {
            break;
        };
        let duration = match duration_line.trim() {
            "" => default_duration,
            text => match text.parse::<u32>() {
                Ok(d) => d,
                Err(e) => {
                    eprintln!("invalid duration '{text}': {e}");
                    continue;
                }
            },
        };

        let request = match GenerationRequest::new(description, duration) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        submit(interaction, &request, html)?;
    }

    Ok(())
}

/// Run one submission, print its summary line, optionally write the page.
///
/// Returns whether the submission succeeded.
fn submit<L: ModelLoader>(
    interaction: &mut Interaction<'_, L>,
    request: &GenerationRequest,
    html: Option<&PathBuf>,
) -> anyhow::Result<bool> {
    eprintln!("{}", serde_json::to_string_pretty(&request.summary_json())?);

    let stage = interaction.submit(request);
    let summary = Summary::from(match stage {
        Stage::Done(rendered) => {
            let info = wav_info(&rendered.audio_path)?;
            Outcome::Done {
                path: rendered.audio_path.to_string_lossy().into_owned(),
                sample_rate: info.sample_rate,
                duration_s: info.duration_s,
            }
        }
        Stage::Failed(failure) => {
            eprintln!("{}", failure.message());
            Outcome::Failed {
                error: failure.message().to_string(),
                detail: failure.to_string(),
            }
        }
        other => anyhow::bail!("submission stopped at {:?}", other.step()),
    });

    if let Some(path) = html {
        std::fs::write(path, render_page(request, stage))?;
        tracing::info!(page = %path.display(), "wrote results page");
    }

    println!("{}", serde_json::to_string(&summary)?);
    Ok(summary.ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_ok_follows_outcome() {
        let done = Summary::from(Outcome::Done {
            path: "audio_output/audio_0.wav".into(),
            sample_rate: 32000,
            duration_s: 5.0,
        });
        let json = serde_json::to_value(&done).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["sample_rate"], 32000);

        let failed = Summary::from(Outcome::Failed {
            error: "Music generation failed.".into(),
            detail: "error loading model: x".into(),
        });
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ok": false,
                "error": "Music generation failed.",
                "detail": "error loading model: x",
            })
        );
    }
}
