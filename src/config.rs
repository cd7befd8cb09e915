//! Runtime configuration and fixed generation constants.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Native sample rate of the musicgen audio codec.
pub const SAMPLE_RATE: u32 = 32000;

/// Pretrained checkpoint requested from the inference backend.
pub const MODEL_ID: &str = "facebook/musicgen-small";

/// Top-k truncation used for every generation.
pub const TOP_K: usize = 250;

pub const DEFAULT_OUTPUT_DIR: &str = "audio_output/";

pub const DEFAULT_DURATION_S: u32 = 10;

/// Upper bound of the duration control, inclusive.
pub const MAX_DURATION_S: u32 = 20;

pub const DEFAULT_SOCKET: &str = "/tmp/musicgen.sock";

/// Where each interaction writes its audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
    /// Write straight into the output directory. Every interaction shares
    /// `audio_0.wav`, so only one interaction may be in flight.
    Fixed,
    /// Write into `<output_dir>/<uuid>/` so artifacts never collide.
    PerRequest,
}

/// Application configuration, assembled from CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model_id: String,
    pub sample_rate: u32,
    pub output_dir: PathBuf,
    pub layout: OutputLayout,
    /// Unix socket of the inference backend.
    pub socket: PathBuf,
    /// Seconds to wait for a single backend reply.
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_id: MODEL_ID.to_string(),
            sample_rate: SAMPLE_RATE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            layout: OutputLayout::PerRequest,
            socket: PathBuf::from(DEFAULT_SOCKET),
            timeout_secs: 300,
        }
    }
}

impl AppConfig {
    /// Directory a new interaction should write into.
    pub fn artifact_dir(&self) -> PathBuf {
        artifact_dir(&self.output_dir, self.layout)
    }
}

fn artifact_dir(output_dir: &Path, layout: OutputLayout) -> PathBuf {
    match layout {
        OutputLayout::Fixed => output_dir.to_path_buf(),
        OutputLayout::PerRequest => output_dir.join(uuid::Uuid::new_v4().to_string()),
    }
}
