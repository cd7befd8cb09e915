//! Boundary to the pretrained generative model.
//!
//! The model itself lives outside this crate. [`ModelLoader`] obtains a
//! handle for a checkpoint id, and [`MusicModel`] is that handle: its
//! sampling policy is mutable state that must be set with
//! [`MusicModel::configure`] before each [`MusicModel::generate_one`].
//!
//! - [`daemon`]: handle backed by a resident inference server on a Unix socket

pub mod daemon;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::config::TOP_K;
use crate::waveform::Waveform;

/// Sampling policy applied to the model before a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub use_sampling: bool,
    pub top_k: usize,
    /// Length of the generated clip in seconds.
    pub duration_s: u32,
}

impl GenerationSettings {
    /// Sampling on, top-k 250, the requested length.
    pub fn for_duration(duration_s: u32) -> Self {
        Self {
            use_sampling: true,
            top_k: TOP_K,
            duration_s,
        }
    }
}

/// A loaded pretrained music model.
pub trait MusicModel: Send {
    /// Replace the sampling policy used by subsequent generations.
    fn configure(&mut self, settings: &GenerationSettings) -> Result<()>;

    /// Generate exactly one clip for `description`.
    fn generate_one(&mut self, description: &str) -> Result<Waveform>;
}

/// Loads a [`MusicModel`] by checkpoint id. Loading may be slow.
pub trait ModelLoader: Send + Sync {
    fn load_pretrained(&self, model_id: &str) -> Result<Box<dyn MusicModel>>;
}
