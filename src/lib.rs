//! Text-to-music generation front end.
//!
//! Takes a free-text description and a duration, asks a pretrained music
//! model for one clip, saves it as WAV and produces an inline player plus a
//! self-contained download link.
//!
//! ## Pipeline
//!
//! ```text
//! description, duration
//!        ↓
//! ModelProvider::generate   (model loaded once, configured per call)
//!        ↓
//! AudioPersister::save      ([C, N] or [B, C, N] → audio_{idx}.wav)
//!        ↓
//! read back audio_0.wav
//!        ↓
//! inline player + encode_download_link
//! ```
//!
//! ## Modules
//!
//! - [`audio`]: WAV read/write
//! - [`waveform`]: tensor wrapper with shape normalization
//! - [`model`]: model boundary traits and the Unix-socket backend
//! - [`provider`]: lazily loaded, cached model handle
//! - [`persist`]: waveform → WAV files
//! - [`link`]: `data:` URI download links and players
//! - [`shell`]: one submission as a state machine, results page
//! - [`config`]: constants and runtime configuration

pub mod audio;
pub mod config;
pub mod link;
pub mod model;
pub mod persist;
pub mod provider;
pub mod shell;
pub mod waveform;

mod error;

pub use error::{Error, Result};
