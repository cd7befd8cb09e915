//! Audio I/O utilities.
//!
//! WAV read/write for generated clips (32 kHz, any channel count).

mod wav;

pub use wav::{WavInfo, read_wav, wav_duration_s, wav_info, write_wav};
