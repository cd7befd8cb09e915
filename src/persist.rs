//! Audio persister: writes generated clips to disk as WAV.

use std::path::{Path, PathBuf};

use crate::audio::write_wav;
use crate::config::{DEFAULT_OUTPUT_DIR, SAMPLE_RATE};
use crate::waveform::Waveform;

/// Failure to persist a waveform.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Nothing was generated; no I/O was attempted.
    #[error("no audio samples to save")]
    MissingWaveform,

    /// Directory creation, shape handling or WAV encoding failed.
    #[error("failed to save audio: {0}")]
    Write(#[from] crate::Error),
}

/// Writes each clip of a waveform to `<output_dir>/audio_{idx}.wav`.
#[derive(Debug, Clone)]
pub struct AudioPersister {
    pub sample_rate: u32,
    pub output_dir: PathBuf,
}

impl Default for AudioPersister {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl AudioPersister {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// File name used for the clip at batch position `idx`.
    pub fn clip_path(&self, idx: usize) -> PathBuf {
        clip_path(&self.output_dir, idx)
    }

    /// Persist every clip, overwriting existing files of the same name.
    ///
    /// Returns the written paths in batch order.
    pub fn save(&self, waveform: Option<&Waveform>) -> Result<Vec<PathBuf>, PersistError> {
        let Some(waveform) = waveform else {
            tracing::error!("no audio samples to save");
            return Err(PersistError::MissingWaveform);
        };

        std::fs::create_dir_all(&self.output_dir).map_err(crate::Error::from)?;

        let clips = waveform.clips()?;
        let mut written = Vec::with_capacity(clips.len());
        for (idx, clip) in clips.iter().enumerate() {
            let path = self.clip_path(idx);
            write_wav(&path, &clip.samples, self.sample_rate, clip.channels)?;
            tracing::debug!(path = %path.display(), channels = clip.channels, "wrote clip");
            written.push(path);
        }
        Ok(written)
    }
}

pub(crate) fn clip_path(dir: &Path, idx: usize) -> PathBuf {
    dir.join(format!("audio_{idx}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{Device, Tensor};

    fn stereo_ramp(frames: usize) -> Vec<f32> {
        (0..frames * 2).map(|i| (i as f32 / frames as f32) - 1.0).collect()
    }

    #[test]
    fn test_missing_waveform_does_no_io() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never_created");
        let persister = AudioPersister::new(&out);
        assert!(matches!(
            persister.save(None),
            Err(PersistError::MissingWaveform)
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_creates_nested_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a/b/c");
        let w = Waveform::from_interleaved(&stereo_ramp(10), 2, SAMPLE_RATE).unwrap();
        let written = AudioPersister::new(&out).save(Some(&w)).unwrap();
        assert_eq!(written, vec![out.join("audio_0.wav")]);
        assert!(out.join("audio_0.wav").exists());
    }

    #[test]
    fn test_batch_writes_one_file_per_clip() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<f32> = (0..3 * 2 * 4).map(|i| i as f32 / 24.0).collect();
        let t = Tensor::from_vec(data, (3, 2, 4), &Device::Cpu).unwrap();
        let w = Waveform::new(t, SAMPLE_RATE).unwrap();
        let persister = AudioPersister::new(dir.path());
        let written = persister.save(Some(&w)).unwrap();
        assert_eq!(written.len(), 3);
        for idx in 0..3 {
            assert_eq!(written[idx], persister.clip_path(idx));
            let (_, sr, ch) = crate::audio::read_wav(&written[idx]).unwrap();
            assert_eq!(sr, SAMPLE_RATE);
            assert_eq!(ch, 2);
        }
    }

    #[test]
    fn test_second_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let persister = AudioPersister::new(dir.path());
        let long = Waveform::from_interleaved(&stereo_ramp(100), 2, SAMPLE_RATE).unwrap();
        let short = Waveform::from_interleaved(&stereo_ramp(10), 2, SAMPLE_RATE).unwrap();
        persister.save(Some(&long)).unwrap();
        persister.save(Some(&short)).unwrap();
        let (samples, _, _) = crate::audio::read_wav(persister.clip_path(0)).unwrap();
        assert_eq!(samples.len(), 20);
    }
}
