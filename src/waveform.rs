//! Generated audio as a tensor, and its shape normalization.
//!
//! Models return either one clip (`[channels, samples]`) or a batch
//! (`[clips, channels, samples]`). [`Waveform::normalized`] always yields the
//! batched form, so persistence only ever iterates a rank-3 tensor.

use candle_core::{DType, Device, Tensor};

use crate::{Error, Result};

/// Tagged shape of a [`Waveform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveformShape {
    /// `[channels, samples]`
    Single { channels: usize, samples: usize },
    /// `[clips, channels, samples]`
    Batch {
        clips: usize,
        channels: usize,
        samples: usize,
    },
}

impl WaveformShape {
    fn of(tensor: &Tensor) -> Result<Self> {
        match *tensor.dims() {
            [channels, samples] => Ok(Self::Single { channels, samples }),
            [clips, channels, samples] => Ok(Self::Batch {
                clips,
                channels,
                samples,
            }),
            ref dims => Err(Error::Shape(format!(
                "expected [channels, samples] or [clips, channels, samples], got {dims:?}"
            ))),
        }
    }

    pub fn clips(&self) -> usize {
        match *self {
            Self::Single { .. } => 1,
            Self::Batch { clips, .. } => clips,
        }
    }

    pub fn channels(&self) -> usize {
        match *self {
            Self::Single { channels, .. } | Self::Batch { channels, .. } => channels,
        }
    }

    pub fn samples(&self) -> usize {
        match *self {
            Self::Single { samples, .. } | Self::Batch { samples, .. } => samples,
        }
    }
}

/// One clip pulled out of a waveform, ready for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Interleaved f32 samples: `[c0, c1, .., c0, c1, ..]`.
    pub samples: Vec<f32>,
    pub channels: u16,
}

/// Audio produced by a model at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    tensor: Tensor,
    shape: WaveformShape,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap a rank-2 or rank-3 tensor. Any other rank is rejected.
    pub fn new(tensor: Tensor, sample_rate: u32) -> Result<Self> {
        let shape = WaveformShape::of(&tensor)?;
        if shape.channels() == 0 || shape.channels() > u16::MAX as usize {
            return Err(Error::Shape(format!(
                "unsupported channel count {}",
                shape.channels()
            )));
        }
        Ok(Self {
            tensor,
            shape,
            sample_rate,
        })
    }

    /// Build a single-clip waveform from interleaved PCM.
    pub fn from_interleaved(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Self> {
        let ch = channels as usize;
        if ch == 0 || samples.len() % ch != 0 {
            return Err(Error::Shape(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        let frames = samples.len() / ch;
        let mut planar = Vec::with_capacity(samples.len());
        for c in 0..ch {
            planar.extend(samples.iter().skip(c).step_by(ch).copied());
        }
        let tensor = Tensor::from_vec(planar, (ch, frames), &Device::Cpu)?;
        Self::new(tensor, sample_rate)
    }

    pub fn shape(&self) -> WaveformShape {
        self.shape
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of each clip in seconds.
    pub fn duration_s(&self) -> f64 {
        self.shape.samples() as f64 / self.sample_rate as f64
    }

    /// Host-memory f32 copy of the samples, always `[clips, channels, samples]`.
    pub fn normalized(&self) -> Result<Tensor> {
        let host = self
            .tensor
            .to_device(&Device::Cpu)?
            .to_dtype(DType::F32)?;
        match self.shape {
            WaveformShape::Single { .. } => Ok(host.unsqueeze(0)?),
            WaveformShape::Batch { .. } => Ok(host),
        }
    }

    /// Every clip of the batch, interleaved, in batch order.
    pub fn clips(&self) -> Result<Vec<Clip>> {
        let batch = self.normalized()?;
        let channels = self.shape.channels();
        let mut clips = Vec::with_capacity(self.shape.clips());
        for idx in 0..self.shape.clips() {
            let clip = batch.get(idx)?;
            let planar = (0..channels)
                .map(|ch| clip.get(ch)?.contiguous()?.to_vec1::<f32>())
                .collect::<std::result::Result<Vec<_>, _>>()?;
            clips.push(Clip {
                samples: interleave(&planar),
                channels: channels as u16,
            });
        }
        Ok(clips)
    }
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map(Vec::len).unwrap_or(0);
    let mut out = Vec::with_capacity(frames * planar.len());
    for i in 0..frames {
        for channel in planar {
            out.push(channel[i]);
        }
    }
    out
}
