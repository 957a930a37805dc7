//! SampleBuffer — per-channel f32 sample storage.
//!
//! The unit every stage operates on. Channels are stored as separate
//! sequences (never interleaved); interleaving only happens at the codec
//! boundary. Stages are non-destructive: each allocates a fresh output
//! buffer, so `before`/`after` comparisons stay possible.

use crate::error::EngineError;

/// A decoded audio signal: 1–2 channels of equal-length f32 samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a buffer with `channel_count` zero-filled channels of
    /// `frame_count` samples each.
    pub fn new(channel_count: usize, frame_count: usize, sample_rate: u32) -> Self {
        SampleBuffer {
            channels: vec![vec![0.0; frame_count]; channel_count],
            sample_rate,
        }
    }

    /// Build a buffer from existing channel data.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        SampleBuffer { channels, sample_rate }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Checked access to one channel's samples.
    pub fn channel(&self, index: usize) -> Result<&[f32], EngineError> {
        self.channels
            .get(index)
            .map(Vec::as_slice)
            .ok_or(EngineError::InvalidChannelIndex {
                index,
                channel_count: self.channels.len(),
            })
    }

    /// Checked mutable access to one channel's samples.
    pub fn channel_mut(&mut self, index: usize) -> Result<&mut [f32], EngineError> {
        let channel_count = self.channels.len();
        self.channels
            .get_mut(index)
            .map(Vec::as_mut_slice)
            .ok_or(EngineError::InvalidChannelIndex { index, channel_count })
    }

    /// All channels, for stages that iterate the whole signal.
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Largest absolute sample value across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flatten()
            .fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }

    /// Check the structural invariants: at least one channel (at most two),
    /// equal channel lengths, positive sample rate.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.channels.is_empty() {
            return Err(EngineError::InvalidInput {
                reason: "buffer has no channels".to_string(),
            });
        }
        if self.channels.len() > 2 {
            return Err(EngineError::InvalidInput {
                reason: format!("{} channels (only mono/stereo supported)", self.channels.len()),
            });
        }
        let frame_count = self.channels[0].len();
        if self.channels.iter().any(|c| c.len() != frame_count) {
            return Err(EngineError::InvalidInput {
                reason: "channel lengths differ".to_string(),
            });
        }
        if self.sample_rate == 0 {
            return Err(EngineError::InvalidInput {
                reason: "sample rate must be positive".to_string(),
            });
        }
        Ok(())
    }
}
