//! Compressor effect — dynamics processing for audio leveling.
//!
//! Feed-forward compressor with threshold, ratio, knee, attack, and release,
//! matching the WebAudio DynamicsCompressorNode behaviour the source relied
//! on: soft-knee gain computation with a fast-clamp/slow-release smoothed
//! control signal shared across channels.

use super::buffer::SampleBuffer;

/// Knee width in dB. The source never exposed this knob; the node's default
/// is baked in.
const KNEE_DB: f64 = 30.0;

/// Epsilon floor for level detection so silence never produces -inf.
const LEVEL_EPSILON: f64 = 1e-10;

/// A feed-forward dynamics compressor.
#[derive(Debug, Clone)]
pub struct Compressor {
    /// Threshold in dB (typical: -60 to 0).
    pub threshold: f64,
    /// Compression ratio (e.g., 4.0 = 4:1 compression).
    pub ratio: f64,
    /// Knee width in dB (0 = hard knee, higher = softer transition).
    pub knee: f64,
    /// Attack time in seconds.
    pub attack: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Compressor {
    /// Create a compressor with default settings.
    pub fn new() -> Self {
        Compressor {
            threshold: -24.0,
            ratio: 4.0,
            knee: KNEE_DB,
            attack: 0.003, // 3ms
            release: 0.25, // 250ms
        }
    }

    /// Create a compressor with specific parameters.
    pub fn with_params(threshold: f64, ratio: f64, attack: f64, release: f64) -> Self {
        let mut c = Self::new();
        c.threshold = threshold.clamp(-60.0, 0.0);
        c.ratio = ratio.clamp(1.0, 20.0);
        c.attack = attack.clamp(0.0001, 1.0);
        c.release = release.clamp(0.001, 5.0);
        c
    }

    /// Compute the gain-reduction target in dB (>= 0) for an input level.
    #[inline]
    fn reduction_for(&self, level_db: f64) -> f64 {
        let half_knee = self.knee / 2.0;
        let knee_start = self.threshold - half_knee;
        let knee_end = self.threshold + half_knee;
        let slope = 1.0 - 1.0 / self.ratio;

        if level_db <= knee_start {
            0.0
        } else if level_db >= knee_end {
            (level_db - self.threshold) * slope
        } else {
            // Quadratic interpolation through the knee; continuous with the
            // full-compression line at knee_end.
            let x = level_db - knee_start;
            x * x / (2.0 * self.knee) * slope
        }
    }

    /// Compress a whole buffer into a fresh output.
    ///
    /// The control signal (peak across channels, smoothed reduction) is
    /// shared, so stereo images don't wander; state starts at 0 dB reduction
    /// on every invocation.
    pub fn process_buffer(&self, input: &SampleBuffer) -> SampleBuffer {
        let sample_rate = input.sample_rate() as f64;
        let frame_count = input.frame_count();

        let attack_coef = (-1.0 / (self.attack * sample_rate)).exp();
        let release_coef = (-1.0 / (self.release * sample_rate)).exp();

        let mut output = SampleBuffer::new(
            input.channel_count(),
            frame_count,
            input.sample_rate(),
        );
        let mut reduction_db = 0.0_f64;

        for n in 0..frame_count {
            let level = input
                .channels()
                .iter()
                .fold(0.0f64, |acc, ch| acc.max(ch[n].abs() as f64));
            let level_db = 20.0 * (level + LEVEL_EPSILON).log10();
            let target = self.reduction_for(level_db);

            // Fast clamp toward more reduction, slow recovery toward less.
            let coef = if target > reduction_db {
                attack_coef
            } else {
                release_coef
            };
            reduction_db = coef * reduction_db + (1.0 - coef) * target;

            let gain = 10.0_f64.powf(-reduction_db / 20.0) as f32;
            for (ch_in, ch_out) in input.channels().iter().zip(output.channels_mut()) {
                ch_out[n] = ch_in[n] * gain;
            }
        }

        output
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_buffer(value: f32, frames: usize) -> SampleBuffer {
        SampleBuffer::from_channels(vec![vec![value; frames]], 44100)
    }

    #[test]
    fn quiet_signal_passes_through() {
        let comp = Compressor::with_params(-24.0, 4.0, 0.003, 0.25);
        // -40 dB sits below the knee start (-39 dB) — zero reduction
        let out = comp.process_buffer(&constant_buffer(0.01, 1000));
        for (i, &s) in out.channel(0).unwrap().iter().enumerate() {
            assert!(
                (s - 0.01).abs() < 1e-7,
                "Below-knee signal should pass unchanged, sample {i}: {s}"
            );
        }
    }

    #[test]
    fn loud_signal_reduced() {
        let comp = Compressor::with_params(-24.0, 4.0, 0.003, 0.25);
        // 0 dB input, 24 dB over threshold at 4:1 → 18 dB reduction once settled
        let out = comp.process_buffer(&constant_buffer(1.0, 44100));
        let settled = out.channel(0).unwrap()[44099];
        assert!(
            settled > 0.1 && settled < 0.16,
            "0 dB input should settle near -18 dB (~0.126), got {settled}"
        );
    }

    #[test]
    fn attack_is_gradual() {
        let comp = Compressor::with_params(-24.0, 4.0, 0.003, 0.25);
        let out = comp.process_buffer(&constant_buffer(1.0, 4410));
        let first = out.channel(0).unwrap()[0];
        let later = out.channel(0).unwrap()[4409];
        assert!(
            first > later,
            "Reduction should ramp in over the attack: first={first}, later={later}"
        );
        assert!(
            first > 0.9,
            "First sample should be barely reduced, got {first}"
        );
    }

    #[test]
    fn release_recovers_gain() {
        let comp = Compressor::with_params(-24.0, 4.0, 0.003, 0.05);
        // Loud burst followed by a quiet stretch
        let mut data = vec![1.0f32; 4410];
        data.extend(vec![0.01f32; 44100]);
        let buf = SampleBuffer::from_channels(vec![data], 44100);
        let out = comp.process_buffer(&buf);
        let just_after = out.channel(0).unwrap()[4420];
        let much_later = out.channel(0).unwrap()[44100];
        assert!(
            much_later > just_after,
            "Gain should recover during release: {just_after} -> {much_later}"
        );
        assert!(
            (much_later - 0.01).abs() < 1e-4,
            "After release the quiet signal should be back to unity, got {much_later}"
        );
    }

    #[test]
    fn silence_stays_finite() {
        let comp = Compressor::new();
        let out = comp.process_buffer(&constant_buffer(0.0, 1000));
        for &s in out.channel(0).unwrap() {
            assert!(s.is_finite());
            assert_eq!(s, 0.0);
        }
    }

    #[test]
    fn stereo_control_is_linked() {
        let comp = Compressor::with_params(-24.0, 4.0, 0.003, 0.25);
        // Right channel at half the level of the left; the shared control
        // signal must apply the same gain to both.
        let left: Vec<f32> = vec![0.8; 8820];
        let right: Vec<f32> = vec![0.4; 8820];
        let buf = SampleBuffer::from_channels(vec![left, right], 44100);
        let out = comp.process_buffer(&buf);
        for n in 0..8820 {
            let l = out.channel(0).unwrap()[n];
            let r = out.channel(1).unwrap()[n];
            assert!(
                (r * 2.0 - l).abs() < 1e-5,
                "Channel balance must be preserved at sample {n}: l={l}, r={r}"
            );
        }
    }

    #[test]
    fn knee_is_continuous_at_edges() {
        let comp = Compressor::new();
        // At the knee end the quadratic and linear regimes must agree
        let knee_end = comp.threshold + comp.knee / 2.0;
        let below = comp.reduction_for(knee_end - 1e-9);
        let above = comp.reduction_for(knee_end + 1e-9);
        assert!(
            (below - above).abs() < 1e-6,
            "Knee curve discontinuous: {below} vs {above}"
        );
        assert!((comp.reduction_for(comp.threshold - comp.knee / 2.0)).abs() < 1e-12);
    }
}
