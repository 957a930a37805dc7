//! Peak normalizer — rescales a signal so its peak sits at the ceiling.

use super::buffer::SampleBuffer;

/// Target peak after normalization, just under full scale.
pub const TARGET_CEILING: f32 = 0.99;

/// Scan every sample for the maximum absolute value and rescale the whole
/// signal so that peak lands on [`TARGET_CEILING`]. Silence comes back as an
/// unchanged copy. Idempotent up to floating-point rounding.
pub fn normalize(input: &SampleBuffer) -> SampleBuffer {
    let max_abs = input.peak();
    let gain = if max_abs > 0.0 {
        TARGET_CEILING / max_abs
    } else {
        1.0
    };

    let channels = input
        .channels()
        .iter()
        .map(|channel| channel.iter().map(|&s| s * gain).collect())
        .collect();
    SampleBuffer::from_channels(channels, input.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_buffer(amplitude: f32) -> SampleBuffer {
        let samples: Vec<f32> = (0..4410)
            .map(|i| {
                let t = i as f32 / 44100.0;
                amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();
        SampleBuffer::from_channels(vec![samples], 44100)
    }

    #[test]
    fn peak_reaches_ceiling() {
        let out = normalize(&sine_buffer(0.5));
        assert!(
            (out.peak() - TARGET_CEILING).abs() < 1e-4,
            "Normalized peak should be ~{TARGET_CEILING}, got {}",
            out.peak()
        );
    }

    #[test]
    fn loud_signal_scaled_down() {
        let mut buf = SampleBuffer::new(1, 8, 44100);
        buf.channel_mut(0).unwrap()[3] = 2.0;
        let out = normalize(&buf);
        assert!((out.peak() - TARGET_CEILING).abs() < 1e-6);
    }

    #[test]
    fn idempotent() {
        let once = normalize(&sine_buffer(0.25));
        let twice = normalize(&once);
        assert!(
            (once.peak() - twice.peak()).abs() < 1e-6,
            "Normalizing twice should not move the peak: {} vs {}",
            once.peak(),
            twice.peak()
        );
    }

    #[test]
    fn silence_is_noop() {
        let buf = SampleBuffer::new(2, 256, 44100);
        let out = normalize(&buf);
        assert_eq!(out, buf, "All-zero input should come back unchanged");
    }

    #[test]
    fn stereo_channels_share_one_gain() {
        let mut buf = SampleBuffer::new(2, 4, 44100);
        buf.channel_mut(0).unwrap()[0] = 0.5;
        buf.channel_mut(1).unwrap()[0] = 0.25;
        let out = normalize(&buf);
        // Peak channel hits the ceiling, the quieter one keeps its ratio
        assert!((out.channel(0).unwrap()[0] - TARGET_CEILING).abs() < 1e-6);
        assert!((out.channel(1).unwrap()[0] - TARGET_CEILING / 2.0).abs() < 1e-6);
    }

    #[test]
    fn input_unchanged() {
        let buf = sine_buffer(0.5);
        let before = buf.clone();
        let _ = normalize(&buf);
        assert_eq!(buf, before, "Stages must not mutate their input");
    }
}
