//! Fade envelopes — linear fade-in/fade-out gain curves.

use super::buffer::SampleBuffer;

/// Number of frames a fade of `duration_seconds` covers, capped at the
/// buffer length.
fn fade_frames(input: &SampleBuffer, duration_seconds: f64) -> usize {
    if duration_seconds <= 0.0 {
        return 0;
    }
    let n = (duration_seconds * input.sample_rate() as f64) as usize;
    n.min(input.frame_count())
}

/// Ramp the first `duration_seconds` of the signal from 0 to full level.
/// Sample `i` of the fade window is scaled by `i / n`.
pub fn fade_in(input: &SampleBuffer, duration_seconds: f64) -> SampleBuffer {
    let mut output = input.clone();
    let n = fade_frames(input, duration_seconds);
    if n == 0 {
        return output;
    }

    for channel in output.channels_mut() {
        for (i, sample) in channel[..n].iter_mut().enumerate() {
            *sample *= i as f32 / n as f32;
        }
    }
    output
}

/// Ramp the last `duration_seconds` of the signal down to 0. Sample `i`
/// within the fade window is scaled by `1 - i / n`.
pub fn fade_out(input: &SampleBuffer, duration_seconds: f64) -> SampleBuffer {
    let mut output = input.clone();
    let n = fade_frames(input, duration_seconds);
    if n == 0 {
        return output;
    }

    let start = output.frame_count() - n;
    for channel in output.channels_mut() {
        for (i, sample) in channel[start..].iter_mut().enumerate() {
            *sample *= 1.0 - i as f32 / n as f32;
        }
    }
    output
}
