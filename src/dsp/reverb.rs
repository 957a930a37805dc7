//! Convolution reverb — synthesized decaying-noise impulse response.
//!
//! The source never loaded a measured IR: it generated exponentially-shaped
//! white noise per invocation and ran it through a convolver node. This
//! module does the same with an FFT-accelerated convolution, numerically
//! equivalent to direct form.

use realfft::RealFftPlanner;

use super::buffer::SampleBuffer;

/// Deterministic linear congruential generator for the IR noise.
///
/// Keeps renders reproducible across platforms; each channel gets its own
/// stream so stereo impulses decorrelate.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }

    /// Next value in [0, 1).
    fn next_f32(&mut self) -> f32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.state >> 40) as f32 / (1u32 << 24) as f32
    }

    /// Next value in [-1, 1).
    fn next_bipolar(&mut self) -> f32 {
        2.0 * self.next_f32() - 1.0
    }
}

/// A convolution reverb with a synthetic impulse response.
#[derive(Debug, Clone, Copy)]
pub struct Reverb {
    /// Dry/wet mix (0.0 = fully dry, 1.0 = fully wet).
    pub amount: f64,
    /// Impulse response length in seconds.
    pub decay: f64,
    /// Steepness of the impulse decay envelope.
    pub damping: f64,
}

impl Reverb {
    pub fn new() -> Self {
        Reverb {
            amount: 0.3,
            decay: 2.0,
            damping: 0.5,
        }
    }

    /// Create a reverb with specific parameters.
    pub fn with_params(amount: f64, decay: f64, damping: f64) -> Self {
        Reverb {
            amount: amount.clamp(0.0, 1.0),
            decay: decay.clamp(0.0, 10.0),
            damping: damping.clamp(0.0, 1.0),
        }
    }

    /// Synthesize one channel of the impulse response:
    /// `noise(-1, 1) * (1 - t/decay)^(damping * 10)`.
    fn synthesize_ir_channel(&self, length: usize, sample_rate: f64, channel: usize) -> Vec<f32> {
        let mut rng = Lcg::new(1 + channel as u64 * 0x9E3779B97F4A7C15);
        let exponent = (self.damping * 10.0) as f32;
        (0..length)
            .map(|i| {
                let t = i as f64 / sample_rate;
                let envelope = (1.0 - t / self.decay) as f32;
                rng.next_bipolar() * envelope.powf(exponent)
            })
            .collect()
    }

    /// Convolve, truncate to the input length, and mix wet against dry.
    ///
    /// The reverb tail past the original length is dropped — the source
    /// never extended the buffer for it, and output length is part of the
    /// observable contract.
    pub fn process_buffer(&self, input: &SampleBuffer) -> SampleBuffer {
        let sample_rate = input.sample_rate() as f64;
        let frame_count = input.frame_count();
        let ir_length = (self.decay * sample_rate) as usize;

        let dry_gain = (1.0 - self.amount) as f32;
        let wet_gain = self.amount as f32;

        let channels = input
            .channels()
            .iter()
            .enumerate()
            .map(|(channel, dry)| {
                // An empty impulse (decay <= 0) leaves the wet path silent.
                let wet = if ir_length == 0 || frame_count == 0 {
                    vec![0.0; frame_count]
                } else {
                    let ir = self.synthesize_ir_channel(ir_length, sample_rate, channel);
                    fft_convolve(dry, &ir)
                };

                dry.iter()
                    .zip(&wet)
                    .map(|(&d, &w)| d * dry_gain + w * wet_gain)
                    .collect()
            })
            .collect();

        SampleBuffer::from_channels(channels, input.sample_rate())
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

/// FFT convolution of `signal` with `ir`, truncated to `signal.len()`.
fn fft_convolve(signal: &[f32], ir: &[f32]) -> Vec<f32> {
    let n = signal.len();
    let conv_len = n + ir.len() - 1;

    // Next power of 2
    let mut fft_size = 1;
    while fft_size < conv_len {
        fft_size *= 2;
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let fft_fwd = planner.plan_fft_forward(fft_size);
    let fft_inv = planner.plan_fft_inverse(fft_size);

    let mut sig_buf = vec![0.0f32; fft_size];
    sig_buf[..n].copy_from_slice(signal);

    let mut ir_buf = vec![0.0f32; fft_size];
    ir_buf[..ir.len()].copy_from_slice(ir);

    let mut sig_spec = fft_fwd.make_output_vec();
    let mut ir_spec = fft_fwd.make_output_vec();
    let mut scratch = fft_fwd.make_scratch_vec();
    fft_fwd
        .process_with_scratch(&mut sig_buf, &mut sig_spec, &mut scratch)
        .unwrap();
    fft_fwd
        .process_with_scratch(&mut ir_buf, &mut ir_spec, &mut scratch)
        .unwrap();

    for (s, &i) in sig_spec.iter_mut().zip(&ir_spec) {
        *s = *s * i;
    }

    let mut result = fft_inv.make_output_vec();
    let mut inv_scratch = fft_inv.make_scratch_vec();
    fft_inv
        .process_with_scratch(&mut sig_spec, &mut result, &mut inv_scratch)
        .unwrap();

    // realfft's inverse is unnormalized
    let norm = 1.0 / fft_size as f32;
    result.truncate(n);
    for s in result.iter_mut() {
        *s *= norm;
    }
    result
}
