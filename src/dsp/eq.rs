//! Three-band equalizer — low shelf, mid peak, high shelf in cascade.

use super::buffer::SampleBuffer;
use super::filter::{BiquadFilter, FilterType};

/// Fixed band placement, matching the source's graph nodes.
const LOW_SHELF_HZ: f64 = 320.0;
const MID_PEAK_HZ: f64 = 1000.0;
const HIGH_SHELF_HZ: f64 = 3200.0;
const MID_PEAK_Q: f64 = 1.0;

/// A cascade of three biquad stages, each configurable by gain only.
///
/// All three stages run even at 0 dB so the output is deterministic for a
/// given input regardless of which bands are "active".
#[derive(Debug, Clone, Copy)]
pub struct ThreeBandEq {
    /// Low shelf gain in dB.
    pub low_gain_db: f64,
    /// Mid peaking gain in dB.
    pub mid_gain_db: f64,
    /// High shelf gain in dB.
    pub high_gain_db: f64,
}

impl ThreeBandEq {
    pub fn new(low_gain_db: f64, mid_gain_db: f64, high_gain_db: f64) -> Self {
        ThreeBandEq {
            low_gain_db,
            mid_gain_db,
            high_gain_db,
        }
    }

    /// Run the full cascade over every channel independently. Filter state
    /// is fresh per channel; coefficients are computed once per invocation.
    pub fn process_buffer(&self, input: &SampleBuffer) -> SampleBuffer {
        let sample_rate = input.sample_rate() as f64;
        let channels = input
            .channels()
            .iter()
            .map(|channel| {
                let mut low = BiquadFilter::with_params(
                    FilterType::LowShelf,
                    sample_rate,
                    LOW_SHELF_HZ,
                    1.0,
                    self.low_gain_db,
                );
                let mut mid = BiquadFilter::with_params(
                    FilterType::Peaking,
                    sample_rate,
                    MID_PEAK_HZ,
                    MID_PEAK_Q,
                    self.mid_gain_db,
                );
                let mut high = BiquadFilter::with_params(
                    FilterType::HighShelf,
                    sample_rate,
                    HIGH_SHELF_HZ,
                    1.0,
                    self.high_gain_db,
                );

                channel
                    .iter()
                    .map(|&s| {
                        let y = high.process(mid.process(low.process(s as f64)));
                        y as f32
                    })
                    .collect()
            })
            .collect();

        SampleBuffer::from_channels(channels, input.sample_rate())
    }
}
