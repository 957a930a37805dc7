//! Processing request/result types.
//!
//! A request is a closed set of effect toggles plus a flat set of numeric
//! knobs. The web front-end sends it as JSON; absent fields fall back to
//! the documented defaults, out-of-range values are clamped, never rejected.

use serde::{Deserialize, Serialize};

use crate::dsp::buffer::SampleBuffer;

// ── Stages ──────────────────────────────────────────────────

/// The effect stages, in the fixed order the pipeline applies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Normalize,
    Compress,
    Equalize,
    Reverb,
    FadeIn,
    FadeOut,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Compress => "compress",
            Stage::Equalize => "equalize",
            Stage::Reverb => "reverb",
            Stage::FadeIn => "fade-in",
            Stage::FadeOut => "fade-out",
        }
    }
}

// ── Toggles ─────────────────────────────────────────────────

/// Which effects to apply. Order here is irrelevant — the pipeline always
/// runs normalize → compression → eq → reverb → fade-in → fade-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectToggles {
    pub normalize: bool,
    pub compression: bool,
    pub reverb: bool,
    pub eq: bool,
    pub fade_in: bool,
    pub fade_out: bool,
}

// ── Parameters ──────────────────────────────────────────────

/// Flat numeric knobs. Knobs for disabled toggles are ignored, never
/// validated. See `clamped()` for the documented ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParameters {
    /// Compressor threshold in dB.
    pub threshold: f64,
    /// Compression ratio (4.0 = 4:1).
    pub ratio: f64,
    /// Compressor attack time in seconds.
    pub attack: f64,
    /// Compressor release time in seconds.
    pub release: f64,
    /// Low shelf gain in dB (320 Hz corner).
    pub eq_low: f64,
    /// Mid peaking gain in dB (1 kHz center, Q = 1).
    pub eq_mid: f64,
    /// High shelf gain in dB (3.2 kHz corner).
    pub eq_high: f64,
    /// Reverb wet/dry mix (0 = dry, 1 = wet).
    pub reverb_amount: f64,
    /// Impulse response length in seconds.
    pub reverb_decay: f64,
    /// Steepness of the impulse decay envelope.
    pub reverb_damping: f64,
    /// Fade-in length in seconds.
    pub fade_in_duration: f64,
    /// Fade-out length in seconds.
    pub fade_out_duration: f64,
}

impl Default for EffectParameters {
    fn default() -> Self {
        EffectParameters {
            threshold: -24.0,
            ratio: 4.0,
            attack: 0.003,
            release: 0.25,
            eq_low: 0.0,
            eq_mid: 0.0,
            eq_high: 0.0,
            reverb_amount: 0.3,
            reverb_decay: 2.0,
            reverb_damping: 0.5,
            fade_in_duration: 1.0,
            fade_out_duration: 1.0,
        }
    }
}

impl EffectParameters {
    /// Clamp every knob to its documented range.
    pub fn clamped(&self) -> Self {
        let clamped = EffectParameters {
            threshold: self.threshold.clamp(-60.0, 0.0),
            ratio: self.ratio.clamp(1.0, 20.0),
            attack: self.attack.clamp(0.0001, 1.0),
            release: self.release.clamp(0.001, 5.0),
            eq_low: self.eq_low.clamp(-12.0, 12.0),
            eq_mid: self.eq_mid.clamp(-12.0, 12.0),
            eq_high: self.eq_high.clamp(-12.0, 12.0),
            reverb_amount: self.reverb_amount.clamp(0.0, 1.0),
            reverb_decay: self.reverb_decay.clamp(0.0, 10.0),
            reverb_damping: self.reverb_damping.clamp(0.0, 1.0),
            fade_in_duration: self.fade_in_duration.clamp(0.0, 30.0),
            fade_out_duration: self.fade_out_duration.clamp(0.0, 30.0),
        };
        if clamped != *self {
            log::warn!("effect parameters out of range, clamped: {self:?} -> {clamped:?}");
        }
        clamped
    }
}

// ── Request / Result ────────────────────────────────────────

/// A complete processing request. Immutable once constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingRequest {
    pub toggles: EffectToggles,
    pub parameters: EffectParameters,
}

/// Flat metrics report produced alongside the processed signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    /// Peak absolute sample value before any stage ran.
    pub peak_before: f32,
    /// Peak absolute sample value of the final output.
    pub peak_after: f32,
    /// The stages that actually executed, in application order.
    pub applied_stages: Vec<Stage>,
}

/// The pipeline's terminal state: the processed signal plus its metrics.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub buffer: SampleBuffer,
    pub metrics: ProcessingMetrics,
}
