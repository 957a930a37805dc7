//! Processing pipeline — fixed-order effect chain with progress reporting.
//!
//! Start → Normalize? → Compress? → EQ? → Reverb? → FadeIn? → FadeOut? → Done.
//! Each stage consumes its input and hands a fresh buffer to the next; a
//! disabled stage passes the buffer through untouched. Synchronous and
//! re-entrant — all state lives on the stack of one invocation.

use log::debug;

use crate::error::EngineError;
use crate::request::{ProcessingMetrics, ProcessingRequest, ProcessingResult, Stage};

use super::buffer::SampleBuffer;
use super::compressor::Compressor;
use super::envelope;
use super::eq::ThreeBandEq;
use super::normalizer;
use super::reverb::Reverb;

/// The effect chain for one request. Parameters are clamped to their
/// documented ranges at construction; a request is never rejected for
/// out-of-range knobs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    request: ProcessingRequest,
}

impl Pipeline {
    pub fn new(request: ProcessingRequest) -> Self {
        Pipeline {
            request: ProcessingRequest {
                toggles: request.toggles,
                parameters: request.parameters.clamped(),
            },
        }
    }

    /// The stages this request enables, in application order.
    pub fn enabled_stages(&self) -> Vec<Stage> {
        let t = &self.request.toggles;
        [
            (t.normalize, Stage::Normalize),
            (t.compression, Stage::Compress),
            (t.eq, Stage::Equalize),
            (t.reverb, Stage::Reverb),
            (t.fade_in, Stage::FadeIn),
            (t.fade_out, Stage::FadeOut),
        ]
        .into_iter()
        .filter_map(|(enabled, stage)| enabled.then_some(stage))
        .collect()
    }

    /// Run the chain without progress reporting.
    pub fn process(&self, input: &SampleBuffer) -> Result<ProcessingResult, EngineError> {
        self.process_with_progress(input, |_| {})
    }

    /// Run the chain, reporting cumulative fractional progress after each
    /// executed stage. The final reported value is exactly 1.0 on success.
    pub fn process_with_progress(
        &self,
        input: &SampleBuffer,
        mut progress: impl FnMut(f32),
    ) -> Result<ProcessingResult, EngineError> {
        input.validate()?;

        let peak_before = input.peak();
        let stages = self.enabled_stages();
        let total = stages.len();

        let mut buffer = input.clone();
        let mut applied_stages = Vec::with_capacity(total);
        for (index, &stage) in stages.iter().enumerate() {
            buffer = self.run_stage(stage, &buffer);
            applied_stages.push(stage);
            debug!("stage {} done ({}/{total})", stage.label(), index + 1);
            progress((index + 1) as f32 / total as f32);
        }
        if total == 0 {
            progress(1.0);
        }

        let peak_after = buffer.peak();
        Ok(ProcessingResult {
            buffer,
            metrics: ProcessingMetrics {
                peak_before,
                peak_after,
                applied_stages,
            },
        })
    }

    fn run_stage(&self, stage: Stage, input: &SampleBuffer) -> SampleBuffer {
        let p = &self.request.parameters;
        match stage {
            Stage::Normalize => normalizer::normalize(input),
            Stage::Compress => {
                Compressor::with_params(p.threshold, p.ratio, p.attack, p.release)
                    .process_buffer(input)
            }
            Stage::Equalize => {
                ThreeBandEq::new(p.eq_low, p.eq_mid, p.eq_high).process_buffer(input)
            }
            Stage::Reverb => {
                Reverb::with_params(p.reverb_amount, p.reverb_decay, p.reverb_damping)
                    .process_buffer(input)
            }
            Stage::FadeIn => envelope::fade_in(input, p.fade_in_duration),
            Stage::FadeOut => envelope::fade_out(input, p.fade_out_duration),
        }
    }
}
