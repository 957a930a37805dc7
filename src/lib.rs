pub mod dsp;
pub mod error;
pub mod request;

#[cfg(feature = "decode")]
pub mod decode;

pub use dsp::buffer::SampleBuffer;
pub use dsp::pipeline::Pipeline;
pub use error::EngineError;
pub use request::{
    EffectParameters, EffectToggles, ProcessingMetrics, ProcessingRequest, ProcessingResult,
    Stage,
};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the mixdown-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Run the effects pipeline over a decoded buffer.
pub fn process(
    input: &SampleBuffer,
    request: &ProcessingRequest,
) -> Result<ProcessingResult, EngineError> {
    Pipeline::new(*request).process(input)
}

/// Run the effects pipeline, reporting fractional progress after each stage.
pub fn process_with_progress(
    input: &SampleBuffer,
    request: &ProcessingRequest,
    progress: impl FnMut(f32),
) -> Result<ProcessingResult, EngineError> {
    Pipeline::new(*request).process_with_progress(input, progress)
}

/// WASM-exposed: apply a processing request to a canonical PCM WAV and
/// return the processed WAV bytes.
#[wasm_bindgen]
pub fn process_wav(input: &[u8], request: JsValue) -> Result<Vec<u8>, JsValue> {
    let request: ProcessingRequest =
        serde_wasm_bindgen::from_value(request).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let buffer = dsp::codec::decode(input).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let result = process(&buffer, &request).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(dsp::codec::encode(&result.buffer))
}

/// WASM-exposed: like `process_wav`, but returns the metrics record
/// (peaks and applied stages) instead of the audio.
#[wasm_bindgen]
pub fn process_wav_metrics(input: &[u8], request: JsValue) -> Result<JsValue, JsValue> {
    let request: ProcessingRequest =
        serde_wasm_bindgen::from_value(request).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let buffer = dsp::codec::decode(input).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let result = process(&buffer, &request).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    serde_wasm_bindgen::to_value(&result.metrics).map_err(|e| JsValue::from_str(&format!("{e}")))
}
