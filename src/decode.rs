//! Source decoding front-end — turns WAV/MP3 byte streams into SampleBuffers.
//!
//! This sits in front of the engine for hosts that hold arbitrary audio
//! files rather than the canonical PCM container. Format sniffing is by
//! magic bytes, not file extension.

use std::io::Cursor;

use log::debug;

use crate::dsp::buffer::SampleBuffer;
use crate::error::EngineError;

/// Decode a byte stream believed to be a supported container.
pub fn decode_source(bytes: &[u8]) -> Result<SampleBuffer, EngineError> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
        decode_wav(bytes)
    } else if looks_like_mp3(bytes) {
        decode_mp3(bytes)
    } else {
        Err(EngineError::UnsupportedFormat)
    }
}

fn looks_like_mp3(bytes: &[u8]) -> bool {
    // ID3 tag or a bare MPEG frame sync
    bytes.len() >= 3 && (&bytes[0..3] == b"ID3" || (bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0))
}

fn deinterleave(samples: &[f32], channels: usize, sample_rate: u32) -> SampleBuffer {
    let frame_count = samples.len() / channels;
    let mut data: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(frame_count))
        .collect();
    for frame in samples.chunks_exact(channels) {
        for (channel, &sample) in data.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }
    SampleBuffer::from_channels(data, sample_rate)
}

fn decode_wav(bytes: &[u8]) -> Result<SampleBuffer, EngineError> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
        EngineError::CorruptSource {
            reason: e.to_string(),
        }
    })?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.channels > 2 {
        return Err(EngineError::UnsupportedFormat);
    }
    debug!(
        "decoding WAV: {} ch, {} Hz, {}-bit {:?}",
        spec.channels, spec.sample_rate, spec.bits_per_sample, spec.sample_format
    );

    let corrupt = |e: hound::Error| EngineError::CorruptSource {
        reason: e.to_string(),
    };
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(corrupt)?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(corrupt)?
        }
    };

    Ok(deinterleave(&interleaved, spec.channels as usize, spec.sample_rate))
}

fn decode_mp3(bytes: &[u8]) -> Result<SampleBuffer, EngineError> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut interleaved: Vec<f32> = Vec::new();
    let mut channels = 0usize;
    let mut sample_rate = 0u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if channels == 0 {
                    channels = frame.channels;
                    sample_rate = frame.sample_rate as u32;
                }
                if frame.channels != channels {
                    return Err(EngineError::CorruptSource {
                        reason: "channel count changes mid-stream".to_string(),
                    });
                }
                interleaved.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => {
                return Err(EngineError::CorruptSource {
                    reason: e.to_string(),
                });
            }
        }
    }

    if channels == 0 {
        return Err(EngineError::CorruptSource {
            reason: "no audio frames".to_string(),
        });
    }
    if channels > 2 {
        return Err(EngineError::UnsupportedFormat);
    }
    debug!("decoded MP3: {channels} ch, {sample_rate} Hz, {} frames", interleaved.len() / channels);
    Ok(deinterleave(&interleaved, channels, sample_rate))
}
