//! PCM codec — canonical 16-bit RIFF/WAVE container.
//!
//! The one bit-exact format contract this engine owns: a 44-byte header
//! (RIFF/WAVE, 16-byte fmt chunk, data chunk), little-endian fields,
//! interleaved 16-bit signed samples.

use crate::error::EngineError;

use super::buffer::SampleBuffer;

const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;

/// Encode a buffer to a canonical WAV byte stream.
///
/// Samples are converted via `round(clamp(x, -1, 1) * 32767)`.
pub fn encode(buffer: &SampleBuffer) -> Vec<u8> {
    let channels = buffer.channel_count() as u16;
    let sample_rate = buffer.sample_rate();
    let byte_rate = sample_rate * channels as u32 * (BITS_PER_SAMPLE as u32 / 8);
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let data_size = (buffer.frame_count() * channels as usize * 2) as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk, interleaved by channel
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for n in 0..buffer.frame_count() {
        for channel in buffer.channels() {
            let sample = (channel[n].clamp(-1.0, 1.0) * 32767.0).round() as i16;
            buf.extend_from_slice(&sample.to_le_bytes());
        }
    }

    buf
}

/// Decode a canonical WAV byte stream back into a buffer.
///
/// Every marker and format field is checked; declared sizes must fit the
/// input. Only 16-bit PCM with 1–2 channels is accepted.
pub fn decode(bytes: &[u8]) -> Result<SampleBuffer, EngineError> {
    fn malformed(reason: &'static str) -> EngineError {
        EngineError::MalformedContainer { reason }
    }

    if bytes.len() < HEADER_LEN {
        return Err(malformed("shorter than the 44-byte header"));
    }
    if &bytes[0..4] != b"RIFF" {
        return Err(malformed("missing RIFF marker"));
    }
    if &bytes[8..12] != b"WAVE" {
        return Err(malformed("missing WAVE marker"));
    }
    if &bytes[12..16] != b"fmt " {
        return Err(malformed("missing fmt chunk"));
    }
    if read_u32(bytes, 16) != 16 {
        return Err(malformed("unexpected fmt chunk size"));
    }
    if read_u16(bytes, 20) != 1 {
        return Err(malformed("not linear PCM"));
    }

    let channels = read_u16(bytes, 22) as usize;
    if channels == 0 || channels > 2 {
        return Err(malformed("only mono and stereo are supported"));
    }
    let sample_rate = read_u32(bytes, 24);
    if sample_rate == 0 {
        return Err(malformed("zero sample rate"));
    }
    if read_u16(bytes, 34) != BITS_PER_SAMPLE {
        return Err(malformed("not 16-bit samples"));
    }
    if &bytes[36..40] != b"data" {
        return Err(malformed("missing data chunk"));
    }

    let data_size = read_u32(bytes, 40) as usize;
    if data_size > bytes.len() - HEADER_LEN {
        return Err(malformed("data size overruns the buffer"));
    }
    let block_align = channels * 2;
    if data_size % block_align != 0 {
        return Err(malformed("data size is not frame-aligned"));
    }

    let frame_count = data_size / block_align;
    let mut buffer = SampleBuffer::new(channels, frame_count, sample_rate);
    for n in 0..frame_count {
        for c in 0..channels {
            let offset = HEADER_LEN + (n * channels + c) * 2;
            let sample = i16::from_le_bytes([bytes[offset], bytes[offset + 1]]);
            buffer.channel_mut(c)?[n] = sample as f32 / 32767.0;
        }
    }
    Ok(buffer)
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_buffer(channels: usize) -> SampleBuffer {
        let data: Vec<f32> = (0..4410)
            .map(|i| {
                let t = i as f32 / 44100.0;
                0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();
        SampleBuffer::from_channels(vec![data; channels], 44100)
    }

    #[test]
    fn wav_header_valid() {
        let wav = encode(&sine_buffer(2));

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        assert_eq!(read_u16(&wav, 20), 1, "PCM format tag");
        assert_eq!(read_u16(&wav, 22), 2, "channel count");
        assert_eq!(read_u32(&wav, 24), 44100, "sample rate");
        assert_eq!(read_u32(&wav, 28), 44100 * 4, "byte rate");
        assert_eq!(read_u16(&wav, 32), 4, "block align");
        assert_eq!(read_u16(&wav, 34), 16, "bits per sample");
    }

    #[test]
    fn wav_size_correct() {
        let wav = encode(&sine_buffer(1));
        // 4410 frames * 1 channel * 2 bytes
        assert_eq!(read_u32(&wav, 40), 8820);
        assert_eq!(wav.len(), 44 + 8820);
        assert_eq!(read_u32(&wav, 4), 36 + 8820);
    }

    #[test]
    fn round_trip_within_quantization() {
        let original = sine_buffer(2);
        let decoded = decode(&encode(&original)).expect("decode failed");

        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), original.frame_count());
        assert_eq!(decoded.sample_rate(), 44100);
        for c in 0..2 {
            for (n, (&a, &b)) in original.channel(c).unwrap().iter()
                .zip(decoded.channel(c).unwrap())
                .enumerate()
            {
                assert!(
                    (a - b).abs() <= 1.0 / 32767.0,
                    "Sample {n} of channel {c} off by more than one LSB: {a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn out_of_range_samples_clamp() {
        let buf = SampleBuffer::from_channels(vec![vec![2.0, -2.0]], 44100);
        let decoded = decode(&encode(&buf)).unwrap();
        assert!((decoded.channel(0).unwrap()[0] - 1.0).abs() < 1e-4);
        assert!((decoded.channel(0).unwrap()[1] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn interleaving_order() {
        let buf = SampleBuffer::from_channels(
            vec![vec![1.0, 0.0], vec![-1.0, 0.0]],
            44100,
        );
        let wav = encode(&buf);
        // Frame 0: left then right
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), 32767);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -32767);
    }

    #[test]
    fn empty_buffer_round_trips() {
        let wav = encode(&SampleBuffer::new(1, 0, 22050));
        assert_eq!(wav.len(), 44);
        let decoded = decode(&wav).unwrap();
        assert_eq!(decoded.frame_count(), 0);
        assert_eq!(decoded.sample_rate(), 22050);
    }

    #[test]
    fn rejects_short_input() {
        assert!(decode(&[0u8; 10]).is_err());
    }

    #[test]
    fn rejects_bad_markers() {
        let mut wav = encode(&sine_buffer(1));
        wav[0] = b'X';
        assert!(matches!(
            decode(&wav),
            Err(EngineError::MalformedContainer { .. })
        ));

        let mut wav = encode(&sine_buffer(1));
        wav[36..40].copy_from_slice(b"DATA");
        assert!(decode(&wav).is_err());
    }

    #[test]
    fn rejects_overrunning_data_size() {
        let mut wav = encode(&sine_buffer(1));
        let lied = (read_u32(&wav, 40) + 1000).to_le_bytes();
        wav[40..44].copy_from_slice(&lied);
        assert!(matches!(
            decode(&wav),
            Err(EngineError::MalformedContainer { reason }) if reason.contains("overruns")
        ));
    }

    #[test]
    fn rejects_unsupported_format_fields() {
        // 8-bit
        let mut wav = encode(&sine_buffer(1));
        wav[34..36].copy_from_slice(&8u16.to_le_bytes());
        assert!(decode(&wav).is_err());

        // three channels
        let mut wav = encode(&sine_buffer(1));
        wav[22..24].copy_from_slice(&3u16.to_le_bytes());
        assert!(decode(&wav).is_err());
    }
}
