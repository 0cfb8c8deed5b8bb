// Best-effort playback of synthesized replies.
//
// Everything in here is allowed to fail quietly: a missing output device,
// an undecodable payload, or a stream error must never reach the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, anyhow};
use base64::Engine as _;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::resample::resample_mono;

/// Play a synthesized reply payload (raw base64 or a `data:` URL wrapping a
/// WAV clip). Blocks until the clip drains; callers that care run it on a
/// throwaway thread. Never returns an error.
pub fn play_reply_audio(payload: &str) {
    if let Err(e) = try_play(payload) {
        log::debug!("reply playback skipped: {e:#}");
    }
}

fn try_play(payload: &str) -> anyhow::Result<()> {
    let bytes = decode_payload(payload)?;
    let clip = decode_wav_mono(&bytes)?;
    play_clip(clip)
}

/// Strip an optional `data:audio/...;base64,` prefix and decode.
pub fn decode_payload(payload: &str) -> anyhow::Result<Vec<u8>> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("empty audio payload"));
    }

    let b64 = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };

    base64::engine::general_purpose::STANDARD
        .decode(b64)
        .context("decode base64 audio payload")
}

pub struct MonoClip {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

/// Minimal RIFF/WAVE reader: PCM16 and IEEE-float32, any channel count
/// (downmixed by averaging). Enough for backend-synthesized clips.
pub fn decode_wav_mono(bytes: &[u8]) -> anyhow::Result<MonoClip> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(anyhow!("not a RIFF/WAVE payload"));
    }

    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut data: Option<&[u8]> = None;

    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id: [u8; 4] = bytes[pos..pos + 4].try_into().unwrap_or_default();
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap_or_default()) as usize;
        let chunk_end = (pos + 8).saturating_add(size).min(bytes.len());
        let chunk = &bytes[pos + 8..chunk_end];

        match &id {
            b"fmt " if chunk.len() >= 16 => {
                let audio_format = u16::from_le_bytes([chunk[0], chunk[1]]);
                let channels = u16::from_le_bytes([chunk[2], chunk[3]]);
                let sample_rate =
                    u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
                let bits = u16::from_le_bytes([chunk[14], chunk[15]]);
                fmt = Some((audio_format, channels, sample_rate, bits));
            }
            b"data" => data = Some(chunk),
            _ => {}
        }

        // Chunks are word-aligned.
        pos = chunk_end + (size % 2);
    }

    let (audio_format, channels, sample_rate, bits) =
        fmt.ok_or_else(|| anyhow!("wav payload has no fmt chunk"))?;
    let data = data.ok_or_else(|| anyhow!("wav payload has no data chunk"))?;

    if channels == 0 {
        return Err(anyhow!("wav payload declares zero channels"));
    }

    let interleaved: Vec<f32> = match (audio_format, bits) {
        (1, 16) => data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / 32768.0)
            .collect(),
        (3, 32) => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        other => return Err(anyhow!("unsupported wav encoding: {other:?}")),
    };

    let channels = channels as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(MonoClip { sample_rate_hz: sample_rate, samples })
}

fn play_clip(clip: MonoClip) -> anyhow::Result<()> {
    if clip.samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device"))?;
    let config = device
        .default_output_config()
        .context("default output config")?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        // Rare in practice; not worth a format matrix for a courtesy feature.
        return Err(anyhow!("output device is not f32: {:?}", config.sample_format()));
    }

    let out_rate = config.sample_rate().0;
    let channels = config.channels() as usize;

    let samples = if clip.sample_rate_hz == out_rate {
        clip.samples
    } else {
        resample_mono(&clip.samples, clip.sample_rate_hz, out_rate)?
    };

    let total = samples.len();
    let cursor = Arc::new(AtomicUsize::new(0));
    let cb_cursor = cursor.clone();

    let stream = device
        .build_output_stream(
            &config.into(),
            move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in out.chunks_mut(channels) {
                    let i = cb_cursor.fetch_add(1, Ordering::Relaxed);
                    let v = samples.get(i).copied().unwrap_or(0.0);
                    for slot in frame {
                        *slot = v;
                    }
                }
            },
            |err| log::debug!("output stream error: {err}"),
            None,
        )
        .context("build output stream")?;

    stream.play().context("play output stream")?;

    while cursor.load(Ordering::Relaxed) < total {
        std::thread::sleep(Duration::from_millis(25));
    }
    // Let the tail of the buffer leave the device before tearing down.
    std::thread::sleep(Duration::from_millis(50));
    drop(stream);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use base64::Engine as _;

    fn wav_pcm16(rate: u32, channels: u16, frames: &[&[i16]]) -> Vec<u8> {
        let mut data = Vec::new();
        for frame in frames {
            assert_eq!(frame.len(), channels as usize);
            for s in *frame {
                data.extend_from_slice(&s.to_le_bytes());
            }
        }

        let byte_rate = rate * channels as u32 * 2;
        let block_align = channels * 2;

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&data);
        out
    }

    #[test]
    fn decodes_data_url_and_raw_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"abc");

        let from_url = decode_payload(&format!("data:audio/wav;base64,{encoded}")).unwrap();
        assert_eq!(from_url, b"abc");

        let raw = decode_payload(&encoded).unwrap();
        assert_eq!(raw, b"abc");

        assert!(decode_payload("   ").is_err());
        assert!(decode_payload("!!not-base64!!").is_err());
    }

    #[test]
    fn decodes_pcm16_and_downmixes_stereo() {
        let wav = wav_pcm16(16_000, 2, &[&[16384, -16384], &[0, 16384]]);
        let clip = decode_wav_mono(&wav).unwrap();

        assert_eq!(clip.sample_rate_hz, 16_000);
        assert_eq!(clip.samples.len(), 2);
        assert_relative_eq!(clip.samples[0], 0.0, epsilon = 1e-4);
        assert_relative_eq!(clip.samples[1], 0.25, epsilon = 1e-4);
    }

    #[test]
    fn rejects_non_wav_bytes() {
        assert!(decode_wav_mono(b"OggS....").is_err());
        assert!(decode_wav_mono(b"").is_err());
    }
}
