use tutordesk_core::types::{AudioFile, CourseId, TurnOutcome};
use tutordesk_engine::traits::TurnClient;

pub fn encode_wav_mono_f32le(samples: &[f32], sample_rate_hz: u32) -> Vec<u8> {
    // Simple WAV (RIFF) writer: 32-bit float PCM, mono.
    // Enough for the turn upload.
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 32;
    let audio_format: u16 = 3; // IEEE float

    let byte_rate = sample_rate_hz * num_channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = num_channels * (bits_per_sample / 8);

    let data_bytes_len = samples.len() as u32 * 4;

    let mut out = Vec::with_capacity((44 + data_bytes_len) as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_bytes_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&audio_format.to_le_bytes());
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&sample_rate_hz.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes_len.to_le_bytes());

    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }

    out
}

/// Wrap captured samples as the upload the turn endpoint expects.
pub fn wav_audio_file(samples: &[f32], sample_rate_hz: u32) -> AudioFile {
    AudioFile {
        filename: "voice.wav".into(),
        mime_type: "audio/wav".into(),
        bytes: encode_wav_mono_f32le(samples, sample_rate_hz),
    }
}

#[derive(Clone)]
pub struct VoiceTurnClient {
    api_base_url: String,
    bearer_token: Option<String>,
}

impl std::fmt::Debug for VoiceTurnClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceTurnClient")
            .field("api_base_url", &self.api_base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl VoiceTurnClient {
    pub fn new(api_base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            bearer_token,
        }
    }
}

#[async_trait::async_trait]
impl TurnClient for VoiceTurnClient {
    async fn submit(&self, audio: &AudioFile, course: &CourseId) -> anyhow::Result<TurnOutcome> {
        let cfg = tutordesk_providers::voice::VoiceTurnConfig {
            api_base_url: self.api_base_url.clone(),
            bearer_token: self.bearer_token.clone(),
        };

        let req = tutordesk_providers::voice::build_voice_turn_request(&cfg, audio, course);
        let resp = tutordesk_providers::runtime::execute(&req).await?;

        Ok(tutordesk_providers::parse::parse_turn_outcome(resp.status, &resp.body))
    }
}

/// Scripted stand-in for offline runs and tests.
#[derive(Debug, Clone)]
pub struct MockTurnClient {
    pub outcome: TurnOutcome,
}

#[async_trait::async_trait]
impl TurnClient for MockTurnClient {
    async fn submit(&self, _audio: &AudioFile, _course: &CourseId) -> anyhow::Result<TurnOutcome> {
        Ok(self.outcome.clone())
    }
}
