use async_trait::async_trait;
use tutordesk_engine::traits::AudioPlayback;

/// Plays synthesized replies on the default output device.
///
/// The clip runs on a throwaway thread so the session returns to idle while
/// the answer is still speaking; playback failures stay inside the audio
/// layer and never surface here.
pub struct SpeakerPlayback;

#[async_trait]
impl AudioPlayback for SpeakerPlayback {
    async fn play(&self, payload: &str) {
        let payload = payload.to_string();
        std::thread::spawn(move || tutordesk_audio::play_reply_audio(&payload));
    }
}

/// For headless runs and tests.
pub struct SilentPlayback;

#[async_trait]
impl AudioPlayback for SilentPlayback {
    async fn play(&self, _payload: &str) {}
}
