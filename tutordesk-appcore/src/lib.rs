pub mod playback;
pub mod service;

pub use playback::{SilentPlayback, SpeakerPlayback};
pub use service::{AppService, user_facing_audio_error};
