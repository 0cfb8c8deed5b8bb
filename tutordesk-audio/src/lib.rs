pub mod playback;
pub mod recorder;
pub mod resample;

pub use playback::play_reply_audio;
pub use recorder::{AudioCaptureError, AudioRecorder, CapturedAudio};
