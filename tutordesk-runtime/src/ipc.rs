use serde::{Deserialize, Serialize};
use tutordesk_core::types::Quota;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStatus {
    pub is_recording: bool,

    // One of "idle" / "listening" / "processing".
    pub status: String,

    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTurnResponse {
    pub stage: String,
    pub transcript: Option<String>,
    pub answer: Option<String>,
    pub error: Option<String>,
    pub quota: Option<Quota>,
}
