use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tutordesk_core::types::{ChatMessage, Quota, ReplyKind};

/// Shown when recording is attempted with no course context.
pub const NO_COURSE_MESSAGE: &str = "Choose a course so I know what to answer.";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{}", NO_COURSE_MESSAGE)]
    NoCourseSelected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    Listening,
    Processing,
}

/// How a finished turn moves the quota cell.
///
/// Successful replies overwrite it even when the body carried no quota;
/// quota-exceeded replies only move it when the body said so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaUpdate {
    Keep,
    Overwrite(Option<Quota>),
}

/// The one place recording/processing status, the last error, and the quota
/// live. The error is a side-channel: it survives phase changes until
/// dismissed or overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    phase: SessionPhase,
    error: Option<String>,
    quota: Option<Quota>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == SessionPhase::Idle
    }

    pub fn is_listening(&self) -> bool {
        self.phase == SessionPhase::Listening
    }

    pub fn is_processing(&self) -> bool {
        self.phase == SessionPhase::Processing
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn quota(&self) -> Option<Quota> {
        self.quota
    }

    /// `Ok(true)` when the session moved to listening. `Ok(false)` when a
    /// recording or submission is already underway (callers treat that as a
    /// no-op, not a failure). Requires a selected course before anything else
    /// happens, so the device is never touched without one.
    pub fn try_begin_listening(&mut self, course_selected: bool) -> Result<bool, SessionError> {
        if self.phase != SessionPhase::Idle {
            return Ok(false);
        }

        if !course_selected {
            self.error = Some(NO_COURSE_MESSAGE.into());
            return Err(SessionError::NoCourseSelected);
        }

        self.error = None;
        self.phase = SessionPhase::Listening;
        Ok(true)
    }

    /// `true` when the session moved from listening to processing; `false`
    /// is the stop-while-not-recording no-op.
    pub fn try_begin_processing(&mut self) -> bool {
        if self.phase != SessionPhase::Listening {
            return false;
        }
        self.phase = SessionPhase::Processing;
        true
    }

    /// Return to idle from any phase. Never touches the error side-channel.
    pub fn finish(&mut self) {
        self.phase = SessionPhase::Idle;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn apply_quota(&mut self, update: QuotaUpdate) {
        if let QuotaUpdate::Overwrite(quota) = update {
            self.quota = quota;
        }
    }

    pub fn can_record(&self, course_selected: bool) -> bool {
        course_selected && self.phase != SessionPhase::Processing
    }

    // A stable string label for UI display.
    // This is intentionally not derived from `Debug`.
    pub fn status_label(&self) -> &'static str {
        match self.phase {
            SessionPhase::Idle => "idle",
            SessionPhase::Listening => "listening",
            SessionPhase::Processing => "processing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStage {
    Completed,
    QuotaExceeded,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTimings {
    pub submit_ms: Option<u64>,
}

/// Everything one finished turn produced: the chat entries to append, the
/// quota movement, and the error string when the turn degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub stage: TurnStage,

    // A stable string label for UI display.
    pub stage_label: Option<String>,

    pub transcript: Option<String>,
    pub answer: Option<String>,
    pub reply_kind: Option<ReplyKind>,
    pub greeting: bool,
    pub messages: Vec<ChatMessage>,
    pub quota_update: QuotaUpdate,
    pub error: Option<String>,
    pub timings: TurnTimings,
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
