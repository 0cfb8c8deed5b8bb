use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseId(pub String);

impl CourseId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub icon_url: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quota {
    pub limit: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyKind {
    Audio,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    Voice,
    Chat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    #[serde(default)]
    pub source: Option<MessageSource>,

    #[serde(default)]
    pub error: bool,

    #[serde(default)]
    pub status: Option<u16>,
}

/// One chat entry. Entries are append-only; the log never mutates an entry
/// after it was pushed, it only clears wholesale on a course switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    // Unix-ms derived, monotonic within a single turn (bot follows user).
    pub id: i64,
    pub sender: Sender,
    pub text: String,

    // Pre-formatted display clock ("14:05"); the backend never sees this.
    pub timestamp: String,

    #[serde(default)]
    pub audio: Option<String>,

    #[serde(default)]
    pub meta: MessageMeta,
}

impl ChatMessage {
    pub fn new(id: i64, sender: Sender, text: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            id,
            sender,
            text: text.into(),
            timestamp: timestamp.into(),
            audio: None,
            meta: MessageMeta::default(),
        }
    }

    pub fn with_audio(mut self, payload: impl Into<String>) -> Self {
        self.audio = Some(payload.into());
        self
    }

    pub fn with_source(mut self, source: MessageSource) -> Self {
        self.meta.source = Some(source);
        self
    }

    pub fn with_error_status(mut self, status: Option<u16>) -> Self {
        self.meta.error = true;
        self.meta.status = status;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub firstname: Option<String>,

    #[serde(default)]
    pub lastname: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default, rename = "isSuperuser")]
    pub is_superuser: bool,

    #[serde(default, rename = "_id")]
    pub id: Option<String>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.role.as_deref() == Some("superadmin")
    }
}

/// A finished recording ready for upload: encoded bytes plus the multipart
/// filename/mime the backend will see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Fields of a successful voice-turn reply, already normalized (absent
/// strings collapsed to empty, reply kind defaulted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub transcript: String,
    pub answer: String,
    pub audio: Option<String>,
    pub reply_kind: ReplyKind,
    pub greeting: bool,
    pub quota: Option<Quota>,
}

/// Classified result of one voice-turn submission.
///
/// Transport failures (connection refused, DNS, timeouts) are not represented
/// here; those surface as errors from the client itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed(TurnReply),

    // HTTP 429. Recoverable: still renders a bot-visible message.
    QuotaExceeded {
        message: Option<String>,
        transcript: Option<String>,
        quota: Option<Quota>,
    },

    // Any other non-2xx status. Surfaced as an error string only.
    Rejected {
        status: u16,
        message: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ReplyKind::Audio).unwrap(), r#""audio""#);
        assert_eq!(serde_json::to_string(&ReplyKind::Text).unwrap(), r#""text""#);
    }

    #[test]
    fn superadmin_role_counts_as_admin() {
        let user = UserProfile {
            role: Some("superadmin".into()),
            ..Default::default()
        };
        assert!(user.is_admin());

        let plain = UserProfile::default();
        assert!(!plain.is_admin());
    }

    #[test]
    fn profile_reads_wire_field_names() {
        let user: UserProfile =
            serde_json::from_str(r#"{"username":"ada","isSuperuser":true,"_id":"abc"}"#).unwrap();
        assert!(user.is_superuser);
        assert_eq!(user.id.as_deref(), Some("abc"));
    }
}
