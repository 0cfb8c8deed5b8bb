use anyhow::Context;
use serde::Deserialize;
use tutordesk_core::types::{Course, CourseId, Quota, ReplyKind, TurnOutcome, TurnReply, UserProfile};

/// Wire shape of a voice-turn reply. Every field is optional: backends under
/// load return partial bodies and those must never break the flow.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TurnReplyBody {
    #[serde(default)]
    pub transcript: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub audio: Option<String>,

    #[serde(default, rename = "replyType")]
    pub reply_type: Option<String>,

    #[serde(default)]
    pub greeting: Option<bool>,

    #[serde(default)]
    pub quota: Option<Quota>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Classify one voice-turn response.
///
/// A body that fails to parse is treated as absent, not as an error: the
/// status code alone still decides the outcome.
pub fn parse_turn_outcome(status: u16, body: &[u8]) -> TurnOutcome {
    let body: TurnReplyBody = serde_json::from_slice(body).unwrap_or_default();

    if (200..=299).contains(&status) {
        let reply_kind = match body.reply_type.as_deref() {
            Some("text") => ReplyKind::Text,
            // The backend speaks by default.
            _ => ReplyKind::Audio,
        };

        return TurnOutcome::Completed(TurnReply {
            transcript: body.transcript.unwrap_or_default(),
            answer: body.text.unwrap_or_default(),
            audio: body.audio,
            reply_kind,
            greeting: body.greeting.unwrap_or(false),
            quota: body.quota,
        });
    }

    if status == 429 {
        return TurnOutcome::QuotaExceeded {
            message: body.message,
            transcript: body.transcript,
            quota: body.quota,
        };
    }

    TurnOutcome::Rejected { status, message: body.message }
}

/// Classified result of one `/ask` exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum AskOutcome {
    Answered {
        answer: Option<String>,
        quota: Option<Quota>,
    },
    Failed {
        status: u16,
        message: Option<String>,
        quota: Option<Quota>,
        // Distinguishes "body had no quota key" from "quota was null":
        // failure bodies only move the quota cell when the key is present.
        quota_present: bool,
    },
}

pub fn parse_ask_outcome(status: u16, body: &[u8]) -> AskOutcome {
    let value: serde_json::Value = serde_json::from_slice(body).unwrap_or_default();

    if (200..=299).contains(&status) {
        let answer = value
            .get("ragAnswer")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);
        let quota = value
            .get("quota")
            .and_then(|v| serde_json::from_value::<Quota>(v.clone()).ok());
        return AskOutcome::Answered { answer, quota };
    }

    let quota_present = value.get("quota").is_some();
    let quota = value
        .get("quota")
        .and_then(|v| serde_json::from_value::<Quota>(v.clone()).ok());
    let message = value
        .get("message")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    AskOutcome::Failed { status, message, quota, quota_present }
}

#[derive(Debug, Deserialize)]
struct CoursesBody {
    #[serde(default)]
    courses: Vec<CourseEntry>,
}

#[derive(Debug, Deserialize)]
struct CourseEntry {
    #[serde(rename = "courseId")]
    course_id: String,
    name: String,

    #[serde(default, rename = "iconUrl")]
    icon_url: Option<String>,

    #[serde(default)]
    description: Option<String>,
}

/// Parse the course directory. Unlike turn bodies this is strict: a caller
/// keeps its previous list when the directory can't be read.
pub fn parse_courses(body: &[u8]) -> anyhow::Result<Vec<Course>> {
    let parsed: CoursesBody = serde_json::from_slice(body).context("decode courses JSON")?;
    Ok(parsed
        .courses
        .into_iter()
        .map(|c| Course {
            id: CourseId::new(c.course_id),
            name: c.name,
            icon_url: c.icon_url,
            description: c.description.unwrap_or_default(),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated { token: String, user: UserProfile },
    Rejected { message: Option<String> },
}

#[derive(Debug, Default, Deserialize)]
struct AuthBody {
    #[serde(default)]
    token: Option<String>,

    #[serde(default)]
    user: Option<UserProfile>,

    #[serde(default)]
    message: Option<String>,
}

/// A login (or Google exchange) succeeds only when the body carries both a
/// token and a user; anything else is a rejection with the server's message.
pub fn parse_auth_outcome(status: u16, body: &[u8]) -> AuthOutcome {
    let body: AuthBody = serde_json::from_slice(body).unwrap_or_default();

    if (200..=299).contains(&status) {
        if let (Some(token), Some(user)) = (body.token, body.user) {
            return AuthOutcome::Authenticated { token, user };
        }
    }

    AuthOutcome::Rejected { message: body.message }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Accepted { message: Option<String> },
    Rejected { message: Option<String> },
}

pub fn parse_register_outcome(status: u16, body: &[u8]) -> RegisterOutcome {
    let body: AuthBody = serde_json::from_slice(body).unwrap_or_default();

    if (200..=299).contains(&status) {
        RegisterOutcome::Accepted { message: body.message }
    } else {
        RegisterOutcome::Rejected { message: body.message }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestSummary {
    #[serde(default)]
    pub upserted: u64,

    #[serde(default, rename = "processedFiles")]
    pub processed_files: Option<u64>,

    #[serde(default, rename = "totalFiles")]
    pub total_files: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IngestReport {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub progress: Vec<String>,

    #[serde(default)]
    pub result: Option<IngestSummary>,

    #[serde(default, rename = "forceRecreate")]
    pub force_recreate: bool,
}

/// Ingestion replies are tolerated like turn bodies: progress lines survive
/// even on failure statuses so the operator can see how far the run got.
pub fn parse_ingest_report(body: &[u8]) -> IngestReport {
    serde_json::from_slice(body).unwrap_or_default()
}

/// Insights are rendered as-is by the shell; no client-side schema.
pub fn parse_insights(body: &[u8]) -> anyhow::Result<serde_json::Value> {
    serde_json::from_slice(body).context("decode insights JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_turn_parses_all_fields() {
        let body = br#"{"transcript":"what is middleware","text":"Middleware is...","replyType":"text","quota":{"limit":10,"remaining":7}}"#;

        match parse_turn_outcome(200, body) {
            TurnOutcome::Completed(reply) => {
                assert_eq!(reply.transcript, "what is middleware");
                assert_eq!(reply.answer, "Middleware is...");
                assert_eq!(reply.reply_kind, ReplyKind::Text);
                assert_eq!(reply.quota, Some(Quota { limit: 10, remaining: 7 }));
                assert!(!reply.greeting);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn reply_kind_defaults_to_audio() {
        match parse_turn_outcome(200, br#"{"text":"hi","audio":"UklGR"}"#) {
            TurnOutcome::Completed(reply) => assert_eq!(reply.reply_kind, ReplyKind::Audio),
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_success_body_is_treated_as_empty() {
        match parse_turn_outcome(200, b"<html>oops</html>") {
            TurnOutcome::Completed(reply) => {
                assert_eq!(reply.transcript, "");
                assert_eq!(reply.answer, "");
                assert_eq!(reply.quota, None);
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[test]
    fn status_429_is_quota_exceeded() {
        let body = br#"{"message":"Daily limit reached","quota":{"limit":10,"remaining":0}}"#;
        assert_eq!(
            parse_turn_outcome(429, body),
            TurnOutcome::QuotaExceeded {
                message: Some("Daily limit reached".into()),
                transcript: None,
                quota: Some(Quota { limit: 10, remaining: 0 }),
            }
        );
    }

    #[test]
    fn other_failures_are_rejections() {
        assert_eq!(
            parse_turn_outcome(503, br#"{"message":"warming up"}"#),
            TurnOutcome::Rejected { status: 503, message: Some("warming up".into()) }
        );
        assert_eq!(
            parse_turn_outcome(500, b"not json"),
            TurnOutcome::Rejected { status: 500, message: None }
        );
    }

    #[test]
    fn ask_failure_tracks_quota_key_presence() {
        match parse_ask_outcome(429, br#"{"message":"limit","quota":null}"#) {
            AskOutcome::Failed { quota_present, quota, .. } => {
                assert!(quota_present);
                assert_eq!(quota, None);
            }
            other => panic!("expected Failed, got {other:?}"),
        }

        match parse_ask_outcome(500, br#"{"message":"boom"}"#) {
            AskOutcome::Failed { quota_present, .. } => assert!(!quota_present),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn ask_success_blank_answer_is_none() {
        match parse_ask_outcome(200, br#"{"ragAnswer":"   "}"#) {
            AskOutcome::Answered { answer, .. } => assert_eq!(answer, None),
            other => panic!("expected Answered, got {other:?}"),
        }
    }

    #[test]
    fn courses_normalize_wire_names() {
        let body = br#"{"courses":[{"courseId":"nodejs","name":"Node.js","iconUrl":"/nodeicon.svg"},{"courseId":"python","name":"Python","description":"Versatile"}]}"#;
        let courses = parse_courses(body).unwrap();

        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].id.as_str(), "nodejs");
        assert_eq!(courses[0].icon_url.as_deref(), Some("/nodeicon.svg"));
        assert_eq!(courses[0].description, "");
        assert_eq!(courses[1].description, "Versatile");
    }

    #[test]
    fn broken_course_body_errors_instead_of_emptying() {
        assert!(parse_courses(b"oops").is_err());
    }

    #[test]
    fn auth_needs_token_and_user() {
        let ok = br#"{"token":"t","user":{"username":"ada"}}"#;
        match parse_auth_outcome(200, ok) {
            AuthOutcome::Authenticated { token, user } => {
                assert_eq!(token, "t");
                assert_eq!(user.username.as_deref(), Some("ada"));
            }
            other => panic!("expected Authenticated, got {other:?}"),
        }

        // 200 without a token is still a rejection.
        assert_eq!(
            parse_auth_outcome(200, br#"{"message":"pending"}"#),
            AuthOutcome::Rejected { message: Some("pending".into()) }
        );
        assert_eq!(
            parse_auth_outcome(401, br#"{"message":"bad password"}"#),
            AuthOutcome::Rejected { message: Some("bad password".into()) }
        );
    }

    #[test]
    fn ingest_report_survives_partial_bodies() {
        let body = br#"{"message":"done","progress":["a.vtt","b.vtt"],"result":{"upserted":12,"processedFiles":2}}"#;
        let report = parse_ingest_report(body);
        assert_eq!(report.progress.len(), 2);
        assert_eq!(report.result.unwrap().upserted, 12);

        assert_eq!(parse_ingest_report(b"oops"), IngestReport::default());
    }
}
