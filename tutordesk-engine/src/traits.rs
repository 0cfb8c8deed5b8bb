use async_trait::async_trait;
use tutordesk_core::types::{AudioFile, Course, CourseId, TurnOutcome};

/// Submits one captured clip for the selected course.
///
/// HTTP-level failures (429, 5xx) come back classified inside `TurnOutcome`;
/// only transport faults (refused connection, timeout) are `Err`.
#[async_trait]
pub trait TurnClient: Send + Sync {
    async fn submit(&self, audio: &AudioFile, course: &CourseId) -> anyhow::Result<TurnOutcome>;
}

/// Plays a synthesized reply payload. Implementations are best-effort by
/// contract: they swallow their own failures and never block the session.
#[async_trait]
pub trait AudioPlayback: Send + Sync {
    async fn play(&self, payload: &str);
}

#[async_trait]
pub trait CourseDirectory: Send + Sync {
    async fn list_courses(&self) -> anyhow::Result<Vec<Course>>;
}
