use crate::session::{QuotaUpdate, TurnRecord, TurnStage, TurnTimings, ms};
use crate::traits::{AudioPlayback, TurnClient};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tutordesk_core::conversation::voice_turn_messages;
use tutordesk_core::text::clock_label;
use tutordesk_core::types::{AudioFile, CourseId, ReplyKind, TurnOutcome};

const STAGE_SUBMITTING: &str = "submitting";
const STAGE_APPENDING: &str = "appending";
const STAGE_SPEAKING: &str = "speaking";
const STAGE_DONE: &str = "done";
const STAGE_QUOTA: &str = "quota-exceeded";
const STAGE_FAILED: &str = "failed";

/// Shown when the backend failed without offering its own message.
pub const OFFLINE_FALLBACK: &str = "Our voice agent is taking a break.";

/// Drives one voice turn from classified outcome to renderable record:
/// message assembly, quota movement, error surfacing, reply playback.
pub struct TurnEngine {
    client: Arc<dyn TurnClient>,
    playback: Arc<dyn AudioPlayback>,
}

impl TurnEngine {
    pub fn new(client: Arc<dyn TurnClient>, playback: Arc<dyn AudioPlayback>) -> Self {
        Self { client, playback }
    }

    pub async fn run_turn(&self, audio: AudioFile, course: &CourseId) -> anyhow::Result<TurnRecord> {
        self.run_turn_with_hook(audio, course, |_stage| async {}).await
    }

    /// Same as `run_turn`, but emits a stage hook as the turn progresses.
    ///
    /// The hook is intended for UI progress and must be fast.
    pub async fn run_turn_with_hook<F, Fut>(
        &self,
        audio: AudioFile,
        course: &CourseId,
        on_stage: F,
    ) -> anyhow::Result<TurnRecord>
    where
        F: Fn(&'static str) -> Fut,
        Fut: Future<Output = ()>,
    {
        on_stage(STAGE_SUBMITTING).await;

        let t0 = Instant::now();
        let outcome = self.client.submit(&audio, course).await?;
        let timings = TurnTimings { submit_ms: Some(ms(t0.elapsed())) };

        let now = chrono::Local::now();
        let ts_unix_ms = now.timestamp_millis();
        let clock = clock_label(now);

        match outcome {
            TurnOutcome::Completed(reply) => {
                on_stage(STAGE_APPENDING).await;
                let messages = voice_turn_messages(
                    &reply.transcript,
                    &reply.answer,
                    reply.audio.as_deref(),
                    reply.reply_kind,
                    ts_unix_ms,
                    &clock,
                );

                if reply.reply_kind == ReplyKind::Audio {
                    if let Some(payload) = reply.audio.as_deref() {
                        on_stage(STAGE_SPEAKING).await;
                        self.playback.play(payload).await;
                    }
                }

                Ok(TurnRecord {
                    stage: TurnStage::Completed,
                    stage_label: Some(STAGE_DONE.into()),
                    transcript: Some(reply.transcript),
                    answer: Some(reply.answer),
                    reply_kind: Some(reply.reply_kind),
                    greeting: reply.greeting,
                    messages,
                    quota_update: QuotaUpdate::Overwrite(reply.quota),
                    error: None,
                    timings,
                })
            }

            TurnOutcome::QuotaExceeded { message, transcript, quota } => {
                let friendly = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| OFFLINE_FALLBACK.into());

                on_stage(STAGE_APPENDING).await;
                let messages = voice_turn_messages(
                    transcript.as_deref().unwrap_or(""),
                    &friendly,
                    None,
                    ReplyKind::Text,
                    ts_unix_ms,
                    &clock,
                );

                Ok(TurnRecord {
                    stage: TurnStage::QuotaExceeded,
                    stage_label: Some(STAGE_QUOTA.into()),
                    transcript,
                    answer: None,
                    reply_kind: Some(ReplyKind::Text),
                    greeting: false,
                    messages,
                    quota_update: match quota {
                        Some(q) => QuotaUpdate::Overwrite(Some(q)),
                        None => QuotaUpdate::Keep,
                    },
                    error: Some(friendly),
                    timings,
                })
            }

            TurnOutcome::Rejected { status, message } => {
                let friendly = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| OFFLINE_FALLBACK.into());

                log::warn!("voice turn rejected: status={status}");

                Ok(TurnRecord {
                    stage: TurnStage::Rejected,
                    stage_label: Some(STAGE_FAILED.into()),
                    transcript: None,
                    answer: None,
                    reply_kind: None,
                    greeting: false,
                    messages: Vec::new(),
                    quota_update: QuotaUpdate::Keep,
                    error: Some(friendly),
                    timings,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tutordesk_core::conversation::THINKING_FALLBACK;
    use tutordesk_core::types::{Quota, Sender, TurnReply};

    struct ScriptedClient {
        outcome: TurnOutcome,
    }

    #[async_trait]
    impl TurnClient for ScriptedClient {
        async fn submit(&self, _audio: &AudioFile, _course: &CourseId) -> anyhow::Result<TurnOutcome> {
            Ok(self.outcome.clone())
        }
    }

    #[derive(Default)]
    struct RecordingPlayback {
        played: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AudioPlayback for RecordingPlayback {
        async fn play(&self, payload: &str) {
            self.played.lock().unwrap().push(payload.to_string());
        }
    }

    fn clip() -> AudioFile {
        AudioFile {
            filename: "voice.wav".into(),
            mime_type: "audio/wav".into(),
            bytes: vec![0; 8],
        }
    }

    fn engine(outcome: TurnOutcome) -> (TurnEngine, Arc<RecordingPlayback>) {
        let playback = Arc::new(RecordingPlayback::default());
        let engine = TurnEngine::new(Arc::new(ScriptedClient { outcome }), playback.clone());
        (engine, playback)
    }

    #[tokio::test]
    async fn completed_turn_appends_user_then_bot_and_overwrites_quota() {
        let (engine, playback) = engine(TurnOutcome::Completed(TurnReply {
            transcript: "what is middleware".into(),
            answer: "Middleware is...".into(),
            audio: None,
            reply_kind: ReplyKind::Text,
            greeting: false,
            quota: Some(Quota { limit: 10, remaining: 7 }),
        }));

        let record = engine.run_turn(clip(), &CourseId::new("nodejs")).await.unwrap();

        assert_eq!(record.stage, TurnStage::Completed);
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[0].sender, Sender::User);
        assert_eq!(record.messages[1].sender, Sender::Bot);
        assert_eq!(
            record.quota_update,
            QuotaUpdate::Overwrite(Some(Quota { limit: 10, remaining: 7 }))
        );
        assert_eq!(record.error, None);
        assert!(playback.played.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn audio_replies_are_played() {
        let (engine, playback) = engine(TurnOutcome::Completed(TurnReply {
            transcript: "hi".into(),
            answer: "Hello!".into(),
            audio: Some("UklGRg==".into()),
            reply_kind: ReplyKind::Audio,
            greeting: true,
            quota: None,
        }));

        let record = engine.run_turn(clip(), &CourseId::new("nodejs")).await.unwrap();

        assert!(record.greeting);
        assert_eq!(record.messages[1].audio.as_deref(), Some("UklGRg=="));
        assert_eq!(playback.played.lock().unwrap().as_slice(), ["UklGRg=="]);
        // No quota in the body still overwrites the cell.
        assert_eq!(record.quota_update, QuotaUpdate::Overwrite(None));
    }

    #[tokio::test]
    async fn empty_answer_gets_the_thinking_placeholder() {
        let (engine, _) = engine(TurnOutcome::Completed(TurnReply {
            transcript: String::new(),
            answer: String::new(),
            audio: None,
            reply_kind: ReplyKind::Text,
            greeting: false,
            quota: None,
        }));

        let record = engine.run_turn(clip(), &CourseId::new("nodejs")).await.unwrap();
        assert_eq!(record.messages.len(), 1);
        assert_eq!(record.messages[0].text, THINKING_FALLBACK);
    }

    #[tokio::test]
    async fn quota_exceeded_appends_one_bot_message_and_sets_error() {
        let (engine, playback) = engine(TurnOutcome::QuotaExceeded {
            message: Some("Daily limit reached".into()),
            transcript: None,
            quota: Some(Quota { limit: 10, remaining: 0 }),
        });

        let record = engine.run_turn(clip(), &CourseId::new("nodejs")).await.unwrap();

        assert_eq!(record.stage, TurnStage::QuotaExceeded);
        assert_eq!(record.messages.len(), 1);
        assert_eq!(record.messages[0].sender, Sender::Bot);
        assert_eq!(record.messages[0].text, "Daily limit reached");
        assert_eq!(
            record.quota_update,
            QuotaUpdate::Overwrite(Some(Quota { limit: 10, remaining: 0 }))
        );
        assert_eq!(record.error.as_deref(), Some("Daily limit reached"));
        assert!(playback.played.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn quota_exceeded_without_body_quota_keeps_the_cell() {
        let (engine, _) = engine(TurnOutcome::QuotaExceeded {
            message: None,
            transcript: Some("my question".into()),
            quota: None,
        });

        let record = engine.run_turn(clip(), &CourseId::new("nodejs")).await.unwrap();

        assert_eq!(record.quota_update, QuotaUpdate::Keep);
        assert_eq!(record.error.as_deref(), Some(OFFLINE_FALLBACK));
        // The 429 body carried a transcript, so the user entry is kept.
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[0].text, "my question");
    }

    #[tokio::test]
    async fn rejections_surface_the_message_without_chat_entries() {
        let (engine, _) = engine(TurnOutcome::Rejected {
            status: 503,
            message: Some("warming up".into()),
        });

        let record = engine.run_turn(clip(), &CourseId::new("nodejs")).await.unwrap();

        assert_eq!(record.stage, TurnStage::Rejected);
        assert!(record.messages.is_empty());
        assert_eq!(record.error.as_deref(), Some("warming up"));
        assert_eq!(record.quota_update, QuotaUpdate::Keep);
    }

    #[tokio::test]
    async fn rejections_without_message_use_the_fallback() {
        let (engine, _) = engine(TurnOutcome::Rejected { status: 500, message: None });
        let record = engine.run_turn(clip(), &CourseId::new("nodejs")).await.unwrap();
        assert_eq!(record.error.as_deref(), Some(OFFLINE_FALLBACK));
    }
}
