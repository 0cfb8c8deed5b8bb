use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use tutordesk_audio::{AudioCaptureError, AudioRecorder};
use tutordesk_core::conversation::ConversationLog;
use tutordesk_core::types::{AudioFile, ChatMessage, Course, CourseId, Quota, UserProfile};
use tutordesk_engine::engine::{OFFLINE_FALLBACK, TurnEngine};
use tutordesk_engine::session::{NO_COURSE_MESSAGE, SessionState, TurnRecord};
use tutordesk_engine::traits::{AudioPlayback, CourseDirectory, TurnClient};
use tutordesk_providers::auth::RegisterPayload;
use tutordesk_runtime::ask::{AskClient, AskExchange};
use tutordesk_runtime::auth::{AuthClient, AuthError};
use tutordesk_runtime::config_store::ConfigStore;
use tutordesk_runtime::courses::{CourseClient, reconcile_selection};
use tutordesk_runtime::ipc::{RecordingStatus, RunTurnResponse};
use tutordesk_runtime::session_store::{AuthSession, SessionStore};
use tutordesk_runtime::transcript::{TranscriptStore, TurnTranscriptEntry};
use tutordesk_runtime::voice::{VoiceTurnClient, wav_audio_file};

pub fn user_facing_audio_error(e: &AudioCaptureError) -> String {
    let raw = e.to_string().to_lowercase();

    // Keep messages actionable and short; details are in logs.
    if raw.contains("no input device") {
        return "No microphone detected. Plug one in or pick an input device in settings.".into();
    }

    if raw.contains("permission") || raw.contains("access") || raw.contains("denied") {
        return "Microphone access denied.".into();
    }

    "Audio recording failed. Please try again.".into()
}

#[derive(Default)]
struct CourseBoard {
    list: Vec<Course>,
    selected: Option<CourseId>,
}

/// The one object a shell talks to: owns the recorder handle, the session
/// state machine, the conversation log, and the auth/course context.
pub struct AppService {
    config_store: ConfigStore,
    session_store: SessionStore,
    transcript: TranscriptStore,
    playback: Arc<dyn AudioPlayback>,

    // Test/offline seams; production builds the real clients from config.
    turn_client_override: Option<Arc<dyn TurnClient>>,
    directory_override: Option<Arc<dyn CourseDirectory>>,

    state: Mutex<SessionState>,
    log: Mutex<ConversationLog>,
    board: Mutex<CourseBoard>,
    auth: Mutex<Option<AuthSession>>,
    recorder: Mutex<Option<AudioRecorder>>,
    ask_gate: Mutex<()>,
}

impl AppService {
    pub fn new(config_path: PathBuf, playback: Arc<dyn AudioPlayback>) -> Self {
        let data_dir = config_path.parent().map(PathBuf::from).unwrap_or_default();

        Self {
            config_store: ConfigStore::at_path(config_path),
            session_store: SessionStore::at_path(data_dir.join("session.json")),
            transcript: TranscriptStore::at_path(data_dir.join("transcript.json")),
            playback,
            turn_client_override: None,
            directory_override: None,
            state: Mutex::new(SessionState::new()),
            log: Mutex::new(ConversationLog::new()),
            board: Mutex::new(CourseBoard::default()),
            auth: Mutex::new(None),
            recorder: Mutex::new(None),
            ask_gate: Mutex::new(()),
        }
    }

    pub fn with_turn_client(mut self, client: Arc<dyn TurnClient>) -> Self {
        self.turn_client_override = Some(client);
        self
    }

    pub fn with_course_directory(mut self, directory: Arc<dyn CourseDirectory>) -> Self {
        self.directory_override = Some(directory);
        self
    }

    fn config(&self) -> tutordesk_core::config::AppConfig {
        self.config_store.load_or_default()
    }

    pub fn save_config(&self, cfg: &tutordesk_core::config::AppConfig) -> anyhow::Result<()> {
        self.config_store.save(cfg)
    }

    // ---- auth / session lifecycle ----

    /// Restore a remembered session from disk. Call once on startup.
    pub async fn hydrate_session(&self) -> Option<UserProfile> {
        match self.session_store.hydrate() {
            Ok(Some(session)) => {
                let user = session.user.clone();
                *self.auth.lock().await = Some(session);
                log::info!("session restored for {}", tutordesk_core::text::display_name(&user));
                Some(user)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("session hydrate failed: {e:#}");
                None
            }
        }
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<UserProfile, AuthError> {
        let client = AuthClient::new(self.config().api_base());
        let session = client.login(email, password, remember).await?;

        if let Err(e) = self.session_store.persist(&session) {
            // The login itself succeeded; persistence is a convenience.
            log::warn!("failed to persist session: {e:#}");
        }

        let user = session.user.clone();
        *self.auth.lock().await = Some(session);
        Ok(user)
    }

    /// Register, then sign straight in when the remember flag is set.
    pub async fn register(
        &self,
        payload: &RegisterPayload,
        remember: bool,
    ) -> Result<String, AuthError> {
        let client = AuthClient::new(self.config().api_base());
        let message = client.register(payload).await?;

        if remember {
            self.login(&payload.email, &payload.password, true).await?;
        }

        Ok(message)
    }

    pub async fn login_with_google(
        &self,
        id_token: &str,
        remember: bool,
    ) -> Result<UserProfile, AuthError> {
        let client = AuthClient::new(self.config().api_base());
        let session = client.login_with_google(id_token, remember).await?;

        if let Err(e) = self.session_store.persist(&session) {
            log::warn!("failed to persist session: {e:#}");
        }

        let user = session.user.clone();
        *self.auth.lock().await = Some(session);
        Ok(user)
    }

    pub async fn logout(&self) {
        *self.auth.lock().await = None;
        if let Err(e) = self.session_store.clear() {
            log::warn!("failed to clear stored session: {e:#}");
        }
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        self.auth.lock().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.lock().await.is_some()
    }

    async fn auth_token(&self) -> Option<String> {
        self.auth.lock().await.as_ref().map(|s| s.token.clone())
    }

    // ---- courses ----

    /// Re-fetch the directory. Keeps the current selection when the course
    /// still exists, otherwise falls back to the first listed one; a refresh
    /// never clears the conversation, only an explicit switch does.
    pub async fn refresh_courses(&self) -> anyhow::Result<Vec<Course>> {
        let courses = match &self.directory_override {
            Some(directory) => directory.list_courses().await?,
            None => CourseClient::new(self.config().api_base()).list_courses().await?,
        };

        let mut board = self.board.lock().await;
        board.selected = reconcile_selection(&courses, board.selected.as_ref());
        board.list = courses.clone();
        Ok(courses)
    }

    /// Explicit course switch: moves the selection and clears the chat.
    pub async fn select_course(&self, course: &CourseId) -> bool {
        let mut board = self.board.lock().await;
        if !board.list.iter().any(|c| &c.id == course) {
            return false;
        }
        board.selected = Some(course.clone());
        drop(board);

        self.log.lock().await.clear();
        true
    }

    pub async fn courses(&self) -> Vec<Course> {
        self.board.lock().await.list.clone()
    }

    pub async fn selected_course(&self) -> Option<CourseId> {
        self.board.lock().await.selected.clone()
    }

    // ---- voice turn flow ----

    /// Start listening. No-op while a recording or submission is underway;
    /// refuses (and records the error) when no course is selected, before
    /// the device is ever touched. Acquisition failures release the device
    /// and return the session to idle with a user-facing error.
    pub async fn start_recording(&self) -> RecordingStatus {
        let course_selected = self.board.lock().await.selected.is_some();

        {
            let mut state = self.state.lock().await;
            match state.try_begin_listening(course_selected) {
                Ok(true) => {}
                Ok(false) | Err(_) => return self.status_of(&state),
            }
        }

        let cfg = self.config();
        let mut recorder = self.recorder.lock().await;

        let opened = match AudioRecorder::open_named(cfg.microphone_device.as_deref()) {
            Ok(r) => r,
            Err(e) => {
                drop(recorder);
                let mut state = self.state.lock().await;
                state.set_error(user_facing_audio_error(&e));
                state.finish();
                return self.status_of(&state);
            }
        };

        if let Err(e) = opened.start() {
            let _ = opened.close();
            drop(recorder);
            let mut state = self.state.lock().await;
            state.set_error(user_facing_audio_error(&e));
            state.finish();
            return self.status_of(&state);
        }

        *recorder = Some(opened);
        drop(recorder);

        self.status().await
    }

    /// Stop listening and submit the captured clip. `None` when nothing was
    /// recording. The device is released before the upload starts, on every
    /// path.
    pub async fn stop_and_submit(&self) -> Option<RunTurnResponse> {
        {
            let mut state = self.state.lock().await;
            if !state.try_begin_processing() {
                return None;
            }
        }

        let captured = {
            let mut recorder = self.recorder.lock().await;
            match recorder.take() {
                Some(r) => {
                    let captured = r.stop_captured();
                    let _ = r.close();
                    captured
                }
                None => Err(AudioCaptureError::NoInputDevice),
            }
        };

        let captured = match captured {
            Ok(c) => c,
            Err(e) => {
                let mut state = self.state.lock().await;
                state.set_error(user_facing_audio_error(&e));
                state.finish();
                return Some(RunTurnResponse {
                    stage: "failed".into(),
                    transcript: None,
                    answer: None,
                    error: state.error().map(str::to_string),
                    quota: state.quota(),
                });
            }
        };

        if captured.samples.is_empty() {
            // Nothing arrived from the device; quietly go back to idle.
            let mut state = self.state.lock().await;
            state.finish();
            return Some(RunTurnResponse {
                stage: "idle".into(),
                transcript: None,
                answer: None,
                error: None,
                quota: state.quota(),
            });
        }

        let samples = if captured.sample_rate_hz == 16_000 {
            captured.samples
        } else {
            match AudioRecorder::resample_to_16k(&captured.samples, captured.sample_rate_hz) {
                Ok(s) => s,
                Err(e) => {
                    let mut state = self.state.lock().await;
                    state.set_error(user_facing_audio_error(&e));
                    state.finish();
                    return Some(RunTurnResponse {
                        stage: "failed".into(),
                        transcript: None,
                        answer: None,
                        error: state.error().map(str::to_string),
                        quota: state.quota(),
                    });
                }
            }
        };

        Some(self.run_turn(wav_audio_file(&samples, 16_000)).await)
    }

    /// Submit one prepared clip for the selected course. Public so headless
    /// shells can drive the flow without a microphone.
    pub async fn run_turn(&self, audio: AudioFile) -> RunTurnResponse {
        let Some(course) = self.selected_course().await else {
            let mut state = self.state.lock().await;
            state.set_error(NO_COURSE_MESSAGE);
            state.finish();
            return RunTurnResponse {
                stage: "failed".into(),
                transcript: None,
                answer: None,
                error: state.error().map(str::to_string),
                quota: state.quota(),
            };
        };

        let cfg = self.config();
        let engine = match &self.turn_client_override {
            Some(client) => TurnEngine::new(client.clone(), self.playback.clone()),
            None => TurnEngine::new(
                Arc::new(VoiceTurnClient::new(cfg.api_base(), self.auth_token().await)),
                self.playback.clone(),
            ),
        };

        let response = match engine.run_turn(audio, &course).await {
            Ok(record) => {
                {
                    let mut state = self.state.lock().await;
                    state.apply_quota(record.quota_update);
                    match record.error.as_deref() {
                        Some(message) => state.set_error(message),
                        None => state.dismiss_error(),
                    }
                }

                self.log.lock().await.append(record.messages.clone());

                if cfg.transcript_enabled {
                    // Best-effort: a full disk must not break the session.
                    let _ = self.transcript.append(transcript_entry(&record, &course));
                }

                let state = self.state.lock().await;
                RunTurnResponse {
                    stage: record
                        .stage_label
                        .unwrap_or_else(|| format!("{:?}", record.stage).to_lowercase()),
                    transcript: record.transcript,
                    answer: record.answer,
                    error: record.error,
                    quota: state.quota(),
                }
            }
            Err(e) => {
                log::error!("voice turn failed: {e:#}");
                let mut state = self.state.lock().await;
                state.set_error(OFFLINE_FALLBACK);
                RunTurnResponse {
                    stage: "error".into(),
                    transcript: None,
                    answer: None,
                    error: Some(OFFLINE_FALLBACK.into()),
                    quota: state.quota(),
                }
            }
        };

        self.state.lock().await.finish();
        response
    }

    // ---- text chat ----

    /// Send a typed question. `None` when the query is blank, no course is
    /// selected, or another send is still in flight (dropped, not queued).
    pub async fn ask(&self, query: &str) -> Option<AskExchange> {
        if query.trim().is_empty() {
            return None;
        }
        let course = self.selected_course().await?;
        let _gate = self.ask_gate.try_lock().ok()?;

        let client = AskClient::new(self.config().api_base(), self.auth_token().await);
        let exchange = client.send(query, &course).await;

        self.state.lock().await.apply_quota(exchange.quota_update);
        self.log.lock().await.append(exchange.messages.clone());

        Some(exchange)
    }

    // ---- surface state ----

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.log.lock().await.messages().to_vec()
    }

    pub async fn quota(&self) -> Option<Quota> {
        self.state.lock().await.quota()
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.dismiss_error();
    }

    pub async fn can_record(&self) -> bool {
        let course_selected = self.board.lock().await.selected.is_some();
        self.state.lock().await.can_record(course_selected)
    }

    pub async fn status(&self) -> RecordingStatus {
        let state = self.state.lock().await;
        self.status_of(&state)
    }

    fn status_of(&self, state: &SessionState) -> RecordingStatus {
        RecordingStatus {
            is_recording: state.is_listening(),
            status: state.status_label().into(),
            error: state.error().map(str::to_string),
        }
    }
}

fn transcript_entry(record: &TurnRecord, course: &CourseId) -> TurnTranscriptEntry {
    let ts_unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;

    TurnTranscriptEntry {
        ts_unix_ms,
        course_id: Some(course.as_str().to_string()),
        transcript: record.transcript.clone().filter(|t| !t.is_empty()),
        answer: record.answer.clone().filter(|a| !a.is_empty()),
        stage: record
            .stage_label
            .clone()
            .unwrap_or_else(|| format!("{:?}", record.stage).to_lowercase()),
        error: record.error.clone(),
    }
}
