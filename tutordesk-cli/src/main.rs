use std::path::PathBuf;
use std::sync::Arc;

use tutordesk_appcore::{AppService, SilentPlayback, SpeakerPlayback};
use tutordesk_core::types::{Course, CourseId, Quota, ReplyKind, TurnOutcome, TurnReply};
use tutordesk_engine::traits::CourseDirectory;
use tutordesk_runtime::voice::{MockTurnClient, wav_audio_file};

struct DemoDirectory;

#[async_trait::async_trait]
impl CourseDirectory for DemoDirectory {
    async fn list_courses(&self) -> anyhow::Result<Vec<Course>> {
        Ok(vec![
            Course {
                id: CourseId::new("nodejs"),
                name: "Node.js".into(),
                icon_url: Some("/nodeicon.svg".into()),
                description: "Server-side JavaScript runtime".into(),
            },
            Course {
                id: CourseId::new("python"),
                name: "Python".into(),
                icon_url: Some("/pythonicon.svg".into()),
                description: "Versatile programming language".into(),
            },
        ])
    }
}

fn demo_turn_outcome() -> TurnOutcome {
    TurnOutcome::Completed(TurnReply {
        transcript: "what is express middleware".into(),
        answer: "Middleware functions sit between the request and your route handler.".into(),
        audio: None,
        reply_kind: ReplyKind::Text,
        greeting: false,
        quota: Some(Quota { limit: 10, remaining: 9 }),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Demo behavior: run one end-to-end turn plus a text ask.
    // With TUTORDESK_API_BASE set, everything goes against the real backend;
    // otherwise the turn is served by a scripted client so no network or
    // microphone is needed.

    let data_dir = std::env::var("TUTORDESK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".tutordesk"));
    let config_path = data_dir.join("config.json");

    let api_base = std::env::var("TUTORDESK_API_BASE").ok().filter(|s| !s.trim().is_empty());

    let svc = match &api_base {
        Some(base) => {
            let svc = AppService::new(config_path, Arc::new(SpeakerPlayback));
            let mut cfg = tutordesk_runtime::defaults::default_app_config();
            cfg.api_base_url = base.clone();
            svc.save_config(&cfg)?;
            svc
        }
        None => AppService::new(config_path, Arc::new(SilentPlayback))
            .with_turn_client(Arc::new(MockTurnClient { outcome: demo_turn_outcome() }))
            .with_course_directory(Arc::new(DemoDirectory)),
    };

    if let Some(user) = svc.hydrate_session().await {
        println!("signed in as {}", tutordesk_core::text::display_name(&user));
    }

    let courses = svc.refresh_courses().await?;
    println!("courses:");
    for course in &courses {
        println!("  {} ({})", course.name, course.id.as_str());
    }
    println!(
        "selected: {}",
        svc.selected_course()
            .await
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| "none".into())
    );

    // One second of silence stands in for a recorded question; with a real
    // backend the transcript simply comes back empty.
    let clip = wav_audio_file(&vec![0.0_f32; 16_000], 16_000);
    let response = svc.run_turn(clip).await;

    println!("turn stage={}", response.stage);
    if let Some(transcript) = &response.transcript {
        println!("  heard: {transcript}");
    }
    if let Some(answer) = &response.answer {
        println!("  answer: {answer}");
    }
    if let Some(error) = &response.error {
        println!("  error: {error}");
    }
    if let Some(quota) = response.quota {
        println!("  quota: {}/{} remaining", quota.remaining, quota.limit);
    }

    if api_base.is_some() {
        if let Some(exchange) = svc.ask("What is the event loop?").await {
            for message in &exchange.messages {
                println!("[{:?}] {}", message.sender, message.text);
            }
        }
    }

    println!("chat log has {} entries", svc.messages().await.len());

    Ok(())
}
