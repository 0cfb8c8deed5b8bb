use crate::multipart;
use crate::request::{Body, HttpRequest, join_url};
use tutordesk_core::types::{AudioFile, CourseId};

#[derive(Clone, PartialEq, Eq)]
pub struct VoiceTurnConfig {
    pub api_base_url: String,
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for VoiceTurnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceTurnConfig")
            .field("api_base_url", &self.api_base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// One voice turn: the captured clip as the `audio` file part plus the
/// selected course as the `courseId` field. Exactly one request per stop.
pub fn build_voice_turn_request(
    cfg: &VoiceTurnConfig,
    audio: &AudioFile,
    course: &CourseId,
) -> HttpRequest {
    let boundary = multipart::new_boundary();

    let mut body: Vec<u8> = Vec::new();
    multipart::append_file(
        &mut body,
        &boundary,
        "audio",
        &audio.filename,
        &audio.mime_type,
        &audio.bytes,
    );
    multipart::append_field(&mut body, &boundary, "courseId", course.as_str());
    multipart::close(&mut body, &boundary);

    let mut headers = vec![
        ("Content-Type".into(), multipart::content_type(&boundary)),
        ("Accept".into(), "application/json".into()),
    ];
    if let Some(token) = cfg.bearer_token.as_deref().filter(|t| !t.trim().is_empty()) {
        headers.push(("Authorization".into(), format!("Bearer {token}")));
    }

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base_url, "/voice/turn"),
        headers,
        body: Body::MultipartFormData { boundary, bytes: body },
    }
}
