use crate::multipart;
use crate::request::{Body, HttpRequest, join_url, json_headers};
use serde_json::json;
use tutordesk_core::types::CourseId;

#[derive(Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub api_base_url: String,
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("api_base_url", &self.api_base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseUpsert {
    pub course_id: String,
    pub name: String,
    pub icon_url: Option<String>,
    pub description: Option<String>,
}

/// A transcript file queued for ingestion (typically `.vtt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub fn build_insights_request(cfg: &AdminConfig) -> HttpRequest {
    HttpRequest {
        method: "GET".into(),
        url: join_url(&cfg.api_base_url, "/admin/insights"),
        headers: json_headers(cfg.bearer_token.as_deref()),
        body: Body::Empty,
    }
}

pub fn build_create_course_request(cfg: &AdminConfig, course: &CourseUpsert) -> HttpRequest {
    let payload = json!({
        "courseId": course.course_id,
        "name": course.name,
        "iconUrl": course.icon_url,
        "description": course.description,
    });

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base_url, "/admin/courses"),
        headers: json_headers(cfg.bearer_token.as_deref()),
        body: Body::Json(payload.to_string()),
    }
}

pub fn build_delete_course_request(cfg: &AdminConfig, course: &CourseId) -> HttpRequest {
    HttpRequest {
        method: "DELETE".into(),
        url: join_url(&cfg.api_base_url, &format!("/admin/courses/{}", course.as_str())),
        headers: json_headers(cfg.bearer_token.as_deref()),
        body: Body::Empty,
    }
}

/// Ingestion upload: every transcript file under the repeated `files` part
/// plus the `forceRecreate` toggle.
pub fn build_ingest_request(
    cfg: &AdminConfig,
    course: &CourseId,
    files: &[IngestFile],
    force_recreate: bool,
) -> HttpRequest {
    let boundary = multipart::new_boundary();

    let mut body: Vec<u8> = Vec::new();
    for file in files {
        multipart::append_file(&mut body, &boundary, "files", &file.filename, "text/vtt", &file.bytes);
    }
    multipart::append_field(
        &mut body,
        &boundary,
        "forceRecreate",
        if force_recreate { "true" } else { "false" },
    );
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
        url: join_url(&cfg.api_base_url, &format!("/admin/ingest/{}", course.as_str())),
        headers,
        body: Body::MultipartFormData { boundary, bytes: body },
    }
}
