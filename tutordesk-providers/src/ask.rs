use crate::request::{Body, HttpRequest, join_url, json_headers};
use serde_json::json;
use tutordesk_core::types::CourseId;

#[derive(Clone, PartialEq, Eq)]
pub struct AskConfig {
    pub api_base_url: String,
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AskConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskConfig")
            .field("api_base_url", &self.api_base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Text question against the retrieval backend. The course travels as
/// `coursename`; that asymmetry with the voice endpoint is the backend's.
pub fn build_ask_request(cfg: &AskConfig, query: &str, course: &CourseId) -> HttpRequest {
    let payload = json!({
        "query": query,
        "coursename": course.as_str(),
    });

    HttpRequest {
        method: "POST".into(),
        url: join_url(&cfg.api_base_url, "/ask"),
        headers: json_headers(cfg.bearer_token.as_deref()),
        body: Body::Json(payload.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_authorized_json_ask() {
        let cfg = AskConfig {
            api_base_url: "http://localhost:3000/api".into(),
            bearer_token: Some("tok".into()),
        };

        let req = build_ask_request(&cfg, "what is middleware", &CourseId::new("nodejs"));
        assert_eq!(req.method, "POST");
        assert!(req.url.ends_with("/ask"));
        assert_eq!(req.header("authorization"), Some("Bearer tok"));

        match req.body {
            Body::Json(s) => {
                assert!(s.contains("\"query\""));
                assert!(s.contains("\"coursename\":\"nodejs\""));
            }
            _ => panic!("expected json"),
        }
    }
}
