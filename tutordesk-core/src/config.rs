use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn api_segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/api($|/)").expect("valid api segment regex"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend root. May or may not already end in `/api`; use
    /// [`AppConfig::api_base`] for the normalized form.
    pub api_base_url: String,

    #[serde(default)]
    pub microphone_device: Option<String>,

    #[serde(default = "default_transcript_enabled")]
    pub transcript_enabled: bool,
}

fn default_transcript_enabled() -> bool {
    true
}

impl AppConfig {
    /// Normalized API base: trailing slash stripped, `/api` appended when the
    /// configured URL doesn't already route through it.
    pub fn api_base(&self) -> String {
        let trimmed = self.api_base_url.trim_end_matches('/');
        if api_segment_re().is_match(trimmed) {
            trimmed.to_string()
        } else {
            format!("{trimmed}/api")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(url: &str) -> AppConfig {
        AppConfig {
            api_base_url: url.into(),
            microphone_device: None,
            transcript_enabled: true,
        }
    }

    #[test]
    fn api_base_appends_api_segment() {
        assert_eq!(cfg("http://localhost:3000").api_base(), "http://localhost:3000/api");
        assert_eq!(cfg("http://localhost:3000/").api_base(), "http://localhost:3000/api");
    }

    #[test]
    fn api_base_keeps_existing_api_segment() {
        assert_eq!(cfg("https://tutor.example.com/api").api_base(), "https://tutor.example.com/api");
        assert_eq!(
            cfg("https://tutor.example.com/api/v2/").api_base(),
            "https://tutor.example.com/api/v2"
        );
    }
}
