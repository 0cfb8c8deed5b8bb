use tutordesk_core::config::AppConfig;

pub fn default_app_config() -> AppConfig {
    AppConfig {
        // Development backend; deployments overwrite this on first save.
        api_base_url: "http://localhost:3000/api".into(),
        microphone_device: None,
        transcript_enabled: true,
    }
}
