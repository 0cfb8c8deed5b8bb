use tutordesk_core::conversation::ANSWER_FALLBACK;
use tutordesk_core::text::clock_label;
use tutordesk_core::types::{ChatMessage, CourseId, MessageSource, Sender};
use tutordesk_engine::session::QuotaUpdate;
use tutordesk_providers::ask::{AskConfig, build_ask_request};
use tutordesk_providers::parse::{AskOutcome, parse_ask_outcome};

/// The chat entries and quota movement produced by one text question.
#[derive(Debug, Clone, PartialEq)]
pub struct AskExchange {
    // User entry first, then the bot entry (answer or error text).
    pub messages: Vec<ChatMessage>,
    pub quota_update: QuotaUpdate,
    pub failed: bool,
}

#[derive(Clone)]
pub struct AskClient {
    api_base_url: String,
    bearer_token: Option<String>,
}

impl std::fmt::Debug for AskClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskClient")
            .field("api_base_url", &self.api_base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn hiccup(message: &str) -> String {
    format!("Sorry, I ran into a hiccup: {message}. Please try again.")
}

impl AskClient {
    pub fn new(api_base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            bearer_token,
        }
    }

    /// Send one text question. Infallible by design: failures (including
    /// transport faults) come back as a bot-visible error entry so the chat
    /// never silently swallows a question the user already sees on screen.
    pub async fn send(&self, query: &str, course: &CourseId) -> AskExchange {
        let now = chrono::Local::now();
        let ts = now.timestamp_millis();
        let clock = clock_label(now);

        let user = ChatMessage::new(ts, Sender::User, query, &clock).with_source(MessageSource::Chat);

        let cfg = AskConfig {
            api_base_url: self.api_base_url.clone(),
            bearer_token: self.bearer_token.clone(),
        };
        let req = build_ask_request(&cfg, query, course);

        let (bot, quota_update, failed) = match tutordesk_providers::runtime::execute(&req).await {
            Ok(resp) => match parse_ask_outcome(resp.status, &resp.body) {
                AskOutcome::Answered { answer, quota } => {
                    let text = answer.unwrap_or_else(|| ANSWER_FALLBACK.into());
                    let bot = ChatMessage::new(ts + 1, Sender::Bot, text, &clock)
                        .with_source(MessageSource::Chat);
                    (bot, QuotaUpdate::Overwrite(quota), false)
                }

                AskOutcome::Failed { status, message, quota, quota_present } => {
                    let friendly = message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| format!("request failed with status {status}"));

                    // 429 messages are shown verbatim; everything else gets
                    // the apologetic wrapper.
                    let text = if status == 429 { friendly } else { hiccup(&friendly) };

                    let bot = ChatMessage::new(ts + 1, Sender::Bot, text, &clock)
                        .with_source(MessageSource::Chat)
                        .with_error_status(Some(status));

                    let quota_update = if quota_present {
                        QuotaUpdate::Overwrite(quota)
                    } else {
                        QuotaUpdate::Keep
                    };

                    (bot, quota_update, true)
                }
            },

            Err(e) => {
                log::warn!("ask request failed: {e:#}");
                let bot = ChatMessage::new(ts + 1, Sender::Bot, hiccup(&e.to_string()), &clock)
                    .with_source(MessageSource::Chat)
                    .with_error_status(None);
                (bot, QuotaUpdate::Keep, true)
            }
        };

        AskExchange {
            messages: vec![user, bot],
            quota_update,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutordesk_core::types::Quota;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn answered_question_appends_user_then_bot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .and(body_string_contains("coursename"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"ragAnswer":"Middleware is...","quota":{"limit":10,"remaining":6}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = AskClient::new(server.uri(), Some("tok".into()));
        let exchange = client.send("what is middleware", &CourseId::new("nodejs")).await;

        assert!(!exchange.failed);
        assert_eq!(exchange.messages.len(), 2);
        assert_eq!(exchange.messages[0].sender, Sender::User);
        assert_eq!(exchange.messages[1].text, "Middleware is...");
        assert_eq!(
            exchange.quota_update,
            QuotaUpdate::Overwrite(Some(Quota { limit: 10, remaining: 6 }))
        );
    }

    #[tokio::test]
    async fn missing_answer_uses_the_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{}"#, "application/json"))
            .mount(&server)
            .await;

        let client = AskClient::new(server.uri(), None);
        let exchange = client.send("hello?", &CourseId::new("python")).await;

        assert_eq!(exchange.messages[1].text, ANSWER_FALLBACK);
        assert_eq!(exchange.quota_update, QuotaUpdate::Overwrite(None));
    }

    #[tokio::test]
    async fn quota_exhaustion_shows_the_server_message_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(ResponseTemplate::new(429).set_body_raw(
                r#"{"message":"Daily limit reached","quota":{"limit":10,"remaining":0}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = AskClient::new(server.uri(), None);
        let exchange = client.send("one more", &CourseId::new("nodejs")).await;

        assert!(exchange.failed);
        assert_eq!(exchange.messages[1].text, "Daily limit reached");
        assert!(exchange.messages[1].meta.error);
        assert_eq!(exchange.messages[1].meta.status, Some(429));
        assert_eq!(
            exchange.quota_update,
            QuotaUpdate::Overwrite(Some(Quota { limit: 10, remaining: 0 }))
        );
    }

    #[tokio::test]
    async fn other_failures_get_the_hiccup_wrapper() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ask"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_raw(r#"{"message":"vector index offline"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = AskClient::new(server.uri(), None);
        let exchange = client.send("q", &CourseId::new("nodejs")).await;

        assert_eq!(
            exchange.messages[1].text,
            "Sorry, I ran into a hiccup: vector index offline. Please try again."
        );
        // No quota key in the failure body: the cell must not move.
        assert_eq!(exchange.quota_update, QuotaUpdate::Keep);
    }

    #[tokio::test]
    async fn transport_failure_still_produces_a_bot_entry() {
        let client = AskClient::new("http://127.0.0.1:1/api", None);
        let exchange = client.send("q", &CourseId::new("nodejs")).await;

        assert!(exchange.failed);
        assert_eq!(exchange.messages.len(), 2);
        assert!(exchange.messages[1].text.starts_with("Sorry, I ran into a hiccup:"));
        assert_eq!(exchange.messages[1].meta.status, None);
    }
}
