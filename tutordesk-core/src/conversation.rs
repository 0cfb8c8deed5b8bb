use crate::types::{ChatMessage, MessageSource, ReplyKind, Sender};

/// Shown when the backend answered a turn but produced no text.
pub const THINKING_FALLBACK: &str = "Let me think about that and get back to you.";

/// Shown when the ask endpoint answered without a usable answer field.
pub const ANSWER_FALLBACK: &str =
    "I couldn't find an answer to that question. Please try rephrasing or ask something else.";

/// Append-only message sequence backing the chat surface.
///
/// Entries are never edited in place; the only removal is a full clear when
/// the active course changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn append(&mut self, entries: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(entries);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Builds the chat entries for one finished voice turn.
///
/// Zero or one user entry (only when a transcript came back), then exactly
/// one bot entry. Both share the same clock label and carry the voice source
/// tag. The synthesized audio payload rides on the bot entry only when the
/// reply kind is audio.
pub fn voice_turn_messages(
    transcript: &str,
    answer: &str,
    audio: Option<&str>,
    reply_kind: ReplyKind,
    ts_unix_ms: i64,
    clock: &str,
) -> Vec<ChatMessage> {
    let mut entries = Vec::with_capacity(2);

    if !transcript.trim().is_empty() {
        entries.push(
            ChatMessage::new(ts_unix_ms, Sender::User, transcript, clock)
                .with_source(MessageSource::Voice),
        );
    }

    let text = if answer.trim().is_empty() { THINKING_FALLBACK } else { answer };
    let mut bot = ChatMessage::new(ts_unix_ms + 1, Sender::Bot, text, clock)
        .with_source(MessageSource::Voice);

    if reply_kind == ReplyKind::Audio {
        if let Some(payload) = audio {
            bot = bot.with_audio(payload);
        }
    }

    entries.push(bot);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_and_answer_yield_user_then_bot() {
        let entries = voice_turn_messages(
            "what is middleware",
            "Middleware is...",
            None,
            ReplyKind::Text,
            1_000,
            "14:05",
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sender, Sender::User);
        assert_eq!(entries[0].text, "what is middleware");
        assert_eq!(entries[0].id, 1_000);
        assert_eq!(entries[1].sender, Sender::Bot);
        assert_eq!(entries[1].id, 1_001);
        assert_eq!(entries[0].timestamp, entries[1].timestamp);
        assert_eq!(entries[0].meta.source, Some(MessageSource::Voice));
        assert_eq!(entries[1].meta.source, Some(MessageSource::Voice));
    }

    #[test]
    fn empty_transcript_yields_bot_only() {
        let entries = voice_turn_messages("  ", "Hello!", None, ReplyKind::Text, 5, "09:00");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sender, Sender::Bot);
    }

    #[test]
    fn empty_answer_falls_back_to_placeholder() {
        let entries = voice_turn_messages("hi", "", None, ReplyKind::Text, 5, "09:00");
        assert_eq!(entries[1].text, THINKING_FALLBACK);
    }

    #[test]
    fn audio_payload_rides_on_audio_replies_only() {
        let with_audio =
            voice_turn_messages("hi", "answer", Some("UklGR..."), ReplyKind::Audio, 5, "09:00");
        assert_eq!(with_audio[1].audio.as_deref(), Some("UklGR..."));

        let text_only =
            voice_turn_messages("hi", "answer", Some("UklGR..."), ReplyKind::Text, 5, "09:00");
        assert_eq!(text_only[1].audio, None);
    }

    #[test]
    fn log_appends_in_order_and_clears_wholesale() {
        let mut log = ConversationLog::new();
        log.append(voice_turn_messages("q", "a", None, ReplyKind::Text, 10, "10:00"));
        log.append(voice_turn_messages("q2", "a2", None, ReplyKind::Text, 20, "10:01"));

        assert_eq!(log.len(), 4);
        assert!(log.messages().windows(2).all(|w| w[0].id <= w[1].id));

        log.clear();
        assert!(log.is_empty());
    }
}
