use crate::types::UserProfile;
use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::OnceLock;

fn non_alnum_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"))
}

fn edge_dashes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-+|-+$").expect("valid trim regex"))
}

/// Lowercase URL-safe slug, capped at 60 chars. Returns `None` when nothing
/// slug-worthy survives.
pub fn slugify(value: &str) -> Option<String> {
    let lowered = value.trim().to_lowercase();
    let dashed = non_alnum_re().replace_all(&lowered, "-");
    let trimmed = edge_dashes_re().replace_all(&dashed, "");

    let mut slug = trimmed.to_string();
    slug.truncate(60);

    if slug.is_empty() { None } else { Some(slug) }
}

/// Display name precedence: first+last name, then username, then email,
/// then a generic fallback.
pub fn display_name(user: &UserProfile) -> String {
    match (user.firstname.as_deref(), user.lastname.as_deref()) {
        (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
            return format!("{first} {last}");
        }
        _ => {}
    }

    if let Some(username) = user.username.as_deref().filter(|s| !s.is_empty()) {
        return username.to_string();
    }

    user.email
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "User".into())
}

/// Stable per-user slug for routing and storage keys.
pub fn user_slug(user: &UserProfile) -> Option<String> {
    let full_name = [user.firstname.as_deref(), user.lastname.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let primary = user
        .username
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| (!full_name.is_empty()).then_some(full_name))
        .or_else(|| {
            user.email
                .as_deref()
                .and_then(|e| e.split('@').next())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .or_else(|| user.id.as_ref().map(|id| format!("user-{id}")))
        .unwrap_or_else(|| "user".into());

    slugify(&primary).or_else(|| user.id.clone())
}

/// Short clock label shown next to chat entries.
pub fn clock_label(at: DateTime<Local>) -> String {
    at.format("%H:%M").to_string()
}
