//! Input sanitization for public submissions and admin edits.
//!
//! All text is trimmed and truncated (by characters) before any policy check,
//! so oversized payloads never reach the document.

use serde_json::Value;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::catalog::model::{now_millis, Item, ItemStatus, Lead, Settings};

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_URL_CHARS: usize = 1_000;
pub const MAX_ICON_CHARS: usize = 1_500_000;
pub const MAX_DESC_CHARS: usize = 800;
pub const MAX_CATEGORIES: usize = 10;
pub const MAX_CATEGORY_CHARS: usize = 40;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_CHARS: usize = 32;

pub const MAX_EMAIL_CHARS: usize = 254;
pub const MAX_NAME_CHARS: usize = 120;
pub const MAX_MESSAGE_CHARS: usize = 5_000;
pub const MAX_UA_CHARS: usize = 512;
pub const MAX_TZ_CHARS: usize = 64;

const ICON_DATA_PREFIXES: [&str; 3] = [
    "data:image/png;base64,",
    "data:image/jpeg;base64,",
    "data:image/webp;base64,",
];

/// Why a payload was rejected. The display string is shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Link must start with {prefix}...")]
    InvalidLink { prefix: String },

    #[error("Icon must be an http(s) URL or data:image/*;base64 URL")]
    InvalidIcon,

    #[error("Status must be one of pending, live, hidden")]
    InvalidStatus,

    #[error("Email and message required")]
    MissingContact,

    #[error("Invalid email address")]
    InvalidEmail,
}

/// Sanitized item fields, before policy checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub title: String,
    pub url: String,
    pub icon: String,
    pub desc: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl ItemDraft {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            title: text(payload, "title", MAX_TITLE_CHARS),
            url: text(payload, "url", MAX_URL_CHARS),
            icon: text(payload, "icon", MAX_ICON_CHARS),
            desc: text(payload, "desc", MAX_DESC_CHARS),
            categories: list(payload, "categories", MAX_CATEGORIES, MAX_CATEGORY_CHARS),
            tags: list(payload, "tags", MAX_TAGS, MAX_TAG_CHARS),
        }
    }
}

/// Link and icon policy applied to every item entering the catalog.
#[derive(Debug, Clone)]
pub struct SubmissionPolicy {
    link_prefix: String,
}

impl SubmissionPolicy {
    pub fn new(link_prefix: impl Into<String>) -> Self {
        Self {
            link_prefix: link_prefix.into(),
        }
    }

    pub fn link_prefix(&self) -> &str {
        &self.link_prefix
    }

    pub fn check_draft(&self, draft: &ItemDraft) -> Result<(), InputError> {
        if draft.title.is_empty() {
            return Err(InputError::MissingTitle);
        }
        self.check_link(&draft.url)?;
        check_icon(&draft.icon)
    }

    fn check_link(&self, link: &str) -> Result<(), InputError> {
        let prefix_ok = link
            .get(..self.link_prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&self.link_prefix));
        if prefix_ok && Url::parse(link).is_ok() {
            Ok(())
        } else {
            Err(InputError::InvalidLink {
                prefix: self.link_prefix.clone(),
            })
        }
    }

    /// Build an item from an anonymous submission.
    ///
    /// Status and `featured` are forced regardless of what the caller sent.
    pub fn accept_submission(&self, payload: &Value, submitter: &str) -> Result<Item, InputError> {
        let draft = ItemDraft::from_payload(payload);
        self.check_draft(&draft)?;
        Ok(new_item(draft, ItemStatus::Pending, false, Some(submitter.to_string())))
    }

    /// Build an item from an admin create request. Status defaults to `live`.
    pub fn accept_admin_item(&self, payload: &Value) -> Result<Item, InputError> {
        let draft = ItemDraft::from_payload(payload);
        self.check_draft(&draft)?;
        let status = match payload.get("status") {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                s.parse().map_err(|_| InputError::InvalidStatus)?
            }
            _ => ItemStatus::Live,
        };
        let featured = flag(payload, "featured").unwrap_or(false);
        Ok(new_item(draft, status, featured, None))
    }

    /// Merge the fields present in `payload` into `item`.
    ///
    /// Either every present field is applied or none is. `id`, `createdAt`
    /// and `submittedBy` are never touched.
    pub fn apply_update(&self, item: &mut Item, payload: &Value) -> Result<(), InputError> {
        let mut next = item.clone();
        if payload.get("title").is_some() {
            next.title = text(payload, "title", MAX_TITLE_CHARS);
        }
        if payload.get("url").is_some() {
            next.url = text(payload, "url", MAX_URL_CHARS);
        }
        if payload.get("icon").is_some() {
            next.icon = text(payload, "icon", MAX_ICON_CHARS);
        }
        if payload.get("desc").is_some() {
            next.desc = text(payload, "desc", MAX_DESC_CHARS);
        }
        if payload.get("categories").is_some() {
            next.categories = list(payload, "categories", MAX_CATEGORIES, MAX_CATEGORY_CHARS);
        }
        if payload.get("tags").is_some() {
            next.tags = list(payload, "tags", MAX_TAGS, MAX_TAG_CHARS);
        }
        if let Some(featured) = flag(payload, "featured") {
            next.featured = featured;
        }
        if let Some(status) = payload.get("status") {
            next.status = status
                .as_str()
                .and_then(|s| s.parse().ok())
                .ok_or(InputError::InvalidStatus)?;
        }

        let draft = ItemDraft {
            title: next.title.clone(),
            url: next.url.clone(),
            icon: next.icon.clone(),
            ..ItemDraft::default()
        };
        self.check_draft(&draft)?;

        *item = next;
        Ok(())
    }
}

fn new_item(draft: ItemDraft, status: ItemStatus, featured: bool, submitted_by: Option<String>) -> Item {
    Item {
        id: Uuid::new_v4().to_string(),
        title: draft.title,
        url: draft.url,
        icon: draft.icon,
        desc: draft.desc,
        categories: draft.categories,
        tags: draft.tags,
        featured,
        status,
        created_at: now_millis(),
        submitted_by,
        ..Item::default()
    }
}

fn check_icon(icon: &str) -> Result<(), InputError> {
    if icon.is_empty() {
        return Ok(());
    }
    let inline = ICON_DATA_PREFIXES.iter().any(|prefix| {
        icon.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    });
    if inline {
        return Ok(());
    }
    match Url::parse(icon) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(InputError::InvalidIcon),
    }
}

/// Build a lead from a public contact submission.
pub fn accept_lead(payload: &Value, client_id: &str, user_agent: Option<&str>) -> Result<Lead, InputError> {
    let email = text(payload, "email", MAX_EMAIL_CHARS);
    let message = text(payload, "message", MAX_MESSAGE_CHARS);
    if email.is_empty() || message.is_empty() {
        return Err(InputError::MissingContact);
    }
    if !is_plausible_email(&email) {
        return Err(InputError::InvalidEmail);
    }

    let mut ua = text(payload, "ua", MAX_UA_CHARS);
    if ua.is_empty() {
        ua = truncate(user_agent.unwrap_or_default().trim(), MAX_UA_CHARS);
    }

    Ok(Lead {
        id: Uuid::new_v4().to_string(),
        email,
        name: text(payload, "name", MAX_NAME_CHARS),
        message,
        ip: client_id.to_string(),
        ua,
        tz: text(payload, "tz", MAX_TZ_CHARS),
        created_at: now_millis(),
        ..Lead::default()
    })
}

/// Merge an admin settings payload into the document settings.
///
/// `title` is sanitized like an item title; other keys are stored verbatim.
pub fn merge_settings(settings: &mut Settings, payload: &Value) -> Result<(), InputError> {
    let Some(fields) = payload.as_object() else {
        return Ok(());
    };
    for (key, value) in fields {
        if key == "title" {
            let title = text(payload, "title", MAX_TITLE_CHARS);
            if title.is_empty() {
                return Err(InputError::MissingTitle);
            }
            settings.title = title;
        } else {
            settings.extra.insert(key.clone(), value.clone());
        }
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

fn text(payload: &Value, key: &str, max_chars: usize) -> String {
    let raw = payload.get(key).map(scalar).unwrap_or_default();
    truncate(raw.trim(), max_chars)
}

fn list(payload: &Value, key: &str, max_items: usize, max_chars: usize) -> Vec<String> {
    let raw: Vec<String> = match payload.get(key) {
        Some(Value::Array(values)) => values.iter().map(scalar).collect(),
        // Form posts send comma separated values.
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    raw.iter()
        .map(|s| truncate(s.trim(), max_chars))
        .filter(|s| !s.is_empty())
        .take(max_items)
        .collect()
}

fn flag(payload: &Value, key: &str) -> Option<bool> {
    match payload.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => Some(matches!(s.trim(), "true" | "1" | "on" | "yes")),
        Value::Number(n) => Some(n.as_i64() != Some(0)),
        _ => None,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => s[..end].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> SubmissionPolicy {
        SubmissionPolicy::new("https://chatgpt.com/g/")
    }

    #[test]
    fn test_submission_rejections() {
        let p = policy();
        assert_eq!(
            p.accept_submission(&json!({ "title": "", "url": "https://chatgpt.com/g/x" }), "1.2.3.4"),
            Err(InputError::MissingTitle)
        );
        assert!(matches!(
            p.accept_submission(&json!({ "title": "A", "url": "https://example.com/x" }), "1.2.3.4"),
            Err(InputError::InvalidLink { .. })
        ));
        assert_eq!(
            p.accept_submission(
                &json!({ "title": "A", "url": "https://chatgpt.com/g/x", "icon": "ftp://x" }),
                "1.2.3.4"
            ),
            Err(InputError::InvalidIcon)
        );
        assert_eq!(
            p.accept_submission(
                &json!({ "title": "A", "url": "https://chatgpt.com/g/x", "icon": "data:image/gif;base64,AAAA" }),
                "1.2.3.4"
            ),
            Err(InputError::InvalidIcon)
        );
    }

    #[test]
    fn test_submission_forces_moderation_fields() {
        let item = policy()
            .accept_submission(
                &json!({
                    "title": "  Helper  ",
                    "url": "HTTPS://ChatGPT.com/g/g-123",
                    "icon": "data:image/PNG;base64,iVBORw0",
                    "status": "live",
                    "featured": true,
                    "categories": ["a", " b ", ""],
                    "tags": "x, y"
                }),
                "9.9.9.9",
            )
            .unwrap();
        assert_eq!(item.title, "Helper");
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(!item.featured);
        assert_eq!(item.submitted_by.as_deref(), Some("9.9.9.9"));
        assert_eq!(item.categories, vec!["a", "b"]);
        assert_eq!(item.tags, vec!["x", "y"]);
        assert!(!item.id.is_empty());
        assert!(item.created_at > 0);
    }

    #[test]
    fn test_truncation_limits() {
        let long_title = "t".repeat(500);
        let tags: Vec<String> = (0..50).map(|i| format!("{i}{}", "z".repeat(100))).collect();
        let item = policy()
            .accept_submission(
                &json!({ "title": long_title, "url": "https://chatgpt.com/g/x", "tags": tags }),
                "ip",
            )
            .unwrap();
        assert_eq!(item.title.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(item.tags.len(), MAX_TAGS);
        assert!(item.tags.iter().all(|t| t.chars().count() == MAX_TAG_CHARS));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("ab", 10), "ab");
    }

    #[test]
    fn test_admin_item_and_update() {
        let p = policy();
        let mut item = p
            .accept_admin_item(&json!({ "title": "A", "url": "https://chatgpt.com/g/a", "featured": "true" }))
            .unwrap();
        assert_eq!(item.status, ItemStatus::Live);
        assert!(item.featured);
        assert!(item.submitted_by.is_none());

        let before = item.clone();
        assert_eq!(
            p.apply_update(&mut item, &json!({ "desc": "new", "status": "archived" })),
            Err(InputError::InvalidStatus)
        );
        assert_eq!(item, before);

        assert_eq!(
            p.apply_update(&mut item, &json!({ "title": "   " })),
            Err(InputError::MissingTitle)
        );
        assert_eq!(item, before);

        p.apply_update(&mut item, &json!({ "desc": "new", "status": "hidden", "id": "other" }))
            .unwrap();
        assert_eq!(item.desc, "new");
        assert_eq!(item.status, ItemStatus::Hidden);
        assert_eq!(item.id, before.id);
        assert_eq!(item.title, "A");
    }

    #[test]
    fn test_lead_validation() {
        assert_eq!(
            accept_lead(&json!({ "email": "a@b.co" }), "ip", None),
            Err(InputError::MissingContact)
        );
        assert_eq!(
            accept_lead(&json!({ "email": "not-an-email", "message": "hi" }), "ip", None),
            Err(InputError::InvalidEmail)
        );
        assert_eq!(
            accept_lead(&json!({ "email": "a b@c.com", "message": "hi" }), "ip", None),
            Err(InputError::InvalidEmail)
        );

        let lead = accept_lead(
            &json!({ "email": " someone@example.com ", "message": "hello", "tz": "UTC" }),
            "5.6.7.8",
            Some("curl/8"),
        )
        .unwrap();
        assert_eq!(lead.email, "someone@example.com");
        assert_eq!(lead.ip, "5.6.7.8");
        assert_eq!(lead.ua, "curl/8");
        assert_eq!(lead.tz, "UTC");
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = Settings::default();
        merge_settings(&mut settings, &json!({ "title": "Shop", "accent": "#fff" })).unwrap();
        assert_eq!(settings.title, "Shop");
        assert_eq!(settings.extra["accent"], json!("#fff"));
        assert_eq!(
            merge_settings(&mut settings, &json!({ "title": "" })),
            Err(InputError::MissingTitle)
        );
    }
}
