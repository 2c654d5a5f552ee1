//! Persisted document schema.
//!
//! Every record carries a flattened `extra` map so fields written by other
//! tools (or older revisions of the admin UI) survive a load/save cycle.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The single persisted aggregate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub items: Vec<Item>,

    #[serde(default, deserialize_with = "nullable_vec")]
    pub leads: Vec<Lead>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// A fresh document with the given site title and no records.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            settings: Settings {
                title: title.into(),
                extra: Map::new(),
            },
            ..Self::default()
        }
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Remove an item by id. Returns the removed item.
    pub fn remove_item(&mut self, id: &str) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Remove a lead by id. Returns the removed lead.
    pub fn remove_lead(&mut self, id: &str) -> Option<Lead> {
        let pos = self.leads.iter().position(|l| l.id == id)?;
        Some(self.leads.remove(pos))
    }

    /// Items visible to anonymous clients, in stored order.
    pub fn live_items(&self) -> Vec<Item> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Live)
            .cloned()
            .collect()
    }
}

/// Site-level settings. `title` is the only key the service itself reads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub title: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Moderation status of an item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemStatus {
    #[default]
    Pending,
    Live,
    Hidden,
    /// A status this service does not know, as found on disk. Never public.
    Unknown(String),
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Live => "live",
            ItemStatus::Hidden => "hidden",
            ItemStatus::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown item status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ItemStatus::Pending),
            "live" => Ok(ItemStatus::Live),
            "hidden" => Ok(ItemStatus::Hidden),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl Serialize for ItemStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// A hand-edited status this service does not know is carried through
// unchanged so that unrelated writes do not rewrite it.
impl<'de> Deserialize<'de> for ItemStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw {
            Some(s) => s.parse().unwrap_or(ItemStatus::Unknown(s)),
            None => ItemStatus::Pending,
        })
    }
}

/// A visitor-submitted contact record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub ua: String,
    #[serde(default)]
    pub tz: String,
    #[serde(default)]
    pub created_at: u64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
