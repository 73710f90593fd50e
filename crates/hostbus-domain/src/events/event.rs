//! Event payloads exchanged between producers and listeners
//!
//! Events are immutable once constructed and carry no identity beyond their
//! variant and payload. They are created by domain handlers or by the stream
//! connection machinery and consumed by any number of listeners.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings snapshot carried by [`SettingsChangedEvent`]; values may be null
pub type SettingsData = BTreeMap<String, Option<String>>;

/// Notification broadcast to interested listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Marker emitted when an event stream has been (re)established
    StreamInit,
    /// Long-running operation progress
    Progress(ProgressEvent),
    /// Settings were changed
    SettingsChanged(SettingsChangedEvent),
    /// Translations for a location/culture were changed
    TranslationsChanged(TranslationsChangedEvent),
}

impl Event {
    /// Stable name of the event variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StreamInit => "StreamInit",
            Self::Progress(_) => "Progress",
            Self::SettingsChanged(_) => "SettingsChanged",
            Self::TranslationsChanged(_) => "TranslationsChanged",
        }
    }

    /// Whether this is the stream-established marker
    pub fn is_stream_init(&self) -> bool {
        matches!(self, Self::StreamInit)
    }
}

/// Progress of a long-running operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion ratio, conventionally in `0.0..=1.0`
    pub progress: f32,
    /// Optional human readable status
    pub status_text: Option<String>,
}

impl ProgressEvent {
    /// Create a progress event
    pub fn new(progress: f32, status_text: Option<String>) -> Self {
        Self {
            progress,
            status_text,
        }
    }
}

/// Settings were changed at `version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsChangedEvent {
    /// Settings version after the change
    pub version: i64,
    /// Changed values; `None` when only the version is announced
    pub data: Option<SettingsData>,
}

/// Translations were changed for a location and culture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationsChangedEvent {
    /// Location (resource set) the translations belong to
    pub location: String,
    /// Culture name, e.g. `en-US`
    pub culture: String,
    /// Catalog version after the change
    pub version: i64,
    /// New catalog; `None` when consumers must reload it themselves
    pub data: Option<TranslationCatalog>,
}

/// Translated texts keyed by resource key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationCatalog {
    entries: BTreeMap<String, String>,
}

impl TranslationCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a translation
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a translation
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of translations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, text)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationCatalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<ProgressEvent> for Event {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress(event)
    }
}

impl From<SettingsChangedEvent> for Event {
    fn from(event: SettingsChangedEvent) -> Self {
        Self::SettingsChanged(event)
    }
}

impl From<TranslationsChangedEvent> for Event {
    fn from(event: TranslationsChangedEvent) -> Self {
        Self::TranslationsChanged(event)
    }
}
