//! Event wire format
//!
//! Events cross process boundaries as length-delimited protobuf frames of
//! [`EventEnvelope`]. The envelope's `kind` oneof selects the event; tags
//! are part of the wire contract and must never be reused.
//!
//! ```text
//! message EventEnvelope {
//!   oneof kind {
//!     StreamInit          stream_init          = 1;
//!     Progress            progress             = 2;
//!     SettingsChanged     settings_changed     = 3;
//!     TranslationsChanged translations_changed = 4;
//!   }
//! }
//! ```

use crate::status::from_status;
use futures::{Stream, StreamExt};
use hostbus_application::ports::EventSource;
use hostbus_domain::error::{Error, Result};
use hostbus_domain::events::{
    Event, ProgressEvent, SettingsChangedEvent, SettingsData, TranslationCatalog,
    TranslationsChangedEvent,
};
use prost::Message;
use std::collections::BTreeMap;
use tonic::Status;

/// Top-level frame carrying exactly one event
#[derive(Clone, PartialEq, Message)]
pub struct EventEnvelope {
    /// The carried event
    #[prost(oneof = "event_envelope::Kind", tags = "1, 2, 3, 4")]
    pub kind: Option<event_envelope::Kind>,
}

/// Nested types of [`EventEnvelope`]
pub mod event_envelope {
    /// Event selector
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        /// Stream established marker
        #[prost(message, tag = "1")]
        StreamInit(super::StreamInitMessage),
        /// Progress report
        #[prost(message, tag = "2")]
        Progress(super::ProgressMessage),
        /// Settings changed
        #[prost(message, tag = "3")]
        SettingsChanged(super::SettingsChangedMessage),
        /// Translations changed
        #[prost(message, tag = "4")]
        TranslationsChanged(super::TranslationsChangedMessage),
    }
}

/// Stream established marker; no fields
#[derive(Clone, PartialEq, Message)]
pub struct StreamInitMessage {}

/// Progress report
#[derive(Clone, PartialEq, Message)]
pub struct ProgressMessage {
    #[prost(float, tag = "1")]
    pub progress: f32,
    #[prost(string, optional, tag = "2")]
    pub status_text: Option<String>,
}

/// One settings entry; an absent value is a null setting
#[derive(Clone, PartialEq, Message)]
pub struct SettingEntry {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

/// Settings snapshot
#[derive(Clone, PartialEq, Message)]
pub struct SettingsDataMessage {
    #[prost(message, repeated, tag = "1")]
    pub entries: Vec<SettingEntry>,
}

/// Settings changed
#[derive(Clone, PartialEq, Message)]
pub struct SettingsChangedMessage {
    #[prost(int64, tag = "1")]
    pub version: i64,
    #[prost(message, optional, tag = "2")]
    pub data: Option<SettingsDataMessage>,
}

/// Translated texts keyed by resource key
#[derive(Clone, PartialEq, Message)]
pub struct TranslationCatalogMessage {
    #[prost(btree_map = "string, string", tag = "1")]
    pub entries: BTreeMap<String, String>,
}

/// Translations changed
#[derive(Clone, PartialEq, Message)]
pub struct TranslationsChangedMessage {
    #[prost(string, tag = "1")]
    pub location: String,
    #[prost(string, tag = "2")]
    pub culture: String,
    #[prost(int64, tag = "3")]
    pub version: i64,
    #[prost(message, optional, tag = "4")]
    pub data: Option<TranslationCatalogMessage>,
}

impl From<&Event> for EventEnvelope {
    fn from(event: &Event) -> Self {
        use event_envelope::Kind;

        let kind = match event {
            Event::StreamInit => Kind::StreamInit(StreamInitMessage {}),
            Event::Progress(progress) => Kind::Progress(ProgressMessage {
                progress: progress.progress,
                status_text: progress.status_text.clone(),
            }),
            Event::SettingsChanged(settings) => Kind::SettingsChanged(SettingsChangedMessage {
                version: settings.version,
                data: settings.data.as_ref().map(|data| SettingsDataMessage {
                    entries: data
                        .iter()
                        .map(|(key, value)| SettingEntry {
                            key: key.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                }),
            }),
            Event::TranslationsChanged(translations) => {
                Kind::TranslationsChanged(TranslationsChangedMessage {
                    location: translations.location.clone(),
                    culture: translations.culture.clone(),
                    version: translations.version,
                    data: translations.data.as_ref().map(|catalog| TranslationCatalogMessage {
                        entries: catalog
                            .iter()
                            .map(|(key, text)| (key.to_string(), text.to_string()))
                            .collect(),
                    }),
                })
            }
        };
        Self { kind: Some(kind) }
    }
}

impl TryFrom<EventEnvelope> for Event {
    type Error = Error;

    fn try_from(envelope: EventEnvelope) -> Result<Self> {
        use event_envelope::Kind;

        let kind = envelope
            .kind
            .ok_or_else(|| Error::protocol("event frame carries no event"))?;
        Ok(match kind {
            Kind::StreamInit(_) => Event::StreamInit,
            Kind::Progress(progress) => {
                ProgressEvent::new(progress.progress, progress.status_text).into()
            }
            Kind::SettingsChanged(settings) => SettingsChangedEvent {
                version: settings.version,
                data: settings.data.map(|data| {
                    data.entries
                        .into_iter()
                        .map(|entry| (entry.key, entry.value))
                        .collect::<SettingsData>()
                }),
            }
            .into(),
            Kind::TranslationsChanged(translations) => TranslationsChangedEvent {
                location: translations.location,
                culture: translations.culture,
                version: translations.version,
                data: translations
                    .data
                    .map(|catalog| catalog.entries.into_iter().collect::<TranslationCatalog>()),
            }
            .into(),
        })
    }
}

/// Encode one event as a length-delimited frame
pub fn encode_event(event: &Event) -> Vec<u8> {
    EventEnvelope::from(event).encode_length_delimited_to_vec()
}

/// Decode one length-delimited frame
pub fn decode_event(frame: &[u8]) -> Result<Event> {
    let envelope = EventEnvelope::decode_length_delimited(frame)
        .map_err(|err| Error::protocol(format!("malformed event frame: {err}")))?;
    Event::try_from(envelope)
}

/// Turn a stream of received frames into an event source for a hub
///
/// Status errors are translated back into domain errors.
pub fn event_source<S>(frames: S) -> EventSource
where
    S: Stream<Item = std::result::Result<Vec<u8>, Status>> + Send + 'static,
{
    frames
        .map(|frame| match frame {
            Ok(bytes) => decode_event(&bytes),
            Err(status) => Err(from_status(&status)),
        })
        .boxed()
}
