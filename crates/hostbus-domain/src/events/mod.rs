//! Domain Events
//!
//! Events are immutable facts broadcast to interested listeners, either
//! in-process through the event bus or across the service host boundary.
//!
//! | Event | Description |
//! |-------|-------------|
//! | [`Event::StreamInit`] | Stream (re)established marker |
//! | [`ProgressEvent`] | Progress ratio and status text |
//! | [`SettingsChangedEvent`] | Settings version and changed values |
//! | [`TranslationsChangedEvent`] | Translation catalog update |

/// Event payload definitions
pub mod event;

pub use event::{
    Event, ProgressEvent, SettingsChangedEvent, SettingsData, TranslationCatalog,
    TranslationsChangedEvent,
};
