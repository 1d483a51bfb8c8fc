//! Core library for the synchronized lyrics and formula player.
//!
//! A track is a piece of audio plus a time-ordered list of slides (caption
//! text and an optional formula). While the audio plays, the
//! [`sync::SyncLoop`] polls the [`ClockSource`] once per frame and pushes
//! the active slide to a [`RenderSink`] whenever it changes. The surrounding
//! modules cover the static [`TrackCatalog`], menu navigation and loading
//! track metadata with stale-result rejection.
//!
//! Platform pieces (audio output, display surfaces, frame callbacks) stay
//! behind traits so that a browser, native or headless host can drive the
//! same [`Session`].

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod navigation;
pub mod player;
pub mod render;
pub mod session;
pub mod slides;
pub mod sync;
pub mod track;

pub use catalog::{CatalogEntry, CatalogKey, CatalogSection, SchoolLevel, TrackCatalog, TrackDescriptor, SEMESTERS};
pub use clock::{ClockSource, ManualClock};
pub use config::{PlaceholderText, PlayerConfig};
pub use error::{PlayerError, Result};
pub use navigation::{
    click_ratio, command_for_key, Command, Focus, Key, NavigationController, PreviousAction, Selection,
    TrackOptions,
};
pub use player::{fetch_track, FetchedTrack, LoadOutcome, LoadedTrack, PendingLoad, PendingPlay, PlayOutcome, Player};
pub use render::{
    format_clock, present_formula, FormulaMarkup, FormulaRenderer, NowPlaying, RecordingSink, RenderEvent,
    RenderSink, TimeReadout, UnicodeFormula,
};
pub use session::{CommandOutcome, Session};
pub use slides::{Slide, SlideIndex};
pub use sync::{FrameHandle, FrameScheduler, ManualFrames, PlaybackSession, SyncLoop, TickOutcome};
pub use track::{encode_component, resource_url, AudioRef, FsTrackSource, LoadGate, LoadTicket, TrackData, TrackSource};
