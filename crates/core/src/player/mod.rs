use crate::{
    sync::{FrameHandle, FrameScheduler, PlaybackSession, SyncLoop, TickOutcome},
    AudioRef, CatalogEntry, ClockSource, LoadGate, LoadTicket, NowPlaying, RenderSink, Result,
    SlideIndex, TimeReadout, TrackData, TrackSource,
};

/// Track metadata together with its resolved audio reference.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTrack {
    pub data: TrackData,
    pub audio: AudioRef,
}

/// Fetches an entry's metadata and resolves its audio reference.
///
/// This is the part of a load that may run off the player; its result is
/// handed back through [`Player::complete_load`].
pub fn fetch_track<S: TrackSource + ?Sized>(source: &S, entry: &CatalogEntry) -> Result<FetchedTrack> {
    let data = source.fetch(&entry.key, &entry.descriptor.data_ref)?;
    let audio = source.audio_ref(&entry.key, &data.audio_file);
    Ok(FetchedTrack { data, audio })
}

/// A load that has been requested but not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLoad {
    pub ticket: LoadTicket,
    pub entry: CatalogEntry,
}

/// A play request waiting for the clock to confirm or refuse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPlay {
    pub ticket: LoadTicket,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTrack {
    pub entry: CatalogEntry,
    pub data: TrackData,
    pub audio: AudioRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Slides and audio are in place; playback is enabled.
    Ready,
    /// Slides loaded but the clock could not resolve the audio.
    AudioUnavailable,
    /// Metadata could not be fetched or decoded; nothing is loaded.
    Failed,
    /// A newer load was requested meanwhile; the result was discarded.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    AlreadyPlaying,
    /// No playable track is loaded.
    Unavailable,
    /// The clock refused to start.
    Rejected,
    /// A load, pause or stop happened while the request was pending.
    Stale,
}

/// Playback half of a session: clock, surfaces, frame source and the
/// synchronization loop, all owned here and nowhere else.
#[derive(Debug)]
pub struct Player<C, R, F> {
    clock: C,
    sink: R,
    frames: F,
    sync: SyncLoop,
    gate: LoadGate,
    plays: LoadGate,
    current: Option<CatalogEntry>,
    track: Option<LoadedTrack>,
    audio_ready: bool,
}

impl<C, R, F> Player<C, R, F>
where
    C: ClockSource,
    R: RenderSink,
    F: FrameScheduler,
{
    pub fn new(clock: C, mut sink: R, frames: F) -> Self {
        sink.show_placeholder();
        sink.show_now_playing(&NowPlaying::none());
        sink.set_playing(false);
        sink.set_play_enabled(false);
        sink.update_readout(&TimeReadout::zero());

        Self {
            clock,
            sink,
            frames,
            sync: SyncLoop::default(),
            gate: LoadGate::new(),
            plays: LoadGate::new(),
            current: None,
            track: None,
            audio_ready: false,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut R {
        &mut self.sink
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }

    pub fn session(&self) -> &PlaybackSession {
        self.sync.session()
    }

    pub fn slides(&self) -> &SlideIndex {
        self.sync.slides()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.sync.active_index()
    }

    pub fn is_playing(&self) -> bool {
        self.sync.is_playing()
    }

    pub fn position(&self) -> f64 {
        self.clock.position()
    }

    pub fn track(&self) -> Option<&LoadedTrack> {
        self.track.as_ref()
    }

    /// The catalog entry most recently applied, even if its load failed.
    pub fn current_entry(&self) -> Option<&CatalogEntry> {
        self.current.as_ref()
    }

    pub fn can_play(&self) -> bool {
        self.track.is_some() && self.audio_ready
    }

    /// Registers a new load; every earlier pending load becomes stale.
    pub fn begin_load(&mut self, entry: CatalogEntry) -> PendingLoad {
        let ticket = self.gate.issue();
        self.plays.issue();
        tracing::debug!(ticket = ticket.value(), key = %entry.key, title = %entry.descriptor.title, "track load requested");
        PendingLoad { ticket, entry }
    }

    /// Applies a finished fetch, unless a newer load superseded it.
    pub fn complete_load(&mut self, pending: PendingLoad, fetched: Result<FetchedTrack>) -> LoadOutcome {
        if !self.gate.is_current(pending.ticket) {
            tracing::debug!(ticket = pending.ticket.value(), key = %pending.entry.key, "discarding stale track load");
            return LoadOutcome::Stale;
        }

        let PendingLoad { entry, .. } = pending;
        self.current = Some(entry.clone());

        let fetched = fetched.and_then(|fetched| {
            let slides = fetched.data.slide_index()?;
            Ok((fetched, slides))
        });

        let outcome = match fetched {
            Ok((fetched, slides)) => {
                self.sync.replace_slides(slides, &mut self.frames);
                let outcome = match self.clock.load(&fetched.audio) {
                    Ok(()) => {
                        self.audio_ready = true;
                        tracing::info!(key = %entry.key, title = %fetched.data.title, slides = self.sync.slides().len(), "track ready");
                        LoadOutcome::Ready
                    }
                    Err(err) => {
                        self.audio_ready = false;
                        self.clock.unload();
                        tracing::warn!(%err, key = %entry.key, "audio unavailable, playback disabled");
                        LoadOutcome::AudioUnavailable
                    }
                };
                self.sink.show_now_playing(&NowPlaying::from_track(&fetched.data));
                self.track = Some(LoadedTrack {
                    entry,
                    data: fetched.data,
                    audio: fetched.audio,
                });
                outcome
            }
            Err(err) => {
                tracing::warn!(%err, key = %entry.key, data_ref = %entry.descriptor.data_ref, "failed to load track");
                self.clear_track();
                LoadOutcome::Failed
            }
        };

        self.sink.set_play_enabled(self.audio_ready);
        self.stop();
        outcome
    }

    /// Requests, fetches and applies a track in one step.
    pub fn load<S: TrackSource + ?Sized>(&mut self, source: &S, entry: CatalogEntry) -> LoadOutcome {
        let pending = self.begin_load(entry);
        let fetched = fetch_track(source, &pending.entry);
        self.complete_load(pending, fetched)
    }

    /// Drops the loaded track and disables playback.
    pub fn unload(&mut self) {
        // Outstanding loads must not resurrect the track.
        self.gate.issue();
        self.current = None;
        self.clear_track();
        self.sink.set_play_enabled(false);
        self.stop();
    }

    /// Starts playback, issuing the clock request and applying its answer
    /// in one step.
    pub fn play(&mut self) -> PlayOutcome {
        if !self.can_play() {
            return PlayOutcome::Unavailable;
        }
        if self.sync.is_playing() {
            return PlayOutcome::AlreadyPlaying;
        }

        let pending = self.begin_play();
        let started = self.clock.play();
        self.complete_play(pending, started)
    }

    /// Registers a play request. The host then asks the clock to start and
    /// reports the answer through [`Player::complete_play`].
    pub fn begin_play(&mut self) -> PendingPlay {
        let ticket = self.plays.issue();
        tracing::debug!(ticket = ticket.value(), "play requested");
        PendingPlay { ticket }
    }

    /// Applies the clock's answer to a play request.
    ///
    /// Any load, unload, pause or stop since [`Player::begin_play`] makes the
    /// request stale, and the loop is left alone.
    pub fn complete_play(&mut self, pending: PendingPlay, started: Result<()>) -> PlayOutcome {
        if !self.plays.is_current(pending.ticket) {
            tracing::debug!(ticket = pending.ticket.value(), "discarding stale play request");
            return PlayOutcome::Stale;
        }
        if !self.can_play() {
            return PlayOutcome::Unavailable;
        }

        match started {
            Ok(()) if self.sync.is_playing() => PlayOutcome::AlreadyPlaying,
            Ok(()) => {
                self.sync.start(&mut self.frames);
                self.sink.set_playing(true);
                PlayOutcome::Started
            }
            Err(err) => {
                tracing::error!(%err, "play failed");
                PlayOutcome::Rejected
            }
        }
    }

    pub fn pause(&mut self) {
        self.plays.issue();
        self.clock.pause();
        self.sync.pause(&mut self.frames);
        self.sink.set_playing(false);
    }

    pub fn toggle(&mut self) -> Option<PlayOutcome> {
        if self.sync.is_playing() {
            self.pause();
            None
        } else {
            Some(self.play())
        }
    }

    pub fn stop(&mut self) {
        self.plays.issue();
        self.sync.stop(&mut self.clock, &mut self.sink, &mut self.frames);
    }

    /// Rewinds the current track, starting playback if it was paused.
    pub fn restart(&mut self) -> PlayOutcome {
        self.seek(0.0);
        if self.sync.is_playing() {
            PlayOutcome::AlreadyPlaying
        } else {
            self.play()
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        self.sync.on_seek(seconds, &mut self.clock, &mut self.sink);
    }

    /// Seeks to a fraction of the duration, e.g. from a progress-bar click.
    ///
    /// Ignored while the duration is unknown.
    pub fn seek_ratio(&mut self, ratio: f64) -> bool {
        match self.clock.duration() {
            Some(duration) if duration.is_finite() && duration > 0.0 && !ratio.is_nan() => {
                self.seek(ratio.clamp(0.0, 1.0) * duration);
                true
            }
            _ => false,
        }
    }

    pub fn volume(&self) -> f32 {
        self.clock.volume()
    }

    pub fn set_volume(&mut self, ratio: f32) {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        self.clock.set_volume(ratio);
    }

    pub fn mute(&mut self) {
        self.set_volume(0.0);
    }

    pub fn max_volume(&mut self) {
        self.set_volume(1.0);
    }

    /// Delivers a fired frame to the synchronization loop.
    pub fn on_frame(&mut self, handle: FrameHandle) -> TickOutcome {
        self.sync
            .on_frame(handle, &mut self.clock, &mut self.sink, &mut self.frames)
    }

    fn clear_track(&mut self) {
        self.track = None;
        self.audio_ready = false;
        self.clock.unload();
        self.sync.replace_slides(SlideIndex::empty(), &mut self.frames);
        self.sink.show_now_playing(&NowPlaying::none());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CatalogKey, ManualClock, ManualFrames, PlayerError, RecordingSink, Slide, TrackDescriptor,
    };

    type TestPlayer = Player<ManualClock, RecordingSink, ManualFrames>;

    fn player() -> TestPlayer {
        Player::new(ManualClock::with_duration(30.0), RecordingSink::new(), ManualFrames::new())
    }

    fn entry(key: &str, index: usize, title: &str) -> CatalogEntry {
        CatalogEntry {
            key: key.parse::<CatalogKey>().unwrap(),
            index,
            descriptor: TrackDescriptor::new(title, format!("{title}.json")),
        }
    }

    fn fetched(title: &str, times: &[f64]) -> Result<FetchedTrack> {
        Ok(FetchedTrack {
            data: TrackData {
                title: title.to_string(),
                artist: "Class".to_string(),
                grade: "Middle 1-1".to_string(),
                audio_file: format!("{title}.mp3"),
                slides: times.iter().map(|t| Slide::new(*t, format!("{title} {t}"))).collect(),
            },
            audio: AudioRef::url(format!("music/{title}.mp3")),
        })
    }

    fn ready_player(times: &[f64]) -> TestPlayer {
        let mut player = player();
        let pending = player.begin_load(entry("MiddleSchool1-1", 0, "a"));
        assert_eq!(player.complete_load(pending, fetched("a", times)), LoadOutcome::Ready);
        player
    }

    #[test]
    fn fresh_player_shows_idle_surfaces() {
        let player = player();
        assert_eq!(player.sink().transitions(), vec![None]);
        assert_eq!(player.sink().last_readout(), Some(TimeReadout::zero()));
        assert_eq!(player.sink().playing(), Some(false));
        assert!(player.sink().now_playing().unwrap().is_none());
    }

    #[test]
    fn play_requires_loaded_track() {
        let mut player = player();
        assert_eq!(player.play(), PlayOutcome::Unavailable);
        assert!(!player.is_playing());
        assert_eq!(player.sink().play_enabled(), Some(false));
    }

    #[test]
    fn loads_and_plays() {
        let mut player = ready_player(&[0.0, 5.0]);
        assert_eq!(player.sink().play_enabled(), Some(true));
        assert_eq!(player.sink().now_playing().unwrap().title, "a");

        assert_eq!(player.play(), PlayOutcome::Started);
        assert_eq!(player.play(), PlayOutcome::AlreadyPlaying);

        let handle = player.frames_mut().take_pending().unwrap();
        assert_eq!(player.on_frame(handle), TickOutcome::Continue);
        assert_eq!(player.active_index(), Some(0));

        player.clock_mut().advance(6.0);
        let handle = player.frames_mut().take_pending().unwrap();
        player.on_frame(handle);
        assert_eq!(player.active_index(), Some(1));
    }

    #[test]
    fn stale_fetch_does_not_overwrite_newer_track() {
        let mut player = player();
        let first = player.begin_load(entry("MiddleSchool1-1", 0, "a"));
        let second = player.begin_load(entry("MiddleSchool2-1", 0, "b"));

        assert_eq!(player.complete_load(second, fetched("b", &[0.0])), LoadOutcome::Ready);
        assert_eq!(player.complete_load(first, fetched("a", &[0.0, 1.0, 2.0])), LoadOutcome::Stale);

        let track = player.track().unwrap();
        assert_eq!(track.data.title, "b");
        assert_eq!(player.slides().len(), 1);
        assert_eq!(player.current_entry().unwrap().descriptor.title, "b");
    }

    #[test]
    fn failed_fetch_disables_playback() {
        let mut player = ready_player(&[0.0]);
        player.play();

        let pending = player.begin_load(entry("MiddleSchool2-1", 0, "b"));
        let outcome = player.complete_load(pending, Err(PlayerError::msg("HTTP 404")));

        assert_eq!(outcome, LoadOutcome::Failed);
        assert!(player.track().is_none());
        assert!(player.slides().is_empty());
        assert!(!player.is_playing());
        assert_eq!(player.play(), PlayOutcome::Unavailable);
        assert_eq!(player.sink().play_enabled(), Some(false));
        assert!(player.sink().now_playing().unwrap().is_none());
        assert_eq!(player.current_entry().unwrap().descriptor.title, "b");
    }

    #[test]
    fn invalid_slides_count_as_failed_load() {
        let mut player = player();
        let pending = player.begin_load(entry("MiddleSchool1-1", 0, "a"));
        assert_eq!(player.complete_load(pending, fetched("a", &[-3.0])), LoadOutcome::Failed);
        assert!(!player.can_play());
    }

    #[test]
    fn missing_audio_leaves_playback_disabled() {
        let mut player = Player::new(
            ManualClock::with_duration(10.0).verify_files(),
            RecordingSink::new(),
            ManualFrames::new(),
        );
        let pending = player.begin_load(entry("MiddleSchool1-1", 0, "a"));

        assert_eq!(player.complete_load(pending, fetched("a", &[0.0])), LoadOutcome::AudioUnavailable);
        assert!(player.track().is_some());
        assert!(player.clock().source().is_none());
        assert_eq!(player.clock().duration(), None);
        assert_eq!(player.play(), PlayOutcome::Unavailable);
        assert_eq!(player.sink().play_enabled(), Some(false));
    }

    #[test]
    fn rejected_play_stays_stopped() {
        let mut player = ready_player(&[0.0]);
        player.clock_mut().set_reject_play(true);

        assert_eq!(player.play(), PlayOutcome::Rejected);
        assert!(!player.is_playing());
        assert!(player.frames().pending().is_none());
    }

    #[test]
    fn play_completing_after_track_switch_is_discarded() {
        let mut player = ready_player(&[0.0, 1.0]);
        let pending = player.begin_play();

        let load = player.begin_load(entry("MiddleSchool2-1", 0, "b"));
        player.complete_load(load, fetched("b", &[0.0]));

        assert_eq!(player.complete_play(pending, Ok(())), PlayOutcome::Stale);
        assert!(!player.is_playing());
        assert!(player.frames().pending().is_none());
        assert_eq!(player.sink().playing(), Some(false));
    }

    #[test]
    fn play_completing_after_pause_or_stop_is_discarded() {
        let mut player = ready_player(&[0.0]);

        let pending = player.begin_play();
        player.pause();
        assert_eq!(player.complete_play(pending, Ok(())), PlayOutcome::Stale);
        assert!(!player.is_playing());

        let pending = player.begin_play();
        player.stop();
        assert_eq!(player.complete_play(pending, Ok(())), PlayOutcome::Stale);
        assert!(player.frames().pending().is_none());

        let pending = player.begin_play();
        assert_eq!(player.complete_play(pending, Ok(())), PlayOutcome::Started);
        assert!(player.is_playing());
        assert!(player.frames().pending().is_some());
    }

    #[test]
    fn only_latest_play_request_starts_the_loop() {
        let mut player = ready_player(&[0.0]);
        let first = player.begin_play();
        let second = player.begin_play();

        assert_eq!(
            player.complete_play(second, Err(PlayerError::PlaybackRejected("denied".to_string()))),
            PlayOutcome::Rejected
        );
        assert_eq!(player.complete_play(first, Ok(())), PlayOutcome::Stale);
        assert!(!player.is_playing());
    }

    #[test]
    fn switching_tracks_mid_playback_resets_session() {
        let mut player = ready_player(&[0.0, 1.0]);
        player.play();
        player.seek(2.0);
        assert_eq!(player.active_index(), Some(1));

        let pending = player.begin_load(entry("MiddleSchool2-1", 0, "b"));
        player.complete_load(pending, fetched("b", &[4.0]));

        assert_eq!(player.session(), &PlaybackSession::default());
        assert!(player.frames().pending().is_none());
        assert_eq!(player.position(), 0.0);
    }

    #[test]
    fn seek_ratio_needs_known_duration() {
        let mut player = ready_player(&[0.0, 15.0]);
        assert!(player.seek_ratio(0.5));
        assert_eq!(player.position(), 15.0);
        assert_eq!(player.active_index(), Some(1));

        assert!(player.seek_ratio(2.0));
        assert_eq!(player.position(), 30.0);

        player.clock_mut().set_duration(None);
        assert!(!player.seek_ratio(0.1));
        assert_eq!(player.position(), 30.0);
    }

    #[test]
    fn restart_rewinds_and_plays() {
        let mut player = ready_player(&[0.0, 5.0]);
        player.seek(6.0);
        assert_eq!(player.restart(), PlayOutcome::Started);
        assert_eq!(player.position(), 0.0);
        assert_eq!(player.active_index(), Some(0));
    }

    #[test]
    fn toggle_and_volume() {
        let mut player = ready_player(&[0.0]);
        assert_eq!(player.toggle(), Some(PlayOutcome::Started));
        assert_eq!(player.toggle(), None);
        assert!(!player.is_playing());
        assert_eq!(player.sink().playing(), Some(false));

        player.set_volume(0.4);
        assert_eq!(player.volume(), 0.4);
        player.mute();
        assert_eq!(player.volume(), 0.0);
        player.max_volume();
        assert_eq!(player.volume(), 1.0);
    }

    #[test]
    fn unload_discards_pending_loads() {
        let mut player = ready_player(&[0.0]);
        let pending = player.begin_load(entry("MiddleSchool2-1", 0, "b"));
        player.unload();

        assert_eq!(player.complete_load(pending, fetched("b", &[0.0])), LoadOutcome::Stale);
        assert!(player.track().is_none());
        assert!(player.current_entry().is_none());
    }
}
