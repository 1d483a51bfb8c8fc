//! Keeps the caption surfaces in lockstep with the playback clock.
//!
//! The loop owns the [`SlideIndex`] of the loaded track and a
//! [`PlaybackSession`]. Each frame it reads the clock, resolves the active
//! slide and renders only when that slide changes. The time readout is
//! refreshed on every frame.
//!
//! Frames are requested one at a time through a [`FrameScheduler`]. A new
//! frame is only requested after the previous one has finished, and a frame
//! whose handle is not the outstanding one is ignored, so ticks never overlap
//! and a cancelled frame can never fire into a newer session.

mod frames;

pub use frames::{FrameHandle, FrameScheduler, ManualFrames};

use crate::{ClockSource, RenderSink, SlideIndex, TimeReadout};

/// Mutable state of the loop between frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSession {
    /// Index of the slide currently on screen, `None` while idle.
    pub active: Option<usize>,
    pub is_playing: bool,
    /// Outstanding frame request, if polling.
    pub poll: Option<FrameHandle>,
}

/// Result of delivering a frame to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame was processed and the next one requested.
    Continue,
    /// The clock reported the end of the audio; the loop stopped itself.
    Ended,
    /// The frame was cancelled or belongs to an earlier request.
    Ignored,
}

#[derive(Debug, Default)]
pub struct SyncLoop {
    slides: SlideIndex,
    session: PlaybackSession,
}

impl SyncLoop {
    pub fn new(slides: SlideIndex) -> Self {
        Self {
            slides,
            session: PlaybackSession::default(),
        }
    }

    pub fn slides(&self) -> &SlideIndex {
        &self.slides
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn active_index(&self) -> Option<usize> {
        self.session.active
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing
    }

    /// Swaps in a new track's slides and discards every trace of the
    /// previous session, including any pending frame.
    pub fn replace_slides<F: FrameScheduler>(&mut self, slides: SlideIndex, frames: &mut F) {
        self.cancel_poll(frames);
        self.slides = slides;
        self.session = PlaybackSession::default();
    }

    /// Resolves the active slide for `position` and renders on change.
    ///
    /// Returns `true` when a render was issued.
    pub fn apply_position<R: RenderSink>(&mut self, position: f64, sink: &mut R) -> bool {
        let active = self.slides.active_index(position);
        if active == self.session.active {
            return false;
        }

        self.session.active = active;
        match active.and_then(|index| self.slides.get(index).map(|slide| (index, slide))) {
            Some((index, slide)) => {
                tracing::trace!(index, position, "slide transition");
                sink.show_slide(index, slide);
            }
            None => sink.show_placeholder(),
        }
        true
    }

    /// Reads the clock once, re-resolving the slide and the readout.
    pub fn on_tick<C: ClockSource, R: RenderSink>(&mut self, clock: &C, sink: &mut R) -> bool {
        let position = clock.position();
        let changed = self.apply_position(position, sink);
        sink.update_readout(&TimeReadout::new(position, clock.duration()));
        changed
    }

    /// Moves the clock and resolves the slide for the new position, in
    /// either direction and whether or not playback is running.
    pub fn on_seek<C: ClockSource, R: RenderSink>(
        &mut self,
        position: f64,
        clock: &mut C,
        sink: &mut R,
    ) -> bool {
        clock.seek(position);
        self.on_tick(clock, sink)
    }

    /// Begins polling. Any earlier frame request is cancelled first.
    pub fn start<F: FrameScheduler>(&mut self, frames: &mut F) {
        self.cancel_poll(frames);
        self.session.is_playing = true;
        self.session.poll = Some(frames.request_frame());
    }

    /// Halts polling and keeps the current slide on screen.
    pub fn pause<F: FrameScheduler>(&mut self, frames: &mut F) {
        self.cancel_poll(frames);
        self.session.is_playing = false;
    }

    /// Halts polling, rewinds the clock and returns the surfaces to idle.
    pub fn stop<C: ClockSource, R: RenderSink, F: FrameScheduler>(
        &mut self,
        clock: &mut C,
        sink: &mut R,
        frames: &mut F,
    ) {
        clock.pause();
        self.pause(frames);
        clock.seek(0.0);
        self.session.active = None;
        sink.show_placeholder();
        sink.update_readout(&TimeReadout::new(clock.position(), clock.duration()));
        sink.set_playing(false);
    }

    /// Handles a fired frame request.
    pub fn on_frame<C: ClockSource, R: RenderSink, F: FrameScheduler>(
        &mut self,
        handle: FrameHandle,
        clock: &mut C,
        sink: &mut R,
        frames: &mut F,
    ) -> TickOutcome {
        if self.session.poll != Some(handle) {
            return TickOutcome::Ignored;
        }
        self.session.poll = None;
        if !self.session.is_playing {
            return TickOutcome::Ignored;
        }

        self.on_tick(clock, sink);
        if clock.has_ended() {
            tracing::debug!("playback reached the end of the track");
            self.stop(clock, sink, frames);
            return TickOutcome::Ended;
        }

        self.session.poll = Some(frames.request_frame());
        TickOutcome::Continue
    }

    fn cancel_poll<F: FrameScheduler>(&mut self, frames: &mut F) {
        if let Some(handle) = self.session.poll.take() {
            frames.cancel_frame(handle);
        }
    }
}
