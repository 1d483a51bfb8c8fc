use crate::{AudioRef, PlayerError, Result};

/// Media-playback primitive the player is synchronized to.
///
/// Implementations own decoding and output. The player only reads the
/// position and issues transport commands.
pub trait ClockSource {
    /// Points the clock at new audio, rewinding to zero.
    fn load(&mut self, audio: &AudioRef) -> Result<()>;

    /// Drops the current audio reference, if any.
    fn unload(&mut self);

    /// Begins playback. May be refused by the platform.
    ///
    /// A platform that answers later reports through
    /// [`Player::complete_play`](crate::Player::complete_play) instead.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Total length in seconds, once known.
    fn duration(&self) -> Option<f64>;

    fn seek(&mut self, seconds: f64);

    /// Whether playback ran to the end of the audio.
    fn has_ended(&self) -> bool;

    /// Output volume in `[0, 1]`.
    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);
}

/// Deterministic clock advanced explicitly by the host.
///
/// Used by headless hosts and tests in place of a real media element.
#[derive(Debug, Clone)]
pub struct ManualClock {
    source: Option<AudioRef>,
    position: f64,
    duration: Option<f64>,
    playing: bool,
    volume: f32,
    verify_files: bool,
    reject_play: bool,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            source: None,
            position: 0.0,
            duration: None,
            playing: false,
            volume: 1.0,
            verify_files: false,
            reject_play: false,
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that reports `seconds` as the length of any loaded audio.
    ///
    /// A negative or non-finite length leaves the duration unknown.
    pub fn with_duration(seconds: f64) -> Self {
        Self {
            duration: usable_duration(Some(seconds)),
            ..Self::default()
        }
    }

    /// Fails [`ClockSource::load`] when the audio's on-disk path is missing.
    pub fn verify_files(mut self) -> Self {
        self.verify_files = true;
        self
    }

    /// Refuses every [`ClockSource::play`] request while set.
    pub fn set_reject_play(&mut self, reject: bool) {
        self.reject_play = reject;
    }

    pub fn set_duration(&mut self, seconds: Option<f64>) {
        self.duration = usable_duration(seconds);
    }

    pub fn source(&self) -> Option<&AudioRef> {
        self.source.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Moves the playhead forward while playing, stopping at the end.
    pub fn advance(&mut self, delta: f64) {
        if !self.playing || self.source.is_none() {
            return;
        }

        self.position = (self.position + delta).max(0.0);
        if let Some(duration) = self.duration {
            if self.position >= duration {
                self.position = duration;
                self.playing = false;
            }
        }
    }
}

fn usable_duration(seconds: Option<f64>) -> Option<f64> {
    seconds.filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

impl ClockSource for ManualClock {
    fn load(&mut self, audio: &AudioRef) -> Result<()> {
        self.playing = false;
        self.position = 0.0;

        if self.verify_files && !audio.path.as_ref().is_some_and(|path| path.is_file()) {
            self.source = None;
            return Err(PlayerError::AudioUnavailable(audio.url.clone()));
        }

        self.source = Some(audio.clone());
        Ok(())
    }

    fn unload(&mut self) {
        self.source = None;
        self.playing = false;
        self.position = 0.0;
    }

    fn play(&mut self) -> Result<()> {
        if self.source.is_none() {
            return Err(PlayerError::PlaybackRejected("no audio loaded".to_string()));
        }
        if self.reject_play {
            return Err(PlayerError::PlaybackRejected(
                "playback requires a user gesture".to_string(),
            ));
        }
        if self.has_ended() {
            self.position = 0.0;
        }

        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        self.source.as_ref().and(self.duration)
    }

    fn seek(&mut self, seconds: f64) {
        let mut target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if let Some(duration) = self.duration {
            target = target.min(duration);
        }
        self.position = target;
    }

    fn has_ended(&self) -> bool {
        match (self.source.as_ref(), self.duration) {
            (Some(_), Some(duration)) => self.position >= duration,
            _ => false,
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_while_playing() {
        let mut clock = ManualClock::with_duration(10.0);
        clock.load(&AudioRef::url("a.mp3")).unwrap();

        clock.advance(1.0);
        assert_eq!(clock.position(), 0.0);

        clock.play().unwrap();
        clock.advance(2.5);
        assert_eq!(clock.position(), 2.5);
    }

    #[test]
    fn stops_at_end_and_replays_from_start() {
        let mut clock = ManualClock::with_duration(3.0);
        clock.load(&AudioRef::url("a.mp3")).unwrap();
        clock.play().unwrap();
        clock.advance(5.0);

        assert!(clock.has_ended());
        assert!(!clock.is_playing());
        assert_eq!(clock.position(), 3.0);

        clock.play().unwrap();
        assert_eq!(clock.position(), 0.0);
        assert!(!clock.has_ended());
    }

    #[test]
    fn play_without_audio_is_rejected() {
        let mut clock = ManualClock::new();
        assert!(matches!(clock.play(), Err(PlayerError::PlaybackRejected(_))));
    }

    #[test]
    fn verified_load_requires_existing_file() {
        let mut clock = ManualClock::new().verify_files();
        let missing = AudioRef {
            url: "music/x.mp3".to_string(),
            path: Some("/definitely/not/here.mp3".into()),
        };

        let err = clock.load(&missing).unwrap_err();
        assert!(format!("{err}").contains("music/x.mp3"));
        assert!(clock.source().is_none());
    }

    #[test]
    fn seek_and_volume_are_clamped() {
        let mut clock = ManualClock::with_duration(8.0);
        clock.load(&AudioRef::url("a.mp3")).unwrap();

        clock.seek(12.0);
        assert_eq!(clock.position(), 8.0);
        clock.seek(-1.0);
        assert_eq!(clock.position(), 0.0);

        clock.set_volume(1.5);
        assert_eq!(clock.volume(), 1.0);
        clock.set_volume(-0.2);
        assert_eq!(clock.volume(), 0.0);
    }

    #[test]
    fn unusable_durations_are_unknown() {
        let mut clock = ManualClock::with_duration(f64::NAN);
        clock.load(&AudioRef::url("a.mp3")).unwrap();
        assert_eq!(clock.duration(), None);

        clock.set_duration(Some(f64::INFINITY));
        assert_eq!(clock.duration(), None);
        clock.set_duration(Some(-2.0));
        assert_eq!(clock.duration(), None);
        clock.set_duration(Some(4.0));
        assert_eq!(clock.duration(), Some(4.0));
    }
}
