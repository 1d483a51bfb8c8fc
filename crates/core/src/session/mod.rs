use crate::{
    navigation::{click_ratio, Command, NavigationController, PreviousAction, TrackOptions},
    sync::{FrameHandle, FrameScheduler, TickOutcome},
    CatalogEntry, ClockSource, LoadOutcome, PlayOutcome, Player, PlayerConfig, RenderSink, Result,
    TrackCatalog, TrackSource,
};

/// What a dispatched command ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command changed menu or transport state only.
    Handled,
    Played(PlayOutcome),
    /// A track load ran; `Some` holds the result of the follow-up play.
    Loaded(LoadOutcome, Option<PlayOutcome>),
    /// Nothing to act on (empty catalog, unknown option).
    Ignored,
}

/// One user's player: catalog, menu, transport and track source.
///
/// Owned by the host and passed by reference to whatever drives it. There is
/// no ambient state anywhere in the crate.
#[derive(Debug)]
pub struct Session<S, C, R, F> {
    catalog: TrackCatalog,
    navigation: NavigationController,
    player: Player<C, R, F>,
    source: S,
    restart_threshold: f64,
    auto_advance: bool,
}

impl<S, C, R, F> Session<S, C, R, F>
where
    S: TrackSource,
    C: ClockSource,
    R: RenderSink,
    F: FrameScheduler,
{
    pub fn new(catalog: TrackCatalog, source: S, player: Player<C, R, F>) -> Self {
        let defaults = PlayerConfig::default();
        Self {
            catalog,
            navigation: NavigationController::new(),
            player,
            source,
            restart_threshold: defaults.restart_threshold_secs,
            auto_advance: defaults.auto_advance,
        }
    }

    pub fn with_config(config: &PlayerConfig, source: S, player: Player<C, R, F>) -> Self {
        Self {
            restart_threshold: config.restart_threshold_secs,
            auto_advance: config.auto_advance,
            ..Self::new(config.catalog(), source, player)
        }
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn player(&self) -> &Player<C, R, F> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player<C, R, F> {
        &mut self.player
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn track_options(&self) -> TrackOptions {
        self.navigation.track_options(&self.catalog)
    }

    /// Loads `entry` and moves the menu to its category.
    pub fn load_entry(&mut self, entry: CatalogEntry) -> LoadOutcome {
        self.navigation.follow(&entry);
        self.player.load(&self.source, entry)
    }

    /// Loads the n-th option of the current menu selection and plays it.
    pub fn load_selected(&mut self, index: usize) -> CommandOutcome {
        match self.navigation.selected_entry(&self.catalog, index) {
            Some(entry) => self.load_and_play(entry),
            None => CommandOutcome::Ignored,
        }
    }

    pub fn next_track(&mut self) -> CommandOutcome {
        let target = self
            .navigation
            .next_target(&self.catalog, self.player.current_entry());
        match target {
            Some(entry) => self.load_and_play(entry),
            None => CommandOutcome::Ignored,
        }
    }

    pub fn previous_track(&mut self) -> CommandOutcome {
        let action = self.navigation.previous_action(
            &self.catalog,
            self.player.current_entry(),
            self.player.position(),
            self.restart_threshold,
        );
        match action {
            PreviousAction::Restart => CommandOutcome::Played(self.player.restart()),
            PreviousAction::Load(entry) => self.load_and_play(entry),
            PreviousAction::Nothing => CommandOutcome::Ignored,
        }
    }

    /// Delivers a fired frame and advances past finished tracks.
    pub fn on_frame(&mut self, handle: FrameHandle) -> TickOutcome {
        let outcome = self.player.on_frame(handle);
        if outcome == TickOutcome::Ended && self.auto_advance {
            self.next_track();
        }
        outcome
    }

    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutcome> {
        let outcome = match command {
            Command::TogglePlay => match self.player.toggle() {
                Some(outcome) => CommandOutcome::Played(outcome),
                None => CommandOutcome::Handled,
            },
            Command::Previous => self.previous_track(),
            Command::Next => self.next_track(),
            Command::Stop => {
                self.player.stop();
                CommandOutcome::Handled
            }
            Command::LoadSelected(index) => self.load_selected(index),
            Command::Seek(seconds) => {
                self.player.seek(seconds);
                CommandOutcome::Handled
            }
            Command::SeekRatio(ratio) => {
                if self.player.seek_ratio(ratio) {
                    CommandOutcome::Handled
                } else {
                    CommandOutcome::Ignored
                }
            }
            Command::ClickProgress { offset, width } => match click_ratio(offset, width) {
                Some(ratio) if self.player.seek_ratio(ratio) => CommandOutcome::Handled,
                _ => CommandOutcome::Ignored,
            },
            Command::SetVolume(ratio) => {
                self.player.set_volume(ratio);
                CommandOutcome::Handled
            }
            Command::ClickVolume { offset, width } => match click_ratio(offset, width) {
                Some(ratio) => {
                    self.player.set_volume(ratio as f32);
                    CommandOutcome::Handled
                }
                None => CommandOutcome::Ignored,
            },
            Command::Mute => {
                self.player.mute();
                CommandOutcome::Handled
            }
            Command::MaxVolume => {
                self.player.max_volume();
                CommandOutcome::Handled
            }
            Command::SelectLevel(level) => {
                self.navigation.select_level(level);
                CommandOutcome::Handled
            }
            Command::SelectGrade(grade) => {
                self.navigation.select_grade(grade)?;
                CommandOutcome::Handled
            }
            Command::SelectSemester(semester) => {
                self.navigation.select_semester(semester)?;
                CommandOutcome::Handled
            }
        };
        Ok(outcome)
    }

    fn load_and_play(&mut self, entry: CatalogEntry) -> CommandOutcome {
        let loaded = self.load_entry(entry);
        let played = matches!(loaded, LoadOutcome::Ready).then(|| self.player.play());
        CommandOutcome::Loaded(loaded, played)
    }
}
