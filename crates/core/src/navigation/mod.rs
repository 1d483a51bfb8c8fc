//! Menu selection and catalog traversal.
//!
//! Changing the menu only regenerates the list of selectable tracks. It
//! never touches playback; loading happens when the host acts on a
//! [`CatalogEntry`] returned from here.

use crate::{CatalogEntry, CatalogKey, PlayerError, Result, SchoolLevel, TrackCatalog, TrackDescriptor, SEMESTERS};

/// Current position of the level / grade / semester menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub level: SchoolLevel,
    pub grade: u8,
    pub semester: u8,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            level: SchoolLevel::Elementary,
            grade: 1,
            semester: 1,
        }
    }
}

impl Selection {
    pub fn key(&self) -> CatalogKey {
        CatalogKey {
            level: self.level,
            grade: self.grade,
            semester: self.semester,
        }
    }
}

/// Tracks offered for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOptions {
    pub key: CatalogKey,
    pub tracks: Vec<TrackDescriptor>,
}

impl TrackOptions {
    /// Whether the "load selected" control should be enabled.
    pub fn can_load(&self) -> bool {
        !self.tracks.is_empty()
    }
}

/// What the previous-track control should do.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviousAction {
    /// Rewind the current track.
    Restart,
    Load(CatalogEntry),
    /// The catalog is empty.
    Nothing,
}

/// Keys the player responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Maps a DOM-style key code (`"Space"`, `"ArrowLeft"`, ...).
    pub fn from_code(code: &str) -> Self {
        match code {
            "Space" => Key::Space,
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// Element holding keyboard focus when a key is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Document,
    TextInput,
    TextArea,
    Select,
}

impl Focus {
    fn captures_keys(self) -> bool {
        !matches!(self, Focus::Document)
    }
}

/// User intents dispatched by a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    TogglePlay,
    Previous,
    Next,
    Stop,
    /// Load the n-th track of the current options and play it.
    LoadSelected(usize),
    Seek(f64),
    /// Seek to a fraction of the track, as from a progress-bar click.
    SeekRatio(f64),
    /// Click at `offset` along a progress bar `width` wide.
    ClickProgress { offset: f64, width: f64 },
    SetVolume(f32),
    /// Click at `offset` along a volume bar `width` wide.
    ClickVolume { offset: f64, width: f64 },
    Mute,
    MaxVolume,
    SelectLevel(SchoolLevel),
    SelectGrade(u8),
    SelectSemester(u8),
}

/// Shortcut table; keys are ignored while a form control has focus.
pub fn command_for_key(key: Key, focus: Focus) -> Option<Command> {
    if focus.captures_keys() {
        return None;
    }
    match key {
        Key::Space => Some(Command::TogglePlay),
        Key::ArrowLeft => Some(Command::Previous),
        Key::ArrowRight => Some(Command::Next),
        Key::Other => None,
    }
}

/// Converts a click offset inside a horizontal bar to a `[0, 1]` ratio.
pub fn click_ratio(offset: f64, width: f64) -> Option<f64> {
    if !(width.is_finite() && width > 0.0) || offset.is_nan() {
        return None;
    }
    Some((offset / width).clamp(0.0, 1.0))
}

#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    selection: Selection,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Switches level and resets the grade to the first one.
    pub fn select_level(&mut self, level: SchoolLevel) {
        self.selection.level = level;
        self.selection.grade = 1;
    }

    pub fn select_grade(&mut self, grade: u8) -> Result<()> {
        if grade == 0 || grade > self.selection.level.grade_count() {
            return Err(PlayerError::InvalidInput("grade is out of range for level"));
        }
        self.selection.grade = grade;
        Ok(())
    }

    pub fn select_semester(&mut self, semester: u8) -> Result<()> {
        if semester == 0 || semester > SEMESTERS {
            return Err(PlayerError::InvalidInput("semester is out of range"));
        }
        self.selection.semester = semester;
        Ok(())
    }

    /// Grades offered at the selected level.
    pub fn grades(&self) -> Vec<u8> {
        self.selection.level.grades().collect()
    }

    pub fn track_options(&self, catalog: &TrackCatalog) -> TrackOptions {
        let key = self.selection.key();
        TrackOptions {
            key,
            tracks: catalog.lookup(&key).to_vec(),
        }
    }

    pub fn selected_entry(&self, catalog: &TrackCatalog, index: usize) -> Option<CatalogEntry> {
        let key = self.selection.key();
        catalog.lookup(&key).get(index).map(|descriptor| CatalogEntry {
            key,
            index,
            descriptor: descriptor.clone(),
        })
    }

    /// Moves the menu to the category of `entry`.
    pub fn follow(&mut self, entry: &CatalogEntry) {
        self.selection = Selection {
            level: entry.key.level,
            grade: entry.key.grade,
            semester: entry.key.semester,
        };
    }

    pub fn next_target(&self, catalog: &TrackCatalog, current: Option<&CatalogEntry>) -> Option<CatalogEntry> {
        catalog.next_entry(global_position(catalog, current))
    }

    /// Restarts when at least `threshold` seconds have elapsed, otherwise
    /// steps back to the prior catalog entry (wrapping to the last).
    pub fn previous_action(
        &self,
        catalog: &TrackCatalog,
        current: Option<&CatalogEntry>,
        elapsed: f64,
        threshold: f64,
    ) -> PreviousAction {
        if elapsed >= threshold {
            return PreviousAction::Restart;
        }
        match catalog.previous_entry(global_position(catalog, current)) {
            Some(entry) => PreviousAction::Load(entry),
            None => PreviousAction::Nothing,
        }
    }
}

fn global_position(catalog: &TrackCatalog, current: Option<&CatalogEntry>) -> Option<usize> {
    current.and_then(|entry| catalog.find_global_position(&entry.key, entry.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CatalogSection;

    fn catalog() -> TrackCatalog {
        TrackCatalog::new(vec![
            CatalogSection {
                key: "MiddleSchool1-1".parse().unwrap(),
                tracks: vec![TrackDescriptor::new("A", "a.json")],
            },
            CatalogSection {
                key: "MiddleSchool2-1".parse().unwrap(),
                tracks: vec![TrackDescriptor::new("B", "b.json"), TrackDescriptor::new("C", "c.json")],
            },
        ])
    }

    #[test]
    fn level_change_resets_grade() {
        let mut nav = NavigationController::new();
        nav.select_grade(5).unwrap();
        nav.select_semester(2).unwrap();
        nav.select_level(SchoolLevel::Middle);

        let selection = nav.selection();
        assert_eq!(selection.grade, 1);
        assert_eq!(selection.semester, 2);
        assert_eq!(nav.grades(), vec![1, 2, 3]);
        assert!(nav.select_grade(4).is_err());
        assert!(nav.select_semester(3).is_err());
    }

    #[test]
    fn options_follow_selection() {
        let catalog = catalog();
        let mut nav = NavigationController::new();
        assert!(!nav.track_options(&catalog).can_load());

        nav.select_level(SchoolLevel::Middle);
        nav.select_grade(2).unwrap();
        let options = nav.track_options(&catalog);
        assert!(options.can_load());
        assert_eq!(options.tracks.len(), 2);

        let entry = nav.selected_entry(&catalog, 1).unwrap();
        assert_eq!(entry.descriptor.title, "C");
        assert!(nav.selected_entry(&catalog, 2).is_none());
    }

    #[test]
    fn previous_restarts_after_threshold() {
        let catalog = catalog();
        let nav = NavigationController::new();
        let current = catalog.entry_at(0).unwrap();

        assert_eq!(nav.previous_action(&catalog, Some(&current), 1.5, 1.0), PreviousAction::Restart);
        assert_eq!(nav.previous_action(&catalog, Some(&current), 1.0, 1.0), PreviousAction::Restart);

        match nav.previous_action(&catalog, Some(&current), 0.5, 1.0) {
            PreviousAction::Load(entry) => assert_eq!(entry.descriptor.title, "C"),
            other => panic!("expected wrap to last entry, got {other:?}"),
        }

        let empty = TrackCatalog::default();
        assert_eq!(nav.previous_action(&empty, None, 0.0, 1.0), PreviousAction::Nothing);
    }

    #[test]
    fn next_crosses_categories_and_wraps() {
        let catalog = catalog();
        let nav = NavigationController::new();

        let first = nav.next_target(&catalog, None).unwrap();
        assert_eq!(first.descriptor.title, "A");
        let second = nav.next_target(&catalog, Some(&first)).unwrap();
        assert_eq!(second.key.to_string(), "MiddleSchool2-1");
        let last = catalog.entry_at(2).unwrap();
        assert_eq!(nav.next_target(&catalog, Some(&last)).unwrap().descriptor.title, "A");
    }

    #[test]
    fn follow_moves_menu_to_entry() {
        let catalog = catalog();
        let mut nav = NavigationController::new();
        nav.follow(&catalog.entry_at(1).unwrap());

        let selection = nav.selection();
        assert_eq!(selection.level, SchoolLevel::Middle);
        assert_eq!(selection.grade, 2);
        assert_eq!(selection.semester, 1);
    }

    #[test]
    fn shortcuts_ignore_form_focus() {
        assert_eq!(command_for_key(Key::from_code("Space"), Focus::Document), Some(Command::TogglePlay));
        assert_eq!(command_for_key(Key::ArrowLeft, Focus::Document), Some(Command::Previous));
        assert_eq!(command_for_key(Key::ArrowRight, Focus::Document), Some(Command::Next));
        assert_eq!(command_for_key(Key::from_code("KeyA"), Focus::Document), None);

        for focus in [Focus::TextInput, Focus::TextArea, Focus::Select] {
            assert_eq!(command_for_key(Key::Space, focus), None);
        }
    }

    #[test]
    fn click_ratio_clamps() {
        assert_eq!(click_ratio(50.0, 200.0), Some(0.25));
        assert_eq!(click_ratio(-10.0, 200.0), Some(0.0));
        assert_eq!(click_ratio(300.0, 200.0), Some(1.0));
        assert_eq!(click_ratio(10.0, 0.0), None);
    }
}
