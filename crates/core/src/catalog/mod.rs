//! Static track catalog keyed by school level, grade and semester.
//!
//! The catalog is built once and never mutated. Its declaration order is the
//! order used for next/previous navigation across categories.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{PlayerError, Result};

/// Number of semesters offered for every grade.
pub const SEMESTERS: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchoolLevel {
    Elementary,
    Middle,
}

impl SchoolLevel {
    pub const ALL: [SchoolLevel; 2] = [SchoolLevel::Elementary, SchoolLevel::Middle];

    /// Prefix used in catalog keys and data directories.
    pub fn prefix(self) -> &'static str {
        match self {
            SchoolLevel::Elementary => "ElementarySchool",
            SchoolLevel::Middle => "MiddleSchool",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            SchoolLevel::Elementary => &["ElementarySchool", "초등"],
            SchoolLevel::Middle => &["MiddleSchool", "중등"],
        }
    }

    /// Highest grade offered at this level; grades start at 1.
    pub fn grade_count(self) -> u8 {
        match self {
            SchoolLevel::Elementary => 6,
            SchoolLevel::Middle => 3,
        }
    }

    pub fn grades(self) -> impl Iterator<Item = u8> {
        1..=self.grade_count()
    }
}

impl fmt::Display for SchoolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Hierarchical catalog key, rendered as `<level><grade>-<semester>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    pub level: SchoolLevel,
    pub grade: u8,
    pub semester: u8,
}

impl CatalogKey {
    pub fn new(level: SchoolLevel, grade: u8, semester: u8) -> Result<Self> {
        if grade == 0 || grade > level.grade_count() {
            return Err(PlayerError::InvalidInput("grade is out of range for level"));
        }
        if semester == 0 || semester > SEMESTERS {
            return Err(PlayerError::InvalidInput("semester is out of range"));
        }

        Ok(Self {
            level,
            grade,
            semester,
        })
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", self.level.prefix(), self.grade, self.semester)
    }
}

impl FromStr for CatalogKey {
    type Err = PlayerError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || PlayerError::InvalidCatalogKey(value.to_string());

        let (level, rest) = SchoolLevel::ALL
            .iter()
            .find_map(|level| {
                level
                    .aliases()
                    .iter()
                    .find_map(|alias| value.strip_prefix(*alias))
                    .map(|rest| (*level, rest))
            })
            .ok_or_else(invalid)?;

        let (grade, semester) = rest.split_once('-').ok_or_else(invalid)?;
        let grade: u8 = grade.parse().map_err(|_| invalid())?;
        let semester: u8 = semester.parse().map_err(|_| invalid())?;

        CatalogKey::new(level, grade, semester).map_err(|_| invalid())
    }
}

impl Serialize for CatalogKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CatalogKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Static description of a selectable track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub title: String,
    /// Name of the track's JSON data file inside its key directory.
    #[serde(rename = "dataRef")]
    pub data_ref: String,
}

impl TrackDescriptor {
    pub fn new(title: impl Into<String>, data_ref: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            data_ref: data_ref.into(),
        }
    }
}

/// All tracks declared under a single catalog key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSection {
    pub key: CatalogKey,
    pub tracks: Vec<TrackDescriptor>,
}

/// A track located within the flattened catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub key: CatalogKey,
    /// Position of the track within its key's list.
    pub index: usize,
    pub descriptor: TrackDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackCatalog {
    sections: Vec<CatalogSection>,
}

impl TrackCatalog {
    /// Builds a catalog from sections in declaration order. Sections that
    /// repeat a key are merged into the first occurrence.
    pub fn new(sections: Vec<CatalogSection>) -> Self {
        let mut merged: Vec<CatalogSection> = Vec::with_capacity(sections.len());
        for section in sections {
            match merged.iter_mut().find(|existing| existing.key == section.key) {
                Some(existing) => existing.tracks.extend(section.tracks),
                None => merged.push(section),
            }
        }
        Self { sections: merged }
    }

    /// Catalog shipped with the player.
    pub fn builtin() -> Self {
        let section = |level, grade, title: &str, data_ref: &str| CatalogSection {
            key: CatalogKey {
                level,
                grade,
                semester: 1,
            },
            tracks: vec![TrackDescriptor::new(title, data_ref)],
        };

        Self::new(vec![
            section(SchoolLevel::Middle, 1, "Pythagoras 1", "pythagoras1.json"),
            section(SchoolLevel::Middle, 2, "Product Formulas", "product-formulas.json"),
            section(SchoolLevel::Middle, 3, "Quadratic Formula", "quadratic-formula.json"),
        ])
    }

    pub fn sections(&self) -> &[CatalogSection] {
        &self.sections
    }

    /// Tracks registered under `key`, empty when the key is unknown.
    pub fn lookup(&self, key: &CatalogKey) -> &[TrackDescriptor] {
        self.sections
            .iter()
            .find(|section| &section.key == key)
            .map(|section| section.tracks.as_slice())
            .unwrap_or(&[])
    }

    /// Every track in declaration order.
    pub fn list_all_tracks(&self) -> Vec<CatalogEntry> {
        self.sections
            .iter()
            .flat_map(|section| {
                section
                    .tracks
                    .iter()
                    .enumerate()
                    .map(move |(index, descriptor)| CatalogEntry {
                        key: section.key,
                        index,
                        descriptor: descriptor.clone(),
                    })
            })
            .collect()
    }

    pub fn total_tracks(&self) -> usize {
        self.sections.iter().map(|section| section.tracks.len()).sum()
    }

    /// Position of `(key, index)` in [`list_all_tracks`](Self::list_all_tracks).
    pub fn find_global_position(&self, key: &CatalogKey, index: usize) -> Option<usize> {
        let mut offset = 0;
        for section in &self.sections {
            if &section.key == key {
                return (index < section.tracks.len()).then_some(offset + index);
            }
            offset += section.tracks.len();
        }
        None
    }

    pub fn entry_at(&self, position: usize) -> Option<CatalogEntry> {
        self.list_all_tracks().into_iter().nth(position)
    }

    /// Entry after `current`, wrapping to the first. An unknown current
    /// position also starts from the first entry.
    pub fn next_entry(&self, current: Option<usize>) -> Option<CatalogEntry> {
        let total = self.total_tracks();
        if total == 0 {
            return None;
        }
        let next = match current {
            Some(position) if position + 1 < total => position + 1,
            _ => 0,
        };
        self.entry_at(next)
    }

    /// Entry before `current`, wrapping to the last. An unknown current
    /// position also starts from the last entry.
    pub fn previous_entry(&self, current: Option<usize>) -> Option<CatalogEntry> {
        let total = self.total_tracks();
        if total == 0 {
            return None;
        }
        let previous = match current {
            Some(position) if position > 0 && position < total => position - 1,
            _ => total - 1,
        };
        self.entry_at(previous)
    }
}
