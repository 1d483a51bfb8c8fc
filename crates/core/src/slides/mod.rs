use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{PlayerError, Result};

/// One timed caption with an optional formula shown alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Offset into the track, in seconds.
    pub time: f64,
    pub text: String,
    /// LaTeX source for the formula surface.
    #[serde(
        default,
        rename = "mathLatex",
        skip_serializing_if = "Option::is_none"
    )]
    pub formula: Option<String>,
}

impl Slide {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
            formula: None,
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }
}

/// Time-ordered slides for a single track.
///
/// The index is immutable once built. Loading another track replaces it
/// wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideIndex {
    slides: Vec<Slide>,
}

impl SlideIndex {
    /// Builds an index, rejecting negative or non-finite timestamps.
    ///
    /// Out-of-order input is sorted stably, so slides sharing a timestamp
    /// keep their declaration order.
    pub fn new(mut slides: Vec<Slide>) -> Result<Self> {
        if let Some((index, slide)) = slides
            .iter()
            .enumerate()
            .find(|(_, slide)| !slide.time.is_finite() || slide.time < 0.0)
        {
            return Err(PlayerError::InvalidSlide {
                index,
                time: slide.time,
            });
        }

        slides.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
        Ok(Self { slides })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Returns the last slide whose time does not exceed `position`.
    ///
    /// Ties resolve to the highest index. Positions before the first slide,
    /// negative positions and NaN all resolve to `None`.
    pub fn active_index(&self, position: f64) -> Option<usize> {
        if position.is_nan() || position < 0.0 {
            return None;
        }

        match self.slides.partition_point(|slide| slide.time <= position) {
            0 => None,
            end => Some(end - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(times: &[f64]) -> SlideIndex {
        SlideIndex::new(
            times
                .iter()
                .enumerate()
                .map(|(i, t)| Slide::new(*t, format!("line {i}")))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn selects_last_slide_not_after_position() {
        let slides = index(&[0.0, 10.0, 10.0, 25.0]);

        assert_eq!(slides.active_index(10.0), Some(2));
        assert_eq!(slides.active_index(9.999), Some(0));
        assert_eq!(slides.active_index(30.0), Some(3));
        assert_eq!(slides.active_index(0.0), Some(0));
    }

    #[test]
    fn invalid_positions_resolve_to_none() {
        let slides = index(&[0.0, 10.0]);

        assert_eq!(slides.active_index(-0.5), None);
        assert_eq!(slides.active_index(f64::NAN), None);
        assert_eq!(slides.active_index(f64::NEG_INFINITY), None);
        assert_eq!(slides.active_index(f64::INFINITY), Some(1));
    }

    #[test]
    fn position_before_first_slide_is_none() {
        let slides = index(&[2.5, 4.0]);
        assert_eq!(slides.active_index(2.4), None);
        assert_eq!(slides.active_index(2.5), Some(0));
    }

    #[test]
    fn empty_index_never_selects() {
        let slides = SlideIndex::empty();
        for position in [0.0, 1.0, 1_000.0] {
            assert_eq!(slides.active_index(position), None);
        }
    }

    #[test]
    fn sorts_out_of_order_input_stably() {
        let slides = SlideIndex::new(vec![
            Slide::new(5.0, "b"),
            Slide::new(1.0, "a"),
            Slide::new(5.0, "c"),
        ])
        .unwrap();

        let texts: Vec<_> = slides.slides().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
        assert_eq!(slides.active_index(5.0), Some(2));
    }

    #[test]
    fn rejects_invalid_timestamps() {
        let err = SlideIndex::new(vec![Slide::new(0.0, "ok"), Slide::new(-1.0, "bad")])
            .unwrap_err();
        assert!(matches!(err, PlayerError::InvalidSlide { index: 1, .. }));

        assert!(SlideIndex::new(vec![Slide::new(f64::NAN, "nan")]).is_err());
    }

    #[test]
    fn decodes_formula_field() {
        let slide: Slide =
            serde_json::from_str(r#"{"time": 3, "text": "a squared", "mathLatex": "a^2"}"#)
                .unwrap();
        assert_eq!(slide.formula.as_deref(), Some("a^2"));

        let plain: Slide = serde_json::from_str(r#"{"time": 1.5, "text": "hi"}"#).unwrap();
        assert!(plain.formula.is_none());
    }
}
