//! Output surfaces written by the synchronization loop.
//!
//! The loop never reads back from a sink. Caption, formula, readout and
//! transport widgets all live behind [`RenderSink`].

use crate::{PlayerError, Result, Slide, TrackData};

/// Formats seconds as zero-padded `mm:ss`, or `--:--` when unknown.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Position readout refreshed on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeReadout {
    pub position: f64,
    pub duration: Option<f64>,
}

impl TimeReadout {
    pub fn new(position: f64, duration: Option<f64>) -> Self {
        Self { position, duration }
    }

    pub fn zero() -> Self {
        Self::new(0.0, None)
    }

    pub fn current_label(&self) -> String {
        format_clock(self.position)
    }

    pub fn duration_label(&self) -> String {
        self.duration.map_or_else(|| format_clock(f64::NAN), format_clock)
    }

    /// Progress-bar fill in percent, rounded to two decimals.
    pub fn progress_percent(&self) -> f64 {
        match self.duration {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                let percent = (self.position / duration * 100.0).clamp(0.0, 100.0);
                (percent * 100.0).round() / 100.0
            }
            _ => 0.0,
        }
    }
}

/// Title line for the now-playing panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: String,
    pub subtitle: String,
    pub grade: Option<String>,
}

impl NowPlaying {
    pub fn from_track(track: &TrackData) -> Self {
        Self {
            title: track.title.clone(),
            subtitle: format!("{} · {}", track.artist, track.grade),
            grade: Some(track.grade.clone()),
        }
    }

    pub fn none() -> Self {
        Self {
            title: "No track selected".to_string(),
            subtitle: "Choose a track to begin".to_string(),
            grade: None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.grade.is_none()
    }
}

/// Display surfaces driven by the player.
pub trait RenderSink {
    /// Shows a newly active slide. Called once per transition.
    fn show_slide(&mut self, index: usize, slide: &Slide);

    /// Resets caption and formula to their idle state.
    fn show_placeholder(&mut self);

    fn update_readout(&mut self, readout: &TimeReadout);

    fn set_playing(&mut self, _playing: bool) {}

    fn show_now_playing(&mut self, _info: &NowPlaying) {}

    fn set_play_enabled(&mut self, _enabled: bool) {}
}

/// Typesetter for the formula surface.
pub trait FormulaRenderer {
    fn render(&self, latex: &str) -> Result<String>;
}

/// What ends up on the formula surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaMarkup {
    Rendered(String),
    /// Raw source shown when rendering failed.
    Source(String),
}

impl FormulaMarkup {
    pub fn as_str(&self) -> &str {
        match self {
            FormulaMarkup::Rendered(text) | FormulaMarkup::Source(text) => text,
        }
    }
}

/// Renders `latex`, falling back to the raw source on failure.
pub fn present_formula<F: FormulaRenderer + ?Sized>(renderer: &F, latex: &str) -> FormulaMarkup {
    match renderer.render(latex) {
        Ok(rendered) => FormulaMarkup::Rendered(rendered),
        Err(err) => {
            tracing::warn!(%err, latex, "formula render failed, showing source");
            FormulaMarkup::Source(latex.to_string())
        }
    }
}

/// Control words with a fixed replacement. Anything else is an error.
const SYMBOLS: &[(&str, &str)] = &[
    ("left", ""),
    ("right", ""),
    ("times", "×"),
    ("cdot", "·"),
    ("div", "÷"),
    ("pm", "±"),
    ("mp", "∓"),
    ("le", "≤"),
    ("leq", "≤"),
    ("ge", "≥"),
    ("geq", "≥"),
    ("ne", "≠"),
    ("neq", "≠"),
    ("approx", "≈"),
    ("pi", "π"),
    ("theta", "θ"),
    ("alpha", "α"),
    ("beta", "β"),
    ("quad", " "),
];

const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

/// Plain-text typesetter covering the notation used in the lesson tracks.
///
/// `\frac{a}{b}` becomes `(a)/(b)`, `\sqrt{x}` becomes `√(x)`, digit
/// exponents become superscripts and a small symbol table maps to Unicode.
/// Unbalanced braces and unknown control words are errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeFormula;

impl FormulaRenderer for UnicodeFormula {
    fn render(&self, latex: &str) -> Result<String> {
        check_braces(latex)?;
        Ok(render_span(latex)?.trim().to_string())
    }
}

fn check_braces(latex: &str) -> Result<()> {
    let mut depth = 0usize;
    for ch in latex.chars() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| PlayerError::Formula(format!("unexpected `}}` in `{latex}`")))?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(PlayerError::Formula(format!("unclosed `{{` in `{latex}`")));
    }
    Ok(())
}

fn render_span(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        let here = rest;
        rest = &rest[ch.len_utf8()..];
        match ch {
            '\\' => {
                let (word, after) = control_word(rest)?;
                rest = after;
                match word {
                    "frac" => {
                        let (numerator, after) = argument(rest, word)?;
                        let (denominator, after) = argument(after, word)?;
                        out.push_str(&format!("({})/({})", render_span(numerator)?, render_span(denominator)?));
                        rest = after;
                    }
                    "sqrt" => {
                        let (radicand, after) = argument(rest, word)?;
                        out.push_str(&format!("√({})", render_span(radicand)?));
                        rest = after;
                    }
                    "," | ";" | ":" | " " => out.push(' '),
                    _ => {
                        let (_, replacement) = SYMBOLS
                            .iter()
                            .find(|(name, _)| *name == word)
                            .ok_or_else(|| PlayerError::Formula(format!("unknown command `\\{word}`")))?;
                        out.push_str(replacement);
                    }
                }
            }
            '^' => {
                let (power, after) = exponent(rest)?;
                out.push_str(&superscript(&render_span(power)?));
                rest = after;
            }
            '{' => {
                let (group, after) = take_group(here)
                    .ok_or_else(|| PlayerError::Formula(format!("unclosed `{{` in `{input}`")))?;
                out.push_str(&render_span(group)?);
                rest = after;
            }
            '}' => return Err(PlayerError::Formula(format!("unexpected `}}` in `{input}`"))),
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Splits a control word (a run of letters, or one other character) off
/// the text following a backslash.
fn control_word(input: &str) -> Result<(&str, &str)> {
    let letters = input
        .find(|ch: char| !ch.is_ascii_alphabetic())
        .unwrap_or(input.len());
    if letters > 0 {
        return Ok(input.split_at(letters));
    }
    match input.chars().next() {
        Some(ch) => Ok(input.split_at(ch.len_utf8())),
        None => Err(PlayerError::Formula("trailing `\\`".to_string())),
    }
}

fn argument<'a>(input: &'a str, command: &str) -> Result<(&'a str, &'a str)> {
    take_group(input.trim_start())
        .ok_or_else(|| PlayerError::Formula(format!("`\\{command}` is missing an argument")))
}

/// A braced group or a single character after `^`.
fn exponent(input: &str) -> Result<(&str, &str)> {
    let input = input.trim_start();
    if input.starts_with('{') {
        return take_group(input).ok_or_else(|| PlayerError::Formula("unclosed exponent".to_string()));
    }
    match input.chars().next() {
        Some('\\') | Some('}') | None => Err(PlayerError::Formula("`^` is missing an exponent".to_string())),
        Some(ch) => Ok(input.split_at(ch.len_utf8())),
    }
}

fn superscript(exponent: &str) -> String {
    let digits: Option<String> = exponent
        .chars()
        .map(|ch| ch.to_digit(10).map(|digit| SUPERSCRIPTS[digit as usize]))
        .collect();
    match digits {
        Some(digits) if !digits.is_empty() => digits,
        _ if exponent.chars().count() == 1 => format!("^{exponent}"),
        _ => format!("^({exponent})"),
    }
}

fn take_group(input: &str) -> Option<(&str, &str)> {
    let body = input.strip_prefix('{')?;
    let mut depth = 1usize;
    for (offset, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&body[..offset], &body[offset + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Everything a [`RecordingSink`] observed.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Slide {
        index: usize,
        text: String,
        formula: Option<String>,
    },
    Placeholder,
    Readout(TimeReadout),
    Playing(bool),
    NowPlaying(NowPlaying),
    PlayEnabled(bool),
}

/// Sink that keeps a log of every call.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Vec<RenderEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RenderEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Slide and placeholder renders in order; `None` marks a placeholder.
    pub fn transitions(&self) -> Vec<Option<usize>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                RenderEvent::Slide { index, .. } => Some(Some(*index)),
                RenderEvent::Placeholder => Some(None),
                _ => None,
            })
            .collect()
    }

    pub fn last_readout(&self) -> Option<TimeReadout> {
        self.events.iter().rev().find_map(|event| match event {
            RenderEvent::Readout(readout) => Some(*readout),
            _ => None,
        })
    }

    pub fn readout_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, RenderEvent::Readout(_)))
            .count()
    }

    pub fn play_enabled(&self) -> Option<bool> {
        self.events.iter().rev().find_map(|event| match event {
            RenderEvent::PlayEnabled(enabled) => Some(*enabled),
            _ => None,
        })
    }

    pub fn playing(&self) -> Option<bool> {
        self.events.iter().rev().find_map(|event| match event {
            RenderEvent::Playing(playing) => Some(*playing),
            _ => None,
        })
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.events.iter().rev().find_map(|event| match event {
            RenderEvent::NowPlaying(info) => Some(info),
            _ => None,
        })
    }
}

impl RenderSink for RecordingSink {
    fn show_slide(&mut self, index: usize, slide: &Slide) {
        self.events.push(RenderEvent::Slide {
            index,
            text: slide.text.clone(),
            formula: slide.formula.clone(),
        });
    }

    fn show_placeholder(&mut self) {
        self.events.push(RenderEvent::Placeholder);
    }

    fn update_readout(&mut self, readout: &TimeReadout) {
        self.events.push(RenderEvent::Readout(*readout));
    }

    fn set_playing(&mut self, playing: bool) {
        self.events.push(RenderEvent::Playing(playing));
    }

    fn show_now_playing(&mut self, info: &NowPlaying) {
        self.events.push(RenderEvent::NowPlaying(info.clone()));
    }

    fn set_play_enabled(&mut self, enabled: bool) {
        self.events.push(RenderEvent::PlayEnabled(enabled));
    }
}
