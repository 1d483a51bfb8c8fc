use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lyric_player_core::{
    fetch_track, format_clock, present_formula, CatalogEntry, CatalogKey, Command, LoadOutcome, ManualClock,
    ManualFrames, NowPlaying, PlaceholderText, Player, PlayerConfig, PlayerError, RenderSink, Session, Slide,
    TickOutcome, TimeReadout, UnicodeFormula,
};
use tracing_subscriber::EnvFilter;

fn main() -> lyric_player_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PlayerConfig::from_path(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(root) = cli.music_root {
        config.music_root = root;
    }

    match cli.command {
        Commands::Catalog => run_catalog(&config),
        Commands::Inspect { key, index } => run_inspect(&config, &key, index),
        Commands::Play {
            key,
            index,
            duration,
            speed,
            tracks,
        } => run_play(config, &key, index, duration, speed, tracks),
    }
}

fn run_catalog(config: &PlayerConfig) -> lyric_player_core::Result<()> {
    for (position, entry) in config.catalog().list_all_tracks().into_iter().enumerate() {
        println!(
            "{position:>3}  {:<20} #{}  {}  ({})",
            entry.key.to_string(),
            entry.index,
            entry.descriptor.title,
            entry.descriptor.data_ref
        );
    }
    Ok(())
}

fn run_inspect(config: &PlayerConfig, key: &str, index: usize) -> lyric_player_core::Result<()> {
    let entry = find_entry(config, key, index)?;
    let source = config.track_source();
    let fetched = fetch_track(&source, &entry)?;
    let slides = fetched.data.slide_index()?;

    println!("{} · {} · {}", fetched.data.title, fetched.data.artist, fetched.data.grade);
    println!("audio: {}", fetched.audio.url);
    for (position, slide) in slides.slides().iter().enumerate() {
        println!("{position:>3}  [{}]  {}", format_clock(slide.time), slide.text.replace('\n', " / "));
        if let Some(formula) = &slide.formula {
            println!("          {}", present_formula(&UnicodeFormula, formula).as_str());
        }
    }
    Ok(())
}

fn run_play(
    mut config: PlayerConfig,
    key: &str,
    index: usize,
    duration: f64,
    speed: f64,
    tracks: usize,
) -> lyric_player_core::Result<()> {
    check_play_args(duration, speed)?;
    let entry = find_entry(&config, key, index)?;
    config.auto_advance = tracks > 1;

    let source = config.track_source();
    let clock = ManualClock::with_duration(duration).verify_files();
    let sink = TerminalSink::new(config.placeholder.clone());
    let player = Player::new(clock, sink, ManualFrames::new());
    let mut session = Session::with_config(&config, source, player);

    tracing::info!(key, index, duration, speed, tracks, "starting simulated playback");
    match session.load_entry(entry) {
        LoadOutcome::Ready => {}
        outcome => return Err(PlayerError::msg(format!("track could not be loaded: {outcome:?}"))),
    }
    let outcome = session.dispatch(Command::TogglePlay)?;
    tracing::debug!(?outcome, "play requested");

    let step = config.frame_interval() * speed;
    let mut finished = 0;
    while let Some(handle) = session.player_mut().frames_mut().take_pending() {
        if session.on_frame(handle) == TickOutcome::Ended {
            finished += 1;
            if finished >= tracks {
                break;
            }
        }
        session.player_mut().clock_mut().advance(step);
    }

    if session.player().is_playing() {
        session.player_mut().stop();
    }
    tracing::info!(finished, "simulated playback finished");
    Ok(())
}

/// Rejects clock settings under which the frame loop would never finish.
fn check_play_args(duration: f64, speed: f64) -> lyric_player_core::Result<()> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(PlayerError::InvalidInput("speed must be a positive number"));
    }
    if !(duration.is_finite() && duration >= 0.0) {
        return Err(PlayerError::InvalidInput("duration must be a non-negative number of seconds"));
    }
    Ok(())
}

fn find_entry(config: &PlayerConfig, key: &str, index: usize) -> lyric_player_core::Result<CatalogEntry> {
    let key: CatalogKey = key.parse()?;
    let catalog = config.catalog();
    let descriptor = catalog
        .lookup(&key)
        .get(index)
        .cloned()
        .ok_or_else(|| PlayerError::msg(format!("no track #{index} under `{key}`")))?;
    Ok(CatalogEntry { key, index, descriptor })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prints caption transitions to stdout.
struct TerminalSink {
    placeholder: PlaceholderText,
    last_second: Option<u64>,
}

impl TerminalSink {
    fn new(placeholder: PlaceholderText) -> Self {
        Self {
            placeholder,
            last_second: None,
        }
    }
}

impl RenderSink for TerminalSink {
    fn show_slide(&mut self, index: usize, slide: &Slide) {
        println!("[{}] #{index} {}", format_clock(slide.time), slide.text.replace('\n', " / "));
        if let Some(formula) = &slide.formula {
            println!("        {}", present_formula(&UnicodeFormula, formula).as_str());
        }
    }

    fn show_placeholder(&mut self) {
        println!("{}", self.placeholder.caption.replace('\n', " "));
        println!("        {}", self.placeholder.formula);
    }

    fn update_readout(&mut self, readout: &TimeReadout) {
        let second = readout.position.max(0.0).floor() as u64;
        if self.last_second != Some(second) {
            self.last_second = Some(second);
            tracing::trace!(
                current = %readout.current_label(),
                duration = %readout.duration_label(),
                progress = readout.progress_percent(),
                "readout"
            );
        }
    }

    fn set_playing(&mut self, playing: bool) {
        tracing::debug!(playing, "transport state");
    }

    fn show_now_playing(&mut self, info: &NowPlaying) {
        println!("♪ {} · {}", info.title, info.subtitle);
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Synchronized lyrics and formula player", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the configured music directory.
    #[arg(long, global = true)]
    music_root: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every track in catalog order.
    Catalog,
    /// Print the slides of a track.
    Inspect {
        /// Catalog key, e.g. `MiddleSchool2-1`.
        key: String,
        /// Position of the track under the key.
        #[arg(default_value_t = 0)]
        index: usize,
    },
    /// Play a track against a simulated clock, printing captions as they change.
    Play {
        /// Catalog key, e.g. `MiddleSchool2-1`.
        key: String,
        /// Position of the track under the key.
        #[arg(default_value_t = 0)]
        index: usize,
        /// Length reported for each track, in seconds.
        #[arg(long, default_value_t = 30.0)]
        duration: f64,
        /// Playback speed multiplier for the simulated clock.
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Number of tracks to play, following catalog order.
        #[arg(long, default_value_t = 1)]
        tracks: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_arguments_must_terminate() {
        assert!(check_play_args(30.0, 1.0).is_ok());
        assert!(check_play_args(0.0, 2.5).is_ok());

        for duration in [f64::NAN, f64::INFINITY, -1.0] {
            assert!(matches!(check_play_args(duration, 1.0), Err(PlayerError::InvalidInput(_))));
        }
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(check_play_args(30.0, speed), Err(PlayerError::InvalidInput(_))));
        }
    }
}
