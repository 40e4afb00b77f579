use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::player::{Launch, PlaybackError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

impl PlaybackState {
    /// Idle -> Playing. Returns false if playback is already running.
    pub fn start(&mut self) -> bool {
        match self {
            PlaybackState::Idle => {
                *self = PlaybackState::Playing;
                true
            }
            PlaybackState::Playing => false,
        }
    }

    pub fn finish(&mut self) {
        *self = PlaybackState::Idle;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Play,
    Quit,
    Unknown,
}

impl Key {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "p" | "play" => Key::Play,
            "q" | "quit" => Key::Quit,
            _ => Key::Unknown,
        }
    }
}

/// Playback controls for one loaded file.
pub struct Session<L> {
    path: PathBuf,
    launcher: L,
    state: PlaybackState,
}

impl<L: Launch> Session<L> {
    pub fn new(path: impl Into<PathBuf>, launcher: L) -> Self {
        Session {
            path: path.into(),
            launcher,
            state: PlaybackState::Idle,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Play the file once, blocking until the player exits.
    pub fn play(&mut self) -> Result<PlayOutcome, PlaybackError> {
        if !self.state.start() {
            return Ok(PlayOutcome::Busy);
        }
        let result = self.launcher.launch(&self.path);
        self.state.finish();
        result.map(|()| PlayOutcome::Played)
    }

    /// Prompt loop: play on every play key until quit or end of input.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        prompt()?;
        for line in input.lines() {
            match Key::parse(&line?) {
                Key::Play => self.play_with_spinner(),
                Key::Quit => break,
                Key::Unknown => println!("Unrecognized key; press Enter to play or q to quit"),
            }
            prompt()?;
        }
        Ok(())
    }

    fn play_with_spinner(&mut self) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Playing {}", self.path.display()));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = self.play();
        spinner.finish_and_clear();

        match result {
            Ok(PlayOutcome::Played) => info!("Playback finished"),
            Ok(PlayOutcome::Busy) => warn!("Playback already in progress"),
            Err(PlaybackError::Exited { program, status }) => {
                warn!("{} exited with {}", program, status)
            }
            Err(e) => error!("Error during audio playback: {}", e),
        }
    }
}

fn prompt() -> io::Result<()> {
    print!("[Enter/space] play  [q] quit > ");
    io::stdout().flush()
}
