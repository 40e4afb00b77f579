use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("player command is empty")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}")]
    Exited { program: String, status: ExitStatus },
}

/// Something that can play a WAV file to completion.
pub trait Launch {
    fn launch(&self, path: &Path) -> Result<(), PlaybackError>;
}

/// Host audio player invoked as an external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerLauncher {
    MacOs,
    Windows,
    Linux,
    /// User supplied command; a `{}` argument is replaced by the file path,
    /// otherwise the path is appended.
    Custom { program: String, args: Vec<String> },
}

impl PlayerLauncher {
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            PlayerLauncher::MacOs
        } else if cfg!(target_os = "windows") {
            PlayerLauncher::Windows
        } else {
            PlayerLauncher::Linux
        }
    }

    pub fn custom(command_line: &str) -> Result<Self, PlaybackError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(PlaybackError::EmptyCommand)?;
        Ok(PlayerLauncher::Custom {
            program,
            args: parts.collect(),
        })
    }

    pub fn from_config(player: Option<&str>) -> Result<Self, PlaybackError> {
        match player {
            Some(command_line) => Self::custom(command_line),
            None => Ok(Self::detect()),
        }
    }

    pub fn program(&self) -> &str {
        match self {
            PlayerLauncher::MacOs => "afplay",
            PlayerLauncher::Windows => "cmd",
            PlayerLauncher::Linux => "aplay",
            PlayerLauncher::Custom { program, .. } => program,
        }
    }

    pub fn command(&self, path: &Path) -> Command {
        let mut command = Command::new(self.program());
        match self {
            PlayerLauncher::MacOs | PlayerLauncher::Linux => {
                command.arg(path);
            }
            PlayerLauncher::Windows => {
                command.args(["/C", "start", "wmplayer"]).arg(path);
            }
            PlayerLauncher::Custom { args, .. } => {
                let mut substituted = false;
                for arg in args {
                    if arg == "{}" {
                        command.arg(path);
                        substituted = true;
                    } else {
                        command.arg(arg);
                    }
                }
                if !substituted {
                    command.arg(path);
                }
            }
        }
        command
    }
}

impl Launch for PlayerLauncher {
    fn launch(&self, path: &Path) -> Result<(), PlaybackError> {
        let program = self.program().to_string();
        info!("Attempting to play audio file: {}", path.display());
        debug!("Launching {:?}", self.command(path));

        let status = self
            .command(path)
            .status()
            .map_err(|source| PlaybackError::Spawn {
                program: program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(PlaybackError::Exited { program, status });
        }

        info!("Audio playback command finished");
        Ok(())
    }
}
