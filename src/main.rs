use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod diagnostic;
mod error;
mod normalize;
mod player;
mod plot;
mod session;
mod wav;

use diagnostic::{ToneSpec, MAX_TONE_SECONDS};
use normalize::normalize;
use player::PlayerLauncher;
use session::Session;

/// Plot a WAV file's waveform and play it with the system audio player.
#[derive(Parser, Debug)]
#[command(name = "wavscope", version, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plot a WAV file and open the playback prompt (default)
    View(ViewArgs),
    /// List audio devices and play a test tone
    CheckAudio(CheckAudioArgs),
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// 16-bit PCM WAV file to load
    #[arg(default_value = "InputWAVS/Input2.wav")]
    file: PathBuf,

    /// Where to write the waveform PNG (defaults to FILE with a .png extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Player command line; `{}` is replaced by the file path
    #[arg(short, long, env = "WAVSCOPE_PLAYER")]
    player: Option<String>,

    /// Render the plot and exit without the playback prompt
    #[arg(long)]
    no_interactive: bool,
}

#[derive(Args, Debug)]
struct CheckAudioArgs {
    /// Tone frequency (Hz)
    #[arg(short, long, default_value_t = 440.0, value_parser = positive_finite)]
    frequency: f64,

    /// Tone duration (seconds)
    #[arg(short, long, default_value_t = 1.0, value_parser = tone_duration)]
    duration: f64,

    /// Tone amplitude (0.0-1.0)
    #[arg(short, long, default_value_t = 0.5, value_parser = unit_amplitude)]
    amplitude: f64,

    /// Also write the tone to this WAV file
    #[arg(short, long)]
    save: Option<PathBuf>,
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse::<f64>().map_err(|e| format!("{}: {}", s, e))
}

fn positive_finite(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{} must be a finite number greater than 0", s))
    }
}

fn tone_duration(s: &str) -> Result<f64, String> {
    let value = positive_finite(s)?;
    if value <= MAX_TONE_SECONDS {
        Ok(value)
    } else {
        Err(format!("{} exceeds the {} second limit", s, MAX_TONE_SECONDS))
    }
}

fn unit_amplitude(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is outside 0.0-1.0", s))
    }
}

fn view(args: ViewArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (frames, format) = wav::read_wav_file(&args.file)?;
    let wave = normalize(&frames, format)?;

    info!("File loaded successfully: {}", args.file.display());
    info!(
        "Samples: {}, sample rate: {} Hz, channels: {}, duration: {:.2}s",
        wave.sample_count(),
        wave.sample_rate(),
        wave.source_channels(),
        wave.duration_seconds()
    );

    let output = args
        .output
        .unwrap_or_else(|| args.file.with_extension("png"));
    let title = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());
    plot::render_waveform(&wave, &title, &output)?;
    info!("Waveform written to {}", output.display());

    if args.no_interactive {
        return Ok(());
    }

    let launcher = PlayerLauncher::from_config(args.player.as_deref())?;
    info!("Using player {}", launcher.program());
    println!("\nTip: press Enter (or space, Enter) to play the file, q to quit");

    let mut session = Session::new(args.file, launcher);
    session.run(io::stdin().lock())?;
    Ok(())
}

fn check_audio(args: CheckAudioArgs) {
    let tone = ToneSpec {
        frequency: args.frequency,
        duration: args.duration,
        amplitude: args.amplitude,
    };

    println!("Testing audio system...");

    println!("\nAvailable audio devices:");
    match diagnostic::list_devices() {
        Ok(devices) if devices.is_empty() => println!("  (none)"),
        Ok(devices) => {
            for device in devices {
                println!("{}", device);
            }
        }
        Err(e) => error!("Could not list audio devices: {}", e),
    }

    if let Some(path) = &args.save {
        match diagnostic::save_test_tone(&tone, path) {
            Ok(()) => info!("Test tone written to {}", path.display()),
            Err(e) => error!("{}", e),
        }
    }

    println!("\nPlaying test tone...");
    match diagnostic::play_test_tone(&tone) {
        Ok(()) => println!("Test tone played successfully!"),
        Err(e) => println!("Error playing test tone: {}", e),
    }

    println!("\nTest complete!");
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::View(args)) => view(args),
        Some(Commands::CheckAudio(args)) => {
            check_audio(args);
            Ok(())
        }
        None => view(cli.view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_views_default_file() {
        let cli = Cli::parse_from(["wavscope"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.view.file, PathBuf::from("InputWAVS/Input2.wav"));
        assert!(!cli.view.no_interactive);
    }

    #[test]
    fn view_subcommand_is_optional() {
        let cli = Cli::parse_from(["wavscope", "clip.wav", "--no-interactive"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.view.file, PathBuf::from("clip.wav"));
        assert!(cli.view.no_interactive);

        let cli = Cli::parse_from(["wavscope", "--no-interactive"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.view.file, PathBuf::from("InputWAVS/Input2.wav"));
        assert!(cli.view.no_interactive);
    }

    #[test]
    fn view_flags() {
        let cli = Cli::parse_from([
            "wavscope",
            "view",
            "clip.wav",
            "--output",
            "out.png",
            "--player",
            "mpv {}",
            "--no-interactive",
        ]);
        match cli.command {
            Some(Commands::View(args)) => {
                assert_eq!(args.file, PathBuf::from("clip.wav"));
                assert_eq!(args.output, Some(PathBuf::from("out.png")));
                assert_eq!(args.player.as_deref(), Some("mpv {}"));
                assert!(args.no_interactive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn check_audio_defaults() {
        let cli = Cli::parse_from(["wavscope", "check-audio"]);
        match cli.command {
            Some(Commands::CheckAudio(args)) => {
                assert_eq!(args.frequency, 440.0);
                assert_eq!(args.duration, 1.0);
                assert_eq!(args.amplitude, 0.5);
                assert!(args.save.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn check_audio_rejects_unplayable_tones() {
        for bad in [
            ["--duration", "inf"],
            ["--duration", "NaN"],
            ["--duration", "-1"],
            ["--duration", "0"],
            ["--duration", "1e12"],
            ["--frequency", "0"],
            ["--frequency", "inf"],
            ["--amplitude", "1.5"],
        ] {
            let mut argv = vec!["wavscope", "check-audio"];
            argv.extend(bad);
            assert!(Cli::try_parse_from(&argv).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn check_audio_accepts_custom_tone() {
        let cli = Cli::parse_from(["wavscope", "check-audio", "-f", "1000", "-d", "0.25"]);
        match cli.command {
            Some(Commands::CheckAudio(args)) => {
                assert_eq!(args.frequency, 1000.0);
                assert_eq!(args.duration, 0.25);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
