//! Command-line interface for storyteller
//!
//! Provides argument parsing using clap derive macros.

use crate::streaming::frame::Frame;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Streams narration into illustrated story pages
#[derive(Parser, Debug)]
#[command(name = "storyteller", version, about = "Streams narration into illustrated story pages")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a narration transcript through the story pipeline
    Replay {
        /// Transcript file, or `-` for stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Characters per streamed delta
        #[arg(
            long,
            short = 'c',
            value_name = "CHARS",
            default_value = "16",
            value_parser = parse_chunk_size
        )]
        chunk_size: usize,

        /// Delay before the mock generator yields its image. Examples: 500ms, 2s, 10s
        #[arg(long, value_name = "DURATION", default_value = "1s", value_parser = parse_delay)]
        image_delay: Duration,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
}

fn parse_chunk_size(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("chunk size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Parse a delay string.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`500ms`, `2s`, `1m30s`).
fn parse_delay(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Splits text into deltas of at most `chunk_chars` characters.
///
/// Splits on char boundaries, never inside a UTF-8 sequence.
pub fn split_deltas(text: &str, chunk_chars: usize) -> Vec<String> {
    let chunk_chars = chunk_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// One-line description of an output frame, without the kind label.
pub fn describe_frame(frame: &Frame) -> String {
    match frame {
        Frame::Transport(cue) => cue
            .to_json()
            .unwrap_or_else(|e| format!("<unserializable cue: {}>", e)),
        Frame::Audio(clip) => format!("{} ({}ms)", clip.sound.name(), clip.duration_ms()),
        Frame::Image(image) => {
            let (width, height) = image.size;
            match &image.url {
                Some(url) => format!("{}x{} {}", width, height, url),
                None => format!("{}x{} ({} bytes)", width, height, image.bytes.len()),
            }
        }
        Frame::ResponseEnd | Frame::UserStoppedSpeaking => String::new(),
        other => other.text().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::frame::{AudioClip, Cue, ImageData, Sound};

    #[test]
    fn test_parse_replay_defaults() {
        let cli = Cli::try_parse_from(["storyteller", "replay", "story.txt"]).unwrap();
        match cli.command {
            Commands::Replay {
                input,
                chunk_size,
                image_delay,
            } => {
                assert_eq!(input, PathBuf::from("story.txt"));
                assert_eq!(chunk_size, 16);
                assert_eq!(image_delay, Duration::from_secs(1));
            }
            other => panic!("Expected Replay, got {:?}", other),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_replay_with_options() {
        let cli = Cli::try_parse_from([
            "storyteller",
            "replay",
            "-",
            "--chunk-size",
            "4",
            "--image-delay",
            "8s",
        ])
        .unwrap();
        match cli.command {
            Commands::Replay {
                input,
                chunk_size,
                image_delay,
            } => {
                assert_eq!(input, PathBuf::from("-"));
                assert_eq!(chunk_size, 4);
                assert_eq!(image_delay, Duration::from_secs(8));
            }
            other => panic!("Expected Replay, got {:?}", other),
        }
    }

    #[test]
    fn test_chunk_size_short() {
        let cli = Cli::try_parse_from(["storyteller", "replay", "a.txt", "-c", "2"]).unwrap();
        assert!(matches!(cli.command, Commands::Replay { chunk_size: 2, .. }));
    }

    #[test]
    fn test_chunk_size_zero_rejected() {
        let result = Cli::try_parse_from(["storyteller", "replay", "a.txt", "-c", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["storyteller", "-vv", "replay", "a.txt"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_global_options_after_command() {
        let cli = Cli::try_parse_from([
            "storyteller",
            "replay",
            "a.txt",
            "--quiet",
            "--config",
            "/tmp/story.toml",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/story.toml")));
    }

    #[test]
    fn test_parse_config_show() {
        let cli = Cli::try_parse_from(["storyteller", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["storyteller"]).is_err());
        assert!(Cli::try_parse_from(["storyteller", "config"]).is_err());
    }

    #[test]
    fn test_replay_requires_input() {
        let result = Cli::try_parse_from(["storyteller", "replay"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_delay_formats() {
        assert_eq!(parse_delay("250"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_delay("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_delay("1m30s"), Ok(Duration::from_secs(90)));
        assert!(parse_delay("soon").is_err());
    }

    #[test]
    fn test_split_deltas() {
        assert_eq!(split_deltas("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(split_deltas("", 3), Vec::<String>::new());
        assert_eq!(split_deltas("ab", 0), vec!["a", "b"]);
    }

    #[test]
    fn test_split_deltas_keeps_multibyte_chars_whole() {
        let deltas = split_deltas("héllo wörld", 2);
        assert_eq!(deltas.concat(), "héllo wörld");
        assert!(deltas.iter().all(|d| d.chars().count() <= 2));
    }

    #[test]
    fn test_describe_frame() {
        assert_eq!(
            describe_frame(&Frame::StoryPage("The fox ran.".to_string())),
            "The fox ran."
        );
        assert_eq!(describe_frame(&Frame::ResponseEnd), "");
        assert_eq!(
            describe_frame(&Frame::Transport(Cue::UserTurn)),
            Cue::UserTurn.to_json().unwrap()
        );
        assert_eq!(
            describe_frame(&Frame::Image(ImageData::new(vec![0; 3], (4, 2)))),
            "4x2 (3 bytes)"
        );
        assert_eq!(
            describe_frame(&Frame::Image(
                ImageData::new(Vec::new(), (1, 1)).with_url("https://img.test/1.png")
            )),
            "1x1 https://img.test/1.png"
        );
        assert_eq!(
            describe_frame(&Frame::Audio(AudioClip::silent(Sound::Listening))),
            "listening (0ms)"
        );
    }
}
