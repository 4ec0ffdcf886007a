use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use storyteller::cli::{Cli, Commands, ConfigAction, describe_frame, split_deltas};
use storyteller::config::Config;
use storyteller::conversation::{ChatMessage, Conversation, Role, Story};
use storyteller::error::StoryError;
use storyteller::sounds::SoundBank;
use storyteller::streaming::{Frame, ImageData, MockImageGenerator, Sound, StoryPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Replay {
            input,
            chunk_size,
            image_delay,
        } => {
            let config = load_config(cli.config.as_deref())?;
            run_replay(config, &input, chunk_size, image_delay, cli.quiet).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("storyteller={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) if !path.exists() => {
            return Err(StoryError::ConfigFileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Some(path) => Config::load(path)?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };

    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn read_transcript(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read transcript from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read transcript {}", input.display()))
}

async fn run_replay(
    config: Config,
    input: &Path,
    chunk_size: usize,
    image_delay: Duration,
    quiet: bool,
) -> Result<()> {
    let text = read_transcript(input)?;
    let sounds = Arc::new(SoundBank::from_config(&config.sounds)?);
    let generator = MockImageGenerator::new()
        .with_image(image_delay, ImageData::new(Vec::new(), (512, 512)));

    let conversation = Conversation::new(vec![ChatMessage::new(
        Role::User,
        "Tell me a story.",
    )]);
    let story = Story::new();

    let mut handle = StoryPipeline::with_config(config).spawn(
        conversation.clone(),
        story.clone(),
        sounds,
        generator.clone(),
    );

    let feeder = handle
        .sender()
        .context("Pipeline input closed before replay started")?;
    let deltas = split_deltas(&text, chunk_size);
    let feed = tokio::spawn(async move {
        for delta in deltas {
            if feeder.send(Frame::TextDelta(delta)).await.is_err() {
                return;
            }
        }
        if feeder.send(Frame::ResponseEnd).await.is_err() {
            tracing::debug!("pipeline closed before response end");
        }
    });

    let color = std::io::stdout().is_terminal();
    while let Some(frame) = handle.recv().await {
        if let Frame::StoryPrompt(rest) = &frame {
            conversation.push(ChatMessage::new(Role::Assistant, rest.clone()));
        }
        if !quiet {
            print_frame(&frame, color);
        }
        if matches!(&frame, Frame::Audio(clip) if clip.sound == Sound::Listening) {
            // Listening cue closes the turn
            break;
        }
    }
    feed.await.context("Replay feeder panicked")?;
    handle.finish().await;

    if !quiet {
        eprintln!(
            "{} pages, {} images requested",
            story.len(),
            generator.prompts().len()
        );
    }
    Ok(())
}

fn print_frame(frame: &Frame, color: bool) {
    let kind = format!("{:<13}", frame.kind());
    let detail = describe_frame(frame);
    if !color {
        println!("{} {}", kind, detail);
        return;
    }
    match frame {
        Frame::StoryPage(_) => println!("{} {}", kind.green(), detail),
        Frame::Image(_) => println!("{} {}", kind.magenta(), detail),
        Frame::StoryPrompt(_) => println!("{} {}", kind.yellow(), detail),
        Frame::Transport(_) | Frame::Audio(_) => println!("{} {}", kind.dimmed(), detail.dimmed()),
        _ => println!("{} {}", kind.cyan(), detail),
    }
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            print!("{}", rendered);
        }
    }
    Ok(())
}
