//! Sound cue assets.
//!
//! The bank is decoded once at startup and handed to processors behind an `Arc`,
//! so every turn cue reuses the same samples.

use crate::config::SoundsConfig;
use crate::error::{Result, StoryError};
use crate::streaming::frame::{AudioClip, Sound};
use std::io::Read;
use std::path::Path;

/// Sample rate reported by silent clips.
pub const SILENT_SAMPLE_RATE: u32 = 16000;

/// Decoded cue sounds.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundBank {
    talking: AudioClip,
    listening: AudioClip,
    ding: AudioClip,
}

impl SoundBank {
    /// Bank of empty clips for headless runs and tests.
    pub fn silent() -> Self {
        Self {
            talking: AudioClip::silent(Sound::Talking),
            listening: AudioClip::silent(Sound::Listening),
            ding: AudioClip::silent(Sound::Ding),
        }
    }

    /// Loads the configured sounds, or a silent bank when no directory is set.
    pub fn from_config(config: &SoundsConfig) -> Result<Self> {
        match &config.dir {
            Some(dir) => Self::load(dir, config),
            None => Ok(Self::silent()),
        }
    }

    /// Decodes `talking`, `listening` and `ding` from WAV files under `dir`.
    pub fn load(dir: &Path, files: &SoundsConfig) -> Result<Self> {
        let talking = load_clip(&dir.join(&files.talking), Sound::Talking)?;
        let listening = load_clip(&dir.join(&files.listening), Sound::Listening)?;
        let ding = load_clip(&dir.join(&files.ding), Sound::Ding)?;
        tracing::debug!(dir = %dir.display(), "loaded sound bank");
        Ok(Self {
            talking,
            listening,
            ding,
        })
    }

    /// Returns the clip for a sound.
    pub fn clip(&self, sound: Sound) -> &AudioClip {
        match sound {
            Sound::Talking => &self.talking,
            Sound::Listening => &self.listening,
            Sound::Ding => &self.ding,
        }
    }
}

fn load_clip(path: &Path, sound: Sound) -> Result<AudioClip> {
    let file = std::fs::File::open(path).map_err(|e| StoryError::SoundLoad {
        name: path.display().to_string(),
        message: e.to_string(),
    })?;
    decode_wav(Box::new(std::io::BufReader::new(file)), sound).map_err(|e| match e {
        StoryError::SoundLoad { message, .. } => StoryError::SoundLoad {
            name: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// Decodes 16-bit PCM WAV data into a clip, keeping its rate and channel layout.
pub fn decode_wav(reader: Box<dyn Read + Send>, sound: Sound) -> Result<AudioClip> {
    let wav_reader = hound::WavReader::new(reader).map_err(|e| StoryError::SoundLoad {
        name: sound.name().to_string(),
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = wav_reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(StoryError::SoundLoad {
            name: sound.name().to_string(),
            message: format!(
                "expected 16-bit integer PCM, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            ),
        });
    }

    let samples: Vec<i16> = wav_reader
        .into_samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| StoryError::SoundLoad {
            name: sound.name().to_string(),
            message: format!("Failed to read WAV samples: {}", e),
        })?;

    Ok(AudioClip::new(sound, samples, spec.sample_rate, spec.channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn write_wav(dir: &Path, name: &str, samples: &[i16]) {
        std::fs::write(dir.join(name), wav_bytes(samples, 24000, 1)).unwrap();
    }

    #[test]
    fn test_silent_bank_has_empty_clips() {
        let bank = SoundBank::silent();
        assert!(bank.clip(Sound::Talking).samples.is_empty());
        assert_eq!(bank.clip(Sound::Listening).sound, Sound::Listening);
        assert_eq!(bank.clip(Sound::Ding).sound, Sound::Ding);
    }

    #[test]
    fn test_decode_wav_keeps_format() {
        let bytes = wav_bytes(&[1, -1, 2, -2], 44100, 2);
        let clip = decode_wav(Box::new(Cursor::new(bytes)), Sound::Ding).unwrap();

        assert_eq!(&*clip.samples, &[1, -1, 2, -2]);
        assert_eq!(clip.sample_rate, 44100);
        assert_eq!(clip.channels, 2);
    }

    #[test]
    fn test_decode_wav_rejects_garbage() {
        let result = decode_wav(Box::new(Cursor::new(b"not a wav".to_vec())), Sound::Talking);
        match result {
            Err(StoryError::SoundLoad { name, message }) => {
                assert_eq!(name, "talking");
                assert!(message.contains("Failed to parse WAV"));
            }
            other => panic!("Expected SoundLoad error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_bank_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path(), "talking.wav", &[10, 20]);
        write_wav(dir.path(), "listening.wav", &[30]);
        write_wav(dir.path(), "ding.wav", &[40, 50, 60]);

        let bank = SoundBank::load(dir.path(), &SoundsConfig::default()).unwrap();

        assert_eq!(&*bank.clip(Sound::Talking).samples, &[10, 20]);
        assert_eq!(&*bank.clip(Sound::Listening).samples, &[30]);
        assert_eq!(bank.clip(Sound::Ding).samples.len(), 3);
        assert_eq!(bank.clip(Sound::Ding).sample_rate, 24000);
    }

    #[test]
    fn test_load_bank_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(dir.path(), "talking.wav", &[1]);

        match SoundBank::load(dir.path(), &SoundsConfig::default()) {
            Err(StoryError::SoundLoad { name, .. }) => assert!(name.ends_with("listening.wav")),
            other => panic!("Expected SoundLoad error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_without_dir_is_silent() {
        let bank = SoundBank::from_config(&SoundsConfig::default()).unwrap();
        assert_eq!(bank, SoundBank::silent());
    }
}
