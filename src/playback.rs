use std::sync::{Arc, Mutex};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{debug, error};

use crate::error::EarError;
use crate::render::AudioArtifact;

/// Device side of a round: takes a rendered artifact and starts it playing
/// without waiting for it to finish.
pub trait AudioPlayer {
    fn play(&mut self, artifact: &AudioArtifact) -> Result<(), EarError>;

    fn stop(&mut self) {}
}

/// Checks the artifact exists and plays nothing. For headless runs and tests.
#[derive(Debug, Default)]
pub struct NullPlayer;

impl AudioPlayer for NullPlayer {
    fn play(&mut self, artifact: &AudioArtifact) -> Result<(), EarError> {
        artifact.ensure_present()?;
        debug!("(silent) {}", artifact.path.display());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub samples: Arc<Vec<f32>>,
    pub sample_rate: u32,
}

impl SampleData {
    /// Decode a 16-bit WAV, downmixing to mono.
    pub fn load(artifact: &AudioArtifact) -> Result<Self, EarError> {
        artifact.ensure_present()?;
        let mut reader = hound::WavReader::open(&artifact.path)
            .map_err(|e| EarError::FileError(e.to_string()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Result<Vec<f32>, _> = reader.samples::<i16>()
            .map(|r| r.map(|s| s as f32 / 32768.0)) // i16 audio samples range from -32768 to 32767
            .collect();
        let interleaved = interleaved.map_err(|e| EarError::FileError(e.to_string()))?;

        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        Ok(SampleData { samples: Arc::new(samples), sample_rate: spec.sample_rate })
    }

    #[inline]
    fn interpolate(&self, src_pos: f64) -> f32 {
        let src_idx = src_pos as usize;
        let len = self.samples.len();

        if src_idx >= len {
            return 0.0;
        }

        // Linear interpolation
        if src_idx < len - 1 {
            let frac = (src_pos - src_idx as f64) as f32;
            let s1 = self.samples[src_idx];
            let s2 = self.samples[src_idx + 1];
            s1 * (1.0 - frac) + s2 * frac
        } else {
            self.samples[src_idx]
        }
    }
}

struct PlaybackCursor {
    data: SampleData,
    position: f64, // in source samples
    step: f64,     // source samples per output frame
}

impl PlaybackCursor {
    fn finished(&self) -> bool {
        self.position >= self.data.samples.len() as f64
    }
}

/// Plays artifacts on the default output device through cpal.
pub struct CpalPlayer {
    stream_config: StreamConfig,
    sample_rate: f32,
    cursor: Arc<Mutex<Option<PlaybackCursor>>>,
    stream: Option<Stream>,
}

impl CpalPlayer {
    pub fn new() -> Result<Self, EarError> {
        let host = cpal::default_host();
        let device = host.default_output_device()
            .ok_or_else(|| EarError::AudioError("No output device found".to_string()))?;
        let config = device.default_output_config()
            .map_err(|e| EarError::AudioError(e.to_string()))?;
        let stream_config = config.config();

        Ok(CpalPlayer {
            sample_rate: stream_config.sample_rate.0 as f32,
            stream_config,
            cursor: Arc::new(Mutex::new(None)),
            stream: None,
        })
    }

    fn start_stream(&mut self) -> Result<(), EarError> {
        let host = cpal::default_host();
        let device = host.default_output_device()
            .ok_or_else(|| EarError::AudioError("No output device".to_string()))?;

        let config = self.stream_config.clone();
        let channels = config.channels.max(1) as usize;
        let cursor = Arc::clone(&self.cursor);

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let Ok(mut guard) = cursor.lock() else {
                    data.iter_mut().for_each(|s| *s = 0.0);
                    return;
                };
                if guard.as_ref().is_some_and(|c| c.finished()) {
                    *guard = None; // round audio played out
                }
                let Some(cursor) = guard.as_mut() else {
                    data.iter_mut().for_each(|s| *s = 0.0);
                    return;
                };

                for frame in data.chunks_mut(channels) {
                    let value = cursor.data.interpolate(cursor.position);
                    cursor.position += cursor.step;
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                }
            },
            |err| error!("Stream error: {}", err),
            None,
        ).map_err(|e| EarError::AudioError(e.to_string()))?;

        stream.play().map_err(|e| EarError::AudioError(e.to_string()))?;
        self.stream = Some(stream);
        Ok(())
    }
}

impl AudioPlayer for CpalPlayer {
    fn play(&mut self, artifact: &AudioArtifact) -> Result<(), EarError> {
        let data = SampleData::load(artifact)?;
        self.stop();

        let step = data.sample_rate as f64 / self.sample_rate as f64;
        *self.cursor.lock().map_err(|_| EarError::AudioError("playback state poisoned".to_string()))? =
            Some(PlaybackCursor { data, position: 0.0, step });

        self.start_stream()?;
        debug!("Playing {}", artifact.path.display());
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
        if let Ok(mut guard) = self.cursor.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::write_wav;
    use std::path::PathBuf;

    #[test]
    fn test_null_player_requires_artifact() {
        let artifact = AudioArtifact {
            path: PathBuf::from("definitely/not/here.wav"),
            sample_rate: 44100,
            sample_count: 0,
        };
        assert!(matches!(NullPlayer.play(&artifact), Err(EarError::MissingArtifact(_))));
    }

    #[test]
    fn test_load_round_trips_levels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, &[0.0, 0.5, -0.5, 1.0], 8000).unwrap();
        let artifact = AudioArtifact { path, sample_rate: 8000, sample_count: 4 };

        let data = SampleData::load(&artifact).unwrap();
        assert_eq!(data.sample_rate, 8000);
        assert_eq!(data.samples.len(), 4);
        assert!((data.samples[1] - 0.5).abs() < 1e-3);
        assert!((data.samples[2] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation() {
        let data = SampleData { samples: Arc::new(vec![0.0, 1.0, 0.0]), sample_rate: 8000 };
        assert!((data.interpolate(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(data.interpolate(2.0), 0.0);
        assert_eq!(data.interpolate(3.5), 0.0);
    }
}
