// Round audio: reference cue, a silence gap, then the test notes, written as
// one 16-bit mono WAV into a working directory that holds nothing else.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::cadence::Cadence;
use crate::error::EarError;
use crate::key::Key;
use crate::mode::Mode;
use crate::synth::Synthesizer;
use crate::utils::{join_notes, midi_to_frequency};

pub const ARTIFACT_DELIMITER: &str = "_";
pub const ARTIFACT_SUFFIX: &str = "_audiofile.wav";
// Longer note lists are cut here and tagged with a hash of the full list.
const MAX_ARTIFACT_STEM: usize = 160;

/// What is played before the test notes to establish the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceCue {
    /// Tonic chord of the active mode.
    #[default]
    ModeChord,
    /// Dominant chord, a rest, then the tonic chord.
    Cadence,
}

impl FromStr for ReferenceCue {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chord" | "mode_chord" => Ok(ReferenceCue::ModeChord),
            "cadence" => Ok(ReferenceCue::Cadence),
            other => Err(EarError::ParseError(format!("Unknown reference cue: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub silence: f32,        // seconds between cue and notes
    pub chord_duration: f32, // seconds
    pub reference: ReferenceCue,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            silence: 1.0,
            chord_duration: 2.0,
            reference: ReferenceCue::ModeChord,
        }
    }
}

/// Handle to a rendered round, returned by the renderer and handed to the
/// player as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub sample_rate: u32,
    pub sample_count: usize,
}

impl AudioArtifact {
    pub fn duration_secs(&self) -> f32 {
        self.sample_count as f32 / self.sample_rate as f32
    }

    pub fn ensure_present(&self) -> Result<(), EarError> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(EarError::MissingArtifact(self.path.clone()))
        }
    }
}

pub struct RenderRequest<'a> {
    pub notes: &'a [i32],
    pub key: Key,
    pub mode: &'a Mode,
    pub duration: f32, // per note
}

#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: usize,
    pub failures: Vec<(PathBuf, String)>,
}

/// Directory owned by one session for its round audio.
#[derive(Debug, Clone)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WorkDir { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove everything inside the directory, creating it if missing.
    /// An entry that can't be removed is logged and recorded, and the sweep
    /// moves on to the next one.
    pub fn clear(&self) -> Result<CleanupReport, EarError> {
        fs::create_dir_all(&self.path)
            .map_err(|e| EarError::FileError(format!("{}: {}", self.path.display(), e)))?;
        let entries = fs::read_dir(&self.path)
            .map_err(|e| EarError::FileError(format!("{}: {}", self.path.display(), e)))?;

        let mut report = CleanupReport::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read entry in {}: {}", self.path.display(), e);
                    report.failures.push((self.path.clone(), e.to_string()));
                    continue;
                }
            };
            let path = entry.path();
            let result = match entry.file_type() {
                Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path),
                Ok(_) => fs::remove_file(&path),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to delete {}: {}", path.display(), e);
                    report.failures.push((path, e.to_string()));
                }
            }
        }

        debug!(dir = %self.path.display(), removed = report.removed, "cleared working directory");
        Ok(report)
    }
}

pub struct WaveformRenderer {
    synth: Box<dyn Synthesizer>,
    workdir: WorkDir,
    settings: RenderSettings,
}

impl WaveformRenderer {
    pub fn new(synth: Box<dyn Synthesizer>, workdir: WorkDir, settings: RenderSettings) -> Self {
        WaveformRenderer { synth, workdir, settings }
    }

    pub fn workdir(&self) -> &WorkDir {
        &self.workdir
    }

    /// `60_63_67_audiofile.wav`. Long rounds keep a prefix of the notes plus
    /// a hash of all of them so the name stays within filesystem limits.
    pub fn artifact_name(notes: &[i32]) -> String {
        let stem = join_notes(notes, ARTIFACT_DELIMITER);
        if stem.len() <= MAX_ARTIFACT_STEM {
            return format!("{}{}", stem, ARTIFACT_SUFFIX);
        }

        let mut hasher = DefaultHasher::new();
        notes.hash(&mut hasher);
        let cut = stem[..MAX_ARTIFACT_STEM].rfind(ARTIFACT_DELIMITER).unwrap_or(MAX_ARTIFACT_STEM);
        format!("{}{}{:016x}{}", &stem[..cut], ARTIFACT_DELIMITER, hasher.finish(), ARTIFACT_SUFFIX)
    }

    /// Cue + silence + notes, peak-normalized when the mix clips.
    pub fn compose(&self, request: &RenderRequest) -> Vec<f32> {
        let root = 60 + request.key.adjustment();
        let sample_rate = self.synth.sample_rate() as f32;

        let mut buffer = match self.settings.reference {
            ReferenceCue::ModeChord => self.synth.chord(root, self.settings.chord_duration, request.mode),
            ReferenceCue::Cadence => {
                let cadence = Cadence::for_key(request.key);
                let mut cue = self.synth.cluster(&cadence.dominant, request.duration);
                cue.extend(silence(request.duration, sample_rate));
                cue.extend(self.synth.cluster(&cadence.tonic, request.duration));
                cue
            }
        };

        buffer.extend(silence(self.settings.silence, sample_rate));
        for note in request.notes {
            buffer.extend(self.synth.note(midi_to_frequency(*note), request.duration));
        }

        // Normalize
        let peak = buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if peak > 1.0 {
            buffer.iter_mut().for_each(|s| *s /= peak);
        }
        buffer
    }

    /// Clear the working directory, then write this round's artifact into it.
    pub fn render(&self, request: &RenderRequest) -> Result<AudioArtifact, EarError> {
        let samples = self.compose(request);
        self.workdir.clear()?;

        let path = self.workdir.path().join(Self::artifact_name(request.notes));
        write_wav(&path, &samples, self.synth.sample_rate())?;

        let artifact = AudioArtifact {
            path,
            sample_rate: self.synth.sample_rate(),
            sample_count: samples.len(),
        };
        info!("Rendered {} ({:.2}s)", artifact.path.display(), artifact.duration_secs());
        Ok(artifact)
    }
}

fn silence(duration: f32, sample_rate: f32) -> Vec<f32> {
    vec![0.0; (duration.max(0.0) * sample_rate) as usize]
}

pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), EarError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let file_err = |e: hound::Error| EarError::FileError(format!("{}: {}", path.display(), e));

    let mut writer = hound::WavWriter::create(path, spec).map_err(file_err)?;
    for s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).map_err(file_err)?;
    }
    writer.finalize().map_err(file_err)
}
