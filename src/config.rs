use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::clock::DEFAULT_TICK;
use crate::difficulty::{DifficultyProfile, DifficultyTier, ScoreState};
use crate::error::EarError;
use crate::instrument::Instrument;
use crate::key::{Key, SolfegeMapping};
use crate::mode::Mode;
use crate::render::RenderSettings;
use crate::synth::DEFAULT_SAMPLE_RATE;

// Upper bounds for a custom profile; MIDI spans a little over ten octaves.
const MAX_NOTES: f64 = 1024.0;
const MAX_OCTAVES: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub mode: String,
    pub custom_mode: Vec<i32>,
    pub key: Key,
    pub difficulty: DifficultyTier,
    pub custom_profile: DifficultyProfile, // used when `difficulty` is Custom
    pub score: ScoreState,
    pub sample_rate: u32,
    pub render: RenderSettings,
    pub instrument: Instrument,
    pub workdir: PathBuf,
    pub tick: Duration,
    pub solfege: SolfegeMapping,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            mode: Mode::default().name().to_string(),
            custom_mode: Vec::new(),
            key: Key::default(),
            difficulty: DifficultyTier::Custom,
            custom_profile: DifficultyTier::Custom.profile(),
            score: ScoreState::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            render: RenderSettings::default(),
            instrument: Instrument::default(),
            workdir: PathBuf::from("round_audio"),
            tick: DEFAULT_TICK,
            solfege: SolfegeMapping::Fixed,
            seed: None,
        }
    }
}

impl SessionConfig {
    /// Profile a new session starts with, always a fresh copy.
    pub fn initial_profile(&self) -> DifficultyProfile {
        match self.difficulty {
            DifficultyTier::Custom => self.custom_profile,
            tier => tier.profile(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EarError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EarError::FileError(format!("{}: {}", path.display(), e)))?;
        Self::from_text(&content)
    }

    /// Parse a `key: value` session profile. `//` starts a comment line.
    pub fn from_text(content: &str) -> Result<Self, EarError> {
        let mut config = SessionConfig::default();
        let mut tick_hz: Option<f64> = None;

        macro_rules! parse_field {
            ($line:expr, $prefix:expr, $field:expr) => {
                if let Some(v) = $line.strip_prefix($prefix) {
                    $field = v.trim().parse()
                        .map_err(|_| EarError::ParseError(format!("Invalid {}", $prefix)))?;
                    continue;
                }
            };
        }

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") { continue; } // Comments (//) & empty lines

            if let Some(v) = line.strip_prefix("mode:") {
                config.mode = Mode::named(v)?.name().to_string();
            } else if let Some(v) = line.strip_prefix("custom_mode:") {
                let degrees: Result<Vec<i32>, _> = v
                    .split(',')
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .map(|n| n.parse::<i32>())
                    .collect();
                config.custom_mode = degrees
                    .map_err(|_| EarError::ParseError("Invalid custom_mode:".to_string()))?;
            } else if let Some(v) = line.strip_prefix("key:") {
                config.key = v.parse()?;
            } else if let Some(v) = line.strip_prefix("difficulty:") {
                config.difficulty = v.parse()?;
            } else if let Some(v) = line.strip_prefix("waveform:") {
                config.instrument.waveform = v.parse()?;
            } else if let Some(v) = line.strip_prefix("reference:") {
                config.render.reference = v.parse()?;
            } else if let Some(v) = line.strip_prefix("solfege:") {
                config.solfege = v.parse()?;
            } else if let Some(v) = line.strip_prefix("workdir:") {
                config.workdir = PathBuf::from(v.trim());
            } else if let Some(v) = line.strip_prefix("seed:") {
                config.seed = Some(v.trim().parse()
                    .map_err(|_| EarError::ParseError("Invalid seed:".to_string()))?);
            } else if let Some(v) = line.strip_prefix("tick_hz:") {
                tick_hz = Some(v.trim().parse()
                    .map_err(|_| EarError::ParseError("Invalid tick_hz:".to_string()))?);
            } else {
                parse_field!(line, "number_of_notes:", config.custom_profile.number_of_notes);
                parse_field!(line, "octave_range:", config.custom_profile.octave_range);
                parse_field!(line, "duration:", config.custom_profile.duration);
                parse_field!(line, "required_gamepoints:", config.score.required_gamepoints);
                parse_field!(line, "level_up_scalar:", config.score.level_up_scalar);
                parse_field!(line, "parameter_scalar:", config.score.parameter_scalar);
                parse_field!(line, "sample_rate:", config.sample_rate);
                parse_field!(line, "silence:", config.render.silence);
                parse_field!(line, "chord_duration:", config.render.chord_duration);
                parse_field!(line, "attack:", config.instrument.attack);
                parse_field!(line, "decay:", config.instrument.decay);
                parse_field!(line, "sustain:", config.instrument.sustain);
                parse_field!(line, "release:", config.instrument.release);
                parse_field!(line, "volume:", config.instrument.volume);
                warn!("Ignoring unknown config line: '{}'", line);
            }
        }

        if let Some(hz) = tick_hz {
            config.tick = Duration::try_from_secs_f64(1.0 / hz)
                .map_err(|_| EarError::Config(format!("tick_hz out of range: {}", hz)))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EarError> {
        let p = &self.custom_profile;
        if !((1.0..=MAX_NOTES).contains(&p.number_of_notes)
            && (1.0..=MAX_OCTAVES).contains(&p.octave_range)
            && p.duration > 0.0
            && p.duration.is_finite())
        {
            return Err(EarError::Config(format!(
                "custom difficulty needs number_of_notes in 1..={}, octave_range in 1..={}, finite duration > 0 (got {:?})",
                MAX_NOTES, MAX_OCTAVES, p
            )));
        }
        let s = &self.score;
        if ![s.required_gamepoints, s.level_up_scalar, s.parameter_scalar].iter().all(|v| v.is_finite())
            || !(s.required_gamepoints > 0.0 && s.level_up_scalar > 1.0 && s.parameter_scalar > 0.0)
        {
            return Err(EarError::Config(
                "required_gamepoints must be positive, level_up_scalar above 1 and parameter_scalar positive".to_string(),
            ));
        }
        let r = &self.render;
        if !(r.silence >= 0.0 && r.silence.is_finite() && r.chord_duration >= 0.0 && r.chord_duration.is_finite()) {
            return Err(EarError::Config("silence and chord_duration must be finite and non-negative".to_string()));
        }
        let i = &self.instrument;
        if ![i.attack, i.decay, i.sustain, i.release, i.volume].iter().all(|v| v.is_finite() && *v >= 0.0) {
            return Err(EarError::Config("instrument envelope and volume must be finite and non-negative".to_string()));
        }
        if self.tick.is_zero() {
            return Err(EarError::Config("tick must be longer than zero".to_string()));
        }
        if self.sample_rate == 0 {
            return Err(EarError::Config("sample_rate must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ReferenceCue;
    use crate::waveform::WaveformType;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.mode, "Minor Penta");
        assert_eq!(config.key.name(), "C");
        assert_eq!(config.initial_profile().note_count(), 7);
        assert_eq!(config.score.required_gamepoints, 4.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_profile() {
        let text = "
            // evening practice
            mode: dorian
            key: Eb
            difficulty: hard
            waveform: triangle
            reference: cadence
            solfege: transposed
            silence: 0.5
            sample_rate: 22050
            seed: 99
            tick_hz: 120
            custom_mode: 60, 62, 67
        ";
        let config = SessionConfig::from_text(text).unwrap();
        assert_eq!(config.mode, "Dorian");
        assert_eq!(config.key.adjustment(), 3);
        assert_eq!(config.difficulty, DifficultyTier::Hard);
        assert_eq!(config.initial_profile(), DifficultyTier::Hard.profile());
        assert_eq!(config.instrument.waveform, WaveformType::Triangle);
        assert_eq!(config.render.reference, ReferenceCue::Cadence);
        assert_eq!(config.solfege, SolfegeMapping::Transposed);
        assert_eq!(config.render.silence, 0.5);
        assert_eq!(config.sample_rate, 22050);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.custom_mode, vec![60, 62, 67]);
        assert!((config.tick.as_secs_f64() - 1.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_profile_fields() {
        let config = SessionConfig::from_text("number_of_notes: 4\noctave_range: 2\nduration: 0.75").unwrap();
        let p = config.initial_profile();
        assert_eq!(p.note_count(), 4);
        assert_eq!(p.octaves(), 2);
        assert_eq!(p.duration, 0.75);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(SessionConfig::from_text("mode: Bebop"), Err(EarError::UnknownMode(_))));
        assert!(matches!(SessionConfig::from_text("key: H"), Err(EarError::UnknownKey(_))));
        assert!(matches!(SessionConfig::from_text("duration: fast"), Err(EarError::ParseError(_))));
        assert!(matches!(SessionConfig::from_text("duration: 0"), Err(EarError::Config(_))));
        assert!(matches!(SessionConfig::from_text("level_up_scalar: 1.0"), Err(EarError::Config(_))));

        for line in [
            "number_of_notes: inf",
            "number_of_notes: 1e300",
            "octave_range: inf",
            "duration: inf",
            "duration: NaN",
            "required_gamepoints: inf",
            "parameter_scalar: inf",
            "silence: inf",
            "chord_duration: -1",
            "volume: inf",
            "tick_hz: inf",
            "tick_hz: 1e-320",
            "tick_hz: 0",
            "tick_hz: -60",
        ] {
            assert!(matches!(SessionConfig::from_text(line), Err(EarError::Config(_))), "{}", line);
        }
    }

    #[test]
    fn test_zero_tick_rejected() {
        let config = SessionConfig { tick: Duration::ZERO, ..SessionConfig::default() };
        assert!(matches!(config.validate(), Err(EarError::Config(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.ear");
        std::fs::write(&path, "mode: Ionian\nworkdir: /tmp/rounds\n").unwrap();
        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.mode, "Ionian");
        assert_eq!(config.workdir, PathBuf::from("/tmp/rounds"));
        assert!(matches!(SessionConfig::load(dir.path().join("missing.ear")), Err(EarError::FileError(_))));
    }
}
