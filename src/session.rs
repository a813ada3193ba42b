// The ear-training session: one object owning mode/key/difficulty, the
// current round, the guess buffer, the clock and the audio collaborators.
//
// Front ends only go through the command methods (start, stop, submit_guess,
// remove_last_guess, replay, restart_round, set_*) and read state back via
// `snapshot`. A round is generate -> render -> play; once the guess buffer
// holds as many notes as the sequence it is scored and the next round starts.

use std::time::Duration;
use fastrand::Rng;
use tracing::{debug, info, warn};

use crate::cadence::Cadence;
use crate::clock::{ClockStatus, SessionClock};
use crate::config::SessionConfig;
use crate::difficulty::{DifficultyProfile, DifficultyProgression, DifficultyTier};
use crate::error::EarError;
use crate::guess::GuessBuffer;
use crate::key::{Key, Solfege};
use crate::mode::{Mode, CUSTOM_MODE};
use crate::playback::AudioPlayer;
use crate::render::{AudioArtifact, RenderRequest, WaveformRenderer, WorkDir};
use crate::scoring;
use crate::sequence::Sequence;
use crate::synth::{Synthesizer, ToneSynth};

#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub overall_match: bool,
    pub detailed_match: Vec<bool>,
    pub points_delta: f64,
    pub gamepoints: f64,
    pub leveled_up: bool,
    pub level: u32,
    pub answer: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GuessOutcome {
    Pending { filled: usize, needed: usize },
    Scored(RoundOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub elapsed: Duration,
    pub clock: ClockStatus,
    pub guesses: Vec<i32>,
    pub notes_needed: usize,
    pub rounds_played: u32,
    pub gamepoints: f64,
    pub required_gamepoints: f64,
    pub level: u32,
    pub profile: DifficultyProfile,
    pub mode: String,
    pub key: Key,
    pub cadence: Cadence,
    pub last_detailed_match: Vec<bool>,
}

struct Round {
    sequence: Sequence,
    artifact: AudioArtifact,
    key: Key, // key the round was generated in; guesses map against it
}

pub struct EarTrainingSession {
    config: SessionConfig,
    mode: Mode,
    key: Key,
    progression: DifficultyProgression,
    renderer: WaveformRenderer,
    player: Box<dyn AudioPlayer>,
    clock: SessionClock,
    guesses: GuessBuffer,
    rng: Rng,
    round: Option<Round>,
    last_detailed_match: Vec<bool>,
    rounds_played: u32,
}

impl EarTrainingSession {
    pub fn new(config: SessionConfig, player: Box<dyn AudioPlayer>) -> Result<Self, EarError> {
        let synth = ToneSynth::new(config.instrument.clone(), config.sample_rate);
        Self::with_synth(config, Box::new(synth), player)
    }

    pub fn with_synth(
        config: SessionConfig,
        synth: Box<dyn Synthesizer>,
        player: Box<dyn AudioPlayer>,
    ) -> Result<Self, EarError> {
        config.validate()?;
        let mode = resolve_mode(&config.mode, &config.custom_mode)?;
        let renderer = WaveformRenderer::new(synth, WorkDir::new(config.workdir.clone()), config.render.clone());
        let rng = match config.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };

        Ok(EarTrainingSession {
            key: config.key,
            progression: DifficultyProgression::new(config.score, config.initial_profile()),
            clock: SessionClock::new(config.tick),
            guesses: GuessBuffer::new(),
            round: None,
            last_detailed_match: Vec::new(),
            rounds_played: 0,
            mode,
            renderer,
            player,
            rng,
            config,
        })
    }

    /// Start the clock and the first round.
    pub fn start(&mut self) -> Result<(), EarError> {
        self.clock.start()?;
        info!(mode = self.mode.name(), key = self.key.name(), "session started");
        self.next_round()
    }

    /// Stop the clock, silence playback and empty the working directory.
    /// The directory is only touched once the clock thread has exited.
    pub fn stop(&mut self) -> Result<(), EarError> {
        let clock_result = self.clock.stop();
        self.player.stop();
        self.round = None;
        self.guesses.clear();

        let report = self.renderer.workdir().clear()?;
        if !report.failures.is_empty() {
            warn!("{} entries left behind in {}", report.failures.len(), self.renderer.workdir().path().display());
        }
        info!(elapsed = self.clock.elapsed_secs(), "session stopped");
        clock_result
    }

    pub fn is_round_active(&self) -> bool {
        self.round.is_some()
    }

    /// Record one solfege guess. Completing the sequence scores the round and
    /// starts the next one.
    pub fn submit_guess(&mut self, token: &str) -> Result<GuessOutcome, EarError> {
        let syllable: Solfege = token.parse()?;
        self.submit_solfege(syllable)
    }

    pub fn submit_solfege(&mut self, syllable: Solfege) -> Result<GuessOutcome, EarError> {
        let (needed, key) = self.round.as_ref().map(|r| (r.sequence.len(), r.key)).ok_or(EarError::NoActiveRound)?;
        let note = self.config.solfege.note(syllable, key);
        let filled = self.guesses.push(note);
        debug!(syllable = syllable.syllable(), note, filled, needed, "guess");

        if filled < needed {
            return Ok(GuessOutcome::Pending { filled, needed });
        }

        let outcome = self.score_round()?;
        self.next_round()?;
        Ok(GuessOutcome::Scored(outcome))
    }

    pub fn remove_last_guess(&mut self) -> Option<i32> {
        self.guesses.pop()
    }

    /// Play the current round's audio again.
    pub fn replay(&mut self) -> Result<(), EarError> {
        let round = self.round.as_ref().ok_or(EarError::NoActiveRound)?;
        self.player.play(&round.artifact)
    }

    /// Throw away the current round unscored and start a fresh one.
    pub fn restart_round(&mut self) -> Result<(), EarError> {
        self.next_round()
    }

    /// Switch mode for the following rounds. Unknown names leave the mode as it was.
    pub fn set_mode(&mut self, name: &str) -> Result<(), EarError> {
        self.mode = resolve_mode(name, &self.config.custom_mode)?;
        info!(mode = self.mode.name(), "mode changed");
        Ok(())
    }

    pub fn set_custom_mode(&mut self, degrees: Vec<i32>) {
        self.config.custom_mode = degrees;
        if self.mode.name() == CUSTOM_MODE {
            self.mode = Mode::custom(self.config.custom_mode.clone());
        }
    }

    pub fn set_key(&mut self, name: &str) -> Result<(), EarError> {
        self.key = name.parse()?;
        info!(key = self.key.name(), "key changed");
        Ok(())
    }

    /// Replace the active profile with a fresh copy of a tier.
    pub fn set_difficulty(&mut self, tier: DifficultyTier) {
        let profile = match tier {
            DifficultyTier::Custom => self.config.custom_profile,
            other => other.profile(),
        };
        self.progression.select_profile(profile);
        info!(difficulty = tier.name(), "difficulty changed");
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn progression(&self) -> &DifficultyProgression {
        &self.progression
    }

    pub fn current_sequence(&self) -> Option<&Sequence> {
        self.round.as_ref().map(|r| &r.sequence)
    }

    pub fn current_artifact(&self) -> Option<&AudioArtifact> {
        self.round.as_ref().map(|r| &r.artifact)
    }

    /// Notes that would score the current round perfectly under the active
    /// solfege mapping. A key change only applies from the next round on.
    pub fn answer_key(&self) -> Option<Vec<i32>> {
        self.round
            .as_ref()
            .map(|r| r.sequence.answer_key(self.config.solfege.answer_shift(r.key)))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let score = self.progression.score();
        SessionSnapshot {
            elapsed: self.clock.elapsed(),
            clock: self.clock.status(),
            guesses: self.guesses.snapshot(),
            notes_needed: self.current_sequence().map_or(0, |s| s.len()),
            rounds_played: self.rounds_played,
            gamepoints: score.gamepoints,
            required_gamepoints: score.required_gamepoints,
            level: score.current_level,
            profile: *self.progression.profile(),
            mode: self.mode.name().to_string(),
            key: self.key,
            cadence: Cadence::for_key(self.key),
            last_detailed_match: self.last_detailed_match.clone(),
        }
    }

    fn score_round(&mut self) -> Result<RoundOutcome, EarError> {
        let answer = self.answer_key().ok_or(EarError::NoActiveRound)?;
        let guess = self.guesses.drain();
        let validation = scoring::validate(&answer, &guess);
        let leveled_up = self.progression.award(validation.points_delta);
        self.last_detailed_match = validation.detailed_match.clone();
        self.rounds_played += 1;

        let score = self.progression.score();
        info!(
            fraction = validation.fraction,
            points = validation.points_delta,
            gamepoints = score.gamepoints,
            "round scored"
        );

        Ok(RoundOutcome {
            overall_match: validation.overall_match,
            detailed_match: validation.detailed_match,
            points_delta: validation.points_delta,
            gamepoints: score.gamepoints,
            leveled_up,
            level: score.current_level,
            answer,
        })
    }

    fn next_round(&mut self) -> Result<(), EarError> {
        self.guesses.clear();
        self.round = None;

        let profile = *self.progression.profile();
        let sequence = Sequence::generate(&self.mode, &profile, self.key, &mut self.rng)?;
        let artifact = self.renderer.render(&RenderRequest {
            notes: sequence.absolute_notes(),
            key: self.key,
            mode: &self.mode,
            duration: profile.duration as f32,
        })?;
        self.player.play(&artifact)?;

        self.round = Some(Round { sequence, artifact, key: self.key });
        Ok(())
    }
}

fn resolve_mode(name: &str, custom_degrees: &[i32]) -> Result<Mode, EarError> {
    let mode = Mode::named(name)?;
    if mode.name() == CUSTOM_MODE {
        Ok(Mode::custom(custom_degrees.to_vec()))
    } else {
        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::SolfegeMapping;
    use crate::playback::NullPlayer;

    fn quiet_config(dir: &std::path::Path) -> SessionConfig {
        SessionConfig {
            workdir: dir.join("rounds"),
            sample_rate: 4000,
            seed: Some(17),
            tick: Duration::from_millis(2),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_guess_before_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EarTrainingSession::new(quiet_config(dir.path()), Box::new(NullPlayer)).unwrap();
        assert!(matches!(session.submit_guess("do"), Err(EarError::NoActiveRound)));
        assert!(session.snapshot().guesses.is_empty());
    }

    #[test]
    fn test_unknown_mode_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EarTrainingSession::new(quiet_config(dir.path()), Box::new(NullPlayer)).unwrap();
        assert!(matches!(session.set_mode("Altered"), Err(EarError::UnknownMode(_))));
        assert_eq!(session.mode().name(), "Minor Penta");
        session.set_mode("Altered Scale").unwrap();
        assert_eq!(session.mode().name(), "Altered Scale");
    }

    #[test]
    fn test_custom_mode_needs_degrees() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EarTrainingSession::new(quiet_config(dir.path()), Box::new(NullPlayer)).unwrap();
        session.set_mode("Custom").unwrap();
        assert!(matches!(session.restart_round(), Err(EarError::Config(_))));

        session.set_custom_mode(vec![60, 65, 67]);
        session.restart_round().unwrap();
        let seq = session.current_sequence().unwrap();
        assert!(seq.scale_degrees().iter().all(|n| [60, 65, 67].contains(n)));
    }

    #[test]
    fn test_key_change_mid_round_waits_for_next_round() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            key: "G".parse().unwrap(),
            solfege: SolfegeMapping::Transposed,
            ..quiet_config(dir.path())
        };
        let mut session = EarTrainingSession::new(config, Box::new(NullPlayer)).unwrap();
        session.start().unwrap();

        let answer = session.answer_key().unwrap();
        let g: Key = "G".parse().unwrap();
        let syllables: Vec<Solfege> = answer
            .iter()
            .map(|n| *Solfege::ALL.iter().find(|s| SolfegeMapping::Transposed.note(**s, g) == *n).unwrap())
            .collect();

        session.submit_solfege(syllables[0]).unwrap();
        session.set_key("D").unwrap();
        assert_eq!(session.answer_key().unwrap(), answer);

        let mut last = None;
        for s in &syllables[1..] {
            last = Some(session.submit_solfege(*s).unwrap());
        }
        match last.unwrap() {
            GuessOutcome::Scored(outcome) => {
                assert!(outcome.overall_match);
                assert_eq!(outcome.answer, answer);
            }
            other => panic!("expected a scored round, got {:?}", other),
        }

        // the next round is generated in D
        let d: Key = "D".parse().unwrap();
        let seq = session.current_sequence().unwrap().clone();
        assert_eq!(session.answer_key().unwrap(), seq.answer_key(d.adjustment()));
        session.stop().unwrap();
    }

    #[test]
    fn test_difficulty_selection_is_a_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = EarTrainingSession::new(quiet_config(dir.path()), Box::new(NullPlayer)).unwrap();
        session.set_difficulty(DifficultyTier::Easy);
        assert_eq!(*session.progression().profile(), DifficultyTier::Easy.profile());
        assert_eq!(session.snapshot().profile.note_count(), 2);
    }
}
