// Difficulty tiers, the active difficulty profile and the leveling state
// machine that rescales it.
//
// Tier templates are produced by value from `DifficultyTier::profile`; the
// session only ever owns a copy, so level-up scaling never leaks back into a
// template or into another session picking the same tier.

use std::fmt;
use std::str::FromStr;
use tracing::info;
use crate::error::EarError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub number_of_notes: f64,
    pub octave_range: f64,
    pub duration: f64, // seconds per note
}

impl DifficultyProfile {
    /// Sequence length for a round, rounded and never below one.
    pub fn note_count(&self) -> usize {
        self.number_of_notes.round().max(1.0) as usize
    }

    /// Number of octaves notes may be spread over, truncated and never below one.
    pub fn octaves(&self) -> u32 {
        self.octave_range.trunc().max(1.0) as u32
    }

    fn scale(&mut self, factor: f64) {
        self.octave_range *= factor;
        self.duration /= factor;
        self.number_of_notes *= factor;
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        DifficultyTier::Custom.profile()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
    Impossible,
    #[default]
    Custom,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 5] = [
        DifficultyTier::Easy,
        DifficultyTier::Medium,
        DifficultyTier::Hard,
        DifficultyTier::Impossible,
        DifficultyTier::Custom,
    ];

    /// A fresh copy of the tier's template.
    pub fn profile(self) -> DifficultyProfile {
        let (number_of_notes, octave_range, duration) = match self {
            DifficultyTier::Easy => (2.0, 1.0, 2.0),
            DifficultyTier::Medium => (3.0, 1.0, 1.5),
            DifficultyTier::Hard => (5.0, 2.0, 1.0),
            DifficultyTier::Impossible => (16.0, 3.0, 0.5),
            DifficultyTier::Custom => (7.0, 1.0, 0.5),
        };
        DifficultyProfile { number_of_notes, octave_range, duration }
    }

    pub fn name(self) -> &'static str {
        match self {
            DifficultyTier::Easy => "Easy",
            DifficultyTier::Medium => "Medium",
            DifficultyTier::Hard => "Hard",
            DifficultyTier::Impossible => "Impossible",
            DifficultyTier::Custom => "Custom",
        }
    }
}

impl FromStr for DifficultyTier {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DifficultyTier::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EarError::UnknownDifficulty(s.trim().to_string()))
    }
}

impl fmt::Display for DifficultyTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreState {
    pub gamepoints: f64,
    pub required_gamepoints: f64,
    pub current_level: u32,
    pub level_up_scalar: f64,
    pub parameter_scalar: f64,
}

impl Default for ScoreState {
    fn default() -> Self {
        ScoreState {
            gamepoints: 0.0,
            required_gamepoints: 4.0,
            current_level: 0,
            level_up_scalar: 1.1,
            parameter_scalar: 1.3,
        }
    }
}

/// Owns the score and the active profile. The profile only changes through
/// `level_up`; score computation never touches it directly.
#[derive(Debug, Clone)]
pub struct DifficultyProgression {
    score: ScoreState,
    profile: DifficultyProfile,
}

impl DifficultyProgression {
    pub fn new(score: ScoreState, profile: DifficultyProfile) -> Self {
        DifficultyProgression { score, profile }
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Swap in another profile (a tier selection). Score and level carry over.
    pub fn select_profile(&mut self, profile: DifficultyProfile) {
        self.profile = profile;
    }

    /// Add a round's points and run the single level-up check.
    /// Returns true when a level was gained.
    pub fn award(&mut self, points: f64) -> bool {
        self.score.gamepoints += points;
        if self.score.gamepoints > self.score.required_gamepoints {
            self.level_up();
            true
        } else {
            false
        }
    }

    fn level_up(&mut self) {
        let s = &mut self.score;
        s.current_level += 1;
        self.profile.scale(s.parameter_scalar);
        s.gamepoints -= s.required_gamepoints;
        s.required_gamepoints *= s.level_up_scalar;

        info!(
            level = s.current_level,
            notes = self.profile.note_count(),
            octaves = self.profile.octaves(),
            duration = self.profile.duration,
            "level up"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_level_up_at_threshold() {
        let mut p = DifficultyProgression::new(ScoreState::default(), DifficultyTier::Custom.profile());
        assert!(!p.award(4.0));
        assert_eq!(p.score().current_level, 0);
        assert!(approx(p.score().gamepoints, 4.0));
    }

    #[test]
    fn test_level_up_transition() {
        let mut p = DifficultyProgression::new(ScoreState::default(), DifficultyTier::Custom.profile());
        for _ in 0..3 {
            assert!(!p.award(1.3));
        }
        assert!(p.award(1.3)); // 5.2 > 4.0

        let s = p.score();
        assert_eq!(s.current_level, 1);
        assert!(approx(s.gamepoints, 5.2 - 4.0));
        assert!(approx(s.required_gamepoints, 4.4));

        let profile = p.profile();
        assert!(approx(profile.number_of_notes, 7.0 * 1.3));
        assert!(approx(profile.octave_range, 1.3));
        assert!(approx(profile.duration, 0.5 / 1.3));
        assert_eq!(profile.note_count(), 9);
        assert_eq!(profile.octaves(), 1);
    }

    #[test]
    fn test_single_level_up_per_award() {
        let mut p = DifficultyProgression::new(ScoreState::default(), DifficultyTier::Easy.profile());
        assert!(p.award(20.0));
        assert_eq!(p.score().current_level, 1);
        // still above the new threshold, but only one transition happened
        assert!(p.score().gamepoints > p.score().required_gamepoints);
    }

    #[test]
    fn test_templates_are_not_mutated() {
        let mut p = DifficultyProgression::new(ScoreState::default(), DifficultyTier::Hard.profile());
        p.award(10.0);
        assert_ne!(*p.profile(), DifficultyTier::Hard.profile());
        assert_eq!(DifficultyTier::Hard.profile().number_of_notes, 5.0);
    }

    #[test]
    fn test_required_strictly_increases() {
        let mut p = DifficultyProgression::new(ScoreState::default(), DifficultyTier::Custom.profile());
        let mut last = p.score().required_gamepoints;
        for _ in 0..5 {
            p.award(100.0);
            assert!(p.score().required_gamepoints > last);
            last = p.score().required_gamepoints;
        }
        assert_eq!(p.score().current_level, 5);
    }

    #[test]
    fn test_tier_names() {
        assert_eq!("impossible".parse::<DifficultyTier>().unwrap(), DifficultyTier::Impossible);
        assert!(matches!("Nightmare".parse::<DifficultyTier>(), Err(EarError::UnknownDifficulty(_))));
    }
}
