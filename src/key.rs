use std::fmt;
use std::str::FromStr;
use crate::error::EarError;

// Accepted key spellings and their semitone shift from C. Sharps and flats
// that name the same pitch share an adjustment, except F#/Gb which sit on
// either side of C.
const KEY_TABLE: &[(&str, i32)] = &[
    ("C", 0), ("C#", 1), ("Db", 1), ("D", 2), ("D#", 3), ("Eb", 3),
    ("E", 4), ("F", 5), ("F#", 6), ("Gb", -6), ("G", -5), ("G#", -4),
    ("Ab", -4), ("A", -3), ("A#", -2), ("Bb", -2), ("B", -1),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    name: &'static str,
    adjustment: i32,
}

impl Key {
    pub const STANDARD: [&'static str; 12] = ["C", "Db", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Semitones added to every generated note, always within `[-6, 6]`.
    pub fn adjustment(&self) -> i32 {
        self.adjustment
    }
}

impl Default for Key {
    fn default() -> Self {
        Key { name: "C", adjustment: 0 }
    }
}

impl FromStr for Key {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        // Case matters only for the accidental: "bb" is B-flat, "b" is B
        KEY_TABLE
            .iter()
            .find(|(name, _)| {
                let mut a = name.chars();
                let mut b = wanted.chars();
                match (a.next(), b.next()) {
                    (Some(x), Some(y)) if x.eq_ignore_ascii_case(&y) => a.eq(b),
                    _ => false,
                }
            })
            .map(|&(name, adjustment)| Key { name, adjustment })
            .ok_or_else(|| EarError::UnknownKey(wanted.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Chromatic solfege syllables, the guess input alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solfege {
    Do, Ra, Re, Me, Mi, Fa, Fi, Sol, Le, La, Te, Ti,
}

impl Solfege {
    pub const ALL: [Solfege; 12] = [
        Solfege::Do, Solfege::Ra, Solfege::Re, Solfege::Me, Solfege::Mi, Solfege::Fa,
        Solfege::Fi, Solfege::Sol, Solfege::Le, Solfege::La, Solfege::Te, Solfege::Ti,
    ];

    pub fn syllable(self) -> &'static str {
        match self {
            Solfege::Do => "do",
            Solfege::Ra => "ra",
            Solfege::Re => "re",
            Solfege::Me => "me",
            Solfege::Mi => "mi",
            Solfege::Fa => "fa",
            Solfege::Fi => "fi",
            Solfege::Sol => "sol",
            Solfege::Le => "le",
            Solfege::La => "la",
            Solfege::Te => "te",
            Solfege::Ti => "ti",
        }
    }

    pub fn semitones(self) -> i32 {
        Solfege::ALL.iter().position(|s| *s == self).unwrap_or(0) as i32
    }
}

impl FromStr for Solfege {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Solfege::ALL
            .into_iter()
            .find(|syl| syl.syllable() == wanted)
            .ok_or_else(|| EarError::UnknownSolfege(s.trim().to_string()))
    }
}

/// How a syllable becomes an absolute note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolfegeMapping {
    /// `do` is always middle C (60), whatever the session key.
    #[default]
    Fixed,
    /// `do` follows the session key.
    Transposed,
}

impl SolfegeMapping {
    pub fn note(self, syllable: Solfege, key: Key) -> i32 {
        match self {
            SolfegeMapping::Fixed => 60 + syllable.semitones(),
            SolfegeMapping::Transposed => 60 + syllable.semitones() + key.adjustment(),
        }
    }

    /// Shift applied to the canonical pre-octave sequence so it lines up with
    /// guesses produced by this mapping.
    pub fn answer_shift(self, key: Key) -> i32 {
        match self {
            SolfegeMapping::Fixed => 0,
            SolfegeMapping::Transposed => key.adjustment(),
        }
    }
}

impl FromStr for SolfegeMapping {
    type Err = EarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(SolfegeMapping::Fixed),
            "transposed" | "movable" => Ok(SolfegeMapping::Transposed),
            other => Err(EarError::ParseError(format!("Unknown solfege mapping: {}", other))),
        }
    }
}
