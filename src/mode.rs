// Named modes available for sequence generation.
//
// Every mode is stored as absolute MIDI notes rooted on middle C (60), so a
// generated degree is already a playable pitch before octave and key
// adjustment. The trailing "Custom" entry is empty until filled by the user.

use crate::error::EarError;

pub const MODE_TABLE: &[(&str, &[i32])] = &[
    ("Ionian", &[60, 62, 64, 65, 67, 69, 71]),
    ("Dorian", &[60, 62, 63, 65, 67, 69, 70]),
    ("Phrygian", &[60, 61, 63, 65, 67, 68, 70]),
    ("Lydian", &[60, 62, 64, 66, 67, 69, 71]),
    ("Mixolydian", &[60, 62, 64, 65, 67, 69, 70]),
    ("Aeolian", &[60, 62, 63, 65, 67, 68, 70]),
    ("Locrian", &[60, 61, 63, 65, 66, 68, 70]),
    ("Melodic Minor", &[60, 62, 63, 65, 67, 69, 71]),
    ("Dorian b2", &[60, 61, 63, 65, 67, 69, 71]),
    ("Lydian Augmented", &[60, 62, 64, 66, 68, 69, 71]),
    ("Lydian Dominant", &[60, 62, 64, 66, 67, 69, 70]),
    ("Mixolydian b6", &[60, 62, 64, 65, 67, 68, 70]),
    ("Locrian #2", &[60, 62, 63, 65, 66, 68, 70]),
    ("Altered Scale", &[60, 61, 63, 64, 66, 68, 70]),
    ("Chromatic", &[60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71]),
    ("Whole", &[60, 62, 64, 66, 68, 70]),
    ("Major Penta", &[60, 62, 64, 67, 69]),
    ("Minor Penta", &[60, 63, 64, 67, 70]),
    ("Custom", &[]),
];

pub const CUSTOM_MODE: &str = "Custom";

/// A named, ordered set of absolute semitone offsets. Immutable once handed
/// to a round; changing mode replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    name: String,
    degrees: Vec<i32>,
}

impl Mode {
    /// Look a mode up by its table name (case-insensitive).
    pub fn named(name: &str) -> Result<Self, EarError> {
        let wanted = name.trim();
        MODE_TABLE
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(wanted))
            .map(|(n, degrees)| Mode { name: n.to_string(), degrees: degrees.to_vec() })
            .ok_or_else(|| EarError::UnknownMode(wanted.to_string()))
    }

    pub fn custom(degrees: Vec<i32>) -> Self {
        Mode { name: CUSTOM_MODE.to_string(), degrees }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn degrees(&self) -> &[i32] {
        &self.degrees
    }

    /// Number of distinct pitches, which bounds how long a non-repeating
    /// sequence can be.
    pub fn distinct_degrees(&self) -> usize {
        let mut sorted = self.degrees.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len()
    }

    /// Stacked-thirds triad on the first degree (1st, 3rd, 5th of the mode),
    /// as offsets from the mode root. Short modes wrap into the next octave.
    pub fn triad_offsets(&self) -> [i32; 3] {
        let Some(&root) = self.degrees.first() else {
            return [0, 4, 7];
        };
        let len = self.degrees.len();
        let pick = |step: usize| {
            let octave = (step / len) as i32;
            self.degrees[step % len] - root + octave * 12
        };
        [pick(0), pick(2), pick(4)]
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        MODE_TABLE.iter().map(|(n, _)| *n)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode { name: "Minor Penta".to_string(), degrees: vec![60, 63, 64, 67, 70] }
    }
}
