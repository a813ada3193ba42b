use fastrand::Rng;
use tracing::debug;

use crate::difficulty::DifficultyProfile;
use crate::error::EarError;
use crate::key::Key;
use crate::mode::Mode;

/// Chance that a note following one in the lowest octave stays there.
pub const STAY_LOW_PROBABILITY: f64 = 0.75;

/// One round's test material. `scale_degrees` is the canonical answer,
/// `absolute_notes` what actually gets played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    scale_degrees: Vec<i32>,
    octaves: Vec<u32>,
    absolute_notes: Vec<i32>,
}

impl Sequence {
    pub fn generate(mode: &Mode, profile: &DifficultyProfile, key: Key, rng: &mut Rng) -> Result<Self, EarError> {
        let scale_degrees = generate_degrees(mode, profile.note_count(), rng)?;
        let octaves = assign_octaves(profile.octaves(), scale_degrees.len(), rng);
        let sequence = Sequence::from_parts(scale_degrees, octaves, key);

        debug!(
            mode = mode.name(),
            degrees = ?sequence.scale_degrees,
            notes = ?sequence.absolute_notes,
            "generated test sequence"
        );
        Ok(sequence)
    }

    /// Combine degrees with their octave index and the key shift.
    pub fn from_parts(scale_degrees: Vec<i32>, octaves: Vec<u32>, key: Key) -> Self {
        let absolute_notes = scale_degrees
            .iter()
            .zip(&octaves)
            .map(|(note, octave)| note + (*octave as i32 - 1) * 12 + key.adjustment())
            .collect();
        Sequence { scale_degrees, octaves, absolute_notes }
    }

    pub fn scale_degrees(&self) -> &[i32] {
        &self.scale_degrees
    }

    pub fn octaves(&self) -> &[u32] {
        &self.octaves
    }

    pub fn absolute_notes(&self) -> &[i32] {
        &self.absolute_notes
    }

    pub fn len(&self) -> usize {
        self.scale_degrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scale_degrees.is_empty()
    }

    /// Canonical answer shifted into the guess space of a solfege mapping.
    pub fn answer_key(&self, shift: i32) -> Vec<i32> {
        self.scale_degrees.iter().map(|n| n + shift).collect()
    }
}

/// Random walk over the mode's degrees that never repeats the previous note.
pub fn generate_degrees(mode: &Mode, length: usize, rng: &mut Rng) -> Result<Vec<i32>, EarError> {
    let degrees = mode.degrees();
    if degrees.is_empty() {
        return Err(EarError::Config(format!("mode '{}' has no degrees", mode.name())));
    }
    if length > 1 && mode.distinct_degrees() < 2 {
        return Err(EarError::Config(format!(
            "mode '{}' needs at least 2 distinct degrees to build {} notes without repeats",
            mode.name(),
            length
        )));
    }

    let mut sequence = Vec::with_capacity(length);
    if length == 0 {
        return Ok(sequence);
    }
    sequence.push(degrees[rng.usize(..degrees.len())]);

    while sequence.len() < length {
        let previous = sequence[sequence.len() - 1];
        let candidates: Vec<i32> = degrees.iter().copied().filter(|n| *n != previous).collect();
        sequence.push(candidates[rng.usize(..candidates.len())]);
    }

    Ok(sequence)
}

/// One octave index in `[1, octave_range]` per position. After the lowest
/// octave the walk tends to stay low; after any other it always moves.
pub fn assign_octaves(octave_range: u32, length: usize, rng: &mut Rng) -> Vec<u32> {
    let range = octave_range.max(1);
    let mut octaves = Vec::with_capacity(length);
    if length == 0 {
        return octaves;
    }
    octaves.push(rng.u32(1..=range));

    while octaves.len() < length {
        let previous = octaves[octaves.len() - 1];
        let next = if previous == 1 {
            if rng.f64() < STAY_LOW_PROBABILITY || range == 1 {
                1
            } else {
                rng.u32(2..=range)
            }
        } else {
            // uniform over the other octaves: draw from range - 1 slots, skip previous
            let pick = rng.u32(1..range);
            if pick >= previous { pick + 1 } else { pick }
        };
        octaves.push(next);
    }

    octaves
}
