const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B"];

pub fn midi_to_frequency(note: i32) -> f32 { // https://en.wikipedia.org/wiki/Piano_key_frequencies
    440.0 * 2.0_f32.powf((note - 69) as f32 / 12.0)
}

/// Scientific pitch name for a MIDI note, `60 -> "C4"`.
pub fn note_name(note: i32) -> String {
    let pc = note.rem_euclid(12) as usize;
    let octave = note.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[pc], octave)
}

pub fn join_notes(notes: &[i32], delimiter: &str) -> String {
    notes.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pitches() {
        assert!((midi_to_frequency(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_frequency(60) - 261.63).abs() < 0.01);
        assert!((midi_to_frequency(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(70), "Bb4");
        assert_eq!(note_name(-1), "B-2");
    }

    #[test]
    fn test_join_notes() {
        assert_eq!(join_notes(&[60, 63, 72], "_"), "60_63_72");
        assert_eq!(join_notes(&[], "_"), "");
    }
}
