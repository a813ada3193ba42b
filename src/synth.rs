use crate::instrument::Instrument;
use crate::mode::Mode;
use crate::utils::midi_to_frequency;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Waveform source used by the renderer. Buffers are mono `f32` in `[-1, 1]`.
pub trait Synthesizer {
    fn sample_rate(&self) -> u32;

    /// A single tone at `frequency` Hz lasting `duration` seconds.
    fn note(&self, frequency: f32, duration: f32) -> Vec<f32>;

    /// Several notes sounding together.
    fn cluster(&self, notes: &[i32], duration: f32) -> Vec<f32>;

    /// The tonic chord of `mode` rooted on `root`.
    fn chord(&self, root: i32, duration: f32, mode: &Mode) -> Vec<f32> {
        let notes: Vec<i32> = mode.triad_offsets().iter().map(|o| root + o).collect();
        self.cluster(&notes, duration)
    }
}

pub struct ToneSynth {
    instrument: Instrument,
    sample_rate: u32,
}

impl ToneSynth {
    pub fn new(instrument: Instrument, sample_rate: u32) -> Self {
        ToneSynth { instrument, sample_rate }
    }

    fn render_into(&self, buffer: &mut [f32], frequency: f32, duration: f32, gain: f32) {
        let sample_rate = self.sample_rate as f32;
        let mut phase = 0.0f32;

        for (i, slot) in buffer.iter_mut().enumerate() {
            let time_in_note = i as f32 / sample_rate;
            let envelope = self.instrument.envelope(time_in_note, duration);
            *slot += self.instrument.waveform.generate_sample(phase) * envelope * self.instrument.volume * gain;

            phase += frequency / sample_rate;
            if phase >= 1.0 {
                phase -= 1.0;
            }
        }
    }

    fn sample_count(&self, duration: f32) -> usize {
        (duration.max(0.0) * self.sample_rate as f32) as usize
    }
}

impl Default for ToneSynth {
    fn default() -> Self {
        ToneSynth::new(Instrument::default(), DEFAULT_SAMPLE_RATE)
    }
}

impl Synthesizer for ToneSynth {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn note(&self, frequency: f32, duration: f32) -> Vec<f32> {
        let mut buffer = vec![0.0; self.sample_count(duration)];
        self.render_into(&mut buffer, frequency, duration, 1.0);
        buffer
    }

    fn cluster(&self, notes: &[i32], duration: f32) -> Vec<f32> {
        let mut buffer = vec![0.0; self.sample_count(duration)];
        if notes.is_empty() {
            return buffer;
        }
        let gain = 1.0 / notes.len() as f32;
        for note in notes {
            self.render_into(&mut buffer, midi_to_frequency(*note), duration, gain);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_length_matches_duration() {
        let synth = ToneSynth::new(Instrument::default(), 8000);
        assert_eq!(synth.note(440.0, 0.5).len(), 4000);
        assert_eq!(synth.note(440.0, 0.0).len(), 0);
    }

    #[test]
    fn test_note_is_audible_and_bounded() {
        let synth = ToneSynth::default();
        let buf = synth.note(midi_to_frequency(60), 0.25);
        let peak = buf.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak > 0.1);
        assert!(peak <= 1.0);
    }

    #[test]
    fn test_chord_mixes_voices() {
        let synth = ToneSynth::new(Instrument::default(), 8000);
        let mode = Mode::named("Ionian").unwrap();
        let chord = synth.chord(60, 1.0, &mode);
        assert_eq!(chord.len(), 8000);
        assert!(chord.iter().all(|s| s.abs() <= 1.0));
        assert!(chord.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_empty_cluster_is_silence() {
        let synth = ToneSynth::new(Instrument::default(), 8000);
        assert!(synth.cluster(&[], 0.5).iter().all(|s| *s == 0.0));
    }
}
