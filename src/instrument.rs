use crate::waveform::WaveformType;

/// Voice used to render every note of a round. Envelope times are in seconds.
#[derive(Debug, Clone)]
pub struct Instrument {
    pub waveform: WaveformType,
    pub attack: f32, // ADSR envelope parameters
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub volume: f32,
}

impl Default for Instrument {
    fn default() -> Self {
        Instrument {
            waveform: WaveformType::Sine,
            attack: 0.01,
            decay: 0.1,
            sustain: 0.8,
            release: 0.2,
            volume: 0.5,
        }
    }
}

impl Instrument {
    // ADSR envelope value at `time` into a note lasting `duration`
    pub fn envelope(&self, time: f32, duration: f32) -> f32 {
        let attack_end = self.attack;
        let decay_end = attack_end + self.decay;
        let release = self.release.min(duration);
        let release_start = duration - release;

        // ramp, normalize, fade
        let level = if time < attack_end {
            time / attack_end
        } else if time < decay_end {
            let decay_progress = (time - attack_end) / self.decay;
            1.0 - decay_progress * (1.0 - self.sustain)
        } else if time < release_start {
            self.sustain
        } else if release > 0.0 {
            let release_progress = (time - release_start) / release;
            self.sustain * (1.0 - release_progress)
        } else {
            self.sustain
        };

        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let instr = Instrument::default();
        assert_eq!(instr.envelope(0.0, 1.0), 0.0);
        assert!((instr.envelope(0.01, 1.0) - 1.0).abs() < 1e-4);
        assert!((instr.envelope(0.5, 1.0) - 0.8).abs() < 1e-6);
        assert!(instr.envelope(0.999, 1.0) < 0.01);
    }

    #[test]
    fn test_short_note_stays_in_range() {
        let instr = Instrument::default();
        for i in 0..50 {
            let v = instr.envelope(i as f32 * 0.001, 0.05);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
