//  _______  _______  _______
// (  ____ \(  ___  )(  ____ )
// | (    \/| (   ) || (    )|
// | (__    | (___) || (____)|
// |  __)   |  ___  ||     __)
// | (      | (   ) || (\ (
// | (____/\| )   ( || ) \ \__
// (_______/|/     \||/   \__/

pub mod error;
pub mod waveform;
pub mod instrument;
pub mod utils;
pub mod mode;
pub mod key;
pub mod cadence;
pub mod difficulty;
pub mod sequence;
pub mod scoring;
pub mod synth;
pub mod render;
pub mod playback;
pub mod clock;
pub mod guess;
pub mod config;
pub mod session;

pub use error::EarError;
pub use waveform::WaveformType;
pub use instrument::Instrument;
pub use mode::Mode;
pub use key::{Key, Solfege, SolfegeMapping};
pub use cadence::Cadence;
pub use difficulty::{DifficultyProfile, DifficultyTier, DifficultyProgression, ScoreState};
pub use sequence::Sequence;
pub use scoring::Validation;
pub use synth::{Synthesizer, ToneSynth};
pub use render::{AudioArtifact, ReferenceCue, RenderSettings, WaveformRenderer, WorkDir};
pub use playback::{AudioPlayer, CpalPlayer, NullPlayer};
pub use clock::{ClockStatus, SessionClock};
pub use guess::GuessBuffer;
pub use config::SessionConfig;
pub use session::{EarTrainingSession, GuessOutcome, RoundOutcome, SessionSnapshot};
