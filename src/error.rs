use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EarError {
    #[error("Parsing Error: {0}")]
    ParseError(String),
    #[error("File Error: {0}")]
    FileError(String),
    #[error("Audio Error: {0}")]
    AudioError(String),
    #[error("Unknown mode: {0}")]
    UnknownMode(String),
    #[error("Unknown key: {0}")]
    UnknownKey(String),
    #[error("Unknown solfege syllable: {0}")]
    UnknownSolfege(String),
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),
    #[error("Configuration Error: {0}")]
    Config(String),
    #[error("No audio artifact at {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("Session clock faulted: {0}")]
    ClockFault(String),
    #[error("Session has no active round")]
    NoActiveRound,
}
