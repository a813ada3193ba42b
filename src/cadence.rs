use crate::key::Key;

/// Dominant-then-tonic reference chords for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub dominant: [i32; 3],
    pub tonic: [i32; 3],
}

impl Cadence {
    pub fn for_key(key: Key) -> Self {
        let root = 60 + key.adjustment();
        Cadence {
            dominant: [root - 5, root - 1, root + 2],
            tonic: [root, root + 4, root + 7],
        }
    }
}
