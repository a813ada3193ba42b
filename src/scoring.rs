/// Below this fraction of correct notes a round earns nothing.
pub const PASS_FRACTION: f64 = 0.7;
/// Award for a perfect round.
pub const PERFECT_BONUS: f64 = 1.3;

#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub overall_match: bool,
    pub detailed_match: Vec<bool>,
    pub fraction: f64,
    pub points_delta: f64,
}

/// Compare a guess against the answer position by position.
/// Callers only validate once the guess is as long as the answer.
pub fn validate(answer: &[i32], guess: &[i32]) -> Validation {
    debug_assert_eq!(answer.len(), guess.len());

    let detailed_match: Vec<bool> = answer.iter().zip(guess).map(|(a, g)| a == g).collect();
    let correct = detailed_match.iter().filter(|m| **m).count();
    let fraction = if answer.is_empty() { 0.0 } else { correct as f64 / answer.len() as f64 };

    Validation {
        overall_match: !detailed_match.is_empty() && detailed_match.iter().all(|m| *m),
        points_delta: points_for(fraction),
        detailed_match,
        fraction,
    }
}

pub fn points_for(fraction: f64) -> f64 {
    if fraction < PASS_FRACTION {
        0.0
    } else if fraction == 1.0 {
        PERFECT_BONUS
    } else {
        fraction
    }
}
