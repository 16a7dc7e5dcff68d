use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a fresh like turns into a mutual match. `Reciprocal` is the
/// production rule: both directed likes must exist. The probabilistic
/// variant backs demo venues where nobody on the other side is real.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchDecision {
    Reciprocal,
    Demo { probability: f64 },
}

impl MatchDecision {
    pub fn is_mutual(&self, reciprocal_like_exists: bool) -> bool {
        match *self {
            MatchDecision::Reciprocal => reciprocal_like_exists,
            MatchDecision::Demo { probability } => {
                rand::rng().random_bool(probability.clamp(0.0, 1.0))
            }
        }
    }
}
