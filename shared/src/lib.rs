use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub mod generation;

/// Difficulty grades a challenge can carry. The wire format is the lowercase
/// name, both in JSON and in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    /// Fixed difficulty-to-stars mapping applied to every generated challenge,
    /// whatever star value the backend proposed.
    pub fn stars(&self) -> u32 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard => 8,
            Difficulty::Extreme => 10,
        }
    }
}
