use serde::{Deserialize, Serialize};

const GOSSIP_INDICATORS: &[&str] = &[
    "curious",
    "talkative",
    "social",
    "nosy",
    "dramatic",
    "theatrical",
    "mischievous",
    "conspiratorial",
    "excited",
];

const STOIC_INDICATORS: &[&str] = &[
    "reserved",
    "quiet",
    "suspicious",
    "paranoid",
    "guarded",
    "careful",
    "stoic",
    "serene",
    "calm",
    "patient",
];

/// Behavioural archetype of a speaker, used to compare spread rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityBucket {
    Gossip,
    Stoic,
    Neutral,
}

impl PersonalityBucket {
    pub const ALL: [PersonalityBucket; 3] = [Self::Gossip, Self::Stoic, Self::Neutral];

    /// Count indicator words in mood, profession and name; the larger tally wins.
    pub fn classify(mood: &str, profession: &str, name: &str) -> Self {
        let combined = format!("{mood} {profession} {name}").to_lowercase();
        let hits = |lexicon: &[&str]| lexicon.iter().filter(|w| combined.contains(*w)).count();
        let gossip = hits(GOSSIP_INDICATORS);
        let stoic = hits(STOIC_INDICATORS);
        match gossip.cmp(&stoic) {
            std::cmp::Ordering::Greater => Self::Gossip,
            std::cmp::Ordering::Less => Self::Stoic,
            std::cmp::Ordering::Equal => Self::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gossip => "gossip",
            Self::Stoic => "stoic",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for PersonalityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
