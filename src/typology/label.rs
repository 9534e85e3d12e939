//! Morphological typology labels.
//!
//! The canonical class order is alphabetical: agglutinative, fusional,
//! isolating. Every probability vector in the crate is indexed in this order
//! and every tie is broken toward the earlier class.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const NUM_CLASSES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Typology {
    Agglutinative,
    Fusional,
    Isolating,
}

impl Typology {
    /// All classes in canonical order.
    pub const CANONICAL: [Typology; NUM_CLASSES] = [
        Typology::Agglutinative,
        Typology::Fusional,
        Typology::Isolating,
    ];

    /// Position of this class in `CANONICAL`.
    pub fn index(self) -> usize {
        match self {
            Typology::Agglutinative => 0,
            Typology::Fusional => 1,
            Typology::Isolating => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Typology> {
        Self::CANONICAL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Typology::Agglutinative => "agglutinative",
            Typology::Fusional => "fusional",
            Typology::Isolating => "isolating",
        }
    }
}

impl fmt::Display for Typology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Typology {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "agglutinative" => Ok(Typology::Agglutinative),
            "fusional" => Ok(Typology::Fusional),
            "isolating" => Ok(Typology::Isolating),
            other => Err(PipelineError::UnknownTypology(other.to_string())),
        }
    }
}

/// How well-resourced a language is for machine translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceTier {
    Low,
    Medium,
    High,
}

impl ResourceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceTier::Low => "low",
            ResourceTier::Medium => "medium",
            ResourceTier::High => "high",
        }
    }
}

impl fmt::Display for ResourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order_is_alphabetical() {
        let names: Vec<&str> = Typology::CANONICAL.iter().map(|t| t.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_index_roundtrip() {
        for (i, label) in Typology::CANONICAL.iter().enumerate() {
            assert_eq!(label.index(), i);
            assert_eq!(Typology::from_index(i), Some(*label));
        }
        assert_eq!(Typology::from_index(3), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("fusional".parse::<Typology>().ok(), Some(Typology::Fusional));
        assert_eq!(" isolating ".parse::<Typology>().ok(), Some(Typology::Isolating));
        assert!("polysynthetic".parse::<Typology>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Typology::Agglutinative).expect("serialize");
        assert_eq!(json, "\"agglutinative\"");
        let tier: ResourceTier = serde_json::from_str("\"medium\"").expect("deserialize");
        assert_eq!(tier, ResourceTier::Medium);
    }
}
