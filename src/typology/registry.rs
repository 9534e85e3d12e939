//! Language profile registry: single source of truth for all known languages.
//!
//! The registry is static configuration. It is initialised once on first
//! access through a `OnceLock` and is read-only afterwards.

use super::{ResourceTier, Typology};
use crate::error::{PipelineError, Result};
use std::sync::OnceLock;

/// Metadata for one language with a known typology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    /// ISO 639-1 code as emitted by the language identifier (e.g., "tr")
    pub code: &'static str,

    /// English name of the language (e.g., "Turkish")
    pub name: &'static str,

    /// Translation pair id, also used in cache file names (e.g., "en-tr")
    pub pair: &'static str,

    pub typology: Typology,

    pub resource_tier: ResourceTier,
}

/// Registry of every language with a known typology.
///
/// Lookup is by detected code. The default table is built once on first
/// access and is immutable thereafter.
pub struct ProfileRegistry {
    profiles: Vec<LanguageProfile>,
}

static REGISTRY: OnceLock<ProfileRegistry> = OnceLock::new();

impl ProfileRegistry {
    /// Get the global profile registry, initialising it on first call.
    pub fn get() -> &'static ProfileRegistry {
        REGISTRY.get_or_init(|| ProfileRegistry {
            profiles: default_profiles(),
        })
    }

    /// Build a registry from an explicit table.
    ///
    /// Fails if two profiles share a code.
    pub fn from_profiles(profiles: Vec<LanguageProfile>) -> Result<ProfileRegistry> {
        for (i, profile) in profiles.iter().enumerate() {
            if profiles[..i].iter().any(|p| p.code == profile.code) {
                return Err(PipelineError::InvalidInput(format!(
                    "duplicate language code '{}' in profile table",
                    profile.code
                )));
            }
        }
        Ok(ProfileRegistry { profiles })
    }

    /// Get a language profile by its code.
    ///
    /// # Arguments
    /// * `code` - The ISO 639-1 code reported by the language identifier (e.g., "tr")
    ///
    /// # Returns
    /// * `Some(&LanguageProfile)` if the language is registered
    /// * `None` otherwise
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageProfile> {
        self.profiles.iter().find(|p| p.code == code)
    }

    /// Get all registered profiles.
    ///
    /// # Returns
    /// The profile table, in registration order.
    pub fn list_all(&self) -> &[LanguageProfile] {
        &self.profiles
    }

    /// Get the profiles of one typology class.
    ///
    /// # Arguments
    /// * `typology` - The class to filter by
    ///
    /// # Returns
    /// A vector of references to matching profiles, in registration order.
    pub fn list_by_typology(&self, typology: Typology) -> Vec<&LanguageProfile> {
        self.profiles
            .iter()
            .filter(|p| p.typology == typology)
            .collect()
    }

    /// Translation pair for a detected code.
    ///
    /// # Arguments
    /// * `code` - The detected ISO 639-1 code
    ///
    /// # Returns
    /// The registered pair when the language is known, otherwise `en-{code}`.
    pub fn pair_for(&self, code: &str) -> String {
        self.get_by_code(code)
            .map(|p| p.pair.to_string())
            .unwrap_or_else(|| format!("en-{}", code))
    }
}

fn profile(
    code: &'static str,
    name: &'static str,
    pair: &'static str,
    typology: Typology,
    resource_tier: ResourceTier,
) -> LanguageProfile {
    LanguageProfile {
        code,
        name,
        pair,
        typology,
        resource_tier,
    }
}

/// Eight high-coverage languages per typology group.
fn default_profiles() -> Vec<LanguageProfile> {
    use ResourceTier::{High, Low, Medium};
    use Typology::{Agglutinative, Fusional, Isolating};

    vec![
        profile("tr", "Turkish", "en-tr", Agglutinative, High),
        profile("fi", "Finnish", "en-fi", Agglutinative, Medium),
        profile("hu", "Hungarian", "en-hu", Agglutinative, Medium),
        profile("ko", "Korean", "en-ko", Agglutinative, High),
        profile("ja", "Japanese", "en-ja", Agglutinative, High),
        profile("ta", "Tamil", "en-ta", Agglutinative, Medium),
        profile("kn", "Kannada", "en-kn", Agglutinative, Low),
        profile("mn", "Mongolian", "en-mn", Agglutinative, Low),
        profile("zh", "Chinese", "en-zh", Isolating, High),
        profile("vi", "Vietnamese", "en-vi", Isolating, Medium),
        profile("th", "Thai", "en-th", Isolating, Medium),
        profile("ms", "Malay", "en-ms", Isolating, Medium),
        profile("id", "Indonesian", "en-id", Isolating, High),
        profile("km", "Khmer", "en-km", Isolating, Low),
        profile("my", "Burmese", "en-my", Isolating, Low),
        profile("yo", "Yoruba", "en-yo", Isolating, Low),
        profile("es", "Spanish", "en-es", Fusional, High),
        profile("fr", "French", "en-fr", Fusional, High),
        profile("de", "German", "de-en", Fusional, High),
        profile("ru", "Russian", "en-ru", Fusional, High),
        profile("pt", "Portuguese", "en-pt", Fusional, High),
        profile("it", "Italian", "en-it", Fusional, High),
        profile("pl", "Polish", "en-pl", Fusional, Medium),
        profile("nl", "Dutch", "en-nl", Fusional, Medium),
    ]
}
