//! Typology labels and the static language profile table.
//!
//! # Architecture
//!
//! - `label`: the three morphological classes in canonical order, and resource tiers
//! - `registry`: single source of truth for all known languages and their metadata
//!
//! # Example
//!
//! ```rust,ignore
//! use typology_probe::typology::{ProfileRegistry, Typology};
//!
//! let turkish = ProfileRegistry::get().get_by_code("tr")?;
//! assert_eq!(turkish.typology, Typology::Agglutinative);
//! ```

mod label;
mod registry;

pub use label::{ResourceTier, Typology, NUM_CLASSES};
pub use registry::{LanguageProfile, ProfileRegistry};
