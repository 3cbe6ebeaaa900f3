//! The closed set of region and category labels the digest is organized by.
//!
//! The taxonomy is loaded once from the `taxonomy` section of the YAML
//! configuration and shared read-only for the whole run.
//!
//! ```yaml
//! taxonomy:
//!   default_region: Global
//!   regions: [Global, East Asia]
//!   categories: [Startup, FinTech, Blockchain]
//!   aliases:
//!     General Tech & Startups: Startup
//!     Applied AI & FinTech: FinTech
//! ```

use crate::error::ConfigError;
use crate::models::BucketKey;
use serde::Deserialize;
use std::collections::BTreeMap;

fn default_region() -> String {
    "Global".to_string()
}

/// Valid regions, valid categories and the legacy-label alias table.
#[derive(Debug, Clone, Deserialize)]
pub struct Taxonomy {
    /// Region assigned when the oracle's region label is not recognized.
    #[serde(default = "default_region")]
    pub default_region: String,
    pub regions: Vec<String>,
    pub categories: Vec<String>,
    /// Variant or legacy category label -> canonical category.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl Taxonomy {
    /// Check the invariants the normalizer and selector rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::Invalid("taxonomy.regions is empty".into()));
        }
        if self.categories.is_empty() {
            return Err(ConfigError::Invalid("taxonomy.categories is empty".into()));
        }
        if !self.regions.contains(&self.default_region) {
            return Err(ConfigError::Invalid(format!(
                "taxonomy.default_region '{}' is not one of the regions",
                self.default_region
            )));
        }
        for (alias, target) in &self.aliases {
            if !self.categories.contains(target) {
                return Err(ConfigError::Invalid(format!(
                    "alias '{alias}' points at unknown category '{target}'"
                )));
            }
            // A canonical label aliased elsewhere would make normalization non-idempotent.
            if self.categories.contains(alias) && alias != target {
                return Err(ConfigError::Invalid(format!(
                    "canonical category '{alias}' cannot be aliased to '{target}'"
                )));
            }
        }
        Ok(())
    }

    /// Every bucket, regions outermost, both in configured order.
    pub fn bucket_keys(&self) -> Vec<BucketKey> {
        self.regions
            .iter()
            .flat_map(|region| {
                self.categories
                    .iter()
                    .map(move |category| BucketKey::new(region.as_str(), category.as_str()))
            })
            .collect()
    }

    pub fn contains(&self, key: &BucketKey) -> bool {
        self.regions.contains(&key.region) && self.categories.contains(&key.category)
    }
}

#[cfg(test)]
pub(crate) fn sample() -> Taxonomy {
    let aliases = [
        ("General Tech & Startups", "Startup"),
        ("startup_ai", "Startup"),
        ("Applied AI & FinTech", "FinTech"),
        ("finance_ai", "FinTech"),
        ("Blockchain & Crypto", "Blockchain"),
        ("blockchain_ai", "Blockchain"),
    ]
    .into_iter()
    .map(|(a, c)| (a.to_string(), c.to_string()))
    .collect();

    Taxonomy {
        default_region: "Global".into(),
        regions: vec!["Global".into(), "East Asia".into()],
        categories: vec!["Startup".into(), "FinTech".into(), "Blockchain".into()],
        aliases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_bucket_keys_cross_product_in_order() {
        let keys = sample().bucket_keys();
        assert_eq!(keys.len(), 6);
        assert_eq!(keys[0], BucketKey::new("Global", "Startup"));
        assert_eq!(keys[2], BucketKey::new("Global", "Blockchain"));
        assert_eq!(keys[3], BucketKey::new("East Asia", "Startup"));
    }

    #[test]
    fn test_rejects_empty_regions() {
        let mut t = sample();
        t.regions.clear();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_rejects_default_region_outside_regions() {
        let mut t = sample();
        t.default_region = "Mars".into();
        let err = t.validate().unwrap_err().to_string();
        assert!(err.contains("Mars"));
    }

    #[test]
    fn test_rejects_alias_to_unknown_category() {
        let mut t = sample();
        t.aliases.insert("Quantum".into(), "Quantum_ai".into());
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_rejects_aliasing_a_canonical_label() {
        let mut t = sample();
        t.aliases.insert("FinTech".into(), "Startup".into());
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_deserialize_yaml_defaults_region() {
        let yaml = "regions: [Global]\ncategories: [Startup]\n";
        let t: Taxonomy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(t.default_region, "Global");
        assert!(t.aliases.is_empty());
        assert!(t.contains(&BucketKey::new("Global", "Startup")));
        assert!(!t.contains(&BucketKey::new("Global", "Unknown")));
    }
}
