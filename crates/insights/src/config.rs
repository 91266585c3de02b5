//! View configuration

use crate::{
    catalog::{BundleCatalog, BundleDisplay},
    errors::{InsightError, Result},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Display limits and tolerances for derived views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Batch rows shown before "show all"
    pub preview_limit: usize,
    /// Local attributions shown for a single prediction
    pub explanation_top_n: usize,
    /// Global importances shown before "show more"
    pub global_top_n: usize,
    /// Allowed distance of a probability sum from 100, in percentage points
    pub probability_tolerance: f64,
    /// Extra or overriding catalog entries
    pub catalog: Vec<BundleDisplay>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            preview_limit: 50,
            explanation_top_n: 12,
            global_top_n: 15,
            probability_tolerance: 1.0,
            catalog: Vec::new(),
        }
    }
}

impl InsightConfig {
    /// Parse from TOML and validate
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: InsightConfig = toml::from_str(content)
            .map_err(|e| InsightError::Config(format!("Failed to parse insight config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.preview_limit == 0 {
            return Err(InsightError::Config("preview_limit must be positive".into()));
        }
        if self.explanation_top_n == 0 {
            return Err(InsightError::Config("explanation_top_n must be positive".into()));
        }
        if self.global_top_n == 0 {
            return Err(InsightError::Config("global_top_n must be positive".into()));
        }
        if !self.probability_tolerance.is_finite() || self.probability_tolerance < 0.0 {
            return Err(InsightError::Config(
                "probability_tolerance must be a non-negative number".into(),
            ));
        }
        if let Some(entry) = self.catalog.iter().find(|e| e.label.trim().is_empty()) {
            return Err(InsightError::Config(format!(
                "catalog entry `{}` has an empty label",
                entry.name
            )));
        }
        Ok(())
    }

    /// Built-in catalog with configured overrides applied
    pub fn catalog(&self) -> BundleCatalog {
        BundleCatalog::builtin().with_overrides(self.catalog.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tier;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = InsightConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preview_limit, 50);
        assert_eq!(config.catalog().len(), 10);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = InsightConfig::from_toml_str(
            r##"
            preview_limit = 20

            [[catalog]]
            label = "Pet_Care"
            name = "Pet Care"
            tier = "basic"
            color = "#22c55e"
            icon = "🐾"
            "##,
        )
        .unwrap();
        assert_eq!(config.preview_limit, 20);
        assert_eq!(config.global_top_n, 15);
        let catalog = config.catalog();
        assert_eq!(catalog.get("Pet_Care").map(|e| e.tier), Some(Tier::Basic));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let err = InsightConfig::from_toml_str("global_top_n = 0").unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "probability_tolerance = 0.5").unwrap();
        let config = InsightConfig::from_file(file.path()).unwrap();
        assert_eq!(config.probability_tolerance, 0.5);
    }
}
