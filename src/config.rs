//! Negotiator configuration.

use serde::{Deserialize, Serialize};

use crate::catalog::{DEFAULT_CHARSET, DEFAULT_TYPE};
use crate::model::MediaType;
use crate::resolver::{StepBudget, DEFAULT_STEP_BUDGET};
use crate::{Error, Result};

/// Catalog document looked up inside every bundle.
pub const DEFAULT_CATALOG_ENTRY: &str = "content-types.tab";

/// Settings for a [`Negotiator`](crate::Negotiator).
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NegotiatorConfig {
    /// Suffix-walk steps allowed per request.
    pub step_budget: usize,
    /// Name of the suffix catalog inside a bundle.
    pub catalog_entry: String,
    /// Type of the `DEFAULT` catalog rule.
    pub default_type: String,
    /// Charset of the `DEFAULT` catalog rule.
    pub default_charset: String,
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self {
            step_budget: DEFAULT_STEP_BUDGET,
            catalog_entry: DEFAULT_CATALOG_ENTRY.to_string(),
            default_type: DEFAULT_TYPE.to_string(),
            default_charset: DEFAULT_CHARSET.to_string(),
        }
    }
}

impl NegotiatorConfig {
    /// Load from JSON and validate.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.default_media_type()?;
        if self.catalog_entry.trim().is_empty() {
            return Err(Error::ConfigError("catalog_entry must not be empty".into()));
        }
        if self.default_charset.trim().is_empty() {
            return Err(Error::ConfigError("default_charset must not be empty".into()));
        }
        Ok(())
    }

    pub fn default_media_type(&self) -> Result<MediaType> {
        self.default_type
            .parse()
            .map_err(|e| Error::ConfigError(format!("default_type: {e}")))
    }

    /// A fresh budget for one request.
    pub fn budget(&self) -> StepBudget {
        StepBudget::new(self.step_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = NegotiatorConfig::from_json("{}").unwrap();
        assert_eq!(config, NegotiatorConfig::default());
        assert_eq!(config.step_budget, 40);
        assert_eq!(config.catalog_entry, "content-types.tab");
    }

    #[test]
    fn test_partial_override() {
        let config = NegotiatorConfig::from_json(r#"{"step_budget": 8, "default_type": "text/html"}"#).unwrap();
        assert_eq!(config.step_budget, 8);
        assert_eq!(config.default_media_type().unwrap(), MediaType::new("text", "html"));
        assert_eq!(config.default_charset, "UTF-8");
    }

    #[test]
    fn test_invalid_default_type() {
        let err = NegotiatorConfig::from_json(r#"{"default_type": "html"}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = NegotiatorConfig::from_json(r#"{"budget": 3}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_empty_catalog_entry() {
        let err = NegotiatorConfig::from_json(r#"{"catalog_entry": " "}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
