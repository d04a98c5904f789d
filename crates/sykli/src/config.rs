//! Pipeline-level settings loaded from TOML.
//!
//! ```toml
//! [k8s_defaults]
//! memory = "1Gi"
//! cpu = "500m"
//! ```

use crate::error::{Error, Result};
use crate::k8s::K8sOptions;
use crate::pipeline::Pipeline;
use serde::{Deserialize, Serialize};

/// Settings applied to a whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Kubernetes requests for tasks that declare none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s_defaults: Option<K8sOptions>,
}

impl PipelineConfig {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::config(e.to_string()))
    }
}

impl Pipeline {
    /// Create an empty pipeline configured by `config`.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        match &config.k8s_defaults {
            Some(defaults) => Self::with_k8s_defaults(defaults.clone()),
            None => Self::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert!(Pipeline::from_config(&config).k8s_defaults().is_none());
    }

    #[test]
    fn test_k8s_defaults_section() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [k8s_defaults]
            memory = "1Gi"
            cpu = "500m"
            gpu = 1
            "#,
        )
        .unwrap();
        let p = Pipeline::from_config(&config);
        assert_eq!(
            p.k8s_defaults(),
            Some(&K8sOptions::new().memory("1Gi").cpu("500m").gpu(1))
        );
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = PipelineConfig::from_toml_str("retries = 3").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(PipelineConfig::from_toml_str("[k8s_defaults").is_err());
    }
}
