//! Loading `OptimizerConfig` from YAML or JSON documents.
//!
//! Example:
//! ```yaml
//! optimizer:
//!   disabled_rules: [optimize_distinct]
//!   debug: true
//!   division_by_zero_is_null: false
//! ```
//!
//! A document without an `optimizer` section yields the defaults.

use serde::{Deserialize, Serialize};

use sqlopt_core::config::OptimizerConfig;

use crate::error::{OptimizeError, Result};
use crate::rules::rule_names;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

/// Parse and validate a YAML configuration document.
pub fn parse_yaml_config(src: &str) -> Result<OptimizerConfig> {
    // An empty document deserializes as unit, not as a struct.
    if src.trim().is_empty() {
        return Ok(OptimizerConfig::default());
    }
    let doc: ConfigDocument = serde_yaml::from_str(src)?;
    validate(doc.optimizer)
}

/// Parse and validate a JSON configuration document.
pub fn parse_json_config(src: &str) -> Result<OptimizerConfig> {
    let doc: ConfigDocument = serde_json::from_str(src)?;
    validate(doc.optimizer)
}

/// Reject rule names the default pipeline does not know.
pub fn validate(cfg: OptimizerConfig) -> Result<OptimizerConfig> {
    let known = rule_names();
    if let Some(unknown) = cfg
        .disabled_rules
        .iter()
        .find(|r| !known.contains(&r.as_str()))
    {
        return Err(OptimizeError::Config(format!(
            "unknown rule '{unknown}' in disabled_rules (known rules: {})",
            known.join(", ")
        )));
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_section_is_read() {
        let cfg = parse_yaml_config(
            r#"
optimizer:
  disabled_rules: [optimize_distinct, eval_filter]
  debug: true
"#,
        )
        .unwrap();
        assert_eq!(cfg.disabled_rules, vec!["optimize_distinct", "eval_filter"]);
        assert!(cfg.debug);
        assert!(cfg.division_by_zero_is_null);
    }

    #[test]
    fn missing_section_gives_defaults() {
        assert_eq!(parse_yaml_config("other: 1").unwrap(), OptimizerConfig::default());
        assert_eq!(parse_yaml_config("").unwrap(), OptimizerConfig::default());
    }

    #[test]
    fn unknown_rule_is_rejected() {
        let err = parse_yaml_config("optimizer: { disabled_rules: [push_everything] }").unwrap_err();
        assert!(matches!(err, OptimizeError::Config(ref m) if m.contains("push_everything")));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = parse_yaml_config("optimizer: { debug: [").unwrap_err();
        assert!(matches!(err, OptimizeError::Parse(_)));
    }

    #[test]
    fn json_is_accepted() {
        let cfg = parse_json_config(r#"{"optimizer": {"division_by_zero_is_null": false}}"#).unwrap();
        assert!(!cfg.division_by_zero_is_null);
        assert!(matches!(
            parse_json_config("{").unwrap_err(),
            OptimizeError::Json(_)
        ));
    }
}
