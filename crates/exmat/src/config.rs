//! Materializer configuration

use exmat_classifier::BufferingMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    /// Scan imported ontologies when enumerating classes and relations to materialize
    pub include_imports: bool,
    /// Buffering mode of the wrapped classifier
    pub buffering: BufferingMode,
    /// Turn range axioms into unsatisfiability axioms when the classifier ignores ranges
    pub rewrite_range_axioms: bool,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            include_imports: false,
            buffering: BufferingMode::Buffering,
            rewrite_range_axioms: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MaterializerConfig = serde_json::from_str(r#"{"include_imports": true}"#).unwrap();
        assert!(config.include_imports);
        assert!(config.rewrite_range_axioms);
        assert_eq!(config.buffering, BufferingMode::Buffering);
    }
}
