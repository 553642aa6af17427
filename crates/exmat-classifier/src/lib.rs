//! 分類器インターフェースと参照実装
//!
//! このクレートは実体化レイヤーが依存する分類器の契約を提供します:
//! - `Classifier` / `IncrementalClassifier` / `ClassifierFactory` トレイト
//! - バッファリングモードと flush による同期
//! - EL 飽和アルゴリズムによる参照分類器 (`SaturationClassifier`)

pub mod classifier;
pub mod normalize;
pub mod saturation;
pub mod reasoner;

pub use classifier::{BufferingMode, Classifier, ClassifierFactory, IncrementalClassifier, InterruptHandle};
pub use reasoner::{ClassifierStats, SaturationClassifier, SaturationClassifierFactory, SaturationConfig};

use std::time::Duration;
use thiserror::Error;

/// Failures raised by a classifier.
///
/// The materializing layer forwards these unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("Ontology is inconsistent")]
    Inconsistent,

    #[error("Not in the supported profile: {0}")]
    ProfileViolation(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Reasoning timed out after {0:?}")]
    Timeout(Duration),

    #[error("Reasoning was interrupted")]
    Interrupted,

    #[error("Unsupported entailment check: {0}")]
    UnsupportedEntailment(String),
}

impl ClassifierError {
    /// Timeout and interruption; the same call may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(self, ClassifierError::Timeout(_) | ClassifierError::Interrupted)
    }

    /// Failures caused by the ontology or the query itself
    pub fn is_structural(&self) -> bool {
        !self.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ClassifierError::Interrupted.is_transient());
        assert!(ClassifierError::Timeout(Duration::from_millis(10)).is_transient());
        assert!(ClassifierError::Inconsistent.is_structural());
        assert!(ClassifierError::UnknownEntity("x".to_string()).is_structural());
        assert!(ClassifierError::Timeout(Duration::from_millis(250)).to_string().contains("250ms"));
    }
}
