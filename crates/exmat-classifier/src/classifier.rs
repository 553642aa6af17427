//! Classifier traits

use crate::ClassifierError;
use exmat_owl::{Axiom, Class, ClassExpression, Ontology};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How ontology changes reach the classifier's working state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferingMode {
    /// Changes are held until `flush`
    #[default]
    Buffering,
    /// Changes are applied as they arrive
    NonBuffering,
}

/// Query surface of a classification engine.
///
/// Super/sub-class results are flattened and strict: classes equivalent to the
/// query are not part of the result.
pub trait Classifier {
    fn name(&self) -> &str;

    fn version(&self) -> String;

    fn buffering_mode(&self) -> BufferingMode;

    /// Whether `ObjectPropertyRange` axioms take part in reasoning
    fn supports_range_axioms(&self) -> bool;

    /// Axioms received but not yet flushed
    fn pending_axioms(&self) -> &[Axiom];

    /// Synchronize pending changes into the working state
    fn flush(&mut self) -> Result<(), ClassifierError>;

    /// Ask a running computation to stop with `ClassifierError::Interrupted`.
    /// A request made while nothing is running is dropped.
    fn interrupt(&self);

    fn is_consistent(&mut self) -> Result<bool, ClassifierError>;

    fn is_satisfiable(&mut self, ce: &ClassExpression) -> Result<bool, ClassifierError>;

    fn unsatisfiable_classes(&mut self) -> Result<HashSet<Class>, ClassifierError>;

    fn super_classes(&mut self, ce: &ClassExpression, direct: bool) -> Result<HashSet<Class>, ClassifierError>;

    fn sub_classes(&mut self, ce: &ClassExpression, direct: bool) -> Result<HashSet<Class>, ClassifierError>;

    fn equivalent_classes(&mut self, ce: &ClassExpression) -> Result<HashSet<Class>, ClassifierError>;

    fn is_entailed(&mut self, axiom: &Axiom) -> Result<bool, ClassifierError>;

    fn is_entailed_all(&mut self, axioms: &[Axiom]) -> Result<bool, ClassifierError> {
        for axiom in axioms {
            if !self.is_entailed(axiom)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A classifier that can receive additional axioms after construction
pub trait IncrementalClassifier: Classifier {
    /// Buffered until `flush` in `BufferingMode::Buffering`, applied at once otherwise
    fn add_axioms(&mut self, axioms: &[Axiom]) -> Result<(), ClassifierError>;
}

/// Creates classifiers over an ontology
pub trait ClassifierFactory {
    type Classifier: IncrementalClassifier;

    fn create(&self, ontology: &Ontology, mode: BufferingMode) -> Result<Self::Classifier, ClassifierError>;
}

/// Shared interrupt flag; clone it into another thread to stop a long computation
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Consume a pending interrupt request
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_handle_is_shared_and_consumed() {
        let handle = InterruptHandle::new();
        let other = handle.clone();

        other.interrupt();
        assert!(handle.is_set());
        assert!(handle.take());
        assert!(!handle.take());
        assert!(!other.is_set());
    }

    #[test]
    fn test_buffering_mode_serde() {
        assert_eq!(BufferingMode::default(), BufferingMode::Buffering);
        let json = serde_json::to_string(&BufferingMode::NonBuffering).unwrap();
        assert_eq!(json, "\"non_buffering\"");
    }
}
