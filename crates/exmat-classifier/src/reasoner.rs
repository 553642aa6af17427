//! EL 飽和分類器

use crate::classifier::{BufferingMode, Classifier, ClassifierFactory, IncrementalClassifier, InterruptHandle};
use crate::normalize::{check_profile, AtomId};
use crate::saturation::{Guard, KnowledgeBase};
use crate::ClassifierError;
use exmat_owl::{Axiom, Class, ClassExpression, Entity, Imports, ObjectProperty, Ontology};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Saturation classifier configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationConfig {
    /// Upper bound for a single saturation run, in milliseconds
    pub timeout_ms: Option<u64>,
}

impl SaturationConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Counters kept by the classifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierStats {
    /// Axioms that contributed normal forms
    pub axioms: usize,
    /// Axioms skipped because they use constructors outside EL
    pub ignored_axioms: usize,
    pub saturations: usize,
    pub named_queries: usize,
    pub anonymous_queries: usize,
}

/// Reference classifier for the EL profile.
///
/// Range axioms are not part of the calculus, and axioms using universal
/// restrictions, unions or complements are skipped with a warning.
/// Anonymous queries are answered on a scratch copy of the saturated state.
pub struct SaturationClassifier {
    config: SaturationConfig,
    mode: BufferingMode,
    kb: KnowledgeBase,
    pending: Vec<Axiom>,
    interrupt: InterruptHandle,
    stats: ClassifierStats,
}

impl SaturationClassifier {
    pub fn new(config: SaturationConfig, mode: BufferingMode) -> Self {
        Self {
            config,
            mode,
            kb: KnowledgeBase::new(),
            pending: Vec::new(),
            interrupt: InterruptHandle::new(),
            stats: ClassifierStats::default(),
        }
    }

    /// Classifier over `ontology` and its imports closure
    pub fn from_ontology(
        ontology: &Ontology,
        config: SaturationConfig,
        mode: BufferingMode,
    ) -> Result<Self, ClassifierError> {
        let mut classifier = Self::new(config, mode);
        for axiom in ontology.axioms(Imports::Included) {
            classifier.apply(axiom)?;
        }
        info!(
            "Loaded {} axioms ({} ignored) into the saturation classifier",
            classifier.stats.axioms,
            classifier.stats.ignored_axioms
        );
        Ok(classifier)
    }

    pub fn config(&self) -> &SaturationConfig {
        &self.config
    }

    pub fn stats(&self) -> &ClassifierStats {
        &self.stats
    }

    /// Handle for interrupting from another thread
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    fn apply(&mut self, axiom: &Axiom) -> Result<(), ClassifierError> {
        match self.kb.add_axiom(axiom) {
            Ok(true) => self.stats.axioms += 1,
            Ok(false) => {}
            Err(ClassifierError::ProfileViolation(expression)) => {
                warn!("Ignoring axiom outside EL: {}", expression);
                self.stats.ignored_axioms += 1;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn ensure_saturated(&mut self) -> Result<(), ClassifierError> {
        if self.kb.is_saturated() {
            return Ok(());
        }
        let guard = Guard::new(self.config.timeout(), &self.interrupt);
        let rounds = self.kb.saturate(&guard)?;
        self.stats.saturations += 1;
        debug!("Saturation #{} finished after {} rounds", self.stats.saturations, rounds);
        Ok(())
    }

    fn ensure_consistent(&mut self) -> Result<(), ClassifierError> {
        self.ensure_saturated()?;
        if self.kb.is_consistent() {
            Ok(())
        } else {
            Err(ClassifierError::Inconsistent)
        }
    }

    fn check_signature(&self, ce: &ClassExpression) -> Result<(), ClassifierError> {
        check_profile(ce)?;
        if let Some(class) = ce.classes().into_iter().find(|c| self.kb.vocab().class_id(c).is_none()) {
            return Err(ClassifierError::UnknownEntity(class.iri().to_string()));
        }
        if let Some(property) = ce
            .object_properties()
            .into_iter()
            .find(|p| !self.kb.vocab().contains_role(p))
        {
            return Err(ClassifierError::UnknownEntity(property.iri().to_string()));
        }
        Ok(())
    }

    /// Answer `f` for one expression; named classes are read straight from the closure
    fn query<T>(
        &mut self,
        ce: &ClassExpression,
        f: impl FnOnce(&KnowledgeBase, AtomId) -> T,
    ) -> Result<T, ClassifierError> {
        if let Some(class) = ce.as_class() {
            self.check_signature(ce)?;
            self.ensure_consistent()?;
            let atom = self
                .kb
                .vocab()
                .class_id(class)
                .ok_or_else(|| ClassifierError::UnknownEntity(class.iri().to_string()))?;
            self.stats.named_queries += 1;
            return Ok(f(&self.kb, atom));
        }
        self.stats.anonymous_queries += 1;
        self.with_scratch(&[ce], |kb, atoms| f(kb, atoms[0]))
    }

    /// Define a fresh atom per expression on a copy of the closure, saturate, then answer
    fn with_scratch<T>(
        &mut self,
        expressions: &[&ClassExpression],
        f: impl FnOnce(&KnowledgeBase, &[AtomId]) -> T,
    ) -> Result<T, ClassifierError> {
        for ce in expressions {
            self.check_signature(ce)?;
        }
        self.ensure_consistent()?;

        let mut scratch = self.kb.clone();
        let atoms = expressions
            .iter()
            .map(|ce| scratch.define(ce))
            .collect::<Result<Vec<_>, _>>()?;
        scratch.saturate(&Guard::new(self.config.timeout(), &self.interrupt))?;
        Ok(f(&scratch, &atoms))
    }
}

impl Classifier for SaturationClassifier {
    fn name(&self) -> &str {
        "EL Saturation Classifier"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn buffering_mode(&self) -> BufferingMode {
        self.mode
    }

    fn supports_range_axioms(&self) -> bool {
        false
    }

    fn pending_axioms(&self) -> &[Axiom] {
        &self.pending
    }

    fn flush(&mut self) -> Result<(), ClassifierError> {
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            debug!("Flushing {} pending axioms", pending.len());
        }
        for (i, axiom) in pending.iter().enumerate() {
            if let Err(e) = self.apply(axiom) {
                // keep what was not applied for the next flush
                self.pending = pending[i..].to_vec();
                return Err(e);
            }
        }
        Ok(())
    }

    fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    fn is_consistent(&mut self) -> Result<bool, ClassifierError> {
        self.ensure_saturated()?;
        Ok(self.kb.is_consistent())
    }

    fn is_satisfiable(&mut self, ce: &ClassExpression) -> Result<bool, ClassifierError> {
        self.query(ce, |kb, atom| kb.is_satisfiable(atom))
    }

    fn unsatisfiable_classes(&mut self) -> Result<HashSet<Class>, ClassifierError> {
        self.ensure_consistent()?;
        Ok(self.kb.unsatisfiable_classes())
    }

    fn super_classes(&mut self, ce: &ClassExpression, direct: bool) -> Result<HashSet<Class>, ClassifierError> {
        self.query(ce, |kb, atom| kb.super_classes(atom, direct))
    }

    fn sub_classes(&mut self, ce: &ClassExpression, direct: bool) -> Result<HashSet<Class>, ClassifierError> {
        self.query(ce, |kb, atom| kb.sub_classes(atom, direct))
    }

    fn equivalent_classes(&mut self, ce: &ClassExpression) -> Result<HashSet<Class>, ClassifierError> {
        self.query(ce, |kb, atom| kb.equivalent_classes(atom))
    }

    fn is_entailed(&mut self, axiom: &Axiom) -> Result<bool, ClassifierError> {
        match axiom {
            Axiom::Declaration(Entity::Class(iri)) => {
                Ok(self.kb.vocab().class_id(&Class::from_iri(iri.as_str())).is_some())
            }
            Axiom::Declaration(Entity::ObjectProperty(iri)) => {
                Ok(self.kb.vocab().contains_role(&ObjectProperty(iri.clone())))
            }
            Axiom::SubClassOf(sub, sup) => {
                self.with_scratch(&[sub, sup], |kb, atoms| kb.is_subsumed_by(atoms[0], atoms[1]))
            }
            Axiom::EquivalentClasses(expressions) => {
                let expressions: Vec<&ClassExpression> = expressions.iter().collect();
                self.with_scratch(&expressions, |kb, atoms| {
                    atoms
                        .windows(2)
                        .all(|pair| kb.is_subsumed_by(pair[0], pair[1]) && kb.is_subsumed_by(pair[1], pair[0]))
                })
            }
            Axiom::DisjointClasses(expressions) => {
                let mut intersections = Vec::new();
                for (i, left) in expressions.iter().enumerate() {
                    for right in &expressions[i + 1..] {
                        intersections.push(ClassExpression::ObjectIntersectionOf(vec![left.clone(), right.clone()]));
                    }
                }
                let intersections: Vec<&ClassExpression> = intersections.iter().collect();
                self.with_scratch(&intersections, |kb, atoms| {
                    atoms.iter().all(|atom| !kb.is_satisfiable(*atom))
                })
            }
            other => Err(ClassifierError::UnsupportedEntailment(format!("{:?}", other))),
        }
    }
}

impl IncrementalClassifier for SaturationClassifier {
    fn add_axioms(&mut self, axioms: &[Axiom]) -> Result<(), ClassifierError> {
        match self.mode {
            BufferingMode::Buffering => {
                self.pending.extend_from_slice(axioms);
                Ok(())
            }
            BufferingMode::NonBuffering => {
                for axiom in axioms {
                    self.apply(axiom)?;
                }
                Ok(())
            }
        }
    }
}

/// Creates `SaturationClassifier`s sharing one configuration
#[derive(Debug, Clone, Default)]
pub struct SaturationClassifierFactory {
    config: SaturationConfig,
}

impl SaturationClassifierFactory {
    pub fn new(config: SaturationConfig) -> Self {
        Self { config }
    }
}

impl ClassifierFactory for SaturationClassifierFactory {
    type Classifier = SaturationClassifier;

    fn create(&self, ontology: &Ontology, mode: BufferingMode) -> Result<SaturationClassifier, ClassifierError> {
        SaturationClassifier::from_ontology(ontology, self.config.clone(), mode)
    }
}
