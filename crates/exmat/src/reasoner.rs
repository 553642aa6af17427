//! Materializing reasoner facade

use crate::config::MaterializerConfig;
use crate::expanded::ExpandedOntology;
use crate::materializer::{ExpressionMaterializer, MaterializationReport};
use crate::query::{ExistentialSubsumption, SubsumptionProgress};
use crate::range::RangeRewriteReport;
use crate::registry::{Existential, ExpressionRegistry};
use exmat_classifier::{BufferingMode, Classifier, ClassifierError, ClassifierFactory, IncrementalClassifier};
use exmat_owl::{Axiom, Class, ClassExpression, ObjectProperty, Ontology};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// A classifier that also answers questions about existential restrictions.
///
/// Standard queries go to the wrapped classifier unchanged; the existential
/// queries go through the materializing layer.
pub struct MaterializingReasoner<C> {
    materializer: ExpressionMaterializer<C>,
}

impl<C: IncrementalClassifier> MaterializingReasoner<C> {
    pub fn new<F>(ontology: Arc<Ontology>, factory: &F, config: MaterializerConfig) -> Result<Self, ClassifierError>
    where
        F: ClassifierFactory<Classifier = C>,
    {
        Ok(Self {
            materializer: ExpressionMaterializer::new(ontology, factory, config)?,
        })
    }

    /// Buffering reasoner with default settings
    pub fn with_factory<F>(ontology: Arc<Ontology>, factory: &F) -> Result<Self, ClassifierError>
    where
        F: ClassifierFactory<Classifier = C>,
    {
        Self::new(ontology, factory, MaterializerConfig::default())
    }

    pub fn materialize_all(&mut self) -> Result<MaterializationReport, ClassifierError> {
        self.materializer.materialize_all()
    }

    pub fn materialize<'r>(
        &mut self,
        relations: impl IntoIterator<Item = &'r ObjectProperty>,
    ) -> Result<MaterializationReport, ClassifierError> {
        self.materializer.materialize(relations)
    }

    pub fn materialize_one(&mut self, relation: &ObjectProperty) -> Result<MaterializationReport, ClassifierError> {
        self.materializer.materialize_one(relation)
    }

    pub fn super_expressions_of(
        &mut self,
        ce: &ClassExpression,
        direct: bool,
    ) -> Result<HashSet<ClassExpression>, ClassifierError> {
        self.materializer.super_expressions_of(ce, direct)
    }

    pub fn existential_superclasses_of(
        &mut self,
        base: &Class,
        relation: &ObjectProperty,
        direct: bool,
    ) -> Result<HashSet<Existential>, ClassifierError> {
        self.materializer.existential_superclasses_of(base, relation, direct)
    }

    pub fn existential_superclasses_of_reflexive(
        &mut self,
        base: &Class,
        relation: &ObjectProperty,
        direct: bool,
        reflexive: bool,
    ) -> Result<HashSet<Existential>, ClassifierError> {
        self.materializer
            .existential_superclasses_of_reflexive(base, relation, direct, reflexive)
    }

    pub fn existential_subsumptions_all(&mut self) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        self.materializer.existential_subsumptions_all()
    }

    pub fn existential_subsumptions_for(
        &mut self,
        relation: &ObjectProperty,
    ) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        self.materializer.existential_subsumptions_for(relation)
    }

    pub fn existential_subsumptions<'r>(
        &mut self,
        relations: impl IntoIterator<Item = &'r ObjectProperty>,
    ) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        self.materializer.existential_subsumptions(relations)
    }

    pub fn existential_subsumptions_with_progress<'r>(
        &mut self,
        relations: impl IntoIterator<Item = &'r ObjectProperty>,
        progress: impl FnMut(SubsumptionProgress<'_>),
    ) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        self.materializer
            .existential_subsumptions_with_progress(relations, progress)
    }

    pub fn existential_superclasses_over(
        &mut self,
        ce: &ClassExpression,
        relation: &ObjectProperty,
        direct: bool,
    ) -> Result<HashSet<Class>, ClassifierError> {
        self.materializer.existential_superclasses_over(ce, relation, direct)
    }
}

impl<C> MaterializingReasoner<C> {
    pub fn config(&self) -> &MaterializerConfig {
        self.materializer.config()
    }

    pub fn include_imports(&self) -> bool {
        self.materializer.include_imports()
    }

    pub fn set_include_imports(&mut self, include_imports: bool) {
        self.materializer.set_include_imports(include_imports);
    }

    /// The wrapped classifier
    pub fn classifier(&self) -> &C {
        self.materializer.classifier()
    }

    pub fn classifier_mut(&mut self) -> &mut C {
        self.materializer.classifier_mut()
    }

    pub fn materializer(&self) -> &ExpressionMaterializer<C> {
        &self.materializer
    }

    pub fn registry(&self) -> &ExpressionRegistry {
        self.materializer.registry()
    }

    pub fn expanded_ontology(&self) -> &ExpandedOntology {
        self.materializer.expanded_ontology()
    }

    pub fn range_rewrite_report(&self) -> Option<RangeRewriteReport> {
        self.materializer.range_rewrite_report()
    }
}

impl<C: IncrementalClassifier> Classifier for MaterializingReasoner<C> {
    fn name(&self) -> &str {
        "Expression Materializing Reasoner"
    }

    fn version(&self) -> String {
        self.classifier().version()
    }

    fn buffering_mode(&self) -> BufferingMode {
        self.classifier().buffering_mode()
    }

    fn supports_range_axioms(&self) -> bool {
        self.classifier().supports_range_axioms()
    }

    fn pending_axioms(&self) -> &[Axiom] {
        self.classifier().pending_axioms()
    }

    fn flush(&mut self) -> Result<(), ClassifierError> {
        self.classifier_mut().flush()
    }

    fn interrupt(&self) {
        self.classifier().interrupt();
    }

    fn is_consistent(&mut self) -> Result<bool, ClassifierError> {
        self.classifier_mut().is_consistent()
    }

    fn is_satisfiable(&mut self, ce: &ClassExpression) -> Result<bool, ClassifierError> {
        self.classifier_mut().is_satisfiable(ce)
    }

    fn unsatisfiable_classes(&mut self) -> Result<HashSet<Class>, ClassifierError> {
        self.classifier_mut().unsatisfiable_classes()
    }

    fn super_classes(&mut self, ce: &ClassExpression, direct: bool) -> Result<HashSet<Class>, ClassifierError> {
        self.classifier_mut().super_classes(ce, direct)
    }

    fn sub_classes(&mut self, ce: &ClassExpression, direct: bool) -> Result<HashSet<Class>, ClassifierError> {
        self.classifier_mut().sub_classes(ce, direct)
    }

    fn equivalent_classes(&mut self, ce: &ClassExpression) -> Result<HashSet<Class>, ClassifierError> {
        self.classifier_mut().equivalent_classes(ce)
    }

    fn is_entailed(&mut self, axiom: &Axiom) -> Result<bool, ClassifierError> {
        self.classifier_mut().is_entailed(axiom)
    }

    fn is_entailed_all(&mut self, axioms: &[Axiom]) -> Result<bool, ClassifierError> {
        self.classifier_mut().is_entailed_all(axioms)
    }
}
