//! 実体化ドライバー
//!
//! 関係ごとに、シグネチャ内の全クラスについて (R some C) と同値な
//! 合成クラスを生成し、拡張オントロジーと分類器へ渡します。

use crate::config::MaterializerConfig;
use crate::expanded::ExpandedOntology;
use crate::range::{RangeAxiomRewriter, RangeRewriteReport};
use crate::registry::{Existential, ExpressionRegistry, Registration, SyntheticClass};
use exmat_classifier::{ClassifierError, ClassifierFactory, IncrementalClassifier};
use exmat_owl::{Axiom, Class, ClassExpression, Entity, Imports, ObjectProperty, Ontology};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// What a materialization call changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializationReport {
    /// Relations swept in this call
    pub relations: usize,
    /// Synthetic classes registered
    pub classes_created: usize,
    /// Axioms appended to the expanded ontology
    pub axioms_added: usize,
}

impl MaterializationReport {
    pub fn merge(&mut self, other: MaterializationReport) {
        self.relations += other.relations;
        self.classes_created += other.classes_created;
        self.axioms_added += other.axioms_added;
    }
}

/// Declaration, label and definition of a synthetic class
fn definition_axioms(synthetic: &SyntheticClass, existential: &Existential) -> [Axiom; 3] {
    [
        Axiom::Declaration(Entity::Class(synthetic.iri.clone())),
        Axiom::label(synthetic.iri.clone(), synthetic.label.clone()),
        Axiom::EquivalentClasses(vec![
            ClassExpression::Class(synthetic.class()),
            existential.to_class_expression(),
        ]),
    ]
}

/// Materializing layer over an incremental classifier.
///
/// Owns the registry, the expanded ontology and the classifier built over it.
pub struct ExpressionMaterializer<C> {
    pub(crate) config: MaterializerConfig,
    pub(crate) base: Arc<Ontology>,
    pub(crate) expanded: ExpandedOntology,
    pub(crate) registry: ExpressionRegistry,
    pub(crate) classifier: C,
    range_report: Option<RangeRewriteReport>,
}

impl<C: IncrementalClassifier> ExpressionMaterializer<C> {
    /// Build the expanded ontology, create the classifier over it and, when the
    /// classifier cannot use range axioms, run the range rewriting pass.
    pub fn new<F>(ontology: Arc<Ontology>, factory: &F, config: MaterializerConfig) -> Result<Self, ClassifierError>
    where
        F: ClassifierFactory<Classifier = C>,
    {
        let expanded = ExpandedOntology::new(Arc::clone(&ontology));
        let classifier = factory.create(&expanded.to_ontology(), config.buffering)?;
        info!(
            "Created {} {} over expanded ontology {}",
            classifier.name(),
            classifier.version(),
            expanded.iri()
        );

        let mut materializer = Self {
            config,
            base: ontology,
            expanded,
            registry: ExpressionRegistry::new(),
            classifier,
            range_report: None,
        };
        if materializer.config.rewrite_range_axioms && !materializer.classifier.supports_range_axioms() {
            materializer.range_report = Some(materializer.rewrite_range_axioms()?);
        }
        Ok(materializer)
    }

    fn rewrite_range_axioms(&mut self) -> Result<RangeRewriteReport, ClassifierError> {
        let rewriter = RangeAxiomRewriter::new(&self.base);
        let generated = self.expanded.absent(rewriter.rewrite(&mut self.classifier)?);
        self.classifier.add_axioms(&generated)?;
        let added = self.expanded.add_axioms(generated);

        let report = RangeRewriteReport {
            range_axioms: rewriter.range_axiom_count(),
            axioms_added: added.len(),
        };
        info!(
            "Rewrote {} range axioms into {} unsatisfiability axioms",
            report.range_axioms,
            report.axioms_added
        );
        Ok(report)
    }

    /// Materialize every object property in the base signature
    pub fn materialize_all(&mut self) -> Result<MaterializationReport, ClassifierError> {
        let relations = self
            .base
            .object_properties_in_signature(Imports::from_bool(self.config.include_imports));
        info!("Materializing existentials for all {} relations", relations.len());
        self.materialize(&relations)
    }

    /// Materialize the given relations, then flush once
    pub fn materialize<'r>(
        &mut self,
        relations: impl IntoIterator<Item = &'r ObjectProperty>,
    ) -> Result<MaterializationReport, ClassifierError> {
        let mut report = MaterializationReport::default();
        for relation in relations {
            if self.registry.is_materialized(relation) {
                continue;
            }
            report.merge(self.materialize_relation(relation)?);
        }
        self.classifier.flush()?;
        Ok(report)
    }

    /// Materialize one relation; a no-op when it was already materialized
    pub fn materialize_one(&mut self, relation: &ObjectProperty) -> Result<MaterializationReport, ClassifierError> {
        if self.registry.is_materialized(relation) {
            debug!("{} is already materialized", relation);
            return Ok(MaterializationReport::default());
        }
        let report = self.materialize_relation(relation)?;
        self.classifier.flush()?;
        Ok(report)
    }

    fn materialize_relation(&mut self, relation: &ObjectProperty) -> Result<MaterializationReport, ClassifierError> {
        info!("Materializing existentials for {}", relation);
        let classes = self
            .base
            .classes_in_signature(Imports::from_bool(self.config.include_imports));

        let mut report = MaterializationReport {
            relations: 1,
            ..MaterializationReport::default()
        };
        // committed only once the classifier has accepted the axioms
        let mut staged = self.registry.clone();
        let mut axioms = Vec::new();
        for class in classes {
            if staged.is_synthetic(&class) {
                continue;
            }
            let existential = Existential::new(relation.clone(), class);
            if let Registration::New(synthetic) = staged.register(existential.clone()) {
                report.classes_created += 1;
                axioms.extend(definition_axioms(&synthetic, &existential));
            }
        }

        let axioms = self.expanded.absent(axioms);
        self.classifier.add_axioms(&axioms)?;
        report.axioms_added = self.expanded.add_axioms(axioms).len();
        staged.mark_materialized(relation.clone());
        self.registry = staged;

        info!(
            "Materialized {}: {} classes, {} axioms",
            relation,
            report.classes_created,
            report.axioms_added
        );
        Ok(report)
    }
}

impl<C> ExpressionMaterializer<C> {
    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    pub fn include_imports(&self) -> bool {
        self.config.include_imports
    }

    /// Affects later materialization calls only
    pub fn set_include_imports(&mut self, include_imports: bool) {
        self.config.include_imports = include_imports;
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut C {
        &mut self.classifier
    }

    pub fn registry(&self) -> &ExpressionRegistry {
        &self.registry
    }

    pub fn expanded_ontology(&self) -> &ExpandedOntology {
        &self.expanded
    }

    pub fn base_ontology(&self) -> &Arc<Ontology> {
        &self.base
    }

    /// `None` when rewriting was disabled or the classifier handles ranges itself
    pub fn range_rewrite_report(&self) -> Option<RangeRewriteReport> {
        self.range_report
    }

    /// The synthetic class registered for `relation some filler`, if any
    pub fn synthetic_class(&self, relation: &ObjectProperty, filler: &Class) -> Option<&SyntheticClass> {
        self.registry
            .lookup_class(&Existential::new(relation.clone(), filler.clone()))
    }
}
