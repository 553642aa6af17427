//! Expression-aware queries
//!
//! Expressions with a registered synthetic class are queried through that
//! class, and synthetic classes in results are translated back into the
//! expressions they stand for.

use crate::materializer::ExpressionMaterializer;
use crate::registry::Existential;
use exmat_classifier::{ClassifierError, IncrementalClassifier};
use exmat_owl::{Axiom, Class, ClassExpression, Imports, ObjectProperty};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

/// Classes between progress log lines in `existential_subsumptions`
const PROGRESS_INTERVAL: usize = 1000;

/// `sub ⊑ sup` between two existential restrictions over the same relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ExistentialSubsumption {
    pub sub: Existential,
    pub sup: Existential,
}

impl ExistentialSubsumption {
    pub fn to_axiom(&self) -> Axiom {
        Axiom::SubClassOf(self.sub.to_class_expression(), self.sup.to_class_expression())
    }
}

impl From<ExistentialSubsumption> for Axiom {
    fn from(subsumption: ExistentialSubsumption) -> Self {
        subsumption.to_axiom()
    }
}

/// Progress of an `existential_subsumptions` sweep
#[derive(Debug, Clone, Copy)]
pub struct SubsumptionProgress<'a> {
    pub relation: &'a ObjectProperty,
    /// Classes processed for `relation`
    pub done: usize,
    pub total: usize,
}

impl<C: IncrementalClassifier> ExpressionMaterializer<C> {
    /// Superclasses of `ce`, with synthetic classes replaced by their expressions
    pub fn super_expressions_of(
        &mut self,
        ce: &ClassExpression,
        direct: bool,
    ) -> Result<HashSet<ClassExpression>, ClassifierError> {
        self.classifier.flush()?;
        let supers = self.classifier.super_classes(ce, direct)?;
        Ok(supers
            .into_iter()
            .map(|class| match self.registry.lookup_expression(&class) {
                Some(existential) => existential.to_class_expression(),
                None => ClassExpression::Class(class),
            })
            .collect())
    }

    /// Registered existential superclasses of `relation some base`.
    ///
    /// Empty when the restriction is unsatisfiable.
    pub fn existential_superclasses_of(
        &mut self,
        base: &Class,
        relation: &ObjectProperty,
        direct: bool,
    ) -> Result<HashSet<Existential>, ClassifierError> {
        self.existential_superclasses_of_reflexive(base, relation, direct, false)
    }

    /// With `reflexive`, the restriction itself is part of the result
    pub fn existential_superclasses_of_reflexive(
        &mut self,
        base: &Class,
        relation: &ObjectProperty,
        direct: bool,
        reflexive: bool,
    ) -> Result<HashSet<Existential>, ClassifierError> {
        let existential = Existential::new(relation.clone(), base.clone());
        self.classifier.flush()?;

        let query = match self.registry.lookup_class(&existential) {
            Some(synthetic) => ClassExpression::Class(synthetic.class()),
            None => existential.to_class_expression(),
        };
        if !self.classifier.is_satisfiable(&query)? {
            return Ok(HashSet::new());
        }

        let mut result: HashSet<Existential> = self
            .classifier
            .super_classes(&query, direct)?
            .iter()
            .filter_map(|class| self.registry.lookup_expression(class).cloned())
            .collect();
        if reflexive {
            result.insert(existential);
        }
        Ok(result)
    }

    /// Subsumptions between existentials over every object property of the base ontology
    pub fn existential_subsumptions_all(&mut self) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        let relations = self.base.object_properties_in_signature(Imports::Excluded);
        self.existential_subsumptions(&relations)
    }

    pub fn existential_subsumptions_for(
        &mut self,
        relation: &ObjectProperty,
    ) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        self.existential_subsumptions(std::iter::once(relation))
    }

    pub fn existential_subsumptions<'r>(
        &mut self,
        relations: impl IntoIterator<Item = &'r ObjectProperty>,
    ) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        self.existential_subsumptions_with_progress(relations, |_| {})
    }

    /// For each class `C` in the base signature (imports included) and each relation `R`,
    /// one fact `R some C ⊑ R some D` per registered superclass other than the restriction itself.
    pub fn existential_subsumptions_with_progress<'r>(
        &mut self,
        relations: impl IntoIterator<Item = &'r ObjectProperty>,
        mut progress: impl FnMut(SubsumptionProgress<'_>),
    ) -> Result<BTreeSet<ExistentialSubsumption>, ClassifierError> {
        let classes = self.base.classes_in_signature(Imports::Included);
        let total = classes.len();
        let mut facts = BTreeSet::new();

        for relation in relations {
            info!("Calculating existential subsumptions for {}", relation);
            for (i, class) in classes.iter().enumerate() {
                let done = i + 1;
                if done % PROGRESS_INTERVAL == 0 {
                    info!("Class {}/{}", done, total);
                }

                let sub = Existential::new(relation.clone(), class.clone());
                for sup in self.existential_superclasses_of_reflexive(class, relation, false, true)? {
                    if sup != sub {
                        facts.insert(ExistentialSubsumption { sub: sub.clone(), sup });
                    }
                }
                progress(SubsumptionProgress { relation, done, total });
            }
        }
        Ok(facts)
    }

    /// Fillers `D` such that `ce ⊑ relation some D`, after materializing `relation`.
    ///
    /// With `direct`, a filler is dropped when its restriction subsumes another candidate's.
    pub fn existential_superclasses_over(
        &mut self,
        ce: &ClassExpression,
        relation: &ObjectProperty,
        direct: bool,
    ) -> Result<HashSet<Class>, ClassifierError> {
        self.materialize_one(relation)?;
        self.classifier.flush()?;

        let candidates: HashSet<Class> = self
            .classifier
            .super_classes(ce, false)?
            .into_iter()
            .filter(|class| {
                self.registry
                    .lookup_expression(class)
                    .is_some_and(|existential| &existential.relation == relation)
            })
            .collect();

        let mut selected = candidates.clone();
        if direct {
            for candidate in &candidates {
                let supers = self
                    .classifier
                    .super_classes(&ClassExpression::Class(candidate.clone()), false)?;
                for sup in supers {
                    if candidates.contains(&sup) {
                        selected.remove(&sup);
                    }
                }
            }
        }

        Ok(selected
            .iter()
            .filter_map(|class| self.registry.lookup_expression(class))
            .map(|existential| existential.filler.clone())
            .collect())
    }
}
