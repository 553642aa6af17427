//! 値域公理の書き換え
//!
//! 値域公理を扱えない分類器のために、値域と素なクラスへの存在制限を
//! owl:Nothing と同値とする公理を生成します。健全ですが完全ではありません。

use exmat_classifier::{Classifier, ClassifierError};
use exmat_owl::{Axiom, Class, ClassExpression, Imports, Ontology};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::info;

/// Result of the range rewriting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRewriteReport {
    /// Range axioms found in the base ontology and its imports
    pub range_axioms: usize,
    /// Unsatisfiability axioms added to the expanded ontology
    pub axioms_added: usize,
}

pub struct RangeAxiomRewriter<'a> {
    ontology: &'a Ontology,
}

impl<'a> RangeAxiomRewriter<'a> {
    pub fn new(ontology: &'a Ontology) -> Self {
        Self { ontology }
    }

    /// Each class expression mapped to the expressions declared disjoint with it
    pub fn disjointness(&self) -> HashMap<&'a ClassExpression, BTreeSet<&'a ClassExpression>> {
        let mut disjoint: HashMap<&ClassExpression, BTreeSet<&ClassExpression>> = HashMap::new();
        for axiom in self.ontology.axioms(Imports::Included) {
            if let Axiom::DisjointClasses(expressions) = axiom {
                for (i, ce) in expressions.iter().enumerate() {
                    let others = expressions
                        .iter()
                        .enumerate()
                        .filter(|(j, other)| *j != i && *other != ce)
                        .map(|(_, other)| other);
                    disjoint.entry(ce).or_default().extend(others);
                }
            }
        }
        disjoint
    }

    pub fn range_axiom_count(&self) -> usize {
        self.ontology
            .axioms(Imports::Included)
            .filter(|axiom| matches!(axiom, Axiom::ObjectPropertyRange(_, _)))
            .count()
    }

    /// `Nothing ≡ R some d` for every `d` disjoint with the range of `R` or with one
    /// of its superclasses. Superclasses come from the classifier's current state.
    pub fn rewrite<C: Classifier + ?Sized>(&self, classifier: &mut C) -> Result<Vec<Axiom>, ClassifierError> {
        let disjoint = self.disjointness();
        let mut generated = Vec::new();
        let mut seen = HashSet::new();

        for axiom in self.ontology.axioms(Imports::Included) {
            let Axiom::ObjectPropertyRange(property, range) = axiom else {
                continue;
            };

            let mut excluded: BTreeSet<&ClassExpression> = BTreeSet::new();
            for sup in classifier.super_classes(range, false)? {
                if let Some(ds) = disjoint.get(&ClassExpression::Class(sup)) {
                    excluded.extend(ds.iter().copied());
                }
            }
            if let Some(ds) = disjoint.get(range) {
                excluded.extend(ds.iter().copied());
            }

            for d in excluded {
                let restriction = ClassExpression::some(property.clone(), d.clone());
                let rewritten = Axiom::EquivalentClasses(vec![ClassExpression::Class(Class::Nothing), restriction]);
                if seen.insert(rewritten.clone()) {
                    info!("Translated range {} of {} --> owl:Nothing ≡ {} some {}", range, property, property, d);
                    generated.push(rewritten);
                }
            }
        }
        Ok(generated)
    }
}
