//! Expanded ontology: the base ontology by import plus generated axioms

use exmat_owl::{Axiom, Ontology, OwlIri};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

fn generated_iri() -> OwlIri {
    OwlIri::new(format!("urn:uuid:{}", Uuid::new_v4()))
}

/// Derived ontology handed to the classifier.
///
/// Holds the base ontology by reference and an append-only, duplicate-free
/// list of generated axioms.
#[derive(Debug, Clone)]
pub struct ExpandedOntology {
    iri: OwlIri,
    base_iri: OwlIri,
    base: Arc<Ontology>,
    axioms: Vec<Axiom>,
    index: HashSet<Axiom>,
}

impl ExpandedOntology {
    /// A base ontology without an IRI is imported under a generated one
    pub fn new(base: Arc<Ontology>) -> Self {
        let base_iri = base.iri.clone().unwrap_or_else(generated_iri);
        Self {
            iri: generated_iri(),
            base_iri,
            base,
            axioms: Vec::new(),
            index: HashSet::new(),
        }
    }

    pub fn iri(&self) -> &OwlIri {
        &self.iri
    }

    pub fn base_iri(&self) -> &OwlIri {
        &self.base_iri
    }

    pub fn base(&self) -> &Arc<Ontology> {
        &self.base
    }

    /// Generated axioms in insertion order
    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    pub fn len(&self) -> usize {
        self.axioms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axioms.is_empty()
    }

    pub fn contains(&self, axiom: &Axiom) -> bool {
        self.index.contains(axiom)
    }

    /// The given axioms that are not present yet, in order and without repeats
    pub fn absent(&self, axioms: impl IntoIterator<Item = Axiom>) -> Vec<Axiom> {
        let mut seen = HashSet::new();
        axioms
            .into_iter()
            .filter(|axiom| !self.index.contains(axiom) && seen.insert(axiom.clone()))
            .collect()
    }

    /// Append axioms, returning the ones that were not present yet
    pub fn add_axioms(&mut self, axioms: impl IntoIterator<Item = Axiom>) -> Vec<Axiom> {
        let mut added = Vec::new();
        for axiom in axioms {
            if self.index.insert(axiom.clone()) {
                self.axioms.push(axiom.clone());
                added.push(axiom);
            }
        }
        added
    }

    /// Materialize as an `Ontology` importing the base
    pub fn to_ontology(&self) -> Ontology {
        let mut ontology = Ontology::with_iri(self.iri.clone());
        ontology.import_declarations.push(self.base_iri.clone());
        ontology.imports.push(Arc::clone(&self.base));
        for axiom in &self.axioms {
            ontology.add_axiom(axiom.clone());
        }
        ontology
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exmat_owl::{ClassExpression, Imports};

    fn base() -> Arc<Ontology> {
        let mut ontology = Ontology::with_iri(OwlIri::new("http://example.org/base"));
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::named("http://example.org/A"),
            ClassExpression::named("http://example.org/B"),
        ));
        Arc::new(ontology)
    }

    #[test]
    fn test_imports_base_under_its_iri() {
        let expanded = ExpandedOntology::new(base());
        assert_eq!(expanded.base_iri().as_str(), "http://example.org/base");
        assert!(expanded.iri().as_str().starts_with("urn:uuid:"));
        assert!(expanded.is_empty());

        let ontology = expanded.to_ontology();
        assert_eq!(ontology.import_declarations, vec![OwlIri::new("http://example.org/base")]);
        assert_eq!(ontology.axioms(Imports::Included).count(), 1);
        assert_eq!(ontology.axioms(Imports::Excluded).count(), 0);
    }

    #[test]
    fn test_anonymous_base_gets_generated_iri() {
        let expanded = ExpandedOntology::new(Arc::new(Ontology::new()));
        assert!(expanded.base_iri().as_str().starts_with("urn:uuid:"));
        assert_ne!(expanded.base_iri(), expanded.iri());
    }

    #[test]
    fn test_add_axioms_suppresses_duplicates() {
        let mut expanded = ExpandedOntology::new(base());
        let axiom = Axiom::label(OwlIri::new("http://example.org/A"), "a");

        let added = expanded.add_axioms(vec![axiom.clone(), axiom.clone()]);
        assert_eq!(added, vec![axiom.clone()]);
        assert!(expanded.add_axioms(vec![axiom.clone()]).is_empty());
        assert_eq!(expanded.len(), 1);
        assert!(expanded.contains(&axiom));
    }

    #[test]
    fn test_absent_leaves_the_ontology_untouched() {
        let mut expanded = ExpandedOntology::new(base());
        let a = Axiom::label(OwlIri::new("http://example.org/A"), "a");
        let b = Axiom::label(OwlIri::new("http://example.org/B"), "b");
        expanded.add_axioms(vec![a.clone()]);

        assert_eq!(expanded.absent(vec![a.clone(), b.clone(), b.clone()]), vec![b.clone()]);
        assert_eq!(expanded.len(), 1);
        assert!(!expanded.contains(&b));
    }
}
