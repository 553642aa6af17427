//! Ontology manager: loaded ontologies by IRI, with import resolution

use crate::loader::{DefaultOntologyLoader, OntologyLoader};
use crate::model::{Ontology, OwlIri, Triple};
use crate::OwlError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Keeps loaded ontologies and resolves `owl:imports` against them.
///
/// Imports must be loaded before the ontologies that import them.
pub struct OntologyManager {
    loader: DefaultOntologyLoader,
    ontologies: HashMap<OwlIri, Arc<Ontology>>,
}

impl OntologyManager {
    pub fn new() -> Self {
        Self {
            loader: DefaultOntologyLoader,
            ontologies: HashMap::new(),
        }
    }

    /// Load an ontology from triples, resolve its imports and register it
    pub fn load_triples(&mut self, triples: &[Triple]) -> Result<Arc<Ontology>, OwlError> {
        let ontology = self.loader.load_from_triples(triples)?;
        self.register(ontology)
    }

    /// Load from a JSON array of triples
    pub fn load_json(&mut self, json: &str) -> Result<Arc<Ontology>, OwlError> {
        let triples: Vec<Triple> = serde_json::from_str(json)?;
        self.load_triples(&triples)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Arc<Ontology>, OwlError> {
        let content = std::fs::read_to_string(path)?;
        self.load_json(&content)
    }

    /// Resolve the import declarations of `ontology` and register it under its IRI
    pub fn register(&mut self, mut ontology: Ontology) -> Result<Arc<Ontology>, OwlError> {
        for declaration in &ontology.import_declarations {
            let imported = self
                .ontologies
                .get(declaration)
                .cloned()
                .ok_or_else(|| OwlError::MissingImport(declaration.clone()))?;
            ontology.imports.push(imported);
        }

        let ontology = Arc::new(ontology);
        if let Some(iri) = &ontology.iri {
            self.ontologies.insert(iri.clone(), Arc::clone(&ontology));
        }
        Ok(ontology)
    }

    pub fn get(&self, iri: &OwlIri) -> Option<Arc<Ontology>> {
        self.ontologies.get(iri).cloned()
    }

    pub fn len(&self) -> usize {
        self.ontologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ontologies.is_empty()
    }
}

impl Default for OntologyManager {
    fn default() -> Self {
        Self::new()
    }
}
