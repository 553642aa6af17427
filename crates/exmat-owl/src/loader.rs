//! OWLオントロジーローダー

use crate::model::{Axiom, Class, ClassExpression, Entity, ObjectProperty, Ontology, OwlIri, Triple};
use crate::vocabulary::{self, is_blank_node};
use crate::OwlError;
use std::collections::{HashMap, HashSet};

/// Maximum nesting of blank-node class expressions
const MAX_EXPRESSION_DEPTH: usize = 64;

/// Ontology loader trait
pub trait OntologyLoader {
    fn load_from_triples(&self, triples: &[Triple]) -> Result<Ontology, OwlError>;
}

/// Default OWL ontology loader
pub struct DefaultOntologyLoader;

impl OntologyLoader for DefaultOntologyLoader {
    fn load_from_triples(&self, triples: &[Triple]) -> Result<Ontology, OwlError> {
        let mut ontology = Ontology::new();
        let blank_nodes = BlankNodeIndex::build(triples);

        // Object properties may be declared after they are used in domain/range triples
        let object_properties: HashSet<&str> = triples
            .iter()
            .filter(|t| t.predicate == vocabulary::RDF_TYPE)
            .filter(|t| t.object == vocabulary::OWL_OBJECT_PROPERTY || t.object == vocabulary::OWL_TRANSITIVE_PROPERTY)
            .map(|t| t.subject.as_str())
            .collect();

        for triple in triples {
            let subject_is_blank = is_blank_node(&triple.subject);

            match triple.predicate.as_str() {
                vocabulary::RDF_TYPE if !subject_is_blank => match triple.object.as_str() {
                    vocabulary::OWL_ONTOLOGY => {
                        ontology.iri = Some(OwlIri::new(triple.subject.clone()));
                    }
                    vocabulary::OWL_CLASS => {
                        ontology.add_axiom(Axiom::Declaration(Entity::Class(OwlIri::new(triple.subject.clone()))));
                    }
                    vocabulary::OWL_OBJECT_PROPERTY => {
                        ontology.add_axiom(Axiom::Declaration(Entity::ObjectProperty(OwlIri::new(triple.subject.clone()))));
                    }
                    vocabulary::OWL_TRANSITIVE_PROPERTY => {
                        ontology.add_axiom(Axiom::TransitiveObjectProperty(ObjectProperty::new(triple.subject.clone())));
                    }
                    _ => {} // Individuals and other types are not used for classification
                },

                vocabulary::RDFS_SUBCLASS_OF => {
                    let sub = blank_nodes.class_expression(&triple.subject)?;
                    let sup = blank_nodes.class_expression(&triple.object)?;
                    ontology.add_axiom(Axiom::SubClassOf(sub, sup));
                }

                vocabulary::OWL_EQUIVALENT_CLASS => {
                    let c1 = blank_nodes.class_expression(&triple.subject)?;
                    let c2 = blank_nodes.class_expression(&triple.object)?;
                    ontology.add_axiom(Axiom::EquivalentClasses(vec![c1, c2]));
                }

                vocabulary::OWL_DISJOINT_WITH => {
                    let c1 = blank_nodes.class_expression(&triple.subject)?;
                    let c2 = blank_nodes.class_expression(&triple.object)?;
                    ontology.add_axiom(Axiom::DisjointClasses(vec![c1, c2]));
                }

                vocabulary::RDFS_SUBPROPERTY_OF if object_properties.contains(triple.subject.as_str()) => {
                    ontology.add_axiom(Axiom::SubObjectPropertyOf(
                        ObjectProperty::new(triple.subject.clone()),
                        ObjectProperty::new(triple.object.clone()),
                    ));
                }

                vocabulary::RDFS_DOMAIN if object_properties.contains(triple.subject.as_str()) => {
                    let class = blank_nodes.class_expression(&triple.object)?;
                    ontology.add_axiom(Axiom::ObjectPropertyDomain(ObjectProperty::new(triple.subject.clone()), class));
                }

                vocabulary::RDFS_RANGE if object_properties.contains(triple.subject.as_str()) => {
                    let class = blank_nodes.class_expression(&triple.object)?;
                    ontology.add_axiom(Axiom::ObjectPropertyRange(ObjectProperty::new(triple.subject.clone()), class));
                }

                vocabulary::RDFS_LABEL if !subject_is_blank => {
                    ontology.add_axiom(Axiom::label(OwlIri::new(triple.subject.clone()), triple.object.clone()));
                }

                vocabulary::OWL_IMPORTS => {
                    let iri = OwlIri::new(triple.object.clone());
                    if !ontology.import_declarations.contains(&iri) {
                        ontology.import_declarations.push(iri);
                    }
                }

                _ => {} // Restriction structure and assertions are read through the blank node index
            }
        }

        Ok(ontology)
    }
}

/// Triples grouped by blank-node subject
struct BlankNodeIndex<'a> {
    nodes: HashMap<&'a str, Vec<&'a Triple>>,
}

impl<'a> BlankNodeIndex<'a> {
    fn build(triples: &'a [Triple]) -> Self {
        let mut nodes: HashMap<&str, Vec<&Triple>> = HashMap::new();
        for triple in triples.iter().filter(|t| is_blank_node(&t.subject)) {
            nodes.entry(triple.subject.as_str()).or_default().push(triple);
        }
        Self { nodes }
    }

    fn value(&self, node: &str, predicate: &str) -> Option<&'a str> {
        self.nodes
            .get(node)?
            .iter()
            .copied()
            .find(|t| t.predicate == predicate)
            .map(|t| t.object.as_str())
    }

    fn class_expression(&self, term: &str) -> Result<ClassExpression, OwlError> {
        self.parse(term, 0)
    }

    fn parse(&self, term: &str, depth: usize) -> Result<ClassExpression, OwlError> {
        if !is_blank_node(term) {
            return Ok(ClassExpression::Class(Class::from_iri(term)));
        }
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(OwlError::Malformed(format!("class expression nested too deeply at {}", term)));
        }

        if let Some(property) = self.value(term, vocabulary::OWL_ON_PROPERTY) {
            let property = ObjectProperty::new(property);
            if let Some(filler) = self.value(term, vocabulary::OWL_SOME_VALUES_FROM) {
                return Ok(ClassExpression::ObjectSomeValuesFrom {
                    property,
                    filler: Box::new(self.parse(filler, depth + 1)?),
                });
            }
            if let Some(filler) = self.value(term, vocabulary::OWL_ALL_VALUES_FROM) {
                return Ok(ClassExpression::ObjectAllValuesFrom {
                    property,
                    filler: Box::new(self.parse(filler, depth + 1)?),
                });
            }
            return Err(OwlError::Malformed(format!("restriction {} has no supported filler", term)));
        }

        if let Some(list) = self.value(term, vocabulary::OWL_INTERSECTION_OF) {
            return Ok(ClassExpression::ObjectIntersectionOf(self.parse_list(list, depth + 1)?));
        }
        if let Some(list) = self.value(term, vocabulary::OWL_UNION_OF) {
            return Ok(ClassExpression::ObjectUnionOf(self.parse_list(list, depth + 1)?));
        }
        if let Some(operand) = self.value(term, vocabulary::OWL_COMPLEMENT_OF) {
            return Ok(ClassExpression::ObjectComplementOf(Box::new(self.parse(operand, depth + 1)?)));
        }

        Err(OwlError::Malformed(format!("blank node {} is not a class expression", term)))
    }

    fn parse_list(&self, head: &str, depth: usize) -> Result<Vec<ClassExpression>, OwlError> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut current = head;

        while current != vocabulary::RDF_NIL {
            if !visited.insert(current) {
                return Err(OwlError::Malformed(format!("cyclic RDF list at {}", current)));
            }
            let first = self
                .value(current, vocabulary::RDF_FIRST)
                .ok_or_else(|| OwlError::Malformed(format!("RDF list node {} has no rdf:first", current)))?;
            items.push(self.parse(first, depth)?);
            current = self
                .value(current, vocabulary::RDF_REST)
                .ok_or_else(|| OwlError::Malformed(format!("RDF list node {} has no rdf:rest", current)))?;
        }

        if items.is_empty() {
            return Err(OwlError::Malformed(format!("empty operand list at {}", head)));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Imports;

    const EX: &str = "http://example.org/";

    fn ex(local: &str) -> String {
        format!("{}{}", EX, local)
    }

    fn t(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(s, p, o)
    }

    #[test]
    fn test_load_empty_ontology() {
        let ontology = DefaultOntologyLoader.load_from_triples(&[]).unwrap();

        assert!(ontology.iri.is_none());
        assert!(ontology.classes.is_empty());
        assert!(ontology.object_properties.is_empty());
        assert!(ontology.axioms.is_empty());
    }

    #[test]
    fn test_load_declarations_and_hierarchy() {
        let triples = vec![
            t(&ex("onto"), vocabulary::RDF_TYPE, vocabulary::OWL_ONTOLOGY),
            t(&ex("Branch"), vocabulary::RDF_TYPE, vocabulary::OWL_CLASS),
            t(&ex("Tree"), vocabulary::RDF_TYPE, vocabulary::OWL_CLASS),
            t(&ex("Branch"), vocabulary::RDFS_SUBCLASS_OF, &ex("Tree")),
            t(&ex("Branch"), vocabulary::RDFS_LABEL, "branch"),
            t(&ex("partOf"), vocabulary::RDF_TYPE, vocabulary::OWL_OBJECT_PROPERTY),
        ];

        let ontology = DefaultOntologyLoader.load_from_triples(&triples).unwrap();

        assert_eq!(ontology.iri, Some(OwlIri::new(ex("onto"))));
        assert_eq!(ontology.classes_in_signature(Imports::Excluded).len(), 2);
        assert!(ontology.object_properties.contains(&ObjectProperty::new(ex("partOf"))));
        assert!(ontology.axioms.contains(&Axiom::SubClassOf(
            ClassExpression::named(ex("Branch")),
            ClassExpression::named(ex("Tree")),
        )));
        assert!(ontology.axioms.contains(&Axiom::label(OwlIri::new(ex("Branch")), "branch")));
    }

    #[test]
    fn test_load_some_values_from_restriction() {
        let triples = vec![
            t(&ex("partOf"), vocabulary::RDF_TYPE, vocabulary::OWL_OBJECT_PROPERTY),
            t(&ex("Leaf"), vocabulary::RDFS_SUBCLASS_OF, "_:r1"),
            t("_:r1", vocabulary::RDF_TYPE, vocabulary::OWL_RESTRICTION),
            t("_:r1", vocabulary::OWL_ON_PROPERTY, &ex("partOf")),
            t("_:r1", vocabulary::OWL_SOME_VALUES_FROM, &ex("Branch")),
        ];

        let ontology = DefaultOntologyLoader.load_from_triples(&triples).unwrap();

        let expected = Axiom::SubClassOf(
            ClassExpression::named(ex("Leaf")),
            ClassExpression::some(ObjectProperty::new(ex("partOf")), ClassExpression::named(ex("Branch"))),
        );
        assert!(ontology.axioms.contains(&expected));
        assert!(ontology.classes.contains(&Class::named(ex("Branch"))));
    }

    #[test]
    fn test_load_intersection_list() {
        let triples = vec![
            t(&ex("Bud"), vocabulary::OWL_EQUIVALENT_CLASS, "_:i"),
            t("_:i", vocabulary::OWL_INTERSECTION_OF, "_:l1"),
            t("_:l1", vocabulary::RDF_FIRST, &ex("Organ")),
            t("_:l1", vocabulary::RDF_REST, "_:l2"),
            t("_:l2", vocabulary::RDF_FIRST, vocabulary::OWL_THING),
            t("_:l2", vocabulary::RDF_REST, vocabulary::RDF_NIL),
        ];

        let ontology = DefaultOntologyLoader.load_from_triples(&triples).unwrap();

        assert_eq!(
            ontology.axioms[0],
            Axiom::EquivalentClasses(vec![
                ClassExpression::named(ex("Bud")),
                ClassExpression::ObjectIntersectionOf(vec![
                    ClassExpression::named(ex("Organ")),
                    ClassExpression::Class(Class::Thing),
                ]),
            ])
        );
    }

    #[test]
    fn test_range_requires_object_property() {
        let triples = vec![
            // declared after use
            t(&ex("occursIn"), vocabulary::RDFS_RANGE, &ex("Continuant")),
            t(&ex("occursIn"), vocabulary::RDF_TYPE, vocabulary::OWL_OBJECT_PROPERTY),
            t(&ex("hasAge"), vocabulary::RDFS_RANGE, "http://www.w3.org/2001/XMLSchema#integer"),
        ];

        let ontology = DefaultOntologyLoader.load_from_triples(&triples).unwrap();

        let ranges: Vec<_> = ontology
            .axioms
            .iter()
            .filter(|ax| matches!(ax, Axiom::ObjectPropertyRange(_, _)))
            .collect();
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn test_malformed_restriction() {
        let triples = vec![
            t(&ex("Leaf"), vocabulary::RDFS_SUBCLASS_OF, "_:r1"),
            t("_:r1", vocabulary::OWL_ON_PROPERTY, &ex("partOf")),
        ];

        let result = DefaultOntologyLoader.load_from_triples(&triples);
        assert!(matches!(result, Err(OwlError::Malformed(_))));
    }

    #[test]
    fn test_cyclic_list_is_rejected() {
        let triples = vec![
            t(&ex("A"), vocabulary::OWL_EQUIVALENT_CLASS, "_:u"),
            t("_:u", vocabulary::OWL_UNION_OF, "_:l1"),
            t("_:l1", vocabulary::RDF_FIRST, &ex("B")),
            t("_:l1", vocabulary::RDF_REST, "_:l1"),
        ];

        let result = DefaultOntologyLoader.load_from_triples(&triples);
        assert!(matches!(result, Err(OwlError::Malformed(_))));
    }

    #[test]
    fn test_import_declarations() {
        let triples = vec![
            t(&ex("onto"), vocabulary::OWL_IMPORTS, &ex("upper")),
            t(&ex("onto"), vocabulary::OWL_IMPORTS, &ex("upper")),
        ];

        let ontology = DefaultOntologyLoader.load_from_triples(&triples).unwrap();
        assert_eq!(ontology.import_declarations, vec![OwlIri::new(ex("upper"))]);
        assert!(ontology.imports.is_empty());
    }
}
