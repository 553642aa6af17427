//! OWL データモデル

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::vocabulary;

/// OWL IRI wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OwlIri(pub String);

impl OwlIri {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local part of the IRI: the text after the last `#` or `/`.
    pub fn short_form(&self) -> &str {
        let s = self.0.as_str();
        match s.rfind(|c: char| c == '#' || c == '/') {
            Some(idx) if idx + 1 < s.len() => &s[idx + 1..],
            _ => s,
        }
    }
}

impl std::fmt::Display for OwlIri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwlIri {
    fn from(s: &str) -> Self {
        OwlIri::new(s)
    }
}

/// OWL Class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Class {
    /// Named class
    Named(OwlIri),
    /// owl:Thing (⊤)
    Thing,
    /// owl:Nothing (⊥)
    Nothing,
}

impl Class {
    pub fn named(iri: impl Into<String>) -> Self {
        Class::Named(OwlIri::new(iri))
    }

    /// IRI of the class, including the OWL built-ins.
    pub fn iri(&self) -> OwlIri {
        match self {
            Class::Named(iri) => iri.clone(),
            Class::Thing => OwlIri::new(vocabulary::OWL_THING),
            Class::Nothing => OwlIri::new(vocabulary::OWL_NOTHING),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Class::Named(_))
    }

    /// Maps the OWL built-in IRIs back onto `Thing` / `Nothing`.
    pub fn from_iri(iri: &str) -> Self {
        match iri {
            vocabulary::OWL_THING => Class::Thing,
            vocabulary::OWL_NOTHING => Class::Nothing,
            other => Class::named(other),
        }
    }
}

impl std::fmt::Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Class::Named(iri) => write!(f, "<{}>", iri),
            Class::Thing => write!(f, "owl:Thing"),
            Class::Nothing => write!(f, "owl:Nothing"),
        }
    }
}

/// OWL object property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ObjectProperty(pub OwlIri);

impl ObjectProperty {
    pub fn new(iri: impl Into<String>) -> Self {
        Self(OwlIri::new(iri))
    }

    pub fn iri(&self) -> &OwlIri {
        &self.0
    }
}

impl std::fmt::Display for ObjectProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// OWL class expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ClassExpression {
    /// Named class or built-in
    Class(Class),

    /// Existential restriction: ∃R.C
    ObjectSomeValuesFrom {
        property: ObjectProperty,
        filler: Box<ClassExpression>,
    },

    /// Universal restriction: ∀R.C
    ObjectAllValuesFrom {
        property: ObjectProperty,
        filler: Box<ClassExpression>,
    },

    /// C1 ⊓ ... ⊓ Cn
    ObjectIntersectionOf(Vec<ClassExpression>),

    /// C1 ⊔ ... ⊔ Cn
    ObjectUnionOf(Vec<ClassExpression>),

    /// ¬C
    ObjectComplementOf(Box<ClassExpression>),
}

impl ClassExpression {
    pub fn named(iri: impl Into<String>) -> Self {
        ClassExpression::Class(Class::named(iri))
    }

    pub fn some(property: ObjectProperty, filler: ClassExpression) -> Self {
        ClassExpression::ObjectSomeValuesFrom {
            property,
            filler: Box::new(filler),
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            ClassExpression::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        !matches!(self, ClassExpression::Class(_))
    }

    /// Named classes mentioned anywhere in the expression
    pub fn classes(&self) -> BTreeSet<Class> {
        let mut out = BTreeSet::new();
        self.collect(&mut out, &mut BTreeSet::new());
        out
    }

    /// Object properties mentioned anywhere in the expression
    pub fn object_properties(&self) -> BTreeSet<ObjectProperty> {
        let mut out = BTreeSet::new();
        self.collect(&mut BTreeSet::new(), &mut out);
        out
    }

    fn collect(&self, classes: &mut BTreeSet<Class>, properties: &mut BTreeSet<ObjectProperty>) {
        match self {
            ClassExpression::Class(class @ Class::Named(_)) => {
                classes.insert(class.clone());
            }
            ClassExpression::Class(_) => {}
            ClassExpression::ObjectSomeValuesFrom { property, filler } |
            ClassExpression::ObjectAllValuesFrom { property, filler } => {
                properties.insert(property.clone());
                filler.collect(classes, properties);
            }
            ClassExpression::ObjectIntersectionOf(operands) |
            ClassExpression::ObjectUnionOf(operands) => {
                for operand in operands {
                    operand.collect(classes, properties);
                }
            }
            ClassExpression::ObjectComplementOf(operand) => {
                operand.collect(classes, properties);
            }
        }
    }
}

impl From<Class> for ClassExpression {
    fn from(class: Class) -> Self {
        ClassExpression::Class(class)
    }
}

impl std::fmt::Display for ClassExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassExpression::Class(class) => write!(f, "{}", class),
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                write!(f, "ObjectSomeValuesFrom({} {})", property, filler)
            }
            ClassExpression::ObjectAllValuesFrom { property, filler } => {
                write!(f, "ObjectAllValuesFrom({} {})", property, filler)
            }
            ClassExpression::ObjectIntersectionOf(operands) => write_nary(f, "ObjectIntersectionOf", operands),
            ClassExpression::ObjectUnionOf(operands) => write_nary(f, "ObjectUnionOf", operands),
            ClassExpression::ObjectComplementOf(operand) => write!(f, "ObjectComplementOf({})", operand),
        }
    }
}

fn write_nary(f: &mut std::fmt::Formatter<'_>, name: &str, operands: &[ClassExpression]) -> std::fmt::Result {
    write!(f, "{}(", name)?;
    for (i, operand) in operands.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", operand)?;
    }
    write!(f, ")")
}

/// Declared entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Class(OwlIri),
    ObjectProperty(OwlIri),
}

/// OWL axiom (the subset used by classification)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axiom {
    /// Declaration(Class(C)) / Declaration(ObjectProperty(P))
    Declaration(Entity),

    /// SubClassOf(C1 C2)
    SubClassOf(ClassExpression, ClassExpression),

    /// EquivalentClasses(C1 ... Cn)
    EquivalentClasses(Vec<ClassExpression>),

    /// DisjointClasses(C1 ... Cn)
    DisjointClasses(Vec<ClassExpression>),

    /// SubObjectPropertyOf(P1 P2)
    SubObjectPropertyOf(ObjectProperty, ObjectProperty),

    /// TransitiveObjectProperty(P)
    TransitiveObjectProperty(ObjectProperty),

    /// ObjectPropertyDomain(P C)
    ObjectPropertyDomain(ObjectProperty, ClassExpression),

    /// ObjectPropertyRange(P C)
    ObjectPropertyRange(ObjectProperty, ClassExpression),

    /// AnnotationAssertion(A s "v"); only literal values are modelled
    AnnotationAssertion {
        subject: OwlIri,
        property: OwlIri,
        value: String,
    },
}

impl Axiom {
    /// rdfs:label annotation on `subject`
    pub fn label(subject: OwlIri, value: impl Into<String>) -> Self {
        Axiom::AnnotationAssertion {
            subject,
            property: OwlIri::new(vocabulary::RDFS_LABEL),
            value: value.into(),
        }
    }

    /// Class expressions the axiom relates (empty for property and annotation axioms)
    pub fn class_expressions(&self) -> Vec<&ClassExpression> {
        match self {
            Axiom::SubClassOf(sub, sup) => vec![sub, sup],
            Axiom::EquivalentClasses(expressions) |
            Axiom::DisjointClasses(expressions) => expressions.iter().collect(),
            Axiom::ObjectPropertyDomain(_, ce) |
            Axiom::ObjectPropertyRange(_, ce) => vec![ce],
            Axiom::Declaration(_) |
            Axiom::SubObjectPropertyOf(_, _) |
            Axiom::TransitiveObjectProperty(_) |
            Axiom::AnnotationAssertion { .. } => Vec::new(),
        }
    }
}

/// Whether an operation looks through `owl:imports`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Imports {
    Included,
    Excluded,
}

impl Imports {
    pub fn from_bool(include: bool) -> Self {
        if include { Imports::Included } else { Imports::Excluded }
    }
}

/// OWL ontology
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ontology {
    /// Ontology IRI
    pub iri: Option<OwlIri>,

    /// owl:imports declarations
    pub import_declarations: Vec<OwlIri>,

    /// Resolved imported ontologies, shared by reference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<Arc<Ontology>>,

    /// All axioms in the ontology
    pub axioms: Vec<Axiom>,

    /// Named classes mentioned in the ontology
    pub classes: HashSet<Class>,

    /// Object properties mentioned in the ontology
    pub object_properties: HashSet<ObjectProperty>,
}

impl Ontology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iri(iri: OwlIri) -> Self {
        Self {
            iri: Some(iri),
            ..Self::default()
        }
    }

    /// Adds an import declaration together with the resolved ontology.
    pub fn add_import(&mut self, imported: Arc<Ontology>) {
        if let Some(iri) = &imported.iri {
            if !self.import_declarations.contains(iri) {
                self.import_declarations.push(iri.clone());
            }
        }
        self.imports.push(imported);
    }

    pub fn add_axiom(&mut self, axiom: Axiom) {
        // Extract classes and properties from the axiom
        match &axiom {
            Axiom::Declaration(Entity::Class(iri)) => {
                self.insert_class(Class::from_iri(iri.as_str()));
            }
            Axiom::Declaration(Entity::ObjectProperty(iri)) => {
                self.object_properties.insert(ObjectProperty(iri.clone()));
            }
            Axiom::SubObjectPropertyOf(p1, p2) => {
                self.object_properties.insert(p1.clone());
                self.object_properties.insert(p2.clone());
            }
            Axiom::TransitiveObjectProperty(p) => {
                self.object_properties.insert(p.clone());
            }
            Axiom::ObjectPropertyDomain(p, _) |
            Axiom::ObjectPropertyRange(p, _) => {
                self.object_properties.insert(p.clone());
            }
            _ => {}
        }
        for expression in axiom.class_expressions() {
            self.classes.extend(expression.classes());
            self.object_properties.extend(expression.object_properties());
        }

        self.axioms.push(axiom);
    }

    fn insert_class(&mut self, class: Class) {
        if class.is_named() {
            self.classes.insert(class);
        }
    }

    /// This ontology followed by its transitive imports, each visited once
    pub fn import_closure(&self) -> Vec<&Ontology> {
        let mut closure: Vec<&Ontology> = vec![self];
        let mut seen: HashSet<*const Ontology> = HashSet::new();
        seen.insert(self as *const Ontology);
        let mut idx = 0;
        while idx < closure.len() {
            let current = closure[idx];
            for imported in &current.imports {
                let ptr = Arc::as_ptr(imported);
                if seen.insert(ptr) {
                    closure.push(imported.as_ref());
                }
            }
            idx += 1;
        }
        closure
    }

    fn scope(&self, imports: Imports) -> Vec<&Ontology> {
        match imports {
            Imports::Included => self.import_closure(),
            Imports::Excluded => vec![self],
        }
    }

    /// Named classes in the signature, in IRI order
    pub fn classes_in_signature(&self, imports: Imports) -> BTreeSet<Class> {
        self.scope(imports)
            .into_iter()
            .flat_map(|ont| ont.classes.iter().cloned())
            .collect()
    }

    /// Object properties in the signature, in IRI order
    pub fn object_properties_in_signature(&self, imports: Imports) -> BTreeSet<ObjectProperty> {
        self.scope(imports)
            .into_iter()
            .flat_map(|ont| ont.object_properties.iter().cloned())
            .collect()
    }

    pub fn axioms(&self, imports: Imports) -> impl Iterator<Item = &Axiom> {
        self.scope(imports).into_iter().flat_map(|ont| ont.axioms.iter())
    }

    pub fn contains_class(&self, class: &Class, imports: Imports) -> bool {
        match class {
            Class::Thing | Class::Nothing => true,
            Class::Named(_) => self.scope(imports).iter().any(|ont| ont.classes.contains(class)),
        }
    }

    pub fn contains_object_property(&self, property: &ObjectProperty, imports: Imports) -> bool {
        self.scope(imports).iter().any(|ont| ont.object_properties.contains(property))
    }
}

/// RDF triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(local: &str) -> String {
        format!("http://example.org/{}", local)
    }

    #[test]
    fn test_short_form() {
        assert_eq!(OwlIri::new("http://purl.obolibrary.org/obo/BFO_0000050").short_form(), "BFO_0000050");
        assert_eq!(OwlIri::new("http://example.org/onto#partOf").short_form(), "partOf");
        assert_eq!(OwlIri::new("urn:plain").short_form(), "urn:plain");
        assert_eq!(OwlIri::new("http://example.org/").short_form(), "http://example.org/");
    }

    #[test]
    fn test_add_axiom_collects_signature() {
        let mut ontology = Ontology::new();
        let part_of = ObjectProperty::new(ex("partOf"));
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::named(ex("Leaf")),
            ClassExpression::some(part_of.clone(), ClassExpression::named(ex("Tree"))),
        ));
        ontology.add_axiom(Axiom::SubClassOf(
            ClassExpression::named(ex("Tree")),
            ClassExpression::Class(Class::Thing),
        ));

        assert!(ontology.classes.contains(&Class::named(ex("Leaf"))));
        assert!(ontology.classes.contains(&Class::named(ex("Tree"))));
        assert!(!ontology.classes.contains(&Class::Thing));
        assert!(ontology.object_properties.contains(&part_of));
        assert_eq!(ontology.axioms.len(), 2);
    }

    #[test]
    fn test_import_closure_respects_flag() {
        let mut upper = Ontology::with_iri(OwlIri::new(ex("upper")));
        upper.add_axiom(Axiom::Declaration(Entity::Class(OwlIri::new(ex("Continuant")))));
        upper.add_axiom(Axiom::Declaration(Entity::ObjectProperty(OwlIri::new(ex("partOf")))));
        let upper = Arc::new(upper);

        let mut middle = Ontology::with_iri(OwlIri::new(ex("middle")));
        middle.add_import(Arc::clone(&upper));
        middle.add_axiom(Axiom::Declaration(Entity::Class(OwlIri::new(ex("Organ")))));
        let middle = Arc::new(middle);

        let mut root = Ontology::with_iri(OwlIri::new(ex("root")));
        root.add_import(Arc::clone(&middle));
        // diamond: upper is reachable twice
        root.add_import(Arc::clone(&upper));
        root.add_axiom(Axiom::Declaration(Entity::Class(OwlIri::new(ex("Heart")))));

        assert_eq!(root.import_closure().len(), 3);
        assert_eq!(root.classes_in_signature(Imports::Excluded).len(), 1);
        assert_eq!(root.classes_in_signature(Imports::Included).len(), 3);
        assert!(root.object_properties_in_signature(Imports::Excluded).is_empty());
        assert_eq!(root.object_properties_in_signature(Imports::Included).len(), 1);
        assert!(root.contains_class(&Class::named(ex("Continuant")), Imports::Included));
        assert!(!root.contains_class(&Class::named(ex("Continuant")), Imports::Excluded));
        assert_eq!(root.import_declarations.len(), 2);
    }

    #[test]
    fn test_expression_signature() {
        let expr = ClassExpression::ObjectIntersectionOf(vec![
            ClassExpression::named(ex("A")),
            ClassExpression::some(
                ObjectProperty::new(ex("r")),
                ClassExpression::some(ObjectProperty::new(ex("s")), ClassExpression::Class(Class::Thing)),
            ),
        ]);
        assert_eq!(expr.classes().len(), 1);
        assert_eq!(expr.object_properties().len(), 2);
        assert!(expr.is_anonymous());
        assert!(!ClassExpression::named(ex("A")).is_anonymous());
    }

    #[test]
    fn test_class_from_builtin_iri() {
        assert_eq!(Class::from_iri(vocabulary::OWL_THING), Class::Thing);
        assert_eq!(Class::from_iri(vocabulary::OWL_NOTHING), Class::Nothing);
        assert_eq!(Class::Nothing.iri().as_str(), vocabulary::OWL_NOTHING);
    }
}
