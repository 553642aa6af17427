//! 式レジストリ
//!
//! 合成クラスと存在制限 (R some C) の双方向対応を保持します。
//! 追加のみで、削除はありません。

use crate::naming::{synthetic_iri, synthetic_label};
use exmat_owl::{Class, ClassExpression, ObjectProperty, OwlIri};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// Existential restriction `relation some filler` with a named filler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Existential {
    pub relation: ObjectProperty,
    pub filler: Class,
}

impl Existential {
    pub fn new(relation: ObjectProperty, filler: Class) -> Self {
        Self { relation, filler }
    }

    pub fn to_class_expression(&self) -> ClassExpression {
        ClassExpression::some(self.relation.clone(), ClassExpression::Class(self.filler.clone()))
    }

    /// The depth-1 form of `ce`, if it has one
    pub fn from_class_expression(ce: &ClassExpression) -> Option<Self> {
        match ce {
            ClassExpression::ObjectSomeValuesFrom { property, filler } => filler
                .as_class()
                .map(|class| Existential::new(property.clone(), class.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Existential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectSomeValuesFrom({} {})", self.relation, self.filler)
    }
}

impl From<Existential> for ClassExpression {
    fn from(existential: Existential) -> Self {
        existential.to_class_expression()
    }
}

/// Named class standing for an existential restriction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SyntheticClass {
    pub iri: OwlIri,
    pub label: String,
}

impl SyntheticClass {
    pub fn for_existential(existential: &Existential) -> Self {
        Self {
            iri: synthetic_iri(&existential.relation, &existential.filler),
            label: synthetic_label(&existential.relation, &existential.filler),
        }
    }

    pub fn class(&self) -> Class {
        Class::Named(self.iri.clone())
    }
}

/// Outcome of `ExpressionRegistry::register`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// First time the expression was seen; its axioms still have to be emitted
    New(SyntheticClass),
    Existing(SyntheticClass),
}

impl Registration {
    pub fn synthetic(&self) -> &SyntheticClass {
        match self {
            Registration::New(synthetic) | Registration::Existing(synthetic) => synthetic,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Registration::New(_))
    }
}

/// Bidirectional cache between synthetic classes and the expressions they stand for
#[derive(Debug, Clone, Default)]
pub struct ExpressionRegistry {
    by_class: HashMap<Class, (SyntheticClass, Existential)>,
    by_expression: HashMap<Existential, SyntheticClass>,
    materialized: BTreeSet<ObjectProperty>,
}

impl ExpressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthetic IRIs are never shared: when the natural name already stands for
    /// another expression (possible with relative IRIs), a `__2`, `__3`, ... suffix is used.
    pub fn register(&mut self, existential: Existential) -> Registration {
        if let Some(synthetic) = self.by_expression.get(&existential) {
            return Registration::Existing(synthetic.clone());
        }
        let mut synthetic = SyntheticClass::for_existential(&existential);
        let natural = synthetic.iri.clone();
        let mut suffix = 1;
        while self.by_class.contains_key(&synthetic.class()) {
            suffix += 1;
            synthetic.iri = OwlIri::new(format!("{}__{}", natural, suffix));
        }
        if suffix > 1 {
            warn!("{} is taken, registering {} as {}", natural, existential, synthetic.iri);
        }
        self.by_class
            .insert(synthetic.class(), (synthetic.clone(), existential.clone()));
        self.by_expression.insert(existential, synthetic.clone());
        Registration::New(synthetic)
    }

    pub fn lookup_expression(&self, class: &Class) -> Option<&Existential> {
        self.by_class.get(class).map(|(_, existential)| existential)
    }

    pub fn lookup_class(&self, existential: &Existential) -> Option<&SyntheticClass> {
        self.by_expression.get(existential)
    }

    pub fn is_synthetic(&self, class: &Class) -> bool {
        self.by_class.contains_key(class)
    }

    pub fn is_materialized(&self, relation: &ObjectProperty) -> bool {
        self.materialized.contains(relation)
    }

    /// Returns `true` if the relation was not yet marked
    pub fn mark_materialized(&mut self, relation: ObjectProperty) -> bool {
        self.materialized.insert(relation)
    }

    pub fn materialized_relations(&self) -> &BTreeSet<ObjectProperty> {
        &self.materialized
    }

    pub fn len(&self) -> usize {
        self.by_expression.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_expression.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SyntheticClass, &Existential)> {
        self.by_class.values().map(|(synthetic, existential)| (synthetic, existential))
    }
}
