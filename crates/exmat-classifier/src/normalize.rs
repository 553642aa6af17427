//! EL 正規化
//!
//! 公理を次の正規形に分解します (A, B は原子、r はロール):
//! - A ⊑ B
//! - A1 ⊓ A2 ⊑ B
//! - A ⊑ ∃r.B
//! - ∃r.A ⊑ B
//! - r ⊑ s / Trans(r)

use crate::ClassifierError;
use exmat_owl::{Axiom, Class, ClassExpression, Entity, ObjectProperty};
use std::collections::{HashMap, HashSet};

pub(crate) type AtomId = usize;
pub(crate) type RoleId = usize;

pub(crate) const THING: AtomId = 0;
pub(crate) const NOTHING: AtomId = 1;

/// Saturation atom: a signature class or a name introduced by normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Atom {
    Class(Class),
    Fresh(usize),
}

/// Interned atoms and roles
#[derive(Debug, Clone)]
pub(crate) struct Vocabulary {
    atoms: Vec<Atom>,
    atom_ids: HashMap<Atom, AtomId>,
    roles: Vec<ObjectProperty>,
    role_ids: HashMap<ObjectProperty, RoleId>,
    fresh: usize,
}

impl Vocabulary {
    pub fn new() -> Self {
        let mut vocab = Self {
            atoms: Vec::new(),
            atom_ids: HashMap::new(),
            roles: Vec::new(),
            role_ids: HashMap::new(),
            fresh: 0,
        };
        vocab.intern_atom(Atom::Class(Class::Thing));
        vocab.intern_atom(Atom::Class(Class::Nothing));
        vocab
    }

    fn intern_atom(&mut self, atom: Atom) -> AtomId {
        if let Some(id) = self.atom_ids.get(&atom) {
            return *id;
        }
        let id = self.atoms.len();
        self.atoms.push(atom.clone());
        self.atom_ids.insert(atom, id);
        id
    }

    pub fn class(&mut self, class: &Class) -> AtomId {
        self.intern_atom(Atom::Class(class.clone()))
    }

    pub fn fresh(&mut self) -> AtomId {
        self.fresh += 1;
        self.intern_atom(Atom::Fresh(self.fresh))
    }

    pub fn role(&mut self, property: &ObjectProperty) -> RoleId {
        if let Some(id) = self.role_ids.get(property) {
            return *id;
        }
        let id = self.roles.len();
        self.roles.push(property.clone());
        self.role_ids.insert(property.clone(), id);
        id
    }

    pub fn class_id(&self, class: &Class) -> Option<AtomId> {
        self.atom_ids.get(&Atom::Class(class.clone())).copied()
    }

    pub fn contains_role(&self, property: &ObjectProperty) -> bool {
        self.role_ids.contains_key(property)
    }

    pub fn atom(&self, id: AtomId) -> &Atom {
        &self.atoms[id]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Thing, Nothing and the named classes, in interning order
    pub fn visible(&self) -> impl Iterator<Item = (AtomId, &Class)> {
        self.atoms.iter().enumerate().filter_map(|(id, atom)| match atom {
            Atom::Class(class) => Some((id, class)),
            Atom::Fresh(_) => None,
        })
    }

    /// Register every class and property an axiom mentions
    pub fn intern_signature(&mut self, axiom: &Axiom) {
        match axiom {
            Axiom::Declaration(Entity::Class(iri)) => {
                self.class(&Class::from_iri(iri.as_str()));
            }
            Axiom::Declaration(Entity::ObjectProperty(iri)) => {
                self.role(&ObjectProperty(iri.clone()));
            }
            Axiom::SubObjectPropertyOf(sub, sup) => {
                self.role(sub);
                self.role(sup);
            }
            Axiom::TransitiveObjectProperty(p) |
            Axiom::ObjectPropertyDomain(p, _) |
            Axiom::ObjectPropertyRange(p, _) => {
                self.role(p);
            }
            _ => {}
        }
        for expression in axiom.class_expressions() {
            for class in expression.classes() {
                self.class(&class);
            }
            for property in expression.object_properties() {
                self.role(&property);
            }
        }
    }
}

/// Normalized axioms, indexed by the atom that triggers them
#[derive(Debug, Clone, Default)]
pub(crate) struct NormalizedTbox {
    /// A ⊑ B
    pub told: HashMap<AtomId, Vec<AtomId>>,
    /// A1 ⊓ A2 ⊑ B, indexed by A1 and by A2
    pub conjunctions: HashMap<AtomId, Vec<(AtomId, AtomId)>>,
    /// A ⊑ ∃r.B
    pub existentials: HashMap<AtomId, Vec<(RoleId, AtomId)>>,
    /// ∃r.A ⊑ B, indexed by A
    pub restrictions: HashMap<AtomId, Vec<(RoleId, AtomId)>>,
    /// r ⊑ s
    pub role_supers: HashMap<RoleId, HashSet<RoleId>>,
    pub transitive: HashSet<RoleId>,
}

impl NormalizedTbox {
    /// Reflexive-transitive closure of the role hierarchy, indexed by role
    pub fn role_closure(&self, role_count: usize) -> Vec<HashSet<RoleId>> {
        (0..role_count)
            .map(|role| {
                let mut closure = HashSet::new();
                let mut stack = vec![role];
                while let Some(current) = stack.pop() {
                    if closure.insert(current) {
                        if let Some(supers) = self.role_supers.get(&current) {
                            stack.extend(supers.iter().copied());
                        }
                    }
                }
                closure
            })
            .collect()
    }
}

/// Reject constructors outside EL
pub(crate) fn check_profile(ce: &ClassExpression) -> Result<(), ClassifierError> {
    match ce {
        ClassExpression::Class(_) => Ok(()),
        ClassExpression::ObjectSomeValuesFrom { filler, .. } => check_profile(filler),
        ClassExpression::ObjectIntersectionOf(operands) => {
            operands.iter().try_for_each(check_profile)
        }
        ClassExpression::ObjectAllValuesFrom { .. } |
        ClassExpression::ObjectUnionOf(_) |
        ClassExpression::ObjectComplementOf(_) => {
            Err(ClassifierError::ProfileViolation(ce.to_string()))
        }
    }
}

/// Writes normal forms into a tbox, minting fresh atoms from the vocabulary
pub(crate) struct Normalizer<'a> {
    vocab: &'a mut Vocabulary,
    tbox: &'a mut NormalizedTbox,
}

impl<'a> Normalizer<'a> {
    pub fn new(vocab: &'a mut Vocabulary, tbox: &'a mut NormalizedTbox) -> Self {
        Self { vocab, tbox }
    }

    /// Normalize one axiom. Returns `false` when the axiom carries no
    /// subsumption information (annotations, range axioms).
    pub fn add_axiom(&mut self, axiom: &Axiom) -> Result<bool, ClassifierError> {
        self.vocab.intern_signature(axiom);
        if matches!(axiom, Axiom::ObjectPropertyRange(_, _) | Axiom::AnnotationAssertion { .. }) {
            return Ok(false);
        }
        for expression in axiom.class_expressions() {
            check_profile(expression)?;
        }

        match axiom {
            Axiom::SubClassOf(sub, sup) => {
                self.subsumption(sub, sup);
            }
            Axiom::EquivalentClasses(expressions) => {
                for (i, left) in expressions.iter().enumerate() {
                    for (j, right) in expressions.iter().enumerate() {
                        if i != j {
                            self.subsumption(left, right);
                        }
                    }
                }
            }
            Axiom::DisjointClasses(expressions) => {
                for (i, left) in expressions.iter().enumerate() {
                    for right in &expressions[i + 1..] {
                        let both = ClassExpression::ObjectIntersectionOf(vec![left.clone(), right.clone()]);
                        let atom = self.left(&both);
                        self.told(atom, NOTHING);
                    }
                }
            }
            Axiom::ObjectPropertyDomain(property, domain) => {
                let restriction = ClassExpression::some(property.clone(), ClassExpression::Class(Class::Thing));
                self.subsumption(&restriction, domain);
            }
            Axiom::SubObjectPropertyOf(sub, sup) => {
                let sub = self.vocab.role(sub);
                let sup = self.vocab.role(sup);
                self.tbox.role_supers.entry(sub).or_default().insert(sup);
            }
            Axiom::TransitiveObjectProperty(property) => {
                let role = self.vocab.role(property);
                self.tbox.transitive.insert(role);
            }
            Axiom::Declaration(_) |
            Axiom::ObjectPropertyRange(_, _) |
            Axiom::AnnotationAssertion { .. } => {}
        }
        Ok(true)
    }

    /// Introduce a fresh atom `Q` with `Q ≡ ce`
    pub fn define(&mut self, ce: &ClassExpression) -> Result<AtomId, ClassifierError> {
        check_profile(ce)?;
        let query = self.vocab.fresh();
        self.right(query, ce);
        let lhs = self.left(ce);
        self.told(lhs, query);
        Ok(query)
    }

    fn subsumption(&mut self, sub: &ClassExpression, sup: &ClassExpression) {
        let atom = self.left(sub);
        self.right(atom, sup);
    }

    fn told(&mut self, sub: AtomId, sup: AtomId) {
        let entry = self.tbox.told.entry(sub).or_default();
        if !entry.contains(&sup) {
            entry.push(sup);
        }
    }

    /// Atom standing for `ce` on the left-hand side of a subsumption
    fn left(&mut self, ce: &ClassExpression) -> AtomId {
        match ce {
            ClassExpression::Class(class) => self.vocab.class(class),
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                let role = self.vocab.role(property);
                let inner = self.left(filler);
                let atom = self.vocab.fresh();
                self.tbox.restrictions.entry(inner).or_default().push((role, atom));
                atom
            }
            ClassExpression::ObjectIntersectionOf(operands) => {
                let mut atoms = operands.iter().map(|op| self.left(op)).collect::<Vec<_>>().into_iter();
                let Some(mut acc) = atoms.next() else {
                    return THING;
                };
                for atom in atoms {
                    let conjunction = self.vocab.fresh();
                    self.tbox.conjunctions.entry(acc).or_default().push((atom, conjunction));
                    self.tbox.conjunctions.entry(atom).or_default().push((acc, conjunction));
                    acc = conjunction;
                }
                acc
            }
            // Filtered by check_profile
            ClassExpression::ObjectAllValuesFrom { .. } |
            ClassExpression::ObjectUnionOf(_) |
            ClassExpression::ObjectComplementOf(_) => THING,
        }
    }

    /// Record `atom ⊑ ce`
    fn right(&mut self, atom: AtomId, ce: &ClassExpression) {
        match ce {
            ClassExpression::Class(class) => {
                let sup = self.vocab.class(class);
                self.told(atom, sup);
            }
            ClassExpression::ObjectSomeValuesFrom { property, filler } => {
                let role = self.vocab.role(property);
                let target = match filler.as_class() {
                    Some(class) => self.vocab.class(class),
                    None => {
                        let target = self.vocab.fresh();
                        self.right(target, filler);
                        target
                    }
                };
                self.tbox.existentials.entry(atom).or_default().push((role, target));
            }
            ClassExpression::ObjectIntersectionOf(operands) => {
                for operand in operands {
                    self.right(atom, operand);
                }
            }
            ClassExpression::ObjectAllValuesFrom { .. } |
            ClassExpression::ObjectUnionOf(_) |
            ClassExpression::ObjectComplementOf(_) => {}
        }
    }
}
