//! 飽和アルゴリズム
//!
//! 正規化された公理に対して完備化規則を不動点まで適用します。
//! 導出済みの包含関係は単調に増えるだけなので、公理の追加後も
//! 既存の結果を保ったまま再開できます。

use crate::classifier::InterruptHandle;
use crate::normalize::{AtomId, NormalizedTbox, Normalizer, RoleId, Vocabulary, NOTHING, THING};
use crate::ClassifierError;
use exmat_owl::{Axiom, Class, ClassExpression};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::debug;

/// Stops saturation on interrupt or timeout
pub(crate) struct Guard<'a> {
    started: Instant,
    timeout: Option<Duration>,
    interrupt: &'a InterruptHandle,
}

impl<'a> Guard<'a> {
    /// Requests made while no computation was running are stale and dropped here
    pub fn new(timeout: Option<Duration>, interrupt: &'a InterruptHandle) -> Self {
        interrupt.take();
        Self {
            started: Instant::now(),
            timeout,
            interrupt,
        }
    }

    fn check(&self) -> Result<(), ClassifierError> {
        if self.interrupt.take() {
            return Err(ClassifierError::Interrupted);
        }
        if let Some(timeout) = self.timeout {
            if self.started.elapsed() >= timeout {
                return Err(ClassifierError::Timeout(timeout));
            }
        }
        Ok(())
    }
}

/// Normalized knowledge base together with its derived closure
#[derive(Debug, Clone)]
pub(crate) struct KnowledgeBase {
    vocab: Vocabulary,
    tbox: NormalizedTbox,
    /// S(A): derived subsumers of each atom
    subsumers: Vec<HashSet<AtomId>>,
    /// R(r): derived (A, B) pairs with A ⊑ ∃r.B
    links: HashMap<RoleId, HashSet<(AtomId, AtomId)>>,
    saturated: bool,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self {
            vocab: Vocabulary::new(),
            tbox: NormalizedTbox::default(),
            subsumers: Vec::new(),
            links: HashMap::new(),
            saturated: false,
        }
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub fn add_axiom(&mut self, axiom: &Axiom) -> Result<bool, ClassifierError> {
        self.saturated = false;
        Normalizer::new(&mut self.vocab, &mut self.tbox).add_axiom(axiom)
    }

    /// Fresh atom equivalent to `ce`
    pub fn define(&mut self, ce: &ClassExpression) -> Result<AtomId, ClassifierError> {
        self.saturated = false;
        Normalizer::new(&mut self.vocab, &mut self.tbox).define(ce)
    }

    /// Apply the completion rules until nothing changes; returns the number of rounds
    pub fn saturate(&mut self, guard: &Guard<'_>) -> Result<usize, ClassifierError> {
        if self.saturated {
            return Ok(0);
        }

        while self.subsumers.len() < self.vocab.atom_count() {
            let id = self.subsumers.len();
            self.subsumers.push([id, THING].into_iter().collect());
        }
        let role_closure = self.tbox.role_closure(self.vocab.role_count());

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            guard.check()?;
            rounds += 1;
            changed = false;

            changed |= self.apply_subsumer_rules();
            changed |= self.apply_link_rules(&role_closure);
            changed |= self.apply_transitivity_rule(&role_closure);
        }

        debug!(
            "Saturated {} atoms in {} rounds",
            self.vocab.atom_count(),
            rounds
        );
        self.saturated = true;
        Ok(rounds)
    }

    /// A ⊑ B, A1 ⊓ A2 ⊑ B and A ⊑ ∃r.B
    fn apply_subsumer_rules(&mut self) -> bool {
        let mut changed = false;
        for atom in 0..self.subsumers.len() {
            let current: Vec<AtomId> = self.subsumers[atom].iter().copied().collect();
            for subsumer in current {
                if let Some(told) = self.tbox.told.get(&subsumer) {
                    for sup in told {
                        changed |= self.subsumers[atom].insert(*sup);
                    }
                }
                if let Some(conjunctions) = self.tbox.conjunctions.get(&subsumer) {
                    for (other, sup) in conjunctions {
                        if self.subsumers[atom].contains(other) {
                            changed |= self.subsumers[atom].insert(*sup);
                        }
                    }
                }
                if let Some(existentials) = self.tbox.existentials.get(&subsumer) {
                    for (role, target) in existentials {
                        changed |= self.links.entry(*role).or_default().insert((atom, *target));
                    }
                }
            }
        }
        changed
    }

    /// ∃r.A ⊑ B through role inclusions, and ⊥ propagation along links
    fn apply_link_rules(&mut self, role_closure: &[HashSet<RoleId>]) -> bool {
        let mut changed = false;
        let links: Vec<(RoleId, AtomId, AtomId)> = self
            .links
            .iter()
            .flat_map(|(role, pairs)| pairs.iter().map(move |(from, to)| (*role, *from, *to)))
            .collect();

        for (role, from, to) in links {
            let target: Vec<AtomId> = self.subsumers[to].iter().copied().collect();
            if target.contains(&NOTHING) {
                changed |= self.subsumers[from].insert(NOTHING);
            }
            for subsumer in target {
                if let Some(restrictions) = self.tbox.restrictions.get(&subsumer) {
                    for (restricted, sup) in restrictions {
                        if role_closure[role].contains(restricted) {
                            changed |= self.subsumers[from].insert(*sup);
                        }
                    }
                }
            }
        }
        changed
    }

    /// r ⊑* t, s ⊑* t, Trans(t): A r B, B s C gives A t C
    fn apply_transitivity_rule(&mut self, role_closure: &[HashSet<RoleId>]) -> bool {
        let mut changed = false;
        let transitive: Vec<RoleId> = self.tbox.transitive.iter().copied().collect();
        for t in transitive {
            let mut successors: HashMap<AtomId, HashSet<AtomId>> = HashMap::new();
            for (role, pairs) in &self.links {
                if role_closure[*role].contains(&t) {
                    for (from, to) in pairs {
                        successors.entry(*from).or_default().insert(*to);
                    }
                }
            }

            let mut composed = Vec::new();
            for (from, middles) in &successors {
                for middle in middles {
                    if let Some(targets) = successors.get(middle) {
                        composed.extend(targets.iter().map(|to| (*from, *to)));
                    }
                }
            }
            let entry = self.links.entry(t).or_default();
            for pair in composed {
                changed |= entry.insert(pair);
            }
        }
        changed
    }

    fn is_unsatisfiable(&self, atom: AtomId) -> bool {
        self.subsumers[atom].contains(&NOTHING)
    }

    /// `sub ⊑ sup` in the current closure
    pub fn is_subsumed_by(&self, sub: AtomId, sup: AtomId) -> bool {
        sub == sup || self.is_unsatisfiable(sub) || self.subsumers[sub].contains(&sup)
    }

    pub fn is_consistent(&self) -> bool {
        !self.is_unsatisfiable(THING)
    }

    pub fn is_satisfiable(&self, atom: AtomId) -> bool {
        !self.is_unsatisfiable(atom)
    }

    pub fn unsatisfiable_classes(&self) -> HashSet<Class> {
        self.vocab
            .visible()
            .filter(|(id, _)| self.is_unsatisfiable(*id))
            .map(|(_, class)| class.clone())
            .collect()
    }

    pub fn equivalent_classes(&self, atom: AtomId) -> HashSet<Class> {
        self.vocab
            .visible()
            .filter(|(id, _)| self.is_subsumed_by(atom, *id) && self.is_subsumed_by(*id, atom))
            .map(|(_, class)| class.clone())
            .collect()
    }

    /// Strict superclasses of `atom`; with `direct`, only those with nothing strictly in between
    pub fn super_classes(&self, atom: AtomId, direct: bool) -> HashSet<Class> {
        let candidates: Vec<(AtomId, &Class)> = self
            .vocab
            .visible()
            .filter(|(id, _)| self.is_subsumed_by(atom, *id) && !self.is_subsumed_by(*id, atom))
            .collect();
        self.select(&candidates, direct, |lower, upper| self.is_strictly_below(lower, upper))
    }

    /// Strict subclasses of `atom`; with `direct`, only those with nothing strictly in between
    pub fn sub_classes(&self, atom: AtomId, direct: bool) -> HashSet<Class> {
        let candidates: Vec<(AtomId, &Class)> = self
            .vocab
            .visible()
            .filter(|(id, _)| self.is_subsumed_by(*id, atom) && !self.is_subsumed_by(atom, *id))
            .collect();
        self.select(&candidates, direct, |lower, upper| self.is_strictly_below(upper, lower))
    }

    fn is_strictly_below(&self, lower: AtomId, upper: AtomId) -> bool {
        self.is_subsumed_by(lower, upper) && !self.is_subsumed_by(upper, lower)
    }

    /// With `direct`, drop every candidate that has another candidate between it and the query.
    /// `between(c, b)` holds when `c` lies strictly between the query and `b`.
    fn select(
        &self,
        candidates: &[(AtomId, &Class)],
        direct: bool,
        between: impl Fn(AtomId, AtomId) -> bool,
    ) -> HashSet<Class> {
        candidates
            .iter()
            .filter(|(b, _)| !direct || !candidates.iter().any(|(c, _)| between(*c, *b)))
            .map(|(_, class)| (*class).clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exmat_owl::ObjectProperty;

    fn ex(local: &str) -> String {
        format!("http://example.org/{}", local)
    }

    fn named(local: &str) -> ClassExpression {
        ClassExpression::named(ex(local))
    }

    fn sub(a: ClassExpression, b: ClassExpression) -> Axiom {
        Axiom::SubClassOf(a, b)
    }

    fn saturated(axioms: &[Axiom]) -> KnowledgeBase {
        let mut kb = KnowledgeBase::new();
        for axiom in axioms {
            kb.add_axiom(axiom).unwrap();
        }
        let interrupt = InterruptHandle::new();
        kb.saturate(&Guard::new(None, &interrupt)).unwrap();
        kb
    }

    fn id(kb: &KnowledgeBase, local: &str) -> AtomId {
        kb.vocab().class_id(&Class::named(ex(local))).unwrap()
    }

    #[test]
    fn test_told_hierarchy_is_closed() {
        let kb = saturated(&[sub(named("A"), named("B")), sub(named("B"), named("C"))]);
        assert!(kb.is_subsumed_by(id(&kb, "A"), id(&kb, "C")));
        assert!(!kb.is_subsumed_by(id(&kb, "C"), id(&kb, "A")));

        let supers = kb.super_classes(id(&kb, "A"), false);
        assert_eq!(supers.len(), 3);
        assert!(supers.contains(&Class::Thing));
        let direct = kb.super_classes(id(&kb, "A"), true);
        assert_eq!(direct, [Class::named(ex("B"))].into_iter().collect());
    }

    #[test]
    fn test_existential_propagates_through_role_and_transitivity() {
        let part_of = ObjectProperty::new(ex("partOf"));
        let some_part_of = |c: ClassExpression| ClassExpression::some(part_of.clone(), c);
        let kb = saturated(&[
            Axiom::TransitiveObjectProperty(part_of.clone()),
            sub(named("Nucleus"), some_part_of(named("Cell"))),
            sub(named("Cell"), some_part_of(named("Tissue"))),
            Axiom::EquivalentClasses(vec![named("TissuePart"), some_part_of(named("Tissue"))]),
        ]);
        assert!(kb.is_subsumed_by(id(&kb, "Nucleus"), id(&kb, "TissuePart")));
        assert!(kb.is_subsumed_by(id(&kb, "Cell"), id(&kb, "TissuePart")));
    }

    #[test]
    fn test_role_hierarchy_feeds_restrictions() {
        let has_part = ObjectProperty::new(ex("hasPart"));
        let has_component = ObjectProperty::new(ex("hasComponent"));
        let kb = saturated(&[
            Axiom::SubObjectPropertyOf(has_component.clone(), has_part.clone()),
            sub(named("Car"), ClassExpression::some(has_component, named("Engine"))),
            Axiom::EquivalentClasses(vec![
                named("Machine"),
                ClassExpression::some(has_part, named("Engine")),
            ]),
        ]);
        assert!(kb.is_subsumed_by(id(&kb, "Car"), id(&kb, "Machine")));
    }

    #[test]
    fn test_disjointness_and_bottom_propagation() {
        let r = ObjectProperty::new(ex("r"));
        let kb = saturated(&[
            Axiom::DisjointClasses(vec![named("A"), named("B")]),
            sub(named("C"), named("A")),
            sub(named("C"), named("B")),
            sub(named("D"), ClassExpression::some(r, named("C"))),
            sub(named("E"), named("A")),
        ]);
        let unsat = kb.unsatisfiable_classes();
        assert!(unsat.contains(&Class::named(ex("C"))));
        assert!(unsat.contains(&Class::named(ex("D"))));
        assert!(unsat.contains(&Class::Nothing));
        assert!(!unsat.contains(&Class::named(ex("E"))));
        assert!(kb.is_consistent());
        // an unsatisfiable class sits under everything
        assert!(kb.is_subsumed_by(id(&kb, "C"), id(&kb, "E")));
    }

    #[test]
    fn test_sub_classes_include_nothing() {
        let kb = saturated(&[sub(named("A"), named("B"))]);
        let subs = kb.sub_classes(id(&kb, "B"), false);
        assert_eq!(subs, [Class::named(ex("A")), Class::Nothing].into_iter().collect());
        let direct = kb.sub_classes(id(&kb, "B"), true);
        assert_eq!(direct, [Class::named(ex("A"))].into_iter().collect());
    }

    #[test]
    fn test_defined_query_atom() {
        let r = ObjectProperty::new(ex("r"));
        let mut kb = saturated(&[sub(named("A"), ClassExpression::some(r.clone(), named("B")))]);
        let query = kb.define(&ClassExpression::some(r, named("B"))).unwrap();
        let interrupt = InterruptHandle::new();
        kb.saturate(&Guard::new(None, &interrupt)).unwrap();

        assert_eq!(kb.sub_classes(query, true), [Class::named(ex("A"))].into_iter().collect());
        assert_eq!(kb.super_classes(query, false), [Class::Thing].into_iter().collect());
        assert!(kb.equivalent_classes(query).is_empty());
    }

    #[test]
    fn test_interrupt_stops_saturation() {
        let mut kb = KnowledgeBase::new();
        kb.add_axiom(&sub(named("A"), named("B"))).unwrap();
        let interrupt = InterruptHandle::new();
        let guard = Guard::new(None, &interrupt);
        interrupt.interrupt();

        let result = kb.saturate(&guard);
        assert_eq!(result, Err(ClassifierError::Interrupted));
        assert!(!kb.is_saturated());
        // the request was consumed
        assert!(kb.saturate(&guard).is_ok());
    }

    #[test]
    fn test_idle_interrupt_is_dropped() {
        let mut kb = KnowledgeBase::new();
        kb.add_axiom(&sub(named("A"), named("B"))).unwrap();
        let interrupt = InterruptHandle::new();
        interrupt.interrupt();

        assert!(kb.saturate(&Guard::new(None, &interrupt)).is_ok());
        assert!(!interrupt.is_set());
    }
}
