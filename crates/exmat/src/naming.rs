//! Synthetic class naming

use exmat_owl::{Class, ObjectProperty, OwlIri};

/// Characters of a relation IRI that are escaped in synthetic names
const RESERVED: &[char] = &['_', ':', '/', '#', '?', '&', '='];

/// Escape every reserved character as `_` plus its two-digit uppercase hex code.
///
/// `_` is itself reserved, so distinct inputs never collide.
pub fn escape_iri(iri: &str) -> String {
    let mut escaped = String::with_capacity(iri.len() + 8);
    for c in iri.chars() {
        if RESERVED.contains(&c) {
            escaped.push_str(&format!("_{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// `<filler IRI>__<escaped relation IRI>`.
///
/// Distinct for absolute relation IRIs; relative ones can clash, which
/// `ExpressionRegistry::register` resolves.
pub fn synthetic_iri(relation: &ObjectProperty, filler: &Class) -> OwlIri {
    OwlIri::new(format!("{}__{}", filler.iri(), escape_iri(relation.iri().as_str())))
}

/// Human readable label: relation short form, then filler short form
pub fn synthetic_label(relation: &ObjectProperty, filler: &Class) -> String {
    let filler_iri = filler.iri();
    format!("{} {}", relation.iri().short_form(), filler_iri.short_form())
}
