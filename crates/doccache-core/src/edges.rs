//! # Core Edge Resolution
//!
//! Every checksum field `f_c` of a document may be backed by a typed object
//! edge `f_c_edge` to the document whose hash it holds.
//!
//! Resolution is split so it stays pure: [`pending_lookups`] lists the hashes
//! the caller must look up in the store, and [`resolve`] folds the answers
//! into the parsed document. A referent that is not stored yet leaves the edge
//! unset; it is linked only when the referencing document is stored again.

use crate::codec;
use crate::document::ParsedDocument;
use crate::instance::Value;
use crate::primitives::DOCUMENT_INTERFACE;
use crate::schema::{Schema, SimplifiedField};
use crate::DocumentRef;
use std::collections::BTreeMap;

/// Hashes referenced by the document's checksum fields, deduplicated.
#[must_use]
pub fn pending_lookups(parsed: &ParsedDocument) -> Vec<String> {
    let mut hashes: Vec<String> = parsed.checksums.iter().map(|c| c.hash.clone()).collect();
    hashes.sort();
    hashes.dedup();
    hashes
}

/// Link core edges using the looked-up referents (`hash → document`).
///
/// - the current type already has `f_c_edge`: its target is kept when the
///   referent is assignable to it, otherwise the edge is generalized to
///   `Document`
/// - no edge yet: the edge is created targeting the referent's type
/// - referent not found: the value is null and no field is contributed
pub fn resolve(parsed: &mut ParsedDocument, schema: &Schema, found: &BTreeMap<String, DocumentRef>) {
    let current = schema.get_type(parsed.type_name());

    for checksum in &parsed.checksums {
        let edge = codec::core_edge_name(&checksum.field);
        let existing = current
            .and_then(|t| t.field(&edge))
            .and_then(SimplifiedField::target);

        match (existing, found.get(&checksum.hash)) {
            (Some(target), Some(referent)) => {
                let target = if schema.is_assignable(&referent.type_name, target) {
                    target
                } else {
                    DOCUMENT_INTERFACE
                };
                parsed.ty.insert(SimplifiedField::core_edge(&edge, target));
                parsed.instance.set(edge, Value::from(referent));
            }
            (Some(_), None) => parsed.instance.set(edge, Value::Null),
            (None, Some(referent)) => {
                parsed
                    .ty
                    .insert(SimplifiedField::core_edge(&edge, &referent.type_name));
                parsed.instance.set(edge, Value::from(referent));
            }
            (None, None) => {}
        }
    }
}
