//! # Interface & Logical-ID Policy
//!
//! User configuration that shapes induced types beyond what content alone
//! says:
//!
//! - **Logical ids** promote content fields to primary keys when a type is
//!   created.
//! - **Custom interfaces** are attached to every type they apply to (by
//!   signature fields or by name) and contribute their fields.
//! - **Type mappings** rename the induced type of matching documents.
//!
//! Interfaces are attached only when a type is created. Later documents of
//! the type keep the interfaces it already has, even when they would no
//! longer qualify.

use crate::content::ChainDocument;
use crate::document::{ParsedDocument, TypeMapping, content_type_of};
use crate::primitives::DOCUMENT_INTERFACE;
use crate::schema::{Schema, SimplifiedField, SimplifiedInterface, SimplifiedType};
use crate::DoccacheError;
use std::collections::{BTreeMap, BTreeSet};

/// Configured logical ids, custom interfaces and type mappings.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// `type name → id field names`.
    pub logical_ids: BTreeMap<String, Vec<String>>,
    pub interfaces: Vec<SimplifiedInterface>,
    pub type_mappings: Vec<TypeMapping>,
}

impl Policy {
    /// Project a document, honoring type mappings.
    pub fn parse(&self, doc: &ChainDocument) -> Result<ParsedDocument, DoccacheError> {
        ParsedDocument::parse(doc, &self.type_mappings)
    }

    /// Apply logical ids and interfaces to a parsed document.
    ///
    /// Must run after core-edge resolution and before the type is merged into
    /// `schema`.
    pub fn apply(&self, schema: &Schema, parsed: &mut ParsedDocument) -> Result<(), DoccacheError> {
        match schema.get_type(parsed.type_name()) {
            None => self.apply_on_creation(schema, parsed)?,
            Some(current) => {
                let stub = current.stub;
                for iname in current.interfaces.iter().filter(|i| *i != DOCUMENT_INTERFACE) {
                    parsed.ty.attach_interface(iname);
                }
                if stub {
                    // The first real document of a stub creates the type.
                    self.apply_on_creation(schema, parsed)?;
                    return require_values(&parsed.ty, parsed);
                }
            }
        }
        require_values(schema.get_type(parsed.type_name()).unwrap_or(&parsed.ty), parsed)
    }

    fn apply_on_creation(&self, schema: &Schema, parsed: &mut ParsedDocument) -> Result<(), DoccacheError> {
        let type_name = parsed.type_name().to_string();

        for id in self.logical_ids.get(&type_name).into_iter().flatten() {
            let field = parsed
                .ty
                .fields
                .get_mut(id)
                .ok_or_else(|| DoccacheError::MissingLogicalId {
                    type_name: type_name.clone(),
                    field: id.clone(),
                })?;
            field.is_id = true;
            field.non_null = true;
        }

        let applicable: Vec<&SimplifiedInterface> = schema
            .interfaces()
            .filter(|i| !i.is_document() && i.applies_to(&parsed.ty))
            .collect();
        for iface in applicable {
            let mut merged = Vec::new();
            for f in iface.fields.values() {
                match parsed.ty.field(&f.name) {
                    None => merged.push(f.clone()),
                    Some(own) => {
                        if let Some(m) = schema.merge_field(&type_name, own, f, true)? {
                            merged.push(m);
                        }
                    }
                }
            }
            for f in merged {
                parsed.ty.insert(f);
            }
            parsed.ty.attach_interface(&iface.name);
        }
        Ok(())
    }

    /// A placeholder type for a name the configuration references before any
    /// document induced it. Configured logical ids are pre-applied.
    #[must_use]
    pub fn stub_type(&self, name: &str) -> SimplifiedType {
        let mut ty = SimplifiedType::document(name);
        ty.stub = true;
        for id in self.logical_ids.get(name).into_iter().flatten() {
            if let Some(t) = content_type_of(id) {
                ty.insert(SimplifiedField::from_content(id, t).id());
            }
        }
        ty
    }

    /// Merge the configured interfaces into `schema` (add-only).
    ///
    /// Edge targets and applicable types not yet in the schema are installed
    /// as stub types; applicable stubs implement their interface. Returns
    /// whether the schema changed.
    pub fn install(&self, schema: &mut Schema) -> Result<bool, DoccacheError> {
        let configured: BTreeSet<&str> = self.interfaces.iter().map(|i| i.name.as_str()).collect();
        let mut changed = false;

        for iface in &self.interfaces {
            for target in iface.fields.values().filter_map(SimplifiedField::target) {
                if !schema.contains(target) && !configured.contains(target) {
                    changed |= schema.update_type(self.stub_type(target))?.changed();
                }
            }
        }

        // Interfaces may reference each other; install in rounds until stuck.
        let mut pending: Vec<&SimplifiedInterface> = self.interfaces.iter().collect();
        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut missing = None;
            for iface in &pending {
                match schema.add_interface((*iface).clone()) {
                    Ok(c) => changed |= c,
                    Err(e @ DoccacheError::TypeNotFound(_)) => {
                        deferred.push(*iface);
                        missing = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }
            if let Some(e) = missing.filter(|_| deferred.len() == pending.len()) {
                return Err(e);
            }
            pending = deferred;
        }

        for iface in &self.interfaces {
            for name in &iface.applicable_types {
                if schema.get_type(name).is_some() {
                    continue;
                }
                let mut stub = self.stub_type(name);
                for f in iface.fields.values() {
                    stub.add_field_if_not_exists(f.clone());
                }
                stub.attach_interface(&iface.name);
                changed |= schema.update_type(stub)?.changed();
            }
        }
        Ok(changed)
    }
}

/// Non-null fields of `ty` must carry a value on the document.
fn require_values(ty: &SimplifiedType, parsed: &ParsedDocument) -> Result<(), DoccacheError> {
    let missing = ty
        .fields
        .values()
        .filter(|f| f.non_null && !f.is_object())
        .find(|f| !parsed.instance.has_value(&f.name));
    match missing {
        Some(f) => Err(DoccacheError::MissingLogicalId {
            type_name: ty.name.clone(),
            field: f.name.clone(),
        }),
        None => Ok(()),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UpdateOp;
    use crate::content::ContentType;
    use serde_json::json;

    fn doc(type_value: &str, details: serde_json::Value) -> ChainDocument {
        let mut group = vec![json!({"label": "content_group_label", "value": ["string", "details"]})];
        if let Some(items) = details.as_array() {
            group.extend(items.iter().cloned());
        }
        ChainDocument::from_json(&json!({
            "id": 5,
            "hash": "c".repeat(64),
            "creator": "dao.hypha",
            "created_date": "2021-04-12T05:09:36Z",
            "content_groups": [
                group,
                [
                    {"label": "content_group_label", "value": ["string", "system"]},
                    {"label": "type", "value": ["name", type_value]}
                ]
            ]
        }))
        .expect("doc")
    }

    fn votable() -> SimplifiedInterface {
        let mut iface = SimplifiedInterface::new("Votable");
        iface.insert_signature(SimplifiedField::from_content("details_title_s", ContentType::String));
        iface.insert(SimplifiedField::edge("vote", "Vote"));
        iface
    }

    #[test]
    fn logical_id_missing_on_creation() {
        let policy = Policy {
            logical_ids: BTreeMap::from([("Dho".to_string(), vec!["details_name_n".to_string()])]),
            ..Policy::default()
        };
        let schema = Schema::new();
        let mut parsed = policy.parse(&doc("dho", json!([]))).expect("parse");
        assert!(matches!(
            policy.apply(&schema, &mut parsed),
            Err(DoccacheError::MissingLogicalId { .. })
        ));

        let mut parsed = policy
            .parse(&doc("dho", json!([{"label": "name", "value": ["name", "hypha"]}])))
            .expect("parse");
        policy.apply(&schema, &mut parsed).expect("apply");
        let f = parsed.ty.field("details_name_n").expect("id field");
        assert!(f.is_id && f.non_null);
    }

    #[test]
    fn interface_attached_by_signature() {
        let policy = Policy {
            interfaces: vec![votable()],
            ..Policy::default()
        };
        let mut schema = Schema::new();
        assert!(policy.install(&mut schema).expect("install"));
        assert!(schema.get_type("Vote").is_some());

        let mut parsed = policy
            .parse(&doc("assignment", json!([{"label": "title", "value": ["string", "x"]}])))
            .expect("parse");
        policy.apply(&schema, &mut parsed).expect("apply");
        assert!(parsed.ty.implements("Votable"));
        assert!(parsed.ty.field("vote").is_some_and(SimplifiedField::is_edge));
    }

    #[test]
    fn interfaces_persist_on_update() {
        let policy = Policy {
            interfaces: vec![votable()],
            ..Policy::default()
        };
        let mut schema = Schema::new();
        policy.install(&mut schema).expect("install");
        let mut first = policy
            .parse(&doc("assignment", json!([{"label": "title", "value": ["string", "x"]}])))
            .expect("parse");
        policy.apply(&schema, &mut first).expect("apply");
        schema.update_type(first.ty).expect("create");

        let mut later = policy.parse(&doc("assignment", json!([]))).expect("parse");
        policy.apply(&schema, &mut later).expect("apply");
        assert!(later.ty.implements("Votable"));
    }

    #[test]
    fn install_creates_applicable_stubs_with_ids() {
        let mut iface = SimplifiedInterface::new("Payable");
        iface.applicable_types.insert("Payout".to_string());
        iface.insert(SimplifiedField::from_content("details_amount_a", ContentType::Asset));
        let policy = Policy {
            logical_ids: BTreeMap::from([("Payout".to_string(), vec!["details_key_c".to_string()])]),
            interfaces: vec![iface],
            ..Policy::default()
        };
        let mut schema = Schema::new();
        policy.install(&mut schema).expect("install");
        let payout = schema.get_type("Payout").expect("stub");
        assert!(payout.implements("Payable"));
        assert!(payout.has_field("details_amount_a"));
        assert!(payout.field("details_key_c").is_some_and(|f| f.is_id));
        assert!(!policy.install(&mut schema).expect("again"));
    }

    #[test]
    fn first_document_of_a_stub_is_a_creation() {
        let mut assignable = SimplifiedInterface::new("Assignable");
        assignable.insert_signature(SimplifiedField::from_content("details_assignee_n", ContentType::Name));
        let policy = Policy {
            logical_ids: BTreeMap::from([("Vote".to_string(), vec!["details_key_s".to_string()])]),
            interfaces: vec![votable(), assignable],
            ..Policy::default()
        };
        let mut schema = Schema::new();
        policy.install(&mut schema).expect("install");
        assert!(schema.get_type("Vote").is_some_and(|t| t.stub));

        let mut vote = policy
            .parse(&doc(
                "vote",
                json!([
                    {"label": "assignee", "value": ["name", "alice"]},
                    {"label": "key", "value": ["string", "v1"]}
                ]),
            ))
            .expect("parse");
        policy.apply(&schema, &mut vote).expect("apply");
        assert!(vote.ty.implements("Assignable"));
        assert!(vote.ty.field("details_key_s").is_some_and(|f| f.is_id));

        assert_eq!(schema.update_type(vote.ty).expect("merge"), UpdateOp::Updated);
        let stored = schema.get_type("Vote").expect("vote");
        assert!(!stored.stub);
        assert!(stored.implements("Assignable"));
        assert!(stored.has_field("details_assignee_n"));
    }

    #[test]
    fn later_documents_need_id_values() {
        let policy = Policy {
            logical_ids: BTreeMap::from([("Dho".to_string(), vec!["details_name_n".to_string()])]),
            ..Policy::default()
        };
        let mut schema = Schema::new();
        let mut first = policy
            .parse(&doc("dho", json!([{"label": "name", "value": ["name", "hypha"]}])))
            .expect("parse");
        policy.apply(&schema, &mut first).expect("apply");
        schema.update_type(first.ty).expect("create");

        let mut later = policy.parse(&doc("dho", json!([]))).expect("parse");
        assert!(policy.apply(&schema, &mut later).is_err());
    }
}
