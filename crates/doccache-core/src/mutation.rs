//! # Instance Mutations
//!
//! What a delta does to the instance store, decided before any request is
//! built. Every mutation is committed together with the cursor upsert.
//!
//! Updates are computed as a diff of the new view against the stored
//! instance:
//! - `set`: every non-null value of the new view; `@id` fields only when their
//!   value changed
//! - `remove`: every field non-null on the stored instance that the new view
//!   leaves null or absent, except list edges and non-null fields

use crate::instance::{SimplifiedInstance, Value};
use crate::primitives::DOC_ID;
use crate::schema::SimplifiedType;
use crate::DoccacheError;
use std::collections::BTreeMap;

/// A change to the instance store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Upsert a whole instance.
    Add { instance: SimplifiedInstance },
    /// Patch the instance with the given `docId`.
    Update {
        type_name: String,
        doc_id: String,
        set: BTreeMap<String, Value>,
        remove: BTreeMap<String, Value>,
    },
    /// Delete the instance with the given `docId`.
    Delete { type_name: String, doc_id: String },
    /// Nothing to write besides the cursor.
    CursorOnly,
}

impl Mutation {
    /// The mutation that stores `new`, given the stored instance if any.
    ///
    /// `ty` is the type after the schema step.
    pub fn store(
        ty: &SimplifiedType,
        new: SimplifiedInstance,
        old: Option<&SimplifiedInstance>,
    ) -> Result<Self, DoccacheError> {
        let Some(old) = old else {
            return Ok(Self::Add { instance: new });
        };
        let doc_id = match new.get(DOC_ID) {
            Some(Value::Str(id)) => id.clone(),
            _ => {
                return Err(DoccacheError::InvalidContent(format!(
                    "{} instance without {DOC_ID}",
                    new.type_name
                )));
            }
        };

        let set: BTreeMap<String, Value> = new
            .values
            .iter()
            .filter(|(k, v)| !v.is_null() && k.as_str() != DOC_ID)
            .filter(|(k, v)| {
                let is_id = ty.field(k).is_some_and(|f| f.is_id);
                !is_id || old.get(k) != Some(*v)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let remove: BTreeMap<String, Value> = old
            .values
            .iter()
            .filter(|(k, v)| !v.is_null() && !new.has_value(k))
            .filter(|(k, _)| ty.field(k).is_some_and(|f| !f.is_array && !f.non_null))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if set.is_empty() && remove.is_empty() {
            return Ok(Self::CursorOnly);
        }
        Ok(Self::Update {
            type_name: new.type_name,
            doc_id,
            set,
            remove,
        })
    }

    /// Add or remove a single list-edge entry.
    #[must_use]
    pub fn edge(type_name: &str, from: &str, edge: &str, to: &str, is_delete: bool) -> Self {
        let patch = BTreeMap::from([(edge.to_string(), Value::Refs(vec![to.to_string()]))]);
        let (set, remove) = if is_delete {
            (BTreeMap::new(), patch)
        } else {
            (patch, BTreeMap::new())
        };
        Self::Update {
            type_name: type_name.to_string(),
            doc_id: from.to_string(),
            set,
            remove,
        }
    }

    /// Delete an instance.
    #[must_use]
    pub fn delete(type_name: &str, doc_id: &str) -> Self {
        Self::Delete {
            type_name: type_name.to_string(),
            doc_id: doc_id.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::content::ContentType;
    use crate::schema::SimplifiedField;

    fn ty() -> SimplifiedType {
        let mut ty = SimplifiedType::document("Dho");
        ty.insert(SimplifiedField::from_content("details_name_n", ContentType::Name).id());
        ty.insert(SimplifiedField::from_content("details_title_s", ContentType::String));
        ty.insert(SimplifiedField::from_content("details_owner_n", ContentType::Name));
        ty.insert(SimplifiedField::edge("member", "Member"));
        ty
    }

    fn instance(pairs: &[(&str, Value)]) -> SimplifiedInstance {
        let mut i = SimplifiedInstance::new("Dho");
        i.set(DOC_ID, Value::Str("2".into()));
        for (k, v) in pairs {
            i.set(*k, v.clone());
        }
        i
    }

    #[test]
    fn absent_instance_is_added() {
        let new = instance(&[]);
        assert!(matches!(
            Mutation::store(&ty(), new, None).expect("store"),
            Mutation::Add { .. }
        ));
    }

    #[test]
    fn update_sets_new_and_removes_vanished_fields() {
        let old = instance(&[
            ("details_name_n", Value::Str("hypha".into())),
            ("details_owner_n", Value::Str("alice".into())),
            ("member", Value::Refs(vec!["31".into()])),
        ]);
        let new = instance(&[
            ("details_name_n", Value::Str("hypha".into())),
            ("details_title_s", Value::Str("t".into())),
        ]);
        let Mutation::Update { set, remove, doc_id, .. } =
            Mutation::store(&ty(), new, Some(&old)).expect("store")
        else {
            panic!("expected update");
        };
        assert_eq!(doc_id, "2");
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["details_title_s"]);
        assert_eq!(remove.keys().collect::<Vec<_>>(), vec!["details_owner_n"]);
        assert_eq!(remove.get("details_owner_n"), Some(&Value::Str("alice".into())));
    }

    #[test]
    fn changed_id_is_set() {
        let old = instance(&[("details_name_n", Value::Str("old".into()))]);
        let new = instance(&[("details_name_n", Value::Str("new".into()))]);
        let Mutation::Update { set, .. } = Mutation::store(&ty(), new, Some(&old)).expect("store")
        else {
            panic!("expected update");
        };
        assert!(set.contains_key("details_name_n"));
    }

    #[test]
    fn identical_view_is_cursor_only() {
        let old = instance(&[("details_name_n", Value::Str("hypha".into()))]);
        let new = old.clone();
        assert_eq!(
            Mutation::store(&ty(), new, Some(&old)).expect("store"),
            Mutation::CursorOnly
        );
    }

    #[test]
    fn edge_mutations() {
        let Mutation::Update { set, remove, .. } = Mutation::edge("Dho", "2", "member", "31", false)
        else {
            panic!("expected update");
        };
        assert_eq!(set.get("member"), Some(&Value::Refs(vec!["31".into()])));
        assert!(remove.is_empty());

        let Mutation::Update { set, remove, .. } = Mutation::edge("Dho", "2", "member", "31", true)
        else {
            panic!("expected update");
        };
        assert!(set.is_empty());
        assert!(remove.contains_key("member"));
    }
}
