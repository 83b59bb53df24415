//! Simplified object types.

use super::field::{SimplifiedField, document_fields};
use crate::codec::{GqlScalar, SearchIndex};
use crate::primitives::{CURSOR_TYPE, DOCUMENT_INTERFACE};
use std::collections::BTreeMap;

/// An object type of the induced schema.
///
/// Fields are unique by name and kept in a `BTreeMap` so rendering is stable.
/// `interfaces` keeps declaration order; induced types always start with
/// `Document`.
///
/// A `stub` type was installed from configuration before any document of
/// that type arrived, so it has no instances yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedType {
    pub name: String,
    pub fields: BTreeMap<String, SimplifiedField>,
    pub interfaces: Vec<String>,
    pub stub: bool,
}

impl SimplifiedType {
    /// An empty type with no interfaces.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            interfaces: Vec::new(),
            stub: false,
        }
    }

    /// An induced type: `Document` interface and its base fields.
    #[must_use]
    pub fn document(name: impl Into<String>) -> Self {
        let mut ty = Self::new(name);
        ty.interfaces.push(DOCUMENT_INTERFACE.to_string());
        for f in document_fields() {
            ty.fields.insert(f.name.clone(), f);
        }
        ty
    }

    /// The built-in `Cursor{id, cursor}` type.
    #[must_use]
    pub fn cursor() -> Self {
        let mut ty = Self::new(CURSOR_TYPE);
        ty.insert(SimplifiedField::scalar("id", GqlScalar::String, Some(SearchIndex::Exact)).id());
        ty.insert(SimplifiedField::scalar("cursor", GqlScalar::String, None).required());
        ty
    }

    /// Get a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SimplifiedField> {
        self.fields.get(name)
    }

    /// Check whether a field exists.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, field: SimplifiedField) {
        self.fields.insert(field.name.clone(), field);
    }

    /// Insert a field unless one with the same name exists. Returns whether it was added.
    pub fn add_field_if_not_exists(&mut self, field: SimplifiedField) -> bool {
        if self.has_field(&field.name) {
            return false;
        }
        self.insert(field);
        true
    }

    /// Whether the type declares the interface.
    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }

    /// Declare an interface (idempotent). Returns whether it was added.
    pub fn attach_interface(&mut self, interface: &str) -> bool {
        if self.implements(interface) {
            return false;
        }
        self.interfaces.push(interface.to_string());
        true
    }

    /// Fields marked `@id`.
    pub fn id_fields(&self) -> impl Iterator<Item = &SimplifiedField> {
        self.fields.values().filter(|f| f.is_id)
    }
}
