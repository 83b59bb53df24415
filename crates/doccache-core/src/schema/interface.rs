//! Simplified interfaces.

use super::field::{SimplifiedField, document_fields};
use super::simplified_type::SimplifiedType;
use crate::DoccacheError;
use crate::primitives::DOCUMENT_INTERFACE;
use std::collections::{BTreeMap, BTreeSet};

/// An interface of the induced schema.
///
/// Besides its fields, an interface carries the rules that decide which types
/// implement it: a type qualifies when it has every signature field, or when
/// its name is listed in `applicable_types`. Those rules live only in memory;
/// the rendered SDL carries just the fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifiedInterface {
    pub name: String,
    pub fields: BTreeMap<String, SimplifiedField>,
    pub signature_fields: BTreeSet<String>,
    pub applicable_types: BTreeSet<String>,
}

impl SimplifiedInterface {
    /// An interface with no fields and no rules.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
            signature_fields: BTreeSet::new(),
            applicable_types: BTreeSet::new(),
        }
    }

    /// The built-in `Document` interface.
    #[must_use]
    pub fn document() -> Self {
        let mut iface = Self::new(DOCUMENT_INTERFACE);
        for f in document_fields() {
            iface.insert(f);
        }
        iface
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, field: SimplifiedField) {
        self.fields.insert(field.name.clone(), field);
    }

    /// Add a field and mark it as a signature field.
    pub fn insert_signature(&mut self, field: SimplifiedField) {
        self.signature_fields.insert(field.name.clone());
        self.insert(field);
    }

    /// Whether this is the built-in `Document` interface.
    #[must_use]
    pub fn is_document(&self) -> bool {
        self.name == DOCUMENT_INTERFACE
    }

    /// Reject interfaces that can never apply to any type.
    pub fn validate(&self) -> Result<(), DoccacheError> {
        if self.is_document() {
            return Ok(());
        }
        if self.signature_fields.is_empty() && self.applicable_types.is_empty() {
            return Err(DoccacheError::InvalidInterface {
                name: self.name.clone(),
                reason: "no signature fields and no applicable types".to_string(),
            });
        }
        if let Some(missing) = self.signature_fields.iter().find(|s| !self.fields.contains_key(*s)) {
            return Err(DoccacheError::InvalidInterface {
                name: self.name.clone(),
                reason: format!("signature field {missing} is not an interface field"),
            });
        }
        Ok(())
    }

    /// Whether `ty` qualifies for this interface.
    #[must_use]
    pub fn applies_to(&self, ty: &SimplifiedType) -> bool {
        if self.is_document() || self.applicable_types.contains(&ty.name) {
            return true;
        }
        !self.signature_fields.is_empty() && self.signature_fields.iter().all(|s| ty.has_field(s))
    }
}
