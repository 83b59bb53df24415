//! # Simplified Schema Model
//!
//! The authoritative in-memory mirror of the GraphQL schema.
//!
//! The schema only ever grows: types gain fields and interfaces, nullable
//! relaxations and edge generalizations widen what is accepted, and nothing
//! is removed or tightened. Every mutation validates the whole change before
//! applying any of it, so a rejected update leaves the schema untouched.
//!
//! The SDL text pushed to the backend is rendered lazily from this model and
//! cached until the next mutation.

mod field;
mod interface;
mod sdl;
mod simplified_type;

pub use field::{FieldType, SimplifiedField, document_fields};
pub use interface::SimplifiedInterface;
pub use simplified_type::SimplifiedType;

use crate::primitives::{CURSOR_TYPE, DOCUMENT_INTERFACE};
use crate::{DoccacheError, UpdateOp};
use std::collections::BTreeMap;

// =============================================================================
// SCHEMA
// =============================================================================

/// The induced schema: simplified types and interfaces.
#[derive(Debug, Clone)]
pub struct Schema {
    types: BTreeMap<String, SimplifiedType>,
    interfaces: BTreeMap<String, SimplifiedInterface>,
    /// Rendered SDL, dropped on every mutation.
    rendered: Option<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// The base schema: `Document` interface and `Cursor` type.
    #[must_use]
    pub fn new() -> Self {
        let mut schema = Self {
            types: BTreeMap::new(),
            interfaces: BTreeMap::new(),
            rendered: None,
        };
        schema.install_builtins();
        schema
    }

    /// Read a schema back from SDL previously rendered by [`Schema::sdl`].
    pub fn parse(text: &str) -> Result<Self, DoccacheError> {
        let (interfaces, types) = sdl::parse(text)?;
        let mut schema = Self {
            types: BTreeMap::new(),
            interfaces: interfaces.into_iter().map(|i| (i.name.clone(), i)).collect(),
            rendered: None,
        };
        for mut ty in types {
            // Inherited fields are only rendered where the type overrides them.
            let inherited: Vec<SimplifiedField> = ty
                .interfaces
                .iter()
                .filter_map(|i| schema.interfaces.get(i))
                .flat_map(|iface| iface.fields.values().cloned())
                .collect();
            for f in inherited {
                ty.add_field_if_not_exists(f);
            }
            schema.types.insert(ty.name.clone(), ty);
        }
        schema.install_builtins();
        Ok(schema)
    }

    fn install_builtins(&mut self) {
        self.interfaces
            .entry(DOCUMENT_INTERFACE.to_string())
            .or_insert_with(SimplifiedInterface::document);
        self.types
            .entry(CURSOR_TYPE.to_string())
            .or_insert_with(SimplifiedType::cursor);
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Get a type by name.
    #[must_use]
    pub fn get_type(&self, name: &str) -> Option<&SimplifiedType> {
        self.types.get(name)
    }

    /// Get an interface by name.
    #[must_use]
    pub fn get_interface(&self, name: &str) -> Option<&SimplifiedInterface> {
        self.interfaces.get(name)
    }

    /// All types in name order.
    pub fn types(&self) -> impl Iterator<Item = &SimplifiedType> {
        self.types.values()
    }

    /// All interfaces in name order.
    pub fn interfaces(&self) -> impl Iterator<Item = &SimplifiedInterface> {
        self.interfaces.values()
    }

    /// Whether `name` is a type or an interface.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.interfaces.contains_key(name)
    }

    /// Whether a value of type `sub` may be stored where `sup` is declared.
    ///
    /// A type not yet installed is an induced type in the making and counts as
    /// a `Document`.
    #[must_use]
    pub fn is_assignable(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }
        match self.types.get(sub) {
            Some(t) => t.implements(sup),
            None => {
                sup == DOCUMENT_INTERFACE && sub != CURSOR_TYPE && !self.interfaces.contains_key(sub)
            }
        }
    }

    fn implements_document(&self, name: &str) -> bool {
        name == DOCUMENT_INTERFACE || self.is_assignable(name, DOCUMENT_INTERFACE)
    }

    // =========================================================================
    // FIELD COMPATIBILITY
    // =========================================================================

    /// Merge `new` into the existing field `old`.
    ///
    /// Returns the merged field when it differs from `old`. With `promote`,
    /// `new` may turn the field into a non-null id (type creation only).
    pub fn merge_field(
        &self,
        owner: &str,
        old: &SimplifiedField,
        new: &SimplifiedField,
        promote: bool,
    ) -> Result<Option<SimplifiedField>, DoccacheError> {
        if old.is_array != new.is_array {
            return Err(DoccacheError::incompatible(owner, &old.name, "array-ness cannot change"));
        }

        let mut merged = old.clone();
        match (&old.field_type, &new.field_type) {
            (FieldType::Scalar(a), FieldType::Scalar(b)) => {
                if a != b {
                    return Err(DoccacheError::incompatible(
                        owner,
                        &old.name,
                        format!("scalar {a} cannot become {b}"),
                    ));
                }
                merged.index = old.index.or(new.index);
            }
            (FieldType::Object(o), FieldType::Object(n)) => {
                if o != n && !self.is_assignable(n, o) {
                    if !self.is_assignable(o, n) {
                        return Err(DoccacheError::IncompatibleEdgeTarget {
                            type_name: owner.to_string(),
                            field: old.name.clone(),
                            existing: o.clone(),
                            requested: n.clone(),
                        });
                    }
                    merged.field_type = FieldType::Object(n.clone());
                }
            }
            _ => {
                return Err(DoccacheError::incompatible(
                    owner,
                    &old.name,
                    format!("{} cannot become {}", old.field_type.name(), new.field_type.name()),
                ));
            }
        }

        if promote {
            merged.non_null |= new.non_null;
            merged.is_id |= new.is_id;
        } else if new.non_null && !old.non_null {
            return Err(DoccacheError::incompatible(
                owner,
                &old.name,
                "nullable field cannot become non-null",
            ));
        } else if old.non_null && !new.non_null && !old.is_id {
            merged.non_null = false;
        }

        Ok((merged != *old).then_some(merged))
    }

    fn check_target(&self, owner: &SimplifiedType, field: &SimplifiedField) -> Result<(), DoccacheError> {
        match field.target() {
            Some(t) if t != owner.name && !self.contains(t) => {
                Err(DoccacheError::TypeNotFound(t.to_string()))
            }
            _ => Ok(()),
        }
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Merge a type into the schema.
    ///
    /// - absent: installed as-is, `Created`
    /// - present: new fields added (must be nullable), existing fields merged
    ///   by the compatibility rules, interfaces unioned; `Updated` when
    ///   anything changed, else `None`
    /// - a stub replaced by a real type: merged as if created, so new fields
    ///   may be non-null and existing ones may be promoted to ids
    pub fn update_type(&mut self, new: SimplifiedType) -> Result<UpdateOp, DoccacheError> {
        for iname in &new.interfaces {
            if !self.interfaces.contains_key(iname) {
                return Err(DoccacheError::TypeNotFound(iname.clone()));
            }
        }
        for f in new.fields.values() {
            self.check_target(&new, f)?;
        }

        let Some(old) = self.types.get(&new.name) else {
            let name = new.name.clone();
            self.types.insert(name.clone(), new);
            self.reconcile_interfaces(&name);
            self.rendered = None;
            return Ok(UpdateOp::Created);
        };

        let creating = old.stub && !new.stub;
        let mut to_add = Vec::new();
        let mut to_update = Vec::new();
        for f in new.fields.values() {
            match old.field(&f.name) {
                None => {
                    if f.non_null && !creating {
                        return Err(DoccacheError::NonNullAddition {
                            type_name: new.name.clone(),
                            field: f.name.clone(),
                        });
                    }
                    to_add.push(f.clone());
                }
                Some(o) => {
                    if let Some(merged) = self.merge_field(&new.name, o, f, creating)? {
                        to_update.push(merged);
                    }
                }
            }
        }
        let new_interfaces: Vec<String> = new
            .interfaces
            .iter()
            .filter(|i| !old.implements(i))
            .cloned()
            .collect();

        if !creating && to_add.is_empty() && to_update.is_empty() && new_interfaces.is_empty() {
            return Ok(UpdateOp::None);
        }

        if let Some(ty) = self.types.get_mut(&new.name) {
            ty.stub = false;
            for f in to_add.into_iter().chain(to_update) {
                ty.insert(f);
            }
            for i in &new_interfaces {
                ty.attach_interface(i);
            }
        }
        self.reconcile_interfaces(&new.name);
        self.rendered = None;
        Ok(UpdateOp::Updated)
    }

    /// Add or generalize a list edge. Returns whether the schema changed.
    pub fn add_edge(
        &mut self,
        type_name: &str,
        edge_name: &str,
        target: &str,
    ) -> Result<bool, DoccacheError> {
        let ty = self
            .types
            .get(type_name)
            .ok_or_else(|| DoccacheError::TypeNotFound(type_name.to_string()))?;
        if !self.contains(target) {
            return Err(DoccacheError::TypeNotFound(target.to_string()));
        }

        let Some(existing) = ty.field(edge_name) else {
            if let Some(ty) = self.types.get_mut(type_name) {
                ty.insert(SimplifiedField::edge(edge_name, target));
            }
            self.rendered = None;
            return Ok(true);
        };

        let Some(old_target) = existing.target().filter(|_| existing.is_array) else {
            return Err(DoccacheError::incompatible(type_name, edge_name, "not a list edge"));
        };
        if self.is_assignable(target, old_target) {
            return Ok(false);
        }
        if old_target == DOCUMENT_INTERFACE || !self.implements_document(old_target) || !self.implements_document(target) {
            return Err(DoccacheError::IncompatibleEdgeTarget {
                type_name: type_name.to_string(),
                field: edge_name.to_string(),
                existing: old_target.to_string(),
                requested: target.to_string(),
            });
        }

        if let Some(ty) = self.types.get_mut(type_name) {
            if let Some(f) = ty.fields.get_mut(edge_name) {
                f.field_type = FieldType::Object(DOCUMENT_INTERFACE.to_string());
            }
        }
        self.reconcile_interfaces(type_name);
        self.rendered = None;
        Ok(true)
    }

    /// Add a field to an existing type unless it already exists.
    pub fn add_field_if_not_exists(
        &mut self,
        type_name: &str,
        field: SimplifiedField,
    ) -> Result<bool, DoccacheError> {
        let ty = self
            .types
            .get(type_name)
            .ok_or_else(|| DoccacheError::TypeNotFound(type_name.to_string()))?;
        if ty.has_field(&field.name) {
            return Ok(false);
        }
        if field.non_null {
            return Err(DoccacheError::NonNullAddition {
                type_name: type_name.to_string(),
                field: field.name.clone(),
            });
        }
        self.check_target(ty, &field)?;
        if let Some(ty) = self.types.get_mut(type_name) {
            ty.insert(field);
        }
        self.rendered = None;
        Ok(true)
    }

    /// Install or extend an interface (add-only).
    ///
    /// Fields are added or merged, signature fields and applicable types are
    /// unioned, and fields new to an existing interface are added to every
    /// type already implementing it. A new non-null field is refused when an
    /// implementer other than a stub would gain it. Returns whether the SDL
    /// changed.
    pub fn add_interface(&mut self, iface: SimplifiedInterface) -> Result<bool, DoccacheError> {
        iface.validate()?;
        for f in iface.fields.values() {
            if let Some(t) = f.target() {
                if t != iface.name && !self.contains(t) {
                    return Err(DoccacheError::TypeNotFound(t.to_string()));
                }
            }
        }

        let Some(old) = self.interfaces.get(&iface.name) else {
            self.interfaces.insert(iface.name.clone(), iface);
            self.rendered = None;
            return Ok(true);
        };

        let mut changed_fields = Vec::new();
        for f in iface.fields.values() {
            match old.fields.get(&f.name) {
                None => changed_fields.push(f.clone()),
                Some(o) => {
                    if let Some(merged) = self.merge_field(&iface.name, o, f, false)? {
                        changed_fields.push(merged);
                    }
                }
            }
        }

        let name = iface.name.clone();
        for ty in self.types.values().filter(|t| t.implements(&name) && !t.stub) {
            if let Some(f) = changed_fields.iter().find(|f| f.non_null && !ty.has_field(&f.name)) {
                return Err(DoccacheError::NonNullAddition {
                    type_name: ty.name.clone(),
                    field: f.name.clone(),
                });
            }
        }
        if let Some(existing) = self.interfaces.get_mut(&name) {
            existing.signature_fields.extend(iface.signature_fields);
            existing.applicable_types.extend(iface.applicable_types);
            for f in &changed_fields {
                existing.insert(f.clone());
            }
        }
        if changed_fields.is_empty() {
            return Ok(false);
        }
        for ty in self.types.values_mut().filter(|t| t.implements(&name)) {
            for f in &changed_fields {
                ty.add_field_if_not_exists(f.clone());
            }
        }
        self.rendered = None;
        Ok(true)
    }

    /// Generalize interface edges that a generalized type edge no longer fits.
    ///
    /// When a type's edge targets `Document` but an implemented interface
    /// declares the same field with a concrete target, the interface field
    /// and the same field on every other implementer move to `Document`.
    fn reconcile_interfaces(&mut self, type_name: &str) {
        let Some(ty) = self.types.get(type_name) else {
            return;
        };
        let mut generalize: Vec<(String, String)> = Vec::new();
        for iname in &ty.interfaces {
            let Some(iface) = self.interfaces.get(iname) else {
                continue;
            };
            for (fname, ifield) in &iface.fields {
                let type_target = ty.field(fname).and_then(SimplifiedField::target);
                let iface_target = ifield.target();
                if type_target == Some(DOCUMENT_INTERFACE)
                    && iface_target.is_some_and(|t| t != DOCUMENT_INTERFACE)
                {
                    generalize.push((iname.clone(), fname.clone()));
                }
            }
        }

        for (iname, fname) in generalize {
            let document = FieldType::Object(DOCUMENT_INTERFACE.to_string());
            if let Some(f) = self.interfaces.get_mut(&iname).and_then(|i| i.fields.get_mut(&fname)) {
                f.field_type = document.clone();
            }
            for t in self.types.values_mut().filter(|t| t.implements(&iname)) {
                if let Some(f) = t.fields.get_mut(&fname).filter(|f| f.is_object()) {
                    f.field_type = document.clone();
                }
            }
        }
    }

    // =========================================================================
    // RENDERING
    // =========================================================================

    /// The SDL text of the schema, rendered on first use after a mutation.
    pub fn sdl(&mut self) -> &str {
        let text = self.rendered.take().unwrap_or_else(|| sdl::render(self));
        self.rendered.insert(text)
    }

    /// Render the SDL text without touching the cache.
    #[must_use]
    pub fn render(&self) -> String {
        self.rendered.clone().unwrap_or_else(|| sdl::render(self))
    }
}

// =============================================================================
// TESTS
// =============================================================================
