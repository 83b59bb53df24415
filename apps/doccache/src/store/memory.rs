//! In-process backend.
//!
//! Keeps the schema text, instances and cursor behind one mutex so that a
//! commit applies the mutation and the cursor together, like the remote
//! backend's single request.

use super::{InstanceStore, SchemaAdmin};
use async_trait::async_trait;
use doccache_core::primitives::{DOC_ID, HASH};
use doccache_core::{
    DoccacheError, DocumentRef, Mutation, SimplifiedInstance, SimplifiedType, Value,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    schema: String,
    instances: BTreeMap<String, BTreeMap<String, SimplifiedInstance>>,
    cursor: Option<String>,
    pushes: usize,
}

/// Schema admin and instance store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_next_commit: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A stored instance.
    pub async fn instance(&self, type_name: &str, doc_id: &str) -> Option<SimplifiedInstance> {
        let state = self.state.lock().await;
        state.instances.get(type_name)?.get(doc_id).cloned()
    }

    /// Number of stored instances of a type.
    pub async fn count(&self, type_name: &str) -> usize {
        let state = self.state.lock().await;
        state.instances.get(type_name).map_or(0, BTreeMap::len)
    }

    /// The last pushed schema text.
    pub async fn schema_text(&self) -> String {
        self.state.lock().await.schema.clone()
    }

    /// How many times a schema was pushed.
    pub async fn push_count(&self) -> usize {
        self.state.lock().await.pushes
    }

    /// Make the next commit fail without writing anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

fn apply(state: &mut State, mutation: &Mutation) {
    match mutation {
        Mutation::Add { instance } => {
            let Some(Value::Str(doc_id)) = instance.get(DOC_ID) else {
                return;
            };
            let slot = state
                .instances
                .entry(instance.type_name.clone())
                .or_default()
                .entry(doc_id.clone())
                .or_insert_with(|| SimplifiedInstance::new(&instance.type_name));
            for (k, v) in &instance.values {
                slot.set(k.clone(), v.clone());
            }
        }
        Mutation::Update {
            type_name,
            doc_id,
            set,
            remove,
        } => {
            let Some(slot) = state
                .instances
                .get_mut(type_name)
                .and_then(|m| m.get_mut(doc_id))
            else {
                return;
            };
            for (k, v) in set {
                match (slot.values.get_mut(k), v) {
                    (Some(Value::Refs(existing)), Value::Refs(added)) => {
                        for id in added {
                            if !existing.contains(id) {
                                existing.push(id.clone());
                            }
                        }
                    }
                    _ => slot.set(k.clone(), v.clone()),
                }
            }
            for (k, v) in remove {
                match (slot.values.get_mut(k), v) {
                    (Some(Value::Refs(existing)), Value::Refs(removed)) => {
                        existing.retain(|id| !removed.contains(id));
                    }
                    _ => {
                        slot.values.remove(k);
                    }
                }
            }
        }
        Mutation::Delete { type_name, doc_id } => {
            if let Some(m) = state.instances.get_mut(type_name) {
                m.remove(doc_id);
            }
        }
        Mutation::CursorOnly => {}
    }
}

fn document_ref(instance: &SimplifiedInstance) -> Option<DocumentRef> {
    match instance.get(DOC_ID) {
        Some(Value::Str(id)) => Some(DocumentRef::new(id, &instance.type_name)),
        _ => None,
    }
}

#[async_trait]
impl SchemaAdmin for MemoryStore {
    async fn fetch_schema(&self) -> Result<String, DoccacheError> {
        Ok(self.state.lock().await.schema.clone())
    }

    async fn push_schema(&self, sdl: &str) -> Result<(), DoccacheError> {
        let mut state = self.state.lock().await;
        state.schema = sdl.to_string();
        state.pushes += 1;
        Ok(())
    }
}

#[async_trait]
impl InstanceStore for MemoryStore {
    async fn get_instances(
        &self,
        ty: &SimplifiedType,
        doc_ids: &[String],
    ) -> Result<BTreeMap<String, SimplifiedInstance>, DoccacheError> {
        let state = self.state.lock().await;
        let Some(stored) = state.instances.get(&ty.name) else {
            return Ok(BTreeMap::new());
        };
        Ok(doc_ids
            .iter()
            .filter_map(|id| stored.get(id).map(|i| (id.clone(), i)))
            .map(|(id, i)| {
                let mut view = SimplifiedInstance::new(&i.type_name);
                for (k, v) in &i.values {
                    if ty.field(k).is_some_and(|f| !f.is_array) {
                        view.set(k.clone(), v.clone());
                    }
                }
                (id, view)
            })
            .collect())
    }

    async fn find_by_hash(
        &self,
        hashes: &[String],
    ) -> Result<BTreeMap<String, DocumentRef>, DoccacheError> {
        let state = self.state.lock().await;
        let mut out = BTreeMap::new();
        for instance in state.instances.values().flat_map(BTreeMap::values) {
            if let Some(Value::Str(hash)) = instance.get(HASH) {
                if hashes.contains(hash) {
                    if let Some(r) = document_ref(instance) {
                        out.insert(hash.clone(), r);
                    }
                }
            }
        }
        Ok(out)
    }

    async fn find_documents(
        &self,
        doc_ids: &[String],
    ) -> Result<BTreeMap<String, DocumentRef>, DoccacheError> {
        let state = self.state.lock().await;
        Ok(state
            .instances
            .values()
            .flat_map(BTreeMap::values)
            .filter_map(document_ref)
            .filter(|r| doc_ids.contains(&r.doc_id))
            .map(|r| (r.doc_id.clone(), r))
            .collect())
    }

    async fn commit(&self, mutation: &Mutation, cursor: &str) -> Result<(), DoccacheError> {
        let mut state = self.state.lock().await;
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DoccacheError::InstanceStoreFailure("injected failure".to_string()));
        }
        apply(&mut state, mutation);
        state.cursor = Some(cursor.to_string());
        Ok(())
    }

    async fn get_cursor(&self) -> Result<Option<String>, DoccacheError> {
        Ok(self.state.lock().await.cursor.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn instance(doc_id: &str) -> SimplifiedInstance {
        let mut i = SimplifiedInstance::new("Dho");
        i.set(DOC_ID, Value::Str(doc_id.into()));
        i.set(HASH, Value::Str(format!("h{doc_id}")));
        i
    }

    #[tokio::test]
    async fn commit_writes_mutation_and_cursor() {
        let store = MemoryStore::new();
        let add = Mutation::Add { instance: instance("1") };
        store.commit(&add, "c-1").await.unwrap();

        assert_eq!(store.get_cursor().await.unwrap().as_deref(), Some("c-1"));
        let found = store.find_by_hash(&["h1".to_string()]).await.unwrap();
        assert_eq!(found["h1"], DocumentRef::new("1", "Dho"));
    }

    #[tokio::test]
    async fn failed_commit_writes_nothing() {
        let store = MemoryStore::new();
        store.commit(&Mutation::CursorOnly, "c-1").await.unwrap();
        store.fail_next_commit();
        let add = Mutation::Add { instance: instance("1") };
        assert!(store.commit(&add, "c-2").await.is_err());

        assert_eq!(store.get_cursor().await.unwrap().as_deref(), Some("c-1"));
        assert_eq!(store.count("Dho").await, 0);
    }

    #[tokio::test]
    async fn edge_updates_append_and_remove_ids() {
        let store = MemoryStore::new();
        store
            .commit(&Mutation::Add { instance: instance("1") }, "c")
            .await
            .unwrap();
        for to in ["2", "3", "2"] {
            let m = Mutation::edge("Dho", "1", "member", to, false);
            store.commit(&m, "c").await.unwrap();
        }
        let m = Mutation::edge("Dho", "1", "member", "2", true);
        store.commit(&m, "c").await.unwrap();

        let stored = store.instance("Dho", "1").await.unwrap();
        assert_eq!(stored.get("member"), Some(&Value::Refs(vec!["3".into()])));
    }
}
