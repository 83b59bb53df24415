//! Dgraph GraphQL backend.

use super::{InstanceStore, SchemaAdmin};
use crate::client::{ClientError, GraphqlClient};
use async_trait::async_trait;
use doccache_core::statements::{self, FoundDocument};
use doccache_core::{
    DoccacheError, DocumentRef, GqlRequest, Mutation, SimplifiedInstance, SimplifiedType,
};
use std::collections::BTreeMap;

/// Schema admin and instance store over a Dgraph alpha's HTTP endpoints.
#[derive(Clone)]
pub struct DgraphStore {
    admin: GraphqlClient,
    data: GraphqlClient,
}

impl DgraphStore {
    /// Create a store from the admin and data endpoint URLs.
    #[must_use]
    pub fn new(admin_url: String, data_url: String) -> Self {
        Self {
            admin: GraphqlClient::new(admin_url),
            data: GraphqlClient::new(data_url),
        }
    }

    async fn query(&self, req: &GqlRequest) -> Result<serde_json::Value, DoccacheError> {
        self.data
            .execute(req)
            .await
            .map_err(|e| DoccacheError::InstanceStoreFailure(e.to_string()))
    }

    async fn lookup(
        &self,
        requests: Vec<GqlRequest>,
    ) -> Result<Vec<FoundDocument>, DoccacheError> {
        let mut found = Vec::new();
        for req in &requests {
            found.extend(statements::documents(&self.query(req).await?)?);
        }
        Ok(found)
    }
}

#[async_trait]
impl SchemaAdmin for DgraphStore {
    async fn fetch_schema(&self) -> Result<String, DoccacheError> {
        let data = self
            .admin
            .execute(&statements::get_schema())
            .await
            .map_err(|e| DoccacheError::SchemaSyncFailure(format!("{}: {e}", self.admin.url())))?;
        statements::schema_text(&data)
    }

    async fn push_schema(&self, sdl: &str) -> Result<(), DoccacheError> {
        match self.admin.execute(&statements::update_schema(sdl)).await {
            Ok(_) => Ok(()),
            Err(ClientError::Graphql(msg)) => Err(DoccacheError::SchemaIncompatible(msg)),
            Err(e) => Err(DoccacheError::SchemaSyncFailure(e.to_string())),
        }
    }
}

#[async_trait]
impl InstanceStore for DgraphStore {
    async fn get_instances(
        &self,
        ty: &SimplifiedType,
        doc_ids: &[String],
    ) -> Result<BTreeMap<String, SimplifiedInstance>, DoccacheError> {
        let mut out = BTreeMap::new();
        for req in statements::query_instances(ty, doc_ids) {
            out.extend(statements::instances(ty, &self.query(&req).await?)?);
        }
        Ok(out)
    }

    async fn find_by_hash(
        &self,
        hashes: &[String],
    ) -> Result<BTreeMap<String, DocumentRef>, DoccacheError> {
        let found = self.lookup(statements::query_by_hash(hashes)).await?;
        Ok(found.into_iter().map(|d| (d.hash.clone(), d.into())).collect())
    }

    async fn find_documents(
        &self,
        doc_ids: &[String],
    ) -> Result<BTreeMap<String, DocumentRef>, DoccacheError> {
        let found = self.lookup(statements::query_documents(doc_ids)).await?;
        Ok(found.into_iter().map(|d| (d.doc_id.clone(), d.into())).collect())
    }

    async fn commit(&self, mutation: &Mutation, cursor: &str) -> Result<(), DoccacheError> {
        self.query(&statements::commit(mutation, cursor)).await.map(|_| ())
    }

    async fn get_cursor(&self) -> Result<Option<String>, DoccacheError> {
        Ok(statements::cursor(&self.query(&statements::get_cursor()).await?))
    }
}
