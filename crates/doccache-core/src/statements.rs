//! # GraphQL Statements
//!
//! Parameterized requests against the backend's admin and data endpoints,
//! and decoders for their responses.
//!
//! Values always travel as variables, never spliced into the query text.
//! Every instance mutation is paired with the cursor upsert in the same
//! request so both commit or neither does.

use crate::instance::{SimplifiedInstance, Value};
use crate::mutation::Mutation;
use crate::primitives::{CURSOR_ID, CURSOR_TYPE, DOC_ID, DOCUMENT_INTERFACE, MAX_IDS_PER_QUERY};
use crate::schema::SimplifiedType;
use crate::{DoccacheError, DocumentRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json, json};
use std::collections::BTreeMap;

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GqlRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Json::is_null")]
    pub variables: Json,
}

impl GqlRequest {
    fn new(query: impl Into<String>, variables: Json) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

// =============================================================================
// ADMIN
// =============================================================================

/// Fetch the current schema text.
#[must_use]
pub fn get_schema() -> GqlRequest {
    GqlRequest::new("query { getGQLSchema { schema } }", Json::Null)
}

/// Replace the schema.
#[must_use]
pub fn update_schema(sdl: &str) -> GqlRequest {
    GqlRequest::new(
        "mutation($sch: String!) { updateGQLSchema(input: {set: {schema: $sch}}) { gqlSchema { schema } } }",
        json!({ "sch": sdl }),
    )
}

/// Schema text of a `getGQLSchema` or `updateGQLSchema` response; empty when
/// the backend has no schema yet.
pub fn schema_text(data: &Json) -> Result<String, DoccacheError> {
    let holder = data
        .get("getGQLSchema")
        .or_else(|| data.get("updateGQLSchema").and_then(|u| u.get("gqlSchema")))
        .ok_or_else(|| DoccacheError::SchemaSyncFailure(format!("unexpected admin response: {data}")))?;
    Ok(holder
        .get("schema")
        .and_then(Json::as_str)
        .unwrap_or_default()
        .to_string())
}

// =============================================================================
// QUERIES
// =============================================================================

/// Fetch instances of `ty` by `docId`: every non-list field, object fields by
/// `docId`. One request per [`MAX_IDS_PER_QUERY`] ids.
#[must_use]
pub fn query_instances(ty: &SimplifiedType, doc_ids: &[String]) -> Vec<GqlRequest> {
    let selection: Vec<String> = ty
        .fields
        .values()
        .filter(|f| !f.is_array)
        .map(|f| {
            if f.is_object() {
                format!("{} {{ {DOC_ID} }}", f.name)
            } else {
                f.name.clone()
            }
        })
        .collect();
    let query = format!(
        "query($ids: [String!]) {{ query{}(filter: {{{DOC_ID}: {{in: $ids}}}}) {{ {} }} }}",
        ty.name,
        selection.join(" ")
    );
    doc_ids
        .chunks(MAX_IDS_PER_QUERY)
        .map(|ids| GqlRequest::new(query.clone(), json!({ "ids": ids })))
        .collect()
}

/// Decode a [`query_instances`] response, keyed by `docId`.
pub fn instances(ty: &SimplifiedType, data: &Json) -> Result<BTreeMap<String, SimplifiedInstance>, DoccacheError> {
    let rows = list(data, &format!("query{}", ty.name))?;
    let mut out = BTreeMap::new();
    for row in rows {
        let instance = SimplifiedInstance::from_json(ty, row)?;
        if let Some(Value::Str(id)) = instance.get(DOC_ID) {
            out.insert(id.clone(), instance);
        }
    }
    Ok(out)
}

/// Look documents up by hash through the `Document` interface.
#[must_use]
pub fn query_by_hash(hashes: &[String]) -> Vec<GqlRequest> {
    document_query("hash", hashes)
}

/// Look documents up by `docId` through the `Document` interface.
#[must_use]
pub fn query_documents(doc_ids: &[String]) -> Vec<GqlRequest> {
    document_query(DOC_ID, doc_ids)
}

fn document_query(key: &str, values: &[String]) -> Vec<GqlRequest> {
    let query = format!(
        "query($v: [String!]) {{ query{DOCUMENT_INTERFACE}(filter: {{{key}: {{in: $v}}}}) {{ {DOC_ID} hash type }} }}"
    );
    values
        .chunks(MAX_IDS_PER_QUERY)
        .map(|v| GqlRequest::new(query.clone(), json!({ "v": v })))
        .collect()
}

/// A document found by a [`query_by_hash`] or [`query_documents`] lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FoundDocument {
    #[serde(rename = "docId")]
    pub doc_id: String,
    pub hash: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl From<FoundDocument> for DocumentRef {
    fn from(d: FoundDocument) -> Self {
        Self::new(d.doc_id, d.type_name)
    }
}

/// Decode a `Document` lookup response.
pub fn documents(data: &Json) -> Result<Vec<FoundDocument>, DoccacheError> {
    list(data, &format!("query{DOCUMENT_INTERFACE}"))?
        .iter()
        .map(|row| {
            serde_json::from_value(row.clone())
                .map_err(|e| DoccacheError::InstanceStoreFailure(format!("bad document row {row}: {e}")))
        })
        .collect()
}

/// Read the persisted cursor.
#[must_use]
pub fn get_cursor() -> GqlRequest {
    GqlRequest::new(
        format!("query($id: String!) {{ get{CURSOR_TYPE}(id: $id) {{ cursor }} }}"),
        json!({ "id": CURSOR_ID }),
    )
}

/// Decode a [`get_cursor`] response; `None` when the cursor does not exist.
#[must_use]
pub fn cursor(data: &Json) -> Option<String> {
    data.get(format!("get{CURSOR_TYPE}"))
        .and_then(|c| c.get("cursor"))
        .and_then(Json::as_str)
        .map(str::to_string)
}

fn list<'a>(data: &'a Json, key: &str) -> Result<&'a [Json], DoccacheError> {
    match data.get(key) {
        Some(Json::Array(rows)) => Ok(rows),
        Some(Json::Null) | None => Ok(&[]),
        Some(other) => Err(DoccacheError::InstanceStoreFailure(format!(
            "{key} returned a non-list value: {other}"
        ))),
    }
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// The single request that applies `mutation` and upserts the cursor.
#[must_use]
pub fn commit(mutation: &Mutation, cursor: &str) -> GqlRequest {
    let cursor_upsert = format!(
        "add{CURSOR_TYPE}(input: [{{id: \"{CURSOR_ID}\", cursor: $cursor}}], upsert: true) {{ numUids }}"
    );
    let mut vars = Map::new();
    vars.insert("cursor".to_string(), json!(cursor));

    let (params, domain) = match mutation {
        Mutation::Add { instance } => {
            vars.insert("input".to_string(), instance.to_json());
            (
                format!(", $input: Add{}Input!", instance.type_name),
                format!("add{}(input: [$input], upsert: true) {{ numUids }}", instance.type_name),
            )
        }
        Mutation::Update {
            type_name,
            doc_id,
            set,
            remove,
        } => {
            vars.insert("docId".to_string(), json!(doc_id));
            vars.insert("set".to_string(), patch(set));
            vars.insert("remove".to_string(), patch(remove));
            (
                format!(", $docId: String!, $set: {type_name}Patch, $remove: {type_name}Patch"),
                format!(
                    "update{type_name}(input: {{filter: {{{DOC_ID}: {{eq: $docId}}}}, set: $set, remove: $remove}}) {{ numUids }}"
                ),
            )
        }
        Mutation::Delete { type_name, doc_id } => {
            vars.insert("docId".to_string(), json!(doc_id));
            (
                ", $docId: String!".to_string(),
                format!("delete{type_name}(filter: {{{DOC_ID}: {{eq: $docId}}}}) {{ numUids }}"),
            )
        }
        Mutation::CursorOnly => (String::new(), String::new()),
    };

    let body = if domain.is_empty() {
        cursor_upsert
    } else {
        format!("{domain} {cursor_upsert}")
    };
    GqlRequest::new(
        format!("mutation($cursor: String!{params}) {{ {body} }}"),
        Json::Object(vars),
    )
}

fn patch(values: &BTreeMap<String, Value>) -> Json {
    if values.is_empty() {
        return Json::Null;
    }
    Json::Object(values.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentType;
    use crate::schema::SimplifiedField;

    #[test]
    fn add_commits_with_cursor() {
        let mut i = SimplifiedInstance::new("Period");
        i.set(DOC_ID, Value::Str("21".into()));
        let req = commit(&Mutation::Add { instance: i }, "cur-1");
        assert!(req.query.contains("$input: AddPeriodInput!"));
        assert!(req.query.contains("addPeriod(input: [$input], upsert: true)"));
        assert!(req.query.contains("addCursor(input: [{id: \"c1\", cursor: $cursor}], upsert: true)"));
        assert_eq!(req.variables["cursor"], "cur-1");
        assert_eq!(req.variables["input"]["docId"], "21");
    }

    #[test]
    fn update_and_delete_filter_by_doc_id() {
        let req = commit(&Mutation::edge("Dho", "2", "member", "31", false), "c");
        assert!(req.query.contains("updateDho(input: {filter: {docId: {eq: $docId}}, set: $set, remove: $remove})"));
        assert_eq!(req.variables["set"]["member"][0]["docId"], "31");
        assert!(req.variables["remove"].is_null());

        let req = commit(&Mutation::delete("Member", "31"), "c");
        assert!(req.query.contains("deleteMember(filter: {docId: {eq: $docId}})"));
    }

    #[test]
    fn cursor_only_commit() {
        let req = commit(&Mutation::CursorOnly, "c9");
        assert_eq!(
            req.query,
            "mutation($cursor: String!) { addCursor(input: [{id: \"c1\", cursor: $cursor}], upsert: true) { numUids } }"
        );
    }

    #[test]
    fn instance_query_selects_non_list_fields() {
        let mut ty = SimplifiedType::document("Dho");
        ty.insert(SimplifiedField::from_content("details_name_n", ContentType::Name));
        ty.insert(SimplifiedField::core_edge("details_startPeriod_c_edge", "Period"));
        ty.insert(SimplifiedField::edge("member", "Member"));
        let reqs = query_instances(&ty, &["2".to_string()]);
        assert_eq!(reqs.len(), 1);
        let q = &reqs[0].query;
        assert!(q.contains("queryDho(filter: {docId: {in: $ids}})"));
        assert!(q.contains("details_startPeriod_c_edge { docId }"));
        assert!(q.contains("details_name_n"));
        assert!(!q.contains("member"));
    }

    #[test]
    fn lookups_are_chunked() {
        let ids: Vec<String> = (0..MAX_IDS_PER_QUERY + 1).map(|i| i.to_string()).collect();
        assert_eq!(query_documents(&ids).len(), 2);
    }

    #[test]
    fn decodes_responses() {
        let data = json!({"queryDocument": [{"docId": "21", "hash": "h", "type": "Period"}]});
        let docs = documents(&data).expect("docs");
        assert_eq!(docs[0].type_name, "Period");
        assert!(documents(&json!({"queryDocument": null})).expect("empty").is_empty());

        assert_eq!(cursor(&json!({"getCursor": {"cursor": "abc"}})).as_deref(), Some("abc"));
        assert_eq!(cursor(&json!({"getCursor": null})), None);

        assert_eq!(schema_text(&json!({"getGQLSchema": null})).expect("empty"), "");
        assert_eq!(
            schema_text(&json!({"updateGQLSchema": {"gqlSchema": {"schema": "type A"}}})).expect("text"),
            "type A"
        );
    }
}
