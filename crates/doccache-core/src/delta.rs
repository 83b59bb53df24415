//! # Stream Deltas
//!
//! Upstream events and the action each one maps to.
//!
//! Events arrive as newline-delimited JSON:
//!
//! ```json
//! {"kind":"delta","table":"documents","operation":"insert","new_data":{…},"cursor":"c…","block_num":9}
//! {"kind":"heartbeat","cursor":"c…","block_num":10}
//! ```
//!
//! Fork handling is the upstream client's job: deltas are applied in the
//! order received and `fork_step` is only carried for logging.

use crate::content::{ChainDocument, ChainEdge};
use crate::DoccacheError;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

// =============================================================================
// EVENTS
// =============================================================================

/// Row operation of a table delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Insert,
    Update,
    Remove,
}

/// A change to one row of a contract table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDelta {
    pub table: String,
    pub operation: Operation,
    #[serde(default)]
    pub new_data: Option<Json>,
    #[serde(default)]
    pub old_data: Option<Json>,
    pub cursor: String,
    pub block_num: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_step: Option<String>,
}

/// A stream position with no table change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub cursor: String,
    pub block_num: u64,
}

/// One upstream event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StreamEvent {
    Delta(TableDelta),
    Heartbeat(Heartbeat),
}

impl StreamEvent {
    /// Decode one NDJSON line.
    pub fn from_line(line: &str) -> Result<Self, DoccacheError> {
        serde_json::from_str(line).map_err(|e| DoccacheError::InvalidDelta(format!("{e}: {line}")))
    }

    /// Stream position after this event.
    #[must_use]
    pub fn cursor(&self) -> &str {
        match self {
            Self::Delta(d) => &d.cursor,
            Self::Heartbeat(h) => &h.cursor,
        }
    }

    /// Block the event belongs to.
    #[must_use]
    pub const fn block_num(&self) -> u64 {
        match self {
            Self::Delta(d) => d.block_num,
            Self::Heartbeat(h) => h.block_num,
        }
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Names of the contract tables that carry documents and edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub documents: String,
    pub edges: String,
}

/// What applying an event means for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaAction {
    StoreDocument(ChainDocument),
    DeleteDocument(ChainDocument),
    MutateEdge { edge: ChainEdge, is_delete: bool },
    UpdateCursor,
}

impl DeltaAction {
    /// Map an event to its action.
    ///
    /// | delta | action |
    /// |---|---|
    /// | document insert / update | store `new_data` |
    /// | document remove | delete `old_data` |
    /// | edge insert | add edge `new_data` |
    /// | edge remove | remove edge `old_data` |
    /// | edge update | error: edges are immutable |
    /// | heartbeat, other tables | advance the cursor |
    pub fn classify(event: &StreamEvent, tables: &Tables) -> Result<Self, DoccacheError> {
        let StreamEvent::Delta(delta) = event else {
            return Ok(Self::UpdateCursor);
        };

        if delta.table == tables.documents {
            return match delta.operation {
                Operation::Insert | Operation::Update => {
                    Ok(Self::StoreDocument(ChainDocument::from_json(row(delta, true)?)?))
                }
                Operation::Remove => Ok(Self::DeleteDocument(ChainDocument::from_json(row(delta, false)?)?)),
            };
        }

        if delta.table == tables.edges {
            return match delta.operation {
                Operation::Insert => Ok(Self::MutateEdge {
                    edge: ChainEdge::from_json(row(delta, true)?)?,
                    is_delete: false,
                }),
                Operation::Remove => Ok(Self::MutateEdge {
                    edge: ChainEdge::from_json(row(delta, false)?)?,
                    is_delete: true,
                }),
                Operation::Update => Err(DoccacheError::InvalidDelta(format!(
                    "edge rows cannot be updated (block {})",
                    delta.block_num
                ))),
            };
        }

        Ok(Self::UpdateCursor)
    }
}

fn row(delta: &TableDelta, new: bool) -> Result<&Json, DoccacheError> {
    let (data, name) = if new {
        (&delta.new_data, "new_data")
    } else {
        (&delta.old_data, "old_data")
    };
    data.as_ref().filter(|d| !d.is_null()).ok_or_else(|| {
        DoccacheError::InvalidDelta(format!(
            "{:?} on {} without {name} (block {})",
            delta.operation, delta.table, delta.block_num
        ))
    })
}

// =============================================================================
// TESTS
// =============================================================================
