//! Request and response types for store operations.

use serde_json::{json, Value};

/// One operation of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Create or replace the whole document.
    Index { id: String, source: Value },
    /// Merge `doc` into the existing document.
    Update { id: String, doc: Value },
    Delete { id: String },
}

impl BulkOperation {
    pub fn id(&self) -> &str {
        match self {
            Self::Index { id, .. } | Self::Update { id, .. } | Self::Delete { id } => id,
        }
    }

    /// Name of the bulk action, as the store reports it per item.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Index { .. } => "index",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// Newline-delimited bulk lines: the action line and, except for
    /// deletes, the payload line.
    pub fn to_lines(&self) -> Vec<Value> {
        let header = json!({ (self.action()): { "_id": self.id() } });
        match self {
            Self::Index { source, .. } => vec![header, source.clone()],
            Self::Update { doc, .. } => vec![header, json!({ "doc": doc })],
            Self::Delete { .. } => vec![header],
        }
    }
}

/// Outcome of a single bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItem {
    pub id: String,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl BulkItem {
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            succeeded: true,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            succeeded: false,
            error: Some(error.into()),
        }
    }
}

/// Per-item outcome of a bulk request, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkResponse {
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    /// Parse the body of a bulk response.
    ///
    /// Each item is keyed by its action; a `status` of 300 or above, or an
    /// `error` object, marks the item as failed. Deleting a missing document
    /// is not a failure.
    pub fn from_body(body: &Value) -> Self {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Self::parse_item).collect())
            .unwrap_or_default();

        Self { items }
    }

    fn parse_item(item: &Value) -> Option<BulkItem> {
        let (action, result) = item.as_object()?.iter().next()?;
        let id = result.get("_id").and_then(Value::as_str).unwrap_or_default();
        let status = result.get("status").and_then(Value::as_u64).unwrap_or(200);

        match result.get("error") {
            Some(error) => Some(BulkItem::failed(id, Self::error_reason(error))),
            None if action == "delete" && status == 404 => Some(BulkItem::succeeded(id)),
            None if status >= 300 => Some(BulkItem::failed(id, format!("status {}", status))),
            None => Some(BulkItem::succeeded(id)),
        }
    }

    fn error_reason(error: &Value) -> String {
        match error {
            Value::String(reason) => reason.clone(),
            other => other
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        }
    }
}

/// One step of an atomic alias update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasAction {
    Add { index: String, alias: String },
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn add(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Add {
            index: index.into(),
            alias: alias.into(),
        }
    }

    pub fn remove(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Remove {
            index: index.into(),
            alias: alias.into(),
        }
    }

    /// Entry of the `actions` array of an update-aliases request.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Add { index, alias } => json!({ "add": { "index": index, "alias": alias } }),
            Self::Remove { index, alias } => {
                json!({ "remove": { "index": index, "alias": alias } })
            }
        }
    }
}
