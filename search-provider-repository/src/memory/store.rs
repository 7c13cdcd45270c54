//! In-memory [`SearchStore`].
//!
//! Keeps indices, aliases and documents in process and answers the subset
//! of the query language the provider emits: match-all with sorting and
//! paging, terms and range-filter aggregations, and completion prefixes.
//! Used for local runs and tests.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::StoreError;
use crate::interfaces::SearchStore;
use crate::schema::{PropertySet, COMPLETION_SUB_FIELD, RAW_SUB_FIELD};
use crate::types::{AliasAction, BulkItem, BulkOperation, BulkResponse};

const DEFAULT_SEARCH_SIZE: usize = 10;
const DEFAULT_TERMS_SIZE: usize = 10;

#[derive(Debug, Default, Clone)]
struct MemoryIndex {
    mapping: PropertySet,
    documents: BTreeMap<String, Value>,
}

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, MemoryIndex>,
    aliases: HashMap<String, Vec<String>>,
    put_mapping_calls: Vec<PropertySet>,
}

impl State {
    /// Concrete indices behind an index or alias name.
    fn resolve(&self, name: &str) -> Vec<String> {
        if self.indices.contains_key(name) {
            return vec![name.to_string()];
        }
        self.aliases.get(name).cloned().unwrap_or_default()
    }

    fn resolve_existing(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let indices = self.resolve(name);
        if indices.is_empty() {
            return Err(StoreError::not_found(name));
        }
        Ok(indices)
    }

    fn add_alias(&mut self, index: &str, alias: &str) -> Result<(), StoreError> {
        if !self.indices.contains_key(index) {
            return Err(StoreError::not_found(index));
        }
        let indices = self.aliases.entry(alias.to_string()).or_default();
        if !indices.iter().any(|existing| existing == index) {
            indices.push(index.to_string());
        }
        Ok(())
    }

    fn remove_alias(&mut self, index: &str, alias: &str) -> Result<(), StoreError> {
        let indices = self
            .aliases
            .get_mut(alias)
            .filter(|indices| indices.iter().any(|existing| existing == index))
            .ok_or_else(|| StoreError::not_found(format!("alias [{}] on [{}]", alias, index)))?;
        indices.retain(|existing| existing != index);
        if indices.is_empty() {
            self.aliases.remove(alias);
        }
        Ok(())
    }
}

/// A [`SearchStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every property set submitted through
    /// [`put_mapping`](SearchStore::put_mapping), in call order.
    pub fn put_mapping_calls(&self) -> Vec<PropertySet> {
        self.state().put_mapping_calls.clone()
    }

    /// Source of document `id` in the index or alias `name`.
    pub fn document(&self, name: &str, id: &str) -> Option<Value> {
        let state = self.state();
        state
            .resolve(name)
            .iter()
            .filter_map(|index| state.indices.get(index))
            .find_map(|index| index.documents.get(id).cloned())
    }

    /// Number of documents in the index or alias `name`.
    pub fn document_count(&self, name: &str) -> usize {
        let state = self.state();
        state
            .resolve(name)
            .iter()
            .filter_map(|index| state.indices.get(index))
            .map(|index| index.documents.len())
            .sum()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SearchStore for MemoryStore {
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        Ok(!self.state().resolve(index).is_empty())
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<(), StoreError> {
        let mut state = self.state();
        if !state.resolve(index).is_empty() {
            return Err(StoreError::invalid_response(
                400,
                format!("resource_already_exists_exception: index [{}]", index),
            ));
        }

        let mapping = match body.get("mappings") {
            Some(mappings) => PropertySet::from_mapping(mappings)?,
            None => PropertySet::new(),
        };
        state.indices.insert(
            index.to_string(),
            MemoryIndex {
                mapping,
                documents: BTreeMap::new(),
            },
        );

        if let Some(aliases) = body.get("aliases").and_then(Value::as_object) {
            for alias in aliases.keys() {
                state.add_alias(index, alias)?;
            }
        }

        debug!(index = %index, "Created in-memory index");
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> Result<Option<PropertySet>, StoreError> {
        let state = self.state();
        let mut merged = PropertySet::new();
        for name in state.resolve_existing(index)? {
            if let Some(index) = state.indices.get(&name) {
                merged.merge_missing(&index.mapping);
            }
        }
        Ok(Some(merged))
    }

    async fn put_mapping(&self, index: &str, properties: &PropertySet) -> Result<(), StoreError> {
        let mut state = self.state();
        let targets = state.resolve_existing(index)?;
        for name in targets {
            if let Some(index) = state.indices.get_mut(&name) {
                index.mapping.merge_missing(properties);
            }
        }
        state.put_mapping_calls.push(properties.clone());
        Ok(())
    }

    async fn get_alias_indices(&self, alias: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.state().aliases.get(alias).cloned().unwrap_or_default())
    }

    async fn put_alias(&self, index: &str, alias: &str) -> Result<(), StoreError> {
        self.state().add_alias(index, alias)
    }

    async fn update_aliases(&self, actions: Vec<AliasAction>) -> Result<(), StoreError> {
        let mut state = self.state();
        let snapshot = state.aliases.clone();

        for action in &actions {
            let applied = match action {
                AliasAction::Add { index, alias } => state.add_alias(index, alias),
                AliasAction::Remove { index, alias } => state.remove_alias(index, alias),
            };
            if let Err(e) = applied {
                state.aliases = snapshot;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn delete_index(&self, indices: &[String]) -> Result<(), StoreError> {
        let mut state = self.state();
        if let Some(missing) = indices.iter().find(|index| !state.indices.contains_key(*index)) {
            return Err(StoreError::not_found(missing.as_str()));
        }

        for index in indices {
            state.indices.remove(index);
        }
        state.aliases.retain(|_, targets| {
            targets.retain(|target| !indices.contains(target));
            !targets.is_empty()
        });
        Ok(())
    }

    async fn bulk(
        &self,
        index: &str,
        operations: Vec<BulkOperation>,
    ) -> Result<BulkResponse, StoreError> {
        let mut state = self.state();
        let mut targets = state.resolve(index);
        if targets.is_empty() {
            state.indices.insert(index.to_string(), MemoryIndex::default());
            targets.push(index.to_string());
        }

        let write_index = match targets.as_slice() {
            [single] => single.clone(),
            _ => {
                let reason = format!("no write index is defined for alias [{}]", index);
                let items = operations
                    .iter()
                    .map(|operation| BulkItem::failed(operation.id(), reason.clone()))
                    .collect();
                return Ok(BulkResponse { items });
            }
        };
        let documents = &mut state
            .indices
            .get_mut(&write_index)
            .ok_or_else(|| StoreError::not_found(write_index.as_str()))?
            .documents;

        let items = operations
            .into_iter()
            .map(|operation| match operation {
                BulkOperation::Index { id, source } => {
                    documents.insert(id.clone(), source);
                    BulkItem::succeeded(id)
                }
                BulkOperation::Update { id, doc } => match documents.get_mut(&id) {
                    Some(existing) => {
                        merge_object(existing, doc);
                        BulkItem::succeeded(id)
                    }
                    None => {
                        let reason = format!("[{}]: document missing", id);
                        BulkItem::failed(id, reason)
                    }
                },
                BulkOperation::Delete { id } => {
                    documents.remove(&id);
                    BulkItem::succeeded(id)
                }
            })
            .collect();

        Ok(BulkResponse { items })
    }

    async fn refresh(&self, index: &str) -> Result<(), StoreError> {
        self.state().resolve_existing(index).map(|_| ())
    }

    async fn search(&self, indices: &[String], body: Value) -> Result<Value, StoreError> {
        let state = self.state();

        let mut hits = Vec::new();
        for name in indices {
            for index in state.resolve_existing(name)? {
                if let Some(stored) = state.indices.get(&index) {
                    hits.extend(stored.documents.iter().map(|(id, source)| Hit {
                        index: index.clone(),
                        id: id.clone(),
                        source,
                    }));
                }
            }
        }

        if let Some(sort) = body.get("sort").and_then(Value::as_array) {
            let clauses: Vec<(String, bool)> = sort.iter().filter_map(sort_clause).collect();
            hits.sort_by(|a, b| compare_hits(a, b, &clauses));
        }

        let sources: Vec<&Value> = hits.iter().map(|hit| hit.source).collect();
        let mut response = json!({
            "hits": { "total": { "value": hits.len(), "relation": "eq" } }
        });

        let from = usize_field(&body, "from").unwrap_or(0);
        let size = usize_field(&body, "size").unwrap_or(DEFAULT_SEARCH_SIZE);
        response["hits"]["hits"] = hits
            .iter()
            .skip(from)
            .take(size)
            .map(|hit| json!({ "_index": hit.index, "_id": hit.id, "_source": hit.source }))
            .collect();

        if let Some(aggs) = body.get("aggs").and_then(Value::as_object) {
            let aggregations: Map<String, Value> = aggs
                .iter()
                .map(|(name, definition)| (name.clone(), aggregate(definition, &sources)))
                .collect();
            response["aggregations"] = Value::Object(aggregations);
        }

        if let Some(suggest) = body.get("suggest").and_then(Value::as_object) {
            let suggestions: Map<String, Value> = suggest
                .iter()
                .map(|(name, definition)| (name.clone(), complete(definition, &sources)))
                .collect();
            response["suggest"] = Value::Object(suggestions);
        }

        Ok(response)
    }

    async fn ping(&self, _timeout: Duration) -> Result<bool, StoreError> {
        Ok(true)
    }
}

struct Hit<'a> {
    index: String,
    id: String,
    source: &'a Value,
}

fn merge_object(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => target.extend(patch),
        (target, patch) => *target = patch,
    }
}

fn usize_field(body: &Value, name: &str) -> Option<usize> {
    body.get(name)
        .and_then(Value::as_u64)
        .and_then(|value| usize::try_from(value).ok())
}

/// `(field, descending)` of one sort clause.
fn sort_clause(clause: &Value) -> Option<(String, bool)> {
    let (field, options) = clause.as_object()?.iter().next()?;
    let descending = options.get("order").and_then(Value::as_str) == Some("desc");
    Some((field.clone(), descending))
}

fn compare_hits(a: &Hit<'_>, b: &Hit<'_>, clauses: &[(String, bool)]) -> Ordering {
    for (field, descending) in clauses {
        let ordering = match (a.source.get(field), b.source.get(field)) {
            (Some(x), Some(y)) => {
                let ordering = compare_values(x, y);
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
            // Documents without the field sort last in either direction.
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_text(a).cmp(&value_text(b)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Values of `field` in `source`, with arrays flattened.
fn field_values<'a>(source: &'a Value, field: &str) -> Vec<&'a Value> {
    match source.get(field) {
        Some(Value::Array(values)) => values.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(value) => vec![value],
    }
}

fn base_field<'a>(field: &'a str, sub_field: &str) -> &'a str {
    field
        .strip_suffix(sub_field)
        .and_then(|field| field.strip_suffix('.'))
        .unwrap_or(field)
}

fn aggregate(definition: &Value, sources: &[&Value]) -> Value {
    if let Some(terms) = definition.get("terms") {
        return terms_aggregate(terms, sources);
    }
    if let Some(filter) = definition.get("filter") {
        let count = sources
            .iter()
            .filter(|source| matches_filter(filter, source))
            .count();
        return json!({ "doc_count": count });
    }
    json!({})
}

fn terms_aggregate(terms: &Value, sources: &[&Value]) -> Value {
    let field = terms.get("field").and_then(Value::as_str).unwrap_or_default();
    let field = base_field(field, RAW_SUB_FIELD);
    let size = usize_field(terms, "size").unwrap_or(DEFAULT_TERMS_SIZE);

    let mut counts: BTreeMap<String, (Value, u64)> = BTreeMap::new();
    for source in sources {
        for value in field_values(source, field) {
            counts
                .entry(value_text(value))
                .or_insert_with(|| (value.clone(), 0))
                .1 += 1;
        }
    }

    let mut buckets: Vec<(Value, u64)> = counts.into_values().collect();
    buckets.sort_by(|a, b| b.1.cmp(&a.1));

    let buckets: Vec<Value> = buckets
        .into_iter()
        .take(size)
        .map(|(key, count)| json!({ "key": key, "doc_count": count }))
        .collect();
    json!({ "buckets": buckets })
}

fn matches_filter(filter: &Value, source: &Value) -> bool {
    let Some((field, bounds)) = filter
        .get("range")
        .and_then(Value::as_object)
        .and_then(|range| range.iter().next())
    else {
        return true;
    };

    field_values(source, field).into_iter().any(|value| {
        bounds.as_object().into_iter().flatten().all(|(op, bound)| {
            let ordering = compare_bound(value, bound);
            match op.as_str() {
                "gt" => ordering == Ordering::Greater,
                "gte" => ordering != Ordering::Less,
                "lt" => ordering == Ordering::Less,
                "lte" => ordering != Ordering::Greater,
                _ => true,
            }
        })
    })
}

fn compare_bound(value: &Value, bound: &Value) -> Ordering {
    let number = |v: &Value| v.as_f64().or_else(|| v.as_str()?.parse::<f64>().ok());
    match (number(value), number(bound)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_text(value).cmp(&value_text(bound)),
    }
}

fn complete(definition: &Value, sources: &[&Value]) -> Value {
    let prefix = definition
        .get("prefix")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let completion = definition.get("completion").unwrap_or(&Value::Null);
    let field = completion
        .get("field")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let field = base_field(field, COMPLETION_SUB_FIELD);
    let size = usize_field(completion, "size").unwrap_or(DEFAULT_SEARCH_SIZE);

    let lowered = prefix.to_lowercase();
    let mut texts: Vec<String> = sources
        .iter()
        .flat_map(|source| field_values(source, field))
        .filter_map(Value::as_str)
        .filter(|text| text.to_lowercase().starts_with(&lowered))
        .map(str::to_string)
        .collect();
    texts.sort();
    texts.dedup();

    let options: Vec<Value> = texts
        .into_iter()
        .take(size)
        .map(|text| json!({ "text": text }))
        .collect();
    json!([{ "text": prefix, "options": options }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Property;

    #[tokio::test]
    async fn test_alias_update_is_atomic() {
        let store = MemoryStore::new();
        store
            .create_index("a", json!({ "aliases": { "live": {} } }))
            .await
            .unwrap();

        let result = store
            .update_aliases(vec![
                AliasAction::remove("a", "live"),
                AliasAction::remove("b", "staging"),
            ])
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(store.get_alias_indices("live").await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_bulk_through_alias_with_two_indices_fails_items() {
        let store = MemoryStore::new();
        store.create_index("a", json!({ "aliases": { "live": {} } })).await.unwrap();
        store.create_index("b", json!({ "aliases": { "live": {} } })).await.unwrap();

        let response = store
            .bulk(
                "live",
                vec![BulkOperation::Index {
                    id: "1".to_string(),
                    source: json!({}),
                }],
            )
            .await
            .unwrap();

        assert!(!response.items[0].succeeded);
    }

    #[tokio::test]
    async fn test_search_sorts_pages_and_aggregates() {
        let store = MemoryStore::new();
        store.create_index("a", json!({ "aliases": { "live": {} } })).await.unwrap();
        let operations = [("1", 3, "Red"), ("2", 1, "Red"), ("3", 2, "Black")]
            .into_iter()
            .map(|(id, rank, color)| BulkOperation::Index {
                id: id.to_string(),
                source: json!({ "rank": rank, "color": color }),
            })
            .collect();
        store.bulk("live", operations).await.unwrap();

        let response = store
            .search(
                &["live".to_string()],
                json!({
                    "query": { "match_all": {} },
                    "from": 1,
                    "size": 1,
                    "sort": [ { "rank": { "order": "desc" } } ],
                    "aggs": {
                        "color": { "terms": { "field": "color.raw" } },
                        "rank-low": { "filter": { "range": { "rank": { "lt": "3" } } } }
                    }
                }),
            )
            .await
            .unwrap();

        assert_eq!(response["hits"]["total"]["value"], 3);
        assert_eq!(response["hits"]["hits"][0]["_id"], "3");
        assert_eq!(response["hits"]["hits"][0]["_index"], "a");
        assert_eq!(
            response["aggregations"]["color"]["buckets"][0],
            json!({ "key": "Red", "doc_count": 2 })
        );
        assert_eq!(response["aggregations"]["rank-low"]["doc_count"], 2);
    }

    #[tokio::test]
    async fn test_put_mapping_records_calls() {
        let store = MemoryStore::new();
        store.create_index("a", json!({})).await.unwrap();
        let properties: PropertySet = [("code".to_string(), Property::keyword())]
            .into_iter()
            .collect();

        store.put_mapping("a", &properties).await.unwrap();

        assert_eq!(store.put_mapping_calls(), vec![properties]);
        assert!(store.get_mapping("a").await.unwrap().unwrap().contains("code"));
        assert!(store.put_mapping("missing", &PropertySet::new()).await.is_err());
    }
}
