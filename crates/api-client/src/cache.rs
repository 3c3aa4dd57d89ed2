//! Normalized response cache
//!
//! Every object in a response that carries both `__typename` and `_id` is
//! stored once, under `Type:id`, and replaced in the surrounding result by
//! a `{"__ref": "Type:id"}` pointer. Reading a query result follows those
//! pointers, so refetching one query updates every other cached result that
//! embeds the same entity.
//!
//! Each stored result keeps the field tree it was written with. Reads only
//! expand that tree, so entities referencing each other (follower and
//! following lists) never grow a result beyond the shape the server sent.
//!
//! [`clear`](NormalizedCache::clear) bumps a generation counter. Responses
//! to requests sent before the clear are dropped instead of written.
//!
//! The lock is never held across an await point.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Field holding an entity reference inside normalized results
pub const REF_KEY: &str = "__ref";

/// Selected fields of a result, nested per object level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Shape(BTreeMap<String, Shape>);

impl Shape {
    fn of(value: &Value) -> Self {
        match value {
            Value::Object(object) => Shape(
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), Shape::of(v)))
                    .collect(),
            ),
            Value::Array(items) => items.iter().fold(Shape::default(), |mut acc, item| {
                acc.merge(Shape::of(item));
                acc
            }),
            _ => Shape::default(),
        }
    }

    fn merge(&mut self, other: Shape) {
        for (field, shape) in other.0 {
            self.0.entry(field).or_default().merge(shape);
        }
    }
}

#[derive(Debug)]
struct StoredResult {
    data: Value,
    shape: Shape,
}

#[derive(Debug, Default)]
struct CacheState {
    entities: HashMap<String, Map<String, Value>>,
    results: HashMap<String, StoredResult>,
    generation: u64,
}

/// In-memory normalized cache of query results
#[derive(Debug, Default)]
pub struct NormalizedCache {
    state: RwLock<CacheState>,
}

impl NormalizedCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache identity of an object (`Type:id`), if it has one
    pub fn identify(object: &Map<String, Value>) -> Option<String> {
        let typename = object.get("__typename")?.as_str()?;
        let id = match object.get("_id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(format!("{}:{}", typename, id))
    }

    /// Current generation; incremented by every [`clear`](Self::clear)
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Store the result of a query under `key`, merging its entities
    pub fn write_query(&self, key: &str, data: &Value) {
        let mut state = self.state.write();
        store_result(&mut state, key, data);
    }

    /// Store a query result fetched while the cache was at `generation`
    ///
    /// Nothing is written and `false` is returned when the cache has been
    /// cleared since.
    pub fn write_query_if_current(&self, key: &str, data: &Value, generation: u64) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            tracing::debug!(key, "cache cleared during request, result dropped");
            return false;
        }
        store_result(&mut state, key, data);
        true
    }

    /// Merge the entities in `data` without storing a query result
    ///
    /// Used for mutation payloads.
    pub fn write_entities(&self, data: &Value) {
        let mut state = self.state.write();
        normalize(data, &mut state.entities);
    }

    /// Merge mutation entities fetched while the cache was at `generation`
    pub fn write_entities_if_current(&self, data: &Value, generation: u64) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            tracing::debug!("cache cleared during request, payload dropped");
            return false;
        }
        normalize(data, &mut state.entities);
        true
    }

    /// Read the result stored under `key`
    ///
    /// Returns `None` when the key is unknown or when a referenced entity
    /// is no longer present.
    pub fn read_query(&self, key: &str) -> Option<Value> {
        let state = self.state.read();
        let stored = state.results.get(key)?;
        denormalize(&stored.data, &stored.shape, &state.entities)
    }

    /// Read one entity by its `Type:id` identity
    ///
    /// References inside the entity resolve one level deep, to the scalar
    /// fields of the referenced entity.
    pub fn entity(&self, id: &str) -> Option<Value> {
        let state = self.state.read();
        let entity = state.entities.get(id)?;
        let fields = entity
            .iter()
            .map(|(k, v)| (k.clone(), resolve_shallow(v, &state.entities)))
            .collect();
        Some(Value::Object(fields))
    }

    /// Drop the result stored under `key`, returning whether it existed
    pub fn evict_query(&self, key: &str) -> bool {
        self.state.write().results.remove(key).is_some()
    }

    /// Remove every result and entity
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.results.clear();
        state.entities.clear();
        state.generation += 1;
        tracing::debug!(generation = state.generation, "cache cleared");
    }

    /// Number of stored query results
    pub fn query_count(&self) -> usize {
        self.state.read().results.len()
    }

    /// Number of stored entities
    pub fn entity_count(&self) -> usize {
        self.state.read().entities.len()
    }

    /// Check if the cache holds nothing
    pub fn is_empty(&self) -> bool {
        let state = self.state.read();
        state.results.is_empty() && state.entities.is_empty()
    }
}

fn store_result(state: &mut CacheState, key: &str, data: &Value) {
    let normalized = normalize(data, &mut state.entities);
    state.results.insert(
        key.to_string(),
        StoredResult {
            data: normalized,
            shape: Shape::of(data),
        },
    );
    tracing::debug!(key, entities = state.entities.len(), "cache write");
}

fn reference(id: String) -> Value {
    let mut map = Map::new();
    map.insert(REF_KEY.to_string(), Value::String(id));
    Value::Object(map)
}

fn reference_id(object: &Map<String, Value>) -> Option<&str> {
    if object.len() != 1 {
        return None;
    }
    object.get(REF_KEY)?.as_str()
}

fn contains_reference(value: &Value) -> bool {
    match value {
        Value::Object(object) => reference_id(object).is_some(),
        Value::Array(items) => items.iter().any(contains_reference),
        _ => false,
    }
}

fn normalize(value: &Value, entities: &mut HashMap<String, Map<String, Value>>) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| normalize(v, entities)).collect()),
        Value::Object(object) => {
            let fields: Map<String, Value> = object
                .iter()
                .map(|(k, v)| (k.clone(), normalize(v, entities)))
                .collect();

            match NormalizedCache::identify(object) {
                Some(id) => {
                    // Later writes win field by field
                    let entry = entities.entry(id.clone()).or_default();
                    for (k, v) in fields {
                        entry.insert(k, v);
                    }
                    reference(id)
                }
                None => Value::Object(fields),
            }
        }
        other => other.clone(),
    }
}

/// Expand `value` along `shape`; fields outside the shape are left out
fn denormalize(
    value: &Value,
    shape: &Shape,
    entities: &HashMap<String, Map<String, Value>>,
) -> Option<Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| denormalize(v, shape, entities))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        Value::Object(object) => {
            let source = match reference_id(object) {
                Some(id) => entities.get(id)?,
                None => object,
            };
            let mut out = Map::new();
            for (field, sub) in &shape.0 {
                if let Some(v) = source.get(field) {
                    out.insert(field.clone(), denormalize(v, sub, entities)?);
                }
            }
            Some(Value::Object(out))
        }
        other => Some(other.clone()),
    }
}

fn resolve_shallow(value: &Value, entities: &HashMap<String, Map<String, Value>>) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| resolve_shallow(v, entities)).collect()),
        Value::Object(object) => match reference_id(object).and_then(|id| entities.get(id)) {
            Some(entity) => Value::Object(
                entity
                    .iter()
                    .filter(|(_, v)| !contains_reference(v))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            None => value.clone(),
        },
        other => other.clone(),
    }
}
