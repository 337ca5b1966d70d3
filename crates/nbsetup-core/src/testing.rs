// In-memory NetBox for engine tests.
//
// Records live per collection with sequential ids. Lookups understand the
// filter shapes the engine sends: plain fields, `<ref>_id` against a nested
// reference or a bare id, a nested reference matched by id/name/slug, and
// `null` for "unset".
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::future::{Future, ready};
use std::sync::Mutex;

use nbsetup_api::{Collection, Error as ApiError, FieldErrors, Filter, Record, ValidationErrors};
use serde_json::Value;

use crate::model::value_label;
use crate::remote::Remote;

struct Rejection {
    collection: String,
    field: String,
    value: String,
    errors: FieldErrors,
}

#[derive(Default)]
struct State {
    records: HashMap<String, Vec<Record>>,
    next_id: HashMap<String, u64>,
    rejections: Vec<Rejection>,
    lookup_failures: HashMap<String, u16>,
    create_failures: HashMap<String, u16>,
    lookup_calls: HashMap<String, usize>,
    create_calls: HashMap<String, usize>,
    created: HashMap<String, usize>,
    deleted: HashMap<String, Vec<u64>>,
    last_filter: HashMap<String, String>,
    calls: usize,
}

impl State {
    fn insert(&mut self, collection: &str, fields: Value) -> u64 {
        let next = self.next_id.entry(collection.to_owned()).or_insert(0);
        *next += 1;
        let id = *next;
        let fields = match fields {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        self.records
            .entry(collection.to_owned())
            .or_default()
            .push(Record { id, fields });
        id
    }
}

#[derive(Default)]
pub(crate) struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a pre-existing record; returns its id.
    pub(crate) fn seed(&self, collection: &Collection, fields: Value) -> u64 {
        self.state.lock().unwrap().insert(collection.path(), fields)
    }

    /// Reject any bulk create on `collection` that contains a body whose
    /// `field` equals `value`, with `errors` as that body's entry.
    pub(crate) fn reject_when(&self, collection: &Collection, field: &str, value: &str, errors: FieldErrors) {
        self.state.lock().unwrap().rejections.push(Rejection {
            collection: collection.path().to_owned(),
            field: field.to_owned(),
            value: value.to_owned(),
            errors,
        });
    }

    pub(crate) fn fail_lookups(&self, collection: &Collection, status: u16) {
        self.state
            .lock()
            .unwrap()
            .lookup_failures
            .insert(collection.path().to_owned(), status);
    }

    pub(crate) fn fail_creates(&self, collection: &Collection, status: u16) {
        self.state
            .lock()
            .unwrap()
            .create_failures
            .insert(collection.path().to_owned(), status);
    }

    pub(crate) fn records(&self, collection: &Collection) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(collection.path())
            .cloned()
            .unwrap_or_default()
    }

    /// Records created through `bulk_create` (seeds excluded).
    pub(crate) fn created_count(&self, collection: &Collection) -> usize {
        count(&self.state.lock().unwrap().created, collection)
    }

    pub(crate) fn create_calls(&self, collection: &Collection) -> usize {
        count(&self.state.lock().unwrap().create_calls, collection)
    }

    pub(crate) fn lookup_calls(&self, collection: &Collection) -> usize {
        count(&self.state.lock().unwrap().lookup_calls, collection)
    }

    pub(crate) fn deleted(&self, collection: &Collection) -> Vec<u64> {
        self.state
            .lock()
            .unwrap()
            .deleted
            .get(collection.path())
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn last_filter(&self, collection: &Collection) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .last_filter
            .get(collection.path())
            .cloned()
    }

    /// Every remote call made so far.
    pub(crate) fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    fn do_lookup(&self, collection: &Collection, filter: &Filter) -> Result<Option<Record>, ApiError> {
        let mut state = self.state.lock().unwrap();
        let path = collection.path().to_owned();
        state.calls += 1;
        *state.lookup_calls.entry(path.clone()).or_default() += 1;
        state.last_filter.insert(path.clone(), filter.to_string());

        if let Some(&status) = state.lookup_failures.get(&path) {
            return Err(ApiError::Api {
                status,
                message: "injected failure".into(),
            });
        }

        let matches: Vec<&Record> = state
            .records
            .get(&path)
            .map(|records| records.iter().filter(|r| record_matches(r, filter)).collect())
            .unwrap_or_default();
        match matches.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some((*one).clone())),
            many => Err(ApiError::Ambiguous {
                collection: path,
                filter: filter.to_string(),
                count: u64::try_from(many.len()).unwrap(),
            }),
        }
    }

    fn do_bulk_create(&self, collection: &Collection, bodies: &[Value]) -> Result<Vec<Record>, ApiError> {
        let mut state = self.state.lock().unwrap();
        let path = collection.path().to_owned();
        state.calls += 1;
        *state.create_calls.entry(path.clone()).or_default() += 1;

        if let Some(&status) = state.create_failures.get(&path) {
            return Err(ApiError::Api {
                status,
                message: "injected failure".into(),
            });
        }

        let entries: Vec<FieldErrors> = bodies
            .iter()
            .map(|body| {
                state
                    .rejections
                    .iter()
                    .find(|r| {
                        r.collection == path
                            && body.get(&r.field).map(value_label).as_deref() == Some(r.value.as_str())
                    })
                    .map(|r| r.errors.clone())
                    .unwrap_or_default()
            })
            .collect();
        if entries.iter().any(|e| !e.is_empty()) {
            return Err(ApiError::Validation {
                collection: path,
                status: 400,
                errors: ValidationErrors::from_entries(entries),
            });
        }

        let ids: Vec<u64> = bodies.iter().map(|body| state.insert(&path, body.clone())).collect();
        *state.created.entry(path.clone()).or_default() += ids.len();
        Ok(state
            .records
            .get(&path)
            .map(|records| records.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
            .unwrap_or_default())
    }

    fn do_delete(&self, collection: &Collection, id: u64) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let path = collection.path().to_owned();
        state.calls += 1;
        let records = state.records.entry(path.clone()).or_default();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(ApiError::Api {
                status: 404,
                message: "Not found.".into(),
            });
        }
        state.deleted.entry(path).or_default().push(id);
        Ok(())
    }
}

fn count(map: &HashMap<String, usize>, collection: &Collection) -> usize {
    map.get(collection.path()).copied().unwrap_or_default()
}

/// Scalar identity of a stored value: the id of a nested reference, else
/// the value itself.
fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Object(map) => map.get("id").map(value_label),
        other => Some(value_label(other)),
    }
}

fn record_matches(record: &Record, filter: &Filter) -> bool {
    filter.iter().all(|(field, wanted)| {
        let stored = if field == "id" {
            Some(Value::from(record.id))
        } else {
            record.get(field).cloned()
        };

        if let Some(stored) = stored {
            return match (&stored, wanted) {
                (Value::Null, Value::Null) => true,
                (Value::Object(map), wanted) => {
                    let wanted = value_label(wanted);
                    ["id", "name", "slug"]
                        .iter()
                        .any(|k| map.get(*k).map(value_label).as_deref() == Some(wanted.as_str()))
                }
                (stored, wanted) => value_label(stored) == value_label(wanted),
            };
        }

        // `<ref>_id` filters on the reference `<ref>`.
        let Some(base) = field.strip_suffix("_id") else {
            return wanted.is_null();
        };
        let base = if base == "devicetype" { "device_type" } else { base };
        let stored = record.get(base).and_then(id_of);
        match (stored, wanted) {
            (None, Value::Null) => true,
            (Some(stored), wanted) if !wanted.is_null() => stored == value_label(wanted),
            _ => false,
        }
    })
}

impl Remote for FakeRemote {
    fn lookup(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> impl Future<Output = Result<Option<Record>, ApiError>> + Send {
        ready(self.do_lookup(collection, filter))
    }

    fn bulk_create(
        &self,
        collection: &Collection,
        bodies: &[Value],
    ) -> impl Future<Output = Result<Vec<Record>, ApiError>> + Send {
        ready(self.do_bulk_create(collection, bodies))
    }

    fn delete(
        &self,
        collection: &Collection,
        id: u64,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        ready(self.do_delete(collection, id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn id_filters_follow_nested_references() {
        let record = Record {
            id: 7,
            fields: crate::model::object(json!({
                "name": "data",
                "group": {"id": 3, "slug": "g1"},
                "device_type": 9,
            })),
        };
        assert!(record_matches(&record, &Filter::by("group_id", 3)));
        assert!(record_matches(&record, &Filter::by("group", "g1")));
        assert!(record_matches(&record, &Filter::by("devicetype_id", 9)));
        assert!(record_matches(&record, &Filter::by("vrf_id", Value::Null)));
        assert!(!record_matches(&record, &Filter::by("group_id", Value::Null)));
        assert!(!record_matches(&record, &Filter::by("name", "voice")));
    }
}
