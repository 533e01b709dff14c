//! Multi-stage aggregation over collection snapshots.
//!
//! A [`Pipeline`] is an explicit, inspectable list of stage descriptors
//! consumed by one generic executor. Stages are pure transforms: each one
//! consumes the previous stage's record sequence and produces a new one,
//! deterministically for a given input. The stage list is validated as a
//! whole before anything executes; a malformed stage fails the pipeline with
//! [`EngineError::InvalidStage`] and no partial result.
//!
//! Consistency: the source collection is snapshotted once when execution
//! starts. Each `Lookup` snapshots its foreign collection at the moment that
//! stage runs, so a foreign collection mutated mid-query may be observed in
//! its newer state. This weak cross-collection consistency is accepted
//! behavior, not a defect.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;
use serde_json::{Map, Value};

use crate::document::resolve_path;
use crate::engine_response::{EngineError, Result};
use crate::store_state::DocumentStore;

/// Equality/range predicate over one field, used by [`Stage::Match`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// Field value is one of the listed values. Composes with
    /// `Collection::distinct` for distinct-then-filter queries.
    In(Vec<Value>),
}

/// Fold applied within a group. The engine needs only field sums.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One transform step of an aggregation query.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep records for which every listed field predicate holds.
    Match(Vec<(String, Predicate)>),
    /// Partition records by the value at `key`; emit one record per distinct
    /// key: `{id: key, <name>: accumulated}` for each accumulator.
    Group {
        key: String,
        accumulators: Vec<(String, Accumulator)>,
    },
    /// Left-outer join: attach to each record, as the array field
    /// `as_field`, every document of `from` whose `foreign_field` equals the
    /// record's `local_field`. Records with no match keep an empty array and
    /// are never dropped.
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// Emit one record per element of the named array field, replacing the
    /// array with the element. An empty or missing array yields zero
    /// records, which turns a preceding `Lookup` into an effective inner
    /// join.
    Unwind(String),
    /// Total order by `key`. The sort is stable: records with equal keys
    /// keep their prior relative order; no secondary key is applied.
    Sort {
        key: String,
        direction: SortDirection,
    },
    /// Truncate to the first `n` records. Negative `n` is rejected at
    /// validation.
    Limit(i64),
    /// Reshape each record to the named output fields, each copied (and
    /// possibly renamed) from a source path: `(output name, source path)`.
    Project(Vec<(String, String)>),
}

/// A validated, ordered stage list.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Validates every stage up front; a malformed stage fails the whole
    /// pipeline before any stage executes.
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        for (index, stage) in stages.iter().enumerate() {
            validate_stage(stage).map_err(|reason| {
                EngineError::InvalidStage(format!("stage {index}: {reason}"))
            })?;
        }
        Ok(Pipeline { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs the pipeline over a snapshot of `collection`, threading the
    /// record sequence through each stage in order.
    pub fn execute(&self, store: &DocumentStore, collection: &str) -> Result<Vec<Value>> {
        let mut records: Vec<Value> = store
            .collection(collection)
            .snapshot()
            .iter()
            .map(|doc| doc.to_record())
            .collect();
        debug!(
            "pipeline on '{collection}': {} stages, {} input records",
            self.stages.len(),
            records.len()
        );

        for stage in &self.stages {
            records = apply_stage(stage, records, store);
        }
        Ok(records)
    }
}

fn validate_stage(stage: &Stage) -> std::result::Result<(), String> {
    match stage {
        Stage::Match(predicates) if predicates.is_empty() => {
            Err("match with no predicates".to_string())
        }
        Stage::Group { key, .. } if key.is_empty() => Err("group with empty key".to_string()),
        Stage::Group { accumulators, .. } if accumulators.is_empty() => {
            Err("group without accumulator".to_string())
        }
        Stage::Lookup {
            from,
            local_field,
            foreign_field,
            as_field,
        } if from.is_empty()
            || local_field.is_empty()
            || foreign_field.is_empty()
            || as_field.is_empty() =>
        {
            Err("lookup with empty collection or field name".to_string())
        }
        Stage::Unwind(field) if field.is_empty() => Err("unwind with empty field".to_string()),
        Stage::Sort { key, .. } if key.is_empty() => Err("sort with empty key".to_string()),
        Stage::Limit(n) if *n < 0 => Err(format!("limit with negative count {n}")),
        Stage::Project(fields) if fields.is_empty() => {
            Err("project with no output fields".to_string())
        }
        _ => Ok(()),
    }
}

fn apply_stage(stage: &Stage, records: Vec<Value>, store: &DocumentStore) -> Vec<Value> {
    match stage {
        Stage::Match(predicates) => records
            .into_iter()
            .filter(|record| {
                predicates
                    .iter()
                    .all(|(field, pred)| matches_predicate(&resolve_path(record, field), pred))
            })
            .collect(),
        Stage::Group { key, accumulators } => group_records(records, key, accumulators),
        Stage::Lookup {
            from,
            local_field,
            foreign_field,
            as_field,
        } => {
            // Foreign snapshot taken when this stage runs, see module docs.
            let foreign: Vec<Value> = store
                .collection(from)
                .snapshot()
                .iter()
                .map(|doc| doc.to_record())
                .collect();
            records
                .into_iter()
                .map(|mut record| {
                    let local = resolve_path(&record, local_field);
                    let matches: Vec<Value> = foreign
                        .iter()
                        .filter(|doc| resolve_path(doc, foreign_field) == local)
                        .cloned()
                        .collect();
                    if let Value::Object(map) = &mut record {
                        map.insert(as_field.clone(), Value::Array(matches));
                    }
                    record
                })
                .collect()
        }
        Stage::Unwind(field) => records
            .into_iter()
            .flat_map(|record| unwind_record(record, field))
            .collect(),
        Stage::Sort { key, direction } => {
            let mut records = records;
            // Stable sort: equal keys keep their prior relative order.
            records.sort_by(|a, b| {
                let ordering = compare_values(&resolve_path(a, key), &resolve_path(b, key));
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
            records
        }
        Stage::Limit(n) => {
            let mut records = records;
            records.truncate(*n as usize);
            records
        }
        Stage::Project(fields) => records
            .into_iter()
            .map(|record| {
                let mut out = Map::with_capacity(fields.len());
                for (name, source) in fields {
                    out.insert(name.clone(), resolve_path(&record, source));
                }
                Value::Object(out)
            })
            .collect(),
    }
}

fn matches_predicate(value: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq(expected) => value == expected,
        Predicate::Gt(bound) => compare_values(value, bound) == Ordering::Greater,
        Predicate::Gte(bound) => compare_values(value, bound) != Ordering::Less,
        Predicate::Lt(bound) => compare_values(value, bound) == Ordering::Less,
        Predicate::Lte(bound) => compare_values(value, bound) != Ordering::Greater,
        Predicate::In(values) => values.contains(value),
    }
}

fn group_records(
    records: Vec<Value>,
    key: &str,
    accumulators: &[(String, Accumulator)],
) -> Vec<Value> {
    // Key order follows first appearance in the input sequence.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, (Value, Vec<SumState>)> = HashMap::new();

    for record in &records {
        let key_value = resolve_path(record, key);
        let group_key = key_value.to_string();
        let entry = groups.entry(group_key.clone()).or_insert_with(|| {
            order.push(group_key);
            (key_value, vec![SumState::default(); accumulators.len()])
        });
        for (state, (_, accumulator)) in entry.1.iter_mut().zip(accumulators) {
            let Accumulator::Sum(field) = accumulator;
            state.add(&resolve_path(record, field));
        }
    }

    order
        .into_iter()
        .map(|group_key| {
            let (key_value, states) = &groups[&group_key];
            let mut out = Map::with_capacity(accumulators.len() + 1);
            out.insert("id".to_string(), key_value.clone());
            for ((name, _), state) in accumulators.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            Value::Object(out)
        })
        .collect()
}

/// Running sum that stays integral while every input is integral.
#[derive(Debug, Clone)]
struct SumState {
    total: f64,
    all_integral: bool,
}

impl Default for SumState {
    fn default() -> Self {
        SumState {
            total: 0.0,
            all_integral: true,
        }
    }
}

impl SumState {
    fn add(&mut self, value: &Value) {
        if let Some(n) = value.as_i64() {
            self.total += n as f64;
        } else if let Some(n) = value.as_f64() {
            self.all_integral = false;
            self.total += n;
        }
        // non-numeric values contribute nothing to a sum
    }

    fn finish(&self) -> Value {
        if self.all_integral {
            Value::from(self.total as i64)
        } else {
            Value::from(self.total)
        }
    }
}

fn unwind_record(record: Value, field: &str) -> Vec<Value> {
    let Value::Object(map) = &record else {
        return vec![record];
    };
    match map.get(field) {
        Some(Value::Array(elements)) => elements
            .iter()
            .map(|element| {
                let mut out = map.clone();
                out.insert(field.to_string(), element.clone());
                Value::Object(out)
            })
            .collect(),
        // missing or null arrays unwind to nothing
        None | Some(Value::Null) => Vec::new(),
        // a scalar passes through unchanged
        Some(_) => vec![record],
    }
}

/// Total order over JSON values for sorting and range predicates: null, then
/// booleans, numbers, strings, arrays, objects; numbers compare numerically.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
