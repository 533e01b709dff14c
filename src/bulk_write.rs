//! Ordered and unordered batches of insert/upsert/delete operations.
//!
//! Failures are values, not exceptions: a duplicate-key insert shows up as
//! an [`OpOutcome::DuplicateKey`] entry in the batch result, so callers can
//! treat it as "already existed" without exception-style branching. Ordered
//! batches stop at the first failure and keep all prior effects committed
//! (there is no rollback); unordered batches run every operation and report
//! each outcome.

use log::warn;

use crate::document::{Document, Fields};
use crate::store_state::{Collection, UpsertOutcome};

/// One operation in a bulk batch.
#[derive(Debug, Clone)]
pub enum BulkOp {
    /// Insert a new document; duplicate ids fail.
    Insert(Document),
    /// Merge `update` into the document with `id`, inserting if absent.
    Upsert { id: String, update: Fields },
    /// Remove the document with `id`; a miss is recorded, not an error.
    Delete { id: String },
}

/// Failure semantics of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkMode {
    /// Apply strictly in sequence; abort on the first failure, keeping prior
    /// effects.
    Ordered,
    /// Apply every operation regardless of prior failures.
    Unordered,
}

/// Per-operation outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum OpOutcome {
    Inserted,
    /// `created` is true when the upsert took the insert branch.
    Upserted { created: bool },
    /// `removed` is false when nothing matched the delete.
    Deleted { removed: bool },
    DuplicateKey { id: String },
}

impl OpOutcome {
    /// Whether this outcome counts as a failure for ordered-mode abort.
    /// A delete that matched nothing is a no-op success, not a failure.
    pub fn is_error(&self) -> bool {
        matches!(self, OpOutcome::DuplicateKey { .. })
    }
}

/// Result of a bulk batch: one outcome per executed operation, in order.
/// In ordered mode operations after an abort carry no outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub outcomes: Vec<OpOutcome>,
    /// True when an ordered batch stopped before its last operation.
    pub aborted: bool,
}

impl BatchResult {
    pub fn is_ok(&self) -> bool {
        !self.aborted && self.outcomes.iter().all(|o| !o.is_error())
    }
}

/// Applies `ops` against `collection` under the given mode.
pub fn bulk_write(collection: &Collection, ops: Vec<BulkOp>, mode: BulkMode) -> BatchResult {
    let total = ops.len();
    let mut outcomes = Vec::with_capacity(total);
    let mut aborted = false;

    for op in ops {
        let outcome = apply_op(collection, op);
        if outcome.is_error() {
            warn!(
                "[{}] bulk op {}/{} failed: {:?}",
                collection.name(),
                outcomes.len() + 1,
                total,
                outcome
            );
        }
        let abort = mode == BulkMode::Ordered && outcome.is_error();
        outcomes.push(outcome);
        if abort {
            aborted = outcomes.len() < total;
            break;
        }
    }

    BatchResult { outcomes, aborted }
}

fn apply_op(collection: &Collection, op: BulkOp) -> OpOutcome {
    match op {
        // insert only fails on key collision
        BulkOp::Insert(doc) => {
            let id = doc.id.clone();
            match collection.insert(doc) {
                Ok(()) => OpOutcome::Inserted,
                Err(_) => OpOutcome::DuplicateKey { id },
            }
        }
        BulkOp::Upsert { id, update } => OpOutcome::Upserted {
            created: collection.upsert(&id, &update) == UpsertOutcome::Inserted,
        },
        BulkOp::Delete { id } => OpOutcome::Deleted {
            removed: collection.delete(&id),
        },
    }
}
