//! Atomic inventory adjustment.

use log::{debug, warn};
use serde_json::Value;

use crate::engine_response::{EngineError, Result};
use crate::store_state::Collection;

/// Field the ledger adjusts.
pub const STOCK_FIELD: &str = "in_stock";

/// Adjusts `in_stock` on the document with the given id by `delta`.
///
/// The read-modify-write runs under the collection write lock, so concurrent
/// adjustments to the same id serialize: no two decrements can both read the
/// same stale value. If the adjusted value would be negative the call fails
/// with [`EngineError::InsufficientStock`] and the document is left
/// unmodified; there is no clamping to zero.
///
/// Returns `Ok(Some(new_stock))` on success and `Ok(None)` when no document
/// matches the id (nothing matched, not an error).
pub fn adjust_stock(collection: &Collection, id: &str, delta: i64) -> Result<Option<i64>> {
    collection.with_doc_mut(id, |doc| {
        let current = doc
            .fields
            .get(STOCK_FIELD)
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let adjusted = current + delta;
        if adjusted < 0 {
            warn!(
                "[{}] rejected stock adjustment on '{id}': {current} {delta:+}",
                collection.name()
            );
            return Err(EngineError::InsufficientStock {
                id: id.to_string(),
                available: current,
                delta,
            });
        }
        doc.fields
            .insert(STOCK_FIELD.to_string(), Value::from(adjusted));
        debug!(
            "[{}] stock '{id}': {current} {delta:+} -> {adjusted}",
            collection.name()
        );
        Ok(adjusted)
    })
}
