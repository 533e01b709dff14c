//! Typed catalog entities.
//!
//! Every collection in the store holds one entity kind. Each entity declares
//! all of its fields explicitly and converts losslessly to and from the
//! generic [`Document`] form via serde, so the engine stays generic while
//! callers work with concrete types.
//!
//! Foreign-key fields (`brand_id`, `clothing_id`, `user_id`) are
//! referentially soft: the store never checks that the referenced document
//! exists at write time. A sale may reference a clothing id that was never
//! inserted; the left-outer lookup semantics of the pipeline handle that.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::engine_response::{EngineError, Result};

/// A clothing brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub country: String,
    /// Founding year.
    pub founded: i32,
}

/// A catalog clothing item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clothing {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub sizes: Vec<String>,
    pub color: String,
    /// References `Brand.id` (soft).
    pub brand_id: String,
    /// Units on hand. Never negative; the stock ledger enforces this.
    pub in_stock: i64,
}

/// Postal address embedded in a user document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    pub country: String,
}

/// A store customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Password hash; the engine never interprets it.
    pub password: String,
    pub address: Address,
    /// Clothing ids ordered by this user (soft references).
    pub orders: Vec<String>,
}

/// One recorded sale. `quantity` is strictly positive by data contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// References `User.id` (soft).
    pub user_id: String,
    /// References `Clothing.id` (soft).
    pub clothing_id: String,
    pub quantity: i64,
    /// Calendar day of the sale, serialized `YYYY-MM-DD`.
    pub date: NaiveDate,
}

/// Converts a typed entity into its document form. The entity must serialize
/// to a JSON object carrying a string `id` field.
pub fn to_document<T: Serialize>(entity: &T) -> Result<Document> {
    let value = serde_json::to_value(entity)?;
    match value {
        Value::Object(mut map) => {
            let id = match map.shift_remove("id") {
                Some(Value::String(id)) => id,
                Some(other) => {
                    return Err(EngineError::Serialization(format!(
                        "entity id must be a string, got {other}"
                    )))
                }
                None => {
                    return Err(EngineError::Serialization(
                        "entity has no id field".to_string(),
                    ))
                }
            };
            Ok(Document::new(id, map))
        }
        other => Err(EngineError::Serialization(format!(
            "entity must serialize to an object, got {other}"
        ))),
    }
}

/// Reconstructs a typed entity from its document form.
pub fn from_document<T: DeserializeOwned>(doc: &Document) -> Result<T> {
    Ok(serde_json::from_value(doc.to_record())?)
}
