//! Prebuilt catalog report queries.
//!
//! Each query yields an ordered record sequence for the report sink;
//! formatting and presentation happen entirely outside this crate. The
//! queries are plain pipeline compositions, so callers needing variations
//! can build their own [`Pipeline`] from the same stages.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::aggregate::{Accumulator, Pipeline, Predicate, SortDirection, Stage};
use crate::engine_response::Result;
use crate::store_state::DocumentStore;

/// Units sold per day for one calendar day:
/// `{id: date, totalSold}` (at most one record).
pub fn sales_by_date(store: &DocumentStore, day: NaiveDate) -> Result<Vec<Value>> {
    Pipeline::new(vec![
        Stage::Match(vec![(
            "date".to_string(),
            Predicate::Eq(json!(day.to_string())),
        )]),
        Stage::Group {
            key: "date".to_string(),
            accumulators: vec![(
                "totalSold".to_string(),
                Accumulator::Sum("quantity".to_string()),
            )],
        },
    ])?
    .execute(store, "sales")
}

/// Brands with at least one sale: distinct sold clothing ids narrow the
/// clothing collection, whose brand ids narrow the brands collection.
/// Yields full brand records.
pub fn brands_with_sales(store: &DocumentStore) -> Result<Vec<Value>> {
    let sold_ids = store.collection("sales").distinct("clothing_id");
    let sold_clothing = Pipeline::new(vec![Stage::Match(vec![(
        "id".to_string(),
        Predicate::In(sold_ids),
    )])])?
    .execute(store, "clothing")?;

    let mut brand_ids: Vec<Value> = Vec::new();
    for record in &sold_clothing {
        let brand_id = record["brand_id"].clone();
        if !brand_ids.contains(&brand_id) {
            brand_ids.push(brand_id);
        }
    }

    Pipeline::new(vec![Stage::Match(vec![(
        "id".to_string(),
        Predicate::In(brand_ids),
    )])])?
    .execute(store, "brands")
}

/// Per-item sold totals joined onto the live clothing documents:
/// `{name, totalSold, in_stock}` per sold item.
pub fn clothing_sales_and_stock(store: &DocumentStore) -> Result<Vec<Value>> {
    Pipeline::new(vec![
        Stage::Group {
            key: "clothing_id".to_string(),
            accumulators: vec![(
                "totalSold".to_string(),
                Accumulator::Sum("quantity".to_string()),
            )],
        },
        Stage::Lookup {
            from: "clothing".to_string(),
            local_field: "id".to_string(),
            foreign_field: "id".to_string(),
            as_field: "item".to_string(),
        },
        Stage::Unwind("item".to_string()),
        Stage::Project(vec![
            ("name".to_string(), "item.name".to_string()),
            ("totalSold".to_string(), "totalSold".to_string()),
            ("in_stock".to_string(), "item.in_stock".to_string()),
        ]),
    ])?
    .execute(store, "sales")
}

/// Top `limit` brands by units sold, descending:
/// `{brand, totalSales}` per brand.
pub fn top_brands(store: &DocumentStore, limit: i64) -> Result<Vec<Value>> {
    Pipeline::new(vec![
        Stage::Lookup {
            from: "clothing".to_string(),
            local_field: "clothing_id".to_string(),
            foreign_field: "id".to_string(),
            as_field: "c".to_string(),
        },
        Stage::Unwind("c".to_string()),
        Stage::Group {
            key: "c.brand_id".to_string(),
            accumulators: vec![(
                "totalSales".to_string(),
                Accumulator::Sum("quantity".to_string()),
            )],
        },
        Stage::Sort {
            key: "totalSales".to_string(),
            direction: SortDirection::Descending,
        },
        Stage::Limit(limit),
        Stage::Lookup {
            from: "brands".to_string(),
            local_field: "id".to_string(),
            foreign_field: "id".to_string(),
            as_field: "b".to_string(),
        },
        Stage::Unwind("b".to_string()),
        Stage::Project(vec![
            ("brand".to_string(), "b.name".to_string()),
            ("totalSales".to_string(), "totalSales".to_string()),
        ]),
    ])?
    .execute(store, "sales")
}
