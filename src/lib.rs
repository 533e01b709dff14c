//! # Catalog Core
//!
//! An in-process document aggregation and bulk-mutation engine for a
//! clothing-store catalog: named collections of uniquely-keyed documents,
//! ordered/unordered bulk writes with per-operation outcomes, atomic
//! inventory adjustment, distinct-value extraction and multi-stage
//! aggregation queries (match, group, lookup, unwind, sort, limit, project).
//!
//! ## Features
//!
//! - **Typed catalog models**: `Brand`, `Clothing`, `User`, `Sale` with all
//!   fields declared, converting losslessly to the generic document form
//! - **Outcome-based bulk writes**: duplicate keys and missed deletes are
//!   reported per operation, never thrown
//! - **Atomic stock ledger**: lost-update-free read-modify-write with a
//!   non-negativity guarantee
//! - **Inspectable pipelines**: stage lists validated before execution, run
//!   by one generic executor over point-in-time snapshots
//! - **Thread-safe**: collection handles can be shared freely across threads
//! - **Safe error handling**: no `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```
//! use catalog_core::{
//!     bulk_write, to_document, BulkMode, BulkOp, DocumentStore, Sale,
//! };
//! use chrono::NaiveDate;
//!
//! let store = DocumentStore::connect()?;
//! let sales = store.collection("sales");
//!
//! let sale = Sale {
//!     id: "sale001".to_string(),
//!     user_id: "user001".to_string(),
//!     clothing_id: "cloth002".to_string(),
//!     quantity: 3,
//!     date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
//! };
//! let batch = bulk_write(
//!     &sales,
//!     vec![BulkOp::Insert(to_document(&sale)?)],
//!     BulkMode::Unordered,
//! );
//! assert!(batch.is_ok());
//! # Ok::<(), catalog_core::EngineError>(())
//! ```
//!
//! ## Engine surface
//!
//! - [`DocumentStore`] / [`Collection`] - named collections, created on
//!   first use, copy-out reads
//! - [`bulk_write`] - ordered/unordered insert, upsert and delete batches
//! - [`adjust_stock`] - atomic inventory adjustment
//! - [`Collection::distinct`] - unique field values
//! - [`Pipeline`] - validated multi-stage aggregation
//! - [`catalog_queries`] - prebuilt report queries (sales by date, brands
//!   with sales, per-item sold totals, top brands)
//!
//! Presentation and persistence live outside this crate: the engine yields
//! ordered record sequences for an external report sink, and the store is
//! in-process for the lifetime of the [`DocumentStore`].

pub mod aggregate;
pub mod bulk_write;
pub mod catalog_model;
pub mod catalog_queries;
pub mod document;
pub mod engine_response;
pub mod stock;
pub mod store_state;


pub use aggregate::{Accumulator, Pipeline, Predicate, SortDirection, Stage};
pub use bulk_write::{bulk_write, BatchResult, BulkMode, BulkOp, OpOutcome};
pub use catalog_model::{from_document, to_document, Address, Brand, Clothing, Sale, User};
pub use document::{Document, Fields};
pub use engine_response::{EngineError, Result};
pub use stock::{adjust_stock, STOCK_FIELD};
pub use store_state::{Collection, DocumentStore, UpsertOutcome};
