#![forbid(unsafe_code)]

//! Core domain model and business logic for the sodalog tracker.
//!
//! This crate provides:
//! - Domain types (nutrient profiles, catalog, entries, goals, statistics)
//! - The reference drink catalog and nutrition scaling
//! - Entry and goal stores (in-memory, JSONL WAL, goal file)
//! - Daily and weekly aggregation against goals
//! - CSV rollup of the entry WAL

pub mod types;
pub mod error;
pub mod catalog;
pub mod nutrition;
pub mod config;
pub mod logging;
pub mod store;
pub mod wal;
pub mod rollup;
pub mod goals;
pub mod aggregate;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{common_sizes, default_catalog, find_size};
pub use config::Config;
pub use nutrition::scale;
pub use store::{EntryStore, GoalStore, MemoryEntryStore, MemoryGoalStore};
pub use wal::JsonlEntryStore;
pub use goals::FileGoalStore;
pub use aggregate::{daily_stats, weekly_stats};
pub use tracker::Tracker;
