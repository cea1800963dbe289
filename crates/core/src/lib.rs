//! Core types and traits for VaultDB
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: immutable, structurally-typed payload
//! - Reference: content-derived handle to a stored Value
//! - Commit: node of a dataset's commit graph
//! - DatasetName: validated dataset identifier
//! - Marshal: conversion between serde records and Value
//! - Error: error type hierarchy
//! - Traits: ValueStore, HeadStore

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commit;
pub mod dataset_name;
pub mod error;
pub mod marshal;
pub mod reference;
pub mod traits;
pub mod value;

pub use commit::Commit;
pub use dataset_name::{DatasetName, DatasetNameError, MAX_DATASET_NAME_LENGTH};
pub use error::{VaultError, VaultResult};
pub use marshal::{marshal, unmarshal};
pub use reference::{Reference, REFERENCE_LEN};
pub use traits::{HeadStore, Store, StoreStats, ValueStore};
pub use value::Value;
