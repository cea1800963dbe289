//! Concurrency layer for VaultDB
//!
//! This crate implements optimistic head updates with:
//! - HeadManager: one serialized head table per store
//! - Compare-and-swap (CAS) of dataset heads
//! - Head table persistence inside the swap

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;

pub use manager::HeadManager;
