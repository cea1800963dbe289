//! Store directory layout

pub mod paths;

pub use paths::{StorePathError, StorePaths};
