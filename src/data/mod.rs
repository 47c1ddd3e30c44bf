//! Survey data source.
//!
//! Loads an already-cleaned record table from disk. Cleaning and renaming of
//! raw survey columns happen upstream.

pub mod loader;

pub use loader::load_table;
