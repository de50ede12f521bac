//! Reconstruction of descriptors from stored catalog SQL.
//!
//! SQLite keeps the original `CREATE TABLE` and `CREATE INDEX` text in
//! `sqlite_master`. Parsing it back yields the same descriptors the model
//! would serialize, so the live database can serve as the snapshot.

mod cursor;
mod error;
mod parser;

pub use cursor::{split_top_level, Cursor};
pub use error::ParseError;
pub use parser::{parse_create_index, parse_create_table};
