//! # Header Grammar
//!
//! Recursive-descent parser for the MIME-like grammar shared by request
//! headers and the suffix catalog: tokens, quoted strings, delimiters and
//! parameter lists. Pure functions over an explicit cursor value.

pub mod cursor;
pub mod grammar;

pub use cursor::{Cursor, Parsed};
pub use grammar::{ListEntry, Param, ParsedList};
