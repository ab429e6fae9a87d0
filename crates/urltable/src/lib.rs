//! Segment-trie URL pattern table.
//!
//! Registers `METHOD/path` patterns built from literal segments, `*` (one
//! segment) and a trailing `**` (one or more segments), rejects ambiguous
//! registrations when they are appended, and resolves concrete requests to
//! the canonical pattern that handles them. Literal beats `*`, `*` beats `**`.
//!
//! ```
//! use urltable::Table;
//!
//! let mut table = Table::new();
//! table.append("GET/api/v1/user").unwrap();
//! table.append("GET/api/*/info").unwrap();
//! table.append("GET/static/**").unwrap();
//!
//! assert_eq!(table.mapping("GET/api/v2/info").unwrap().as_deref(), Some("GET/api/*/info"));
//! assert_eq!(table.mapping("GET/static/css/app.css").unwrap().as_deref(), Some("GET/static/**"));
//! assert_eq!(table.mapping("GET/unknown").unwrap(), None);
//! assert!(table.append("GET/static/*/x").is_err());
//! ```

pub mod error;
pub mod pattern;
pub mod shared;
pub mod table;

pub use error::{PatternError, TableError};
pub use pattern::{format, parse, request_key, Method, Pattern, Segment};
pub use shared::SharedTable;
pub use table::Table;
