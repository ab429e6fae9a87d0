//! urltable command-line library.
//!
//! Exposes the pattern file loader, request resolution and the hot-reload
//! watcher used by the `urltable` binary.

pub mod patterns;
pub mod resolve;
pub mod watch;

pub use patterns::{build_table, load_patterns, LoadError, PatternFile};
pub use resolve::{resolve_all, Resolution};
pub use watch::PatternWatcher;
