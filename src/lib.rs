//! changelog-normalize: canonicalizes Liquibase XML changelogs
//!
//! This library reads a batch of changelog files, gives every changeset,
//! constraint and index a deterministic name when the author left one out,
//! caps oversized `VARCHAR` types and writes each document back in
//! one canonical layout (three-space indent, namespaced root, short-form
//! empty elements for the common column and constraint kinds).

pub mod changelog;
pub mod config;
pub mod input;
pub mod naming;
pub mod normalize;
pub mod output;
pub mod pipeline;

// Re-export commonly used types
pub use changelog::{ChangelogDocument, parse_changelog, write_changelog};
pub use config::Config;
pub use input::{ChangelogSource, DirectorySource};
pub use naming::{NameCategory, NamingEngine};
pub use output::{ChangelogSink, DirectorySink};
pub use pipeline::{BatchProcessor, BatchReport};
