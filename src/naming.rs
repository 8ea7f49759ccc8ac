//! Synthetic identifiers for changesets, constraints and indexes.
//!
//! [`NamingEngine`] owns one rotation counter per [`NameCategory`]. A single
//! engine lives for a whole batch run, so numbering continues across files
//! in processing order. Every visited item advances its category's counter,
//! named or not; only unnamed items consume the value. That makes synthetic
//! numbers non-contiguous when named and unnamed items are mixed, and that
//! numbering is part of the output contract.
//!
//! Changeset ids use [`ChangeSetIds`], a separate counter scoped to one
//! document.

use strum_macros::{EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

use crate::changelog::is_blank;
use crate::config::NamingConfig;

/// Category of a synthetic name. Each has its own counter and prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum NameCategory {
    /// `addNotNullConstraint` and column `nullable` constraints.
    NotNull,
    /// `addPrimaryKey` and column `primaryKey` constraints.
    PrimaryKey,
    /// `addUniqueConstraint` and column `unique` constraints.
    UniqueIndex,
    /// `createIndex`.
    Index,
    /// `addForeignKeyConstraint`.
    ForeignKey,
}

impl NameCategory {
    const COUNT: usize = 5;

    fn slot(self) -> usize {
        self as usize
    }

    pub fn default_prefix(self) -> &'static str {
        match self {
            NameCategory::NotNull => "notnull_key_",
            NameCategory::PrimaryKey => "primary_key_",
            NameCategory::UniqueIndex => "unique_index_",
            NameCategory::Index => "index_",
            NameCategory::ForeignKey => "foreign_key_",
        }
    }
}

/// Per-category rotation counters for one batch run.
#[derive(Debug, Clone)]
pub struct NamingEngine {
    prefixes: [String; NameCategory::COUNT],
    counters: [u64; NameCategory::COUNT],
}

impl NamingEngine {
    /// Engine with the default prefixes and every counter at 1.
    pub fn new() -> Self {
        Self::from_config(&NamingConfig::default())
    }

    pub fn from_config(config: &NamingConfig) -> Self {
        Self {
            prefixes: [
                config.not_null_prefix.clone(),
                config.primary_key_prefix.clone(),
                config.unique_prefix.clone(),
                config.index_prefix.clone(),
                config.foreign_key_prefix.clone(),
            ],
            counters: [config.initial_counter; NameCategory::COUNT],
        }
    }

    /// Current value of a category's counter.
    pub fn counter(&self, category: NameCategory) -> u64 {
        self.counters[category.slot()]
    }

    pub fn prefix(&self, category: NameCategory) -> &str {
        &self.prefixes[category.slot()]
    }

    /// Advance the category's counter and build `{prefix}_{counter}`.
    pub fn next_name(&mut self, category: NameCategory) -> String {
        let n = self.advance(category);
        format!("{}_{}", self.prefix(category), n)
    }

    /// Visit one name slot of the given category.
    ///
    /// The counter always advances. A missing or empty name is replaced with
    /// the freshly minted one; an existing name is left alone. Returns `true`
    /// when a name was synthesized.
    pub fn assign(&mut self, category: NameCategory, name: &mut Option<String>) -> bool {
        if is_blank(name) {
            let fresh = self.next_name(category);
            let label: &'static str = category.into();
            debug!(category = label, name = %fresh, "synthesized name");
            *name = Some(fresh);
            true
        } else {
            self.advance(category);
            false
        }
    }

    fn advance(&mut self, category: NameCategory) -> u64 {
        let counter = &mut self.counters[category.slot()];
        *counter += 1;
        *counter
    }
}

impl Default for NamingEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Changeset id counter for a single document.
///
/// Starts at 0. Each changeset visited advances it once; a changeset that
/// already has an id advances it a second time. A missing or empty id
/// becomes `{basename}_{counter}`.
#[derive(Debug, Clone)]
pub struct ChangeSetIds {
    basename: String,
    count: u64,
}

impl ChangeSetIds {
    pub fn new(basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            count: 0,
        }
    }

    /// Counter for the document named `file_name`.
    pub fn for_file(file_name: &str) -> Self {
        Self::new(file_basename(file_name))
    }

    /// Visit one changeset id. Returns `true` when an id was synthesized.
    pub fn assign(&mut self, id: &mut Option<String>) -> bool {
        self.count += 1;
        if is_blank(id) {
            let fresh = format!("{}_{}", self.basename, self.count);
            debug!(id = %fresh, "synthesized changeset id");
            *id = Some(fresh);
            true
        } else {
            self.count += 1;
            false
        }
    }
}

/// File name without its final extension: `001.xml` → `001`, `a.b.xml` → `a.b`.
///
/// Only the part after the last `/` is searched for a dot, so a name with
/// no extension comes back unchanged.
pub fn file_basename(file_name: &str) -> &str {
    let last_segment = file_name.rfind('/').map_or(0, |i| i + 1);
    match file_name[last_segment..].rfind('.') {
        Some(dot) => &file_name[..last_segment + dot],
        None => file_name,
    }
}
