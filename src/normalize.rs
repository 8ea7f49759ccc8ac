//! Changelog normalization.
//!
//! Walks every changeset of a parsed document in document order and:
//!
//! 1. gives the changeset an id if it has none,
//! 2. names `addNotNullConstraint`, `addForeignKeyConstraint`,
//!    `addUniqueConstraint`, `addPrimaryKey` and `createIndex` operations
//!    (in that order),
//! 3. caps oversized `VARCHAR` types and names inline column constraints
//!    under `addColumn` and then `createTable`.
//!
//! `insert` operations and `createIndex` columns are never touched.

use tracing::debug;

use crate::changelog::{ChangelogDocument, ChangeSet, Column};
use crate::naming::{ChangeSetIds, NameCategory, NamingEngine};

/// Default ceiling for `VARCHAR(n)` lengths.
pub const DEFAULT_VARCHAR_MAX_LENGTH: i64 = 4000;

/// Upper bound applied to `VARCHAR(n)` column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarcharCap {
    max_length: i64,
}

impl VarcharCap {
    pub fn new(max_length: i64) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> i64 {
        self.max_length
    }

    /// Replacement for `type_name`, if it is a `VARCHAR(n)` with `n` over the cap.
    ///
    /// The length is whatever sits between the first `(` and the last `)`,
    /// parsed as a signed decimal. Lowercase `varchar`, unparseable lengths
    /// and anything that doesn't start with `VARCHAR` are left alone.
    pub fn apply(&self, type_name: &str) -> Option<String> {
        if !type_name.starts_with("VARCHAR") {
            return None;
        }
        let open = type_name.find('(')?;
        let close = type_name.rfind(')')?;
        if close <= open {
            return None;
        }
        let length: i64 = type_name[open + 1..close].parse().ok()?;
        (length > self.max_length).then(|| format!("VARCHAR({})", self.max_length))
    }
}

impl Default for VarcharCap {
    fn default() -> Self {
        Self::new(DEFAULT_VARCHAR_MAX_LENGTH)
    }
}

/// What normalization changed in one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub change_sets: usize,
    pub synthesized_ids: usize,
    pub synthesized_names: usize,
    pub capped_types: usize,
}

impl NormalizeStats {
    pub fn add(&mut self, other: &NormalizeStats) {
        self.change_sets += other.change_sets;
        self.synthesized_ids += other.synthesized_ids;
        self.synthesized_names += other.synthesized_names;
        self.capped_types += other.capped_types;
    }
}

/// Normalize one document in place.
///
/// `file_name` supplies the basename for synthetic changeset ids. The
/// engine's counters carry over to whatever document is normalized next.
pub fn normalize_document(
    doc: &mut ChangelogDocument,
    file_name: &str,
    engine: &mut NamingEngine,
    cap: &VarcharCap,
) -> NormalizeStats {
    let mut ids = ChangeSetIds::for_file(file_name);
    let mut stats = NormalizeStats::default();

    for change_set in &mut doc.change_sets {
        stats.change_sets += 1;
        if ids.assign(&mut change_set.id) {
            stats.synthesized_ids += 1;
        }
        normalize_change_set(change_set, engine, cap, &mut stats);
    }

    stats
}

fn normalize_change_set(
    cs: &mut ChangeSet,
    engine: &mut NamingEngine,
    cap: &VarcharCap,
    stats: &mut NormalizeStats,
) {
    let mut name = |category: NameCategory, slot: &mut Option<String>| {
        if engine.assign(category, slot) {
            stats.synthesized_names += 1;
        }
    };

    for item in &mut cs.add_not_null_constraint {
        name(NameCategory::NotNull, &mut item.constraint_name);
    }
    for item in &mut cs.add_foreign_key_constraint {
        name(NameCategory::ForeignKey, &mut item.constraint_name);
    }
    for item in &mut cs.add_unique_constraint {
        name(NameCategory::UniqueIndex, &mut item.constraint_name);
    }
    for item in &mut cs.add_primary_key {
        name(NameCategory::PrimaryKey, &mut item.constraint_name);
    }
    for item in &mut cs.create_index {
        name(NameCategory::Index, &mut item.index_name);
    }

    let columns = cs
        .add_column
        .iter_mut()
        .flat_map(|ac| ac.columns.iter_mut())
        .chain(cs.create_table.iter_mut().flat_map(|ct| ct.columns.iter_mut()));
    for column in columns {
        normalize_column(column, engine, cap, stats);
    }
}

/// Cap the column's type and name its inline constraints.
///
/// Each flag that is present (true or false) advances its category once
/// per `<constraints>` entry.
pub fn normalize_column(
    column: &mut Column,
    engine: &mut NamingEngine,
    cap: &VarcharCap,
    stats: &mut NormalizeStats,
) {
    if let Some(type_name) = column.type_name.as_mut()
        && let Some(capped) = cap.apply(type_name)
    {
        debug!(column = ?column.name, from = %type_name, to = %capped, "capped column type");
        *type_name = capped;
        stats.capped_types += 1;
    }

    for constraints in &mut column.constraints {
        if constraints.nullable.is_some()
            && engine.assign(NameCategory::NotNull, &mut constraints.not_null_constraint_name)
        {
            stats.synthesized_names += 1;
        }
        if constraints.primary_key.is_some()
            && engine.assign(NameCategory::PrimaryKey, &mut constraints.primary_key_name)
        {
            stats.synthesized_names += 1;
        }
        if constraints.unique.is_some()
            && engine.assign(NameCategory::UniqueIndex, &mut constraints.unique_constraint_name)
        {
            stats.synthesized_names += 1;
        }
    }
}
