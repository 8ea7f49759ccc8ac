//! In-memory model of a Liquibase XML changelog.
//!
//! The model covers exactly the elements and attributes the normalizer
//! understands. Every attribute is an `Option` so that "absent" and
//! "present but empty" stay distinct: absent attributes are omitted on
//! output, present ones are written back even when empty.
//!
//! Change operations are kept in one list per kind, matching how the
//! canonical writer groups them. Relative order across kinds is not
//! preserved; order within a kind is.

pub mod parse;
pub mod write;

pub use parse::parse_changelog;
pub use write::write_changelog;

/// Root `<databaseChangeLog>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangelogDocument {
    pub properties: Vec<Property>,
    pub change_sets: Vec<ChangeSet>,
}

/// `<property>`: passed through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    pub name: Option<String>,
    pub value: Option<String>,
    pub dbms: Option<String>,
}

/// `<changeSet>` with its change operations grouped by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub author: Option<String>,
    pub id: Option<String>,
    pub create_table: Vec<CreateTable>,
    pub add_not_null_constraint: Vec<AddNotNullConstraint>,
    pub add_foreign_key_constraint: Vec<AddForeignKeyConstraint>,
    pub add_unique_constraint: Vec<AddUniqueConstraint>,
    pub create_index: Vec<CreateIndex>,
    pub add_column: Vec<AddColumn>,
    pub insert: Vec<Insert>,
    pub add_primary_key: Vec<AddPrimaryKey>,
}

impl ChangeSet {
    /// Total number of change operations across all kinds.
    pub fn change_count(&self) -> usize {
        self.create_table.len()
            + self.add_not_null_constraint.len()
            + self.add_foreign_key_constraint.len()
            + self.add_unique_constraint.len()
            + self.create_index.len()
            + self.add_column.len()
            + self.insert.len()
            + self.add_primary_key.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTable {
    pub table_name: Option<String>,
    pub catalog_name: Option<String>,
    pub remarks: Option<String>,
    pub schema_name: Option<String>,
    pub tablespace: Option<String>,
    pub columns: Vec<Column>,
}

/// `<column>` as it appears under createTable, addColumn, createIndex and insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    pub auto_increment: Option<bool>,
    pub name: Option<String>,
    /// Free-form type string, e.g. `VARCHAR(8000)`.
    pub type_name: Option<String>,
    pub default_value_boolean: Option<bool>,
    pub descending: Option<bool>,
    pub position: Option<i64>,
    pub after_column: Option<String>,
    pub constraints: Vec<Constraints>,
    /// Only meaningful under `<insert>`.
    pub value: Option<String>,
}

/// `<constraints>` attached to a column.
///
/// Presence of a flag (either value) is what makes the matching name
/// attribute eligible for a synthetic name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub primary_key: Option<bool>,
    pub primary_key_name: Option<String>,
    pub unique: Option<bool>,
    pub unique_constraint_name: Option<String>,
    pub nullable: Option<bool>,
    pub not_null_constraint_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddNotNullConstraint {
    pub catalog_name: Option<String>,
    pub column_data_type: Option<String>,
    pub column_name: Option<String>,
    pub constraint_name: Option<String>,
    pub default_null_value: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub validate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddPrimaryKey {
    pub catalog_name: Option<String>,
    pub column_names: Option<String>,
    pub constraint_name: Option<String>,
    pub for_index_name: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub tablespace: Option<String>,
    pub clustered: Option<bool>,
    pub validate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddForeignKeyConstraint {
    pub base_column_names: Option<String>,
    pub base_table_catalog_name: Option<String>,
    pub base_table_name: Option<String>,
    pub base_table_schema_name: Option<String>,
    pub constraint_name: Option<String>,
    pub deferrable: Option<bool>,
    pub initially_deferred: Option<bool>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    pub referenced_column_names: Option<String>,
    pub referenced_table_catalog_name: Option<String>,
    pub referenced_table_name: Option<String>,
    pub referenced_table_schema_name: Option<String>,
    pub validate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddUniqueConstraint {
    pub catalog_name: Option<String>,
    pub clustered: Option<bool>,
    pub column_names: Option<String>,
    pub constraint_name: Option<String>,
    pub deferrable: Option<bool>,
    pub disabled: Option<bool>,
    pub for_index_name: Option<String>,
    pub initially_deferred: Option<bool>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub tablespace: Option<String>,
    pub validate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateIndex {
    pub clustered: Option<bool>,
    pub index_name: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub tablespace: Option<String>,
    pub unique: Option<bool>,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddColumn {
    pub catalog_name: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insert {
    pub table_name: Option<String>,
    pub columns: Vec<Column>,
}

/// True when an optional name is missing or empty.
pub(crate) fn is_blank(name: &Option<String>) -> bool {
    name.as_deref().is_none_or(str::is_empty)
}
