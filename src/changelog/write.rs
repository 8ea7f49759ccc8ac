//! Canonical changelog writer.
//!
//! Output layout, byte for byte:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <databaseChangeLog xmlns="http://www.liquibase.org/xml/ns/dbchangelog"
//!                    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
//!                    xsi:schemaLocation="...">
//!    <changeSet author="dev" id="001_1">
//!       <createTable tableName="users">
//!          <column name="id" type="integer"/>
//!       </createTable>
//!    </changeSet>
//! </databaseChangeLog>
//! ```
//!
//! Elements are indented three spaces per level. Attributes follow a fixed
//! per-element order and are omitted when absent. Empty elements are first
//! written as `<x></x>`; only the kinds in [`SELF_CLOSING`] are then
//! collapsed to `<x/>`. There is no trailing newline.

use super::{
    AddColumn, AddForeignKeyConstraint, AddNotNullConstraint, AddPrimaryKey, AddUniqueConstraint,
    ChangeSet, ChangelogDocument, Column, Constraints, CreateIndex, CreateTable, Insert, Property,
};

pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

const INDENT: &str = "   ";

const ROOT_START: &str = "<databaseChangeLog>";

const ROOT_START_WITH_NAMESPACES: &str = "<databaseChangeLog xmlns=\"http://www.liquibase.org/xml/ns/dbchangelog\"\n                   xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"\n                   xsi:schemaLocation=\"http://www.liquibase.org/xml/ns/dbchangelog http://www.liquibase.org/xml/ns/dbchangelog/dbchangelog-4.0.xsd\">";

/// Element kinds written as `<x/>` when empty. Everything else keeps `<x></x>`.
pub const SELF_CLOSING: [&str; 6] = [
    "column",
    "constraints",
    "createIndex",
    "addUniqueConstraint",
    "addPrimaryKey",
    "property",
];

/// Render a document in canonical form.
pub fn write_changelog(doc: &ChangelogDocument) -> String {
    let mut text = String::from(XML_HEADER);
    render(&doc.element(), 0, &mut text);
    let text = inject_namespaces(&text);
    collapse_empty_elements(&text)
}

/// Add the fixed namespace and schema-location attributes to the root tag.
pub(crate) fn inject_namespaces(text: &str) -> String {
    text.replacen(ROOT_START, ROOT_START_WITH_NAMESPACES, 1)
}

/// Turn `<x ...></x>` into `<x .../>` for the [`SELF_CLOSING`] kinds.
pub(crate) fn collapse_empty_elements(text: &str) -> String {
    SELF_CLOSING.iter().fold(text.to_string(), |acc, tag| {
        acc.replace(&format!("></{}>", tag), "/>")
    })
}

// ---------------------------------------------------------------------------
// Element tree
// ---------------------------------------------------------------------------

struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Element>,
}

impl Element {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    fn attr(mut self, key: &'static str, value: &Option<String>) -> Self {
        if let Some(v) = value {
            self.attrs.push((key, v.clone()));
        }
        self
    }

    fn flag(mut self, key: &'static str, value: Option<bool>) -> Self {
        if let Some(v) = value {
            self.attrs.push((key, v.to_string()));
        }
        self
    }

    fn number(mut self, key: &'static str, value: Option<i64>) -> Self {
        if let Some(v) = value {
            self.attrs.push((key, v.to_string()));
        }
        self
    }

    fn children<'a, T: ToElement + 'a>(mut self, items: impl IntoIterator<Item = &'a T>) -> Self {
        self.children.extend(items.into_iter().map(ToElement::element));
        self
    }
}

fn render(el: &Element, depth: usize, out: &mut String) {
    out.push('<');
    out.push_str(el.tag);
    for (key, value) in &el.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');

    if !el.children.is_empty() {
        for child in &el.children {
            newline(depth + 1, out);
            render(child, depth + 1, out);
        }
        newline(depth, out);
    }

    out.push_str("</");
    out.push_str(el.tag);
    out.push('>');
}

fn newline(depth: usize, out: &mut String) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Escape an attribute value the way the target tool's reference writer does.
fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c if is_xml_char(c) => out.push(c),
            _ => out.push('\u{FFFD}'),
        }
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

// ---------------------------------------------------------------------------
// Model → element
// ---------------------------------------------------------------------------

trait ToElement {
    fn element(&self) -> Element;
}

impl ToElement for ChangelogDocument {
    fn element(&self) -> Element {
        Element::new("databaseChangeLog")
            .children(&self.properties)
            .children(&self.change_sets)
    }
}

impl ToElement for Property {
    fn element(&self) -> Element {
        Element::new("property")
            .attr("name", &self.name)
            .attr("value", &self.value)
            .attr("dbms", &self.dbms)
    }
}

impl ToElement for ChangeSet {
    fn element(&self) -> Element {
        Element::new("changeSet")
            .attr("author", &self.author)
            .attr("id", &self.id)
            .children(&self.create_table)
            .children(&self.add_not_null_constraint)
            .children(&self.add_foreign_key_constraint)
            .children(&self.add_unique_constraint)
            .children(&self.create_index)
            .children(&self.add_column)
            .children(&self.insert)
            .children(&self.add_primary_key)
    }
}

impl ToElement for CreateTable {
    fn element(&self) -> Element {
        Element::new("createTable")
            .attr("tableName", &self.table_name)
            .attr("catalogName", &self.catalog_name)
            .attr("remarks", &self.remarks)
            .attr("schemaName", &self.schema_name)
            .attr("tablespace", &self.tablespace)
            .children(&self.columns)
    }
}

impl ToElement for Column {
    fn element(&self) -> Element {
        Element::new("column")
            .flag("autoIncrement", self.auto_increment)
            .attr("name", &self.name)
            .attr("type", &self.type_name)
            .flag("defaultValueBoolean", self.default_value_boolean)
            .flag("descending", self.descending)
            .number("position", self.position)
            .attr("afterColumn", &self.after_column)
            .attr("value", &self.value)
            .children(&self.constraints)
    }
}

impl ToElement for Constraints {
    fn element(&self) -> Element {
        Element::new("constraints")
            .flag("primaryKey", self.primary_key)
            .attr("primaryKeyName", &self.primary_key_name)
            .flag("unique", self.unique)
            .attr("uniqueConstraintName", &self.unique_constraint_name)
            .flag("nullable", self.nullable)
            .attr("notNullConstraintName", &self.not_null_constraint_name)
    }
}

impl ToElement for AddNotNullConstraint {
    fn element(&self) -> Element {
        Element::new("addNotNullConstraint")
            .attr("catalogName", &self.catalog_name)
            .attr("columnDataType", &self.column_data_type)
            .attr("columnName", &self.column_name)
            .attr("constraintName", &self.constraint_name)
            .attr("defaultNullValue", &self.default_null_value)
            .attr("schemaName", &self.schema_name)
            .attr("tableName", &self.table_name)
            .flag("validate", self.validate)
    }
}

impl ToElement for AddPrimaryKey {
    fn element(&self) -> Element {
        Element::new("addPrimaryKey")
            .attr("catalogName", &self.catalog_name)
            .attr("columnNames", &self.column_names)
            .attr("constraintName", &self.constraint_name)
            .attr("forIndexName", &self.for_index_name)
            .attr("schemaName", &self.schema_name)
            .attr("tableName", &self.table_name)
            .attr("tablespace", &self.tablespace)
            .flag("clustered", self.clustered)
            .flag("validate", self.validate)
    }
}

impl ToElement for AddForeignKeyConstraint {
    fn element(&self) -> Element {
        Element::new("addForeignKeyConstraint")
            .attr("baseColumnNames", &self.base_column_names)
            .attr("baseTableCatalogName", &self.base_table_catalog_name)
            .attr("baseTableName", &self.base_table_name)
            .attr("baseTableSchemaName", &self.base_table_schema_name)
            .attr("constraintName", &self.constraint_name)
            .flag("deferrable", self.deferrable)
            .flag("initiallyDeferred", self.initially_deferred)
            .attr("onDelete", &self.on_delete)
            .attr("onUpdate", &self.on_update)
            .attr("referencedColumnNames", &self.referenced_column_names)
            .attr("referencedTableCatalogName", &self.referenced_table_catalog_name)
            .attr("referencedTableName", &self.referenced_table_name)
            .attr("referencedTableSchemaName", &self.referenced_table_schema_name)
            .flag("validate", self.validate)
    }
}

impl ToElement for AddUniqueConstraint {
    fn element(&self) -> Element {
        Element::new("addUniqueConstraint")
            .attr("catalogName", &self.catalog_name)
            .flag("clustered", self.clustered)
            .attr("columnNames", &self.column_names)
            .attr("constraintName", &self.constraint_name)
            .flag("deferrable", self.deferrable)
            .flag("disabled", self.disabled)
            .attr("forIndexName", &self.for_index_name)
            .flag("initiallyDeferred", self.initially_deferred)
            .attr("schemaName", &self.schema_name)
            .attr("tableName", &self.table_name)
            .attr("tablespace", &self.tablespace)
            .flag("validate", self.validate)
    }
}

impl ToElement for CreateIndex {
    fn element(&self) -> Element {
        Element::new("createIndex")
            .flag("clustered", self.clustered)
            .attr("indexName", &self.index_name)
            .attr("schemaName", &self.schema_name)
            .attr("tableName", &self.table_name)
            .attr("tablespace", &self.tablespace)
            .flag("unique", self.unique)
            .children(&self.columns)
    }
}

impl ToElement for AddColumn {
    fn element(&self) -> Element {
        Element::new("addColumn")
            .attr("catalogName", &self.catalog_name)
            .attr("schemaName", &self.schema_name)
            .attr("tableName", &self.table_name)
            .children(&self.columns)
    }
}

impl ToElement for Insert {
    fn element(&self) -> Element {
        Element::new("insert")
            .attr("tableName", &self.table_name)
            .children(&self.columns)
    }
}
