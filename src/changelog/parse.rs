//! Liquibase XML changelog reader.
//!
//! Reads the document with `quick-xml` into a small element tree, then maps
//! the tree onto the typed model in [`crate::changelog`]. Elements and
//! attributes are matched by local name, so `dbchangelog:changeSet` and
//! `changeSet` are the same thing. Anything the model has no slot for
//! (unknown elements with their subtree, unknown attributes, text,
//! comments) is dropped.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use super::{
    AddColumn, AddForeignKeyConstraint, AddNotNullConstraint, AddPrimaryKey, AddUniqueConstraint,
    ChangeSet, ChangelogDocument, Column, Constraints, CreateIndex, CreateTable, Insert, Property,
};

const ROOT_ELEMENT: &str = "databaseChangeLog";

/// Malformed markup or an attribute value of the wrong shape.
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Parse the full byte content of a changelog file.
pub fn parse_changelog(bytes: &[u8]) -> Result<ChangelogDocument, ParseError> {
    let xml = std::str::from_utf8(bytes).map_err(|e| ParseError {
        line: 1,
        message: format!("input is not valid UTF-8: {}", e),
    })?;
    let root = read_tree(xml)?;
    if root.name != ROOT_ELEMENT {
        return Err(root.error(format!(
            "expected element type <{}> but have <{}>",
            ROOT_ELEMENT, root.name
        )));
    }
    changelog_from(&root)
}

/// Generic element: local name, decoded attributes, element children.
#[derive(Debug)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    line: usize,
}

impl Node {
    fn error(&self, message: String) -> ParseError {
        ParseError {
            line: self.line,
            message,
        }
    }

    fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Last attribute with this local name wins.
    fn string(&self, key: &str) -> Option<String> {
        self.attrs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn boolean(&self, key: &str) -> Result<Option<bool>, ParseError> {
        let Some(raw) = self.string(key) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(Some(false));
        }
        match raw.trim() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(Some(true)),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(Some(false)),
            other => Err(self.error(format!(
                "invalid boolean {:?} for attribute {} on <{}>",
                other, key, self.name
            ))),
        }
    }

    fn integer(&self, key: &str) -> Result<Option<i64>, ParseError> {
        let Some(raw) = self.string(key) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(Some(0));
        }
        raw.trim().parse::<i64>().map(Some).map_err(|e| {
            self.error(format!(
                "invalid integer {:?} for attribute {} on <{}>: {}",
                raw, key, self.name, e
            ))
        })
    }
}

/// Read the first top-level element and everything beneath it.
fn read_tree(xml: &str) -> Result<Node, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| ParseError {
            line: byte_offset_to_line(xml, reader.buffer_position()),
            message: format!("XML parse error: {}", e),
        })?;
        // Position is just past the event, i.e. the line a tag closes on.
        let line = byte_offset_to_line(xml, reader.buffer_position());

        let finished = match event {
            Event::Eof => {
                return Err(ParseError {
                    line,
                    message: match stack.last() {
                        Some(open) => format!("unexpected EOF inside <{}>", open.name),
                        None => "no root element".to_string(),
                    },
                });
            }
            Event::Start(ref e) => {
                stack.push(start_node(e, line)?);
                None
            }
            Event::Empty(ref e) => {
                let node = start_node(e, line)?;
                attach(&mut stack, node)
            }
            Event::End(_) => match stack.pop() {
                Some(node) => attach(&mut stack, node),
                None => {
                    return Err(ParseError {
                        line,
                        message: "unexpected end tag".to_string(),
                    });
                }
            },
            Event::Text(ref e) => {
                // Character data has no slot in the model, but bad entities
                // still make the document malformed.
                e.unescape().map_err(|err| ParseError {
                    line,
                    message: format!("XML text unescape error: {}", err),
                })?;
                None
            }
            // CDATA, comments, declarations, processing instructions
            _ => None,
        };

        if let Some(root) = finished {
            return Ok(root);
        }
        buf.clear();
    }
}

/// Attach a completed node to its parent, or hand it back if it was the root.
fn attach(stack: &mut [Node], node: Node) -> Option<Node> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            None
        }
        None => Some(node),
    }
}

fn start_node(e: &BytesStart<'_>, line: usize) -> Result<Node, ParseError> {
    Ok(Node {
        name: local_name_str(e.name().as_ref()),
        attrs: collect_attributes(e, line)?,
        children: Vec::new(),
        line,
    })
}

/// Collect attributes as (local name, decoded value) pairs.
fn collect_attributes(e: &BytesStart<'_>, line: usize) -> Result<Vec<(String, String)>, ParseError> {
    let mut attrs = Vec::new();
    let mut attributes = e.attributes();
    // Repeated attributes are allowed; the last one wins in `Node::string`.
    attributes.with_checks(false);
    for attr_result in attributes {
        let attr = attr_result.map_err(|err| ParseError {
            line,
            message: format!("Failed to parse XML attribute: {}", err),
        })?;
        let key = local_name_str(attr.key.as_ref());
        let raw = std::str::from_utf8(&attr.value).map_err(|err| ParseError {
            line,
            message: format!("attribute {} is not valid UTF-8: {}", key, err),
        })?;
        if raw.contains('<') {
            return Err(ParseError {
                line,
                message: format!("unescaped < inside value of attribute {}", key),
            });
        }
        let raw = normalize_newlines(raw);
        let value = quick_xml::escape::unescape(&raw).map_err(|err| ParseError {
            line,
            message: format!("attribute {}: {}", key, err),
        })?;
        attrs.push((key, value.into_owned()));
    }
    Ok(attrs)
}

/// Raw `\r\n` and lone `\r` read as `\n`; escaped `&#13;` is untouched.
fn normalize_newlines(raw: &str) -> Cow<'_, str> {
    if raw.contains('\r') {
        Cow::Owned(raw.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Get the local name from a potentially namespace-prefixed name.
///
/// For example, `dbchangelog:changeSet` becomes `changeSet`.
fn local_name_str(name: &[u8]) -> String {
    let full = String::from_utf8_lossy(name);
    match full.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => full.to_string(),
    }
}

/// Convert a byte offset in the XML string to a 1-based line number.
fn byte_offset_to_line(xml: &str, offset: usize) -> usize {
    let clamped = offset.min(xml.len());
    xml.as_bytes()[..clamped]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

// ---------------------------------------------------------------------------
// Tree → model
// ---------------------------------------------------------------------------

fn changelog_from(root: &Node) -> Result<ChangelogDocument, ParseError> {
    Ok(ChangelogDocument {
        properties: root.children("property").map(property_from).collect(),
        change_sets: root
            .children("changeSet")
            .map(change_set_from)
            .collect::<Result<_, _>>()?,
    })
}

fn property_from(node: &Node) -> Property {
    Property {
        name: node.string("name"),
        value: node.string("value"),
        dbms: node.string("dbms"),
    }
}

fn change_set_from(node: &Node) -> Result<ChangeSet, ParseError> {
    Ok(ChangeSet {
        author: node.string("author"),
        id: node.string("id"),
        create_table: collect(node, "createTable", create_table_from)?,
        add_not_null_constraint: collect(node, "addNotNullConstraint", add_not_null_from)?,
        add_foreign_key_constraint: collect(node, "addForeignKeyConstraint", add_foreign_key_from)?,
        add_unique_constraint: collect(node, "addUniqueConstraint", add_unique_from)?,
        create_index: collect(node, "createIndex", create_index_from)?,
        add_column: collect(node, "addColumn", add_column_from)?,
        insert: collect(node, "insert", insert_from)?,
        add_primary_key: collect(node, "addPrimaryKey", add_primary_key_from)?,
    })
}

fn collect<T>(
    node: &Node,
    name: &str,
    from: fn(&Node) -> Result<T, ParseError>,
) -> Result<Vec<T>, ParseError> {
    node.children(name).map(from).collect()
}

fn create_table_from(node: &Node) -> Result<CreateTable, ParseError> {
    Ok(CreateTable {
        table_name: node.string("tableName"),
        catalog_name: node.string("catalogName"),
        remarks: node.string("remarks"),
        schema_name: node.string("schemaName"),
        tablespace: node.string("tablespace"),
        columns: collect(node, "column", column_from)?,
    })
}

fn column_from(node: &Node) -> Result<Column, ParseError> {
    Ok(Column {
        auto_increment: node.boolean("autoIncrement")?,
        name: node.string("name"),
        type_name: node.string("type"),
        default_value_boolean: node.boolean("defaultValueBoolean")?,
        descending: node.boolean("descending")?,
        position: node.integer("position")?,
        after_column: node.string("afterColumn"),
        constraints: collect(node, "constraints", constraints_from)?,
        value: node.string("value"),
    })
}

fn constraints_from(node: &Node) -> Result<Constraints, ParseError> {
    Ok(Constraints {
        primary_key: node.boolean("primaryKey")?,
        primary_key_name: node.string("primaryKeyName"),
        unique: node.boolean("unique")?,
        unique_constraint_name: node.string("uniqueConstraintName"),
        nullable: node.boolean("nullable")?,
        not_null_constraint_name: node.string("notNullConstraintName"),
    })
}

fn add_not_null_from(node: &Node) -> Result<AddNotNullConstraint, ParseError> {
    Ok(AddNotNullConstraint {
        catalog_name: node.string("catalogName"),
        column_data_type: node.string("columnDataType"),
        column_name: node.string("columnName"),
        constraint_name: node.string("constraintName"),
        default_null_value: node.string("defaultNullValue"),
        schema_name: node.string("schemaName"),
        table_name: node.string("tableName"),
        validate: node.boolean("validate")?,
    })
}

fn add_primary_key_from(node: &Node) -> Result<AddPrimaryKey, ParseError> {
    Ok(AddPrimaryKey {
        catalog_name: node.string("catalogName"),
        column_names: node.string("columnNames"),
        constraint_name: node.string("constraintName"),
        for_index_name: node.string("forIndexName"),
        schema_name: node.string("schemaName"),
        table_name: node.string("tableName"),
        tablespace: node.string("tablespace"),
        clustered: node.boolean("clustered")?,
        validate: node.boolean("validate")?,
    })
}

fn add_foreign_key_from(node: &Node) -> Result<AddForeignKeyConstraint, ParseError> {
    Ok(AddForeignKeyConstraint {
        base_column_names: node.string("baseColumnNames"),
        base_table_catalog_name: node.string("baseTableCatalogName"),
        base_table_name: node.string("baseTableName"),
        base_table_schema_name: node.string("baseTableSchemaName"),
        constraint_name: node.string("constraintName"),
        deferrable: node.boolean("deferrable")?,
        initially_deferred: node.boolean("initiallyDeferred")?,
        on_delete: node.string("onDelete"),
        on_update: node.string("onUpdate"),
        referenced_column_names: node.string("referencedColumnNames"),
        referenced_table_catalog_name: node.string("referencedTableCatalogName"),
        referenced_table_name: node.string("referencedTableName"),
        referenced_table_schema_name: node.string("referencedTableSchemaName"),
        validate: node.boolean("validate")?,
    })
}

fn add_unique_from(node: &Node) -> Result<AddUniqueConstraint, ParseError> {
    Ok(AddUniqueConstraint {
        catalog_name: node.string("catalogName"),
        clustered: node.boolean("clustered")?,
        column_names: node.string("columnNames"),
        constraint_name: node.string("constraintName"),
        deferrable: node.boolean("deferrable")?,
        disabled: node.boolean("disabled")?,
        for_index_name: node.string("forIndexName"),
        initially_deferred: node.boolean("initiallyDeferred")?,
        schema_name: node.string("schemaName"),
        table_name: node.string("tableName"),
        tablespace: node.string("tablespace"),
        validate: node.boolean("validate")?,
    })
}

fn create_index_from(node: &Node) -> Result<CreateIndex, ParseError> {
    Ok(CreateIndex {
        clustered: node.boolean("clustered")?,
        index_name: node.string("indexName"),
        schema_name: node.string("schemaName"),
        table_name: node.string("tableName"),
        tablespace: node.string("tablespace"),
        unique: node.boolean("unique")?,
        columns: collect(node, "column", column_from)?,
    })
}

fn add_column_from(node: &Node) -> Result<AddColumn, ParseError> {
    Ok(AddColumn {
        catalog_name: node.string("catalogName"),
        schema_name: node.string("schemaName"),
        table_name: node.string("tableName"),
        columns: collect(node, "column", column_from)?,
    })
}

fn insert_from(node: &Node) -> Result<Insert, ParseError> {
    Ok(Insert {
        table_name: node.string("tableName"),
        columns: collect(node, "column", column_from)?,
    })
}
