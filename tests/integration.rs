//! Integration tests for the full normalization batch over real directories.

use changelog_normalize::input::LoadError;
use changelog_normalize::pipeline::BatchError;
use changelog_normalize::{
    BatchProcessor, BatchReport, Config, DirectorySink, DirectorySource, parse_changelog,
};
use std::path::Path;

const ROOT_START: &str = concat!(
    "<databaseChangeLog xmlns=\"http://www.liquibase.org/xml/ns/dbchangelog\"\n",
    "                   xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"\n",
    "                   xsi:schemaLocation=\"http://www.liquibase.org/xml/ns/dbchangelog ",
    "http://www.liquibase.org/xml/ns/dbchangelog/dbchangelog-4.0.xsd\">",
);

/// Write `files` into a fresh input dir, run one batch, return (report, output dir).
fn run_batch(files: &[(&str, &str)]) -> (BatchReport, tempfile::TempDir) {
    let input = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    for (name, contents) in files {
        std::fs::write(input.path().join(name), contents).expect("write fixture");
    }

    let source = DirectorySource::new(input.path());
    let mut sink = DirectorySink::new(output.path());
    let report = BatchProcessor::new(&Config::default())
        .run(&source, &mut sink)
        .expect("batch succeeds");
    (report, output)
}

fn read_output(dir: &Path, name: &str) -> String {
    std::fs::read_to_string(dir.join(name)).expect("read output")
}

// ===========================================================================
// Naming and type capping
// ===========================================================================

#[test]
fn test_missing_id_type_cap_and_not_null_name() {
    let (report, out) = run_batch(&[(
        "001.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<databaseChangeLog xmlns="http://www.liquibase.org/xml/ns/dbchangelog">
    <changeSet author="dev">
        <createTable tableName="users">
            <column name="name" type="VARCHAR(5000)">
                <constraints nullable="true"/>
            </column>
        </createTable>
    </changeSet>
</databaseChangeLog>
"#,
    )]);

    let expected = [
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
        ROOT_START,
        "   <changeSet author=\"dev\" id=\"001_1\">",
        "      <createTable tableName=\"users\">",
        "         <column name=\"name\" type=\"VARCHAR(4000)\">",
        "            <constraints nullable=\"true\" notNullConstraintName=\"notnull_key__2\"/>",
        "         </column>",
        "      </createTable>",
        "   </changeSet>",
        "</databaseChangeLog>",
    ]
    .join("\n");

    assert_eq!(read_output(out.path(), "001.xml"), expected);
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].stats.capped_types, 1);
}

#[test]
fn test_index_counter_continues_into_next_file() {
    let index_only = r#"<databaseChangeLog>
    <changeSet id="1" author="dev">
        <createIndex tableName="users">
            <column name="email"/>
        </createIndex>
    </changeSet>
</databaseChangeLog>"#;

    let (_, out) = run_batch(&[("b.xml", index_only), ("a.xml", index_only)]);

    assert!(read_output(out.path(), "a.xml").contains(r#"<createIndex indexName="index__2" tableName="users">"#));
    assert!(read_output(out.path(), "b.xml").contains(r#"<createIndex indexName="index__3" tableName="users">"#));
}

#[test]
fn test_named_foreign_key_consumes_a_number() {
    let (_, out) = run_batch(&[(
        "fk.xml",
        r#"<databaseChangeLog>
    <changeSet id="1" author="dev">
        <addForeignKeyConstraint constraintName="fk_orders_users" baseTableName="orders"
            baseColumnNames="user_id" referencedTableName="users" referencedColumnNames="id"/>
        <addForeignKeyConstraint constraintName="" baseTableName="orders"
            baseColumnNames="item_id" referencedTableName="items" referencedColumnNames="id"/>
    </changeSet>
</databaseChangeLog>"#,
    )]);

    let text = read_output(out.path(), "fk.xml");
    assert!(text.contains(r#"constraintName="fk_orders_users""#), "{}", text);
    assert!(text.contains(r#"constraintName="foreign_key__3""#), "{}", text);
    // addForeignKeyConstraint is not a self-closing kind
    assert!(text.contains("></addForeignKeyConstraint>"), "{}", text);
}

// ===========================================================================
// Output invariants
// ===========================================================================

const MIXED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<databaseChangeLog xmlns="http://www.liquibase.org/xml/ns/dbchangelog"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <property name="id.type" value="bigint"/>
    <changeSet author="dev">
        <createTable tableName="orders">
            <column name="id" type="bigint" autoIncrement="true">
                <constraints primaryKey="true" nullable="false"/>
            </column>
            <column name="note" type="VARCHAR(10000)"/>
        </createTable>
        <addUniqueConstraint tableName="orders" columnNames="note"/>
        <createIndex tableName="orders"><column name="note"/></createIndex>
        <insert tableName="orders">
            <column name="id" value="1"/>
        </insert>
    </changeSet>
    <changeSet id="explicit" author="dev">
        <addNotNullConstraint tableName="orders" columnName="note"/>
        <addPrimaryKey tableName="orders" columnNames="id" constraintName="pk_orders"/>
        <addColumn tableName="orders">
            <column name="status" type="VARCHAR(20)">
                <constraints unique="true"/>
            </column>
        </addColumn>
    </changeSet>
    <changeSet author="dev">
        <sql>SELECT 1</sql>
    </changeSet>
</databaseChangeLog>"#;

#[test]
fn test_namespaces_once_and_no_long_form_empties() {
    let (_, out) = run_batch(&[("mixed.xml", MIXED)]);
    let text = read_output(out.path(), "mixed.xml");

    assert_eq!(text.matches("xmlns=\"").count(), 1);
    assert_eq!(text.matches("xmlns:xsi=\"").count(), 1);
    assert_eq!(text.matches("xsi:schemaLocation=\"").count(), 1);
    for tag in [
        "column",
        "constraints",
        "createIndex",
        "addUniqueConstraint",
        "addPrimaryKey",
        "property",
    ] {
        assert!(
            !text.contains(&format!("></{}>", tag)),
            "long-form empty <{}> in:\n{}",
            tag,
            text
        );
    }
}

#[test]
fn test_every_name_present_after_processing() {
    let (report, out) = run_batch(&[("mixed.xml", MIXED)]);
    let doc = parse_changelog(read_output(out.path(), "mixed.xml").as_bytes())
        .expect("output parses");

    let ids: Vec<_> = doc.change_sets.iter().map(|cs| cs.id.clone().unwrap()).collect();
    // explicit id advances the per-file counter twice
    assert_eq!(ids, vec!["mixed_1", "explicit", "mixed_4"]);

    let first = &doc.change_sets[0];
    let id_column = &first.create_table[0].columns[0].constraints[0];
    assert_eq!(id_column.primary_key_name.as_deref(), Some("primary_key__2"));
    assert_eq!(id_column.not_null_constraint_name.as_deref(), Some("notnull_key__2"));
    assert_eq!(
        first.create_table[0].columns[1].type_name.as_deref(),
        Some("VARCHAR(4000)")
    );
    assert_eq!(first.add_unique_constraint[0].constraint_name.as_deref(), Some("unique_index__2"));
    assert_eq!(first.create_index[0].index_name.as_deref(), Some("index__2"));
    assert_eq!(first.insert[0].columns[0].value.as_deref(), Some("1"));

    let second = &doc.change_sets[1];
    assert_eq!(second.add_not_null_constraint[0].constraint_name.as_deref(), Some("notnull_key__3"));
    assert_eq!(second.add_primary_key[0].constraint_name.as_deref(), Some("pk_orders"));
    assert_eq!(
        second.add_column[0].columns[0].constraints[0].unique_constraint_name.as_deref(),
        Some("unique_index__3")
    );

    // <sql> has no slot in the model and is dropped
    assert_eq!(doc.change_sets[2].change_count(), 0);

    let totals = report.totals();
    assert_eq!(totals.change_sets, 3);
    assert_eq!(totals.synthesized_ids, 2);
    assert_eq!(totals.capped_types, 1);
}

#[test]
fn test_reprocessing_output_keeps_every_name() {
    let (_, first_out) = run_batch(&[("mixed.xml", MIXED)]);
    let once = read_output(first_out.path(), "mixed.xml");

    let (report, second_out) = run_batch(&[("mixed.xml", &once)]);
    let twice = read_output(second_out.path(), "mixed.xml");

    assert_eq!(once, twice);
    assert_eq!(report.totals().synthesized_names, 0);
    assert_eq!(report.totals().synthesized_ids, 0);
}

// ===========================================================================
// Failure handling
// ===========================================================================

#[test]
fn test_malformed_file_aborts_remaining_batch() {
    let input = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    std::fs::write(input.path().join("1.xml"), MIXED).expect("write");
    std::fs::write(input.path().join("2.xml"), "<databaseChangeLog><changeSet>").expect("write");
    std::fs::write(input.path().join("3.xml"), MIXED).expect("write");

    let err = BatchProcessor::new(&Config::default())
        .run(
            &DirectorySource::new(input.path()),
            &mut DirectorySink::new(output.path()),
        )
        .unwrap_err();

    assert!(
        matches!(err, BatchError::Load(LoadError::Parse { .. })),
        "got: {}",
        err
    );
    assert!(output.path().join("1.xml").exists());
    assert!(!output.path().join("2.xml").exists());
    assert!(!output.path().join("3.xml").exists());
}

#[test]
fn test_unreadable_input_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let err = BatchProcessor::new(&Config::default())
        .run(
            &DirectorySource::new(tmp.path().join("missing")),
            &mut DirectorySink::new(tmp.path()),
        )
        .unwrap_err();
    assert!(
        matches!(err, BatchError::Load(LoadError::ListDir { .. })),
        "got: {}",
        err
    );
}
