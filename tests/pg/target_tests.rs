//! Target database tests against `PostgreSQL`.

use super::helpers::{BoxError, TestSchema};
use datalab::job::adapters::postgres::PostgresTargetDatabase;
use datalab::job::domain::{ColumnSchema, GeneratedSql};
use datalab::job::ports::{DatabaseError, QueryExecutor, SchemaIntrospector};
use serde_json::json;

const SAMPLE_TABLES: &str = "
    CREATE TABLE sales (sale_id integer, product_name text, quantity integer);
    CREATE TABLE products (product_id integer, product_name text, price numeric(10, 2));
    INSERT INTO products VALUES
        (1, 'Laptop', 999.00),
        (2, 'Phone', 599.00),
        (3, 'Mouse', 25.00),
        (4, 'Cable', 5.00);
";

fn sample_target() -> Result<Option<(TestSchema, PostgresTargetDatabase)>, BoxError> {
    let Some(schema) = TestSchema::create_bare()? else {
        return Ok(None);
    };
    schema.batch_execute(SAMPLE_TABLES)?;
    let target = PostgresTargetDatabase::new(schema.target_settings()?);
    Ok(Some((schema, target)))
}

#[tokio::test(flavor = "multi_thread")]
async fn rows_keep_statement_column_order() -> Result<(), BoxError> {
    let Some((schema, target)) = sample_target()? else {
        return Ok(());
    };
    let sql = format!(
        "WITH ranked AS (SELECT product_name, product_id, price FROM {}.products) \
         SELECT product_name, product_id FROM ranked ORDER BY price DESC LIMIT 3",
        schema.name()
    );

    let rows = target.execute(&sql).await?;

    assert_eq!(rows.len(), 3);
    let columns: Vec<&str> = rows
        .first()
        .ok_or("row missing")?
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(columns, ["product_name", "product_id"]);
    let names: Vec<_> = rows.iter().map(|row| row.get("product_name")).collect();
    assert_eq!(
        names,
        [
            Some(&json!("Laptop")),
            Some(&json!("Phone")),
            Some(&json!("Mouse"))
        ]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_result_is_an_empty_list() -> Result<(), BoxError> {
    let Some((schema, target)) = sample_target()? else {
        return Ok(());
    };
    let sql = format!(
        "SELECT product_name FROM {}.products WHERE price < 0",
        schema.name()
    );

    let rows = target.execute(&sql).await?;

    assert!(rows.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn terminator_and_trailing_comment_are_accepted() -> Result<(), BoxError> {
    let Some((schema, target)) = sample_target()? else {
        return Ok(());
    };
    let generated = GeneratedSql::new(format!(
        "SELECT COUNT(*) AS total FROM {}.products; -- done",
        schema.name()
    ));

    let rows = target.execute(generated.executable_text()).await?;

    assert_eq!(
        rows.first().and_then(|row| row.get("total")),
        Some(&json!(4))
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_statements_are_not_transient() -> Result<(), BoxError> {
    let Some((schema, target)) = sample_target()? else {
        return Ok(());
    };

    for sql in [
        "SELEC product_name FROM products".to_owned(),
        format!("SELECT missing_column FROM {}.products", schema.name()),
        format!("SELECT * FROM {}.no_such_table", schema.name()),
    ] {
        let err = target
            .execute(&sql)
            .await
            .err()
            .ok_or("statement should fail")?;
        assert!(
            matches!(err, DatabaseError::Statement(_)),
            "{sql} gave {err:?}"
        );
        assert!(!err.is_transient());
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_transient() -> Result<(), BoxError> {
    let Some(schema) = TestSchema::create_bare()? else {
        return Ok(());
    };
    let mut settings = schema.target_settings()?;
    settings.host = "127.0.0.1".to_owned();
    settings.port = 1;
    let target = PostgresTargetDatabase::new(settings);

    let err = target
        .execute("SELECT 1")
        .await
        .err()
        .ok_or("connection should fail")?;

    assert!(err.is_transient(), "got {err:?}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn schema_lists_tables_by_name_and_columns_by_position() -> Result<(), BoxError> {
    let Some((_schema, target)) = sample_target()? else {
        return Ok(());
    };

    let descriptor = target.fetch_schema().await?;

    let tables: Vec<&str> = descriptor.tables().map(|(name, _)| name).collect();
    assert_eq!(tables, ["products", "sales"]);
    assert_eq!(
        descriptor.columns("products"),
        Some(
            [
                ColumnSchema::new("product_id", "integer"),
                ColumnSchema::new("product_name", "text"),
                ColumnSchema::new("price", "numeric"),
            ]
            .as_slice()
        )
    );
    Ok(())
}
