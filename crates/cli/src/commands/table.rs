//! `nano table` handlers.

use anyhow::Result;
use nano_core::db::{Order, PageOptions};
use nano_core::{AppConfig, Database, Table};
use serde_json::{Map, Value};

use super::print_json;
use crate::args::TableCmd;

type Row = Map<String, Value>;

fn bind(db: &Database, name: &str, json_columns: &[String]) -> Result<Table<Row>> {
    let columns: Vec<&str> = json_columns.iter().map(String::as_str).collect();
    Ok(Table::new(db, name)?.json_columns(&columns))
}

pub async fn handle(config: &AppConfig, action: TableCmd) -> Result<()> {
    let db = Database::open(&config.db_path, config.enable_wal).await?;
    print_json(&run(&db, action).await?)
}

/// Run a table command and return its JSON output.
pub async fn run(db: &Database, action: TableCmd) -> Result<Value> {
    let output = match action {
        TableCmd::List { table, page, length, search, columns, explode, order_by, asc, json_columns } => {
            let order = if asc { Order::asc(order_by) } else { Order::desc(order_by) };
            let options = PageOptions {
                search_query: search.unwrap_or_default(),
                search_columns: columns,
                search_explode: explode,
                page_index: page,
                page_length: length,
                order,
                ..Default::default()
            };
            let page = bind(db, &table, &json_columns)?.paginate(&options).await?;
            serde_json::to_value(page)?
        }
        TableCmd::Get { table, id, json_columns } => {
            let record = bind(db, &table, &json_columns)?.get_by_id(id).await?;
            serde_json::to_value(record)?
        }
        TableCmd::Delete { table, id } => {
            let deleted = bind(db, &table, &[])?.delete(id).await?;
            if deleted {
                tracing::info!(table = %table, id, "row deleted");
            }
            Value::Bool(deleted)
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nano_core::db::migrate;
    use nano_core::{Record, StepModel};
    use serde_json::json;
    use std::sync::Arc;

    async fn seeded() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        migrate(&db, Arc::new(StepModel::new("posts", "title TEXT, tags TEXT")))
            .await
            .unwrap();

        let table: Table<Row> = Table::new(&db, "posts").unwrap().json_columns(&["tags"]);
        for (title, tags) in [("Rust notes", json!(["rust"])), ("Cooking", json!([])), ("Rust async", json!(["rust", "tokio"]))] {
            let mut row = Row::new();
            row.insert("title".into(), json!(title));
            row.insert("tags".into(), tags);
            table.save(&mut Record::new(row)).await.unwrap();
        }
        db
    }

    fn list(search: Option<&str>, length: u64) -> TableCmd {
        TableCmd::List {
            table: "posts".into(),
            page: 0,
            length,
            search: search.map(str::to_string),
            columns: vec!["title".into()],
            explode: false,
            order_by: "id".into(),
            asc: true,
            json_columns: vec!["tags".into()],
        }
    }

    #[tokio::test]
    async fn test_list_prints_page() {
        let db = seeded().await;

        let page = run(&db, list(Some("Rust"), 1)).await.unwrap();

        assert_eq!(page["count"], json!(2));
        assert_eq!(page["total"], json!(2));
        assert_eq!(page["current"], json!(0));
        let rows = page["list"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["data"]["title"], json!("Rust notes"));
        assert_eq!(rows[0]["data"]["tags"], json!(["rust"]));
    }

    #[tokio::test]
    async fn test_list_rejects_zero_length() {
        let db = seeded().await;
        assert!(run(&db, list(None, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_get_missing_id_is_null() {
        let db = seeded().await;

        let found = run(&db, TableCmd::Get { table: "posts".into(), id: 1, json_columns: vec![] })
            .await
            .unwrap();
        assert_eq!(found["id"], json!(1));

        let missing = run(&db, TableCmd::Get { table: "posts".into(), id: 99, json_columns: vec![] })
            .await
            .unwrap();
        assert_eq!(missing, Value::Null);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let db = seeded().await;
        let delete = || TableCmd::Delete { table: "posts".into(), id: 2 };

        assert_eq!(run(&db, delete()).await.unwrap(), json!(true));
        assert_eq!(run(&db, delete()).await.unwrap(), json!(false));
    }

    #[tokio::test]
    async fn test_bad_table_name() {
        let db = seeded().await;
        let result = run(&db, TableCmd::Delete { table: "posts; drop".into(), id: 1 }).await;
        assert!(result.is_err());
    }
}
