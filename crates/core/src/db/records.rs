//! Typed rows over migrated model tables.
//!
//! A [`Table`] maps rows to [`Record`]s whose payload is any serde type.
//! Payload fields map to columns by name; `id`, `created_at` and
//! `updated_at` are managed by the table and kept on the record itself.

use std::marker::PhantomData;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_rusqlite::rusqlite::types::Value as SqlValue;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, params, params_from_iter};

use super::connection::Database;
use super::sql::{ColumnKind, ensure_identifier, json_to_sql, sql_to_json};
use crate::Error;

const MANAGED_COLUMNS: [&str; 3] = ["id", "created_at", "updated_at"];

/// A row plus its managed columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    pub id: Option<i64>,
    /// Unix seconds, set on insert.
    pub created_at: Option<i64>,
    /// Unix seconds, bumped on every save.
    pub updated_at: Option<i64>,
    pub data: T,
}

impl<T> Record<T> {
    /// A record that has not been saved yet.
    pub fn new(data: T) -> Self {
        Self { id: None, created_at: None, updated_at: None, data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Ordering of a listing. Defaults to most recently updated first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Default for Order {
    fn default() -> Self {
        Self { column: "updated_at".into(), direction: Direction::Desc }
    }
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: Direction::Asc }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self { column: column.into(), direction: Direction::Desc }
    }

    fn to_sql(&self) -> Result<String, Error> {
        ensure_identifier(&self.column)?;
        Ok(format!("ORDER BY {} {}", self.column, self.direction.as_sql()))
    }
}

/// Filter removing rows from a [`Table::paginate`] listing.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals the value.
    Equals(Value),
    /// Column is not null.
    NotNull,
}

/// Search, filter, and page options for [`Table::paginate`].
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Text searched with `LIKE %query%`.
    pub search_query: String,
    pub search_columns: Vec<String>,
    /// Search each space-separated word; a row matching any word is kept.
    pub search_explode: bool,
    pub exclusive_filters: Vec<(String, Filter)>,
    /// Zero-based page index.
    pub page_index: u64,
    pub page_length: u64,
    pub order: Order,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            search_columns: Vec::new(),
            search_explode: false,
            exclusive_filters: Vec::new(),
            page_index: 0,
            page_length: 10,
            order: Order::default(),
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub list: Vec<Record<T>>,
    /// Rows matching the search and filters, across all pages.
    pub count: u64,
    /// Number of pages.
    pub total: u64,
    pub current: u64,
    pub order: Order,
}

/// Handle on one model table.
#[derive(Debug, Clone)]
pub struct Table<T> {
    db: Database,
    name: String,
    kinds: Vec<(String, ColumnKind)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Table<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a table by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` if `name` is not a plain identifier.
    pub fn new(db: &Database, name: &str) -> Result<Self, Error> {
        ensure_identifier(name)?;
        Ok(Self { db: db.clone(), name: name.to_string(), kinds: Vec::new(), _marker: PhantomData })
    }

    /// Columns storing JSON-encoded sequences or mappings.
    pub fn json_columns(mut self, columns: &[&str]) -> Self {
        self.kinds
            .extend(columns.iter().map(|c| (c.to_string(), ColumnKind::Json)));
        self
    }

    /// Columns storing booleans as integers.
    pub fn bool_columns(mut self, columns: &[&str]) -> Self {
        self.kinds
            .extend(columns.iter().map(|c| (c.to_string(), ColumnKind::Bool)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Record<T>>, Error> {
        self.get_one_where("id", id).await
    }

    /// First row where `column` equals `value`.
    pub async fn get_one_where(&self, column: &str, value: impl Into<Value>) -> Result<Option<Record<T>>, Error> {
        self.get_one_where_all(&[(column, value.into())]).await
    }

    /// First row matching every `(column, value)` pair.
    pub async fn get_one_where_all(&self, conditions: &[(&str, Value)]) -> Result<Option<Record<T>>, Error> {
        let mut clauses = Vec::with_capacity(conditions.len());
        let mut params = Vec::with_capacity(conditions.len());
        for (column, value) in conditions {
            ensure_identifier(column)?;
            params.push(json_to_sql(value));
            clauses.push(format!("{column} = ?{}", params.len()));
        }
        let filter = if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };
        let sql = format!("SELECT * FROM {} {filter} LIMIT 1", self.name);
        let rows = self.fetch(sql, params).await?;
        rows.into_iter().next().map(decode_record).transpose()
    }

    /// Every row where `column` equals `value`.
    pub async fn get_all_where(
        &self, column: &str, value: impl Into<Value>, order: &Order,
    ) -> Result<Vec<Record<T>>, Error> {
        ensure_identifier(column)?;
        let sql = format!("SELECT * FROM {} WHERE {column} = ?1 {}", self.name, order.to_sql()?);
        let rows = self.fetch(sql, vec![json_to_sql(&value.into())]).await?;
        rows.into_iter().map(decode_record).collect()
    }

    pub async fn get_all(&self, order: &Order) -> Result<Vec<Record<T>>, Error> {
        let sql = format!("SELECT * FROM {} {}", self.name, order.to_sql()?);
        let rows = self.fetch(sql, Vec::new()).await?;
        rows.into_iter().map(decode_record).collect()
    }

    /// One page of rows after search and filters.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `page_length` is zero, and
    /// `Error::InvalidIdentifier` for a bad column name.
    pub async fn paginate(&self, options: &PageOptions) -> Result<Page<T>, Error> {
        if options.page_length == 0 {
            return Err(Error::InvalidInput("page_length must be greater than 0".into()));
        }

        let mut clauses = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        let query = options.search_query.trim();
        if !query.is_empty() && !options.search_columns.is_empty() {
            let terms: Vec<&str> = if options.search_explode {
                query.split(' ').filter(|t| !t.is_empty()).collect()
            } else {
                vec![query]
            };
            let mut any_term = Vec::with_capacity(terms.len());
            for term in terms {
                let mut any_column = Vec::with_capacity(options.search_columns.len());
                for column in &options.search_columns {
                    ensure_identifier(column)?;
                    params.push(SqlValue::Text(format!("%{term}%")));
                    any_column.push(format!("{column} LIKE ?{}", params.len()));
                }
                any_term.push(format!("({})", any_column.join(" OR ")));
            }
            clauses.push(format!("({})", any_term.join(" OR ")));
        }

        for (column, filter) in &options.exclusive_filters {
            ensure_identifier(column)?;
            match filter {
                Filter::NotNull => clauses.push(format!("{column} IS NOT NULL")),
                Filter::Equals(value) => {
                    params.push(json_to_sql(value));
                    clauses.push(format!("{column} = ?{}", params.len()));
                }
            }
        }

        let filter = if clauses.is_empty() { String::new() } else { format!("WHERE {}", clauses.join(" AND ")) };

        let count_sql = format!("SELECT COUNT(*) FROM {} {filter}", self.name);
        let count_params = params.clone();
        let count: i64 = self
            .db
            .conn
            .call(move |conn| conn.query_row(&count_sql, params_from_iter(count_params.iter()), |row| row.get(0)))
            .await
            .map_err(Error::from)?;
        let count = count.max(0) as u64;

        let offset = options.page_index.saturating_mul(options.page_length);
        params.push(SqlValue::Integer(i64::try_from(options.page_length).unwrap_or(i64::MAX)));
        let limit_index = params.len();
        params.push(SqlValue::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
        let list_sql = format!(
            "SELECT * FROM {} {filter} {} LIMIT ?{limit_index} OFFSET ?{}",
            self.name,
            options.order.to_sql()?,
            limit_index + 1
        );
        let rows = self.fetch(list_sql, params).await?;
        let list = rows.into_iter().map(decode_record).collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            list,
            count,
            total: count.div_ceil(options.page_length),
            current: options.page_index,
            order: options.order.clone(),
        })
    }

    /// Insert or update `record`, then refresh its managed columns.
    ///
    /// Records without an id, or whose id no longer exists, are inserted as
    /// new rows. Returns `false` when nothing was written.
    pub async fn save(&self, record: &mut Record<T>) -> Result<bool, Error> {
        let columns = encode_payload(&record.data)?;
        let table = self.name.clone();
        let id = record.id;
        let now = Utc::now().timestamp();

        let saved = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(i64, i64, i64)>, Error> {
                let exists = match id {
                    Some(id) => conn.query_row(
                        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
                        params![id],
                        |row| row.get::<_, bool>(0),
                    )?,
                    None => false,
                };

                let (names, mut values): (Vec<String>, Vec<SqlValue>) = columns.into_iter().unzip();
                let id = if let (true, Some(id)) = (exists, id) {
                    let mut assignments: Vec<String> =
                        names.iter().enumerate().map(|(i, n)| format!("{n} = ?{}", i + 1)).collect();
                    values.push(SqlValue::Integer(now));
                    assignments.push(format!("updated_at = ?{}", values.len()));
                    values.push(SqlValue::Integer(id));
                    let sql = format!("UPDATE {table} SET {} WHERE id = ?{}", assignments.join(", "), values.len());
                    if conn.execute(&sql, params_from_iter(values.iter()))? == 0 {
                        return Ok(None);
                    }
                    id
                } else {
                    let mut names = names;
                    names.push("created_at".into());
                    names.push("updated_at".into());
                    values.push(SqlValue::Integer(now));
                    values.push(SqlValue::Integer(now));
                    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{i}")).collect();
                    let sql =
                        format!("INSERT INTO {table} ({}) VALUES ({})", names.join(", "), placeholders.join(", "));
                    conn.execute(&sql, params_from_iter(values.iter()))?;
                    conn.last_insert_rowid()
                };

                let stamps = conn
                    .query_row(
                        &format!("SELECT created_at, updated_at FROM {table} WHERE id = ?1"),
                        params![id],
                        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
                    )
                    .optional()?;
                Ok(stamps.map(|(created, updated)| (id, created, updated)))
            })
            .await
            .map_err(Error::from)?;

        match saved {
            Some((id, created_at, updated_at)) => {
                record.id = Some(id);
                record.created_at = Some(created_at);
                record.updated_at = Some(updated_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete the row with `id`. Returns `false` if there was none.
    pub async fn delete(&self, id: i64) -> Result<bool, Error> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.name);
        let deleted = self
            .db
            .conn
            .call(move |conn| conn.execute(&sql, params![id]))
            .await
            .map_err(Error::from)?;
        Ok(deleted > 0)
    }

    async fn fetch(&self, sql: String, params: Vec<SqlValue>) -> Result<Vec<Map<String, Value>>, Error> {
        let kinds = self.kinds.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<Map<String, Value>>, rusqlite::Error> {
                let mut stmt = conn.prepare(&sql)?;
                let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
                let mut rows = stmt.query(params_from_iter(params.iter()))?;
                let mut out = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut map = Map::with_capacity(names.len());
                    for (i, name) in names.iter().enumerate() {
                        let kind = kinds
                            .iter()
                            .find(|(column, _)| column == name)
                            .map(|(_, kind)| *kind)
                            .unwrap_or(ColumnKind::Plain);
                        map.insert(name.clone(), sql_to_json(row.get_ref(i)?, kind));
                    }
                    out.push(map);
                }
                Ok(out)
            })
            .await
            .map_err(Error::from)
    }
}

fn decode_record<T: DeserializeOwned>(row: Map<String, Value>) -> Result<Record<T>, Error> {
    let managed = |name: &str| row.get(name).and_then(Value::as_i64);
    let (id, created_at, updated_at) = (managed("id"), managed("created_at"), managed("updated_at"));
    let data = serde_json::from_value(Value::Object(row))?;
    Ok(Record { id, created_at, updated_at, data })
}

fn encode_payload<T: Serialize>(data: &T) -> Result<Vec<(String, SqlValue)>, Error> {
    let Value::Object(fields) = serde_json::to_value(data)? else {
        return Err(Error::InvalidInput("record payload must serialize to a mapping".into()));
    };
    let mut columns = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        if MANAGED_COLUMNS.contains(&name.as_str()) {
            continue;
        }
        ensure_identifier(&name)?;
        columns.push((name, json_to_sql(&value)));
    }
    Ok(columns)
}
