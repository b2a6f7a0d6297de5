use anyhow::{bail, Result};
use rusqlite::{params, types::Type, Connection, OptionalExtension};

/// Offset added to the schema version before it is written to
/// `PRAGMA user_version`, so a foreign SQLite file is never mistaken for ours.
pub const BASE_DB_VERSION: usize = 4200;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }
}

pub struct Column<'a, S: AsRef<str>> {
    pub name: S,
    pub sql_type: &'a SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<S>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column<'static, &'static str>],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let columns_sql = self
            .columns
            .iter()
            .map(|column| {
                let mut sql = format!("{} {}", column.name, column.sql_type.as_sql());
                if column.is_primary_key {
                    sql.push_str(" PRIMARY KEY");
                }
                if column.non_null {
                    sql.push_str(" NOT NULL");
                }
                if let Some(default_value) = column.default_value {
                    sql.push_str(&format!(" DEFAULT {}", default_value));
                }
                sql
            })
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, columns_sql),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    fn validate(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", self.name))?;
        let actual_columns = stmt
            .query_map(params![], |row| {
                let name = row.get::<usize, String>(1)?;
                let sql_type = match row.get::<_, String>(2)?.as_str() {
                    "TEXT" => &SqlType::Text,
                    "INTEGER" => &SqlType::Integer,
                    _ => {
                        return Err(rusqlite::Error::InvalidColumnType(
                            2,
                            name,
                            Type::Text,
                        ))
                    }
                };
                Ok(Column {
                    name,
                    sql_type,
                    non_null: row.get::<_, i32>(3)? == 1,
                    default_value: row.get::<_, Option<String>>(4)?,
                    is_primary_key: row.get::<_, i32>(5)? == 1,
                })
            })?
            .collect::<rusqlite::Result<Vec<Column<'_, String>>>>()?;

        if actual_columns.len() != self.columns.len() {
            bail!(
                "Table {} has {} columns, expected {}. Found column names: {}",
                self.name,
                actual_columns.len(),
                self.columns.len(),
                actual_columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
        }

        for (actual, expected) in actual_columns.iter().zip(self.columns.iter()) {
            if let Some(mismatch) = column_mismatch(actual, expected) {
                bail!("Table {} column {}: {}", self.name, expected.name, mismatch);
            }
        }

        for (index_name, _columns) in self.indices {
            let index_exists = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                    params![index_name, self.name],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !index_exists {
                bail!("Table {} is missing index '{}'", self.name, index_name);
            }
        }
        Ok(())
    }
}

/// Describes how a live column differs from its declaration, if it does.
fn column_mismatch(actual: &Column<'_, String>, expected: &Column<'_, &str>) -> Option<String> {
    if actual.name != expected.name {
        return Some(format!("found column {} in its place", actual.name));
    }
    if actual.sql_type != expected.sql_type {
        return Some(format!(
            "type is {:?}, expected {:?}",
            actual.sql_type, expected.sql_type
        ));
    }
    if actual.non_null != expected.non_null {
        return Some(format!(
            "NOT NULL is {}, expected {}",
            actual.non_null, expected.non_null
        ));
    }
    if actual.is_primary_key != expected.is_primary_key {
        return Some(format!(
            "PRIMARY KEY is {}, expected {}",
            actual.is_primary_key, expected.is_primary_key
        ));
    }
    // SQLite may report defaults wrapped in parentheses
    let actual_default = actual.default_value.as_deref().map(strip_outer_parentheses);
    let expected_default = expected.default_value.map(strip_outer_parentheses);
    if actual_default != expected_default {
        return Some(format!(
            "default is {:?}, expected {:?}",
            actual.default_value, expected.default_value
        ));
    }
    None
}

fn strip_outer_parentheses(s: &str) -> &str {
    s.strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(s)
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            table.validate(conn)?;
        }
        Ok(())
    }

    /// Reads the schema version stored in the database, without the base offset.
    pub fn stored_version(conn: &Connection) -> Result<i64> {
        let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        Ok(raw_version - BASE_DB_VERSION as i64)
    }
}
