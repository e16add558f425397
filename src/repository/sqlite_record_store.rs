// ==========================================
// ERP 导入引擎 - 目标表存储 Repository 实现
// ==========================================
// 职责: 实现 RecordStore（使用 rusqlite）
// 表结构: db::destination_table_ddl（自然键 UNIQUE）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection, quote_ident};
use crate::domain::canonical::CanonicalRecord;
use crate::domain::types::{Destination, FieldValue};
use crate::importer::schema_registry::schema_for;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::RecordStore;
use async_trait::async_trait;
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FieldValue::Number(n) => ToSqlOutput::Owned(Value::Real(*n)),
            FieldValue::Text(s) => ToSqlOutput::Borrowed(s.as_str().into()),
            FieldValue::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// 创建新的存储实例（建表幂等）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建（与 ConfigManager 共用连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = lock(&conn)?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 目标表行数
    pub fn count(&self, destination: Destination) -> RepositoryResult<usize> {
        let conn = lock(&self.conn)?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(destination.table_name()));
        let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// 按自然键读取单列值（核对落库结果用）
    pub fn get_value(
        &self,
        destination: Destination,
        key: &str,
        field: &str,
    ) -> RepositoryResult<Option<FieldValue>> {
        let schema = schema_for(destination);
        ensure_field(destination, field)?;

        let conn = lock(&self.conn)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            quote_ident(field),
            quote_ident(destination.table_name()),
            quote_ident(schema.natural_key)
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            None => Ok(None),
            Some(row) => {
                let value = match row.get::<_, Value>(0)? {
                    Value::Real(n) => FieldValue::Number(n),
                    Value::Integer(n) => FieldValue::Number(n as f64),
                    Value::Text(s) => FieldValue::Text(s),
                    Value::Null | Value::Blob(_) => FieldValue::Null,
                };
                Ok(Some(value))
            }
        }
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> RepositoryResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))
}

fn ensure_field(destination: Destination, field: &str) -> RepositoryResult<()> {
    if schema_for(destination).field(field).is_none() {
        return Err(RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("不是目标表 {} 的字段", destination),
        });
    }
    Ok(())
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn exists_by_key(
        &self,
        destination: Destination,
        key_field: &str,
        values: &[String],
    ) -> RepositoryResult<HashSet<String>> {
        ensure_field(destination, key_field)?;
        if values.is_empty() {
            return Ok(HashSet::new());
        }

        let conn = lock(&self.conn)?;
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "SELECT {col} FROM {table} WHERE {col} IN ({placeholders})",
            col = quote_ident(key_field),
            table = quote_ident(destination.table_name()),
        );

        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        debug!(
            destination = %destination,
            queried = values.len(),
            found = found.len(),
            "存在性查询完成"
        );
        Ok(found)
    }

    async fn insert_many(
        &self,
        destination: Destination,
        records: Vec<CanonicalRecord>,
    ) -> RepositoryResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        if let Some(bad) = records.iter().find(|r| r.destination() != destination) {
            return Err(RepositoryError::FieldValueError {
                field: "destination".to_string(),
                message: format!("记录属于 {}，不能写入 {}", bad.destination(), destination),
            });
        }

        let columns: Vec<&str> = schema_for(destination).field_names().collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(destination.table_name()),
            columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
            (1..=columns.len())
                .map(|i| format!("?{}", i))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let mut stmt = tx.prepare(&sql)?;

        let mut count = 0;
        for record in &records {
            let values: Vec<FieldValue> = record.columns().into_iter().map(|(_, v)| v).collect();
            stmt.execute(params_from_iter(values.iter()))?;
            count += 1;
        }

        // 显式释放 stmt 的借用,以便提交事务
        drop(stmt);

        tx.commit()?;
        Ok(count)
    }
}
