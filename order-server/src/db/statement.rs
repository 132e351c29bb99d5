//! Audited SQL statements
//!
//! A mutating statement is described once as [`SqlStatement`]: SQL text with
//! positional `?` placeholders plus the values bound to them. The same value
//! drives the sqlx query and the reconstructed SQL text stored in `logs`, so the
//! audit trail always shows what actually ran.

use sqlx::sqlite::{SqliteArguments, SqliteQueryResult};
use sqlx::{Arguments, SqliteConnection};

use super::repository::{RepoError, RepoResult, audit_log};

/// A bind value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl SqlValue {
    /// SQL literal form (for audit text only, never executed)
    fn literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Real(v) => v.to_string(),
            SqlValue::Text(v) => format!("'{}'", v.replace('\'', "''")),
        }
    }
}

/// Mutating statement against one table
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    /// Table name recorded in `logs.table_name`
    pub table: &'static str,
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

impl SqlStatement {
    pub fn new(table: &'static str, sql: impl Into<String>) -> Self {
        Self {
            table,
            sql: sql.into(),
            binds: Vec::new(),
        }
    }

    /// Append a bind value (builder style)
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// Append an ` AND column = ?` filter
    pub fn and_eq(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.sql.push_str(" AND ");
        self.sql.push_str(column);
        self.sql.push_str(" = ?");
        self.binds.push(value.into());
        self
    }

    /// sqlx arguments for `query_with` / `query_scalar_with`
    pub fn arguments<'q>(&self) -> RepoResult<SqliteArguments<'q>> {
        let mut args = SqliteArguments::default();
        for value in &self.binds {
            let added = match value {
                SqlValue::Null => args.add(None::<i64>),
                SqlValue::Int(v) => args.add(*v),
                SqlValue::Real(v) => args.add(*v),
                SqlValue::Text(v) => args.add(v.clone()),
            };
            added.map_err(|e| RepoError::Database(format!("bind failed: {e}")))?;
        }
        Ok(args)
    }

    /// Render the statement with literals in place of placeholders
    ///
    /// `?` inside quoted SQL literals is left alone.
    pub fn reconstruct(&self) -> String {
        let mut out = String::with_capacity(self.sql.len() + self.binds.len() * 8);
        let mut values = self.binds.iter();
        let mut in_quote = false;

        for ch in self.sql.chars() {
            match ch {
                '\'' => {
                    in_quote = !in_quote;
                    out.push(ch);
                }
                '?' if !in_quote => match values.next() {
                    Some(v) => out.push_str(&v.literal()),
                    None => out.push(ch),
                },
                _ => out.push(ch),
            }
        }
        out
    }

    pub async fn execute(&self, conn: &mut SqliteConnection) -> RepoResult<SqliteQueryResult> {
        let result = sqlx::query_with(&self.sql, self.arguments()?)
            .execute(&mut *conn)
            .await?;
        Ok(result)
    }
}

/// One audit entry written during a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub table: &'static str,
    pub query: String,
}

/// Audit attribution for one mutation plus what has been recorded so far
///
/// Records are mirrored to the `audit` tracing target by [`AuditTrail::emit`]
/// once the transaction has committed.
#[derive(Debug, Clone)]
pub struct AuditTrail {
    pub user_id: String,
    pub project_id: i64,
    pub timestamp: i64,
    records: Vec<AuditRecord>,
}

impl AuditTrail {
    pub fn new(user_id: impl Into<String>, project_id: i64, timestamp: i64) -> Self {
        Self {
            user_id: user_id.into(),
            project_id,
            timestamp,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Emit committed records to the permanent audit log
    pub fn emit(self) {
        for record in self.records {
            crate::audit_log!(
                self.user_id.as_str(),
                self.project_id,
                record.table,
                record.query.as_str()
            );
        }
    }
}

/// Execute `stmt` and append its reconstructed text to `logs` on the same
/// connection
///
/// Either failure propagates, so the caller's transaction rolls back both.
pub async fn execute_audited(
    conn: &mut SqliteConnection,
    stmt: &SqlStatement,
    trail: &mut AuditTrail,
) -> RepoResult<SqliteQueryResult> {
    let result = stmt.execute(conn).await?;

    let query = stmt.reconstruct();
    audit_log::insert(
        conn,
        &trail.user_id,
        &query,
        stmt.table,
        trail.project_id,
        trail.timestamp,
    )
    .await?;

    trail.records.push(AuditRecord {
        table: stmt.table,
        query,
    });
    Ok(result)
}
