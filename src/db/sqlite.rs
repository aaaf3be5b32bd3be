use crate::db::models::{DbStartup, NewStartup};
use crate::db::schema::SQLITE_INIT;
use crate::error::RegistryError;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite, Transaction};
use std::str::FromStr;

type SqlitePool = Pool<Sqlite>;

const DATE_FORMAT: &str = "%Y-%m-%d";

const STARTUP_COLUMNS: &str = "startup_id, name, description, founder, industry, \
     founded_date, status, created_at, updated_at, user_id";

#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`, creating the file if needed.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RegistryError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(connect_opts)
            .await?;
        Ok(Self::new(pool))
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), RegistryError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = strip_sql_comments(stmt);
            if s.is_empty() {
                continue;
            }
            sqlx::query(&s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Open the unit-of-work for one request. Dropping it without
    /// [`UnitOfWork::commit`] rolls everything back.
    pub async fn begin(&self) -> Result<UnitOfWork, RegistryError> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork { tx })
    }

    /// Role stored for a provider identity, if a local user row exists.
    /// Also tells sign-up whether an identity was already registered.
    pub async fn role_for(&self, auth_id: &str) -> Result<Option<String>, RegistryError> {
        let rec: Option<(String,)> = sqlx::query_as("SELECT role FROM users WHERE auth_id = ?")
            .bind(auth_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rec.map(|r| r.0))
    }
}

pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub async fn commit(self) -> Result<(), RegistryError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Insert a local user row. Returns the row id.
    pub async fn insert_user(
        &mut self,
        email: &str,
        auth_id: &str,
        role: &str,
    ) -> Result<i64, RegistryError> {
        let res = sqlx::query("INSERT INTO users (email, auth_id, role) VALUES (?, ?, ?)")
            .bind(email)
            .bind(auth_id)
            .bind(role)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn list_startups(&mut self) -> Result<Vec<DbStartup>, RegistryError> {
        let rows = sqlx::query(&format!(
            "SELECT {STARTUP_COLUMNS} FROM startups ORDER BY startup_id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_startup).collect()
    }

    pub async fn list_startups_by_owner(
        &mut self,
        owner: &str,
    ) -> Result<Vec<DbStartup>, RegistryError> {
        let rows = sqlx::query(&format!(
            "SELECT {STARTUP_COLUMNS} FROM startups WHERE user_id = ? ORDER BY startup_id"
        ))
        .bind(owner)
        .fetch_all(&mut *self.tx)
        .await?;
        rows.into_iter().map(row_to_startup).collect()
    }

    pub async fn get_startup(&mut self, startup_id: i64) -> Result<Option<DbStartup>, RegistryError> {
        let row = sqlx::query(&format!(
            "SELECT {STARTUP_COLUMNS} FROM startups WHERE startup_id = ?"
        ))
        .bind(startup_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.map(row_to_startup).transpose()
    }

    /// Insert a startup stamped with the current time. Returns the new id.
    pub async fn insert_startup(&mut self, new: NewStartup) -> Result<i64, RegistryError> {
        let res = sqlx::query(
            r#"
            INSERT INTO startups (
                name, description, founder, industry, founded_date,
                status, created_at, updated_at, user_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?)
            "#,
        )
        .bind(new.name)
        .bind(new.description)
        .bind(new.founder)
        .bind(new.industry)
        .bind(new.founded_date.map(format_date))
        .bind(new.status)
        .bind(Utc::now().to_rfc3339())
        .bind(new.user_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Write back every mutable column of `startup` and bump `updated_at`.
    pub async fn update_startup(&mut self, startup: &DbStartup) -> Result<(), RegistryError> {
        sqlx::query(
            r#"UPDATE startups SET
                name = ?,
                description = ?,
                founder = ?,
                industry = ?,
                founded_date = ?,
                status = ?,
                updated_at = ?
              WHERE startup_id = ?"#,
        )
        .bind(&startup.name)
        .bind(&startup.description)
        .bind(&startup.founder)
        .bind(&startup.industry)
        .bind(startup.founded_date.map(format_date))
        .bind(&startup.status)
        .bind(Utc::now().to_rfc3339())
        .bind(startup.startup_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    /// Returns whether a row was removed.
    pub async fn delete_startup(&mut self, startup_id: i64) -> Result<bool, RegistryError> {
        let res = sqlx::query("DELETE FROM startups WHERE startup_id = ?")
            .bind(startup_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

fn strip_sql_comments(stmt: &str) -> String {
    stmt.lines()
        .map(|line| line.split("--").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn row_to_startup(row: SqliteRow) -> Result<DbStartup, RegistryError> {
    let startup_id: i64 = row.try_get("startup_id")?;
    let name: String = row.try_get("name")?;
    let description: Option<String> = row.try_get("description")?;
    let founder: Option<String> = row.try_get("founder")?;
    let industry: Option<String> = row.try_get("industry")?;
    let founded_date_str: Option<String> = row.try_get("founded_date")?;
    let status: Option<String> = row.try_get("status")?;
    let created_at_str: String = row.try_get("created_at")?;
    let updated_at_str: Option<String> = row.try_get("updated_at")?;
    let user_id: Option<String> = row.try_get("user_id")?;

    let founded_date = founded_date_str
        .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT))
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    let created_at = parse_timestamp(&created_at_str)?;
    let updated_at = updated_at_str.as_deref().map(parse_timestamp).transpose()?;

    Ok(DbStartup {
        startup_id,
        name,
        description,
        founder,
        industry,
        founded_date,
        status,
        created_at,
        updated_at,
        user_id,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
