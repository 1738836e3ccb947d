use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};

use crate::tasks::{Task, TaskStatus};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_at: String,
}

impl TaskRow {
    /// Convert to the wire model. Fails only when a row holds a status
    /// outside the enumeration, which validation prevents.
    pub fn into_task(self) -> Result<Task> {
        let status = TaskStatus::parse(&self.status).ok_or_else(|| {
            anyhow::anyhow!("invalid status '{}' in task row {}", self.status, self.id)
        })?;
        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (or create) the default database at `{data_dir}/tasks.db`.
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("tasks.db");
        Self::connect(&format!("sqlite://{}?mode=rwc", db_path.display())).await
    }

    /// Connect to an explicit SQLite connection string (the
    /// `TASKD_DATABASE_URL` override).
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// All tasks, most recent first. The id tiebreak keeps the order
    /// monotonic with insertion when two rows share a timestamp — the
    /// client's prepend-on-create rule relies on this.
    pub async fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM tasks ORDER BY created_at DESC, id DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create_task(
        &self,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Result<TaskRow> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(description)
        .bind(status.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_task(result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("task not found after insert"))
    }

    /// Full replace of the three mutable fields. Returns `None` when no row
    /// matches the id.
    pub async fn update_task(
        &self,
        id: i64,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Result<Option<TaskRow>> {
        let result =
            sqlx::query("UPDATE tasks SET title = ?, description = ?, status = ? WHERE id = ?")
                .bind(title)
                .bind(description)
                .bind(status.as_str())
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id).await
    }

    /// Hard delete. Returns `false` when no row matched.
    pub async fn delete_task(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_tasks(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }

    /// Remove every row. Used by `taskd seed` before inserting demo data.
    pub async fn delete_all_tasks(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
