use async_trait::async_trait;
use sqlx::{
    PgPool, Row,
    postgres::{PgConnectOptions, PgPoolOptions, PgRow},
};

use crate::{
    domain::{command::Command, errors::StoreError},
    infrastructure::{CommandStore, CommitReceipt, PendingChange},
};

#[derive(Clone)]
pub struct PostgresCommandStore {
    pool: PgPool,
}

impl PostgresCommandStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(
        options: PgConnectOptions,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        Ok(Self::new(pool))
    }

    /// Creates the `CommandItems` table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|error| StoreError::storage(error.to_string()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CommandStore for PostgresCommandStore {
    async fn list(&self) -> Result<Vec<Command>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT "Id", "HowTo", "Platform", "CommandLine"
            FROM "CommandItems"
            ORDER BY "Id"
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.iter().map(row_to_command).collect())
    }

    async fn find(&self, id: i32) -> Result<Option<Command>, StoreError> {
        let maybe_row = sqlx::query(
            r#"
            SELECT "Id", "HowTo", "Platform", "CommandLine"
            FROM "CommandItems"
            WHERE "Id" = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(maybe_row.as_ref().map(row_to_command))
    }

    async fn apply(&self, changes: Vec<PendingChange>) -> Result<CommitReceipt, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut receipt = CommitReceipt::default();

        for change in changes {
            match change {
                PendingChange::Insert(new_command) => {
                    let row = sqlx::query(
                        r#"
                        INSERT INTO "CommandItems" ("HowTo", "Platform", "CommandLine")
                        VALUES ($1, $2, $3)
                        RETURNING "Id", "HowTo", "Platform", "CommandLine"
                        "#,
                    )
                    .bind(new_command.how_to)
                    .bind(new_command.platform)
                    .bind(new_command.command_line)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                    receipt.inserted.push(row_to_command(&row));
                    receipt.rows_affected += 1;
                }
                PendingChange::Replace(command) => {
                    let result = sqlx::query(
                        r#"
                        UPDATE "CommandItems"
                        SET "HowTo" = $1, "Platform" = $2, "CommandLine" = $3
                        WHERE "Id" = $4
                        "#,
                    )
                    .bind(command.how_to)
                    .bind(command.platform)
                    .bind(command.command_line)
                    .bind(command.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

                    receipt.rows_affected += result.rows_affected();
                }
                PendingChange::Delete(id) => {
                    let result = sqlx::query(r#"DELETE FROM "CommandItems" WHERE "Id" = $1"#)
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(map_sqlx_error)?;

                    receipt.rows_affected += result.rows_affected();
                }
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(receipt)
    }
}

fn row_to_command(row: &PgRow) -> Command {
    Command {
        id: row.get::<i32, _>("Id"),
        how_to: row.get::<String, _>("HowTo"),
        platform: row.get::<String, _>("Platform"),
        command_line: row.get::<String, _>("CommandLine"),
    }
}

fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Database(db_error) => {
            // SQLSTATE class 23: integrity constraint violation
            if db_error.code().is_some_and(|code| code.starts_with("23")) {
                StoreError::Constraint(db_error.to_string())
            } else {
                StoreError::Storage(db_error.to_string())
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(error.to_string())
        }
        other => StoreError::Storage(other.to_string()),
    }
}
