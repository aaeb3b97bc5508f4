//! Table access for the dispatch entities.
//!
//! A single [`PgRepository`] implementation serves every table; the
//! per-table knowledge (name, column lists, how to bind a payload) lives in
//! the [`Entity`] impls in `db_types`.

use crate::error::AppError;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Postgres};
use std::marker::PhantomData;
use time::OffsetDateTime;
use tracing::{debug, instrument};

pub type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;
pub type PgQueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

/// Row-mapping capability for one table.
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Serialize + Clone + Send + Sync + Unpin + 'static
{
    /// Request payload accepted by create and update.
    type Fields: DeserializeOwned + Send + Sync + 'static;

    /// Schema-qualified table name.
    const TABLE: &'static str;
    /// Every column, `id` first, in row order.
    const COLUMNS: &'static [&'static str];
    /// Columns written on insert, in the order `bind_insert` binds them.
    const INSERT_COLUMNS: &'static [&'static str];
    /// Columns overwritten on update, in the order `bind_update` binds them.
    const UPDATE_COLUMNS: &'static [&'static str];

    fn bind_insert<'q>(
        fields: &'q Self::Fields,
        now: OffsetDateTime,
        query: PgQueryAs<'q, Self>,
    ) -> PgQueryAs<'q, Self>;

    fn bind_update<'q>(
        fields: &'q Self::Fields,
        now: OffsetDateTime,
        query: PgQuery<'q>,
    ) -> PgQuery<'q>;

    fn id(&self) -> i32;

    /// Build the row an insert of `fields` would produce.
    fn assemble(id: i32, fields: &Self::Fields, now: OffsetDateTime) -> Self;

    /// Apply the overwrite an update of `fields` would perform.
    fn overwrite(&mut self, fields: &Self::Fields, now: OffsetDateTime);
}

/// Data access for one entity's table.
///
/// Update and delete report the number of rows affected; a missing id is
/// `Ok(0)`, not an error.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn list(&self) -> Result<Vec<E>, AppError>;
    async fn find(&self, id: i32) -> Result<Option<E>, AppError>;
    async fn create(&self, fields: &E::Fields, now: OffsetDateTime) -> Result<E, AppError>;
    async fn update(
        &self,
        id: i32,
        fields: &E::Fields,
        now: OffsetDateTime,
    ) -> Result<u64, AppError>;
    async fn delete(&self, id: i32) -> Result<u64, AppError>;
}

struct Statements {
    list: String,
    find: String,
    insert: String,
    update: String,
    delete: String,
}

impl Statements {
    fn for_entity<E: Entity>() -> Self {
        let table = E::TABLE;
        let columns = E::COLUMNS.join(", ");
        let placeholders = (1..=E::INSERT_COLUMNS.len())
            .map(|n| format!("${n}"))
            .collect::<Vec<String>>()
            .join(", ");
        let assignments = E::UPDATE_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, column)| format!("{column} = ${}", idx + 1))
            .collect::<Vec<String>>()
            .join(", ");
        let id_param = E::UPDATE_COLUMNS.len() + 1;

        Self {
            list: format!("SELECT {columns} FROM {table} ORDER BY id"),
            find: format!("SELECT {columns} FROM {table} WHERE id = $1"),
            insert: format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders}) RETURNING {columns}",
                E::INSERT_COLUMNS.join(", ")
            ),
            update: format!("UPDATE {table} SET {assignments} WHERE id = ${id_param}"),
            delete: format!("DELETE FROM {table} WHERE id = $1"),
        }
    }
}

/// Postgres-backed repository, one per entity, sharing the process pool.
pub struct PgRepository<E> {
    pool: PgPool,
    statements: Statements,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> PgRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statements: Statements::for_entity::<E>(),
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for PgRepository<E> {
    #[instrument(skip_all, name = "ocm.repo.list", fields(table = E::TABLE))]
    async fn list(&self) -> Result<Vec<E>, AppError> {
        let rows = sqlx::query_as::<_, E>(&self.statements.list)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    #[instrument(skip_all, name = "ocm.repo.find", fields(table = E::TABLE, id = id))]
    async fn find(&self, id: i32) -> Result<Option<E>, AppError> {
        let row = sqlx::query_as::<_, E>(&self.statements.find)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    #[instrument(skip_all, name = "ocm.repo.create", fields(table = E::TABLE))]
    async fn create(&self, fields: &E::Fields, now: OffsetDateTime) -> Result<E, AppError> {
        let query = sqlx::query_as::<_, E>(&self.statements.insert);
        let row = E::bind_insert(fields, now, query)
            .fetch_one(&self.pool)
            .await?;
        debug!(id = row.id(), "inserted row");
        Ok(row)
    }

    #[instrument(skip_all, name = "ocm.repo.update", fields(table = E::TABLE, id = id))]
    async fn update(
        &self,
        id: i32,
        fields: &E::Fields,
        now: OffsetDateTime,
    ) -> Result<u64, AppError> {
        let query = sqlx::query(&self.statements.update);
        let result = E::bind_update(fields, now, query)
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(rows_affected = result.rows_affected(), "updated rows");
        Ok(result.rows_affected())
    }

    #[instrument(skip_all, name = "ocm.repo.delete", fields(table = E::TABLE, id = id))]
    async fn delete(&self, id: i32) -> Result<u64, AppError> {
        let result = sqlx::query(&self.statements.delete)
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(rows_affected = result.rows_affected(), "deleted rows");
        Ok(result.rows_affected())
    }
}
