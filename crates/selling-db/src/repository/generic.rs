//! # Generic Repository
//!
//! The single [`Repository`] implementation shared by every entity type
//! and every backend, plus the row-level SQL helpers it is built from.
//!
//! ## Generated SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  T::TABLE = tb_product, T::COLUMNS = [code, name, ...]                  │
//! │                                                                         │
//! │  insert   INSERT INTO tb_product (code, name, ...) VALUES (?, ?, ...)   │
//! │  merge    INSERT INTO tb_product (id, code, ...) VALUES (?, ?, ...)     │
//! │             ON CONFLICT(id) DO UPDATE SET code = excluded.code, ...     │
//! │  delete   DELETE FROM tb_product WHERE id = ?                           │
//! │  select   SELECT id, code, name, ... FROM tb_product [WHERE id = ?]     │
//! │             ORDER BY id                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Merge is an upsert on the primary key: no version check, the last
//! committed write wins.

use async_trait::async_trait;
use selling_core::validation::validate_id;
use sqlx::SqliteConnection;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

use super::{Persistable, Repository};
use crate::config::{BackendConfig, BackendId};
use crate::error::{
    DbError, DbResult, DELETE_FAILED, FIND_ALL_FAILED, FIND_FAILED, REGISTER_FAILED,
    UPDATE_FAILED,
};
use crate::scope::ResourceScope;

// =============================================================================
// SQL Generation
// =============================================================================

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn insert_sql<T: Persistable>(with_id: bool) -> String {
    let (id_column, id_placeholder) = if with_id { ("id, ", "?, ") } else { ("", "") };
    format!(
        "INSERT INTO {} ({}{}) VALUES ({}{})",
        T::TABLE,
        id_column,
        T::COLUMNS.join(", "),
        id_placeholder,
        placeholders(T::COLUMNS.len())
    )
}

pub(crate) fn merge_sql<T: Persistable>() -> String {
    let assignments = T::COLUMNS
        .iter()
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{} ON CONFLICT(id) DO UPDATE SET {}",
        insert_sql::<T>(true),
        assignments
    )
}

pub(crate) fn select_sql<T: Persistable>() -> String {
    format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
}

// =============================================================================
// Row Operations
// =============================================================================
// These run inside an open scope and report raw sqlx errors; the scope
// turns them into Storage errors.

/// Inserts the entity (with its id if it carries one), assigns the stored
/// id and writes owned rows.
pub(crate) async fn insert_row<T: Persistable>(
    conn: &mut SqliteConnection,
    entity: &mut T,
) -> Result<(), sqlx::Error> {
    let id = entity.id();
    let sql = insert_sql::<T>(id.is_some());
    let query = match id {
        Some(id) => sqlx::query(&sql).bind(id),
        None => sqlx::query(&sql),
    };

    let result = entity.bind_columns(query).execute(&mut *conn).await?;
    entity.set_id(result.last_insert_rowid());
    entity.persist_owned(conn).await
}

/// Upserts an entity that has an id, inserts one that has none.
pub(crate) async fn merge_row<T: Persistable>(
    conn: &mut SqliteConnection,
    entity: &mut T,
) -> Result<(), sqlx::Error> {
    let Some(id) = entity.id() else {
        return insert_row(conn, entity).await;
    };

    let sql = merge_sql::<T>();
    entity
        .bind_columns(sqlx::query(&sql).bind(id))
        .execute(&mut *conn)
        .await?;
    entity.persist_owned(conn).await
}

/// Re-attaches the entity, then removes its owned rows and its own row.
pub(crate) async fn delete_row<T: Persistable>(
    conn: &mut SqliteConnection,
    entity: &mut T,
) -> Result<(), sqlx::Error> {
    merge_row(conn, entity).await?;
    entity.remove_owned(conn).await?;

    let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
    sqlx::query(&sql)
        .bind(entity.id())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn select_by_id<T: Persistable>(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<T>, sqlx::Error> {
    let sql = format!("{} WHERE id = ?", select_sql::<T>());
    let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *conn).await?;

    match row {
        Some(row) => {
            let mut entity = T::from_row(&row)?;
            entity.load_owned(conn).await?;
            Ok(Some(entity))
        }
        None => Ok(None),
    }
}

pub(crate) async fn select_all<T: Persistable>(
    conn: &mut SqliteConnection,
) -> Result<Vec<T>, sqlx::Error> {
    let sql = format!("{} ORDER BY id", select_sql::<T>());
    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    let mut entities = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut entity = T::from_row(row)?;
        entity.load_owned(conn).await?;
        entities.push(entity);
    }
    Ok(entities)
}

// =============================================================================
// Parameter Checks
// =============================================================================

/// The identifier an update or delete targets.
pub(crate) fn required_id<T: Persistable>(entity: &T, action: &str) -> DbResult<i64> {
    let id = entity.id().ok_or_else(|| {
        DbError::parameter(format!(
            "Cannot {} a {} without an identifier.",
            action,
            T::ENTITY
        ))
    })?;
    validate_id(id)?;
    Ok(id)
}

// =============================================================================
// Generic Repository
// =============================================================================

/// Repository for any [`Persistable`] entity on one backend.
///
/// ## Usage
/// ```rust,ignore
/// let clients: GenericRepository<Client> = GenericRepository::new(backend);
///
/// let client = clients.register(client).await?;
/// let found = clients.find_by_id(client.id.unwrap()).await?;
/// ```
pub struct GenericRepository<T> {
    config: BackendConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T> GenericRepository<T> {
    /// Creates a repository bound to `config` for its whole lifetime.
    pub fn new(config: BackendConfig) -> Self {
        GenericRepository {
            config,
            _entity: PhantomData,
        }
    }

    pub fn backend(&self) -> BackendId {
        self.config.id
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl<T> Clone for GenericRepository<T> {
    fn clone(&self) -> Self {
        GenericRepository::new(self.config.clone())
    }
}

impl<T> fmt::Debug for GenericRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericRepository")
            .field("entity", &std::any::type_name::<T>())
            .field("backend", &self.config.id)
            .finish()
    }
}

#[async_trait]
impl<T: Persistable> Repository<T, i64> for GenericRepository<T> {
    async fn register(&self, mut entity: T) -> DbResult<T> {
        entity.validate()?;

        debug!(entity = T::ENTITY, backend = %self.config.id, "Registering entity");

        let mut scope = ResourceScope::open(&self.config).await?;
        let outcome = insert_row(scope.connection(), &mut entity).await;
        scope.finish(outcome, REGISTER_FAILED).await?;

        debug!(entity = T::ENTITY, id = ?entity.id(), "Entity registered");
        Ok(entity)
    }

    async fn update(&self, mut entity: T) -> DbResult<T> {
        entity.validate()?;
        let id = required_id(&entity, "update")?;

        debug!(entity = T::ENTITY, id = %id, backend = %self.config.id, "Updating entity");

        let mut scope = ResourceScope::open(&self.config).await?;
        let outcome = merge_row(scope.connection(), &mut entity).await;
        scope.finish(outcome, UPDATE_FAILED).await?;

        Ok(entity)
    }

    async fn delete(&self, entity: &T) -> DbResult<()> {
        let id = required_id(entity, "delete")?;
        entity.validate()?;

        debug!(entity = T::ENTITY, id = %id, backend = %self.config.id, "Deleting entity");

        // the merge step may assign ids to owned rows
        let mut entity = entity.clone();
        let mut scope = ResourceScope::open(&self.config).await?;
        let outcome = delete_row(scope.connection(), &mut entity).await;
        scope.finish(outcome, DELETE_FAILED).await
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<T>> {
        validate_id(id)?;

        debug!(entity = T::ENTITY, id = %id, backend = %self.config.id, "Finding entity");

        let mut scope = ResourceScope::open(&self.config).await?;
        let outcome = select_by_id::<T>(scope.connection(), id).await;
        scope.finish(outcome, FIND_FAILED).await
    }

    async fn find_all(&self) -> DbResult<Vec<T>> {
        debug!(entity = T::ENTITY, backend = %self.config.id, "Fetching all entities");

        let mut scope = ResourceScope::open(&self.config).await?;
        let outcome = select_all::<T>(scope.connection()).await;
        let entities = scope.finish(outcome, FIND_ALL_FAILED).await?;

        debug!(entity = T::ENTITY, count = entities.len(), "Fetched entities");
        Ok(entities)
    }
}
