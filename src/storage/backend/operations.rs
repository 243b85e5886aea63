//! `UrlStore` operations for `SeaOrmStore`

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

use super::SeaOrmStore;
use crate::errors::{Result, ShortenerError};
use crate::storage::{KeyEncoder, UrlRecord, UrlStore};

use migration::entities::url;

/// Outcome of the conditional key update.
#[derive(Debug, PartialEq, Eq)]
enum KeyAssignment {
    Assigned,
    AlreadySet,
    Missing,
    Conflict(Option<String>),
}

impl KeyAssignment {
    fn is_success(&self) -> bool {
        matches!(self, KeyAssignment::Assigned | KeyAssignment::AlreadySet)
    }

    fn into_result(self, id: u64, key: &str) -> Result<()> {
        match self {
            KeyAssignment::Assigned | KeyAssignment::AlreadySet => Ok(()),
            KeyAssignment::Missing => Err(ShortenerError::consistency(format!(
                "record {} vanished before key '{}' could be assigned",
                id, key
            ))),
            KeyAssignment::Conflict(existing) => Err(ShortenerError::consistency(format!(
                "record {} already holds key {:?}, refusing to assign '{}'",
                id, existing, key
            ))),
        }
    }
}

fn to_record(model: url::Model) -> Result<UrlRecord> {
    let id = u64::try_from(model.id).map_err(|_| {
        ShortenerError::consistency(format!("store returned negative id {}", model.id))
    })?;
    Ok(UrlRecord {
        id,
        original_url: model.original_url,
        short_key: model.short_key,
        clicks: model.clicks,
        created_at: model.created_at,
    })
}

fn to_db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| ShortenerError::validation(format!("id {} out of range", id)))
}

fn operation_error(operation: &str, err: DbErr) -> ShortenerError {
    ShortenerError::database_operation(format!("{} failed: {}", operation, err))
}

async fn insert_row<C: ConnectionTrait>(conn: &C, original_url: &str) -> std::result::Result<url::Model, DbErr> {
    url::ActiveModel {
        original_url: Set(original_url.to_owned()),
        short_key: Set(None),
        clicks: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

/// `UPDATE urls SET short_key = ? WHERE id = ? AND short_key IS NULL`, then
/// classify a zero row count by re-reading the row.
async fn assign_key<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    key: &str,
) -> std::result::Result<KeyAssignment, DbErr> {
    let updated = url::Entity::update_many()
        .col_expr(url::Column::ShortKey, Expr::value(key.to_owned()))
        .filter(url::Column::Id.eq(id))
        .filter(url::Column::ShortKey.is_null())
        .exec(conn)
        .await?;

    if updated.rows_affected == 1 {
        return Ok(KeyAssignment::Assigned);
    }

    let assignment = match url::Entity::find_by_id(id).one(conn).await? {
        None => KeyAssignment::Missing,
        Some(row) if row.short_key.as_deref() == Some(key) => KeyAssignment::AlreadySet,
        Some(row) => KeyAssignment::Conflict(row.short_key),
    };
    Ok(assignment)
}

#[async_trait]
impl UrlStore for SeaOrmStore {
    fn name(&self) -> &str {
        &self.label
    }

    async fn insert(&self, original_url: &str) -> Result<UrlRecord> {
        self.ensure_writable()?;
        let db = &self.db;

        let model = self
            .retry
            .run("insert", || insert_row(db, original_url))
            .await
            .map_err(|e| operation_error("insert", e))?;

        debug!("Inserted record {} on '{}'", model.id, self.label);
        to_record(model)
    }

    async fn update_short_key(&self, id: u64, short_key: &str) -> Result<()> {
        self.ensure_writable()?;
        let db = &self.db;
        let db_id = to_db_id(id)?;

        self.retry
            .run("update_short_key", || assign_key(db, db_id, short_key))
            .await
            .map_err(|e| operation_error("update_short_key", e))?
            .into_result(id, short_key)
    }

    async fn find_by_key(&self, short_key: &str) -> Result<Option<UrlRecord>> {
        let db = &self.db;
        let key = short_key.to_owned();

        let model = self
            .retry
            .run("find_by_key", || {
                url::Entity::find()
                    .filter(url::Column::ShortKey.eq(key.clone()))
                    .one(db)
            })
            .await
            .map_err(|e| operation_error("find_by_key", e))?;

        model.map(to_record).transpose()
    }

    /// Insert and key update inside one transaction, so no unkeyed row is
    /// ever committed.
    async fn create_with_key(&self, original_url: &str, encoder: KeyEncoder) -> Result<UrlRecord> {
        self.ensure_writable()?;
        let db = &self.db;

        let (model, key, assignment) = self
            .retry
            .run("create_with_key", || async {
                let txn = db.begin().await?;
                let model = insert_row(&txn, original_url).await?;
                let id = u64::try_from(model.id)
                    .map_err(|_| DbErr::Custom(format!("negative id {}", model.id)))?;
                let key = encoder(id);
                let assignment = assign_key(&txn, model.id, &key).await?;

                if assignment.is_success() {
                    txn.commit().await?;
                } else {
                    txn.rollback().await?;
                }
                Ok::<_, DbErr>((model, key, assignment))
            })
            .await
            .map_err(|e| operation_error("create_with_key", e))?;

        let mut record = to_record(model)?;
        assignment.into_result(record.id, &key)?;
        record.short_key = Some(key);
        Ok(record)
    }

    async fn find_unkeyed(&self, limit: u64) -> Result<Vec<UrlRecord>> {
        let db = &self.db;

        let models = self
            .retry
            .run("find_unkeyed", || {
                url::Entity::find()
                    .filter(url::Column::ShortKey.is_null())
                    .order_by_asc(url::Column::Id)
                    .limit(limit)
                    .all(db)
            })
            .await
            .map_err(|e| operation_error("find_unkeyed", e))?;

        if !models.is_empty() {
            info!("Found {} unkeyed records on '{}'", models.len(), self.label);
        }
        models.into_iter().map(to_record).collect()
    }

    async fn list_keys(&self, after_id: u64, limit: u64) -> Result<Vec<(u64, String)>> {
        let db = &self.db;
        let after = to_db_id(after_id)?;

        let models = self
            .retry
            .run("list_keys", || {
                url::Entity::find()
                    .filter(url::Column::Id.gt(after))
                    .filter(url::Column::ShortKey.is_not_null())
                    .order_by_asc(url::Column::Id)
                    .limit(limit)
                    .all(db)
            })
            .await
            .map_err(|e| operation_error("list_keys", e))?;

        Ok(models
            .into_iter()
            .filter_map(|m| {
                let id = u64::try_from(m.id).ok()?;
                m.short_key.map(|key| (id, key))
            })
            .collect())
    }
}
