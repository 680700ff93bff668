// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use validator::Validate;

use super::{ItemStore, status_conflict};
use crate::{
    error::{AppError, AppResult},
    models::{
        item::{ContactInfo, Item},
        request::{ItemPatch, NewItem, normalize_tags},
    },
    services::{
        query::{ItemFilter, ItemQuery, Page, PaginationMeta, SortField, SortOrder},
        stats::ItemStats,
    },
};

const COLUMNS: &str = "id, item_type, item_name, category, location, description, \
     reported_by, reported_by_name, contact_email, contact_phone, status, images, \
     admin_notes, claimed_by, claimed_at, resolved_at, is_active, priority, tags, \
     view_count, created_at, updated_at";

/// Postgres-backed `ItemStore`. Filtering, sorting, paging and counting run in SQL.
#[derive(Debug, Clone)]
pub struct PgItemStore {
    pool: PgPool,
}

impl PgItemStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    item_type: String,
    item_name: String,
    category: String,
    location: String,
    description: String,
    reported_by: String,
    reported_by_name: String,
    contact_email: String,
    contact_phone: Option<String>,
    status: String,
    images: Vec<String>,
    admin_notes: Option<String>,
    claimed_by: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
    resolved_at: Option<DateTime<Utc>>,
    is_active: bool,
    priority: String,
    tags: Vec<String>,
    view_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = AppError;

    /// Enum columns are plain text; a value outside the known set means the
    /// table was written by something else.
    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let corrupt = |e: AppError| AppError::InternalServerError(format!("row {}: {}", row.id, e));
        Ok(Item {
            id: row.id,
            item_type: row.item_type.parse().map_err(corrupt)?,
            item_name: row.item_name,
            category: row.category.parse().map_err(corrupt)?,
            location: row.location,
            description: row.description,
            reported_by: row.reported_by,
            reported_by_name: row.reported_by_name,
            contact_info: ContactInfo {
                email: row.contact_email,
                phone: row.contact_phone,
            },
            status: row.status.parse().map_err(corrupt)?,
            images: row.images,
            admin_notes: row.admin_notes,
            claimed_by: row.claimed_by,
            claimed_at: row.claimed_at,
            resolved_at: row.resolved_at,
            is_active: row.is_active,
            priority: row.priority.parse().map_err(corrupt)?,
            tags: row.tags,
            view_count: row.view_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> AppResult<Vec<Item>> {
    rows.into_iter().map(Item::try_from).collect()
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Item {} not found", id))
}

/// Escapes LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
        SortField::ItemName => "item_name",
        SortField::Type => "item_type",
        SortField::Category => "category",
        SortField::Location => "location",
        SortField::Status => "status",
        SortField::Priority => "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END",
        SortField::ViewCount => "view_count",
    }
}

/// Appends `WHERE is_active AND ...` for `filter`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ItemFilter) {
    builder.push(" WHERE is_active = TRUE");
    if let Some(item_type) = filter.item_type {
        builder.push(" AND item_type = ");
        builder.push_bind(item_type.as_str());
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ");
        builder.push_bind(category.as_str());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder.push(" AND (item_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR location ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

fn push_order(builder: &mut QueryBuilder<'_, Postgres>, field: SortField, order: SortOrder) {
    let direction = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    builder.push(format!(
        " ORDER BY {} {}, id ASC",
        sort_column(field),
        direction
    ));
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn create(&self, input: NewItem) -> AppResult<Item> {
        input.validate()?;
        let tags = normalize_tags(input.tags.clone());

        let row: ItemRow = sqlx::query_as(&format!(
            "INSERT INTO lost_found_items \
             (id, item_type, item_name, category, location, description, reported_by, \
              reported_by_name, contact_email, contact_phone, images, priority, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.item_type.as_str())
        .bind(&input.item_name)
        .bind(input.category.as_str())
        .bind(&input.location)
        .bind(&input.description)
        .bind(&input.reported_by)
        .bind(&input.reported_by_name)
        .bind(&input.contact_info.email)
        .bind(&input.contact_info.phone)
        .bind(&input.images)
        .bind(input.priority.as_str())
        .bind(tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert item: {:?}", e);
            AppError::from(e)
        })?;

        tracing::info!(item_id = %row.id, "Created item");
        row.try_into()
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Item> {
        let row: Option<ItemRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM lost_found_items WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or_else(|| not_found(id))?.try_into()
    }

    async fn list_all(&self) -> AppResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM lost_found_items"))
            .fetch_all(&self.pool)
            .await?;
        into_items(rows)
    }

    async fn update(&self, id: Uuid, patch: ItemPatch) -> AppResult<Item> {
        patch.validate()?;
        let expected_status = patch.expected_status;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE lost_found_items SET ");
        let mut separated = builder.separated(", ");

        if let Some(item_name) = patch.item_name {
            separated.push("item_name = ");
            separated.push_bind_unseparated(item_name);
        }
        if let Some(category) = patch.category {
            separated.push("category = ");
            separated.push_bind_unseparated(category.as_str());
        }
        if let Some(location) = patch.location {
            separated.push("location = ");
            separated.push_bind_unseparated(location);
        }
        if let Some(description) = patch.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(images) = patch.images {
            separated.push("images = ");
            separated.push_bind_unseparated(images);
        }
        if let Some(tags) = patch.tags {
            separated.push("tags = ");
            separated.push_bind_unseparated(tags);
        }
        if let Some(priority) = patch.priority {
            separated.push("priority = ");
            separated.push_bind_unseparated(priority.as_str());
        }
        if let Some(status) = patch.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }
        if let Some(admin_notes) = patch.admin_notes {
            separated.push("admin_notes = ");
            separated.push_bind_unseparated(admin_notes);
        }
        if let Some(claimed_by) = patch.claimed_by {
            separated.push("claimed_by = ");
            separated.push_bind_unseparated(claimed_by);
        }
        if let Some(claimed_at) = patch.claimed_at {
            separated.push("claimed_at = COALESCE(claimed_at, ");
            separated.push_bind_unseparated(claimed_at);
            separated.push_unseparated(")");
        }
        if let Some(resolved_at) = patch.resolved_at {
            separated.push("resolved_at = COALESCE(resolved_at, ");
            separated.push_bind_unseparated(resolved_at);
            separated.push_unseparated(")");
        }
        if let Some(is_active) = patch.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }
        separated.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        if let Some(expected) = expected_status {
            builder.push(" AND status = ");
            builder.push_bind(expected.as_str());
        }
        builder.push(format!(" RETURNING {COLUMNS}"));

        let row: Option<ItemRow> = builder
            .build_query_as::<ItemRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update item {}: {:?}", id, e);
                AppError::from(e)
            })?;

        match (row, expected_status) {
            (Some(row), _) => row.try_into(),
            // The row exists but moved on since the caller read it.
            (None, Some(expected)) => {
                self.get_by_id(id).await?;
                Err(status_conflict(id, expected))
            }
            (None, None) => Err(not_found(id)),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM lost_found_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<Item> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "UPDATE lost_found_items \
             SET view_count = view_count + 1, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| not_found(id))?.try_into()
    }

    async fn find(&self, query: &ItemQuery) -> AppResult<Page> {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM lost_found_items");
        push_filter(&mut count, &query.filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM lost_found_items"));
        push_filter(&mut select, &query.filter);
        push_order(&mut select, query.sort_by, query.sort_order);
        select.push(" LIMIT ");
        select.push_bind(i64::from(query.limit));
        select.push(" OFFSET ");
        select.push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));

        let rows: Vec<ItemRow> = select.build_query_as::<ItemRow>().fetch_all(&self.pool).await?;

        Ok(Page {
            items: into_items(rows)?,
            pagination: PaginationMeta::new(
                query.page,
                query.limit,
                u64::try_from(total).unwrap_or_default(),
            ),
        })
    }

    async fn find_matching(&self, filter: &ItemFilter) -> AppResult<Vec<Item>> {
        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM lost_found_items"));
        push_filter(&mut select, filter);
        push_order(&mut select, SortField::CreatedAt, SortOrder::Desc);

        let rows: Vec<ItemRow> = select.build_query_as::<ItemRow>().fetch_all(&self.pool).await?;
        into_items(rows)
    }

    async fn list_by_reporter(&self, user_id: &str) -> AppResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM lost_found_items \
             WHERE reported_by = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        into_items(rows)
    }

    async fn stats(&self) -> AppResult<ItemStats> {
        let (total, lost, found, pending, resolved): (i64, i64, i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
                    COUNT(*) FILTER (WHERE item_type = 'lost'), \
                    COUNT(*) FILTER (WHERE item_type = 'found'), \
                    COUNT(*) FILTER (WHERE status = 'pending'), \
                    COUNT(*) FILTER (WHERE status IN ('claimed', 'resolved')) \
             FROM lost_found_items WHERE is_active = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        let count = |n: i64| u64::try_from(n).unwrap_or_default();
        Ok(ItemStats {
            total: count(total),
            lost: count(lost),
            found: count(found),
            pending: count(pending),
            resolved: count(resolved),
        })
    }
}
