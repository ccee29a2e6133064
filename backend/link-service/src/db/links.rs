/// Link queries
use crate::error::Result;
use crate::models::{FeedQuery, Link, LinkChanges, NewLink};
use sqlx::{PgPool, Postgres, QueryBuilder};

const LINK_COLUMNS: &str = "id, description, url, created_at, posted_by_id";

/// Append the feed's substring filter
///
/// `strpos` keeps the match literal: `%` and `_` in the filter are not
/// wildcards.
fn push_filter<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a FeedQuery) {
    if let Some(filter) = query.filter.as_deref() {
        builder
            .push(" WHERE (strpos(description, ")
            .push_bind(filter)
            .push(") > 0 OR strpos(url, ")
            .push_bind(filter)
            .push(") > 0)");
    }
}

pub async fn create_link(pool: &PgPool, link: &NewLink) -> Result<Link> {
    let link = sqlx::query_as::<_, Link>(
        r#"
        INSERT INTO links (description, url, posted_by_id)
        VALUES ($1, $2, $3)
        RETURNING id, description, url, created_at, posted_by_id
        "#,
    )
    .bind(&link.description)
    .bind(&link.url)
    .bind(link.posted_by_id)
    .fetch_one(pool)
    .await?;

    Ok(link)
}

pub async fn find_by_id(pool: &PgPool, link_id: i32) -> Result<Option<Link>> {
    let link = sqlx::query_as::<_, Link>(
        "SELECT id, description, url, created_at, posted_by_id FROM links WHERE id = $1",
    )
    .bind(link_id)
    .fetch_optional(pool)
    .await?;

    Ok(link)
}

/// SELECT for one page of the filtered, ordered feed
///
/// Explicit keys come first and `id ASC` always breaks ties.
fn feed_query(query: &FeedQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {LINK_COLUMNS} FROM links"));
    push_filter(&mut builder, query);

    builder.push(" ORDER BY ");
    for order in &query.order_by {
        builder
            .push(order.field.column())
            .push(" ")
            .push(order.direction.as_sql())
            .push(", ");
    }
    builder.push("id ASC");

    if let Some(take) = query.take {
        builder.push(" LIMIT ").push_bind(take);
    }
    if let Some(skip) = query.skip {
        builder.push(" OFFSET ").push_bind(skip);
    }

    builder
}

/// COUNT over the filtered set; pagination and ordering are ignored
fn count_query(query: &FeedQuery) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM links");
    push_filter(&mut builder, query);
    builder
}

pub async fn find_feed(pool: &PgPool, query: &FeedQuery) -> Result<Vec<Link>> {
    let links = feed_query(query).build_query_as::<Link>().fetch_all(pool).await?;
    Ok(links)
}

pub async fn count_feed(pool: &PgPool, query: &FeedQuery) -> Result<i64> {
    let count = count_query(query).build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}

pub async fn update_link(pool: &PgPool, link_id: i32, changes: &LinkChanges) -> Result<Option<Link>> {
    let link = sqlx::query_as::<_, Link>(
        r#"
        UPDATE links
        SET description = $2, url = $3
        WHERE id = $1
        RETURNING id, description, url, created_at, posted_by_id
        "#,
    )
    .bind(link_id)
    .bind(&changes.description)
    .bind(&changes.url)
    .fetch_optional(pool)
    .await?;

    Ok(link)
}

/// Delete a link; votes on it go with it (ON DELETE CASCADE)
pub async fn delete_link(pool: &PgPool, link_id: i32) -> Result<bool> {
    let result = sqlx::query("DELETE FROM links WHERE id = $1")
        .bind(link_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Links posted by any of `user_ids`, ordered by id
pub async fn find_by_posters(pool: &PgPool, user_ids: &[i32]) -> Result<Vec<Link>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let links = sqlx::query_as::<_, Link>(
        r#"
        SELECT id, description, url, created_at, posted_by_id
        FROM links
        WHERE posted_by_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(links)
}
