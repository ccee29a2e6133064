/// Votes join relation queries
use crate::error::Result;
use crate::models::User;
use sqlx::{FromRow, PgPool};

#[derive(Debug, FromRow)]
struct VoterRow {
    link_id: i32,
    #[sqlx(flatten)]
    user: User,
}

/// Voters of each link in `link_ids`, as `(link_id, user)` pairs ordered by user id
pub async fn find_voters(pool: &PgPool, link_ids: &[i32]) -> Result<Vec<(i32, User)>> {
    if link_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, VoterRow>(
        r#"
        SELECT v.link_id, u.id, u.name, u.email, u.password
        FROM votes v
        JOIN users u ON u.id = v.user_id
        WHERE v.link_id = ANY($1)
        ORDER BY v.link_id, u.id
        "#,
    )
    .bind(link_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| (row.link_id, row.user)).collect())
}

/// Record a vote; returns `false` when the link does not exist
///
/// Voting twice is a no-op.
pub async fn add_vote(pool: &PgPool, link_id: i32, user_id: i32) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO votes (link_id, user_id)
        SELECT id, $2::INTEGER FROM links WHERE id = $1
        ON CONFLICT (link_id, user_id) DO NOTHING
        "#,
    )
    .bind(link_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(true);
    }

    // Nothing inserted: either the vote already existed or the link is gone
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE id = $1)")
        .bind(link_id)
        .fetch_one(pool)
        .await?;

    Ok(exists)
}
