/// User queries
use crate::error::{ApiError, Result};
use crate::models::{NewUser, User};
use sqlx::PgPool;

/// Insert a user, mapping the email uniqueness violation to `DuplicateEmail`
pub async fn create_user(pool: &PgPool, user: &NewUser) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password)
        VALUES ($1, $2, $3)
        RETURNING id, name, email, password
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .fetch_one(pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => ApiError::DuplicateEmail,
        other => other.into(),
    })
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Batch lookup; missing ids are simply absent from the result
pub async fn find_by_ids(pool: &PgPool, user_ids: &[i32]) -> Result<Vec<User>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let users = sqlx::query_as::<_, User>(
        "SELECT id, name, email, password FROM users WHERE id = ANY($1) ORDER BY id",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(users)
}
