use sqlx::PgConnection;
use uuid::Uuid;

use crate::errors::{is_unique_violation, AppError};
use crate::models::user::UserRow;

pub async fn find_user_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<UserRow>, AppError> {
    Ok(
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *conn)
            .await?,
    )
}

pub async fn find_user_by_id(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<UserRow>, AppError> {
    Ok(
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?,
    )
}

/// Same as `find_user_by_id` but locks the row until the surrounding
/// transaction ends, so concurrent refreshes serialize on it.
pub async fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<UserRow>, AppError> {
    Ok(
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?,
    )
}

pub async fn create_user(
    conn: &mut PgConnection,
    email: &str,
    password_hash: &str,
    avatar: Option<&str>,
) -> Result<UserRow, AppError> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, email, password_hash, avatar)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(avatar)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Account with this email already exists".into())
        } else {
            AppError::Database(e)
        }
    })
}

pub async fn set_refresh_token(
    conn: &mut PgConnection,
    user_id: Uuid,
    token: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET refresh_token = $2 WHERE id = $1")
        .bind(user_id)
        .bind(token)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Marks the address as verified. Returns `false` when it already was.
pub async fn confirm_email(conn: &mut PgConnection, user_id: Uuid) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE users SET email_verified = TRUE WHERE id = $1 AND NOT email_verified",
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Stores a new hash, stamps `password_changed_at` and drops the stored
/// refresh token so existing sessions cannot be refreshed.
pub async fn update_password(
    conn: &mut PgConnection,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $2, password_changed_at = now(), refresh_token = NULL
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_email_is_globally_unique(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        create_user(&mut conn, "ann@example.com", "hash", None)
            .await
            .unwrap();
        assert!(matches!(
            create_user(&mut conn, "ann@example.com", "hash", None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_refresh_token_roundtrip(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_user(&mut conn, "ann@example.com", "hash", Some("https://avatar"))
            .await
            .unwrap();
        assert_eq!(user.refresh_token, None);

        set_refresh_token(&mut conn, user.id, Some("tok")).await.unwrap();
        let stored = find_user_by_email(&mut conn, "ann@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.refresh_token.as_deref(), Some("tok"));

        set_refresh_token(&mut conn, user.id, None).await.unwrap();
        let cleared = find_user_by_id(&mut conn, user.id).await.unwrap().unwrap();
        assert_eq!(cleared.refresh_token, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_confirm_email_once(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_user(&mut conn, "ann@example.com", "hash", None)
            .await
            .unwrap();
        assert!(!user.email_verified);

        assert!(confirm_email(&mut conn, user.id).await.unwrap());
        assert!(!confirm_email(&mut conn, user.id).await.unwrap());
        let stored = find_user_by_id(&mut conn, user.id).await.unwrap().unwrap();
        assert!(stored.email_verified);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_update_password_revokes_refresh_token(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_user(&mut conn, "ann@example.com", "old", None)
            .await
            .unwrap();
        set_refresh_token(&mut conn, user.id, Some("tok")).await.unwrap();

        update_password(&mut conn, user.id, "new").await.unwrap();
        let stored = find_user_by_id(&mut conn, user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new");
        assert_eq!(stored.refresh_token, None);
        assert!(stored.password_changed_at.is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn test_deleting_user_cascades_to_contacts(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user = create_user(&mut conn, "ann@example.com", "hash", None)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO contacts (id, user_id, first_name, last_name, email, phone_number, birthday)
             VALUES ($1, $2, 'Bo', 'Li', 'bo@example.com', '555', '1990-01-01')",
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .execute(&mut *conn)
        .await
        .unwrap();

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
