//! Owner-scoped contact queries. Every function takes the connection it runs
//! on, so callers decide whether it is a pooled connection or a transaction.

use sqlx::PgConnection;
use tracing::debug;
use uuid::Uuid;

use crate::contacts::birthdays::{BirthdayWindow, UpcomingBirthday};
use crate::contacts::schemas::{ContactCreate, ContactUpdate};
use crate::errors::{is_unique_violation, AppError};
use crate::models::contact::ContactRow;

fn not_found(contact_id: Uuid) -> AppError {
    AppError::NotFound(format!("Contact {contact_id} not found"))
}

fn email_conflict(email: &str) -> AppError {
    AppError::Conflict(format!("A contact with email {email} already exists"))
}

/// Whether `email` is already used by another of the owner's contacts.
async fn email_taken(
    conn: &mut PgConnection,
    owner_id: Uuid,
    email: &str,
    except: Option<Uuid>,
) -> Result<bool, AppError> {
    let taken: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM contacts
            WHERE user_id = $1 AND lower(email) = lower($2)
              AND ($3::uuid IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(owner_id)
    .bind(email)
    .bind(except)
    .fetch_one(&mut *conn)
    .await?;
    Ok(taken)
}

pub async fn create_contact(
    conn: &mut PgConnection,
    owner_id: Uuid,
    body: &ContactCreate,
) -> Result<ContactRow, AppError> {
    if email_taken(conn, owner_id, &body.email, None).await? {
        return Err(email_conflict(&body.email));
    }

    let contact = sqlx::query_as::<_, ContactRow>(
        r#"
        INSERT INTO contacts
            (id, user_id, first_name, last_name, email, phone_number, birthday, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(&body.email)
    .bind(&body.phone_number)
    .bind(body.birthday)
    .bind(&body.notes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            email_conflict(&body.email)
        } else {
            AppError::Database(e)
        }
    })?;

    debug!("Created contact {} for user {owner_id}", contact.id);
    Ok(contact)
}

pub async fn get_contact(
    conn: &mut PgConnection,
    owner_id: Uuid,
    contact_id: Uuid,
) -> Result<ContactRow, AppError> {
    sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE id = $1 AND user_id = $2")
        .bind(contact_id)
        .bind(owner_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(contact_id))
}

pub async fn list_contacts(
    conn: &mut PgConnection,
    owner_id: Uuid,
    skip: i64,
    limit: i64,
) -> Result<Vec<ContactRow>, AppError> {
    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        SELECT * FROM contacts
        WHERE user_id = $1
        ORDER BY last_name, first_name, id
        OFFSET $2 LIMIT $3
        "#,
    )
    .bind(owner_id)
    .bind(skip)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?)
}

/// Applies only the supplied fields; everything else keeps its stored value.
pub async fn update_contact(
    conn: &mut PgConnection,
    owner_id: Uuid,
    contact_id: Uuid,
    body: &ContactUpdate,
) -> Result<ContactRow, AppError> {
    let existing = get_contact(conn, owner_id, contact_id).await?;
    if body.is_empty() {
        return Ok(existing);
    }

    if let Some(email) = &body.email {
        if email_taken(conn, owner_id, email, Some(contact_id)).await? {
            return Err(email_conflict(email));
        }
    }

    let (notes_supplied, notes) = match &body.notes {
        Some(value) => (true, value.clone()),
        None => (false, None),
    };

    let contact = sqlx::query_as::<_, ContactRow>(
        r#"
        UPDATE contacts SET
            first_name   = COALESCE($3, first_name),
            last_name    = COALESCE($4, last_name),
            email        = COALESCE($5, email),
            phone_number = COALESCE($6, phone_number),
            birthday     = COALESCE($7, birthday),
            notes        = CASE WHEN $8 THEN $9 ELSE notes END,
            updated_at   = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(contact_id)
    .bind(owner_id)
    .bind(&body.first_name)
    .bind(&body.last_name)
    .bind(&body.email)
    .bind(&body.phone_number)
    .bind(body.birthday)
    .bind(notes_supplied)
    .bind(notes)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| match &body.email {
        Some(email) if is_unique_violation(&e) => email_conflict(email),
        _ => AppError::Database(e),
    })?
    .ok_or_else(|| not_found(contact_id))?;

    debug!("Updated contact {contact_id} for user {owner_id}");
    Ok(contact)
}

/// Deleting an id that no longer exists is `NotFound`, not a silent success.
pub async fn delete_contact(
    conn: &mut PgConnection,
    owner_id: Uuid,
    contact_id: Uuid,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
        .bind(contact_id)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(contact_id));
    }

    debug!("Deleted contact {contact_id} for user {owner_id}");
    Ok(())
}

/// Case-insensitive substring match on first name, last name or email.
pub async fn search_contacts(
    conn: &mut PgConnection,
    owner_id: Uuid,
    query: &str,
) -> Result<Vec<ContactRow>, AppError> {
    // Both sides go through Postgres lower() so they fold case the same way
    // regardless of the database collation.
    let needle = query.trim();
    if needle.is_empty() {
        return Err(AppError::Validation("query must not be empty".into()));
    }

    Ok(sqlx::query_as::<_, ContactRow>(
        r#"
        SELECT * FROM contacts
        WHERE user_id = $1
          AND (strpos(lower(first_name), lower($2)) > 0
               OR strpos(lower(last_name), lower($2)) > 0
               OR strpos(lower(email), lower($2)) > 0)
        ORDER BY last_name, first_name, id
        "#,
    )
    .bind(owner_id)
    .bind(needle)
    .fetch_all(&mut *conn)
    .await?)
}

/// The window is already validated by `BirthdayWindow::new`, so a bad
/// length is rejected before this runs any query.
pub async fn list_upcoming_birthdays(
    conn: &mut PgConnection,
    owner_id: Uuid,
    window: BirthdayWindow,
) -> Result<Vec<UpcomingBirthday>, AppError> {
    let contacts =
        sqlx::query_as::<_, ContactRow>("SELECT * FROM contacts WHERE user_id = $1")
            .bind(owner_id)
            .fetch_all(&mut *conn)
            .await?;

    Ok(window.select(contacts))
}
