//! Axum route handlers for the Contacts API. Every handler is scoped to the
//! caller resolved by the `AuthUser` extractor.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::contacts::birthdays::{BirthdayWindow, UpcomingBirthday};
use crate::contacts::repository;
use crate::contacts::schemas::{
    BirthdayQuery, ContactCreate, ContactUpdate, ListQuery, SearchQuery,
};
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::contact::ContactRow;
use crate::state::AppState;
use crate::validation::Validate;

/// GET /api/contacts/
pub async fn handle_list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(params): AppQuery<ListQuery>,
) -> Result<Json<Vec<ContactRow>>, AppError> {
    params.check()?;
    let mut conn = state.db.acquire().await?;
    let contacts =
        repository::list_contacts(&mut conn, user.user_id, params.skip, params.limit).await?;
    Ok(Json(contacts))
}

/// POST /api/contacts/
pub async fn handle_create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(body): AppJson<ContactCreate>,
) -> Result<(StatusCode, Json<ContactRow>), AppError> {
    let body = body.normalized();
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let contact = repository::create_contact(&mut tx, user.user_id, &body).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/contacts/:id
pub async fn handle_get_contact(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ContactRow>, AppError> {
    let mut conn = state.db.acquire().await?;
    let contact = repository::get_contact(&mut conn, user.user_id, id).await?;
    Ok(Json(contact))
}

/// PUT|PATCH /api/contacts/:id
///
/// Both verbs are partial: fields left out of the body keep their value.
pub async fn handle_update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(body): AppJson<ContactUpdate>,
) -> Result<Json<ContactRow>, AppError> {
    let body = body.normalized();
    body.validate()?;

    let mut tx = state.db.begin().await?;
    let contact = repository::update_contact(&mut tx, user.user_id, id, &body).await?;
    tx.commit().await?;

    Ok(Json(contact))
}

/// DELETE /api/contacts/:id
pub async fn handle_delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db.begin().await?;
    repository::delete_contact(&mut tx, user.user_id, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/contacts/search/?query=
pub async fn handle_search_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(params): AppQuery<SearchQuery>,
) -> Result<Json<Vec<ContactRow>>, AppError> {
    let mut conn = state.db.acquire().await?;
    let contacts = repository::search_contacts(&mut conn, user.user_id, &params.query).await?;
    Ok(Json(contacts))
}

/// GET /api/contacts/birthdays/?days=
pub async fn handle_upcoming_birthdays(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(params): AppQuery<BirthdayQuery>,
) -> Result<Json<Vec<UpcomingBirthday>>, AppError> {
    let window = BirthdayWindow::new(Utc::now().date_naive(), params.days)?;

    let mut conn = state.db.acquire().await?;
    let upcoming = repository::list_upcoming_birthdays(&mut conn, user.user_id, window).await?;
    Ok(Json(upcoming))
}
