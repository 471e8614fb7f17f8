pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::contacts::handlers as contacts;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth API
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/refresh", post(auth::handle_refresh))
        .route(
            "/api/auth/confirmed_email/:token",
            get(auth::handle_confirm_email),
        )
        .route("/api/auth/request_email", post(auth::handle_request_email))
        .route(
            "/api/auth/request_reset_password",
            post(auth::handle_request_password_reset),
        )
        .route("/api/auth/reset_password", post(auth::handle_reset_password))
        .route("/api/users/me", get(auth::handle_me))
        // Contacts API
        .route(
            "/api/contacts",
            get(contacts::handle_list_contacts).post(contacts::handle_create_contact),
        )
        .route(
            "/api/contacts/",
            get(contacts::handle_list_contacts).post(contacts::handle_create_contact),
        )
        .route("/api/contacts/search", get(contacts::handle_search_contacts))
        .route("/api/contacts/search/", get(contacts::handle_search_contacts))
        .route(
            "/api/contacts/birthdays",
            get(contacts::handle_upcoming_birthdays),
        )
        .route(
            "/api/contacts/birthdays/",
            get(contacts::handle_upcoming_birthdays),
        )
        .route(
            "/api/contacts/:id",
            get(contacts::handle_get_contact)
                .put(contacts::handle_update_contact)
                .patch(contacts::handle_update_contact)
                .delete(contacts::handle_delete_contact),
        )
        .with_state(state)
}
