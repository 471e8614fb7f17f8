// Contacts: owner-scoped CRUD, search and the upcoming-birthday window.

pub mod birthdays;
pub mod handlers;
pub mod repository;
pub mod schemas;
