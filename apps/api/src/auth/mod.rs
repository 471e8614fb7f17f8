// Authentication: bcrypt password storage, scoped JWT access/refresh tokens,
// and the `AuthUser` extractor that guards the contacts routes.

pub mod avatar;
pub mod extractor;
pub mod handlers;
pub mod password;
pub mod repository;
pub mod schemas;
pub mod tokens;
