//! User model for storage and API.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User profile row. The password hash lives in [`UserCredentials`] and is
/// never serialised.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    pub id: i64,
    pub nome: String,
    pub email: String,
    /// Weight in kilograms
    pub peso: f64,
    /// Height in meters
    pub altura: f64,
    pub idade: i64,
    pub avatar_url: Option<String>,
}

/// Fields needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nome: String,
    pub email: String,
    pub password_hash: String,
    pub peso: f64,
    pub altura: f64,
    pub idade: i64,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub nome: Option<String>,
    pub email: Option<String>,
    pub peso: Option<f64>,
    pub altura: Option<f64>,
    pub idade: Option<i64>,
    pub avatar_url: Option<String>,
}

/// Login lookup row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub nome: String,
    pub password_hash: String,
}
