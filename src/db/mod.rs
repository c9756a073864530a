//! Database layer (SQLite via sqlx).

pub mod sqlite;

pub use sqlite::Database;

/// Table names as constants.
pub mod tables {
    pub const USERS: &str = "users";
    pub const DAILY_GOALS: &str = "daily_goals";
    pub const GAMIFICATION: &str = "gamification";
    /// One-time daily awards (keyed by user, day and reason)
    pub const XP_AWARDS: &str = "xp_awards";
    pub const ACHIEVEMENTS: &str = "achievements";
}
