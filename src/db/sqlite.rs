// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite store with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile and credentials)
//! - Hydration and calorie records (append-only)
//! - Daily goals (one row per user and day)
//! - Gamification state, the award ledger and achievements

use crate::db::tables;
use crate::error::AppError;
use crate::models::goal::DailyGoalRow;
use crate::models::record::RecordRow;
use crate::models::{
    DailyGoal, NewUser, ProfileUpdate, Record, RecordKind, User, UserCredentials,
};
use crate::services::gamification::{Achievement, GamificationState, XpEvent};
use crate::time_utils::{to_millis, DayWindow};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqliteExecutor};
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    nome          TEXT    NOT NULL,
    email         TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    peso          REAL    NOT NULL,
    altura        REAL    NOT NULL,
    idade         INTEGER NOT NULL,
    avatar_url    TEXT,
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS hydration_records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    amount      REAL    NOT NULL CHECK (amount > 0),
    recorded_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hydration_user_time
    ON hydration_records (user_id, recorded_at);

CREATE TABLE IF NOT EXISTS calorie_records (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    amount      REAL    NOT NULL CHECK (amount > 0),
    recorded_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_calorie_user_time
    ON calorie_records (user_id, recorded_at);

CREATE TABLE IF NOT EXISTS daily_goals (
    user_id    INTEGER NOT NULL REFERENCES users(id),
    goal_date  TEXT    NOT NULL,
    meta_hid   REAL    NOT NULL,
    meta_cal   REAL    NOT NULL,
    meta_peso  REAL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, goal_date)
);

CREATE TABLE IF NOT EXISTS gamification (
    user_id        INTEGER PRIMARY KEY REFERENCES users(id),
    xp             INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
    streak         INTEGER NOT NULL DEFAULT 0 CHECK (streak >= 0),
    last_login_day TEXT
);

CREATE TABLE IF NOT EXISTS xp_awards (
    user_id    INTEGER NOT NULL REFERENCES users(id),
    award_date TEXT    NOT NULL,
    reason     TEXT    NOT NULL,
    xp         INTEGER NOT NULL,
    awarded_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, award_date, reason)
);

CREATE TABLE IF NOT EXISTS achievements (
    user_id     INTEGER NOT NULL REFERENCES users(id),
    code        TEXT    NOT NULL,
    unlocked_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, code)
);
"#;

/// SQLite database client.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct GamificationRow {
    xp: i64,
    streak: i64,
    last_login_day: Option<String>,
}

impl Database {
    /// Connect to the database at `url` and apply the schema.
    ///
    /// File databases use WAL journaling and a busy timeout so that
    /// concurrent writers queue instead of failing.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Persistence(format!("Invalid DATABASE_URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to open database: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        tracing::info!(url, "Connected to SQLite");
        Ok(db)
    }

    /// Create a private in-memory database (tests and local experiments).
    ///
    /// The pool holds a single connection that never expires, because every
    /// SQLite connection to `:memory:` sees its own database.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Persistence(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Persistence(format!("Failed to open database: {}", e)))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Create all tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Schema migration failed: {}", e)))?;
        Ok(())
    }

    /// Run a trivial query to confirm the store answers.
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user together with an empty gamification row.
    ///
    /// Returns [`AppError::Conflict`] if the email is already registered.
    pub async fn create_user(&self, user: &NewUser, now: DateTime<Utc>) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (nome, email, password_hash, peso, altura, idade, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
            tables::USERS
        ))
        .bind(&user.nome)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.peso)
        .bind(user.altura)
        .bind(user.idade)
        .bind(to_millis(now))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, "Email already registered"))?;

        sqlx::query(&format!(
            "INSERT INTO {} (user_id) VALUES (?)",
            tables::GAMIFICATION
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(user_id = id, "User created");
        Ok(id)
    }

    /// Get a user profile by ID.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT id, nome, email, peso, altura, idade, avatar_url FROM {} WHERE id = ?",
            tables::USERS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Look up login credentials by email.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let credentials = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT id, nome, password_hash FROM {} WHERE email = ?",
            tables::USERS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credentials)
    }

    /// Apply a partial profile update and return the updated profile.
    ///
    /// Returns `None` if the user does not exist and [`AppError::Conflict`] if
    /// the new email belongs to another user.
    pub async fn update_profile(
        &self,
        user_id: i64,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE {} SET \
                 nome = COALESCE(?, nome), \
                 email = COALESCE(?, email), \
                 peso = COALESCE(?, peso), \
                 altura = COALESCE(?, altura), \
                 idade = COALESCE(?, idade), \
                 avatar_url = COALESCE(?, avatar_url) \
             WHERE id = ? \
             RETURNING id, nome, email, peso, altura, idade, avatar_url",
            tables::USERS
        ))
        .bind(&update.nome)
        .bind(&update.email)
        .bind(update.peso)
        .bind(update.altura)
        .bind(update.idade)
        .bind(&update.avatar_url)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_db(e, "Email already in use by another user"))?;
        Ok(user)
    }

    // ─── Record Operations ───────────────────────────────────────

    /// Append a record. Records are immutable once written.
    pub async fn append_record(
        &self,
        user_id: i64,
        kind: RecordKind,
        amount: f64,
        recorded_at: DateTime<Utc>,
    ) -> Result<Record, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_record(&mut conn, user_id, kind, amount, recorded_at).await
    }

    /// Records of `kind` for a user, newest first, optionally restricted to
    /// `window`.
    pub async fn query_records(
        &self,
        user_id: i64,
        kind: RecordKind,
        window: Option<DayWindow>,
    ) -> Result<Vec<Record>, AppError> {
        select_records(&self.pool, user_id, kind, window).await
    }

    /// Hydration and calorie records inside `window`, read from one snapshot.
    pub async fn query_records_snapshot(
        &self,
        user_id: i64,
        window: DayWindow,
    ) -> Result<(Vec<Record>, Vec<Record>), AppError> {
        let mut tx = self.pool.begin().await?;
        let hydration =
            select_records(&mut *tx, user_id, RecordKind::Hydration, Some(window)).await?;
        let calories =
            select_records(&mut *tx, user_id, RecordKind::Calories, Some(window)).await?;
        tx.commit().await?;
        Ok((hydration, calories))
    }

    // ─── Goal Operations ─────────────────────────────────────────

    /// Get the goal row for a user and day.
    pub async fn get_goal(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<Option<DailyGoal>, AppError> {
        let row = sqlx::query_as::<_, DailyGoalRow>(&format!(
            "SELECT user_id, goal_date, meta_hid, meta_cal, meta_peso \
             FROM {} WHERE user_id = ? AND goal_date = ?",
            tables::DAILY_GOALS
        ))
        .bind(user_id)
        .bind(day.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(goal_from_row).transpose()
    }

    /// Create or overwrite the goal for `(goal.user_id, goal.goal_date)` in one
    /// statement. A missing weight target keeps the stored one.
    pub async fn upsert_goal(
        &self,
        goal: &DailyGoal,
        now: DateTime<Utc>,
    ) -> Result<DailyGoal, AppError> {
        let row = sqlx::query_as::<_, DailyGoalRow>(&format!(
            "INSERT INTO {table} (user_id, goal_date, meta_hid, meta_cal, meta_peso, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT (user_id, goal_date) DO UPDATE SET \
                 meta_hid = excluded.meta_hid, \
                 meta_cal = excluded.meta_cal, \
                 meta_peso = COALESCE(excluded.meta_peso, {table}.meta_peso), \
                 updated_at = excluded.updated_at \
             RETURNING user_id, goal_date, meta_hid, meta_cal, meta_peso",
            table = tables::DAILY_GOALS
        ))
        .bind(goal.user_id)
        .bind(goal.goal_date.to_string())
        .bind(goal.meta_hid)
        .bind(goal.meta_cal)
        .bind(goal.meta_peso)
        .bind(to_millis(now))
        .fetch_one(&self.pool)
        .await?;

        goal_from_row(row)
    }

    // ─── Gamification Operations ─────────────────────────────────

    /// Load a user's gamification state, including goal awards granted on `day`.
    pub async fn load_gamification(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> Result<GamificationState, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, GamificationRow>(&format!(
            "SELECT xp, streak, last_login_day FROM {} WHERE user_id = ?",
            tables::GAMIFICATION
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Gamification state for user {}", user_id)))?;

        let codes: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT code FROM {} WHERE user_id = ?",
            tables::ACHIEVEMENTS
        ))
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let reasons: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT reason FROM {} WHERE user_id = ? AND award_date = ?",
            tables::XP_AWARDS
        ))
        .bind(user_id)
        .bind(day.to_string())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let last_login_day = row
            .last_login_day
            .map(|d| d.parse::<NaiveDate>())
            .transpose()
            .map_err(|e| AppError::Persistence(format!("Corrupt last_login_day: {}", e)))?;

        let mut achievements = std::collections::BTreeSet::new();
        for code in codes {
            match code.parse::<Achievement>() {
                Ok(achievement) => {
                    achievements.insert(achievement);
                }
                Err(e) => tracing::warn!(user_id, error = %e, "Ignoring stored achievement"),
            }
        }

        let goal_awards = reasons
            .iter()
            .filter_map(|reason| goal_from_reason(reason))
            .map(|goal| (day, goal))
            .collect();

        Ok(GamificationState {
            xp: u64::try_from(row.xp).unwrap_or(0),
            streak: u32::try_from(row.streak).unwrap_or(0),
            last_login_day,
            achievements,
            goal_awards,
        })
    }

    /// Append a record and persist its XP events in one transaction.
    pub async fn append_record_with_events(
        &self,
        user_id: i64,
        kind: RecordKind,
        amount: f64,
        recorded_at: DateTime<Utc>,
        events: &[XpEvent],
    ) -> Result<(Record, u64), AppError> {
        let mut tx = self.pool.begin().await?;
        let record = insert_record(&mut tx, user_id, kind, amount, recorded_at).await?;
        let granted = apply_events(&mut tx, user_id, events, recorded_at).await?;
        tx.commit().await?;
        Ok((record, granted))
    }

    /// Persist XP events in one transaction and return the XP actually granted.
    ///
    /// Events that lost a race are skipped rather than applied twice:
    /// - a login only applies if `last_login_day` still holds the value the
    ///   event was computed from
    /// - goal bonuses and achievements only apply if their ledger row was
    ///   newly inserted
    pub async fn apply_xp_events(
        &self,
        user_id: i64,
        events: &[XpEvent],
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        if events.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let granted = apply_events(&mut tx, user_id, events, now).await?;
        tx.commit().await?;
        Ok(granted)
    }
}

// ─── Helpers ───────────────────────────────────────────────────

async fn insert_record(
    conn: &mut SqliteConnection,
    user_id: i64,
    kind: RecordKind,
    amount: f64,
    recorded_at: DateTime<Utc>,
) -> Result<Record, AppError> {
    let row = sqlx::query_as::<_, RecordRow>(&format!(
        "INSERT INTO {} (user_id, amount, recorded_at) VALUES (?, ?, ?) \
         RETURNING id, user_id, amount, recorded_at",
        kind.table()
    ))
    .bind(user_id)
    .bind(amount)
    .bind(to_millis(recorded_at))
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(user_id, kind = %kind, amount, "Record appended");
    Ok(row.into_record(kind))
}

async fn select_records<'e, E: SqliteExecutor<'e>>(
    executor: E,
    user_id: i64,
    kind: RecordKind,
    window: Option<DayWindow>,
) -> Result<Vec<Record>, AppError> {
    let rows = match window {
        Some(window) => {
            sqlx::query_as::<_, RecordRow>(&format!(
                "SELECT id, user_id, amount, recorded_at FROM {} \
                 WHERE user_id = ? AND recorded_at >= ? AND recorded_at < ? \
                 ORDER BY recorded_at DESC, id DESC",
                kind.table()
            ))
            .bind(user_id)
            .bind(to_millis(window.start))
            .bind(to_millis(window.end))
            .fetch_all(executor)
            .await?
        }
        None => {
            sqlx::query_as::<_, RecordRow>(&format!(
                "SELECT id, user_id, amount, recorded_at FROM {} \
                 WHERE user_id = ? ORDER BY recorded_at DESC, id DESC",
                kind.table()
            ))
            .bind(user_id)
            .fetch_all(executor)
            .await?
        }
    };

    Ok(rows.into_iter().map(|row| row.into_record(kind)).collect())
}

async fn apply_events(
    conn: &mut SqliteConnection,
    user_id: i64,
    events: &[XpEvent],
    now: DateTime<Utc>,
) -> Result<u64, AppError> {
    let mut granted = 0u64;

    for event in events {
        let applies = match event {
            XpEvent::DailyLogin {
                day,
                previous_day,
                streak,
                ..
            } => {
                sqlx::query(&format!(
                    "UPDATE {} SET streak = ?, last_login_day = ? \
                     WHERE user_id = ? AND last_login_day IS ?",
                    tables::GAMIFICATION
                ))
                .bind(i64::from(*streak))
                .bind(day.to_string())
                .bind(user_id)
                .bind(previous_day.map(|d| d.to_string()))
                .execute(&mut *conn)
                .await?
                .rows_affected()
                    == 1
            }
            XpEvent::Activity { .. } => true,
            XpEvent::GoalCompleted { day, goal, xp } => {
                sqlx::query(&format!(
                    "INSERT OR IGNORE INTO {} (user_id, award_date, reason, xp, awarded_at) \
                     VALUES (?, ?, ?, ?, ?)",
                    tables::XP_AWARDS
                ))
                .bind(user_id)
                .bind(day.to_string())
                .bind(goal_reason(*goal))
                .bind(xp_to_sql(*xp))
                .bind(to_millis(now))
                .execute(&mut *conn)
                .await?
                .rows_affected()
                    == 1
            }
            XpEvent::AchievementUnlocked { achievement, .. } => {
                sqlx::query(&format!(
                    "INSERT OR IGNORE INTO {} (user_id, code, unlocked_at) VALUES (?, ?, ?)",
                    tables::ACHIEVEMENTS
                ))
                .bind(user_id)
                .bind(achievement.code())
                .bind(to_millis(now))
                .execute(&mut *conn)
                .await?
                .rows_affected()
                    == 1
            }
        };

        if !applies {
            tracing::debug!(user_id, ?event, "XP event already applied, skipping");
            continue;
        }

        let xp = event.xp();
        if xp > 0 {
            sqlx::query(&format!(
                "UPDATE {} SET xp = xp + ? WHERE user_id = ?",
                tables::GAMIFICATION
            ))
            .bind(xp_to_sql(xp))
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
            granted = granted.saturating_add(xp);
        }
    }

    Ok(granted)
}

fn goal_from_row(row: DailyGoalRow) -> Result<DailyGoal, AppError> {
    DailyGoal::try_from(row)
        .map_err(|e| AppError::Persistence(format!("Corrupt goal_date: {}", e)))
}

fn goal_reason(goal: RecordKind) -> String {
    format!("goal:{}", goal)
}

fn goal_from_reason(reason: &str) -> Option<RecordKind> {
    match reason.strip_prefix("goal:")? {
        "hydration" => Some(RecordKind::Hydration),
        "calories" => Some(RecordKind::Calories),
        _ => None,
    }
}

fn xp_to_sql(xp: u64) -> i64 {
    i64::try_from(xp).unwrap_or(i64::MAX)
}
