// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record logging, daily progress and login bookkeeping.
//!
//! Orchestrates the store and the pure aggregation, goal and gamification
//! code. Every mutation is committed before derived state is computed from
//! a fresh read, so responses never show state that failed to persist.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{DailyGoal, Measurement, Record, RecordKind};
use crate::services::aggregator::{consecutive_days_logged, daily_total, totals_by_day};
use crate::services::gamification::{
    Achievement, AchievementProgress, GamificationState, CALORIE_CONTROL_DAYS,
};
use crate::services::goals::{evaluate, GoalEvaluation};
use crate::time_utils::{local_day, DayWindow};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

/// Largest accepted single hydration record, in liters.
pub const MAX_HYDRATION_LITERS: f64 = 20.0;
/// Largest accepted single calorie record, in kcal.
pub const MAX_CALORIES_KCAL: f64 = 20_000.0;

const ML_PER_LITER: f64 = 1000.0;

/// Today's totals as shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySummary {
    /// Liters
    pub water_liters: f64,
    /// Kcal
    pub calories: f64,
}

/// Goal targets for a day together with progress against them.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyProgress {
    pub goal: DailyGoal,
    pub water_ml: f64,
    pub calories: f64,
    pub water: GoalEvaluation,
    pub calorie: GoalEvaluation,
    /// Gamification state after any awards this evaluation produced
    pub gamification: GamificationState,
}

/// New goal targets for today.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalTargets {
    pub water_ml: f64,
    pub calories: f64,
    pub weight_kg: Option<f64>,
}

/// Tracking service bound to a store and a day boundary.
#[derive(Clone)]
pub struct TrackingService {
    db: Database,
    tz: FixedOffset,
}

impl TrackingService {
    pub fn new(db: Database, tz: FixedOffset) -> Self {
        Self { db, tz }
    }

    /// Calendar day of `now` at the configured offset.
    pub fn day_of(&self, now: DateTime<Utc>) -> NaiveDate {
        local_day(now, &self.tz)
    }

    /// Append a record, grant its activity XP and re-evaluate today's goals
    /// and achievements.
    pub async fn log_record(
        &self,
        user_id: i64,
        kind: RecordKind,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<(Record, DailyProgress)> {
        validate_amount(kind, amount)?;

        let day = self.day_of(now);
        let mut state = self.db.load_gamification(user_id, day).await?;
        let events: Vec<_> = state.record_activity(kind, amount).into_iter().collect();

        let (record, granted) = self
            .db
            .append_record_with_events(user_id, kind, amount, now, &events)
            .await?;

        tracing::info!(
            user_id,
            kind = %kind,
            amount,
            xp = granted,
            "Record logged"
        );

        let progress = self.evaluate_day(user_id, now).await?;
        Ok((record, progress))
    }

    /// Today's water (liters) and calorie totals, read from one snapshot.
    pub async fn daily_summary(&self, user_id: i64, now: DateTime<Utc>) -> Result<DailySummary> {
        let window = DayWindow::containing(now, &self.tz);
        let (water, calories) = self.db.query_records_snapshot(user_id, window).await?;

        Ok(DailySummary {
            water_liters: daily_total(&measurements(&water), now, &self.tz),
            calories: daily_total(&measurements(&calories), now, &self.tz),
        })
    }

    /// All records of `kind`, newest first.
    pub async fn history(&self, user_id: i64, kind: RecordKind) -> Result<Vec<Record>> {
        self.db.query_records(user_id, kind, None).await
    }

    /// Today's goals and progress; grants goal bonuses that became due.
    pub async fn goals_today(&self, user_id: i64, now: DateTime<Utc>) -> Result<DailyProgress> {
        self.evaluate_day(user_id, now).await
    }

    /// Replace today's targets and return the resulting progress.
    pub async fn set_goals(
        &self,
        user_id: i64,
        targets: GoalTargets,
        now: DateTime<Utc>,
    ) -> Result<DailyProgress> {
        validate_target("metaAgua", targets.water_ml)?;
        validate_target("metaCalorias", targets.calories)?;
        if let Some(weight) = targets.weight_kg {
            validate_target("metaPeso", weight)?;
        }

        let goal = DailyGoal {
            user_id,
            goal_date: self.day_of(now),
            meta_hid: targets.water_ml,
            meta_cal: targets.calories,
            meta_peso: targets.weight_kg,
        };
        self.db.upsert_goal(&goal, now).await?;

        tracing::info!(
            user_id,
            day = %goal.goal_date,
            meta_hid = goal.meta_hid,
            meta_cal = goal.meta_cal,
            "Daily goals saved"
        );

        self.evaluate_day(user_id, now).await
    }

    /// Record today's login: daily bonus, streak and streak achievements.
    pub async fn register_login(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<GamificationState> {
        let day = self.day_of(now);
        let mut state = self.db.load_gamification(user_id, day).await?;

        let mut events: Vec<_> = state.record_login(day).into_iter().collect();
        if events.is_empty() {
            return Ok(state);
        }

        let progress = AchievementProgress {
            streak: state.streak,
            ..Default::default()
        };
        events.extend(state.unlock_achievements(&progress));

        let granted = self.db.apply_xp_events(user_id, &events, now).await?;
        tracing::info!(user_id, streak = state.streak, xp = granted, "Daily login recorded");

        self.db.load_gamification(user_id, day).await
    }

    /// Current gamification state.
    pub async fn gamification(
        &self,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<GamificationState> {
        self.db.load_gamification(user_id, self.day_of(now)).await
    }

    /// Evaluate today's goals and achievements, persist any new awards and
    /// return progress computed from a fresh read.
    async fn evaluate_day(&self, user_id: i64, now: DateTime<Utc>) -> Result<DailyProgress> {
        let day = self.day_of(now);
        let window = DayWindow::for_day(day, &self.tz);

        let goal = self
            .db
            .get_goal(user_id, day)
            .await?
            .unwrap_or_else(|| DailyGoal::default_for(user_id, day));

        let (water, calories) = self.db.query_records_snapshot(user_id, window).await?;
        let water_ml = daily_total(&measurements_ml(&water), now, &self.tz);
        let calorie_total = daily_total(&measurements(&calories), now, &self.tz);

        let water_eval = evaluate(water_ml, goal.meta_hid);
        let calorie_eval = evaluate(calorie_total, goal.meta_cal);

        let mut state = self.db.load_gamification(user_id, day).await?;
        let mut events = Vec::new();
        events.extend(state.complete_goal(day, RecordKind::Hydration, water_eval));
        events.extend(state.complete_goal(day, RecordKind::Calories, calorie_eval));

        let best_day_water_ml = if state.achievements.contains(&Achievement::WaterMaster) {
            water_ml
        } else {
            self.best_day_water_ml(user_id).await?.max(water_ml)
        };

        let progress = AchievementProgress {
            best_day_water_ml,
            calorie_days_in_a_row: self.calorie_days_in_a_row(user_id, day).await?,
            streak: state.streak,
        };
        events.extend(state.unlock_achievements(&progress));

        if !events.is_empty() {
            let granted = self.db.apply_xp_events(user_id, &events, now).await?;
            tracing::info!(user_id, day = %day, xp = granted, "Daily awards granted");
            state = self.db.load_gamification(user_id, day).await?;
        }

        Ok(DailyProgress {
            goal,
            water_ml,
            calories: calorie_total,
            water: water_eval,
            calorie: calorie_eval,
            gamification: state,
        })
    }

    /// Highest single-day hydration total across the user's history, in ml.
    async fn best_day_water_ml(&self, user_id: i64) -> Result<f64> {
        let records = self
            .db
            .query_records(user_id, RecordKind::Hydration, None)
            .await?;
        Ok(totals_by_day(&measurements_ml(&records), &self.tz)
            .into_values()
            .fold(0.0, f64::max))
    }

    async fn calorie_days_in_a_row(&self, user_id: i64, today: NaiveDate) -> Result<u32> {
        let first = today
            .checked_sub_days(Days::new(u64::from(CALORIE_CONTROL_DAYS - 1)))
            .unwrap_or(today);
        let window = DayWindow::spanning(first, today, &self.tz);
        let records = self
            .db
            .query_records(user_id, RecordKind::Calories, Some(window))
            .await?;
        Ok(consecutive_days_logged(&measurements(&records), today, &self.tz))
    }
}

fn measurements(records: &[Record]) -> Vec<Measurement> {
    records.iter().map(Measurement::from).collect()
}

/// Hydration records converted to milliliters, the unit water goals use.
fn measurements_ml(records: &[Record]) -> Vec<Measurement> {
    records
        .iter()
        .map(|r| Measurement {
            amount: r.amount * ML_PER_LITER,
            recorded_at: r.recorded_at,
        })
        .collect()
}

fn validate_amount(kind: RecordKind, amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::Validation(format!(
            "{} amount must be a positive number",
            kind
        )));
    }
    match kind {
        RecordKind::Hydration if amount > MAX_HYDRATION_LITERS => Err(AppError::Validation(
            format!("hydration amount must be at most {} liters", MAX_HYDRATION_LITERS),
        )),
        RecordKind::Calories if amount.fract() != 0.0 => Err(AppError::Validation(
            "calories amount must be a whole number".to_string(),
        )),
        RecordKind::Calories if amount > MAX_CALORIES_KCAL => Err(AppError::Validation(
            format!("calories amount must be at most {} kcal", MAX_CALORIES_KCAL),
        )),
        _ => Ok(()),
    }
}

fn validate_target(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{} must be a positive number",
            field
        )))
    }
}
