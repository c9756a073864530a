//! Daily goal model.

use chrono::NaiveDate;

/// Water target used when no goal row exists for the day (milliliters).
pub const DEFAULT_WATER_GOAL_ML: f64 = 2000.0;
/// Calorie target used when no goal row exists for the day (kcal).
pub const DEFAULT_CALORIE_GOAL_KCAL: f64 = 2000.0;

/// One goal row per (user, day).
#[derive(Debug, Clone, PartialEq)]
pub struct DailyGoal {
    pub user_id: i64,
    pub goal_date: NaiveDate,
    /// Water target in milliliters
    pub meta_hid: f64,
    /// Calorie target in kcal
    pub meta_cal: f64,
    /// Optional body-weight target in kilograms
    pub meta_peso: Option<f64>,
}

impl DailyGoal {
    /// The goal that applies when the user has not set one for `day`.
    pub fn default_for(user_id: i64, day: NaiveDate) -> Self {
        Self {
            user_id,
            goal_date: day,
            meta_hid: DEFAULT_WATER_GOAL_ML,
            meta_cal: DEFAULT_CALORIE_GOAL_KCAL,
            meta_peso: None,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DailyGoalRow {
    pub user_id: i64,
    pub goal_date: String,
    pub meta_hid: f64,
    pub meta_cal: f64,
    pub meta_peso: Option<f64>,
}

impl TryFrom<DailyGoalRow> for DailyGoal {
    type Error = chrono::ParseError;

    fn try_from(row: DailyGoalRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: row.user_id,
            goal_date: row.goal_date.parse()?,
            meta_hid: row.meta_hid,
            meta_cal: row.meta_cal,
            meta_peso: row.meta_peso,
        })
    }
}
