// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gamification engine: XP, levels, login streaks and achievements.
//!
//! [`GamificationState`] is an in-memory view of the persisted state. Every
//! mutating method returns the [`XpEvent`] it produced (or `None` when the
//! call was a no-op); the tracking service persists those events and then
//! re-reads the state, so a failed write never leaves a half-applied view.

use crate::models::RecordKind;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::goals::{GoalEvaluation, GoalTransition};

/// XP required to reach each level; level `n` starts at index `n - 1`.
pub const LEVEL_THRESHOLDS: [u64; 6] = [0, 1_000, 2_500, 5_000, 10_000, 20_000];
/// Width of a level past the end of the table, for progress display.
const LEVEL_WIDTH_PAST_TABLE: u64 = 1_000;

/// Bonus for the first login of a calendar day.
pub const DAILY_LOGIN_XP: u64 = 100;
/// Bonus for meeting a daily goal, once per goal per day.
pub const GOAL_COMPLETION_XP: u64 = 500;
/// Bonus for unlocking an achievement.
pub const ACHIEVEMENT_XP: u64 = 250;

/// Milliliters of water per XP point (0.1 XP/ml).
const ML_PER_XP: u64 = 10;
/// Kilocalories per XP point (0.05 XP/kcal).
const KCAL_PER_XP: u64 = 20;

/// Hydration total (ml) in a single day that unlocks [`Achievement::WaterMaster`].
pub const WATER_MASTER_ML: f64 = 2_000.0;
/// Consecutive days with a calorie record that unlock [`Achievement::CalorieControl`].
pub const CALORIE_CONTROL_DAYS: u32 = 7;
/// Login streak that unlocks [`Achievement::Consistency`].
pub const CONSISTENCY_STREAK: u32 = 30;

/// Level for a cumulative XP value.
pub fn level_for_xp(xp: u64) -> u32 {
    let reached = LEVEL_THRESHOLDS.iter().take_while(|&&t| xp >= t).count();
    // The table has a zero entry, so at least one threshold is always satisfied.
    reached.max(1) as u32
}

/// XP earned by logging `amount` of `kind` (liters for hydration, kcal for
/// calories), floored to whole points.
pub fn xp_for_record(kind: RecordKind, amount: f64) -> u64 {
    if !(amount.is_finite() && amount > 0.0) {
        return 0;
    }
    // Float-to-int casts saturate.
    match kind {
        RecordKind::Hydration => (amount * 1000.0).round() as u64 / ML_PER_XP,
        RecordKind::Calories => amount.round() as u64 / KCAL_PER_XP,
    }
}

/// Position of an XP value within its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LevelProgress {
    pub level: u32,
    pub current_level_xp: u64,
    pub next_level_xp: u64,
    /// Progress toward `next_level_xp`, in `[0, 100]`
    pub percent: u8,
}

impl LevelProgress {
    /// Past the last threshold the level stays fixed and progress is shown
    /// in bands of [`LEVEL_WIDTH_PAST_TABLE`] XP, so `next_level_xp` always
    /// lies above `xp` (except at `u64::MAX`).
    pub fn for_xp(xp: u64) -> Self {
        let level = level_for_xp(xp);
        let index = (level - 1) as usize;
        let (current_level_xp, next_level_xp) = match LEVEL_THRESHOLDS.get(index + 1) {
            Some(&next) => (LEVEL_THRESHOLDS[index], next),
            None => {
                let top = LEVEL_THRESHOLDS[index];
                let bands = (xp - top) / LEVEL_WIDTH_PAST_TABLE;
                let floor = top.saturating_add(bands.saturating_mul(LEVEL_WIDTH_PAST_TABLE));
                (floor, floor.saturating_add(LEVEL_WIDTH_PAST_TABLE))
            }
        };

        let span = (next_level_xp - current_level_xp).max(1);
        let into_level = (xp - current_level_xp).min(span);

        Self {
            level,
            current_level_xp,
            next_level_xp,
            percent: (into_level * 100 / span) as u8,
        }
    }
}

/// One-way unlockable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Achievement {
    WaterMaster,
    CalorieControl,
    Consistency,
}

impl Achievement {
    pub const ALL: [Achievement; 3] = [
        Achievement::WaterMaster,
        Achievement::CalorieControl,
        Achievement::Consistency,
    ];

    /// Stable storage code.
    pub fn code(self) -> &'static str {
        match self {
            Achievement::WaterMaster => "water_master",
            Achievement::CalorieControl => "calorie_control",
            Achievement::Consistency => "consistency",
        }
    }

    /// Display name shown to users.
    pub fn title(self) -> &'static str {
        match self {
            Achievement::WaterMaster => "Mestre da Hidratação",
            Achievement::CalorieControl => "Controle Calórico",
            Achievement::Consistency => "Consistência",
        }
    }

    /// Whether `progress` satisfies this achievement's predicate.
    pub fn is_earned(self, progress: &AchievementProgress) -> bool {
        match self {
            Achievement::WaterMaster => progress.best_day_water_ml >= WATER_MASTER_ML,
            Achievement::CalorieControl => progress.calorie_days_in_a_row >= CALORIE_CONTROL_DAYS,
            Achievement::Consistency => progress.streak >= CONSISTENCY_STREAK,
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Achievement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Achievement::ALL
            .into_iter()
            .find(|a| a.code() == s)
            .ok_or_else(|| format!("unknown achievement code: {}", s))
    }
}

/// Inputs to the achievement predicates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AchievementProgress {
    /// Highest single-day hydration total observed, in milliliters
    pub best_day_water_ml: f64,
    /// Consecutive days, ending today, with at least one calorie record
    pub calorie_days_in_a_row: u32,
    pub streak: u32,
}

/// State change produced by the engine, to be persisted by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum XpEvent {
    /// First login of `day`; `streak` is the streak after the login.
    DailyLogin {
        day: NaiveDate,
        previous_day: Option<NaiveDate>,
        streak: u32,
        xp: u64,
    },
    /// A record was logged.
    Activity { kind: RecordKind, xp: u64 },
    /// A daily goal was met for the first time on `day`.
    GoalCompleted {
        day: NaiveDate,
        goal: RecordKind,
        xp: u64,
    },
    AchievementUnlocked { achievement: Achievement, xp: u64 },
}

impl XpEvent {
    pub fn xp(&self) -> u64 {
        match self {
            XpEvent::DailyLogin { xp, .. }
            | XpEvent::Activity { xp, .. }
            | XpEvent::GoalCompleted { xp, .. }
            | XpEvent::AchievementUnlocked { xp, .. } => *xp,
        }
    }
}

/// Per-user gamification state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamificationState {
    pub xp: u64,
    pub streak: u32,
    pub last_login_day: Option<NaiveDate>,
    pub achievements: BTreeSet<Achievement>,
    /// Goals whose completion bonus has been granted, keyed by day.
    pub goal_awards: BTreeSet<(NaiveDate, RecordKind)>,
}

impl GamificationState {
    /// Level derived from the current XP.
    pub fn level(&self) -> u32 {
        level_for_xp(self.xp)
    }

    pub fn progress(&self) -> LevelProgress {
        LevelProgress::for_xp(self.xp)
    }

    /// Add XP and return the new level.
    pub fn add_xp(&mut self, amount: u64) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        self.level()
    }

    /// Register a login on `today`.
    ///
    /// Returns `None` when `today` was already recorded. A login exactly one
    /// day after the previous one extends the streak; any other gap (or the
    /// first login ever) restarts it at 1.
    pub fn record_login(&mut self, today: NaiveDate) -> Option<XpEvent> {
        let previous_day = self.last_login_day;
        match previous_day {
            Some(last) if last == today => return None,
            Some(last) if last.succ_opt() == Some(today) => {
                self.streak = self.streak.saturating_add(1);
            }
            _ => self.streak = 1,
        }
        self.last_login_day = Some(today);
        self.add_xp(DAILY_LOGIN_XP);

        Some(XpEvent::DailyLogin {
            day: today,
            previous_day,
            streak: self.streak,
            xp: DAILY_LOGIN_XP,
        })
    }

    /// Award activity XP for a logged record.
    pub fn record_activity(&mut self, kind: RecordKind, amount: f64) -> Option<XpEvent> {
        let xp = xp_for_record(kind, amount);
        if xp == 0 {
            return None;
        }
        self.add_xp(xp);
        Some(XpEvent::Activity { kind, xp })
    }

    /// Grant the goal-completion bonus if `evaluation` is the first met
    /// evaluation of `goal` on `day`.
    pub fn complete_goal(
        &mut self,
        day: NaiveDate,
        goal: RecordKind,
        evaluation: GoalEvaluation,
    ) -> Option<XpEvent> {
        let key = (day, goal);
        match evaluation.transition(self.goal_awards.contains(&key)) {
            GoalTransition::Pending | GoalTransition::AlreadyMet => None,
            GoalTransition::Reached => {
                self.goal_awards.insert(key);
                self.add_xp(GOAL_COMPLETION_XP);
                Some(XpEvent::GoalCompleted {
                    day,
                    goal,
                    xp: GOAL_COMPLETION_XP,
                })
            }
        }
    }

    /// Unlock every achievement `progress` satisfies that is still locked.
    pub fn unlock_achievements(&mut self, progress: &AchievementProgress) -> Vec<XpEvent> {
        let mut events = Vec::new();
        for achievement in Achievement::ALL {
            if achievement.is_earned(progress) && self.achievements.insert(achievement) {
                self.add_xp(ACHIEVEMENT_XP);
                events.push(XpEvent::AchievementUnlocked {
                    achievement,
                    xp: ACHIEVEMENT_XP,
                });
            }
        }
        events
    }
}
