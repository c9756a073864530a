// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hydration and calorie record models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The two tracked quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    /// Water intake, stored in liters
    Hydration,
    /// Energy intake, stored in kcal
    Calories,
}

impl RecordKind {
    /// Backing table for this kind.
    pub(crate) fn table(self) -> &'static str {
        match self {
            RecordKind::Hydration => "hydration_records",
            RecordKind::Calories => "calorie_records",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Hydration => f.write_str("hydration"),
            RecordKind::Calories => f.write_str("calories"),
        }
    }
}

/// An appended record as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub user_id: i64,
    pub kind: RecordKind,
    pub amount: f64,
    pub recorded_at: DateTime<Utc>,
}

/// `(amount, timestamp)` pair, the unit the daily aggregator works on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub amount: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<&Record> for Measurement {
    fn from(record: &Record) -> Self {
        Self {
            amount: record.amount,
            recorded_at: record.recorded_at,
        }
    }
}

/// Raw row shape shared by both record tables.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RecordRow {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub recorded_at: i64,
}

impl RecordRow {
    pub(crate) fn into_record(self, kind: RecordKind) -> Record {
        Record {
            id: self.id,
            user_id: self.user_id,
            kind,
            amount: self.amount,
            recorded_at: crate::time_utils::from_millis(self.recorded_at),
        }
    }
}

/// History entry for API responses (`{ quantidade, data }`).
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryEntry {
    pub quantidade: f64,
    pub data: String,
}

impl From<&Record> for HistoryEntry {
    fn from(record: &Record) -> Self {
        Self {
            quantidade: record.amount,
            data: crate::time_utils::format_utc_rfc3339(record.recorded_at),
        }
    }
}
