// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod goal;
pub mod record;
pub mod user;

pub use goal::DailyGoal;
pub use record::{HistoryEntry, Measurement, Record, RecordKind};
pub use user::{NewUser, ProfileUpdate, User, UserCredentials};
