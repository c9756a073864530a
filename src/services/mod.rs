// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregator;
pub mod gamification;
pub mod goals;
pub mod password;
pub mod tracking;

pub use gamification::GamificationState;
pub use goals::GoalEvaluation;
pub use tracking::TrackingService;
