// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Vita Tracker: personal hydration and calorie tracking
//!
//! This crate provides the backend API for logging water and calorie intake,
//! tracking daily goals and rewarding consistency with XP, levels and
//! achievements.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::TrackingService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub tracking: TrackingService,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let tracking = TrackingService::new(db.clone(), config.day_offset);
        Self {
            config,
            db,
            tracking,
        }
    }
}
