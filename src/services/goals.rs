// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Goal evaluation: progress percentage, met flag and the one-time
//! completion transition.

use serde::Serialize;

/// Result of comparing a daily total with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalEvaluation {
    /// Progress in `[0, 100]`
    pub percent: u8,
    pub met: bool,
}

/// What happened to a goal between the last award check and now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalTransition {
    /// Not met yet.
    Pending,
    /// Met for the first time today; the completion bonus is due.
    Reached,
    /// Met, and the bonus was already granted.
    AlreadyMet,
}

/// Evaluate `total` against `target`.
///
/// A non-positive or non-finite target never counts as met and reports 0%.
pub fn evaluate(total: f64, target: f64) -> GoalEvaluation {
    if !(target.is_finite() && target > 0.0) || !total.is_finite() {
        return GoalEvaluation {
            percent: 0,
            met: false,
        };
    }

    let ratio = (100.0 * total / target).round().clamp(0.0, 100.0);
    GoalEvaluation {
        // Clamped to [0, 100], so the cast cannot truncate.
        percent: ratio as u8,
        met: total >= target,
    }
}

impl GoalEvaluation {
    /// Classify this evaluation given whether today's bonus was already paid.
    pub fn transition(self, already_awarded: bool) -> GoalTransition {
        match (self.met, already_awarded) {
            (false, _) => GoalTransition::Pending,
            (true, false) => GoalTransition::Reached,
            (true, true) => GoalTransition::AlreadyMet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_below_target_rounds_to_100_but_not_met() {
        assert_eq!(
            evaluate(1999.0, 2000.0),
            GoalEvaluation {
                percent: 100,
                met: false
            }
        );
    }

    #[test]
    fn test_exact_target_is_met() {
        assert_eq!(
            evaluate(2000.0, 2000.0),
            GoalEvaluation {
                percent: 100,
                met: true
            }
        );
    }

    #[test]
    fn test_zero_target() {
        assert_eq!(
            evaluate(5.0, 0.0),
            GoalEvaluation {
                percent: 0,
                met: false
            }
        );
        assert_eq!(evaluate(5.0, -10.0).percent, 0);
        assert!(!evaluate(5.0, f64::NAN).met);
    }

    #[test]
    fn test_percent_is_bounded() {
        assert_eq!(evaluate(5000.0, 2000.0).percent, 100);
        assert_eq!(evaluate(0.0, 2000.0).percent, 0);
        assert_eq!(evaluate(500.0, 2000.0).percent, 25);
        assert_eq!(evaluate(1.0, 3.0).percent, 33);
    }

    #[test]
    fn test_transition() {
        let met = evaluate(2000.0, 2000.0);
        let pending = evaluate(10.0, 2000.0);

        assert_eq!(pending.transition(false), GoalTransition::Pending);
        assert_eq!(met.transition(false), GoalTransition::Reached);
        assert_eq!(met.transition(true), GoalTransition::AlreadyMet);
    }
}
