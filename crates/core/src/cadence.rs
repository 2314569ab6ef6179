//! Cadence engine for assigned tasks.
//!
//! Given an assigned task's cadence configuration and the timestamps of its
//! completions, [`compute_assigned_task_state`] derives whether the task is
//! currently active, how much progress has accrued, and when the window
//! resets.
//!
//! Recurring tasks use a trailing window `[now - interval, now)` anchored to
//! `now`, not to the assignment time or a calendar grid. A task whose target
//! is met becomes active again as soon as the oldest counted completion ages
//! out of the window.

use chrono::Duration;
use serde::Serialize;

use crate::types::Timestamp;

/// The cadence-relevant subset of an assigned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceConfig {
    /// Completions required per window.
    pub cadence_target: i32,
    /// Window length in minutes.
    pub cadence_interval_minutes: i32,
    pub is_recurring: bool,
}

impl CadenceConfig {
    /// The target actually enforced: one-off tasks always need exactly one
    /// completion, and a non-positive stored target is treated as one.
    pub fn effective_target(&self) -> i32 {
        if self.is_recurring {
            self.cadence_target.max(1)
        } else {
            1
        }
    }

    fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.cadence_interval_minutes.max(1)))
    }

    /// Earliest completion time that can affect the state at `now`.
    ///
    /// Nothing before the assignment counts. Recurring tasks also ignore
    /// anything older than the current window, so callers can bound the
    /// history they load.
    pub fn history_start(&self, assigned_at: Timestamp, now: Timestamp) -> Timestamp {
        if self.is_recurring {
            assigned_at.max(now - self.interval())
        } else {
            assigned_at
        }
    }
}

/// Derived activity state of an assigned task. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CadenceState {
    /// Completions inside the current window. Not capped; see
    /// [`CadenceState::display_progress`].
    pub progress: i32,
    pub is_active: bool,
    /// When the earliest in-window completion leaves the window.
    pub next_reset_at: Option<Timestamp>,
}

impl CadenceState {
    /// Progress clamped to the target for caller-facing output.
    pub fn display_progress(&self, config: &CadenceConfig) -> i32 {
        self.progress.min(config.effective_target())
    }
}

/// Compute the cadence state of one assigned task at `now`.
///
/// `completions` must already be scoped to the task (assignee, preset,
/// non-reverted). Order does not matter and duplicate instants each count.
pub fn compute_assigned_task_state(
    config: &CadenceConfig,
    completions: &[Timestamp],
    now: Timestamp,
) -> CadenceState {
    if !config.is_recurring {
        return if completions.is_empty() {
            CadenceState {
                progress: 0,
                is_active: true,
                next_reset_at: None,
            }
        } else {
            CadenceState {
                progress: 1,
                is_active: false,
                next_reset_at: None,
            }
        };
    }

    let interval = config.interval();
    let window_start = now - interval;

    let mut progress: i32 = 0;
    let mut earliest: Option<Timestamp> = None;
    for &at in completions {
        if at >= window_start && at < now {
            progress = progress.saturating_add(1);
            earliest = Some(earliest.map_or(at, |e| e.min(at)));
        }
    }

    CadenceState {
        progress,
        is_active: progress < config.effective_target(),
        next_reset_at: earliest.map(|at| at + interval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    fn recurring(target: i32, interval: i32) -> CadenceConfig {
        CadenceConfig {
            cadence_target: target,
            cadence_interval_minutes: interval,
            is_recurring: true,
        }
    }

    fn one_off() -> CadenceConfig {
        CadenceConfig {
            cadence_target: 5,
            cadence_interval_minutes: 60,
            is_recurring: false,
        }
    }

    // -----------------------------------------------------------------------
    // One-off tasks
    // -----------------------------------------------------------------------

    #[test]
    fn one_off_without_completion_is_active() {
        let state = compute_assigned_task_state(&one_off(), &[], now());
        assert_eq!(state.progress, 0);
        assert!(state.is_active);
        assert!(state.next_reset_at.is_none());
    }

    #[test]
    fn one_off_with_completion_is_terminal() {
        let long_ago = now() - Duration::days(400);
        let state = compute_assigned_task_state(&one_off(), &[long_ago], now());
        assert_eq!(state.progress, 1);
        assert!(!state.is_active);
        assert!(state.next_reset_at.is_none());
    }

    #[test]
    fn one_off_stays_inactive_with_more_completions() {
        let logs = vec![now() - Duration::minutes(5); 4];
        let state = compute_assigned_task_state(&one_off(), &logs, now());
        assert_eq!(state.progress, 1);
        assert!(!state.is_active);
    }

    #[test]
    fn one_off_ignores_stored_target() {
        assert_eq!(one_off().effective_target(), 1);
    }

    // -----------------------------------------------------------------------
    // Recurring tasks
    // -----------------------------------------------------------------------

    #[test]
    fn sliding_window_counts_only_recent_completions() {
        let logs = [
            now() - Duration::minutes(30),
            now() - Duration::minutes(90),
        ];
        let state = compute_assigned_task_state(&recurring(2, 60), &logs, now());
        assert_eq!(state.progress, 1);
        assert!(state.is_active);
    }

    #[test]
    fn target_met_makes_task_inactive() {
        let logs = [
            now() - Duration::minutes(10),
            now() - Duration::minutes(20),
        ];
        let state = compute_assigned_task_state(&recurring(2, 60), &logs, now());
        assert_eq!(state.progress, 2);
        assert!(!state.is_active);
    }

    #[test]
    fn task_reactivates_when_oldest_completion_ages_out() {
        let config = recurring(2, 60);
        let logs = [
            now() - Duration::minutes(10),
            now() - Duration::minutes(50),
        ];
        let later = now() + Duration::minutes(15);
        let state = compute_assigned_task_state(&config, &logs, later);
        assert_eq!(state.progress, 1);
        assert!(state.is_active);
    }

    #[test]
    fn next_reset_is_earliest_in_window_plus_interval() {
        let t0 = now() - Duration::minutes(20);
        let state = compute_assigned_task_state(&recurring(3, 60), &[t0], now());
        assert_eq!(state.next_reset_at, Some(t0 + Duration::minutes(60)));
    }

    #[test]
    fn next_reset_ignores_out_of_window_completions() {
        let inside = now() - Duration::minutes(40);
        let outside = now() - Duration::minutes(61);
        let state = compute_assigned_task_state(
            &recurring(3, 60),
            &[inside, outside, now() - Duration::minutes(5)],
            now(),
        );
        assert_eq!(state.progress, 2);
        assert_eq!(state.next_reset_at, Some(inside + Duration::minutes(60)));
    }

    #[test]
    fn no_progress_means_no_reset() {
        let state = compute_assigned_task_state(&recurring(1, 60), &[], now());
        assert_eq!(state.progress, 0);
        assert!(state.is_active);
        assert!(state.next_reset_at.is_none());
    }

    #[test]
    fn identical_instants_count_independently() {
        let t = now() - Duration::minutes(1);
        let state = compute_assigned_task_state(&recurring(3, 60), &[t, t, t], now());
        assert_eq!(state.progress, 3);
        assert!(!state.is_active);
    }

    #[test]
    fn window_is_half_open() {
        let config = recurring(5, 60);
        let at_start = now() - Duration::minutes(60);
        let at_now = now();
        let state = compute_assigned_task_state(&config, &[at_start, at_now], now());
        assert_eq!(state.progress, 1, "start is inclusive, now is exclusive");
    }

    #[test]
    fn raw_progress_is_uncapped_but_display_is_clamped() {
        let config = recurring(2, 60);
        let logs = vec![now() - Duration::minutes(3); 5];
        let state = compute_assigned_task_state(&config, &logs, now());
        assert_eq!(state.progress, 5);
        assert_eq!(state.display_progress(&config), 2);
    }

    #[test]
    fn history_start_is_bounded_by_window_for_recurring_tasks() {
        let config = recurring(2, 60);
        let long_ago = now() - Duration::days(30);
        let recent = now() - Duration::minutes(10);

        assert_eq!(config.history_start(long_ago, now()), now() - Duration::minutes(60));
        assert_eq!(config.history_start(recent, now()), recent);
    }

    #[test]
    fn history_start_for_one_off_is_the_assignment() {
        let long_ago = now() - Duration::days(30);
        assert_eq!(one_off().history_start(long_ago, now()), long_ago);
    }

    #[test]
    fn history_from_start_gives_same_state_as_full_history() {
        let config = recurring(3, 60);
        let assigned_at = now() - Duration::days(2);
        let completions = vec![
            now() - Duration::days(1),
            now() - Duration::minutes(90),
            now() - Duration::minutes(30),
            now() - Duration::minutes(5),
        ];
        let start = config.history_start(assigned_at, now());
        let bounded: Vec<Timestamp> = completions.iter().copied().filter(|&at| at >= start).collect();

        assert_eq!(bounded.len(), 2);
        assert_eq!(
            compute_assigned_task_state(&config, &bounded, now()),
            compute_assigned_task_state(&config, &completions, now())
        );
    }

    #[test]
    fn non_positive_config_values_are_treated_as_one() {
        let config = recurring(0, 0);
        assert_eq!(config.effective_target(), 1);
        let state =
            compute_assigned_task_state(&config, &[now() - Duration::seconds(30)], now());
        assert_eq!(state.progress, 1);
        assert!(!state.is_active);
    }
}
