//! Workout history: recent sessions and weekly stats.
//!
//! Reads the session WAL back and summarises it for the `history` command.

use crate::{Error, Result, WorkoutSession};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Load sessions from the last N days, newest first
pub fn load_recent_sessions(wal_path: &Path, days: i64) -> Result<Vec<WorkoutSession>> {
    let sessions = crate::wal::read_sessions(wal_path)?;
    let recent = filter_recent(sessions, Utc::now(), days)?;

    tracing::info!(
        "Loaded {} sessions from last {} days",
        recent.len(),
        days
    );
    Ok(recent)
}

fn filter_recent(
    sessions: Vec<WorkoutSession>,
    now: DateTime<Utc>,
    days: i64,
) -> Result<Vec<WorkoutSession>> {
    let cutoff = Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| Error::Config(format!("history window of {} days is out of range", days)))?;
    let mut recent: Vec<_> = sessions
        .into_iter()
        .filter(|s| s.performed_at >= cutoff)
        .collect();
    recent.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));
    Ok(recent)
}

/// Aggregates over the trailing seven days
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeeklyStats {
    pub sessions: usize,
    pub total_reps: u32,
    /// Mean of the per-session averages; None without sessions
    pub average_form_score: Option<f64>,
}

impl WeeklyStats {
    pub fn form_score_text(&self) -> String {
        match self.average_form_score {
            Some(score) => format!("{}%", (score * 100.0).round() as u32),
            None => "-".into(),
        }
    }
}

pub fn weekly_stats(sessions: &[WorkoutSession], now: DateTime<Utc>) -> WeeklyStats {
    let cutoff = now - Duration::days(7);
    let week: Vec<_> = sessions
        .iter()
        .filter(|s| s.performed_at >= cutoff && s.performed_at <= now)
        .collect();

    if week.is_empty() {
        return WeeklyStats::default();
    }

    let total_reps = week.iter().map(|s| s.total_reps_completed).sum();
    let average = week.iter().map(|s| s.average_form_score).sum::<f64>() / week.len() as f64;

    WeeklyStats {
        sessions: week.len(),
        total_reps,
        average_form_score: Some(average),
    }
}

/// Most recent session for an exercise
pub fn find_last_session<'a>(
    sessions: &'a [WorkoutSession],
    exercise_id: &str,
) -> Option<&'a WorkoutSession> {
    // Sessions are sorted newest first
    sessions.iter().find(|s| s.exercise_id == exercise_id)
}
