//! Aggregate statistics over recorded sessions.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::events::ExerciseType;
use crate::storage::SessionRecord;

/// Rough burn rates in kcal per minute.
const PLANK_KCAL_PER_MIN: f64 = 5.0;
const HIIT_KCAL_PER_MIN: f64 = 10.0;

/// Days covered by [`Stats::daily`], today included.
pub const DAILY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// `None` means all exercises.
    pub exercise: Option<ExerciseType>,
    pub total_sessions: u64,
    pub total_secs: u64,
    pub sessions_last_7_days: u64,
    /// Sessions since the same time one calendar month ago.
    pub sessions_last_month: u64,
    /// Seconds trained in the rolling 7 days before now.
    pub week_secs: u64,
    pub today_secs: u64,
    pub today_calories: u64,
    /// Consecutive days with at least one session, ending today or yesterday.
    pub streak_days: u32,
    pub estimated_calories: u64,
    /// One entry per day for the last week, oldest first, ending today.
    pub daily: Vec<DailyTotal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub secs: u64,
    pub sessions: u64,
}

impl Stats {
    /// Dates are taken in the time zone of `now`.
    pub fn from_sessions<Tz: TimeZone>(
        exercise: Option<ExerciseType>,
        sessions: &[SessionRecord],
        now: DateTime<Tz>,
    ) -> Self {
        let tz = now.timezone();
        let week_ago = now.clone() - Duration::days(7);
        let month_ago = now
            .clone()
            .checked_sub_months(Months::new(1))
            .unwrap_or_else(|| now.clone() - Duration::days(30));

        let relevant = sessions
            .iter()
            .filter(|s| exercise.map_or(true, |e| s.exercise == e));

        let today = now.date_naive();
        let first_day = today - Duration::days(DAILY_WINDOW_DAYS - 1);
        let mut stats = Stats {
            exercise,
            daily: first_day
                .iter_days()
                .take(DAILY_WINDOW_DAYS as usize)
                .map(|date| DailyTotal {
                    date,
                    secs: 0,
                    sessions: 0,
                })
                .collect(),
            ..Stats::default()
        };
        let mut days = BTreeSet::new();
        for session in relevant {
            let started = session.started_at.with_timezone(&tz);
            let date = started.date_naive();
            let calories = estimate_calories(session.exercise, session.duration_secs);
            stats.total_sessions += 1;
            stats.total_secs += session.duration_secs;
            stats.estimated_calories += calories;
            if started >= week_ago {
                stats.sessions_last_7_days += 1;
                stats.week_secs += session.duration_secs;
            }
            if started >= month_ago {
                stats.sessions_last_month += 1;
            }
            if date == today {
                stats.today_secs += session.duration_secs;
                stats.today_calories += calories;
            }
            if let Some(total) = stats.daily.iter_mut().find(|d| d.date == date) {
                total.secs += session.duration_secs;
                total.sessions += 1;
            }
            days.insert(date);
        }
        stats.streak_days = streak_days(&days, today);
        stats
    }
}

/// Length of the run of consecutive days ending at the most recent one.
///
/// Zero if the most recent day is older than yesterday.
pub fn streak_days(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut newest_first = days.iter().rev();
    let Some(&latest) = newest_first.next() else {
        return 0;
    };
    if (today - latest).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut previous = latest;
    for &day in newest_first {
        if (previous - day).num_days() != 1 {
            break;
        }
        streak += 1;
        previous = day;
    }
    streak
}

pub fn estimate_calories(exercise: ExerciseType, secs: u64) -> u64 {
    let rate = match exercise {
        ExerciseType::Plank => PLANK_KCAL_PER_MIN,
        ExerciseType::Hiit => HIIT_KCAL_PER_MIN,
    };
    (secs as f64 / 60.0 * rate).round() as u64
}
