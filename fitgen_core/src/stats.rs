//! Progress statistics, levels and achievements.
//!
//! Everything here is derived from the progress history on demand; nothing
//! is stored separately.

use crate::ProgressEntry;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Default experience awarded per completed workout
pub const DEFAULT_XP_PER_WORKOUT: u32 = 100;

const MAX_LEVEL: u32 = 4096;

/// Level reached with `xp` experience
///
/// Level `L` starts at `(L-1)² × 100` XP.
pub fn level_for_xp(xp: u32) -> u32 {
    let mut level = 1;
    while level < MAX_LEVEL && level_start_xp(level + 1) <= xp {
        level += 1;
    }
    level
}

/// Experience at which `level` begins
pub fn level_start_xp(level: u32) -> u32 {
    let base = level.saturating_sub(1);
    base.saturating_mul(base).saturating_mul(100)
}

/// Aggregate view of a user's progress
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub completed_workouts: u32,
    pub experience: u32,
    pub level: u32,
    pub xp_to_next_level: u32,
    /// Consecutive days with a completed workout, ending today or yesterday
    pub current_streak_days: u32,
    pub average_rating: Option<f32>,
    pub total_seconds: u64,
}

impl ProgressSummary {
    pub fn from_entries(entries: &[ProgressEntry], xp_per_workout: u32, today: NaiveDate) -> Self {
        let completed: Vec<&ProgressEntry> = entries.iter().filter(|e| e.completed).collect();
        let completed_workouts = completed.len() as u32;
        let experience = completed_workouts.saturating_mul(xp_per_workout);
        let level = level_for_xp(experience);

        let ratings: Vec<u8> = entries.iter().filter_map(|e| e.rating).map(u8::from).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|&r| r as f32).sum::<f32>() / ratings.len() as f32)
        };

        Self {
            completed_workouts,
            experience,
            level,
            xp_to_next_level: level_start_xp(level + 1).saturating_sub(experience),
            current_streak_days: current_streak(&completed, today),
            average_rating,
            total_seconds: entries.iter().map(|e| e.total_seconds() as u64).sum(),
        }
    }

    pub fn achievements(&self) -> Vec<Achievement> {
        ACHIEVEMENTS
            .iter()
            .map(|spec| {
                let progress = match spec.metric {
                    Metric::Workouts => self.completed_workouts,
                    Metric::Level => self.level,
                    Metric::Experience => self.experience,
                };
                Achievement {
                    id: spec.id,
                    title: spec.title,
                    description: spec.description,
                    unlocked: progress >= spec.target,
                    progress: progress.min(spec.target),
                    target: spec.target,
                }
            })
            .collect()
    }
}

fn current_streak(completed: &[&ProgressEntry], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = completed.iter().map(|e| e.date.date_naive()).collect();

    let mut day = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while days.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

#[derive(Clone, Copy)]
enum Metric {
    Workouts,
    Level,
    Experience,
}

struct AchievementSpec {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    metric: Metric,
    target: u32,
}

const ACHIEVEMENTS: &[AchievementSpec] = &[
    AchievementSpec {
        id: "first_step",
        title: "First Step",
        description: "Complete your first workout",
        metric: Metric::Workouts,
        target: 1,
    },
    AchievementSpec {
        id: "getting_in_the_groove",
        title: "Getting in the Groove",
        description: "Complete 5 workouts",
        metric: Metric::Workouts,
        target: 5,
    },
    AchievementSpec {
        id: "dedicated",
        title: "Dedicated",
        description: "Complete 10 workouts",
        metric: Metric::Workouts,
        target: 10,
    },
    AchievementSpec {
        id: "rising_star",
        title: "Rising Star",
        description: "Reach level 5",
        metric: Metric::Level,
        target: 5,
    },
    AchievementSpec {
        id: "fitness_enthusiast",
        title: "Fitness Enthusiast",
        description: "Reach level 10",
        metric: Metric::Level,
        target: 10,
    },
    AchievementSpec {
        id: "xp_hunter",
        title: "XP Hunter",
        description: "Earn 1000 XP",
        metric: Metric::Experience,
        target: 1000,
    },
];

/// An achievement with its unlock state
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    /// Capped at `target`
    pub progress: u32,
    pub target: u32,
}
