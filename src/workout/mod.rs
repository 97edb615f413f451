//! Exercise catalog and timed workout sessions

pub mod session;
pub mod timer;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use session::{SessionCommand, SessionError, SessionSummary, WorkoutSession};
pub use timer::{format_clock, CountdownTimer};

/// Fallback when an exercise duration cannot be read
pub const DEFAULT_DURATION: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    FullBody,
    UpperBody,
    LowerBody,
    Core,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::FullBody,
        Category::UpperBody,
        Category::LowerBody,
        Category::Core,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Category::FullBody => "full-body",
            Category::UpperBody => "upper-body",
            Category::LowerBody => "lower-body",
            Category::Core => "core",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::FullBody => "Full body",
            Category::UpperBody => "Upper body",
            Category::LowerBody => "Lower body",
            Category::Core => "Core",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s.trim())
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
    pub id: u32,
    pub name: &'static str,
    pub category: Category,
    pub duration: Duration,
    pub kcal: u32,
}

const fn exercise(id: u32, name: &'static str, category: Category, secs: u64, kcal: u32) -> Exercise {
    Exercise {
        id,
        name,
        category,
        duration: Duration::from_secs(secs),
        kcal,
    }
}

static CATALOG: [Exercise; 12] = [
    exercise(1, "Burpees", Category::FullBody, 30, 15),
    exercise(2, "Mountain climbers", Category::FullBody, 45, 12),
    exercise(3, "Jumping jacks", Category::FullBody, 60, 18),
    exercise(4, "Push-ups", Category::UpperBody, 30, 10),
    exercise(5, "Dumbbell curls", Category::UpperBody, 45, 8),
    exercise(6, "Shoulder press", Category::UpperBody, 40, 9),
    exercise(7, "Squats", Category::LowerBody, 60, 15),
    exercise(8, "Lunges", Category::LowerBody, 45, 12),
    exercise(9, "Leg raises", Category::LowerBody, 40, 10),
    exercise(10, "Plank", Category::Core, 60, 8),
    exercise(11, "Crunches", Category::Core, 45, 7),
    exercise(12, "Russian twists", Category::Core, 50, 9),
];

/// Exercises offered for a category, in display order.
pub fn catalog(category: Category) -> impl Iterator<Item = &'static Exercise> {
    CATALOG.iter().filter(move |e| e.category == category)
}

pub fn find_exercise(id: u32) -> Option<&'static Exercise> {
    CATALOG.iter().find(|e| e.id == id)
}

/// Read a duration label such as `"45초"`, `"45s"` or `"45"`. Anything that is
/// not a whole number of seconds falls back to the default.
pub fn parse_duration(label: &str) -> Duration {
    let digits = label
        .trim()
        .trim_end_matches("초")
        .trim_end_matches("sec")
        .trim_end_matches('s')
        .trim();

    digits
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_DURATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_three_exercises() {
        for category in Category::ALL {
            let exercises: Vec<_> = catalog(category).collect();
            assert_eq!(exercises.len(), 3, "{category}");
            assert!(exercises.iter().all(|e| e.category == category));
        }
    }

    #[test]
    fn ids_are_unique_and_findable() {
        for id in 1..=12 {
            assert_eq!(find_exercise(id).map(|e| e.id), Some(id));
        }
        assert!(find_exercise(13).is_none());
    }

    #[test]
    fn category_round_trips_through_slug() {
        for category in Category::ALL {
            assert_eq!(category.slug().parse::<Category>(), Ok(category));
        }
        assert!("cardio".parse::<Category>().is_err());
    }

    #[test]
    fn duration_labels() {
        assert_eq!(parse_duration("30초"), Duration::from_secs(30));
        assert_eq!(parse_duration(" 45s"), Duration::from_secs(45));
        assert_eq!(parse_duration("50 sec"), Duration::from_secs(50));
        assert_eq!(parse_duration("60"), Duration::from_secs(60));
        assert_eq!(parse_duration("a while"), DEFAULT_DURATION);
        assert_eq!(parse_duration("0초"), Duration::ZERO);
        assert_eq!(parse_duration("-5"), DEFAULT_DURATION);
    }
}
