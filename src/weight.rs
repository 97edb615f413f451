//! Body weight log shown on the tracker screen

use chrono::{Days, NaiveDate};
use tracing::debug;

/// Used when the profile step did not provide a usable weight
pub const DEFAULT_WEIGHT_KG: f32 = 65.0;

/// Days covered by the history, today included
pub const HISTORY_DAYS: usize = 7;

// Offsets from the starting weight for the six days before today
const TREND: [f32; HISTORY_DAYS - 1] = [0.0, 0.5, -0.3, -0.8, -1.2, -1.5];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightEntry {
    pub date: NaiveDate,
    pub kg: f32,
}

/// A week of dated weights ending today. Only today's entry can change.
#[derive(Debug, Clone)]
pub struct WeightLog {
    today: NaiveDate,
    entries: Vec<WeightEntry>,
}

/// Parse a weight as typed by the user. `None` for anything that is not a
/// positive number.
pub fn parse_weight(input: &str) -> Option<f32> {
    input
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|kg| kg.is_finite() && *kg > 0.0)
}

impl WeightLog {
    /// Seed the week from the weight entered at sign-up, or the default when
    /// that is missing or unreadable.
    pub fn new(initial: Option<&str>, today: NaiveDate) -> Self {
        let start = initial.and_then(parse_weight).unwrap_or(DEFAULT_WEIGHT_KG);

        let mut entries: Vec<WeightEntry> = TREND
            .iter()
            .enumerate()
            .map(|(i, offset)| WeightEntry {
                date: days_before(today, (HISTORY_DAYS - 1 - i) as u64),
                kg: start + offset,
            })
            .collect();
        entries.push(WeightEntry {
            date: today,
            kg: start,
        });

        Self { today, entries }
    }

    pub fn history(&self) -> &[WeightEntry] {
        &self.entries
    }

    pub fn current(&self) -> f32 {
        self.entries.last().map_or(DEFAULT_WEIGHT_KG, |e| e.kg)
    }

    /// Replace today's weight. Unreadable input leaves the log untouched.
    pub fn record_today(&mut self, input: &str) -> Option<f32> {
        let Some(kg) = parse_weight(input) else {
            debug!(input, "Ignoring unreadable weight");
            return None;
        };

        if let Some(last) = self.entries.last_mut() {
            last.kg = kg;
        }
        Some(kg)
    }

    /// Current weight as shown on screen, e.g. `64.5kg`
    pub fn display(&self) -> String {
        format!("{:.1}kg", self.current())
    }

    /// Axis label for an entry: `MM/DD`, or `Today`
    pub fn label(&self, entry: &WeightEntry) -> String {
        if entry.date == self.today {
            "Today".to_owned()
        } else {
            entry.date.format("%m/%d").to_string()
        }
    }
}

fn days_before(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}
