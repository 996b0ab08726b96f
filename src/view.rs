//! Read-only projections of a planner used by the renderer.

use chrono::{DateTime, Days, NaiveDate};

use crate::model::{DAY_COUNT, DayEntry, Mood, Planner};

pub const BAND_SIZE: u32 = 10;

/// Offset from the start date to the last day of the 100-day span.
const SPAN_OFFSET_DAYS: u64 = (DAY_COUNT - 1) as u64;

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Start date plus 99 days; `None` without a usable start date.
pub fn end_date(start_date: &str) -> Option<NaiveDate> {
    parse_date(start_date)?.checked_add_days(Days::new(SPAN_OFFSET_DAYS))
}

/// Calendar date of the given day number within the span.
pub fn date_of_day(start_date: &str, day: u32) -> Option<NaiveDate> {
    if day == 0 {
        return None;
    }
    parse_date(start_date)?.checked_add_days(Days::new(u64::from(day - 1)))
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn completed_count(planner: &Planner) -> usize {
    planner.completed_days()
}

/// Visual state of one grid cell. Mood only shows once the day is completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellState {
    Untouched,
    Done,
    Mood(Mood),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub fg: (u8, u8, u8),
    pub bg: (u8, u8, u8),
}

impl CellState {
    pub fn of(entry: Option<&DayEntry>) -> Self {
        match entry {
            Some(e) if e.completed => e.mood.map(CellState::Mood).unwrap_or(CellState::Done),
            _ => CellState::Untouched,
        }
    }

    pub fn palette(self) -> Palette {
        let (fg, bg) = match self {
            CellState::Untouched => ((148, 163, 184), (241, 245, 249)),
            CellState::Done => ((30, 64, 175), (147, 197, 253)),
            CellState::Mood(Mood::Happy) => ((190, 18, 60), (254, 205, 211)),
            CellState::Mood(Mood::Calm) => ((3, 105, 161), (186, 230, 253)),
            CellState::Mood(Mood::Neutral) => ((51, 65, 85), (226, 232, 240)),
            CellState::Mood(Mood::Tired) => ((180, 83, 9), (254, 243, 199)),
            CellState::Mood(Mood::Sad) => ((67, 56, 202), (199, 210, 254)),
            CellState::Mood(Mood::Stressed) => ((185, 28, 28), (254, 202, 202)),
        };
        Palette { fg, bg }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayCell {
    pub day: u32,
    pub state: CellState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Band {
    pub first_day: u32,
    pub last_day: u32,
    pub cells: Vec<DayCell>,
}

impl Band {
    pub fn label(&self) -> String {
        format!("{} - {}", self.first_day, self.last_day)
    }
}

/// The grid: ten bands of ten consecutive days in ascending order.
pub fn bands(planner: &Planner) -> Vec<Band> {
    (0..DAY_COUNT / BAND_SIZE)
        .map(|band| {
            let first_day = band * BAND_SIZE + 1;
            let last_day = first_day + BAND_SIZE - 1;
            let cells = (first_day..=last_day)
                .map(|day| DayCell {
                    day,
                    state: CellState::of(planner.entries.get(&day)),
                })
                .collect();
            Band {
                first_day,
                last_day,
                cells,
            }
        })
        .collect()
}
