//! Terminal rendering of planners, grids and day records.

use colored::{ColoredString, Colorize};
use std::fmt::Write;

use crate::model::{DAY_COUNT, DayEntry, Mood, Planner};
use crate::view::{self, CellState};

fn paint(text: &str, state: CellState) -> ColoredString {
    let palette = state.palette();
    let (fr, fg, fb) = palette.fg;
    let (br, bg, bb) = palette.bg;
    let painted = text.truecolor(fr, fg, fb).on_truecolor(br, bg, bb);
    if state == CellState::Untouched {
        painted
    } else {
        painted.bold()
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}

pub fn render_planner_list(planners: &[Planner], active_id: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "My planners".bold());
    for planner in planners {
        let active = planner.id == active_id;
        let marker = if active { "*" } else { " " };
        let title = if active {
            or_dash(&planner.title).bold().to_string()
        } else {
            or_dash(&planner.title).to_string()
        };
        let _ = writeln!(
            out,
            "{marker} {}  {title}  ({}% done, starts {})",
            planner.id.dimmed(),
            planner.completed_days(),
            or_dash(&planner.start_date),
        );
    }
    out
}

pub fn render_planner(planner: &Planner) -> String {
    let mut out = String::new();
    let end = view::format_date(view::end_date(&planner.start_date));
    let done = view::completed_count(planner);

    let _ = writeln!(out, "{}", or_dash(&planner.title).bold());
    let _ = writeln!(
        out,
        "Start: {}   End: {}",
        or_dash(&planner.start_date),
        or_dash(&end)
    );
    let _ = writeln!(out, "Goal: {}", or_dash(&planner.goal));
    let _ = writeln!(out, "Progress: {done}/{DAY_COUNT} ({done}%)");
    let _ = writeln!(out);

    for band in view::bands(planner) {
        let _ = write!(out, "{:>9}  ", band.label());
        for cell in &band.cells {
            let _ = write!(out, "{} ", paint(&format!("{:>3} ", cell.day), cell.state));
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let legend: Vec<String> = Mood::ALL
        .iter()
        .map(|&m| format!("{} {}", paint("   ", CellState::Mood(m)), m.label()))
        .chain(std::iter::once(format!(
            "{} Done",
            paint("   ", CellState::Done)
        )))
        .collect();
    let _ = writeln!(out, "{}", legend.join("  "));
    out
}

pub fn render_day(planner: &Planner, entry: &DayEntry) -> String {
    let mut out = String::new();
    let date = entry.date.clone().unwrap_or_else(|| {
        view::format_date(view::date_of_day(&planner.start_date, entry.day_number))
    });

    let heading = format!("Day {}", entry.day_number);
    if date.is_empty() {
        let _ = writeln!(out, "{}", heading.bold());
    } else {
        let _ = writeln!(out, "{} ({date})", heading.bold());
    }

    let status = if entry.completed {
        "completed".green().to_string()
    } else {
        "not completed".dimmed().to_string()
    };
    let _ = writeln!(out, "Status: {status}");

    let mood = entry
        .mood
        .map(|m| format!("{} {}", m.glyph(), m.label()))
        .unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "Mood: {mood}");

    if let Some(activities) = entry.activities.as_ref().filter(|a| !a.is_empty()) {
        let _ = writeln!(out, "Activities: {}", activities.join(", "));
    }

    let _ = writeln!(out, "Journal:");
    if entry.content.trim().is_empty() {
        let _ = writeln!(out, "  {}", "(empty)".dimmed());
    } else {
        for line in entry.content.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}
