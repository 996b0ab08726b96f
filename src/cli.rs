use clap::{Args, Parser, Subcommand};

use crate::config::Settings;
use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::model::Mood;
use crate::view::{format_date, parse_date};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List all planners
    List,
    /// Show the 100-day grid of a planner
    Show(PlannerTarget),
    /// Create a new planner and make it active
    New {
        /// Title for the new planner
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete a planner (the last one cannot be deleted)
    Delete {
        /// Planner id or unique id prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Make another planner active
    Switch {
        /// Planner id or unique id prefix
        id: String,
    },
    /// Rename a planner
    Title {
        title: String,
        #[command(flatten)]
        target: PlannerTarget,
    },
    /// Set the goal of a planner
    Goal {
        goal: String,
        #[command(flatten)]
        target: PlannerTarget,
    },
    /// Set the start date (YYYY-MM-DD, or "" to clear)
    Start {
        #[arg(value_parser = parse_start_date)]
        date: String,
        #[command(flatten)]
        target: PlannerTarget,
    },
    /// Show the record for one day
    Day {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=100))]
        day: u32,
        #[command(flatten)]
        target: PlannerTarget,
    },
    /// Record completion, mood and journal text for one day
    Log(LogArguments),
    /// Ask the AI coach about one day
    Advice {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=100))]
        day: u32,
        #[command(flatten)]
        target: PlannerTarget,
    },
    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlannerTarget {
    /// Planner id or unique id prefix (defaults to the active planner)
    #[arg(long, short)]
    pub planner: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LogArguments {
    /// Day number (1-100)
    #[arg(value_parser = clap::value_parser!(u32).range(1..=100))]
    pub day: u32,

    /// Mark the day as completed
    #[arg(long, conflicts_with = "undone")]
    pub done: bool,

    /// Mark the day as not completed (the mood is kept)
    #[arg(long)]
    pub undone: bool,

    /// Mood: happy, calm, neutral, tired, sad or stressed
    #[arg(long, conflicts_with = "clear_mood")]
    pub mood: Option<Mood>,

    /// Remove the recorded mood
    #[arg(long)]
    pub clear_mood: bool,

    /// Journal text (replaces the current text)
    #[arg(long)]
    pub content: Option<String>,

    #[command(flatten)]
    pub target: PlannerTarget,
}

/// Accepts a calendar date, normalized to `YYYY-MM-DD`, or an empty string.
pub fn parse_start_date(raw: &str) -> Result<String, String> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }
    parse_date(raw)
        .map(|d| format_date(Some(d)))
        .ok_or_else(|| format!("'{raw}' is not a date; use YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_log_flags() {
        let cli = Cli::try_parse_from([
            "hundred-days",
            "log",
            "7",
            "--done",
            "--mood",
            "Calm",
            "--content",
            "walked",
        ])
        .unwrap();
        let Command::Log(args) = cli.command else {
            panic!("expected log command");
        };
        assert_eq!(args.day, 7);
        assert!(args.done);
        assert_eq!(args.mood, Some(Mood::Calm));
        assert_eq!(args.content.as_deref(), Some("walked"));
    }

    #[test]
    fn rejects_out_of_range_days_and_bad_moods() {
        assert!(Cli::try_parse_from(["hundred-days", "day", "0"]).is_err());
        assert!(Cli::try_parse_from(["hundred-days", "day", "101"]).is_err());
        assert!(Cli::try_parse_from(["hundred-days", "log", "3", "--mood", "angry"]).is_err());
        assert!(Cli::try_parse_from(["hundred-days", "log", "3", "--done", "--undone"]).is_err());
    }

    #[test]
    fn start_date_is_normalized_or_cleared() {
        assert_eq!(parse_start_date("2024-01-01").unwrap(), "2024-01-01");
        assert_eq!(parse_start_date("").unwrap(), "");
        assert!(parse_start_date("01/02/2024").is_err());
    }

    #[test]
    fn global_settings_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "hundred-days",
            "list",
            "--data-dir",
            "/tmp/hd",
            "--language",
            "Korean",
        ])
        .unwrap();
        assert_eq!(cli.settings.language, "Korean");
        assert_eq!(
            cli.settings.data_dir.as_deref(),
            Some(std::path::Path::new("/tmp/hd"))
        );
    }
}
