use colored::Colorize;
use dialoguer::Confirm;
use tracing::debug;

use crate::advice::{AdviceClient, AdviceRequest};
use crate::cli::{Cli, Command, LogArguments, PlannerTarget};
use crate::error::{ServiceError, ServiceResult};
use crate::metadata::{PKG_DESCRIPTION, PKG_LICENSE, PKG_NAME, PKG_VERSION};
use crate::model::{DayEntry, PlannerPatch};
use crate::persistence::{FileStore, KeyValueStore};
use crate::render;
use crate::store::PlannerStore;

/// Exact id, or an id prefix matching exactly one planner.
pub fn resolve_planner_id<S: KeyValueStore>(
    store: &PlannerStore<S>,
    raw: &str,
) -> ServiceResult<String> {
    let raw = raw.trim();
    if let Some(planner) = store.get(raw) {
        return Ok(planner.id.clone());
    }
    let matches: Vec<&str> = store
        .planners()
        .iter()
        .filter(|p| !raw.is_empty() && p.id.starts_with(raw))
        .map(|p| p.id.as_str())
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(ServiceError::InvalidInput(format!("No planner with id '{raw}'"))),
        _ => Err(ServiceError::InvalidInput(format!(
            "Id prefix '{raw}' matches {} planners",
            matches.len()
        ))),
    }
}

fn target_id<S: KeyValueStore>(
    store: &PlannerStore<S>,
    target: &PlannerTarget,
) -> ServiceResult<String> {
    match &target.planner {
        Some(raw) => resolve_planner_id(store, raw),
        None => Ok(store.active_id().to_string()),
    }
}

/// Apply the log flags to the day's current record.
pub fn edited_entry(current: DayEntry, args: &LogArguments) -> DayEntry {
    let mut entry = current;
    entry.day_number = args.day;
    if args.done {
        entry.completed = true;
    }
    if args.undone {
        entry.completed = false;
    }
    if let Some(mood) = args.mood {
        entry.mood = Some(mood);
    }
    if args.clear_mood {
        entry.mood = None;
    }
    if let Some(content) = &args.content {
        entry.content = content.clone();
    }
    entry
}

fn day_entry<S: KeyValueStore>(
    store: &PlannerStore<S>,
    planner_id: &str,
    day: u32,
) -> ServiceResult<DayEntry> {
    store
        .entry(planner_id, day)
        .ok_or_else(|| ServiceError::InvalidInput(format!("Day {day} is out of range")))
}

pub fn version_text() -> String {
    format!("{PKG_NAME} {PKG_VERSION} ({PKG_LICENSE})\n{PKG_DESCRIPTION}")
}

fn print_version() {
    println!("{}", version_text());
}

/// Run one command against the given store.
pub async fn execute<S: KeyValueStore>(
    command: Command,
    store: &mut PlannerStore<S>,
    advice: &AdviceClient,
) -> ServiceResult<()> {
    match command {
        Command::List => {
            print!(
                "{}",
                render::render_planner_list(store.planners(), store.active_id())
            );
        }
        Command::Show(target) => {
            let id = target_id(store, &target)?;
            if let Some(planner) = store.get(&id) {
                print!("{}", render::render_planner(planner));
            }
        }
        Command::New { title } => {
            let planner = store.create(title.as_deref())?;
            println!("Created {} ({})", planner.title.bold(), planner.id);
        }
        Command::Delete { id, yes } => {
            let id = resolve_planner_id(store, &id)?;
            if store.planners().len() > 1 && !yes {
                let title = store.get(&id).map(|p| p.title.clone()).unwrap_or_default();
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Delete planner '{title}'? This cannot be undone."
                    ))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Nothing deleted.");
                    return Ok(());
                }
            }
            store.delete(&id)?;
            println!("Deleted. Active planner: {}", store.active().title.bold());
        }
        Command::Switch { id } => {
            let id = resolve_planner_id(store, &id)?;
            store.set_active(&id)?;
            println!("Active planner: {}", store.active().title.bold());
        }
        Command::Title { title, target } => {
            let id = target_id(store, &target)?;
            store.update(&id, PlannerPatch::title(title))?;
        }
        Command::Goal { goal, target } => {
            let id = target_id(store, &target)?;
            store.update(&id, PlannerPatch::goal(goal))?;
        }
        Command::Start { date, target } => {
            let id = target_id(store, &target)?;
            store.update(&id, PlannerPatch::start_date(date))?;
            if let Some(planner) = store.get(&id) {
                let end = crate::view::format_date(crate::view::end_date(&planner.start_date));
                if !end.is_empty() {
                    println!("{} -> {}", planner.start_date, end);
                }
            }
        }
        Command::Day { day, target } => {
            let id = target_id(store, &target)?;
            let entry = day_entry(store, &id, day)?;
            if let Some(planner) = store.get(&id) {
                print!("{}", render::render_day(planner, &entry));
            }
        }
        Command::Log(args) => {
            let id = target_id(store, &args.target)?;
            let entry = edited_entry(day_entry(store, &id, args.day)?, &args);
            store.upsert_entry(&id, entry.clone())?;
            if let Some(planner) = store.get(&id) {
                print!("{}", render::render_day(planner, &entry));
            }
        }
        Command::Advice { day, target } => {
            let id = target_id(store, &target)?;
            let entry = day_entry(store, &id, day)?;
            let goal = store.get(&id).map(|p| p.goal.clone()).unwrap_or_default();
            if advice.is_configured() {
                eprintln!("{}", format!("Asking the coach about day {day}...").dimmed());
            }
            let text = advice
                .get_advice_async(AdviceRequest::for_entry(&goal, &entry))
                .await;
            println!("{text}");
        }
        Command::Version => print_version(),
    }
    Ok(())
}

pub async fn run(cli: Cli) -> ServiceResult<()> {
    cli.settings.validate().map_err(ServiceError::InvalidInput)?;
    if matches!(cli.command, Command::Version) {
        print_version();
        return Ok(());
    }

    let data_dir = cli
        .settings
        .resolve_data_dir()
        .map_err(ServiceError::InvalidInput)?;
    let file_store = FileStore::open_in(&data_dir)?;
    debug!(path = %file_store.path().display(), "opening planner storage");

    let mut store = PlannerStore::open(file_store)?;
    let advice = AdviceClient::new(cli.settings.advice_config());
    execute(cli.command, &mut store, &advice).await
}
