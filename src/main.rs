// DateKeeper - recurring date reminders
// Prints today's events, the next 30 days, and reminders due today

use anyhow::{Context, Result};
use datekeeper::config::{self, AppConfig};
use datekeeper::reminders::due_reminders_with;
use datekeeper::utils::logging::{init_logging, log_error_with_context};
use datekeeper::{recurrence, Database, Event, LeapDayPolicy};
use log::info;

const UPCOMING_LIMIT: usize = 20;

fn describe(event: &Event, today: chrono::NaiveDate, policy: LeapDayPolicy) -> String {
    let next = event.next_occurrence_with(today, policy);
    match event.milestone_years(next) {
        Some(years) if years > 0 => format!("{} ({}, turns {})", event.title, event.event_type, years),
        _ => format!("{} ({})", event.title, event.event_type),
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config::validate_config(&config).context("Invalid configuration")?;

    let db = Database::open(&config.db_path).await?;
    let settings = db.get_settings().await.context("Failed to load settings")?;
    let policy = config.leap_day_policy.unwrap_or(settings.leap_day_policy);
    let store = db.event_store_with(policy);
    let today = recurrence::today();

    let todays = store.today(today).await.context("Failed to load today's events")?;
    let upcoming = store
        .upcoming(UPCOMING_LIMIT, today)
        .await
        .context("Failed to load upcoming events")?;
    let all = store.all().await.context("Failed to load events")?;
    let due = due_reminders_with(&all, today, policy);
    info!("Loaded {} events, {} reminders due", all.len(), due.len());

    println!("Today, {}:", today.format("%A %B %-d, %Y"));
    if todays.is_empty() {
        println!("  nothing today");
    }
    for event in &todays {
        println!("  {}", describe(event, today, policy));
    }

    println!("\nNext {} days:", recurrence::UPCOMING_WINDOW_DAYS);
    if upcoming.is_empty() {
        println!("  nothing coming up");
    }
    for event in &upcoming {
        println!(
            "  {:>3}d  {}  {}",
            event.days_until_with(today, policy),
            event.next_occurrence_with(today, policy).format("%b %-d"),
            describe(event, today, policy)
        );
    }

    let ahead: Vec<_> = due.iter().filter(|r| !r.is_day_of()).collect();
    if settings.notifications_enabled && !ahead.is_empty() {
        println!("\nReminders:");
        for reminder in ahead {
            println!("  {}", reminder.summary());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    info!("Starting DateKeeper");

    if let Err(e) = run().await {
        log_error_with_context(e.as_ref(), "Startup");
        eprintln!("DateKeeper failed: {:#}", e);
        std::process::exit(1);
    }
}
