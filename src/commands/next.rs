//! `salahtime next`: the upcoming prayer, the one before it and a countdown.

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::{CommandEnv, describe_location};
use crate::args::CommandOptions;
use crate::common::utils::format_remaining;
use crate::schedule::day_night::ThemeDecision;
use crate::schedule::next_event::{NextEventStatus, UpcomingEvent};

const PROGRESS_BAR_WIDTH: usize = 24;

pub fn handle_next_command(options: CommandOptions) -> Result<()> {
    log_version!();
    let env = CommandEnv::load(options)?;
    let planner = env.planner()?;
    let tz = *planner.timezone();
    let now = env.now(&tz)?;

    log_block_start!("Location: {}", describe_location(planner.location()));
    log_indented!("Method: {} ({})", planner.settings().method, planner.settings().madhab);

    let status = planner.status(now)?;
    display_status(&status, now, &tz);
    display_theme(&planner.theme(now), &tz);
    log_end!();
    Ok(())
}

fn display_status(status: &NextEventStatus, now: DateTime<Utc>, tz: &Tz) {
    let when = match &status.next {
        UpcomingEvent::Today(event) => event.time.clone(),
        UpcomingEvent::Tomorrow(event) => format!("{} tomorrow", event.time),
        UpcomingEvent::TomorrowMorning(instant) => {
            format!("{} tomorrow", instant.with_timezone(tz).format("%H:%M"))
        }
    };

    log_block_start!("Next: {} at {}", status.next.label(), when);
    log_indented!("Time remaining: {}", format_remaining(status.remaining));
    match &status.previous {
        Some(previous) => log_indented!("Previous: {} at {}", previous.label, previous.time),
        None => log_indented!("Previous: none yet today"),
    }
    log_indented!(
        "{} {:>3.0}%",
        progress_bar(status.progress),
        status.progress * 100.0
    );
    log_indented!("Now: {}", now.with_timezone(tz).format("%H:%M:%S"));
}

fn display_theme(decision: &ThemeDecision, tz: &Tz) {
    log_block_start!(
        "{} {} until {}",
        decision.variant.symbol(),
        decision.variant.display_name(),
        decision.next_check.with_timezone(tz).format("%H:%M")
    );
}

/// Text progress bar, e.g. `[██████······]`.
fn progress_bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * PROGRESS_BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "█".repeat(filled),
        "·".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}]", "·".repeat(24)));
        assert_eq!(progress_bar(1.0), format!("[{}]", "█".repeat(24)));
        assert_eq!(
            progress_bar(0.5),
            format!("[{}{}]", "█".repeat(12), "·".repeat(12))
        );
        assert_eq!(progress_bar(7.0), progress_bar(1.0));
    }
}
