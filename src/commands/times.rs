//! `salahtime times`: print the prayer times for one day.

use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};

use super::{CommandEnv, describe_location};
use crate::args::CommandOptions;
use crate::prayer::payload::{DailyPrayerPayload, MethodResult, share_text};

pub fn handle_times_command(options: CommandOptions) -> Result<()> {
    log_version!();
    let env = CommandEnv::load(options)?;
    let planner = env.planner()?;
    let now = env.now(planner.timezone())?;
    let date = env.options.date.unwrap_or_else(|| planner.local_date(now));

    let payload = planner.compute(date, now)?;
    display_payload(&payload);
    log_end!();
    Ok(())
}

fn display_payload(payload: &DailyPrayerPayload) {
    log_block_start!("Prayer times for {}", payload.date.format("%A %-d %B %Y"));
    log_indented!("Location: {}", describe_location(&payload.location));
    log_indented!("Timezone: {}", payload.timezone);
    log_indented!("Madhab: {}", payload.madhab);

    if let Some(selection) = &payload.method_selection
        && selection.is_fallback()
    {
        log_indented!(
            "Method '{}' unavailable, showing {}",
            payload.method_requested,
            selection.used()
        );
    }

    let is_friday = payload.date.weekday() == Weekday::Fri;
    for (name, result) in &payload.results {
        display_method(payload.date, name, result, is_friday);
    }
}

fn display_method(date: NaiveDate, name: &str, result: &MethodResult, is_friday: bool) {
    log_block_start!("{name}");
    // share_text starts with a title and a blank line; the rows follow
    for line in share_text(date, &result.rows(is_friday)).lines().skip(2) {
        log_indented!("{line}");
    }
}
