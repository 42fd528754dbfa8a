//! `salahtime widget`: write today's payload for a home-screen widget.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};

use super::{CommandEnv, describe_location};
use crate::args::CommandOptions;
use crate::common::utils::private_path;
use crate::planner::DayPlanner;
use crate::prayer::payload::PrayerResponse;
use crate::state::ArtifactSink;

pub fn handle_widget_command(options: CommandOptions) -> Result<()> {
    log_version!();
    let env = CommandEnv::load(options)?;
    let planner = env.planner()?;
    let now = env.now(planner.timezone())?;
    let sink = ArtifactSink::new(env.config.widget_path()?);

    log_block_start!("Location: {}", describe_location(planner.location()));
    let response = write_widget(&planner, &sink, now)?;

    match response {
        PrayerResponse::Payload(payload) => {
            let method = payload
                .method_selection
                .as_ref()
                .map_or(payload.method_requested.as_str(), |s| s.used());
            log_block_start!(
                "Widget data for {} ({method}) written to {}",
                payload.date,
                private_path(sink.path())
            );
            log_end!();
            Ok(())
        }
        PrayerResponse::Error(error) => {
            log_pipe!();
            log_warning!("Wrote error payload to {}", private_path(sink.path()));
            bail!("{}: {}", error.message, error.details)
        }
    }
}

/// Compute today's response and replace the widget file with it.
///
/// A failed computation is still written, as an error object, so the widget
/// never shows a stale day as current.
pub fn write_widget(
    planner: &DayPlanner,
    sink: &ArtifactSink,
    now: DateTime<Utc>,
) -> Result<PrayerResponse> {
    let response = planner.response(now);
    sink.write(&response)?;
    Ok(response)
}
