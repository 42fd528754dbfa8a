//! `salahtime watch`: keep the widget file current.
//!
//! The loop rewrites the widget file, then sleeps until the earliest of three
//! timers: the next prayer boundary, local midnight and the next day/night
//! switch. SIGHUP or SIGUSR2 reloads the configuration and recomputes at
//! once; SIGINT or SIGTERM stops the loop and releases the lock.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration as StdDuration;

use super::{CommandEnv, describe_location};
use crate::args::CommandOptions;
use crate::common::constants::THEME_RETRY_MINUTES;
use crate::common::utils::{format_remaining, private_path};
use crate::io::lock::{acquire_lock, default_lock_path};
use crate::planner::DayPlanner;
use crate::schedule::next_event::next_midnight_rollover;
use crate::schedule::timers::{TimerPurpose, TimerQueue};
use crate::signals::{SignalMessage, SignalState, setup_signal_handler};
use crate::state::ArtifactSink;
use crate::time_source;

use super::widget::write_widget;

/// Delay after a prayer boundary before recomputing, so the boundary itself
/// already counts as passed.
const BOUNDARY_DELAY_SECONDS: i64 = 1;

/// Upper bound on a single wait when no timer is pending.
const IDLE_WAIT: StdDuration = StdDuration::from_secs(3600);

pub fn handle_watch_command(options: CommandOptions) -> Result<()> {
    log_version!();
    let env = CommandEnv::load(options)?;

    let lock = acquire_lock(&default_lock_path())?;
    log_block_start!("Lock acquired at {}", private_path(lock.path()));

    let signal_state = setup_signal_handler(env.options.debug_enabled)?;
    let result = run_watch_loop(env, &signal_state);
    drop(lock);

    result?;
    log_block_start!("Watcher stopped");
    log_end!();
    Ok(())
}

/// What the loop is currently working from.
struct WatchContext {
    env: CommandEnv,
    planner: DayPlanner,
    sink: ArtifactSink,
}

impl WatchContext {
    fn build(env: CommandEnv) -> Result<Self> {
        let planner = env.planner()?;
        let sink = ArtifactSink::new(env.config.widget_path()?);
        log_block_start!("Location: {}", describe_location(planner.location()));
        log_indented!(
            "Method: {} ({}), writing {}",
            planner.settings().method,
            planner.settings().madhab,
            private_path(sink.path())
        );
        Ok(Self { env, planner, sink })
    }

    /// Reload the configuration. A broken config keeps the previous context.
    fn reload(self) -> Self {
        let rebuilt = CommandEnv::load(self.env.options.clone()).and_then(Self::build);
        match rebuilt {
            Ok(context) => context,
            Err(e) => {
                log_pipe!();
                log_warning!("Reload failed, keeping the previous settings: {e:#}");
                self
            }
        }
    }
}

fn run_watch_loop(env: CommandEnv, signal_state: &SignalState) -> Result<()> {
    let mut context = WatchContext::build(env)?;
    let mut now = context.env.now(context.planner.timezone())?;
    let mut timers = TimerQueue::new();

    refresh(&context, &mut timers, now);

    while signal_state.is_running() {
        let wait = timers.time_until_next(now).unwrap_or(IDLE_WAIT);
        if context.env.options.debug_enabled
            && let Some((purpose, _)) = timers.next_due()
        {
            log_debug!("Next wake-up: {purpose} in {}", format_remaining(wait));
        }

        match wait_for_signal(signal_state, wait) {
            Ok(SignalMessage::Shutdown) => break,
            Ok(SignalMessage::Refresh) => {
                log_block_start!("Reloading configuration");
                context = context.reload();
                now = time_source::now();
                refresh(&context, &mut timers, now);
                continue;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if !signal_state.is_running() {
                    break;
                }
                log_pipe!();
                log_warning!("Signal handler disconnected unexpectedly");
                log_indented!("Signals will no longer be processed");
            }
        }

        now = time_source::now();
        let due = timers.pop_due(now);
        if !due.is_empty() {
            for purpose in &due {
                log_block_start!("Timer fired: {purpose}");
            }
            refresh(&context, &mut timers, now);
        }
    }

    Ok(())
}

/// Block until a signal arrives or `wait` elapses.
///
/// With a simulated clock the wait advances the clock instead of blocking for
/// real, while signals are still polled.
fn wait_for_signal(
    signal_state: &SignalState,
    wait: StdDuration,
) -> Result<SignalMessage, RecvTimeoutError> {
    if !time_source::is_simulated() {
        return signal_state.signal_receiver.recv_timeout(wait);
    }

    let sleep_handle = std::thread::spawn(move || time_source::sleep(wait));
    loop {
        match signal_state
            .signal_receiver
            .recv_timeout(StdDuration::from_millis(10))
        {
            Ok(message) => return Ok(message),
            Err(RecvTimeoutError::Timeout) => {
                if sleep_handle.is_finished() {
                    return Err(RecvTimeoutError::Timeout);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Rewrite the widget file and re-arm every timer from `now`.
fn refresh(context: &WatchContext, timers: &mut TimerQueue, now: DateTime<Utc>) {
    match write_widget(&context.planner, &context.sink, now) {
        Ok(response) => match response.payload() {
            Some(payload) => log_decorated!("Widget data updated for {}", payload.date),
            None => log_warning!("Prayer times unavailable, wrote error payload"),
        },
        Err(e) => log_warning!("Failed to write widget data: {e:#}"),
    }

    arm_timers(&context.planner, timers, now);
}

/// Schedule the next prayer boundary, local midnight and the next theme check.
///
/// When the next event cannot be computed the prayer refresh is retried after
/// a short delay instead.
fn arm_timers(planner: &DayPlanner, timers: &mut TimerQueue, now: DateTime<Utc>) {
    timers.clear();

    let prayer_refresh = match planner.status(now) {
        Ok(status) => {
            log_indented!(
                "Next: {} in {}",
                status.next.label(),
                format_remaining(status.remaining)
            );
            status.next.instant() + Duration::seconds(BOUNDARY_DELAY_SECONDS)
        }
        Err(e) => {
            log_warning!("Next prayer unavailable: {e}");
            now + Duration::minutes(THEME_RETRY_MINUTES)
        }
    };
    timers.schedule(TimerPurpose::PrayerRefresh, prayer_refresh);

    timers.schedule(
        TimerPurpose::MidnightRollover,
        next_midnight_rollover(now, planner.timezone()),
    );

    let theme = planner.theme(now);
    log_indented!(
        "{} {}",
        theme.variant.symbol(),
        theme.variant.display_name()
    );
    timers.schedule(TimerPurpose::ThemeSwitch, theme.next_check);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::location::{LocationFix, LocationSource};
    use crate::prayer::calculator::{PrayerCalculator, PrayerKind};
    use crate::prayer::registry::MethodRegistry;
    use crate::schedule::next_event::UpcomingEvent;
    use chrono::TimeZone;

    fn planner(registry: MethodRegistry) -> DayPlanner {
        let location = LocationFix {
            lat: 51.5074,
            lon: -0.1278,
            accuracy: None,
            label: "London".to_string(),
            source: LocationSource::Configured,
        };
        DayPlanner::new(
            PrayerCalculator::new(registry),
            location,
            chrono_tz::Europe::London,
        )
    }

    #[test]
    fn test_arm_timers_schedules_every_purpose() {
        let planner = planner(MethodRegistry::build());
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 13, 0, 0).unwrap();
        let mut timers = TimerQueue::new();

        arm_timers(&planner, &mut timers, now);
        assert_eq!(timers.len(), 3);

        let status = planner.status(now).unwrap();
        let UpcomingEvent::Today(event) = &status.next else {
            panic!("expected an event later today");
        };
        assert_eq!(event.kind, PrayerKind::Asr);
        assert_eq!(
            timers.deadline(TimerPurpose::PrayerRefresh),
            Some(event.instant + Duration::seconds(1))
        );

        // Local midnight in BST is 23:00 UTC
        assert_eq!(
            timers.deadline(TimerPurpose::MidnightRollover),
            Some(Utc.with_ymd_and_hms(2024, 6, 21, 23, 0, 1).unwrap())
        );
        assert_eq!(
            timers.deadline(TimerPurpose::ThemeSwitch),
            Some(planner.theme(now).next_check)
        );

        // Asr comes before sunset, so it wakes the loop first
        assert_eq!(
            timers.next_due().map(|(purpose, _)| purpose),
            Some(TimerPurpose::PrayerRefresh)
        );
    }

    #[test]
    fn test_arm_timers_retries_when_unavailable() {
        let planner = planner(MethodRegistry::build_from(&[]));
        let now = Utc.with_ymd_and_hms(2024, 6, 21, 13, 0, 0).unwrap();
        let mut timers = TimerQueue::new();

        arm_timers(&planner, &mut timers, now);
        assert_eq!(
            timers.deadline(TimerPurpose::PrayerRefresh),
            Some(now + Duration::minutes(THEME_RETRY_MINUTES))
        );
        assert_eq!(timers.len(), 3);
    }

    #[test]
    fn test_rearming_replaces_old_deadlines() {
        let planner = planner(MethodRegistry::build());
        let mut timers = TimerQueue::new();

        let morning = Utc.with_ymd_and_hms(2024, 6, 21, 6, 0, 0).unwrap();
        arm_timers(&planner, &mut timers, morning);
        let first = timers.deadline(TimerPurpose::PrayerRefresh).unwrap();

        let evening = Utc.with_ymd_and_hms(2024, 6, 21, 19, 0, 0).unwrap();
        arm_timers(&planner, &mut timers, evening);
        let second = timers.deadline(TimerPurpose::PrayerRefresh).unwrap();

        assert!(second > first);
        assert_eq!(timers.len(), 3);
    }
}
