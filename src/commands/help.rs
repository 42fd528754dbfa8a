//! Help command implementation for salahtime.
//!
//! Shows command-specific help, or the general overview when no command is
//! named.

use anyhow::Result;

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => crate::args::display_help(),
        Some("times") => display_times_help(),
        Some("next") => display_next_help(),
        Some("qibla") => display_qibla_help(),
        Some("widget") => display_widget_help(),
        Some("watch") => display_watch_help(),
        Some("settings") => display_settings_help(),
        Some("help") => display_help_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {}", unknown);
            crate::args::display_help();
        }
    }
    Ok(())
}

fn display_times_help() {
    log_version!();
    log_block_start!("times - Show the day's prayer times");
    log_block_start!("Usage: salahtime times [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("--date <YYYY-MM-DD>   Compute another date (default: today)");
    log_indented!("--lat <deg> --lon <deg>  Location (default: config, then fallback)");
    log_indented!("-m, --method <name>   MWL, ISNA, Egypt, Karachi, UmmAlQura,");
    log_indented!("                      Tehran, Moonsighting or Makkah");
    log_indented!("--madhab <name>       shafi or hanafi (Asr shadow length)");
    log_indented!("-a, --all             Compute every available method");
    log_indented!("--adjust <p>=<min>    Shift one prayer, e.g. --adjust fajr=10");
    log_block_start!("Examples:");
    log_indented!("salahtime times --lat 21.4225 --lon 39.8262 -m UmmAlQura");
    log_indented!("salahtime times --all --date 2025-03-01");
    log_end!();
}

fn display_next_help() {
    log_version!();
    log_block_start!("next - Show the next prayer with a countdown");
    log_block_start!("Usage: salahtime next [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("--at <YYYY-MM-DD HH:MM>  Evaluate at a local time instead of now");
    log_indented!("All location and calculation options of 'times' apply.");
    log_end!();
}

fn display_qibla_help() {
    log_version!();
    log_block_start!("qibla - Show the direction of the Kaaba");
    log_block_start!("Usage: salahtime qibla [--heading <deg>] [OPTIONS]");
    log_block_start!("Options:");
    log_indented!("--heading <deg>   Current device heading, to show the turn needed");
    log_indented!("--lat/--lon       Location (default: config, then fallback)");
    log_end!();
}

fn display_widget_help() {
    log_version!();
    log_block_start!("widget - Write today's data for a home-screen widget");
    log_block_start!("Usage: salahtime widget [OPTIONS]");
    log_indented!("The file location is set by 'widget_path' in salahtime.toml.");
    log_indented!("A failed computation writes an error object instead.");
    log_end!();
}

fn display_watch_help() {
    log_version!();
    log_block_start!("watch - Keep the widget data current");
    log_block_start!("Usage: salahtime watch [OPTIONS]");
    log_indented!("Rewrites the widget file at every prayer, at local midnight and");
    log_indented!("at every sunrise/sunset. Only one watcher runs at a time.");
    log_block_start!("Signals:");
    log_indented!("SIGHUP, SIGUSR2   Reload configuration and recompute now");
    log_indented!("SIGINT, SIGTERM   Stop");
    log_end!();
}

fn display_settings_help() {
    log_version!();
    log_block_start!("settings - Show or save calculation preferences");
    log_block_start!("Usage: salahtime settings [-m <name>] [--madhab <name>] [--adjust <p>=<min>...]");
    log_indented!("Without options, prints the stored preferences.");
    log_indented!("With options, merges them into the stored preferences.");
    log_indented!("Keys set in salahtime.toml still take precedence.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: salahtime help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("salahtime help");
    log_indented!("salahtime help qibla");
    log_end!();
}
