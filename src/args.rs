//! Command-line argument parsing and processing.
//!
//! Parsing never fails: malformed input is reported with a warning and turns
//! into [`CliAction::ShowHelpDueToError`]. Values are checked for shape here
//! (numbers, dates, `name=minutes` pairs); range checks happen where the
//! values are used, against the same rules as the config file.

use chrono::NaiveDate;
use std::str::FromStr;

use crate::prayer::calculator::PrayerKind;

/// Options shared by every command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions {
    pub debug_enabled: bool,
    pub config_dir: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Calendar date to compute, in the location's zone.
    pub date: Option<NaiveDate>,
    /// Pin "now" to a local `YYYY-MM-DD HH:MM[:SS]`.
    pub at: Option<String>,
    pub method: Option<String>,
    pub madhab: Option<String>,
    pub all_methods: bool,
    pub timezone: Option<String>,
    /// `--adjust name=minutes`, in the order given.
    pub adjustments: Vec<(PrayerKind, i64)>,
}

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Print the day's times (the default command)
    Times { options: CommandOptions },
    /// Print the next and previous event with a countdown
    Next { options: CommandOptions },
    /// Print the qibla bearing and distance, optionally against a heading
    Qibla {
        options: CommandOptions,
        heading: Option<f64>,
    },
    /// Compute and write the widget artifact
    Widget { options: CommandOptions },
    /// Keep the widget artifact current until stopped
    Watch { options: CommandOptions },
    /// Show or update the stored calculation preferences
    Settings { options: CommandOptions },
    /// Show detailed help for one command
    HelpCommand { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

const COMMANDS: [&str; 7] = ["times", "next", "qibla", "widget", "watch", "settings", "help"];

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// The first item is the program name and is skipped. Flags may appear
    /// before or after the command.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut options = CommandOptions::default();
        let mut heading: Option<f64> = None;
        let mut command: Option<String> = None;
        let mut help_topic: Option<String> = None;
        let mut display_help = false;
        let mut display_version = false;
        let mut error_found = false;

        let mut i = 0;
        while i < args_vec.len() {
            let arg = args_vec[i].as_str();

            // Flags that consume the next argument. Negative numbers are valid
            // values, so the next argument is taken even if it starts with '-'.
            let takes_value = matches!(
                arg,
                "--config"
                    | "-c"
                    | "--lat"
                    | "--lon"
                    | "--date"
                    | "--at"
                    | "--method"
                    | "-m"
                    | "--madhab"
                    | "--timezone"
                    | "--heading"
                    | "--adjust"
            );
            if takes_value {
                let Some(value) = args_vec.get(i + 1) else {
                    log_warning!("Missing value for {arg}");
                    error_found = true;
                    break;
                };
                if !apply_value(arg, value, &mut options, &mut heading) {
                    error_found = true;
                }
                i += 2;
                continue;
            }

            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => options.debug_enabled = true,
                "--all" | "-a" => options.all_methods = true,
                flag if flag.starts_with('-') => {
                    log_warning!("Unknown argument: {flag}");
                    error_found = true;
                }
                word => {
                    if command.as_deref() == Some("help") && help_topic.is_none() {
                        help_topic = Some(word.to_string());
                    } else if let Some(existing) = &command {
                        log_error!("Cannot use multiple commands at once: '{existing}' and '{word}'");
                        error_found = true;
                    } else if COMMANDS.contains(&word) {
                        command = Some(word.to_string());
                    } else {
                        log_warning!("Unknown command: {word}");
                        error_found = true;
                    }
                }
            }
            i += 1;
        }

        // Help and version take precedence over everything else
        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if error_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        match (options.latitude, options.longitude) {
            (Some(_), None) | (None, Some(_)) => {
                log_warning!("--lat and --lon must be given together");
                return ParsedArgs {
                    action: CliAction::ShowHelpDueToError,
                };
            }
            _ => {}
        }

        let command = command.unwrap_or_else(|| "times".to_string());
        if heading.is_some() && command != "qibla" {
            log_warning!("--heading is only valid with the qibla command");
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let action = match command.as_str() {
            "next" => CliAction::Next { options },
            "qibla" => CliAction::Qibla { options, heading },
            "widget" => CliAction::Widget { options },
            "watch" => CliAction::Watch { options },
            "settings" => CliAction::Settings { options },
            "help" => CliAction::HelpCommand {
                command: help_topic,
            },
            _ => CliAction::Times { options },
        };
        ParsedArgs { action }
    }

    /// Parse the process arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Store one flag value. Returns false (after warning) when it is malformed.
fn apply_value(
    flag: &str,
    value: &str,
    options: &mut CommandOptions,
    heading: &mut Option<f64>,
) -> bool {
    match flag {
        "--config" | "-c" => options.config_dir = Some(value.to_string()),
        "--lat" => match parse_number(flag, value) {
            Some(lat) => options.latitude = Some(lat),
            None => return false,
        },
        "--lon" => match parse_number(flag, value) {
            Some(lon) => options.longitude = Some(lon),
            None => return false,
        },
        "--heading" => match parse_number(flag, value) {
            Some(degrees) => *heading = Some(degrees),
            None => return false,
        },
        "--date" => match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => options.date = Some(date),
            Err(_) => {
                log_warning!("Invalid date '{value}'. Use YYYY-MM-DD");
                return false;
            }
        },
        "--at" => options.at = Some(value.to_string()),
        "--method" | "-m" => options.method = Some(value.to_string()),
        "--madhab" => options.madhab = Some(value.to_string()),
        "--timezone" => options.timezone = Some(value.to_string()),
        "--adjust" => match parse_adjustment(value) {
            Some(pair) => options.adjustments.push(pair),
            None => {
                log_warning!("Invalid adjustment '{value}'. Use <prayer>=<minutes>, e.g. fajr=10");
                return false;
            }
        },
        _ => return false,
    }
    true
}

fn parse_number(flag: &str, value: &str) -> Option<f64> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Some(number),
        _ => {
            log_warning!("Invalid number for {flag}: {value}");
            None
        }
    }
}

/// Parse `name=minutes`, e.g. `fajr=10` or `isha=-5`.
fn parse_adjustment(value: &str) -> Option<(PrayerKind, i64)> {
    let (name, minutes) = value.split_once('=')?;
    let kind = PrayerKind::from_str(name.trim()).ok()?;
    let minutes = minutes.trim().parse::<i64>().ok()?;
    Some((kind, minutes))
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("salahtime [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>       Use custom configuration directory");
    log_indented!("-d, --debug              Enable detailed debug output");
    log_indented!("-h, --help               Print help information");
    log_indented!("-V, --version            Print version information");
    log_indented!("    --lat <deg>          Latitude (with --lon)");
    log_indented!("    --lon <deg>          Longitude (with --lat)");
    log_indented!("    --date <YYYY-MM-DD>  Compute for another date");
    log_indented!("    --at <datetime>      Pin the current time (local YYYY-MM-DD HH:MM)");
    log_indented!("-m, --method <name>      Calculation method");
    log_indented!("    --madhab <name>      shafi or hanafi");
    log_indented!("-a, --all                Compute every available method");
    log_indented!("    --timezone <zone>    IANA zone for displayed times");
    log_indented!("    --adjust <p>=<min>   Minute offset, repeatable (e.g. fajr=10)");
    log_block_start!("Commands:");
    log_indented!("times                    Show the day's prayer times (default)");
    log_indented!("next                     Show the next prayer with a countdown");
    log_indented!("qibla [--heading <deg>]  Show the qibla bearing and distance");
    log_indented!("widget                   Write the widget data file");
    log_indented!("watch                    Keep the widget data file up to date");
    log_indented!("settings                 Show or save calculation preferences");
    log_indented!("help [COMMAND]           Show detailed help for a command");
    log_end!();
}
