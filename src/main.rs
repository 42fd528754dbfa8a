//! Binary entry point: parse the command line and dispatch to a command.
//!
//! All behavior lives in the library; this file only maps a [`CliAction`] to
//! its handler and turns a failure into an error line and exit status.

use salahtime::args::{self, CliAction, ParsedArgs};
use salahtime::commands;
use salahtime::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use salahtime::{log_end, log_error, log_pipe};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Times { options } => commands::times::handle_times_command(options),
        CliAction::Next { options } => commands::next::handle_next_command(options),
        CliAction::Qibla { options, heading } => {
            commands::qibla::handle_qibla_command(options, heading)
        }
        CliAction::Widget { options } => commands::widget::handle_widget_command(options),
        CliAction::Watch { options } => commands::watch::handle_watch_command(options),
        CliAction::Settings { options } => commands::settings::handle_settings_command(options),
    };

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            log_pipe!();
            log_error!("{e:#}");
            log_end!();
            std::process::exit(EXIT_FAILURE);
        }
    }
}
