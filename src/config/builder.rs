//! Default configuration file generation.
//!
//! The generated file documents every key with an aligned trailing comment.
//! Values come from `common::constants`, so changing a default there changes
//! what new users get.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::prayer::method::METHOD_NAMES;

/// Write a commented default config to `path`, creating parent directories.
///
/// Coordinates are left commented out so the device location is used until
/// the user fills them in. When a `geo.toml` already sits next to `path`,
/// the location section points there instead.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let geo_file_present = path
        .parent()
        .map(|dir| dir.join("geo.toml").exists())
        .unwrap_or(false);

    let builder = ConfigBuilder::new()
        .add_section("Calculation")
        .add_setting(
            "method",
            &format!("\"{DEFAULT_METHOD}\""),
            &format!("One of: {}", METHOD_NAMES.join(", ")),
        )
        .add_setting(
            "madhab",
            &format!("\"{DEFAULT_MADHAB}\""),
            "Asr convention: \"shafi\" or \"hanafi\"",
        )
        .add_setting(
            "high_latitude_rule",
            &format!("\"{DEFAULT_HIGH_LATITUDE_RULE}\""),
            "\"middle_of_the_night\", \"seventh_of_the_night\" or \"twilight_angle\"",
        )
        .add_setting("all_methods", "false", "Compute every available method")
        .add_section("Location")
        .add_setting(
            "location_timeout_ms",
            &DEFAULT_LOCATION_TIMEOUT_MS.to_string(),
            &format!(
                "Wait for a device fix ({MINIMUM_LOCATION_TIMEOUT_MS}-{MAXIMUM_LOCATION_TIMEOUT_MS}) ms"
            ),
        )
        .add_setting(
            "fallback_latitude",
            &format!("{FALLBACK_LATITUDE:.4}"),
            "Used when the device location is unavailable",
        )
        .add_setting(
            "fallback_longitude",
            &format!("{FALLBACK_LONGITUDE:.4}"),
            "Used when the device location is unavailable",
        );

    let builder = if geo_file_present {
        builder.add_comment("latitude/longitude are read from geo.toml")
    } else {
        builder
            .add_comment("latitude = 51.507400    # Fixed location instead of the device location")
            .add_comment("longitude = -0.127800")
    };

    let content = builder
        .add_comment("timezone = \"Europe/London\"  # Override the zone derived from coordinates")
        .add_table(
            "adjustments",
            &format!("Minutes added after calculation (-{MAXIMUM_ADJUSTMENT_MINUTES}..{MAXIMUM_ADJUSTMENT_MINUTES})"),
        )
        .add_setting("fajr", "0", "")
        .add_setting("sunrise", "0", "")
        .add_setting("dhuhr", "0", "Also applies to Jummah")
        .add_setting("asr", "0", "")
        .add_setting("maghrib", "0", "")
        .add_setting("isha", "0", "")
        .build();

    fs::write(path, content)
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_indented!("Created default config: {}", private_path(path));
    Ok(())
}

/// Builder for config files with aligned comments.
///
/// The comment column is computed from the longest setting line, so the
/// output stays aligned whatever the default values are.
struct ConfigBuilder {
    entries: Vec<EntryType>,
}

enum EntryType {
    Section(String),
    Table { name: String, comment: String },
    Setting { line: String, comment: String },
    Comment(String),
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(EntryType::Section(format!("#[{title}]")));
        self
    }

    /// A real TOML table header. Settings after it belong to the table.
    fn add_table(mut self, name: &str, comment: &str) -> Self {
        self.entries.push(EntryType::Table {
            name: format!("[{name}]"),
            comment: comment.to_string(),
        });
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(EntryType::Setting {
            line: format!("{key} = {value}"),
            comment: comment.to_string(),
        });
        self
    }

    /// A commented-out line, written verbatim after `# `.
    fn add_comment(mut self, text: &str) -> Self {
        self.entries.push(EntryType::Comment(format!("# {text}")));
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                EntryType::Setting { line, .. } => Some(line.len()),
                EntryType::Table { name, .. } => Some(name.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let aligned = |line: &str, comment: &str| {
            if comment.is_empty() {
                line.to_string()
            } else {
                let padding = " ".repeat(max_width - line.len());
                format!("{line}{padding}# {comment}")
            }
        };

        let mut result = Vec::new();
        for (index, entry) in self.entries.into_iter().enumerate() {
            match entry {
                EntryType::Section(title) => {
                    if index > 0 {
                        result.push(String::new());
                    }
                    result.push(title);
                }
                EntryType::Table { name, comment } => {
                    result.push(String::new());
                    result.push(aligned(&name, &comment));
                }
                EntryType::Setting { line, comment } => result.push(aligned(&line, &comment)),
                EntryType::Comment(text) => result.push(text),
            }
        }

        let mut content = result.join("\n");
        content.push('\n');
        content
    }
}
