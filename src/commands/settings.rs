//! `salahtime settings`: show or update the stored calculation preferences.

use anyhow::{Context, Result, bail};

use super::CommandEnv;
use crate::args::CommandOptions;
use crate::common::constants::MAXIMUM_ADJUSTMENT_MINUTES;
use crate::common::utils::private_path;
use crate::config::Config;
use crate::prayer::calculator::AdjustmentSet;
use crate::prayer::method::{Madhab, canonical_method_name};
use crate::state::{QuranSettings, SalahSettings};

pub fn handle_settings_command(options: CommandOptions) -> Result<()> {
    log_version!();
    let env = CommandEnv::load(options)?;
    let store = env.settings_store()?;

    let current = SalahSettings::load(&store);
    match merge_updates(&env.options, &current)? {
        Some(updated) => {
            updated.save(&store)?;
            log_block_start!("Saved to {}", private_path(store.path()));
            display_salah(&updated);
            warn_config_overrides(&env.config);
        }
        None => {
            log_block_start!("Stored in {}", private_path(store.path()));
            display_salah(&current);
            display_quran(&QuranSettings::load(&store));
        }
    }
    log_end!();
    Ok(())
}

/// Apply the `--method`, `--madhab` and `--adjust` flags to `current`.
///
/// Returns `None` when no flag asks for a change.
pub fn merge_updates(
    options: &CommandOptions,
    current: &SalahSettings,
) -> Result<Option<SalahSettings>> {
    if options.method.is_none() && options.madhab.is_none() && options.adjustments.is_empty() {
        return Ok(None);
    }

    let mut updated = current.clone();
    if let Some(name) = options.method.as_deref() {
        updated.method = canonical_method_name(name)
            .with_context(|| format!("Unknown method '{name}'"))?
            .to_string();
    }
    if let Some(name) = options.madhab.as_deref() {
        updated.madhab = name.parse::<Madhab>()?;
    }
    for (kind, minutes) in &options.adjustments {
        if minutes.abs() > MAXIMUM_ADJUSTMENT_MINUTES {
            bail!(
                "Adjustment for {} ({minutes} minutes) must be between -{MAXIMUM_ADJUSTMENT_MINUTES} and {MAXIMUM_ADJUSTMENT_MINUTES}",
                kind.key()
            );
        }
        updated.adjustments.set(*kind, *minutes);
    }
    Ok(Some(updated))
}

fn display_salah(settings: &SalahSettings) {
    log_block_start!("Prayer settings");
    log_indented!("Method: {}", settings.method);
    log_indented!("Madhab: {}", settings.madhab);
    log_indented!("Adjustments: {}", describe_adjustments(&settings.adjustments));
}

fn display_quran(settings: &QuranSettings) {
    log_block_start!("Recitation settings");
    log_indented!("Reciter: {}", settings.reciter);
    log_indented!("Play translation: {}", settings.play_translation);
    log_indented!(
        "Prefer offline audio: {}",
        settings.use_offline_audio_when_available
    );
}

/// Keys in `salahtime.toml` win over stored preferences.
fn warn_config_overrides(config: &Config) {
    let mut overridden = Vec::new();
    if config.method.is_some() {
        overridden.push("method");
    }
    if config.madhab.is_some() {
        overridden.push("madhab");
    }
    if config.adjustments.is_some() {
        overridden.push("adjustments");
    }
    if !overridden.is_empty() {
        log_pipe!();
        log_warning!(
            "salahtime.toml sets {}, which takes precedence over stored settings",
            overridden.join(", ")
        );
    }
}

/// `fajr +10, isha -3`, or `none` when every offset is zero.
fn describe_adjustments(adjustments: &AdjustmentSet) -> String {
    let parts: Vec<String> = adjustments
        .iter()
        .filter(|(_, minutes)| *minutes != 0)
        .map(|(kind, minutes)| format!("{} {minutes:+}", kind.key()))
        .collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prayer::calculator::PrayerKind;
    use crate::state::MemorySettingsStore;

    #[test]
    fn test_no_flags_means_no_update() {
        let current = SalahSettings::default();
        assert_eq!(
            merge_updates(&CommandOptions::default(), &current).unwrap(),
            None
        );
    }

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let mut current = SalahSettings::default();
        current.adjustments.set(PrayerKind::Fajr, 5);

        let options = CommandOptions {
            method: Some("ummalqura".to_string()),
            adjustments: vec![(PrayerKind::Isha, -3)],
            ..Default::default()
        };
        let updated = merge_updates(&options, &current).unwrap().unwrap();
        assert_eq!(updated.method, "UmmAlQura");
        assert_eq!(updated.madhab, current.madhab);
        assert_eq!(updated.adjustments.get(PrayerKind::Fajr), 5);
        assert_eq!(updated.adjustments.get(PrayerKind::Isha), -3);
    }

    #[test]
    fn test_merge_rejects_bad_values() {
        let current = SalahSettings::default();
        let bad_method = CommandOptions {
            method: Some("Lunar".to_string()),
            ..Default::default()
        };
        assert!(merge_updates(&bad_method, &current).is_err());

        let bad_madhab = CommandOptions {
            madhab: Some("maliki".to_string()),
            ..Default::default()
        };
        assert!(merge_updates(&bad_madhab, &current).is_err());

        let too_far = CommandOptions {
            adjustments: vec![(PrayerKind::Dhuhr, -200)],
            ..Default::default()
        };
        assert!(merge_updates(&too_far, &current).is_err());
    }

    #[test]
    fn test_saved_update_loads_back() {
        let store = MemorySettingsStore::new();
        let options = CommandOptions {
            madhab: Some("shafi".to_string()),
            ..Default::default()
        };
        let updated = merge_updates(&options, &SalahSettings::load(&store))
            .unwrap()
            .unwrap();
        updated.save(&store).unwrap();

        let loaded = SalahSettings::load(&store);
        assert_eq!(loaded.madhab, Madhab::Shafi);
        assert_eq!(loaded.method, "Moonsighting");
    }

    #[test]
    fn test_describe_adjustments() {
        let mut adjustments = AdjustmentSet::default();
        assert_eq!(describe_adjustments(&adjustments), "none");
        adjustments.set(PrayerKind::Fajr, 10);
        adjustments.set(PrayerKind::Isha, -3);
        assert_eq!(describe_adjustments(&adjustments), "fajr +10, isha -3");
    }
}
