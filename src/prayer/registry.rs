//! Named registry of constructible calculation methods.

use serde::{Deserialize, Serialize};

use crate::common::constants::FALLBACK_METHOD;
use crate::error::SalahError;
use crate::prayer::method::{CalculationParameters, PresetBuilder, default_presets};

/// Which method a request ended up using.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MethodSelection {
    /// The requested method was available.
    Requested { name: String },
    /// The requested method was missing; `used` was chosen instead.
    Fallback { requested: String, used: String },
}

impl MethodSelection {
    /// Name of the method whose parameters were used.
    pub fn used(&self) -> &str {
        match self {
            MethodSelection::Requested { name } => name,
            MethodSelection::Fallback { used, .. } => used,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, MethodSelection::Fallback { .. })
    }
}

/// Presets that constructed successfully, in registration order.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    methods: Vec<CalculationParameters>,
    unavailable: Vec<SalahError>,
}

impl MethodRegistry {
    /// Build the registry from every known preset.
    pub fn build() -> Self {
        Self::build_from(&default_presets())
    }

    /// Build from an explicit builder list. A failing builder only removes its
    /// own entry; the failure is logged and kept in [`Self::unavailable`].
    pub fn build_from(builders: &[(&str, PresetBuilder)]) -> Self {
        let mut registry = Self::default();

        for (name, builder) in builders {
            match builder() {
                Ok(mut params) => {
                    params.name = name.to_string();
                    registry.methods.push(params);
                }
                Err(e) => {
                    let err = SalahError::MethodUnavailable {
                        method: name.to_string(),
                        reason: e.to_string(),
                    };
                    log_pipe!();
                    log_warning!("{err}");
                    registry.unavailable.push(err);
                }
            }
        }

        registry
    }

    pub fn get(&self, name: &str) -> Option<&CalculationParameters> {
        self.methods.iter().find(|params| params.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.methods.iter().map(|params| params.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalculationParameters> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Presets that failed to construct.
    pub fn unavailable(&self) -> &[SalahError] {
        &self.unavailable
    }

    /// Choose parameters for `requested`.
    ///
    /// Candidates, in order: the requested name, the Moonsighting preset, the
    /// first registered preset. An empty registry is `ComputationUnavailable`.
    pub fn select(&self, requested: &str) -> Result<MethodSelection, SalahError> {
        let first = self.methods.first().map(|params| params.name.as_str());
        let candidates = [Some(requested), Some(FALLBACK_METHOD), first];

        let used = candidates
            .into_iter()
            .flatten()
            .find(|name| self.contains(name))
            .ok_or_else(|| SalahError::ComputationUnavailable {
                reason: "no calculation methods available".to_string(),
            })?;

        if used == requested {
            Ok(MethodSelection::Requested {
                name: used.to_string(),
            })
        } else {
            Ok(MethodSelection::Fallback {
                requested: requested.to_string(),
                used: used.to_string(),
            })
        }
    }
}
