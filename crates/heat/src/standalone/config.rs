use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use tandem_core::Quantity;

use super::SubstrateError;

/// How the standalone substrate iterates each time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Scheme {
    /// One pass per window, no checkpoints.
    #[default]
    Explicit,

    /// A fixed number of passes per window, rolling back between them.
    Implicit,
}

/// Configuration of the [`StandaloneSubstrate`](super::StandaloneSubstrate).
///
/// ```toml
/// Participant = "Solid"
/// Mesh = "Solid-Mesh"
/// Dimensions = 2
/// MaxTimeWindow = 0.1
/// EndTime = 1.0
/// Scheme = "Implicit"
/// Iterations = 3
/// InitialData = true
/// Data = ["Temperature", "Heat-Flux"]
///
/// [Peer]
/// Heat-Flux = 250.0
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct StandaloneConfig {
    /// Participant allowed to configure the substrate; any if absent.
    #[serde(default)]
    pub participant: Option<String>,

    /// Name of the single interface mesh.
    pub mesh: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Length of one coupling time window in seconds.
    pub max_time_window: f64,

    /// End of the coupled run in seconds.
    pub end_time: f64,

    #[serde(default)]
    pub scheme: Scheme,

    /// Passes per window under [`Scheme::Implicit`].
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// Whether the participant must provide initial data.
    #[serde(default)]
    pub initial_data: bool,

    /// Data names exchanged on the mesh.
    pub data: Vec<String>,

    /// Constant values the simulated peer sends, by data name.
    #[serde(default)]
    pub peer: BTreeMap<String, f64>,
}

fn default_dimensions() -> usize {
    2
}

fn default_iterations() -> usize {
    1
}

impl StandaloneConfig {
    /// Reads and validates a TOML coupling configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SubstrateError::Io`], [`SubstrateError::Parse`], or
    /// [`SubstrateError::InvalidConfig`].
    pub fn from_path(path: &Path) -> Result<Self, SubstrateError> {
        let text = fs::read_to_string(path).map_err(|source| SubstrateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SubstrateError::InvalidConfig`] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<(), SubstrateError> {
        let invalid = |reason: String| Err(SubstrateError::InvalidConfig(reason));

        if !matches!(self.dimensions, 2 | 3) {
            return invalid(format!("Dimensions must be 2 or 3, got {}", self.dimensions));
        }
        if !(self.max_time_window.is_finite() && self.max_time_window > 0.0) {
            return invalid(format!(
                "MaxTimeWindow must be positive, got {}",
                self.max_time_window
            ));
        }
        if !(self.end_time.is_finite() && self.end_time > 0.0) {
            return invalid(format!("EndTime must be positive, got {}", self.end_time));
        }
        if self.iterations == 0 {
            return invalid("Iterations must be at least 1".to_string());
        }
        for name in self.data.iter().chain(self.peer.keys()) {
            if let Err(err) = name.parse::<Quantity>() {
                return invalid(err.to_string());
            }
        }
        if let Some(name) = self.peer.keys().find(|name| !self.data.contains(name)) {
            return invalid(format!("peer value `{name}` is not listed in Data"));
        }
        Ok(())
    }
}

impl std::str::FromStr for StandaloneConfig {
    type Err = SubstrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMPLICIT: &str = r#"
        Mesh = "Solid-Mesh"
        MaxTimeWindow = 0.1
        EndTime = 1.0
        Scheme = "Implicit"
        Iterations = 3
        Data = ["Temperature", "Heat-Flux"]

        [Peer]
        Heat-Flux = 250.0
    "#;

    #[test]
    fn parses_with_defaults() {
        let config: StandaloneConfig = IMPLICIT.parse().unwrap();
        assert_eq!(config.dimensions, 2);
        assert_eq!(config.scheme, Scheme::Implicit);
        assert_eq!(config.iterations, 3);
        assert!(!config.initial_data);
        assert_eq!(config.peer.get("Heat-Flux"), Some(&250.0));
    }

    #[test]
    fn unknown_data_is_rejected() {
        let text = IMPLICIT.replace("\"Temperature\"", "\"Salinity\"");
        assert!(matches!(
            text.parse::<StandaloneConfig>(),
            Err(SubstrateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn peer_values_must_be_exchanged() {
        let text = IMPLICIT.replace("Heat-Flux = 250.0", "Pressure = 1.0");
        assert!(matches!(
            text.parse::<StandaloneConfig>(),
            Err(SubstrateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let text = format!("Colour = 3\n{IMPLICIT}");
        assert!(matches!(
            text.parse::<StandaloneConfig>(),
            Err(SubstrateError::Parse(_))
        ));
    }
}
