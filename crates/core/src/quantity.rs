use std::{fmt, str::FromStr};

use thiserror::Error;

/// A surface quantity exchanged across the coupling interface.
///
/// Scalar quantities carry one value per interface vertex; [`Velocity`]
/// carries one value per spatial component.
///
/// [`Velocity`]: Quantity::Velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    Temperature,
    HeatFlux,
    Pressure,
    Velocity,
}

/// Error returned when parsing an unknown quantity name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown coupling quantity `{0}`")]
pub struct UnknownQuantity(pub String);

impl Quantity {
    /// Every quantity, in a fixed order.
    pub const ALL: [Quantity; 4] = [
        Quantity::Temperature,
        Quantity::HeatFlux,
        Quantity::Pressure,
        Quantity::Velocity,
    ];

    /// The data name the coupling substrate registers this quantity under.
    #[must_use]
    pub fn data_name(self) -> &'static str {
        match self {
            Quantity::Temperature => "Temperature",
            Quantity::HeatFlux => "Heat-Flux",
            Quantity::Pressure => "Pressure",
            Quantity::Velocity => "Velocity",
        }
    }

    /// Number of values per interface vertex in a `dimension`-D run.
    #[must_use]
    pub fn components(self, dimension: usize) -> usize {
        match self {
            Quantity::Velocity => dimension,
            Quantity::Temperature | Quantity::HeatFlux | Quantity::Pressure => 1,
        }
    }

    /// Returns `true` for quantities with one value per vertex.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(self, Quantity::Velocity)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_name())
    }
}

/// Parses either the substrate data name (`Heat-Flux`) or the variant name
/// (`HeatFlux`), ignoring ASCII case.
impl FromStr for Quantity {
    type Err = UnknownQuantity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "temperature" => Ok(Quantity::Temperature),
            "heatflux" => Ok(Quantity::HeatFlux),
            "pressure" => Ok(Quantity::Pressure),
            "velocity" => Ok(Quantity::Velocity),
            _ => Err(UnknownQuantity(s.to_string())),
        }
    }
}
