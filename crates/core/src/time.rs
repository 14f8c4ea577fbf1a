use std::{
    fmt,
    ops::{Add, Deref},
};

use thiserror::Error;
use uom::{
    Conversion,
    si::{f64::Time, time},
};

/// A unit-safe, strictly positive duration used to advance the coupling clock.
///
/// Both the solver's own suggestion and the substrate's admissible sub-step
/// are combined into a `TimeIncrement` before they reach a time loop, so a
/// running clock never holds a zero or negative step.
///
/// ```ignore
/// use tandem_core::TimeIncrement;
/// use uom::si::time::second;
///
/// let dt = TimeIncrement::new::<second>(0.1)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeIncrement(Time);

/// Error type returned when constructing an invalid [`TimeIncrement`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TimeIncrementError {
    #[error("time increment must be greater than zero, got {0} s")]
    NotPositive(f64),

    #[error("time increment must be finite, got {0} s")]
    NotFinite(f64),
}

impl TimeIncrement {
    /// Constructs a `TimeIncrement` from a numeric value and unit.
    ///
    /// # Errors
    ///
    /// Returns [`TimeIncrementError::NotPositive`] if `value` is zero or
    /// negative, and [`TimeIncrementError::NotFinite`] for NaN or infinity.
    pub fn new<U>(value: f64) -> Result<Self, TimeIncrementError>
    where
        U: time::Unit + Conversion<f64, T = f64>,
    {
        Self::from_time(Time::new::<U>(value))
    }

    /// Constructs a `TimeIncrement` from a raw number of seconds.
    ///
    /// Coupling substrates exchange plain `f64` seconds, so this is the usual
    /// entry point at the substrate boundary.
    ///
    /// # Errors
    ///
    /// See [`TimeIncrement::new`].
    pub fn from_seconds(seconds: f64) -> Result<Self, TimeIncrementError> {
        Self::new::<time::second>(seconds)
    }

    /// Constructs a `TimeIncrement` from an existing [`Time`].
    ///
    /// # Errors
    ///
    /// See [`TimeIncrement::new`].
    pub fn from_time(value: Time) -> Result<Self, TimeIncrementError> {
        let seconds = value.get::<time::second>();
        if !seconds.is_finite() {
            Err(TimeIncrementError::NotFinite(seconds))
        } else if seconds > 0.0 {
            Ok(Self(value))
        } else {
            Err(TimeIncrementError::NotPositive(seconds))
        }
    }

    /// Returns the increment in seconds.
    #[must_use]
    pub fn seconds(self) -> f64 {
        self.0.get::<time::second>()
    }

    /// Returns the smaller of two increments.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if other.0 < self.0 { other } else { self }
    }

    /// Returns the larger of two increments.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 { other } else { self }
    }

    /// Consumes the `TimeIncrement` and returns the underlying [`Time`] value.
    #[must_use]
    pub fn into_inner(self) -> Time {
        self.0
    }
}

impl TryFrom<Time> for TimeIncrement {
    type Error = TimeIncrementError;
    fn try_from(t: Time) -> Result<Self, Self::Error> {
        Self::from_time(t)
    }
}

impl Deref for TimeIncrement {
    type Target = Time;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Advances a [`Time`] by an increment.
impl Add<TimeIncrement> for Time {
    type Output = Time;
    fn add(self, rhs: TimeIncrement) -> Self::Output {
        self + rhs.0
    }
}

impl fmt::Display for TimeIncrement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.seconds())
    }
}

/// Returns a [`Time`] in seconds.
///
/// Shorthand used wherever plain substrate numbers become unit-safe times.
#[must_use]
pub fn seconds(value: f64) -> Time {
    Time::new::<time::second>(value)
}

/// Returns the value of a [`Time`] in seconds.
#[must_use]
pub fn as_seconds(time: Time) -> f64 {
    time.get::<time::second>()
}
