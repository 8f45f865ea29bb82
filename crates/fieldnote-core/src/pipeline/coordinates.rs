//! Degrees/minutes/seconds to signed decimal degrees.

use std::fmt;
use std::str::FromStr;

use crate::error::CoordinateError;

/// Hemisphere reference attached to a GPS reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    N,
    S,
    E,
    W,
}

/// Which coordinate a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }

    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

impl Hemisphere {
    /// Southern and western hemispheres are negative.
    pub fn sign(self) -> f64 {
        match self {
            Hemisphere::S | Hemisphere::W => -1.0,
            Hemisphere::N | Hemisphere::E => 1.0,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Hemisphere::N | Hemisphere::S => Axis::Latitude,
            Hemisphere::E | Hemisphere::W => Axis::Longitude,
        }
    }
}

impl FromStr for Hemisphere {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('\0').to_ascii_uppercase().as_str() {
            "N" => Ok(Hemisphere::N),
            "S" => Ok(Hemisphere::S),
            "E" => Ok(Hemisphere::E),
            "W" => Ok(Hemisphere::W),
            _ => Err(CoordinateError::Hemisphere(s.to_string())),
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Hemisphere::N => "N",
            Hemisphere::S => "S",
            Hemisphere::E => "E",
            Hemisphere::W => "W",
        };
        f.write_str(c)
    }
}

/// Convert `[degrees, minutes, seconds]` plus hemisphere to decimal degrees.
///
/// `d + m/60 + s/3600`, negated for `S` and `W`. Malformed readings return an
/// error instead of producing NaN.
pub fn normalize(dms: &[f64], hemisphere: Hemisphere) -> Result<f64, CoordinateError> {
    let [d, m, s] = match dms {
        [d, m, s] => [*d, *m, *s],
        _ => return Err(CoordinateError::Arity { found: dms.len() }),
    };
    for (index, value) in [d, m, s].into_iter().enumerate() {
        if !value.is_finite() {
            return Err(CoordinateError::NonFinite { index });
        }
        if value < 0.0 {
            return Err(CoordinateError::Negative { index });
        }
    }
    Ok(hemisphere.sign() * (d + m / 60.0 + s / 3600.0))
}

/// Normalize a reading that must lie on `axis`, range-checked.
pub fn normalize_on_axis(
    dms: &[f64],
    hemisphere: Hemisphere,
    axis: Axis,
) -> Result<f64, CoordinateError> {
    if hemisphere.axis() != axis {
        return Err(CoordinateError::Hemisphere(format!(
            "{hemisphere} on {}",
            axis.name()
        )));
    }
    let value = normalize(dms, hemisphere)?;
    if value.abs() > axis.limit() {
        return Err(CoordinateError::OutOfRange {
            axis: axis.name(),
            value,
        });
    }
    Ok(value)
}
