//! Optical power classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Health of an optical receive level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpticalStatus {
    /// Too weak to hold the link reliably.
    Critical,
    /// Weak but usable.
    Warning,
    Normal,
    /// Too strong; risks saturating the receiver.
    Overload,
}

impl OpticalStatus {
    pub fn is_healthy(self) -> bool {
        self == OpticalStatus::Normal
    }
}

impl fmt::Display for OpticalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Normal => "normal",
            Self::Overload => "overload",
        };
        f.write_str(s)
    }
}

/// Receive-power thresholds in dBm.
///
/// `power < critical_below` is critical, `power < warning_below` is a
/// warning, `power > overload_above` is overload, anything else is normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticalThresholds {
    pub critical_below: f64,
    pub warning_below: f64,
    pub overload_above: f64,
}

impl OpticalThresholds {
    /// GPON class B+ ONU receive window.
    pub const GPON_RX: OpticalThresholds = OpticalThresholds {
        critical_below: -30.0,
        warning_below: -27.0,
        overload_above: -8.0,
    };

    /// Classify a receive level. A missing reading (NaN) counts as critical.
    pub fn classify(&self, power_dbm: f64) -> OpticalStatus {
        if power_dbm.is_nan() || power_dbm < self.critical_below {
            OpticalStatus::Critical
        } else if power_dbm < self.warning_below {
            OpticalStatus::Warning
        } else if power_dbm > self.overload_above {
            OpticalStatus::Overload
        } else {
            OpticalStatus::Normal
        }
    }
}

impl Default for OpticalThresholds {
    fn default() -> Self {
        Self::GPON_RX
    }
}

/// Classify against the default GPON thresholds.
pub fn classify(power_dbm: f64) -> OpticalStatus {
    OpticalThresholds::GPON_RX.classify(power_dbm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(-30.01), OpticalStatus::Critical);
        assert_eq!(classify(-30.0), OpticalStatus::Warning);
        assert_eq!(classify(-27.01), OpticalStatus::Warning);
        assert_eq!(classify(-27.0), OpticalStatus::Normal);
        assert_eq!(classify(-8.0), OpticalStatus::Normal);
        assert_eq!(classify(-7.99), OpticalStatus::Overload);
    }

    #[test]
    fn test_typical_levels() {
        assert_eq!(classify(-19.5), OpticalStatus::Normal);
        assert!(classify(-19.5).is_healthy());
        assert_eq!(classify(f64::NEG_INFINITY), OpticalStatus::Critical);
        assert_eq!(classify(f64::NAN), OpticalStatus::Critical);
    }

    #[test]
    fn test_custom_thresholds() {
        let epon = OpticalThresholds {
            critical_below: -27.0,
            warning_below: -24.0,
            overload_above: -3.0,
        };
        assert_eq!(epon.classify(-25.0), OpticalStatus::Warning);
        assert_eq!(OpticalThresholds::GPON_RX.classify(-25.0), OpticalStatus::Normal);
    }
}
