use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::telemetry::TelemetrySnapshot;

/// Lid capacity used when none is configured, in centimetres.
pub const DEFAULT_CAPACITY_CM: f64 = 10.0;

const GREEN_MAX: f64 = 50.0;
const YELLOW_MAX: f64 = 80.0;
const PERCENT_MIN: f64 = 0.0;
const PERCENT_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillIndicator {
    Green,
    Yellow,
    Red,
}

impl FillIndicator {
    /// First matching threshold wins. `percentage` must already be in range.
    fn from_percentage(percentage: f64) -> Self {
        if percentage <= GREEN_MAX {
            FillIndicator::Green
        } else if percentage <= YELLOW_MAX {
            FillIndicator::Yellow
        } else {
            FillIndicator::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FillIndicator::Green => "green",
            FillIndicator::Yellow => "yellow",
            FillIndicator::Red => "red",
        }
    }
}

impl std::fmt::Display for FillIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LidState {
    Opened,
    #[default]
    Closed,
}

impl LidState {
    fn from_height(height: f64, capacity: f64) -> Self {
        if height > capacity {
            LidState::Opened
        } else {
            LidState::Closed
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LidState::Opened => "Opened",
            LidState::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for LidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A percentage outside `[0, 100]`. The indicator is computed from the
/// clamped value and the raw reading is kept here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anomaly {
    BelowRange(f64),
    AboveRange(f64),
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::BelowRange(p) => write!(f, "percentage {} below 0", p),
            Anomaly::AboveRange(p) => write!(f, "percentage {} above 100", p),
        }
    }
}

/// Display state of one bin, derived from the latest snapshot only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BinState {
    pub height: Option<f64>,
    pub percentage: Option<f64>,
    pub color_indicator: Option<FillIndicator>,
    pub lid_state: LidState,
    pub anomaly: Option<Anomaly>,
}

impl BinState {
    /// Nothing received yet: lid closed, everything else absent.
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn has_reading(&self) -> bool {
        self.percentage.is_some()
    }

    /// Next state after `snapshot`. Nothing of `self` is carried over.
    pub fn apply(&self, snapshot: &TelemetrySnapshot, capacity: f64) -> BinState {
        derive(snapshot, capacity)
    }
}

pub fn derive(snapshot: &TelemetrySnapshot, capacity: f64) -> BinState {
    let percentage = snapshot.percentage;
    let anomaly = if percentage < PERCENT_MIN {
        Some(Anomaly::BelowRange(percentage))
    } else if percentage > PERCENT_MAX {
        Some(Anomaly::AboveRange(percentage))
    } else {
        None
    };
    if let Some(anomaly) = anomaly {
        warn!("Out of range telemetry: {}", anomaly);
    }

    BinState {
        height: Some(snapshot.height),
        percentage: Some(percentage),
        color_indicator: Some(FillIndicator::from_percentage(
            percentage.clamp(PERCENT_MIN, PERCENT_MAX),
        )),
        lid_state: LidState::from_height(snapshot.height, capacity),
        anomaly,
    }
}
