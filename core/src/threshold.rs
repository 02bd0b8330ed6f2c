use crate::SensorSnapshot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A measured soil or climate parameter with a fixed threshold table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Nitrogen,
    Phosphorus,
    Potassium,
    Boron,
    Ph,
    Temperature,
    Moisture,
}

impl Parameter {
    /// The five soil parameters every recommendation pass walks through, in order.
    pub const SOIL: [Parameter; 5] = [
        Parameter::Nitrogen,
        Parameter::Phosphorus,
        Parameter::Potassium,
        Parameter::Boron,
        Parameter::Ph,
    ];

    pub const ALL: [Parameter; 7] = [
        Parameter::Nitrogen,
        Parameter::Phosphorus,
        Parameter::Potassium,
        Parameter::Boron,
        Parameter::Ph,
        Parameter::Temperature,
        Parameter::Moisture,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Parameter::Nitrogen => "Nitrogen (N)",
            Parameter::Phosphorus => "Phosphorus (P)",
            Parameter::Potassium => "Potassium (K)",
            Parameter::Boron => "Boron (B)",
            Parameter::Ph => "Soil pH",
            Parameter::Temperature => "Temperature",
            Parameter::Moisture => "Soil Moisture",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Nitrogen | Parameter::Phosphorus | Parameter::Potassium | Parameter::Boron => {
                "mg/kg"
            }
            Parameter::Ph => "",
            Parameter::Temperature => "°C",
            Parameter::Moisture => "%",
        }
    }

    /// Closed optimal interval `[lower, upper]`.
    pub fn optimal_range(&self) -> (f64, f64) {
        let bands = self.bands();
        let mut lower = f64::NEG_INFINITY;
        for band in bands {
            if band.status == SoilStatus::Optimal {
                return (lower, band.upper);
            }
            lower = band.upper;
        }
        (lower, f64::INFINITY)
    }

    /// Every label `classify` can return for this parameter.
    pub fn statuses(&self) -> Vec<SoilStatus> {
        self.bands().iter().map(|band| band.status).collect()
    }

    fn bands(&self) -> &'static [Band] {
        match self {
            Parameter::Nitrogen => NITROGEN,
            Parameter::Phosphorus => PHOSPHORUS,
            Parameter::Potassium => POTASSIUM,
            Parameter::Boron => BORON,
            Parameter::Ph => PH,
            Parameter::Temperature => TEMPERATURE,
            Parameter::Moisture => MOISTURE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoilStatus {
    Deficient,
    Low,
    Optimal,
    Excess,
    Toxic,
    TooAcidic,
    Acidic,
    Alkaline,
    TooAlkaline,
    TooCold,
    Cool,
    Warm,
    TooHot,
    Dry,
    Saturated,
}

impl SoilStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SoilStatus::Deficient => "DEFICIENT",
            SoilStatus::Low => "LOW",
            SoilStatus::Optimal => "OPTIMAL",
            SoilStatus::Excess => "EXCESS",
            SoilStatus::Toxic => "TOXIC",
            SoilStatus::TooAcidic => "TOO ACIDIC",
            SoilStatus::Acidic => "ACIDIC",
            SoilStatus::Alkaline => "ALKALINE",
            SoilStatus::TooAlkaline => "TOO ALKALINE",
            SoilStatus::TooCold => "TOO COLD",
            SoilStatus::Cool => "COOL",
            SoilStatus::Warm => "WARM",
            SoilStatus::TooHot => "TOO HOT",
            SoilStatus::Dry => "DRY",
            SoilStatus::Saturated => "SATURATED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SoilStatus::Optimal => Severity::None,
            SoilStatus::Low
            | SoilStatus::Acidic
            | SoilStatus::Alkaline
            | SoilStatus::Cool
            | SoilStatus::Warm => Severity::Medium,
            SoilStatus::Deficient
            | SoilStatus::Excess
            | SoilStatus::Toxic
            | SoilStatus::TooAcidic
            | SoilStatus::TooAlkaline
            | SoilStatus::TooCold
            | SoilStatus::TooHot
            | SoilStatus::Dry
            | SoilStatus::Saturated => Severity::High,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            SoilStatus::Optimal => "#10b981",
            SoilStatus::TooCold | SoilStatus::Saturated => "#3b82f6",
            SoilStatus::Cool => "#06b6d4",
            _ => match self.severity() {
                Severity::Medium => "#f59e0b",
                _ => "#ef4444",
            },
        }
    }

    pub fn is_optimal(&self) -> bool {
        *self == SoilStatus::Optimal
    }

    /// True for buckets below the optimal range.
    pub fn is_low_side(&self) -> bool {
        matches!(
            self,
            SoilStatus::Deficient
                | SoilStatus::Low
                | SoilStatus::TooAcidic
                | SoilStatus::Acidic
                | SoilStatus::TooCold
                | SoilStatus::Cool
                | SoilStatus::Dry
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Classification {
    pub parameter: Parameter,
    pub value: f64,
    pub status: SoilStatus,
    pub label: String,
    pub severity: Severity,
    pub color: String,
    pub hint: String,
}

/// One bucket of a threshold table. `upper` is exclusive unless `inclusive`.
#[derive(Debug)]
struct Band {
    upper: f64,
    inclusive: bool,
    status: SoilStatus,
    hint: &'static str,
}

impl Band {
    const fn below(upper: f64, status: SoilStatus, hint: &'static str) -> Self {
        Band {
            upper,
            inclusive: false,
            status,
            hint,
        }
    }

    const fn up_to(upper: f64, status: SoilStatus, hint: &'static str) -> Self {
        Band {
            upper,
            inclusive: true,
            status,
            hint,
        }
    }

    const fn rest(status: SoilStatus, hint: &'static str) -> Self {
        Band::up_to(f64::INFINITY, status, hint)
    }

    fn contains(&self, value: f64) -> bool {
        if self.inclusive {
            value <= self.upper
        } else {
            value < self.upper
        }
    }
}

const NITROGEN: &[Band] = &[
    Band::below(20.0, SoilStatus::Deficient, "Apply nitrogen fertilizer to boost plant growth"),
    Band::below(40.0, SoilStatus::Low, "Apply nitrogen fertilizer to boost plant growth"),
    Band::up_to(80.0, SoilStatus::Optimal, "Nitrogen levels are optimal for growth"),
    Band::rest(SoilStatus::Excess, "Reduce nitrogen to prevent over-growth"),
];

const PHOSPHORUS: &[Band] = &[
    Band::below(10.0, SoilStatus::Deficient, "Critical: apply fertilizer"),
    Band::below(15.0, SoilStatus::Low, "Needs supplementation"),
    Band::up_to(25.0, SoilStatus::Optimal, "Ideal for root growth"),
    Band::rest(SoilStatus::Excess, "Reduce phosphorus input"),
];

const POTASSIUM: &[Band] = &[
    Band::below(80.0, SoilStatus::Deficient, "Potassium critically low"),
    Band::below(120.0, SoilStatus::Low, "Enhance disease resistance"),
    Band::up_to(200.0, SoilStatus::Optimal, "Strong disease resistance"),
    Band::rest(SoilStatus::Excess, "Reduce potassium input"),
];

const BORON: &[Band] = &[
    Band::below(1.0, SoilStatus::Deficient, "Critical boron deficiency"),
    Band::below(1.5, SoilStatus::Low, "Monitor closely"),
    Band::up_to(3.0, SoilStatus::Optimal, "Safe levels maintained"),
    Band::up_to(4.0, SoilStatus::Excess, "Risk of toxicity"),
    Band::rest(
        SoilStatus::Toxic,
        "Reduce irrigation or avoid boron fertilizer - toxicity risk",
    ),
];

const PH: &[Band] = &[
    Band::below(5.5, SoilStatus::TooAcidic, "Add lime to increase pH and reduce acidity"),
    Band::below(6.0, SoilStatus::Acidic, "Add lime to increase pH and reduce acidity"),
    Band::up_to(7.5, SoilStatus::Optimal, "pH is optimal for nutrient availability"),
    Band::up_to(8.0, SoilStatus::Alkaline, "Add sulfur to decrease pH and reduce alkalinity"),
    Band::rest(SoilStatus::TooAlkaline, "Add sulfur to decrease pH and reduce alkalinity"),
];

const TEMPERATURE: &[Band] = &[
    Band::below(15.0, SoilStatus::TooCold, "Growth slowed"),
    Band::below(20.0, SoilStatus::Cool, "Growth slowed"),
    Band::up_to(30.0, SoilStatus::Optimal, "Growth optimal"),
    Band::up_to(35.0, SoilStatus::Warm, "Heat stress risk"),
    Band::rest(SoilStatus::TooHot, "Heat stress risk"),
];

const MOISTURE: &[Band] = &[
    Band::below(30.0, SoilStatus::Dry, "Irrigation urgently needed"),
    Band::below(50.0, SoilStatus::Low, "Schedule watering soon"),
    Band::up_to(80.0, SoilStatus::Optimal, "Well hydrated soil"),
    Band::rest(SoilStatus::Saturated, "Reduce watering frequency"),
];

/// Maps a reading onto the parameter's threshold table.
///
/// Total over `f64`: NaN is read as `0.0`, the same default ingestion uses for
/// non-numeric input, and infinities land in the outermost buckets.
pub fn classify(parameter: Parameter, value: f64) -> Classification {
    let value = if value.is_nan() { 0.0 } else { value };
    let bands = parameter.bands();
    let band = bands
        .iter()
        .find(|band| band.contains(value))
        .unwrap_or(&bands[bands.len() - 1]);

    Classification {
        parameter,
        value,
        status: band.status,
        label: band.status.label().to_owned(),
        severity: band.status.severity(),
        color: band.status.color().to_owned(),
        hint: band.hint.to_owned(),
    }
}

/// Classifies the soil parameters and, when present, temperature and moisture.
pub fn classify_snapshot(snapshot: &SensorSnapshot) -> Vec<Classification> {
    Parameter::ALL
        .iter()
        .filter_map(|parameter| {
            snapshot
                .value(*parameter)
                .map(|value| classify(*parameter, value))
        })
        .collect()
}
