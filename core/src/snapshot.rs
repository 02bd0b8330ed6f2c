use crate::threshold::Parameter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Latest reading set of a farm. Overwritten in place on every ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
    pub boron: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(
        default,
        rename = "humidity",
        alias = "moisture",
        skip_serializing_if = "Option::is_none"
    )]
    pub moisture: Option<f64>,
    #[serde(default = "Utc::now")]
    pub last_update: DateTime<Utc>,
}

impl SensorSnapshot {
    pub const DEMO_NITROGEN: f64 = 45.0;
    pub const DEMO_PHOSPHORUS: f64 = 35.0;
    pub const DEMO_POTASSIUM: f64 = 120.0;
    pub const DEMO_PH: f64 = 6.8;
    pub const DEMO_BORON: f64 = 2.1;

    /// Dashboard defaults served for farms that never reported.
    pub fn demo() -> Self {
        SensorSnapshot {
            nitrogen: Self::DEMO_NITROGEN,
            phosphorus: Self::DEMO_PHOSPHORUS,
            potassium: Self::DEMO_POTASSIUM,
            ph: Self::DEMO_PH,
            boron: Self::DEMO_BORON,
            temperature: None,
            moisture: None,
            last_update: Utc::now(),
        }
    }

    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Nitrogen => Some(self.nitrogen),
            Parameter::Phosphorus => Some(self.phosphorus),
            Parameter::Potassium => Some(self.potassium),
            Parameter::Boron => Some(self.boron),
            Parameter::Ph => Some(self.ph),
            Parameter::Temperature => self.temperature,
            Parameter::Moisture => self.moisture,
        }
    }
}

/// Append-only copy of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorHistoryRecord {
    pub id: String,
    #[serde(flatten)]
    pub snapshot: SensorSnapshot,
    pub timestamp: DateTime<Utc>,
}

/// The three values the AI remedy flow reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RemedyReading {
    pub nitrogen: f64,
    pub ph: f64,
    pub boron: f64,
}

impl From<&SensorSnapshot> for RemedyReading {
    fn from(snapshot: &SensorSnapshot) -> Self {
        RemedyReading {
            nitrogen: snapshot.nitrogen,
            ph: snapshot.ph,
            boron: snapshot.boron,
        }
    }
}

/// One day of a trend series, fields may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    #[serde(default)]
    pub ph: Option<f64>,
    #[serde(default)]
    pub nitrogen: Option<f64>,
    #[serde(default)]
    pub boron: Option<f64>,
}
