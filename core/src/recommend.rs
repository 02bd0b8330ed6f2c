use crate::threshold::{classify, Parameter, Severity, SoilStatus};
use crate::SensorSnapshot;
use serde::Serialize;
use utoipa::ToSchema;

pub const EXPERT_TIPS: [&str; 5] = [
    "Apply fertilizers in 2-3 split doses during monsoon season for best results",
    "Always combine chemical fertilizers with organic manure (5-10 tonnes/ha annually)",
    "Mulch the soil with dry leaves to retain moisture and regulate temperature",
    "Avoid fertilizer application during dry season; concentrate during monsoon",
    "Monitor for pest and disease issues simultaneously with nutrient management",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdviceKind {
    Warning,
    Info,
    Success,
}

impl From<Severity> for AdviceKind {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::High => AdviceKind::Warning,
            Severity::Medium => AdviceKind::Info,
            Severity::None => AdviceKind::Success,
        }
    }
}

/// Derived agronomic advice, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub nutrient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SoilStatus>,
    pub issue: String,
    pub advice: String,
    pub action: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: AdviceKind,
}

struct Advice {
    issue: &'static str,
    advice: &'static str,
    action: &'static str,
}

fn advice_for(parameter: Parameter, status: SoilStatus) -> Option<Advice> {
    let low = status.is_low_side();
    let advice = match (parameter, low) {
        (Parameter::Nitrogen, true) => Advice {
            issue: "Low nitrogen levels",
            advice: "Apply nitrogen-rich fertilizer such as urea or ammonium nitrate. Recommended: 20-30 kg/ha. Apply in split doses during growing season.",
            action: "Increase N application in next irrigation",
        },
        (Parameter::Nitrogen, false) => Advice {
            issue: "Excessive nitrogen",
            advice: "Reduce nitrogen applications. High N can cause soft growth and pest susceptibility. Focus on P and K instead.",
            action: "Skip nitrogen in next application",
        },
        (Parameter::Phosphorus, true) if status == SoilStatus::Deficient => Advice {
            issue: "Very low phosphorus",
            advice: "Apply phosphorus fertilizer. Recommended: 50-60 kg/ha of single super phosphate (SSP). Improves flowering and root development.",
            action: "Apply SSP immediately",
        },
        (Parameter::Phosphorus, true) => Advice {
            issue: "Slightly low phosphorus",
            advice: "Consider applying phosphorus-rich fertilizer. Use DAP (Diammonium Phosphate) for better soil availability.",
            action: "Monitor and supplement if needed",
        },
        (Parameter::Phosphorus, false) => Advice {
            issue: "Excess phosphorus",
            advice: "Phosphorus levels are high. Skip phosphate fertilizers until levels fall; excess P can lock out zinc and iron.",
            action: "Withhold phosphorus applications",
        },
        (Parameter::Potassium, true) => Advice {
            issue: "Low potassium levels",
            advice: "Apply potassium chloride or potassium sulphate. Recommended: 40-60 kg/ha. K improves disease resistance and spice quality.",
            action: "Apply potash fertilizer",
        },
        (Parameter::Potassium, false) => Advice {
            issue: "High potassium",
            advice: "Potassium levels are high. Continue with maintenance applications only.",
            action: "Reduce K applications temporarily",
        },
        (Parameter::Boron, true) => Advice {
            issue: "Low boron levels",
            advice: "Apply borax or boric acid. Recommended: 1-2 kg/ha. Boron is crucial for flower and fruit development in cardamom.",
            action: "Spray boron solution on foliage",
        },
        (Parameter::Boron, false) => Advice {
            issue: "Excess boron",
            advice: "Reduce boron applications immediately. Excess boron can be toxic. Flush soil with water if possible.",
            action: "Stop boron applications",
        },
        (Parameter::Ph, true) => Advice {
            issue: "Soil is too acidic",
            advice: "Apply lime (calcium carbonate) to increase pH. Cardamom prefers slightly acidic to neutral soil (6.0-7.0). Apply 2-5 tonnes/ha based on severity.",
            action: "Lime application required",
        },
        (Parameter::Ph, false) => Advice {
            issue: "Soil is too alkaline",
            advice: "Apply sulfur or organic matter to lower pH. Incorporate 1-2 tonnes/ha of compost or green manure.",
            action: "Reduce pH through organic amendments",
        },
        (Parameter::Temperature, _) | (Parameter::Moisture, _) => return None,
    };
    Some(advice)
}

/// Ordered advice for the five soil parameters.
///
/// A non-optimal parameter yields exactly one record. When every parameter is
/// optimal the result is the single "All Parameters Optimal" record.
pub fn recommend(snapshot: &SensorSnapshot) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    for parameter in Parameter::SOIL {
        let value = snapshot.value(parameter).unwrap_or_default();
        let classification = classify(parameter, value);
        if classification.status.is_optimal() {
            continue;
        }

        if let Some(advice) = advice_for(parameter, classification.status) {
            recommendations.push(Recommendation {
                nutrient: parameter.display_name().to_owned(),
                parameter: Some(parameter),
                status: Some(classification.status),
                issue: advice.issue.to_owned(),
                advice: advice.advice.to_owned(),
                action: advice.action.to_owned(),
                severity: classification.severity,
                kind: classification.severity.into(),
            });
        }
    }

    if recommendations.is_empty() {
        recommendations.push(all_optimal());
    }
    recommendations
}

fn all_optimal() -> Recommendation {
    Recommendation {
        nutrient: "All Parameters Optimal".to_owned(),
        parameter: None,
        status: None,
        issue: "Excellent growing conditions".to_owned(),
        advice: "Your soil conditions are ideal for cardamom cultivation. Continue with regular maintenance fertilizer schedule.".to_owned(),
        action: "Maintain current practices".to_owned(),
        severity: Severity::None,
        kind: AdviceKind::Success,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn midpoints() -> SensorSnapshot {
        let mut snapshot = SensorSnapshot::demo();
        snapshot.nitrogen = 60.0;
        snapshot.phosphorus = 20.0;
        snapshot.potassium = 160.0;
        snapshot.boron = 2.25;
        snapshot.ph = 6.75;
        snapshot
    }

    #[test]
    fn test_all_optimal() {
        let recommendations = recommend(&midpoints());
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].nutrient, "All Parameters Optimal");
        assert_eq!(recommendations[0].issue, "Excellent growing conditions");
        assert_eq!(recommendations[0].kind, AdviceKind::Success);
    }

    #[test]
    fn test_single_deficiency() {
        let mut snapshot = midpoints();
        snapshot.nitrogen = 10.0;

        let recommendations = recommend(&snapshot);
        assert_eq!(recommendations.len(), 1);
        let nitrogen = &recommendations[0];
        assert_eq!(nitrogen.nutrient, "Nitrogen (N)");
        assert_eq!(nitrogen.severity, Severity::High);
        assert_eq!(nitrogen.kind, AdviceKind::Warning);
        assert!(!nitrogen.advice.is_empty());
        assert_eq!(nitrogen.action, "Increase N application in next irrigation");
    }

    #[test]
    fn test_order_and_kinds() {
        let mut snapshot = midpoints();
        snapshot.ph = 5.8;
        snapshot.nitrogen = 90.0;
        snapshot.phosphorus = 12.0;
        snapshot.boron = 5.0;

        let recommendations = recommend(&snapshot);
        let issues: Vec<&str> = recommendations.iter().map(|r| r.issue.as_str()).collect();
        assert_eq!(
            issues,
            vec![
                "Excessive nitrogen",
                "Slightly low phosphorus",
                "Excess boron",
                "Soil is too acidic",
            ]
        );
        assert_eq!(recommendations[1].kind, AdviceKind::Info);
        assert_eq!(recommendations[3].kind, AdviceKind::Info);
        assert_eq!(recommendations[2].kind, AdviceKind::Warning);
    }

    #[test]
    fn test_phosphorus_deficient_vs_low() {
        let mut snapshot = midpoints();
        snapshot.phosphorus = 5.0;
        assert_eq!(recommend(&snapshot)[0].action, "Apply SSP immediately");

        snapshot.phosphorus = 30.0;
        assert_eq!(recommend(&snapshot)[0].issue, "Excess phosphorus");
    }

    #[test]
    fn test_serialized_kind_field() {
        let out = serde_json::to_value(recommend(&midpoints())).unwrap();
        assert_eq!(out[0]["type"], "success");
        assert_eq!(out[0]["severity"], "none");
        assert!(out[0].get("parameter").is_none());
    }
}
