use crate::threshold::{classify, Parameter, SoilStatus};
use crate::{RemedyReading, TrendPoint};

pub const DEMO_NOTE: &str = "Demo mode active. Configure Google AI API for full AI recommendations.";

/// Prompt sent to the generative model for a remedy.
pub fn remedy_prompt(reading: &RemedyReading) -> String {
    format!(
        "You are ElaCare's AI Agricultural Assistant for cardamom farming. Analyze the current soil sensor readings and provide comprehensive farming guidance.

CURRENT SOIL DATA:
• Nitrogen (N): {} mg/kg (Optimal: 40-80 mg/kg)
• Soil pH: {} (Optimal: 6.0-7.5)
• Boron (B): {} mg/kg (Optimal: 1.5-3.0 mg/kg)

ANALYSIS REQUIRED:
1. 🌱 SOIL HEALTH STATUS: Brief assessment of current conditions
2. ⚡ IMMEDIATE ACTIONS: What needs to be done this week
3. 📋 FERTILIZATION PLAN: Specific nutrient applications needed
4. 📈 EXPECTED OUTCOMES: Results timeline (2-4 weeks)
5. ⚠️ RISK ALERTS: Any critical issues to monitor

FORMAT: Use clear sections with emojis. Keep practical and specific for cardamom cultivation in tropical conditions.",
        reading.nitrogen, reading.ph, reading.boron
    )
}

fn trend_value(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_owned(), |v| v.to_string())
}

/// One `Day: ...` line per point, oldest first as given.
pub fn trend_prompt(points: &[TrendPoint]) -> String {
    let trend = points
        .iter()
        .map(|point| {
            format!(
                "Day: pH={}, N={}, B={}",
                trend_value(point.ph),
                trend_value(point.nitrogen),
                trend_value(point.boron)
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        "Analyze this 7-day soil sensor trend data and identify patterns:

{}

Provide:
1. Overall trend (improving/declining/stable)
2. Key insights about nutrient availability
3. Predicted issues if current trend continues
4. Recommended preventive measures

Keep response concise and actionable.",
        trend
    )
}

/// Templated remedy served while no generative model is wired up.
pub fn demo_remedy(reading: &RemedyReading) -> String {
    let nitrogen = classify(Parameter::Nitrogen, reading.nitrogen).status;
    let ph = classify(Parameter::Ph, reading.ph).status;
    let boron = classify(Parameter::Boron, reading.boron).status;

    let nitrogen_action = if nitrogen.is_low_side() {
        "• Apply organic nitrogen fertilizer (compost/vermicompost)"
    } else {
        "• Nitrogen levels adequate"
    };
    let ph_action = match ph {
        SoilStatus::Optimal => "• pH levels optimal for cardamom",
        status if status.is_low_side() => "• Add lime to increase soil pH",
        _ => "• Add sulfur to reduce soil pH",
    };
    let boron_action = match boron {
        SoilStatus::Optimal => "• Boron levels optimal",
        status if status.is_low_side() => "• Apply boric acid solution (1kg per acre)",
        _ => "• Reduce boron applications",
    };

    let nitrogen_risk = if nitrogen == SoilStatus::Excess {
        "• CAUTION: High nitrogen may cause leaf burn"
    } else {
        ""
    };
    let ph_risk = if matches!(ph, SoilStatus::TooAcidic | SoilStatus::TooAlkaline) {
        "• URGENT: pH correction needed immediately"
    } else {
        ""
    };
    let boron_risk = if boron == SoilStatus::Toxic {
        "• WARNING: Boron toxicity risk - flush with water"
    } else {
        ""
    };

    format!(
        "🌱 **SOIL HEALTH STATUS**
Your cardamom farm shows: Nitrogen ({n} mg/kg), pH ({ph}), Boron ({b} mg/kg)

⚡ **IMMEDIATE ACTIONS**
{nitrogen_action}
{ph_action}
{boron_action}

📋 **FERTILIZATION PLAN**
• Week 1: Apply balanced NPK (19:19:19) at 200g per plant
• Week 2: Foliar spray with micronutrients
• Week 3: Apply organic matter around root zone
• Week 4: Monitor and adjust based on plant response

📈 **EXPECTED OUTCOMES**
• Days 7-10: Improved leaf color
• Days 14-21: Enhanced root development
• Days 21-28: Visible growth improvement

⚠️ **RISK ALERTS**
{nitrogen_risk}
{ph_risk}
{boron_risk}

*Note: This is a demo response. Configure Google AI API for full AI recommendations.*",
        n = reading.nitrogen,
        ph = reading.ph,
        b = reading.boron,
    )
    .trim()
    .to_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_remedy_prompt_carries_readings() {
        let prompt = remedy_prompt(&RemedyReading {
            nitrogen: 45.0,
            ph: 6.8,
            boron: 2.1,
        });
        assert!(prompt.contains("Nitrogen (N): 45 mg/kg"));
        assert!(prompt.contains("Soil pH: 6.8 "));
        assert!(prompt.contains("Boron (B): 2.1 mg/kg"));
    }

    #[test]
    fn test_trend_prompt_lines() {
        let points = vec![
            TrendPoint {
                ph: Some(6.5),
                nitrogen: Some(50.0),
                boron: Some(2.0),
            },
            TrendPoint {
                ph: Some(6.4),
                nitrogen: None,
                boron: Some(1.9),
            },
        ];
        let prompt = trend_prompt(&points);
        assert!(prompt.contains("Day: pH=6.5, N=50, B=2\nDay: pH=6.4, N=n/a, B=1.9"));
    }

    #[test]
    fn test_demo_remedy_conditions() {
        let remedy = demo_remedy(&RemedyReading {
            nitrogen: 30.0,
            ph: 5.0,
            boron: 4.5,
        });
        assert!(remedy.starts_with("🌱 **SOIL HEALTH STATUS**"));
        assert!(remedy.contains("• Apply organic nitrogen fertilizer (compost/vermicompost)"));
        assert!(remedy.contains("• Add lime to increase soil pH"));
        assert!(remedy.contains("• Reduce boron applications"));
        assert!(remedy.contains("• URGENT: pH correction needed immediately"));
        assert!(remedy.contains("• WARNING: Boron toxicity risk - flush with water"));
        assert!(!remedy.contains("CAUTION"));
        assert!(remedy.ends_with("full AI recommendations.*"));
    }

    #[test]
    fn test_demo_remedy_optimal() {
        let remedy = demo_remedy(&RemedyReading {
            nitrogen: 60.0,
            ph: 6.8,
            boron: 2.0,
        });
        assert!(remedy.contains("• Nitrogen levels adequate"));
        assert!(remedy.contains("• pH levels optimal for cardamom"));
        assert!(remedy.contains("• Boron levels optimal"));
        assert!(!remedy.contains("URGENT"));
    }
}
