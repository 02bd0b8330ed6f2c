use crate::threshold::{classify, Parameter};
use crate::RemedyReading;
use serde::Serialize;
use utoipa::ToSchema;

const MAX_KEY_ACTIONS: usize = 3;
const ACTION_MARKERS: [&str; 3] = ["⚡", "IMMEDIATE", "ACTION"];
const SECTION_EMOJI: [char; 6] = ['⚡', '🌱', '📋', '📈', '⚠', '\u{fe0f}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Good,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl From<MonitorStatus> for Priority {
    fn from(status: MonitorStatus) -> Self {
        match status {
            MonitorStatus::Good => Priority::Low,
            MonitorStatus::Warning => Priority::Medium,
            MonitorStatus::Critical => Priority::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSummary {
    pub status: MonitorStatus,
    pub priority: Priority,
    pub key_actions: Vec<String>,
}

/// Boron outranks pH and nitrogen: any boron issue makes the farm critical.
pub fn summarize(reading: &RemedyReading, remedy: &str) -> MonitorSummary {
    let mut status = MonitorStatus::Good;
    if !classify(Parameter::Ph, reading.ph).status.is_optimal()
        || !classify(Parameter::Nitrogen, reading.nitrogen).status.is_optimal()
    {
        status = MonitorStatus::Warning;
    }
    if !classify(Parameter::Boron, reading.boron).status.is_optimal() {
        status = MonitorStatus::Critical;
    }

    let mut key_actions: Vec<String> = remedy
        .lines()
        .filter(|line| ACTION_MARKERS.iter().any(|marker| line.contains(marker)))
        .map(|line| {
            line.chars()
                .filter(|c| !SECTION_EMOJI.contains(c))
                .collect::<String>()
                .trim()
                .to_owned()
        })
        .take(MAX_KEY_ACTIONS)
        .collect();

    if key_actions.is_empty() {
        key_actions = vec![
            "Monitor current conditions".to_owned(),
            "Maintain optimal growing environment".to_owned(),
        ];
    }

    MonitorSummary {
        status,
        priority: status.into(),
        key_actions,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reading(nitrogen: f64, ph: f64, boron: f64) -> RemedyReading {
        RemedyReading {
            nitrogen,
            ph,
            boron,
        }
    }

    #[test]
    fn test_status_levels() {
        assert_eq!(summarize(&reading(60.0, 6.8, 2.0), "").status, MonitorStatus::Good);
        assert_eq!(
            summarize(&reading(30.0, 6.8, 2.0), "").status,
            MonitorStatus::Warning
        );

        let critical = summarize(&reading(30.0, 5.0, 0.5), "");
        assert_eq!(critical.status, MonitorStatus::Critical);
        assert_eq!(critical.priority, Priority::High);
    }

    #[test]
    fn test_default_actions() {
        let summary = summarize(&reading(60.0, 6.8, 2.0), "All good here.");
        assert_eq!(summary.priority, Priority::Low);
        assert_eq!(
            summary.key_actions,
            vec!["Monitor current conditions", "Maintain optimal growing environment"]
        );
    }

    #[test]
    fn test_key_actions_are_stripped_and_capped() {
        let remedy = "⚡ **IMMEDIATE ACTIONS**\n• nothing\nACTION one\nACTION two\nACTION three";
        let summary = summarize(&reading(60.0, 6.8, 2.0), remedy);
        assert_eq!(
            summary.key_actions,
            vec!["**IMMEDIATE ACTIONS**", "ACTION one", "ACTION two"]
        );
    }

    #[test]
    fn test_variation_selector_removed() {
        let summary = summarize(&reading(60.0, 6.8, 2.0), "⚠️ ACTION needed");
        assert_eq!(summary.key_actions, vec!["ACTION needed"]);
    }
}
