use crate::error::ApiError;
use crate::models::history::DEFAULT_HISTORY_LIMIT;
use crate::models::HistoryQuery;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub end_date: Option<String>,
    /// Defaults to 100
    pub limit: Option<String>,
}

impl TryFrom<HistoryParams> for HistoryQuery {
    type Error = ApiError;

    /// The range only applies when both ends are given.
    fn try_from(params: HistoryParams) -> Result<Self, Self::Error> {
        let limit = match params.limit.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw
                .parse::<i64>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or_else(|| {
                    ApiError::Validation("limit must be a positive integer".to_owned())
                })?,
            _ => DEFAULT_HISTORY_LIMIT,
        };

        let start = params.start_date.as_deref().map(parse_date).transpose()?;
        let end = params.end_date.as_deref().map(parse_date).transpose()?;
        let range = match (start, end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };

        Ok(HistoryQuery { range, limit })
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ApiError::Validation(format!("Invalid date: {}", raw)))
}
