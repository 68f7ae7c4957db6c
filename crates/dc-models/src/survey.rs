//! Survey search results

use chrono::NaiveDate;
use dc_core::types::null_as_default;
use serde::{Deserialize, Deserializer, Serialize};

/// One question matched by `GET /search/questions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyQuestionHit {
    #[serde(
        default = "not_available",
        alias = "surveyName",
        deserialize_with = "name_or_not_available"
    )]
    pub survey_name: String,
    #[serde(default, alias = "surveyId", deserialize_with = "null_as_default")]
    pub survey_id: String,
    #[serde(default, alias = "surveyDate")]
    pub survey_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub segments: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub panel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub survey_score: f64,
}

fn not_available() -> String {
    "N/A".to_string()
}

fn name_or_not_available<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(not_available))
}

impl SurveyQuestionHit {
    /// Survey dates arrive as `DD/MM/YYYY` or ISO dates.
    pub fn survey_date(&self) -> Option<NaiveDate> {
        let raw = self.survey_date.as_deref()?.trim();
        if raw.contains('/') {
            NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
        } else {
            dc_core::types::lenient_date::parse(raw)
        }
    }
}

/// A survey referenced from a segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRef {
    #[serde(default, alias = "surveyId")]
    pub survey_id: String,
    #[serde(default, alias = "surveyName")]
    pub survey_name: String,
    #[serde(default, alias = "surveyDate")]
    pub survey_date: Option<String>,
}

/// One segment returned by `GET /search/segments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentHit {
    #[serde(default, alias = "segmentName")]
    pub segment_name: String,
    #[serde(default, alias = "surveyCount")]
    pub survey_count: u32,
    #[serde(default)]
    pub surveys: Vec<SurveyRef>,
}
