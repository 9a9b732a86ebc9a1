use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The closed set of community-service projects a field visit can belong to.
/// Wire names are the human-readable labels shown on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Project {
    #[serde(rename = "Health Camp")]
    HealthCamp,
    #[serde(rename = "Education Outreach")]
    EducationOutreach,
    #[serde(rename = "Women Empowerment")]
    WomenEmpowerment,
    #[serde(rename = "Agriculture Support")]
    AgricultureSupport,
    #[serde(rename = "Water Conservation")]
    WaterConservation,
    #[serde(rename = "Sanitation Drive")]
    SanitationDrive,
    #[serde(rename = "Digital Literacy")]
    DigitalLiteracy,
    #[serde(rename = "Road Safety Awareness")]
    RoadSafetyAwareness,
    #[serde(rename = "Elder Care")]
    ElderCare,
}

impl Project {
    pub fn label(&self) -> &'static str {
        match self {
            Project::HealthCamp => "Health Camp",
            Project::EducationOutreach => "Education Outreach",
            Project::WomenEmpowerment => "Women Empowerment",
            Project::AgricultureSupport => "Agriculture Support",
            Project::WaterConservation => "Water Conservation",
            Project::SanitationDrive => "Sanitation Drive",
            Project::DigitalLiteracy => "Digital Literacy",
            Project::RoadSafetyAwareness => "Road Safety Awareness",
            Project::ElderCare => "Elder Care",
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordinal visit number within a project. A first visit has no prior report,
/// so the wizard skips the prior-report upload step for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitNumber {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "3rd")]
    Third,
    #[serde(rename = "4th")]
    Fourth,
    #[serde(rename = "5th")]
    Fifth,
    #[serde(rename = "6th")]
    Sixth,
    #[serde(rename = "7th")]
    Seventh,
    #[serde(rename = "8th")]
    Eighth,
}

impl VisitNumber {
    pub fn is_first(&self) -> bool {
        matches!(self, VisitNumber::First)
    }

    pub fn label(&self) -> &'static str {
        match self {
            VisitNumber::First => "1st",
            VisitNumber::Second => "2nd",
            VisitNumber::Third => "3rd",
            VisitNumber::Fourth => "4th",
            VisitNumber::Fifth => "5th",
            VisitNumber::Sixth => "6th",
            VisitNumber::Seventh => "7th",
            VisitNumber::Eighth => "8th",
        }
    }
}

impl fmt::Display for VisitNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The fully collected field-visit record handed to the report composer.
/// The wizard guarantees `actions` is non-empty before composing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitRecord {
    pub project: Project,
    pub visit_number: VisitNumber,
    pub visit_date: Option<NaiveDate>,
    pub actions: String,
    pub media_description: Option<String>,
}

/// Text extracted from an uploaded prior-visit report and its derived
/// summary. `summary` is produced from `raw_text` by the summarizer only.
#[derive(Debug, Clone, Serialize)]
pub struct PriorReportContext {
    pub raw_text: String,
    pub summary: String,
}
