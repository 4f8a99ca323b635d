//! Wire types for the LabLink backend API

use serde::{Deserialize, Serialize};

/// Faculty record as returned by `/api/professors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    pub id: i64,
    pub name: String,
    pub department: Option<String>,
    pub email: Option<String>,
    pub research_interests: Option<String>,
    pub profile_link: Option<String>,
    pub personal_site: Option<String>,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Student profile submitted to `/api/match`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub interests: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Which profile terms contributed to a match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchWhy {
    #[serde(default)]
    pub interests_hits: Vec<String>,
    #[serde(default)]
    pub skills_hits: Vec<String>,
}

/// One scored match from `/api/match`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub professor: Professor,
    pub score: f64,
    pub score_percent: f64,
    #[serde(default)]
    pub why: MatchWhy,
}

/// Request body for `/api/email/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub student_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_skills: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    pub professor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Drafted outreach email from `/api/email/generate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

/// Request body for `/api/email/send`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_b64: Option<String>,
}

impl SendEmailRequest {
    /// Create a new send request without an attachment
    pub fn new(to: String, subject: String, body: String) -> Self {
        Self {
            to,
            subject,
            body,
            filename: None,
            file_b64: None,
        }
    }

    /// Attach a base64-encoded file
    pub fn with_attachment(mut self, filename: String, file_b64: String) -> Self {
        self.filename = Some(filename);
        self.file_b64 = Some(file_b64);
        self
    }
}
