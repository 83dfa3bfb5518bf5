//! Wire types exchanged with the job tracker backend

use serde::{Deserialize, Serialize};

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response. Both tokens are required; their absence is reported as
/// [`crate::client::error::ClientError::MissingTokens`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Body shared by the refresh and logout endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refresh response. The backend does not rotate refresh tokens today, but a
/// rotated token is honoured when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Applicant
    #[serde(rename = "AP")]
    Applicant,
    /// Employer
    #[serde(rename = "EM")]
    Employer,
}

impl AccountType {
    /// Wire code for the role
    pub fn code(self) -> &'static str {
        match self {
            Self::Applicant => "AP",
            Self::Employer => "EM",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AP" | "APPLICANT" => Ok(Self::Applicant),
            "EM" | "EMPLOYER" => Ok(Self::Employer),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// Current user, as returned by `/api/auth/me/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Me {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub account_type: AccountType,
}

/// How a job is worked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentMeans {
    #[serde(rename = "RE")]
    Remote,
    #[serde(rename = "ON")]
    OnSite,
    #[serde(rename = "HY")]
    Hybrid,
}

/// Contract type of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "FT")]
    FullTime,
    #[serde(rename = "PT")]
    PartTime,
    #[serde(rename = "CT")]
    Contract,
    #[serde(rename = "IN")]
    Internship,
}

/// Company summary embedded in a posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: u64,
    pub name: String,
}

/// A company is either a bare id or an expanded summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompanyRef {
    Id(u64),
    Summary(CompanySummary),
}

impl CompanyRef {
    pub fn id(&self) -> u64 {
        match self {
            Self::Id(id) => *id,
            Self::Summary(summary) => summary.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Summary(summary) => Some(&summary.name),
        }
    }
}

/// Job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: u64,
    pub title: String,
    pub company: CompanyRef,
    pub location: String,
    pub employment_means: EmploymentMeans,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub posted_date: Option<String>,
}

/// Partial job posting used for create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPostingDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_means: Option<EmploymentMeans>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Application lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[serde(rename = "DR")]
    Draft,
    #[serde(rename = "AP")]
    Applied,
    #[serde(rename = "IN")]
    Interview,
    #[serde(rename = "OF")]
    Offer,
    #[serde(rename = "RE")]
    Rejected,
}

/// Job summary embedded in an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: u64,
    pub title: String,
    pub company: CompanyRef,
}

/// A job is either a bare id or an expanded summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobRef {
    Id(u64),
    Summary(JobSummary),
}

impl JobRef {
    pub fn id(&self) -> u64 {
        match self {
            Self::Id(id) => *id,
            Self::Summary(summary) => summary.id,
        }
    }
}

/// Applicant summary embedded in an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSummary {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// An applicant is either a bare id or an expanded summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplicantRef {
    Id(u64),
    Summary(ApplicantSummary),
}

impl ApplicantRef {
    /// Display name, falling back to `Applicant #<id>`
    pub fn display_name(&self) -> String {
        match self {
            Self::Summary(ApplicantSummary {
                username: Some(name),
                ..
            }) => name.clone(),
            Self::Summary(summary) => format!("Applicant #{}", summary.id),
            Self::Id(id) => format!("Applicant #{id}"),
        }
    }
}

/// Job application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: u64,
    pub job: JobRef,
    pub applicant: ApplicantRef,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub application_date: Option<String>,
    pub status: ApplicationStatus,
}

/// Partial application used for updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Result of a status transition endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: u64,
    pub status: ApplicationStatus,
}

/// Free-text question attached to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub question_prompt: String,
    #[serde(default)]
    pub answer_type: String,
    #[serde(default)]
    pub required: bool,
}

/// Answer to a question for one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    pub application: u64,
    pub question: u64,
    #[serde(default)]
    pub answer_value: Option<String>,
}

/// Question with the caller's answer, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: Question,
    #[serde(default)]
    pub answer: Option<Answer>,
}

/// Response of the apply endpoint: the draft application and its questions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyResponse {
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub questions: Vec<QuestionAnswer>,
}

/// New answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnswerRequest {
    pub application: u64,
    pub question: u64,
    pub answer_value: String,
}

/// Answer update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAnswerRequest {
    pub answer_value: String,
}
