//! Job posting API client methods

use super::{ApiRequest, ClientError, JobTrackClient};
use crate::types::{ApplyResponse, JobPosting, JobPostingDraft};
use reqwest::Method;

impl JobTrackClient {
    /// List job postings
    pub async fn list_job_postings(&self) -> Result<Vec<JobPosting>, ClientError> {
        self.execute(ApiRequest::new(Method::GET, "/api/job-postings/"))
            .await
    }

    /// Get a job posting
    pub async fn get_job_posting(&self, id: u64) -> Result<JobPosting, ClientError> {
        self.execute(ApiRequest::new(Method::GET, format!("/api/job-postings/{id}/")))
            .await
    }

    /// Create a job posting (employers)
    pub async fn create_job_posting(
        &self,
        draft: &JobPostingDraft,
    ) -> Result<JobPosting, ClientError> {
        let request = ApiRequest::new(Method::POST, "/api/job-postings/").json(draft)?;
        self.execute(request).await
    }

    /// Update fields of a job posting
    pub async fn update_job_posting(
        &self,
        id: u64,
        draft: &JobPostingDraft,
    ) -> Result<JobPosting, ClientError> {
        let request =
            ApiRequest::new(Method::PATCH, format!("/api/job-postings/{id}/")).json(draft)?;
        self.execute(request).await
    }

    /// Delete a job posting
    pub async fn delete_job_posting(&self, id: u64) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::new(
            Method::DELETE,
            format!("/api/job-postings/{id}/"),
        ))
        .await
    }

    /// Apply to a job. The backend creates a draft application and empty
    /// answers when missing, and returns the job's questions.
    pub async fn apply_to_job(&self, job_id: u64) -> Result<ApplyResponse, ClientError> {
        self.execute(ApiRequest::new(
            Method::POST,
            format!("/api/job-postings/{job_id}/apply/"),
        ))
        .await
    }
}
