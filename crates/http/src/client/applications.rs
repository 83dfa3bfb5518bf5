//! Application API client methods

use super::{ApiRequest, ClientError, FilePart, JobTrackClient};
use crate::types::{Application, ApplicationUpdate, StatusChange};
use reqwest::Method;

impl JobTrackClient {
    /// List applications visible to the current user
    pub async fn list_applications(&self) -> Result<Vec<Application>, ClientError> {
        self.execute(ApiRequest::new(Method::GET, "/api/applications/"))
            .await
    }

    /// Get an application
    pub async fn get_application(&self, id: u64) -> Result<Application, ClientError> {
        self.execute(ApiRequest::new(Method::GET, format!("/api/applications/{id}/")))
            .await
    }

    /// Update fields of an application
    pub async fn update_application(
        &self,
        id: u64,
        update: &ApplicationUpdate,
    ) -> Result<Application, ClientError> {
        let request =
            ApiRequest::new(Method::PATCH, format!("/api/applications/{id}/")).json(update)?;
        self.execute(request).await
    }

    /// Delete an application
    pub async fn delete_application(&self, id: u64) -> Result<(), ClientError> {
        self.execute_empty(ApiRequest::new(
            Method::DELETE,
            format!("/api/applications/{id}/"),
        ))
        .await
    }

    /// Attach a resume. Submitting requires one.
    pub async fn upload_resume(
        &self,
        id: u64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Application, ClientError> {
        self.upload(id, FilePart::new("resume", file_name, bytes))
            .await
    }

    /// Attach a cover letter
    pub async fn upload_cover_letter(
        &self,
        id: u64,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Application, ClientError> {
        self.upload(id, FilePart::new("cover_letter", file_name, bytes))
            .await
    }

    async fn upload(&self, id: u64, file: FilePart) -> Result<Application, ClientError> {
        let request = ApiRequest::new(Method::PATCH, format!("/api/applications/{id}/")).file(file);
        self.execute(request).await
    }

    /// Submit a draft application
    pub async fn submit_application(&self, id: u64) -> Result<StatusChange, ClientError> {
        self.transition(Method::POST, id, "submit").await
    }

    /// Withdraw a submitted application back to draft
    pub async fn withdraw_application(&self, id: u64) -> Result<StatusChange, ClientError> {
        self.transition(Method::PUT, id, "withdraw").await
    }

    /// Move an application to the interview stage (employers)
    pub async fn promote_to_interview(&self, id: u64) -> Result<StatusChange, ClientError> {
        self.transition(Method::POST, id, "promote_to_interview").await
    }

    /// Extend an offer (employers)
    pub async fn offer_application(&self, id: u64) -> Result<StatusChange, ClientError> {
        self.transition(Method::POST, id, "offer").await
    }

    /// Reject an application (employers)
    pub async fn reject_application(&self, id: u64) -> Result<StatusChange, ClientError> {
        self.transition(Method::POST, id, "reject").await
    }

    async fn transition(
        &self,
        method: Method,
        id: u64,
        action: &str,
    ) -> Result<StatusChange, ClientError> {
        self.execute(ApiRequest::new(
            method,
            format!("/api/applications/{id}/{action}/"),
        ))
        .await
    }
}
