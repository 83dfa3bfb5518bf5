//! Question answer API client methods

use super::{ApiRequest, ClientError, JobTrackClient};
use crate::types::{Answer, CreateAnswerRequest, UpdateAnswerRequest};
use reqwest::Method;

impl JobTrackClient {
    /// Answer a question for an application
    pub async fn create_answer(
        &self,
        application: u64,
        question: u64,
        answer_value: &str,
    ) -> Result<Answer, ClientError> {
        let request = ApiRequest::new(Method::POST, "/api/answers/").json(&CreateAnswerRequest {
            application,
            question,
            answer_value: answer_value.to_string(),
        })?;
        self.execute(request).await
    }

    /// Replace the text of an existing answer
    pub async fn update_answer(&self, id: u64, answer_value: &str) -> Result<Answer, ClientError> {
        let request = ApiRequest::new(Method::PATCH, format!("/api/answers/{id}/")).json(
            &UpdateAnswerRequest {
                answer_value: answer_value.to_string(),
            },
        )?;
        self.execute(request).await
    }

    /// Create or update an answer depending on whether one already exists
    pub async fn save_answer(
        &self,
        application: u64,
        question: u64,
        existing: Option<&Answer>,
        answer_value: &str,
    ) -> Result<Answer, ClientError> {
        match existing {
            Some(answer) => self.update_answer(answer.id, answer_value).await,
            None => self.create_answer(application, question, answer_value).await,
        }
    }
}
