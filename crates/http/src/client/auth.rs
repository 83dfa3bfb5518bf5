//! Authentication API client methods

use super::{ApiRequest, ClientError, JobTrackClient};
use crate::types::{LoginRequest, LoginResponse, Me, RefreshRequest, RegisterRequest};
use reqwest::Method;
use tracing::{debug, warn};

impl JobTrackClient {
    /// Log in and store the issued credential pair
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let request = ApiRequest::public(Method::POST, "/api/auth/login/").json(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let response: LoginResponse = self.execute(request).await?;

        let (Some(access), Some(refresh)) = (
            response.access.filter(|t| !t.is_empty()),
            response.refresh.filter(|t| !t.is_empty()),
        ) else {
            return Err(ClientError::MissingTokens("access or refresh"));
        };

        self.tokens.set_access(&access);
        self.tokens.set_refresh(&refresh);
        debug!(username, "Logged in");
        Ok(())
    }

    /// Invalidate the refresh token server-side and clear local tokens.
    ///
    /// The server call is best-effort: local tokens are cleared whatever its
    /// outcome, and its error (if any) is still returned.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = match self.tokens.refresh() {
            Some(refresh) => {
                let request = ApiRequest::new(Method::POST, "/api/auth/logout/")
                    .json(&RefreshRequest { refresh });
                match request {
                    Ok(request) => self.execute_empty(request).await,
                    Err(err) => Err(err),
                }
            }
            None => Ok(()),
        };

        self.tokens.clear();
        if let Err(err) = &result {
            warn!(error = %err, "Server-side logout failed, local session cleared anyway");
        }
        result
    }

    /// Create an account
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<(), ClientError> {
        let request =
            ApiRequest::public(Method::POST, "/api/auth/register/").json(&RegisterRequest {
                username: username.to_string(),
                password: password.to_string(),
                email: email.to_string(),
            })?;
        self.execute_empty(request).await
    }

    /// Get the current user
    pub async fn me(&self) -> Result<Me, ClientError> {
        self.execute(ApiRequest::new(Method::GET, "/api/auth/me/"))
            .await
    }
}
