use serde::Deserialize;
use serde_json::json;

/// Provider failure, keyed on the provider's error code. The display
/// strings are the exact user-facing messages shown by the pages.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Email is already registered")]
    DuplicateEmail,
    #[error("Password is too weak")]
    WeakPassword,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("User not found")]
    UserNotFound,
    #[error("Incorrect password")]
    WrongPassword,
    #[error("Too many failed attempts. Please try again later")]
    RateLimited,
    #[error("Network error. Please check your connection")]
    Network,
    #[error("An error occurred. Please try again")]
    Other,
}

impl AuthError {
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/email-already-in-use" => AuthError::DuplicateEmail,
            "auth/weak-password" => AuthError::WeakPassword,
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/user-not-found" => AuthError::UserNotFound,
            "auth/wrong-password" => AuthError::WrongPassword,
            "auth/too-many-requests" => AuthError::RateLimited,
            "auth/network-request-failed" => AuthError::Network,
            _ => AuthError::Other,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct IdentitySession {
    pub uid: String,
    pub token: String,
}

/// Thin client for the external identity provider. Accounts and
/// credentials live entirely on the provider side; this wrapper only
/// forwards calls and maps error codes.
#[derive(Clone)]
pub struct IdentityApi {
    api_key: String,
    url: String,
    client: reqwest::Client,
}

impl IdentityApi {
    pub fn new(api_key: String, url: String) -> Self {
        Self {
            api_key,
            url,
            client: reqwest::Client::new(),
        }
    }

    async fn post(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        let response = self
            .client
            .post(format!("{}{}", self.url, path))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|_| AuthError::Network)?
            .text()
            .await
            .map_err(|_| AuthError::Network)?;

        let body: serde_json::Value =
            serde_json::from_str(&response).map_err(|_| AuthError::Other)?;

        if let Some(code) = body
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|c| c.as_str())
        {
            return Err(AuthError::from_code(code));
        }

        Ok(body)
    }

    fn session_from(body: serde_json::Value) -> Result<IdentitySession, AuthError> {
        match body.get("session") {
            Some(session) => {
                serde_json::from_value(session.clone()).map_err(|_| AuthError::Other)
            }
            None => Err(AuthError::Other),
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentitySession, AuthError> {
        let body = self
            .post(
                "/v1/accounts",
                json!({ "email": email, "password": password }),
            )
            .await?;

        Self::session_from(body)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, AuthError> {
        let body = self
            .post(
                "/v1/sessions",
                json!({ "email": email, "password": password }),
            )
            .await?;

        Self::session_from(body)
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.post("/v1/sessions/revoke", json!({ "token": token }))
            .await?;

        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.post("/v1/accounts/reset-password", json!({ "email": email }))
            .await?;

        Ok(())
    }

    /// Changing the password requires re-proof of the current credential.
    pub async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let session = self.sign_in(email, current_password).await?;

        self.post(
            "/v1/accounts/change-password",
            json!({ "token": session.token, "new_password": new_password }),
        )
        .await?;

        Ok(())
    }
}
