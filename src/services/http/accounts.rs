use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use super::{bearer_token, receive_failed, require_session, send_failed, service_error, AppState};
use crate::models::users::{ProfileUpdate, RegisterData};
use crate::services::accounts::AccountRequest;

#[derive(Clone, Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub agree_to_terms: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

// Same shape the register page accepts: one '@' with a non-empty local
// part and a dotted domain, no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

fn validate_register(form: &RegisterForm) -> BTreeMap<&'static str, &'static str> {
    let mut errors = BTreeMap::new();

    if form.first_name.trim().is_empty() {
        errors.insert("first_name", "First name is required");
    }
    if form.last_name.trim().is_empty() {
        errors.insert("last_name", "Last name is required");
    }
    if form.email.trim().is_empty() {
        errors.insert("email", "Email is required");
    } else if !is_valid_email(form.email.trim()) {
        errors.insert("email", "Please enter a valid email address");
    }
    if form.phone.trim().is_empty() {
        errors.insert("phone", "Phone number is required");
    }
    if form.country.trim().is_empty() {
        errors.insert("country", "Country is required");
    }
    if form.password.is_empty() {
        errors.insert("password", "Password is required");
    } else if form.password.len() < 6 {
        errors.insert("password", "Password must be at least 6 characters long");
    }
    if form.confirm_password.is_empty() {
        errors.insert("confirm_password", "Please confirm your password");
    } else if form.password != form.confirm_password {
        errors.insert("confirm_password", "Passwords do not match");
    }
    if !form.agree_to_terms {
        errors.insert("terms", "You must agree to the terms and conditions");
    }

    errors
}

fn validate_login(form: &LoginForm) -> BTreeMap<&'static str, &'static str> {
    let mut errors = BTreeMap::new();

    if form.email.trim().is_empty() {
        errors.insert("email", "Email is required");
    } else if !is_valid_email(form.email.trim()) {
        errors.insert("email", "Please enter a valid email address");
    }
    if form.password.is_empty() {
        errors.insert("password", "Password is required");
    }

    errors
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> (StatusCode, Json<Value>) {
    let errors = validate_register(&form);
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        );
    }

    let (account_tx, account_rx) = oneshot::channel();
    let send_result = state
        .account_channel
        .send(AccountRequest::Register {
            data: RegisterData {
                email: form.email.trim().to_string(),
                password: form.password,
                first_name: form.first_name.trim().to_string(),
                last_name: form.last_name.trim().to_string(),
                phone: form.phone.trim().to_string(),
                country: form.country.trim().to_string(),
            },
            response: account_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match account_rx.await {
        Ok(Ok((token, user))) => (
            StatusCode::CREATED,
            Json(json!({ "token": token, "user": user })),
        ),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> (StatusCode, Json<Value>) {
    let errors = validate_login(&form);
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        );
    }

    let (account_tx, account_rx) = oneshot::channel();
    let send_result = state
        .account_channel
        .send(AccountRequest::Login {
            email: form.email.trim().to_string(),
            password: form.password,
            response: account_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match account_rx.await {
        Ok(Ok((token, user))) => (
            StatusCode::OK,
            Json(json!({ "token": token, "user": user })),
        ),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "No user logged in" })),
        );
    };

    let (account_tx, account_rx) = oneshot::channel();
    let send_result = state
        .account_channel
        .send(AccountRequest::Logout {
            token,
            response: account_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match account_rx.await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "success": true }))),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let Some(token) = bearer_token(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authenticated" })),
        );
    };

    let (account_tx, account_rx) = oneshot::channel();
    let send_result = state
        .account_channel
        .send(AccountRequest::CurrentUser {
            token,
            response: account_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match account_rx.await {
        Ok(Some(user)) => (StatusCode::OK, Json(json!({ "user": user }))),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authenticated" })),
        ),
        Err(e) => receive_failed(e),
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> (StatusCode, Json<Value>) {
    let (_, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(response) => return response,
    };

    let (account_tx, account_rx) = oneshot::channel();
    let send_result = state
        .account_channel
        .send(AccountRequest::UpdateProfile {
            user_id: session.user_id,
            update,
            response: account_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match account_rx.await {
        Ok(Ok(())) => (StatusCode::OK, Json(json!({ "success": true }))),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordForm>,
) -> (StatusCode, Json<Value>) {
    if form.email.trim().is_empty() || !is_valid_email(form.email.trim()) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "email": "Please enter a valid email address" } })),
        );
    }

    let (account_tx, account_rx) = oneshot::channel();
    let send_result = state
        .account_channel
        .send(AccountRequest::ResetPassword {
            email: form.email.trim().to_string(),
            response: account_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match account_rx.await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({ "message": "Password reset email sent" })),
        ),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ChangePasswordForm>,
) -> (StatusCode, Json<Value>) {
    let (_, session) = match require_session(&state, &headers) {
        Ok(session) => session,
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "No user logged in" })),
            )
        }
    };

    if form.new_password.len() < 6 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "new_password": "Password must be at least 6 characters long" } })),
        );
    }

    let (account_tx, account_rx) = oneshot::channel();
    let send_result = state
        .account_channel
        .send(AccountRequest::ChangePassword {
            email: session.email,
            current_password: form.current_password,
            new_password: form.new_password,
            response: account_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match account_rx.await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({ "message": "Password updated successfully" })),
        ),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegisterForm {
        RegisterForm {
            first_name: "Ana".to_string(),
            last_name: "Souza".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+55 11 99999-0000".to_string(),
            country: "BR".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            agree_to_terms: true,
        }
    }

    #[test]
    fn accepts_a_complete_register_form() {
        assert!(validate_register(&valid_form()).is_empty());
    }

    #[test]
    fn flags_every_missing_register_field() {
        let form = RegisterForm {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            country: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            agree_to_terms: false,
        };
        let errors = validate_register(&form);

        assert_eq!(errors.get("first_name"), Some(&"First name is required"));
        assert_eq!(errors.get("last_name"), Some(&"Last name is required"));
        assert_eq!(errors.get("email"), Some(&"Email is required"));
        assert_eq!(errors.get("phone"), Some(&"Phone number is required"));
        assert_eq!(errors.get("country"), Some(&"Country is required"));
        assert_eq!(errors.get("password"), Some(&"Password is required"));
        assert_eq!(
            errors.get("confirm_password"),
            Some(&"Please confirm your password")
        );
        assert_eq!(
            errors.get("terms"),
            Some(&"You must agree to the terms and conditions")
        );
    }

    #[test]
    fn rejects_short_and_mismatched_passwords() {
        let mut form = valid_form();
        form.password = "12345".to_string();
        form.confirm_password = "12345".to_string();
        assert_eq!(
            validate_register(&form).get("password"),
            Some(&"Password must be at least 6 characters long")
        );

        let mut form = valid_form();
        form.confirm_password = "different".to_string();
        assert_eq!(
            validate_register(&form).get("confirm_password"),
            Some(&"Passwords do not match")
        );
    }

    #[test]
    fn email_validation_matches_the_form_rules() {
        for good in ["a@x.com", "first.last@mail.example.org", "a+b@x.co"] {
            assert!(is_valid_email(good), "expected {} to be valid", good);
        }
        for bad in [
            "",
            "plain",
            "@x.com",
            "a@",
            "a@nodot",
            "a@.com",
            "a@x.",
            "a b@x.com",
            "a@x@y.com",
        ] {
            assert!(!is_valid_email(bad), "expected {} to be invalid", bad);
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let errors = validate_login(&LoginForm {
            email: String::new(),
            password: String::new(),
        });
        assert_eq!(errors.get("email"), Some(&"Email is required"));
        assert_eq!(errors.get("password"), Some(&"Password is required"));

        let errors = validate_login(&LoginForm {
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
        });
        assert_eq!(
            errors.get("email"),
            Some(&"Please enter a valid email address")
        );
    }
}
