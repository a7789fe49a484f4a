use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError, Session, SessionMap};
use crate::models::users::{NewProfile, ProfileUpdate, RegisterData, UserProfile};
use crate::repositories::identity::IdentityApi;
use crate::repositories::users::UserRepository;

pub enum AccountRequest {
    Register {
        data: RegisterData,
        response: oneshot::Sender<Result<(String, UserProfile), ServiceError>>,
    },
    Login {
        email: String,
        password: String,
        response: oneshot::Sender<Result<(String, UserProfile), ServiceError>>,
    },
    Logout {
        token: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    CurrentUser {
        token: String,
        response: oneshot::Sender<Option<UserProfile>>,
    },
    UpdateProfile {
        user_id: String,
        update: ProfileUpdate,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    ResetPassword {
        email: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    ChangePassword {
        email: String,
        current_password: String,
        new_password: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
}

#[derive(Clone)]
pub struct AccountRequestHandler {
    identity: IdentityApi,
    repository: UserRepository,
    sessions: SessionMap,
}

impl AccountRequestHandler {
    pub fn new(sql_conn: PgPool, identity: IdentityApi, sessions: SessionMap) -> Self {
        let repository = UserRepository::new(sql_conn);

        AccountRequestHandler {
            identity,
            repository,
            sessions,
        }
    }

    async fn register(&self, data: RegisterData) -> Result<(String, UserProfile), ServiceError> {
        let session = self.identity.register(&data.email, &data.password).await?;

        // The identity account is not rolled back if this insert fails;
        // the two systems can diverge until the user retries.
        let profile = self
            .repository
            .insert_profile(&NewProfile {
                id: session.uid.clone(),
                email: data.email.clone(),
                first_name: data.first_name,
                last_name: data.last_name,
                phone: data.phone,
                country: data.country,
            })
            .await
            .map_err(|e| ServiceError::Repository("AccountService".to_string(), e.to_string()))?;

        self.sessions.insert(
            session.token.clone(),
            Session {
                user_id: session.uid,
                email: data.email,
            },
        );

        Ok((session.token, profile))
    }

    async fn login(
        &self,
        email: String,
        password: String,
    ) -> Result<(String, UserProfile), ServiceError> {
        let session = self.identity.sign_in(&email, &password).await?;

        let profile = self
            .repository
            .get_profile(&session.uid)
            .await
            .map_err(|e| ServiceError::Repository("AccountService".to_string(), e.to_string()))?;

        let Some(profile) = profile else {
            // Identity exists but no profile row; not reconciled here.
            return Err(ServiceError::ProfileNotFound);
        };

        if let Err(e) = self.repository.touch_last_login(&session.uid).await {
            log::warn!("Could not update last login for {}: {}", session.uid, e);
        }

        self.sessions.insert(
            session.token.clone(),
            Session {
                user_id: session.uid,
                email,
            },
        );

        Ok((session.token, profile))
    }

    /// Always reports success; a provider sign-out failure is only logged.
    async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.sessions.remove(token);

        if let Err(e) = self.identity.sign_out(token).await {
            log::warn!("Provider sign-out failed: {}", e);
        }

        Ok(())
    }

    /// Profile for the active session, or `None`. Read failures collapse
    /// to `None` as well.
    async fn current_user(&self, token: &str) -> Option<UserProfile> {
        let user_id = self.sessions.get(token)?.user_id.clone();

        match self.repository.get_profile(&user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                log::warn!("Could not read profile {}: {}", user_id, e);
                None
            }
        }
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<(), ServiceError> {
        self.repository
            .update_profile(user_id, &update)
            .await
            .map_err(|e| ServiceError::Repository("AccountService".to_string(), e.to_string()))
    }

    async fn reset_password(&self, email: &str) -> Result<(), ServiceError> {
        self.identity.send_password_reset(email).await?;
        Ok(())
    }

    async fn change_password(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        self.identity
            .change_password(email, current_password, new_password)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RequestHandler<AccountRequest> for AccountRequestHandler {
    async fn handle_request(&self, request: AccountRequest) {
        match request {
            AccountRequest::Register { data, response } => {
                let result = self.register(data).await;
                let _ = response.send(result);
            }
            AccountRequest::Login {
                email,
                password,
                response,
            } => {
                let result = self.login(email, password).await;
                let _ = response.send(result);
            }
            AccountRequest::Logout { token, response } => {
                let result = self.logout(&token).await;
                let _ = response.send(result);
            }
            AccountRequest::CurrentUser { token, response } => {
                let user = self.current_user(&token).await;
                let _ = response.send(user);
            }
            AccountRequest::UpdateProfile {
                user_id,
                update,
                response,
            } => {
                let result = self.update_profile(&user_id, update).await;
                let _ = response.send(result);
            }
            AccountRequest::ResetPassword { email, response } => {
                let result = self.reset_password(&email).await;
                let _ = response.send(result);
            }
            AccountRequest::ChangePassword {
                email,
                current_password,
                new_password,
                response,
            } => {
                let result = self
                    .change_password(&email, &current_password, &new_password)
                    .await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct AccountService;

impl AccountService {
    pub fn new() -> Self {
        AccountService {}
    }
}

#[async_trait]
impl Service<AccountRequest, AccountRequestHandler> for AccountService {}
