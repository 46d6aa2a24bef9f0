//! Signed-in identity.
//!
//! [`SessionContext`] is the one place that knows who is signed in. It is
//! passed explicitly to whatever needs an [`Actor`]; the identity it caches
//! lives in the shared [`HelpdeskClient`], so a 401 seen by any clone of the
//! client invalidates it.

use helpdesk_core::{
    Actor, PasswordChange, PermissionError, User, ValidationError,
    model::{ApiEnvelope, LoginRequest},
    validate,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{client::HelpdeskClient, error::ClientError};

#[derive(Debug)]
pub struct SessionContext {
    client: HelpdeskClient,
    fetch: Mutex<()>,
}

impl SessionContext {
    pub fn new(client: HelpdeskClient) -> Self {
        Self {
            client,
            fetch: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &HelpdeskClient {
        &self.client
    }

    /// Signs in and caches the returned user.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let url = self.client.url_with_segments(&["auth", "login"])?;
        let body = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let envelope: ApiEnvelope<User> =
            self.client
                .post_json(url, &body)
                .await
                .map_err(|err| match err {
                    ClientError::Unauthorized { .. } => ClientError::LoginRejected { message: None },
                    other => other,
                })?;

        let user = match envelope.data {
            Some(user) if envelope.success => user,
            _ => {
                return Err(ClientError::LoginRejected {
                    message: envelope.message,
                });
            }
        };
        self.client.store_identity(Some(user.clone()));
        info!(user_id = user.id, role = %user.role, "signed in");
        Ok(user)
    }

    /// Signs out. The cached identity is dropped even when the call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = async {
            let url = self.client.url_with_segments(&["auth", "logout"])?;
            self.client.post_empty(url, &serde_json::json!({})).await
        }
        .await;
        self.clear_cache();
        if result.is_ok() {
            info!("signed out");
        }
        result
    }

    /// Returns the signed-in user, fetching `/auth/me` at most once for any
    /// number of concurrent callers. `None` when nobody is signed in or the
    /// lookup failed.
    pub async fn ensure_me(&self) -> Option<User> {
        if let Some(user) = self.client.cached_identity() {
            return Some(user);
        }

        let _guard = self.fetch.lock().await;
        if let Some(user) = self.client.cached_identity() {
            return Some(user);
        }

        let fetched = async {
            let url = self.client.url_with_segments(&["auth", "me"])?;
            self.client.get_json::<ApiEnvelope<User>>(url, &[]).await
        }
        .await;

        match fetched {
            Ok(envelope) => {
                self.client.store_identity(envelope.data.clone());
                envelope.data
            }
            Err(err) if err.is_unauthorized() => {
                debug!("no active session");
                None
            }
            Err(err) => {
                warn!(error = %err, "failed to load current user");
                None
            }
        }
    }

    /// The signed-in user as an [`Actor`].
    pub async fn actor(&self) -> Result<Actor, ClientError> {
        self.ensure_me()
            .await
            .as_ref()
            .map(Actor::from)
            .ok_or_else(|| PermissionError::NotAuthenticated.into())
    }

    pub fn cached_user(&self) -> Option<User> {
        self.client.cached_identity()
    }

    pub fn clear_cache(&self) {
        self.client.clear_identity();
    }

    /// Changes the signed-in user's password. The new password must satisfy
    /// the complexity rules and differ from the current one.
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), ClientError> {
        if current.is_empty() {
            return Err(ValidationError::Required {
                field: "currentPassword",
            }
            .into());
        }
        validate::password("newPassword", new)?;
        if current == new {
            return Err(ValidationError::InvalidFormat {
                field: "newPassword",
                message: "must differ from the current password",
            }
            .into());
        }

        let url = self.client.url_with_segments(&["users", "change-password"])?;
        self.client
            .post_empty(
                url,
                &PasswordChange {
                    current_password: current.to_string(),
                    new_password: new.to_string(),
                },
            )
            .await?;
        // The backend clears the must-change flag; refetch on next use.
        self.clear_cache();
        info!("password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use helpdesk_core::Role;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;
    use crate::testing::client_for;

    fn me_body() -> serde_json::Value {
        json!({
            "success": true,
            "data": {"id": 5, "username": "ana", "fullName": "Ana Silva", "role": "AGENT"}
        })
    }

    #[tokio::test]
    async fn test_login_caches_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"username": "ana", "password": "S3cret!pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
            .expect(0)
            .mount(&server)
            .await;

        let session = SessionContext::new(client_for(&server));
        let user = session.login(" ana ", "S3cret!pw").await.unwrap();

        assert_eq!(user.role, Role::Agent);
        assert_eq!(session.actor().await.unwrap(), Actor::new(5, Role::Agent));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_reported_as_login_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let session = SessionContext::new(client_for(&server));
        let err = session.login("ana", "wrong").await.unwrap_err();

        assert!(matches!(err, ClientError::LoginRejected { .. }));
        assert_eq!(err.user_message("ignored"), "Invalid username or password.");
    }

    #[tokio::test]
    async fn test_ensure_me_is_single_flight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(me_body())
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let session = Arc::new(SessionContext::new(client_for(&server)));
        let (a, b) = tokio::join!(session.ensure_me(), session.ensure_me());

        assert_eq!(a.unwrap().id, 5);
        assert_eq!(b.unwrap().id, 5);
    }

    #[tokio::test]
    async fn test_ensure_me_returns_none_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let session = SessionContext::new(client_for(&server));
        assert!(session.ensure_me().await.is_none());
        assert!(matches!(
            session.actor().await,
            Err(ClientError::Lifecycle(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
            .expect(2)
            .mount(&server)
            .await;

        let session = SessionContext::new(client_for(&server));
        session.ensure_me().await.unwrap();
        session.ensure_me().await.unwrap();
        session.clear_cache();
        session.ensure_me().await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_clears_cache_even_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = SessionContext::new(client_for(&server));
        session.client().store_identity(Some(
            serde_json::from_value(me_body()["data"].clone()).unwrap(),
        ));

        assert!(session.logout().await.is_err());
        assert!(session.cached_user().is_none());
    }

    #[tokio::test]
    async fn test_change_password_validates_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/change-password"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session = SessionContext::new(client_for(&server));
        assert!(session.change_password("Old!pass1", "weak").await.is_err());
        assert!(session.change_password("Same!pass1", "Same!pass1").await.is_err());
        session
            .change_password("Old!pass1", "N3w!password")
            .await
            .unwrap();
    }
}
