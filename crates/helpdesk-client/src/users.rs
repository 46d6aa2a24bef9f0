//! User administration endpoints.

use helpdesk_core::{
    NewUser, Page, ResetPasswordRequest, ResetPasswordResult, Role, User, UserUpdate,
    ValidationError, validate,
};
use tracing::{info, instrument};

use crate::{client::HelpdeskClient, error::ClientError};

const USER_CONFLICT: &str = "Username or email already exists.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub department_id: Option<u64>,
    /// Free-text search over username, name and email.
    pub q: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl UserQuery {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(role) = self.role {
            query.push(("role", role.to_string()));
        }
        if let Some(active) = self.active {
            query.push(("active", active.to_string()));
        }
        if let Some(department_id) = self.department_id {
            query.push(("departmentId", department_id.to_string()));
        }
        push_text(&mut query, "q", self.q.as_deref());
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size", size.to_string()));
        }
        push_text(&mut query, "sort", self.sort.as_deref());
        query
    }
}

pub(crate) fn push_text(
    query: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<&str>,
) {
    if let Some(value) = value.map(str::trim)
        && !value.is_empty()
    {
        query.push((key, value.to_string()));
    }
}

impl HelpdeskClient {
    pub async fn list_users(&self, query: &UserQuery) -> Result<Page<User>, ClientError> {
        let url = self.url_with_segments(&["users"])?;
        self.get_json(url, &query.to_query()).await
    }

    pub async fn get_user(&self, id: u64) -> Result<User, ClientError> {
        let url = self.url_with_segments(&["users", &id.to_string()])?;
        self.get_json(url, &[]).await
    }

    #[instrument(skip_all)]
    pub async fn create_user(&self, user: NewUser) -> Result<User, ClientError> {
        let user = validate::new_user(user)?;
        let url = self.url_with_segments(&["users"])?;
        let created: User = self
            .post_json(url, &user)
            .await
            .map_err(|err| err.conflict_fallback(USER_CONFLICT))?;
        info!(user_id = created.id, role = %created.role, "user created");
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update_user(&self, id: u64, update: UserUpdate) -> Result<User, ClientError> {
        if update.is_empty() {
            return Err(ValidationError::NoChanges.into());
        }
        let update = UserUpdate {
            email: update.email.as_deref().map(validate::email).transpose()?,
            full_name: update
                .full_name
                .as_deref()
                .map(validate::full_name)
                .transpose()?,
            ..update
        };

        let url = self.url_with_segments(&["users", &id.to_string()])?;
        let updated: User = self
            .patch_json(url, &update)
            .await
            .map_err(|err| err.conflict_fallback(USER_CONFLICT))?;
        info!("user updated");
        Ok(updated)
    }

    /// Resets a user's password, to `temp_password` when given or to a
    /// server-generated one otherwise.
    #[instrument(skip(self, temp_password))]
    pub async fn reset_password(
        &self,
        id: u64,
        temp_password: Option<&str>,
    ) -> Result<ResetPasswordResult, ClientError> {
        let temp_password = temp_password.filter(|value| !value.is_empty());
        if let Some(value) = temp_password {
            validate::password("tempPassword", value)?;
        }
        let url = self.url_with_segments(&["users", &id.to_string(), "reset-password"])?;
        let result: ResetPasswordResult = self
            .post_json(
                url,
                &ResetPasswordRequest {
                    temp_password: temp_password.map(str::to_string),
                },
            )
            .await?;
        info!("password reset");
        Ok(result)
    }
}
