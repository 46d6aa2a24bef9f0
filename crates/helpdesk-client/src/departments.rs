//! Department administration endpoints.

use helpdesk_core::{
    Department, DepartmentMinimal, DepartmentUpdate, NewDepartment, Page, ValidationError,
    validate,
};
use tracing::{info, instrument};

use crate::{client::HelpdeskClient, error::ClientError, users::push_text};

const DEPARTMENT_CONFLICT: &str = "Department code or name already exists.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentQuery {
    pub q: Option<String>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl DepartmentQuery {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        push_text(&mut query, "q", self.q.as_deref());
        if let Some(active) = self.active {
            query.push(("active", active.to_string()));
        }
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

impl HelpdeskClient {
    pub async fn list_departments(
        &self,
        query: &DepartmentQuery,
    ) -> Result<Page<Department>, ClientError> {
        let url = self.url_with_segments(&["departments"])?;
        self.get_json(url, &query.to_query()).await
    }

    pub async fn get_department(&self, id: u64) -> Result<Department, ClientError> {
        let url = self.url_with_segments(&["departments", &id.to_string()])?;
        self.get_json(url, &[]).await
    }

    /// Id, code and name of every department, for pickers.
    pub async fn minimal_departments(
        &self,
        active: Option<bool>,
    ) -> Result<Vec<DepartmentMinimal>, ClientError> {
        let url = self.url_with_segments(&["departments", "minimal"])?;
        let query: Vec<(&str, String)> = active
            .map(|active| vec![("active", active.to_string())])
            .unwrap_or_default();
        self.get_json(url, &query).await
    }

    #[instrument(skip_all)]
    pub async fn create_department(
        &self,
        department: &NewDepartment,
    ) -> Result<Department, ClientError> {
        let department = validate::new_department(department)?;
        let url = self.url_with_segments(&["departments"])?;
        let created: Department = self
            .post_json(url, &department)
            .await
            .map_err(|err| err.conflict_message(DEPARTMENT_CONFLICT))?;
        info!(department_id = created.id, code = %created.code, "department created");
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update_department(
        &self,
        id: u64,
        update: &DepartmentUpdate,
    ) -> Result<Department, ClientError> {
        if update.is_empty() {
            return Err(ValidationError::NoChanges.into());
        }
        let update = DepartmentUpdate {
            code: update.code.as_deref().map(validate::department_code).transpose()?,
            name: update.name.as_deref().map(validate::department_name).transpose()?,
            description: update
                .description
                .as_ref()
                .map(|description| validate::department_description(description.as_deref()))
                .transpose()?,
            active: update.active,
        };

        let url = self.url_with_segments(&["departments", &id.to_string()])?;
        let updated: Department = self
            .patch_json(url, &update)
            .await
            .map_err(|err| err.conflict_message(DEPARTMENT_CONFLICT))?;
        info!("department updated");
        Ok(updated)
    }
}
