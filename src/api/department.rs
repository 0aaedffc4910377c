use super::{field, into_record, none_if_missing};
use crate::client::{Client, RequestOptions};
use crate::error::{ensure, Result};
use crate::models::{Department, DepartmentList};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Remote codes meaning the department does not exist
const DEPARTMENT_NOT_FOUND: &[i64] = &[60003];

/// Department fields for create/update; anything not modelled goes in `extra`
#[derive(Debug, Clone, Default, Serialize)]
pub struct DepartmentSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "parentid", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct DepartmentApi<'a> {
    client: &'a Client,
}

impl<'a> DepartmentApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `department/list`, optionally below `parent_id`
    pub async fn list(&self, parent_id: Option<i64>) -> Result<Vec<Department>> {
        let response = self
            .client
            .get("department/list", &json!({ "id": parent_id }), &RequestOptions::default())
            .await?;
        let list: DepartmentList = response.json()?;
        Ok(list.department)
    }

    /// `department/get`; `None` when the department does not exist
    pub async fn get(&self, id: i64) -> Result<Option<Department>> {
        let result = async {
            let response = self
                .client
                .get("department/get", &json!({ "id": id }), &RequestOptions::default())
                .await?;
            into_record(response)
        }
        .await;
        none_if_missing(result, DEPARTMENT_NOT_FOUND)
    }

    /// `department/create`, returns the new id
    pub async fn create(&self, spec: &DepartmentSpec) -> Result<i64> {
        ensure(
            spec.name.as_deref().is_some_and(|n| !n.is_empty()),
            "department name required",
        )?;
        ensure(
            spec.parent_id.is_some_and(|p| p > 0),
            "department parentid required, root is 1",
        )?;

        let response = self
            .client
            .post("department/create", spec, &RequestOptions::default())
            .await?;
        field(response, "id")
    }

    pub async fn update(&self, spec: &DepartmentSpec) -> Result<Value> {
        ensure(spec.id.is_some(), "department id required")?;
        self.client
            .post("department/update", spec, &RequestOptions::default())
            .await?
            .into_json()
    }

    pub async fn delete(&self, id: i64) -> Result<Value> {
        self.client
            .get("department/delete", &json!({ "id": id }), &RequestOptions::default())
            .await?
            .into_json()
    }
}
