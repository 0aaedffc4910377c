use super::field;
use crate::client::{list_all, Client, ListAllOptions, Page, RequestOptions};
use crate::error::{ensure, DingTalkError, Result};
use crate::models::ExtContact;
use serde::Serialize;
use serde_json::{json, Map, Value};

const DEFAULT_LIST_SIZE: usize = 20;
const LIST_ALL_PAGE_SIZE: usize = 100;
const DEFAULT_STATE_CODE: &str = "86";

/// External contact fields for create/update
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtContactSpec {
    /// Required for update; the endpoints spell it `user_id` here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub label_ids: Vec<i64>,
    pub follower_user_id: String,
    /// Phone country code, `86` unless set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct ExtContactApi<'a> {
    client: &'a Client,
}

impl<'a> ExtContactApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// One page of external contacts (default offset 0, size 20)
    pub async fn list(&self, offset: Option<usize>, size: Option<usize>) -> Result<Vec<ExtContact>> {
        self.page(offset.unwrap_or(0), size.unwrap_or(DEFAULT_LIST_SIZE))
            .await
    }

    async fn page(&self, offset: usize, size: usize) -> Result<Vec<ExtContact>> {
        let response = self
            .client
            .get(
                "topapi/extcontact/list",
                &json!({ "offset": offset, "size": size }),
                &RequestOptions::default(),
            )
            .await?;
        let results: Option<Vec<ExtContact>> = field(response, "results")?;
        Ok(results.unwrap_or_default())
    }

    /// Every external contact, paged 100 at a time until a short page
    pub async fn list_all(&self) -> Result<Vec<ExtContact>> {
        let result = list_all(
            vec![()],
            ListAllOptions {
                page_size: LIST_ALL_PAGE_SIZE,
                concurrency: 1,
            },
            |_, offset, size| async move {
                let items = self.page(offset, size).await?;
                let has_more = items.len() == size;
                Ok::<_, DingTalkError>(Page { items, has_more })
            },
            |contact: &ExtContact| contact.userid.clone(),
        )
        .await?;

        tracing::debug!(
            "Listed {} external contacts in {} requests",
            result.items.len(),
            result.query_count
        );
        Ok(result.items)
    }

    /// `topapi/extcontact/create`, returns the new userid
    pub async fn create(&self, spec: &ExtContactSpec) -> Result<String> {
        ensure(!spec.name.is_empty(), "name required")?;
        ensure(
            spec.mobile.as_deref().is_some_and(|m| !m.is_empty()),
            "mobile required",
        )?;
        ensure(!spec.label_ids.is_empty(), "label_ids required")?;
        ensure(!spec.follower_user_id.is_empty(), "follower_user_id required")?;

        let mut contact = spec.clone();
        if contact.state_code.is_none() {
            contact.state_code = Some(DEFAULT_STATE_CODE.to_string());
        }

        let response = self
            .client
            .post(
                "topapi/extcontact/create",
                &json!({ "contact": contact }),
                &RequestOptions::default(),
            )
            .await?;
        field(response, "userid")
    }

    pub async fn update(&self, spec: &ExtContactSpec) -> Result<Value> {
        ensure(
            spec.user_id.as_deref().is_some_and(|u| !u.is_empty()),
            "user_id required",
        )?;
        ensure(!spec.name.is_empty(), "name required")?;
        ensure(!spec.label_ids.is_empty(), "label_ids required")?;
        ensure(!spec.follower_user_id.is_empty(), "follower_user_id required")?;

        self.client
            .post(
                "topapi/extcontact/update",
                &json!({ "contact": spec }),
                &RequestOptions::default(),
            )
            .await?
            .into_json()
    }

    pub async fn get(&self, userid: &str) -> Result<ExtContact> {
        ensure(!userid.is_empty(), "user_id required")?;
        let response = self
            .client
            .get(
                "topapi/extcontact/get",
                &json!({ "user_id": userid }),
                &RequestOptions::default(),
            )
            .await?;
        field(response, "result")
    }

    pub async fn delete(&self, userid: &str) -> Result<Value> {
        ensure(!userid.is_empty(), "user_id required")?;
        self.client
            .post(
                "topapi/extcontact/delete",
                &json!({ "user_id": userid }),
                &RequestOptions::default(),
            )
            .await?
            .into_json()
    }

    /// Label groups, each with its `labels`
    pub async fn list_label_groups(
        &self,
        offset: Option<usize>,
        size: Option<usize>,
    ) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(
                "topapi/extcontact/listlabelgroups",
                &json!({
                    "offset": offset.unwrap_or(0),
                    "size": size.unwrap_or(DEFAULT_LIST_SIZE),
                }),
                &RequestOptions::default(),
            )
            .await?;
        let results: Option<Vec<Value>> = field(response, "results")?;
        Ok(results.unwrap_or_default())
    }
}
