use super::{field, into_record, none_if_missing};
use crate::client::{list_all, Client, ListAll, ListAllOptions, Page, RequestOptions};
use crate::error::{ensure, DingTalkError, Result};
use crate::models::{DepartmentList, User, UserPage};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Remote codes meaning the user does not exist
const USER_NOT_FOUND: &[i64] = &[60121, 60111];

/// Paging and ordering for one `user/list` call
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    /// entry_asc, entry_desc, modify_asc, modify_desc or custom
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListAllUsersOptions {
    pub lang: Option<String>,
    pub order: Option<String>,
    /// Defaults to 100
    pub page_size: Option<usize>,
    /// Defaults to the client's configured concurrency
    pub concurrency: Option<usize>,
}

/// Member fields for create/update; anything not modelled goes in `extra`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Vec<i64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub struct UserApi<'a> {
    client: &'a Client,
}

impl<'a> UserApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// One page of detailed members of a department (`user/list`)
    pub async fn list(&self, department_id: i64, opts: &ListOptions) -> Result<UserPage> {
        self.page("user/list", department_id, opts).await
    }

    /// One page of `{userid, name}` members of a department (`user/simplelist`)
    pub async fn simple_list(&self, department_id: i64, opts: &ListOptions) -> Result<UserPage> {
        self.page("user/simplelist", department_id, opts).await
    }

    async fn page(&self, api: &str, department_id: i64, opts: &ListOptions) -> Result<UserPage> {
        let mut query = serde_json::to_value(opts)?;
        query["department_id"] = json!(department_id);
        self.client
            .get_json(api, &query, &RequestOptions::default())
            .await
    }

    /// Every detailed member of `department_id`, or of all departments when `None`
    pub async fn list_all(
        &self,
        department_id: Option<i64>,
        opts: &ListAllUsersOptions,
    ) -> Result<ListAll<User>> {
        self.enumerate(department_id, false, opts).await
    }

    /// Every simple member of `department_id`, or of all departments when `None`
    pub async fn simple_list_all(
        &self,
        department_id: Option<i64>,
        opts: &ListAllUsersOptions,
    ) -> Result<ListAll<User>> {
        self.enumerate(department_id, true, opts).await
    }

    async fn enumerate(
        &self,
        department_id: Option<i64>,
        simple: bool,
        opts: &ListAllUsersOptions,
    ) -> Result<ListAll<User>> {
        let mut extra_queries = 0;
        let departments = match department_id {
            Some(id) => vec![id],
            None => {
                extra_queries += 1;
                let response = self
                    .client
                    .get("department/list", &(), &RequestOptions::default())
                    .await?;
                let list: DepartmentList = response.json()?;
                list.department.into_iter().map(|d| d.id).collect()
            }
        };

        let list_opts = ListAllOptions {
            page_size: opts.page_size.unwrap_or(ListAllOptions::default().page_size),
            concurrency: opts
                .concurrency
                .unwrap_or(self.client.config().concurrency),
        };
        tracing::debug!(
            "Listing users of {} departments ({} at a time)",
            departments.len(),
            list_opts.concurrency
        );

        let mut result = list_all(
            departments,
            list_opts,
            |department_id, offset, size| {
                let page_opts = ListOptions {
                    lang: opts.lang.clone(),
                    order: opts.order.clone(),
                    offset: Some(offset),
                    size: Some(size),
                };
                async move {
                    let page = if simple {
                        self.simple_list(department_id, &page_opts).await?
                    } else {
                        self.list(department_id, &page_opts).await?
                    };
                    Ok::<_, DingTalkError>(Page {
                        items: page.userlist,
                        has_more: page.has_more,
                    })
                }
            },
            |user: &User| user.userid.clone(),
        )
        .await?;

        result.query_count += extra_queries;
        Ok(result)
    }

    /// `user/get`; `None` when the user does not exist
    pub async fn get(&self, userid: &str) -> Result<Option<User>> {
        ensure(!userid.is_empty(), "userid required")?;
        let result = async {
            let response = self
                .client
                .get("user/get", &json!({ "userid": userid }), &RequestOptions::default())
                .await?;
            into_record(response)
        }
        .await;
        none_if_missing(result, USER_NOT_FOUND)
    }

    /// `user/create`, returns the userid
    pub async fn create(&self, spec: &UserSpec) -> Result<String> {
        ensure(
            spec.name.as_deref().is_some_and(|n| !n.is_empty()),
            "user name required",
        )?;
        ensure(
            spec.mobile.as_deref().is_some_and(|m| !m.is_empty()),
            "user mobile required",
        )?;
        ensure(
            spec.department.as_ref().is_some_and(|d| !d.is_empty()),
            "user department required",
        )?;

        let response = self
            .client
            .post("user/create", spec, &RequestOptions::default())
            .await?;
        field(response, "userid")
    }

    pub async fn update(&self, spec: &UserSpec) -> Result<Value> {
        ensure(
            spec.userid.as_deref().is_some_and(|u| !u.is_empty()),
            "userid required",
        )?;
        ensure(
            spec.name.as_deref().is_some_and(|n| !n.is_empty()),
            "user name required",
        )?;
        self.client
            .post("user/update", spec, &RequestOptions::default())
            .await?
            .into_json()
    }

    /// Delete one user (`user/delete`) or several atomically (`user/batchdelete`)
    pub async fn delete(&self, userids: &[&str]) -> Result<Value> {
        ensure(!userids.is_empty(), "userid required")?;

        let response = match userids {
            [userid] => {
                self.client
                    .get("user/delete", &json!({ "userid": userid }), &RequestOptions::default())
                    .await?
            }
            many => {
                self.client
                    .post(
                        "user/batchdelete",
                        &json!({ "useridlist": many }),
                        &RequestOptions::default(),
                    )
                    .await?
            }
        };
        response.into_json()
    }

    pub async fn get_userid_by_unionid(&self, unionid: &str) -> Result<String> {
        ensure(!unionid.is_empty(), "unionid required")?;
        let response = self
            .client
            .get(
                "user/getUseridByUnionid",
                &json!({ "unionid": unionid }),
                &RequestOptions::default(),
            )
            .await?;
        field(response, "userid")
    }

    /// Exchange a login-free `code` from the JSAPI for the member's identity
    pub async fn get_user_info_by_code(&self, code: &str) -> Result<Value> {
        ensure(!code.is_empty(), "code required")?;
        self.client
            .get("user/getuserinfo", &json!({ "code": code }), &RequestOptions::default())
            .await?
            .into_json()
    }

    pub async fn get_by_mobile(&self, mobile: &str) -> Result<String> {
        ensure(!mobile.is_empty(), "mobile required")?;
        let response = self
            .client
            .get(
                "user/get_by_mobile",
                &json!({ "mobile": mobile }),
                &RequestOptions::default(),
            )
            .await?;
        field(response, "userid")
    }
}
