use super::print_json;
use anyhow::Context;
use dingtalk::api::ListAllUsersOptions;
use dingtalk::DingTalk;

pub async fn departments(dingtalk: &DingTalk, parent: Option<i64>) -> anyhow::Result<()> {
    let departments = dingtalk
        .department()
        .list(parent)
        .await
        .context("Failed to list departments")?;

    tracing::info!("Found {} departments", departments.len());
    print_json(&departments)
}

pub async fn users(
    dingtalk: &DingTalk,
    department: Option<i64>,
    simple: bool,
    concurrency: Option<usize>,
) -> anyhow::Result<()> {
    let opts = ListAllUsersOptions {
        concurrency,
        ..Default::default()
    };

    let users = if simple {
        dingtalk.user().simple_list_all(department, &opts).await
    } else {
        dingtalk.user().list_all(department, &opts).await
    }
    .context("Failed to list users")?;

    tracing::info!(
        "Found {} users in {} requests",
        users.items.len(),
        users.query_count
    );
    print_json(&users.items)
}
