//! `wms` command-line client.

use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;

use wms_auth::{FileSessionStorage, RouteTable, Router, SessionStore, visible_sections};
use wms_client::payload::ApprovalDecision;
use wms_client::{ApiClient, ClientConfig};

const USAGE: &str = "usage: wms <command>

commands:
  login <username> <password>
  logout
  whoami
  navigate <path>
  menu
  approvals
  approval <id>
  approve <id> [remark]
  reject <id> [remark]
  tasks
  inventory [keyword]";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wms_observability::init();

    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    let session = Arc::new(SessionStore::restore(FileSessionStorage::new(&config.session_file)));
    let router = Arc::new(Router::new(RouteTable::default(), session.clone()));
    let client = ApiClient::from_config(&config, session.clone(), router.clone())?;

    tracing::debug!(api_url = %config.api_url, use_mock = config.use_mock, "client configured");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["login", username, password] => {
            client.login(username, password).await?;
            print_json(&router.after_login())?;
        }
        ["logout"] => client.logout(),
        ["whoami"] => print_json(&session.snapshot())?,
        ["navigate", path] => print_json(&router.navigate(path))?,
        ["menu"] => print_json(&visible_sections(&session.snapshot()))?,
        ["approvals"] => print_json(&client.list_approvals().await)?,
        ["approval", id] => match client.fetch_approval_detail(Some(*id)).await? {
            Some(detail) => print_json(&detail)?,
            None => bail!("no approval found for '{id}'"),
        },
        ["approve" | "reject", id, remark @ ..] => {
            let remark = (!remark.is_empty()).then(|| remark.join(" "));
            let decision = if args[0] == "approve" {
                ApprovalDecision::approve(remark)
            } else {
                ApprovalDecision::reject(remark)
            };
            print_json(&client.process_approval(id, &decision).await?)?;
        }
        ["tasks"] => print_json(&client.list_warehouse_tasks().await?)?,
        ["inventory", keyword @ ..] => {
            let keyword = keyword.first().copied();
            print_json(&client.list_inventory(keyword).await?)?;
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
