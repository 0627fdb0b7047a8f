//! Account administration handlers.

use serde_json::{Value, json};
use tabled::Tabled;

use edujobs_core::JobBoard;
use edujobs_core::registry::names;

use crate::cli::{AdminArgs, AdminCommand, GlobalOpts};
use crate::error::CliError;
use crate::{feedback, output};

use super::util;

/// Admin user listings carry fields beyond `User`, so rows read the raw value.
#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn field(v: &Value, key: &str) -> String {
    match v.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl From<&Value> for UserRow {
    fn from(v: &Value) -> Self {
        let id = field(v, "id");
        Self {
            id: if id.is_empty() { field(v, "_id") } else { id },
            email: field(v, "email"),
            name: field(v, "name"),
            role: field(v, "role"),
            status: field(v, "status"),
        }
    }
}

pub async fn handle(board: &JobBoard, args: AdminArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AdminCommand::Users => {
            let value = board.query(names::GET_USERS, &json!({})).await?;
            let users: Vec<Value> = edujobs_core::endpoint::list_items(&value)
                .cloned()
                .unwrap_or_default();
            let out = output::render_list(
                &global.output,
                &users,
                |u| UserRow::from(u),
                |u| UserRow::from(u).id,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AdminCommand::SetUserStatus { id, status } => {
            let id = util::require_id("User", &id)?;
            let status = util::require_id("Status", &status)?;
            let result = board
                .mutate(names::UPDATE_USER_STATUS, &json!({ "id": id, "status": status }))
                .await?;
            feedback::success_or(
                global,
                util::server_message(&result),
                &format!("User {id} is now {status}"),
            );
            Ok(())
        }

        AdminCommand::DeleteUser { id } => {
            let id = util::require_id("User", &id)?;
            if !util::confirm(
                &format!("Delete user '{id}'? This cannot be undone."),
                global.yes,
            )? {
                return Ok(());
            }
            let result = board.mutate(names::DELETE_USER, &json!({ "id": id })).await?;
            feedback::success_or(global, util::server_message(&result), "User deleted");
            Ok(())
        }
    }
}
