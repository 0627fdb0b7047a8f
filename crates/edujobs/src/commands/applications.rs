//! Application command handlers.

use serde_json::json;
use tabled::Tabled;

use edujobs_core::registry::names;
use edujobs_core::{Application, JobBoard};

use crate::cli::{ApplicationsArgs, ApplicationsCommand, GlobalOpts};
use crate::error::CliError;
use crate::{feedback, output};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ApplicationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Job")]
    job: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Applied")]
    applied: String,
}

impl From<&Application> for ApplicationRow {
    fn from(a: &Application) -> Self {
        Self {
            id: a.id.clone(),
            job: a.job_title.clone().unwrap_or_else(|| a.job_id.clone()),
            status: a.status.to_string(),
            applied: output::short_date(a.applied_at.as_ref()),
        }
    }
}

fn print_applications(apps: &[Application], global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        apps,
        |a| ApplicationRow::from(a),
        |a| a.id.clone(),
    );
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    board: &JobBoard,
    args: ApplicationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ApplicationsCommand::List => {
            let apps = board.my_applications().await?;
            print_applications(&apps, global);
            Ok(())
        }

        ApplicationsCommand::Apply {
            job_id,
            cover_letter,
            resume,
        } => {
            let result = board
                .apply_to_job(&job_id, cover_letter.as_deref(), resume.as_deref())
                .await?;
            feedback::success_or(global, util::server_message(&result), "Application submitted");
            Ok(())
        }

        ApplicationsCommand::Withdraw { id } => {
            let id = util::require_id("Application", &id)?;
            if !util::confirm(&format!("Withdraw application '{id}'?"), global.yes)? {
                return Ok(());
            }
            let result = board.withdraw_application(id).await?;
            feedback::success_or(global, util::server_message(&result), "Application withdrawn");
            Ok(())
        }

        ApplicationsCommand::ForJob { job_id } => {
            let job_id = util::require_id("Job", &job_id)?;
            let apps = board.job_applications(job_id).await?;
            print_applications(&apps, global);
            Ok(())
        }

        ApplicationsCommand::SetStatus { id, status } => {
            let id = util::require_id("Application", &id)?;
            let status = util::require_id("Status", &status)?;
            let result = board
                .mutate(
                    names::UPDATE_APPLICATION_STATUS,
                    &json!({ "id": id, "status": status.to_lowercase() }),
                )
                .await?;
            feedback::success_or(
                global,
                util::server_message(&result),
                &format!("Application marked {}", status.to_lowercase()),
            );
            Ok(())
        }
    }
}
