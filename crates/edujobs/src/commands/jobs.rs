//! Job command handlers.

use tabled::Tabled;

use edujobs_core::registry::names;
use edujobs_core::{Job, JobBoard, JobFilter};

use crate::cli::{GlobalOpts, JobSearchArgs, JobsArgs, JobsCommand};
use crate::error::CliError;
use crate::{feedback, output};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Institution")]
    institution: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Type")]
    job_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Posted")]
    posted: String,
}

impl From<&Job> for JobRow {
    fn from(j: &Job) -> Self {
        Self {
            id: j.id.clone(),
            title: j.title.clone(),
            institution: j.institution.clone().unwrap_or_default(),
            location: j.location.clone().unwrap_or_default(),
            job_type: j.job_type.clone().unwrap_or_default(),
            status: j.status.clone().unwrap_or_default(),
            posted: output::short_date(j.created_at.as_ref()),
        }
    }
}

fn job_detail(j: &Job) -> String {
    let mut out = output::detail_lines(&[
        ("ID", j.id.clone()),
        ("Title", j.title.clone()),
        ("Institution", j.institution.clone().unwrap_or_default()),
        ("Location", j.location.clone().unwrap_or_default()),
        ("Type", j.job_type.clone().unwrap_or_default()),
        ("Salary", j.salary_range.clone().unwrap_or_default()),
        ("Status", j.status.clone().unwrap_or_default()),
        ("Posted", output::short_date(j.created_at.as_ref())),
    ]);
    if let Some(ref description) = j.description {
        out.push_str("\n\n");
        out.push_str(description);
    }
    out
}

fn print_jobs(jobs: &[Job], global: &GlobalOpts) {
    let out = output::render_list(&global.output, jobs, |j| JobRow::from(j), |j| j.id.clone());
    output::print_output(&out, global.quiet);
}

impl From<JobSearchArgs> for JobFilter {
    fn from(args: JobSearchArgs) -> Self {
        Self {
            search: args.search,
            location: args.location,
            job_type: args.job_type,
            page: args.page,
            limit: args.limit,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(board: &JobBoard, args: JobsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        JobsCommand::List(search) => {
            let jobs = board.jobs(&search.into()).await?;
            print_jobs(&jobs, global);
            Ok(())
        }

        JobsCommand::Get { id } => {
            let id = util::require_id("Job", &id)?;
            let job = board.job(id).await?;
            let out = output::render_single(&global.output, &job, job_detail, |j| j.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        JobsCommand::Mine => {
            let jobs = board.employer_jobs().await?;
            print_jobs(&jobs, global);
            Ok(())
        }

        JobsCommand::Saved => {
            let jobs = board.saved_jobs().await?;
            print_jobs(&jobs, global);
            Ok(())
        }

        JobsCommand::Create { from_file } => {
            let body = util::read_json_file(&from_file)?;
            let created = board.mutate(names::CREATE_JOB, &body).await?;
            feedback::success_or(global, util::server_message(&created), "Job posted");
            output::print_output(&output::render_value(&global.output, &created), global.quiet);
            Ok(())
        }

        JobsCommand::Update { id, from_file } => {
            let id = util::require_id("Job", &id)?;
            let body = util::with_id(util::read_json_file(&from_file)?, id)?;
            let updated = board.mutate(names::UPDATE_JOB, &body).await?;
            feedback::success_or(global, util::server_message(&updated), "Job updated");
            Ok(())
        }

        JobsCommand::Close { id } => {
            let id = util::require_id("Job", &id)?;
            let result = board.close_job(id).await?;
            feedback::success_or(global, util::server_message(&result), "Job closed");
            Ok(())
        }

        JobsCommand::Delete { id } => {
            let id = util::require_id("Job", &id)?;
            if !util::confirm(
                &format!("Delete job '{id}' and its applications?"),
                global.yes,
            )? {
                return Ok(());
            }
            let result = board.delete_job(id).await?;
            feedback::success_or(global, util::server_message(&result), "Job deleted");
            Ok(())
        }

        JobsCommand::Save { id } => {
            let id = util::require_id("Job", &id)?;
            let result = board.save_job(id).await?;
            feedback::success_or(global, util::server_message(&result), "Job saved");
            Ok(())
        }

        JobsCommand::Unsave { id } => {
            let id = util::require_id("Job", &id)?;
            let result = board.unsave_job(id).await?;
            feedback::success_or(global, util::server_message(&result), "Job removed from saved");
            Ok(())
        }
    }
}
