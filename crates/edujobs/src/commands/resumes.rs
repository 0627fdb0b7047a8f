//! Resume command handlers.

use tabled::Tabled;

use edujobs_core::{JobBoard, Resume};

use crate::cli::{GlobalOpts, ResumesArgs, ResumesCommand};
use crate::error::CliError;
use crate::{feedback, output};

use super::util;

#[derive(Tabled)]
struct ResumeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "File")]
    file_name: String,
    #[tabled(rename = "Uploaded")]
    uploaded: String,
}

impl From<&Resume> for ResumeRow {
    fn from(r: &Resume) -> Self {
        Self {
            id: r.id.clone(),
            file_name: r.file_name.clone(),
            uploaded: output::short_date(r.uploaded_at.as_ref()),
        }
    }
}

pub async fn handle(
    board: &JobBoard,
    args: ResumesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ResumesCommand::List => {
            let resumes = board.resumes().await?;
            let out = output::render_list(
                &global.output,
                &resumes,
                |r| ResumeRow::from(r),
                |r| r.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ResumesCommand::Delete { id } => {
            let id = util::require_id("Resume", &id)?;
            if !util::confirm(&format!("Delete resume '{id}'?"), global.yes)? {
                return Ok(());
            }
            let result = board.delete_resume(id).await?;
            feedback::success_or(global, util::server_message(&result), "Resume deleted");
            Ok(())
        }
    }
}
