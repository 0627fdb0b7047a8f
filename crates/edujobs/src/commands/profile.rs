//! Role profile handlers.

use crate::cli::{GlobalOpts, ProfileArgs, ProfileCommand};
use crate::error::CliError;
use crate::{feedback, output};

use edujobs_core::JobBoard;

use super::util;

pub async fn handle(
    board: &JobBoard,
    args: ProfileArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let kind = util::resolve_profile_kind(board, args.role.as_deref())?;

    match args.command {
        ProfileCommand::Show => {
            let profile = board.profile(kind).await?;
            output::print_output(&output::render_value(&global.output, &profile), global.quiet);
            Ok(())
        }

        ProfileCommand::Update { from_file, set } => {
            let changes = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None if set.is_empty() => {
                    return Err(CliError::Validation {
                        field: "update".into(),
                        reason: "nothing to change; pass --from-file or --set KEY=VALUE".into(),
                    });
                }
                None => util::parse_assignments(&set)?,
            };
            let result = board.update_profile(kind, &changes).await?;
            feedback::success_or(
                global,
                util::server_message(&result),
                &format!("{kind} profile updated"),
            );
            Ok(())
        }
    }
}
