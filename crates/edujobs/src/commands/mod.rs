//! Command dispatch: bridges CLI args -> `JobBoard` calls -> output formatting.

pub mod admin;
pub mod api;
pub mod applications;
pub mod auth;
pub mod config_cmd;
pub mod content;
pub mod jobs;
pub mod profile;
pub mod resumes;
pub mod util;

use edujobs_core::JobBoard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, board: &JobBoard, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(board, args, global).await,
        Command::Jobs(args) => jobs::handle(board, args, global).await,
        Command::Applications(args) => applications::handle(board, args, global).await,
        Command::Resumes(args) => resumes::handle(board, args, global).await,
        Command::Profile(args) => profile::handle(board, args, global).await,
        Command::Content(args) => content::handle(board, args, global).await,
        Command::Admin(args) => admin::handle(board, args, global).await,
        Command::Api(args) => api::handle(board, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command must be handled before connecting".into(),
        )),
    }
}
