//! Auth command handlers: sign-in flows and the local session.

use secrecy::SecretString;
use serde_json::json;

use edujobs_core::{AuthOutcome, JobBoard, SignupForm, User};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::{feedback, output};

use super::util;

// ── Detail view ─────────────────────────────────────────────────────

fn user_detail(u: &User) -> String {
    output::detail_lines(&[
        ("ID", u.id.clone()),
        ("Name", u.name.clone().unwrap_or_default()),
        ("Email", u.email.clone()),
        ("Role", u.role.to_string()),
        ("Verified", if u.is_verified { "yes" } else { "no" }.into()),
    ])
}

fn report_outcome(outcome: AuthOutcome, global: &GlobalOpts) {
    match outcome {
        AuthOutcome::Authenticated(user) => {
            let who = user.name.as_deref().unwrap_or(&user.email);
            feedback::success(global, &format!("Signed in as {who} ({})", user.role));
        }
        AuthOutcome::VerificationRequired { message } => {
            feedback::notice(
                global,
                message
                    .as_deref()
                    .unwrap_or("A verification code was sent to your email"),
            );
            feedback::notice(global, "Finish with: edujobs auth verify-otp <email> <code>");
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(board: &JobBoard, args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login { email, password } => {
            let password = util::password_or_prompt(password, "Password: ")?;
            let outcome = board.login(&email, &password).await?;
            report_outcome(outcome, global);
            Ok(())
        }

        AuthCommand::Signup {
            name,
            email,
            role,
            institution,
            password,
        } => {
            let role = edujobs_core::validation::parse_role(&role)?;
            let (password, confirm_password) = match password {
                Some(p) => (SecretString::from(p.clone()), SecretString::from(p)),
                None => (
                    util::password_or_prompt(None, "Password: ")?,
                    util::password_or_prompt(None, "Confirm password: ")?,
                ),
            };
            let form = SignupForm {
                name,
                email,
                password,
                confirm_password,
                role,
                institution,
            };
            let outcome = board.signup(&form).await?;
            report_outcome(outcome, global);
            Ok(())
        }

        AuthCommand::VerifyOtp { email, code } => {
            let outcome = board.verify_otp(&email, &code).await?;
            report_outcome(outcome, global);
            Ok(())
        }

        AuthCommand::ResendOtp { email } => {
            let message = board.resend_otp(&email).await?;
            feedback::success_or(global, message.as_deref(), "Verification code sent");
            Ok(())
        }

        AuthCommand::Google { credential } => {
            let outcome = board.google_auth(&credential).await?;
            report_outcome(outcome, global);
            Ok(())
        }

        AuthCommand::Refresh => {
            if !board.session().is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            board.refresh_token().await?;
            feedback::success(global, "Session refreshed");
            Ok(())
        }

        AuthCommand::Logout => {
            board.logout().await?;
            feedback::success(global, "Signed out");
            Ok(())
        }

        AuthCommand::Whoami => {
            let user = board.current_user().await?;
            let out = output::render_single(&global.output, &user, user_detail, |u| u.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::Status => {
            let session = board.session().snapshot();
            let status = json!({
                "authenticated": session.is_authenticated,
                "cookieSession": session.is_cookie_session(),
                "pendingVerification": session.temp_token.is_some(),
                "user": session.user,
                "apiUrl": board.client().base_url().as_str(),
            });
            let out = output::render_single(
                &global.output,
                &status,
                |_| {
                    let state = if session.is_authenticated {
                        "signed in"
                    } else if session.temp_token.is_some() {
                        "verification pending"
                    } else {
                        "signed out"
                    };
                    let mut lines = vec![
                        ("Backend", board.client().base_url().to_string()),
                        ("Session", state.to_string()),
                    ];
                    if let Some(ref user) = session.user {
                        lines.push(("User", format!("{} ({})", user.email, user.role)));
                    }
                    if session.is_cookie_session() {
                        lines.push(("Auth", "cookie".into()));
                    }
                    output::detail_lines(&lines)
                },
                |_| {
                    if session.is_authenticated {
                        "authenticated".into()
                    } else {
                        "anonymous".into()
                    }
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuthCommand::ForgotPassword { email } => {
            let message = board.forgot_password(&email).await?;
            feedback::success_or(
                global,
                message.as_deref(),
                "If the account exists, a reset link is on its way",
            );
            Ok(())
        }

        AuthCommand::ResetPassword { token } => {
            let password = util::password_or_prompt(None, "New password: ")?;
            let confirm = util::password_or_prompt(None, "Confirm new password: ")?;
            let message = board.reset_password(&token, &password, &confirm).await?;
            feedback::success_or(global, message.as_deref(), "Password reset");
            Ok(())
        }

        AuthCommand::ChangePassword => {
            if !board.session().is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            let current = util::password_or_prompt(None, "Current password: ")?;
            let new = util::password_or_prompt(None, "New password: ")?;
            let confirm = util::password_or_prompt(None, "Confirm new password: ")?;
            let message = board.change_password(&current, &new, &confirm).await?;
            feedback::success_or(global, message.as_deref(), "Password changed");
            Ok(())
        }
    }
}
