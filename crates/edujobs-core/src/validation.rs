// ── Client-side validation ──
//
// Form checks that run before any request is built. Failures never reach
// the network.

use edujobs_api::Role;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const OTP_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("Enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Verification code must be 6 digits")]
    InvalidOtp,

    #[error("Unknown role '{0}' (expected teacher, employer, college or admin)")]
    InvalidRole(String),
}

/// Reject empty or whitespace-only input.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(trimmed)
}

/// Basic shape check: one `@`, a non-empty local part, a dotted domain.
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    let email = require("Email", email)?;
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let domain_ok = !domain.contains('@')
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

pub fn validate_password(password: &SecretString) -> Result<(), ValidationError> {
    let raw = password.expose_secret();
    if raw.is_empty() {
        return Err(ValidationError::Required { field: "Password" });
    }
    if raw.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

pub fn validate_confirmation(
    password: &SecretString,
    confirm: &SecretString,
) -> Result<(), ValidationError> {
    if password.expose_secret() != confirm.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_otp(code: &str) -> Result<&str, ValidationError> {
    let code = code.trim();
    if code.len() != OTP_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidOtp);
    }
    Ok(code)
}

pub fn parse_role(role: &str) -> Result<Role, ValidationError> {
    role.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidRole(role.to_owned()))
}

// ── Signup form ──────────────────────────────────────────────────────

/// Registration input, validated before it becomes a request body.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub role: Role,
    /// School, district or college name. Required for non-teacher roles.
    pub institution: Option<String>,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Name", &self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_confirmation(&self.password, &self.confirm_password)?;
        if matches!(self.role, Role::Employer | Role::College) {
            require("Institution", self.institution.as_deref().unwrap_or_default())?;
        }
        Ok(())
    }

    /// Validate and build the `auth/signup` body.
    pub fn to_body(&self) -> Result<Value, ValidationError> {
        self.validate()?;
        let mut body = json!({
            "name": self.name.trim(),
            "email": self.email.trim(),
            "password": self.password.expose_secret(),
            "role": self.role.to_string(),
        });
        if let Some(institution) = self.institution.as_deref().map(str::trim) {
            if !institution.is_empty() {
                body["institution"] = Value::String(institution.to_owned());
            }
        }
        Ok(body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn form() -> SignupForm {
        SignupForm {
            name: "Ada Lovelace".into(),
            email: "ada@school.org".into(),
            password: secret("analytical"),
            confirm_password: secret("analytical"),
            role: Role::Teacher,
            institution: None,
        }
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("ada@school.org").is_ok());
        assert_eq!(validate_email("  ada@school.org ").unwrap(), "ada@school.org");
        for bad in ["", "ada", "@school.org", "ada@school", "ada@.org", "a b@school.org", "a@b@c.org"] {
            assert!(validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn required_fields() {
        assert_eq!(
            require("Name", "   "),
            Err(ValidationError::Required { field: "Name" })
        );
        assert_eq!(require("Name", " Ada "), Ok("Ada"));
    }

    #[test]
    fn passwords() {
        assert_eq!(
            validate_password(&secret("short")),
            Err(ValidationError::PasswordTooShort { min: 8 })
        );
        assert!(validate_password(&secret("long enough")).is_ok());
        assert_eq!(
            validate_confirmation(&secret("abcdefgh"), &secret("abcdefgi")),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn otp_is_six_digits() {
        assert_eq!(validate_otp(" 123456 "), Ok("123456"));
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("12345a").is_err());
        assert!(validate_otp("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn roles() {
        assert_eq!(parse_role("Employer"), Ok(Role::Employer));
        assert!(matches!(parse_role("principal"), Err(ValidationError::InvalidRole(_))));
    }

    #[test]
    fn signup_body_carries_trimmed_fields() {
        let mut f = form();
        f.name = " Ada Lovelace ".into();
        let body = f.to_body().unwrap();
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["role"], "teacher");
        assert_eq!(body["password"], "analytical");
        assert!(body.get("institution").is_none());
    }

    #[test]
    fn employers_need_an_institution() {
        let mut f = form();
        f.role = Role::Employer;
        assert_eq!(
            f.validate(),
            Err(ValidationError::Required {
                field: "Institution"
            })
        );
        f.institution = Some("Riverside High".into());
        assert_eq!(f.to_body().unwrap()["institution"], "Riverside High");
    }

    #[test]
    fn mismatched_confirmation_blocks_signup() {
        let mut f = form();
        f.confirm_password = secret("different!");
        assert_eq!(f.to_body().unwrap_err(), ValidationError::PasswordMismatch);
    }
}
