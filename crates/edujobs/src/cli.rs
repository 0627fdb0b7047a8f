//! Clap derive structures for the `edujobs` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};

use edujobs_core::ContentKind;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// edujobs -- search and manage teaching jobs from the command line
#[derive(Debug, Parser)]
#[command(
    name = "edujobs",
    version,
    about = "Search and manage teaching jobs from the command line",
    long_about = "A command-line client for the edujobs job board.\n\n\
        Teachers search and apply to jobs, employers and colleges manage\n\
        their postings, administrators curate content and accounts.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "EDUJOBS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, short = 'u', env = "EDUJOBS_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "EDUJOBS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates (local development)
    #[arg(long, short = 'k', env = "EDUJOBS_INSECURE", global = true)]
    pub insecure: bool,

    /// Keep the session in memory only (nothing written to disk)
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Request timeout in seconds (overrides profile and defaults)
    #[arg(long, env = "EDUJOBS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, sign up, and manage the current session
    Auth(AuthArgs),

    /// Search and manage job postings
    #[command(alias = "j")]
    Jobs(JobsArgs),

    /// Apply to jobs and review applications
    #[command(alias = "apps")]
    Applications(ApplicationsArgs),

    /// Manage uploaded resumes
    Resumes(ResumesArgs),

    /// View and edit the profile for your role
    Profile(ProfileArgs),

    /// Browse and edit site content (guides, articles, carousel, resources)
    Content(ContentArgs),

    /// Account administration
    Admin(AdminArgs),

    /// Call registry endpoints directly
    Api(ApiArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in with email and password
    Login {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "EDUJOBS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        /// Display name
        #[arg(long)]
        name: String,

        /// Account email
        #[arg(long)]
        email: String,

        /// Account role: teacher, employer, college
        #[arg(long, default_value = "teacher")]
        role: String,

        /// Institution name (required for employer and college accounts)
        #[arg(long)]
        institution: Option<String>,

        /// Password (prompted twice when omitted)
        #[arg(long, env = "EDUJOBS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Submit the one-time code sent by email
    VerifyOtp {
        /// Account email
        email: String,

        /// Six-digit code
        code: String,
    },

    /// Ask for a new one-time code
    ResendOtp {
        /// Account email
        email: String,
    },

    /// Sign in with a Google ID token
    Google {
        /// Credential returned by Google sign-in
        credential: String,
    },

    /// Exchange the session token for a fresh one
    Refresh,

    /// Sign out and forget the local session
    Logout,

    /// Show the account behind the current session
    #[command(alias = "me")]
    Whoami,

    /// Show the locally stored session
    Status,

    /// Request a password reset email
    ForgotPassword {
        /// Account email
        email: String,
    },

    /// Set a new password using a reset token
    ResetPassword {
        /// Token from the reset email
        token: String,
    },

    /// Change the password of the signed-in account
    ChangePassword,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  JOBS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// Search published jobs
    #[command(alias = "ls")]
    List(JobSearchArgs),

    /// Show a single job
    Get {
        /// Job ID
        id: String,
    },

    /// List jobs posted by the signed-in employer
    Mine,

    /// Post a new job from a JSON file
    Create {
        /// JSON file with the job fields
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Update a job from a JSON file
    Update {
        /// Job ID
        id: String,

        /// JSON file with the changed fields
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Stop accepting applications for a job
    Close {
        /// Job ID
        id: String,
    },

    /// Delete a job posting
    #[command(alias = "rm")]
    Delete {
        /// Job ID
        id: String,
    },

    /// Bookmark a job
    Save {
        /// Job ID
        id: String,
    },

    /// Remove a bookmark
    Unsave {
        /// Job ID
        id: String,
    },

    /// List bookmarked jobs
    Saved,
}

#[derive(Debug, Args)]
pub struct JobSearchArgs {
    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Location filter
    #[arg(long)]
    pub location: Option<String>,

    /// Job type filter (e.g. full-time, part-time)
    #[arg(long = "type")]
    pub job_type: Option<String>,

    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Results per page
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  APPLICATIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ApplicationsArgs {
    #[command(subcommand)]
    pub command: ApplicationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ApplicationsCommand {
    /// List your applications
    #[command(alias = "ls")]
    List,

    /// Apply to a job
    Apply {
        /// Job ID
        job_id: String,

        /// Cover letter text
        #[arg(long)]
        cover_letter: Option<String>,

        /// Resume to attach
        #[arg(long)]
        resume: Option<String>,
    },

    /// Withdraw an application
    Withdraw {
        /// Application ID
        id: String,
    },

    /// List applications received for one of your jobs
    ForJob {
        /// Job ID
        job_id: String,
    },

    /// Move an application through the hiring pipeline
    SetStatus {
        /// Application ID
        id: String,

        /// New status (reviewed, shortlisted, rejected, hired)
        status: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RESUMES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ResumesArgs {
    #[command(subcommand)]
    pub command: ResumesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResumesCommand {
    /// List uploaded resumes
    #[command(alias = "ls")]
    List,

    /// Delete a resume
    #[command(alias = "rm")]
    Delete {
        /// Resume ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PROFILE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Profile role (defaults to the signed-in user's role)
    #[arg(long, short = 'r', global = true)]
    pub role: Option<String>,

    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the profile
    Show,

    /// Update profile fields
    Update {
        /// JSON file with the changed fields
        #[arg(long, short = 'F', conflicts_with = "set")]
        from_file: Option<PathBuf>,

        /// Field assignment (repeatable), e.g. --set bio="Maths teacher"
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONTENT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ContentArgs {
    /// Content family: salary-guides, career-articles, press, carousel, resources
    #[arg(value_parser = parse_content_kind)]
    pub kind: ContentKind,

    #[command(subcommand)]
    pub command: ContentCommand,
}

#[derive(Debug, Subcommand)]
pub enum ContentCommand {
    /// List items
    #[command(alias = "ls")]
    List,

    /// Show one item
    Get {
        /// Item ID
        id: String,
    },

    /// Create an item from a JSON file
    Create {
        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Update an item from a JSON file
    Update {
        /// Item ID
        id: String,

        #[arg(long, short = 'F')]
        from_file: PathBuf,
    },

    /// Delete an item
    #[command(alias = "rm")]
    Delete {
        /// Item ID
        id: String,
    },
}

fn parse_content_kind(s: &str) -> Result<ContentKind, String> {
    ContentKind::from_str(s).map_err(|_| {
        format!(
            "unknown content kind '{s}' \
             (expected salary-guides, career-articles, press, carousel, resources)"
        )
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ADMIN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommand,
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// List user accounts
    Users,

    /// Activate or suspend an account
    SetUserStatus {
        /// User ID
        id: String,

        /// New status (e.g. active, suspended)
        status: String,
    },

    /// Delete an account
    DeleteUser {
        /// User ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ApiArgs {
    #[command(subcommand)]
    pub command: ApiCommand,
}

#[derive(Debug, Subcommand)]
pub enum ApiCommand {
    /// List registered endpoints
    Endpoints,

    /// Run a query endpoint
    Query {
        /// Endpoint name (see `edujobs api endpoints`)
        endpoint: String,

        /// Argument object as inline JSON
        #[arg(long, short = 'a', default_value = "{}")]
        arg: String,
    },

    /// Run a mutation endpoint
    Mutate {
        /// Endpoint name
        endpoint: String,

        /// Argument object as inline JSON
        #[arg(long, short = 'a', default_value = "{}", conflicts_with = "from_file")]
        arg: String,

        /// Read the argument object from a JSON file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Subscribe to a query and print every state change
    Watch {
        /// Endpoint name
        endpoint: String,

        /// Argument object as inline JSON
        #[arg(long, short = 'a', default_value = "{}")]
        arg: String,

        /// Refetch interval in seconds (0 = only on invalidation)
        #[arg(long, short = 'i', default_value = "30")]
        interval: u64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (api_url, ca_cert, insecure, timeout, session_file, ephemeral)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
