//! Clap derive structures for the `conjure` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// conjure -- manage magic effects and their triggers
#[derive(Debug, Parser)]
#[command(
    name = "conjure",
    version,
    about = "Manage magic effects and triggers from the command line",
    long_about = "A command-line dashboard for a Conjure effects backend.\n\n\
        Lists, filters, creates and edits effects and the triggers that fire\n\
        them. `triggers watch` keeps a live view that polls the backend.",
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
    #[arg(long, short = 'p', env = "CONJURE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "CONJURE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CONJURE_OUTPUT",
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

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CONJURE_TIMEOUT", global = true)]
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
    /// Manage magic effects
    #[command(alias = "fx", alias = "e")]
    Effects(EffectsArgs),

    /// Manage triggers
    #[command(alias = "tr", alias = "t")]
    Triggers(TriggersArgs),

    /// Log in, log out, and inspect the session
    Auth(AuthArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// Search and type filters shared by list-style commands.
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Case-insensitive name search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Only show this type ("all" shows everything)
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub kind: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EFFECTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EffectsArgs {
    #[command(subcommand)]
    pub command: EffectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EffectsCommand {
    /// List effects, one page at a time
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Page to show (1-based)
        #[arg(long, default_value = "1")]
        page: usize,

        /// Effects per page (overrides profile)
        #[arg(long)]
        page_size: Option<usize>,

        /// Show every matching effect instead of one page
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Get effect details
    Get {
        /// Effect ID
        effect: String,
    },

    /// Create an effect
    Create {
        /// Effect name
        #[arg(long, required_unless_present = "from_file")]
        name: Option<String>,

        /// Effect type (particle, sound, visual, ...)
        #[arg(long = "type", value_name = "TYPE", required_unless_present = "from_file")]
        kind: Option<String>,

        /// Parameter as KEY=VALUE (repeatable). Values parse as JSON when possible.
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,

        /// Read the full effect from a JSON file
        #[arg(long, short = 'F', conflicts_with_all = ["name", "kind", "params"])]
        from_file: Option<PathBuf>,
    },

    /// Update an effect
    Update {
        /// Effect ID
        effect: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// Replace parameters with these KEY=VALUE pairs (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an effect
    #[command(alias = "rm")]
    Delete {
        /// Effect ID
        effect: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TRIGGERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TriggersArgs {
    #[command(subcommand)]
    pub command: TriggersCommand,
}

/// Condition flags shared by create and update.
#[derive(Debug, Args)]
pub struct ConditionArgs {
    /// Condition type (time, event, condition, ...)
    #[arg(long = "when", value_name = "TYPE")]
    pub condition_type: Option<String>,

    /// Condition value: a schedule, event name or expression. JSON is
    /// accepted for structured values.
    #[arg(long = "value", value_name = "VALUE", requires = "condition_type")]
    pub condition_value: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum TriggersCommand {
    /// List triggers
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filter: FilterArgs,

        /// Ask the backend for at most this many triggers
        #[arg(long, short = 'l')]
        limit: Option<u32>,

        /// Pagination offset (with --limit)
        #[arg(long, default_value = "0", requires = "limit")]
        offset: u32,
    },

    /// Get trigger details
    Get {
        /// Trigger ID
        trigger: String,
    },

    /// Create a trigger
    Create {
        /// Trigger name
        #[arg(long)]
        name: String,

        #[command(flatten)]
        condition: ConditionArgs,

        /// Effect to fire
        #[arg(long)]
        effect: Option<String>,

        /// Create the trigger disabled
        #[arg(long)]
        disabled: bool,

        #[arg(long)]
        description: Option<String>,
    },

    /// Update a trigger
    Update {
        /// Trigger ID
        trigger: String,

        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        condition: ConditionArgs,

        #[arg(long)]
        effect: Option<String>,

        /// Set the enabled flag
        #[arg(long, action = clap::ArgAction::Set, value_name = "BOOL")]
        enabled: Option<bool>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a trigger
    #[command(alias = "rm")]
    Delete {
        /// Trigger ID
        trigger: String,
    },

    /// Flip a trigger between enabled and disabled
    Toggle {
        /// Trigger ID
        trigger: String,
    },

    /// Cancel a pending trigger
    Cancel {
        /// Trigger ID
        trigger: String,
    },

    /// Live trigger list, re-rendered on every change (Ctrl-C to stop)
    Watch {
        #[command(flatten)]
        filter: FilterArgs,
    },
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
    /// Log in and store the session token
    Login {
        /// Account email (prompted if omitted)
        #[arg(long)]
        email: Option<String>,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// Read the password from stdin instead of prompting
        #[arg(long)]
        password_stdin: bool,
    },

    /// End the session and forget the token
    Logout,

    /// Show the logged-in user
    #[command(alias = "whoami")]
    Me,

    /// Check the stored session with the backend
    Verify,

    /// Email a password reset link
    ResetPassword {
        /// Account email
        email: String,
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

    /// Print the config file path
    Path,

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
