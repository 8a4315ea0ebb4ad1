use crate::api::models::{RecurrenceFrequency, ResponseStatus};
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::ClientResult;
use crate::services::Services;
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

// Export submodules
pub mod auth;
pub mod calendar;
pub mod integrations;
pub mod missions;
pub mod notifications;
pub mod util;

/// Command-line client for the mission calendar
#[derive(Debug, Parser)]
#[command(name = "sortie", version, about)]
pub struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session tokens
    Login {
        username: String,
        #[arg(long, env = "SORTIE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Create an account
    Register {
        username: String,
        #[arg(long, env = "SORTIE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Invite token, when registration is invite-only
        #[arg(long)]
        invite: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Show who the stored session belongs to
    Whoami,
    /// Month grid
    Calendar {
        /// Month to show, YYYY-MM
        #[arg(long)]
        month: Option<String>,
        /// Months to move from --month (or the current month)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i32,
    },
    /// Timeline of one day
    Day {
        /// YYYY-MM-DD, today when omitted
        date: Option<String>,
    },
    /// Mission log: every event in a window, grouped
    Missions {
        /// YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        to: Option<String>,
    },
    /// Create an event
    Create(CreateArgs),
    /// Edit an event
    Edit(EditArgs),
    /// Delete an event
    Delete { event_id: i64 },
    /// Answer an invitation
    Rsvp {
        event_id: i64,
        #[arg(value_enum)]
        status: RsvpArg,
    },
    /// Recent notifications
    Notifications {
        /// Mark everything as read after listing
        #[arg(long)]
        mark_read: bool,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Poll notifications until interrupted
    Watch,
    /// Google Calendar integration
    Google {
        #[command(subcommand)]
        action: GoogleAction,
    },
    /// Brightspace calendar feed
    Brightspace {
        #[command(subcommand)]
        action: BrightspaceAction,
    },
    /// Sync every connected integration
    Sync,
    /// Gmail push notifications
    Gmail {
        #[command(subcommand)]
        action: GmailAction,
    },
    /// Events parsed from emails, waiting for review
    Pending {
        #[command(subcommand)]
        action: PendingAction,
    },
    /// Create an event from the text of an email
    ParseEmail {
        /// Read the email from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    pub title: String,
    /// YYYY-MM-DD, today when omitted
    #[arg(long)]
    pub date: Option<String>,
    /// HH:MM
    #[arg(long)]
    pub start: Option<String>,
    /// HH:MM
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub all_day: bool,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_enum)]
    pub repeat: Option<RepeatArg>,
    /// Repeat interval, in units of --repeat
    #[arg(long)]
    pub every: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct EditArgs {
    pub event_id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// YYYY-MM-DDTHH:MM
    #[arg(long)]
    pub start: Option<String>,
    /// YYYY-MM-DDTHH:MM
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RepeatArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl From<RepeatArg> for RecurrenceFrequency {
    fn from(value: RepeatArg) -> Self {
        match value {
            RepeatArg::Daily => RecurrenceFrequency::Daily,
            RepeatArg::Weekly => RecurrenceFrequency::Weekly,
            RepeatArg::Monthly => RecurrenceFrequency::Monthly,
            RepeatArg::Yearly => RecurrenceFrequency::Yearly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RsvpArg {
    Accepted,
    Declined,
    Tentative,
    NeedsAction,
}

impl From<RsvpArg> for ResponseStatus {
    fn from(value: RsvpArg) -> Self {
        match value {
            RsvpArg::Accepted => ResponseStatus::Accepted,
            RsvpArg::Declined => ResponseStatus::Declined,
            RsvpArg::Tentative => ResponseStatus::Tentative,
            RsvpArg::NeedsAction => ResponseStatus::NeedsAction,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum GoogleAction {
    Status,
    /// Print the authorization URL
    Connect,
    Sync,
    Disconnect,
}

#[derive(Debug, Subcommand)]
pub enum BrightspaceAction {
    Status,
    /// Import the iCal feed; the saved URL is used when none is given
    Import { url: Option<String> },
    Disconnect,
}

#[derive(Debug, Subcommand)]
pub enum GmailAction {
    Start,
    Status,
    Stop,
}

#[derive(Debug, Subcommand)]
pub enum PendingAction {
    List,
    Approve { id: i64 },
    Reject { id: i64 },
}

/// Shared context for all commands
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Arc<RwLock<Config>>,
    pub client: ApiClient,
    pub services: Services,
    pub tz: Tz,
    /// Skip confirmation prompts
    pub assume_yes: bool,
}

impl CommandContext {
    /// Create a new command context
    pub async fn new(config: Arc<RwLock<Config>>, client: ApiClient) -> Self {
        let tz = config.read().await.tz();
        let services = Services::new(&client);
        Self {
            config,
            client,
            services,
            tz,
            assume_yes: false,
        }
    }

    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }
}

/// Type alias for command result
pub type CommandResult = ClientResult<()>;

/// Run a one-shot command. `Watch` is long-running and handled by the binary.
pub async fn run(ctx: &CommandContext, command: Command) -> CommandResult {
    match command {
        Command::Login { username, password } => auth::login(ctx, &username, password).await,
        Command::Logout => auth::logout(ctx).await,
        Command::Register {
            username,
            password,
            invite,
            email,
        } => auth::register(ctx, &username, password, invite, email).await,
        Command::Whoami => auth::whoami(ctx).await,
        Command::Calendar { month, offset } => {
            calendar::month(ctx, month.as_deref(), offset).await
        }
        Command::Day { date } => calendar::day(ctx, date.as_deref()).await,
        Command::Missions { from, to } => {
            missions::mission_log(ctx, from.as_deref(), to.as_deref()).await
        }
        Command::Create(args) => calendar::create(ctx, args).await,
        Command::Edit(args) => calendar::edit(ctx, args).await,
        Command::Delete { event_id } => calendar::delete(ctx, event_id).await,
        Command::Rsvp { event_id, status } => calendar::rsvp(ctx, event_id, status.into()).await,
        Command::Notifications { mark_read, limit } => {
            notifications::list(ctx, limit, mark_read).await
        }
        Command::Watch => Err(crate::error::other_error(
            "watch runs from the sortie binary",
        )),
        Command::Google { action } => integrations::google(ctx, action).await,
        Command::Brightspace { action } => integrations::brightspace(ctx, action).await,
        Command::Sync => integrations::sync_all(ctx).await,
        Command::Gmail { action } => integrations::gmail(ctx, action).await,
        Command::Pending { action } => notifications::pending(ctx, action).await,
        Command::ParseEmail { file } => notifications::parse_email(ctx, file.as_deref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "sortie", "create", "Standup", "--date", "2024-04-10", "--start", "09:30",
            "--repeat", "weekly", "--every", "2",
        ])
        .unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.title, "Standup");
        assert_eq!(args.repeat, Some(RepeatArg::Weekly));
        assert_eq!(args.every.as_deref(), Some("2"));
    }

    #[test]
    fn test_parse_global_yes_and_offset() {
        let cli = Cli::try_parse_from(["sortie", "calendar", "--offset", "-1", "-y"]).unwrap();
        assert!(cli.yes);
        assert!(matches!(cli.command, Command::Calendar { offset: -1, .. }));

        let cli = Cli::try_parse_from(["sortie", "rsvp", "12", "needs-action"]).unwrap();
        match cli.command {
            Command::Rsvp { event_id, status } => {
                assert_eq!(event_id, 12);
                assert_eq!(ResponseStatus::from(status), ResponseStatus::NeedsAction);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
