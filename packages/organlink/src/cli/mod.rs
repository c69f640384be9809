mod matching;
mod session;
mod watch;

use crate::{
    config::{LogConfig, LogFormat, LogLevel, DEFAULT_CONFIG_FILE_PATH},
    error::{ApiError, Error, SessionError},
    feedback::{Feedback, Level},
    log::DEVELOPMENT,
    model::{Decision, EntityId},
    session::{FileTokenStore, Portal, TokenStore},
    OrganLinkConfig,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, Parser)]
#[command(version, about, verbatim_doc_comment)]
///
/// OrganLink
///
/// Command line client for OrganLink organ matching and portal notifications.
///
pub struct Args {
    /// Optional path to an OrganLink configuration file.
    ///
    /// Default is "organlink.toml".
    /// Configuration is loaded from this file, if present.
    /// Environment variables are used instead of the file or to override any values defined in the file.
    #[arg(short = 'p', long, default_value = DEFAULT_CONFIG_FILE_PATH, verbatim_doc_comment, global = true)]
    pub config_file_path: String,

    ///
    /// Optional log level.
    ///
    #[arg(short, long, value_enum, default_value_t = LogConfig::default_log_level(), env = "OL_LOG__LEVEL", global = true)]
    pub log_level: LogLevel,

    ///
    /// Optional log format. Default level is "pretty" if running in a terminal session, otherwise "structured".
    ///
    #[arg(short='f', long, value_enum, default_value_t = LogConfig::default_log_format(), env = "OL_LOG__FORMAT", global = true)]
    pub log_format: LogFormat,

    ///
    /// Portal used by session and notification commands. Overrides `session.portal`.
    /// Matching commands always use the hospital portal.
    ///
    #[arg(long, value_enum, global = true)]
    pub portal: Option<Portal>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Store a bearer token for the portal
    Login {
        #[arg(long, env = "OL_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Remove the stored token for the portal
    Logout,

    /// List the hospital's patients. Patients waiting for a match are marked with `*`
    Patients,

    /// Search donor matches for a waiting patient
    Search { patient: EntityId },

    /// Search donor matches for a patient and send a match request for one donor
    Request {
        patient: EntityId,
        donor: EntityId,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List incoming match requests. Listing marks them read
    Incoming,

    /// List match requests sent by the hospital
    Outgoing,

    /// List match requests received for the hospital's donors. Listing marks them viewed
    Received,

    /// Accept or decline an incoming match request
    Respond {
        /// Incoming entry id or match request id
        item: EntityId,

        #[arg(value_enum)]
        decision: Decision,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Open the matching view from a `tab=…&request=…` query
    Open { query: String },

    /// Fetch the portal's notifications once
    Notifications,

    /// Poll notifications for every signed-in portal until interrupted. The default command
    Watch,
}

///
/// Runs command specified in command line
/// Returns the process exit code
///
pub async fn run(args: Args, config: OrganLinkConfig) -> Result<i32, Error> {
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.session.token_file));
    let portal = config.session.portal;

    let command = args.command.unwrap_or(Commands::Watch);
    debug!(target: DEVELOPMENT, ?command, %portal);

    match command {
        Commands::Login { token } => session::login(portal, store, &token),
        Commands::Logout => session::logout(portal, store),
        Commands::Notifications => session::notifications(&config, portal, store).await,
        Commands::Watch => watch::run(&config, store).await,
        command => matching::run(command, &config, store).await,
    }
}

///
/// Exit code for a failed command
///
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Config(_) => exitcode::CONFIG,
        Error::Session(SessionError::NotAuthenticated { .. }) => exitcode::NOPERM,
        Error::Session(SessionError::Store(_)) | Error::Io(_) => exitcode::IOERR,
        Error::Api(ApiError::InvalidUrl { .. }) => exitcode::CONFIG,
        Error::Api(ApiError::Decode(_)) => exitcode::PROTOCOL,
        Error::Api(_) => exitcode::UNAVAILABLE,
        Error::InvalidTransition { .. } => exitcode::DATAERR,
        Error::Cancelled => exitcode::TEMPFAIL,
        Error::Metrics(_) => exitcode::SOFTWARE,
    }
}

///
/// Prints the feedback of an action and returns the exit code it implies
///
fn report(feedback: &Feedback) -> i32 {
    println!("{feedback}");

    match feedback.level {
        Level::Success | Level::Info => exitcode::OK,
        Level::Warning => exitcode::DATAERR,
        Level::Error => exitcode::UNAVAILABLE,
    }
}
