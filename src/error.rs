//! Error types.

use derive_more::{Display, From};

use crate::models::report::TargetType;
use crate::models::{AttachmentId, CommentId, ReportId, ThreadId, UserId};

/// Our error type.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "Missing required field '{}'", param)]
    MissingParam { param: String },
    #[display(fmt = "Not allowed to {}", action)]
    PermissionDenied { action: String },
    #[display(fmt = "Invalid e-mail address or password")]
    InvalidCredentials,
    #[display(fmt = "Thread #{} not found", thread_id)]
    ThreadNotFound { thread_id: ThreadId },
    #[display(fmt = "Comment #{} not found", comment_id)]
    CommentNotFound { comment_id: CommentId },
    #[display(fmt = "User #{} not found", user_id)]
    UserNotFound { user_id: UserId },
    #[display(fmt = "No user with e-mail address '{}'", email)]
    EmailNotFound { email: String },
    #[display(fmt = "Attachment #{} not found", attachment_id)]
    AttachmentNotFound { attachment_id: AttachmentId },
    #[display(fmt = "Report #{} not found", report_id)]
    ReportNotFound { report_id: ReportId },
    #[display(fmt = "The e-mail address '{}' is already registered", email)]
    EmailTaken { email: String },
    #[display(fmt = "Already reported {} #{}", target_type, target_id)]
    AlreadyReported {
        target_type: TargetType,
        target_id: i32,
    },
    #[display(fmt = "Unknown role '{}'", role)]
    UnknownRole { role: String },
    #[display(fmt = "Unknown status '{}'", status)]
    UnknownStatus { status: String },
    #[display(fmt = "Unknown report target '{}'", target_type)]
    UnknownTargetType { target_type: String },
    #[display(fmt = "Unknown sort key '{}'", key)]
    UnknownSortKey { key: String },
    #[display(fmt = "Couldn't hash password: {}", _0)]
    #[from]
    HashError(argon2::Error),
    #[display(fmt = "JSON error: {}", _0)]
    #[from]
    JsonError(serde_json::Error),
    #[display(fmt = "YAML error: {}", _0)]
    #[from]
    YamlError(serde_yaml::Error),
    #[display(fmt = "Couldn't initialize logging: {}", _0)]
    #[from]
    LogError(log::SetLoggerError),
    #[display(fmt = "Database connection pool error: {}", _0)]
    #[from]
    R2d2Error(r2d2::Error),
    #[display(fmt = "Database error: {}", _0)]
    #[from]
    DatabaseError(diesel::result::Error),
    #[display(fmt = "Database migration error: {}", _0)]
    DatabaseMigrationError(Box<dyn std::error::Error + Send + Sync>),
    #[display(fmt = "Couldn't connect to the database: {}", _0)]
    #[from]
    ConnectionError(diesel::ConnectionError),
    #[display(fmt = "I/O error: {}", _0)]
    #[from]
    IoError(std::io::Error),
    #[display(fmt = "I/O error: {}: {}", msg, cause)]
    IoErrorMsg { cause: std::io::Error, msg: String },
}

impl Error {
    pub fn from_io_error<S>(cause: std::io::Error, msg: S) -> Error
    where
        S: Into<String>,
    {
        Error::IoErrorMsg {
            cause,
            msg: msg.into(),
        }
    }
}

impl std::error::Error for Error {}

/// Our result type.
pub type Result<T> = std::result::Result<T, Error>;
