use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not decode frame as UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    #[error("could not parse frame: {0}")]
    Format(String),

    #[error("non-numeric field in frame: {0}")]
    Numeric(String),

    #[error("checksum failed for frame: {0}")]
    Checksum(String),

    #[error("serial read timed out")]
    ReadTimeout,

    #[error("cannot aggregate an empty set of readings")]
    EmptyInput,

    #[error("already recording")]
    AlreadyRunning,

    #[error("failed to open serial port: {0}")]
    ChannelOpen(#[from] serialport::Error),

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("recording task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
