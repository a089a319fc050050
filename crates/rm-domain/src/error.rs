use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid host state transition: {0}")]
    InvalidHostState(String),

    #[error("invalid update status type: {0}")]
    InvalidUpdateStatusType(String),

    #[error("invalid cron field '{field}': {value}")]
    InvalidCronField { field: &'static str, value: String },

    #[error("unparseable image version: {0}")]
    UnparseableVersion(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
