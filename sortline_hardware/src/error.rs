use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("sensor timeout")]
    Timeout,
    #[error("link peer disconnected")]
    LinkClosed,
}

pub type Result<T> = std::result::Result<T, HwError>;
