use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error as ErrorTrait;

#[derive(Debug, Clone, ErrorTrait)]
pub struct Error {
    ctx: Kind,
}

impl Error {
    fn new(ctx: Kind) -> Self {
        Self { ctx }
    }

    pub fn kind(&self) -> &Kind {
        &self.ctx
    }

    pub fn is_invalid_target(&self) -> bool {
        matches!(&self.ctx, Kind::InvalidTarget { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(&self.ctx, Kind::SourceUnavailable(_))
    }

    pub fn is_unknown_kind(&self) -> bool {
        matches!(&self.ctx, Kind::UnknownKind(_))
    }

    pub fn is_allocation(&self) -> bool {
        matches!(&self.ctx, Kind::Allocation(_))
    }

    pub fn is_invalid_capacity(&self) -> bool {
        matches!(&self.ctx, Kind::InvalidCapacity(_))
    }

    pub fn is_snapshot_inconsistent(&self) -> bool {
        matches!(&self.ctx, Kind::SnapshotInconsistent(_))
    }

    pub fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(Kind::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        })
    }

    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::new(Kind::SourceUnavailable(msg.into()))
    }

    pub fn unknown_kind(name: impl Into<String>) -> Self {
        Self::new(Kind::UnknownKind(name.into()))
    }

    pub fn allocation(requested: usize) -> Self {
        Self::new(Kind::Allocation(requested))
    }

    pub fn invalid_capacity(capacity: usize) -> Self {
        Self::new(Kind::InvalidCapacity(capacity))
    }

    pub fn snapshot_inconsistent(attempts: u32) -> Self {
        Self::new(Kind::SnapshotInconsistent(attempts))
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(Kind::Config(msg.into()))
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(Kind::Io(msg.into()))
    }

    pub fn failed(cause: impl Into<String>) -> Self {
        Self::new(Kind::Failed(cause.into()))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        Display::fmt(&self.ctx, f)
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::InvalidTarget { target, reason } => {
                write!(f, "invalid target '{}': {}", target, reason)
            }
            Self::SourceUnavailable(msg) => write!(f, "source unavailable: {}", msg),
            Self::UnknownKind(name) => write!(f, "unknown chart kind: '{}'", name),
            Self::Allocation(requested) => {
                write!(f, "failed to allocate ring buffer of {} samples", requested)
            }
            Self::InvalidCapacity(capacity) => write!(f, "invalid capacity: {}", capacity),
            Self::SnapshotInconsistent(attempts) => write!(
                f,
                "no consistent snapshot after {} attempts, writer too busy",
                attempts
            ),
            Self::Config(msg) => write!(f, "config error: {}", msg),
            Self::Io(msg) => write!(f, "io error: {}", msg),
            Self::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Kind {
    InvalidTarget { target: String, reason: String },
    SourceUnavailable(String),
    UnknownKind(String),
    Allocation(usize),
    InvalidCapacity(usize),
    SnapshotInconsistent(u32),
    Config(String),
    Io(String),
    Failed(String),
}
