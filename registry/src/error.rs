use poap_access::{AccessError, Role};
use poap_store::StoreError;
use poap_types::{Address, CredentialId, Fingerprint, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{account} does not hold the {role} role")]
    Unauthorized { role: Role, account: Address },

    #[error("system is halted")]
    SystemHalted,

    #[error("system is not halted")]
    NotHalted,

    #[error("lecture {0} is already registered")]
    DuplicateEvent(Fingerprint),

    #[error("lecture {0} is not registered")]
    UnknownEvent(Fingerprint),

    #[error("lecture window opens at {start}, now is {now}")]
    NotYetOpen { start: Timestamp, now: Timestamp },

    #[error("lecture window closed at {deadline}, now is {now}")]
    WindowClosed { deadline: Timestamp, now: Timestamp },

    #[error("{attendee} already claimed credential {id} for lecture {fingerprint}")]
    AlreadyClaimed {
        fingerprint: Fingerprint,
        attendee: Address,
        id: CredentialId,
    },

    #[error("lecture index {index} out of range ({count} registered)")]
    OutOfRange { index: usize, count: usize },

    #[error("credential {0} was never issued")]
    UnknownCredential(CredentialId),

    #[error("lecture start {start} is after its deadline {deadline}")]
    InvalidWindow { start: Timestamp, deadline: Timestamp },

    #[error("credential id space exhausted")]
    IdSpaceExhausted,

    #[error("token ledger rejected the binding: {0}")]
    TokenLedger(#[from] StoreError),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),
}

/// Fieldless classification of a [`RegistryError`], for callers that only
/// need to branch on the failure kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    SystemHalted,
    NotHalted,
    DuplicateEvent,
    UnknownEvent,
    NotYetOpen,
    WindowClosed,
    AlreadyClaimed,
    OutOfRange,
    UnknownCredential,
    InvalidWindow,
    IdSpaceExhausted,
    TokenLedger,
    Snapshot,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::SystemHalted => "system_halted",
            Self::NotHalted => "not_halted",
            Self::DuplicateEvent => "duplicate_event",
            Self::UnknownEvent => "unknown_event",
            Self::NotYetOpen => "not_yet_open",
            Self::WindowClosed => "window_closed",
            Self::AlreadyClaimed => "already_claimed",
            Self::OutOfRange => "out_of_range",
            Self::UnknownCredential => "unknown_credential",
            Self::InvalidWindow => "invalid_window",
            Self::IdSpaceExhausted => "id_space_exhausted",
            Self::TokenLedger => "token_ledger",
            Self::Snapshot => "snapshot",
        }
    }
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::SystemHalted => ErrorKind::SystemHalted,
            Self::NotHalted => ErrorKind::NotHalted,
            Self::DuplicateEvent(_) => ErrorKind::DuplicateEvent,
            Self::UnknownEvent(_) => ErrorKind::UnknownEvent,
            Self::NotYetOpen { .. } => ErrorKind::NotYetOpen,
            Self::WindowClosed { .. } => ErrorKind::WindowClosed,
            Self::AlreadyClaimed { .. } => ErrorKind::AlreadyClaimed,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::UnknownCredential(_) => ErrorKind::UnknownCredential,
            Self::InvalidWindow { .. } => ErrorKind::InvalidWindow,
            Self::IdSpaceExhausted => ErrorKind::IdSpaceExhausted,
            Self::TokenLedger(_) => ErrorKind::TokenLedger,
            Self::Snapshot(_) => ErrorKind::Snapshot,
        }
    }

    /// The claim already exists; retrying is pointless but harmless.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::AlreadyClaimed { .. })
    }

    /// No later attempt against the same lecture can succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::WindowClosed { .. })
    }
}

impl From<AccessError> for RegistryError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Unauthorized { role, account } => Self::Unauthorized { role, account },
            AccessError::Halted => Self::SystemHalted,
        }
    }
}
