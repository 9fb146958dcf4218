use poap_types::CredentialId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("credential {0} is already bound to an owner")]
    AlreadyBound(CredentialId),

    #[error("credential {0} appears twice in one bind request")]
    DuplicateBinding(CredentialId),

    #[error("credential id 0 is reserved")]
    ReservedId,

    #[error("cannot bind credential {0} to the zero address")]
    ZeroOwner(CredentialId),

    #[error("storage backend error: {0}")]
    Backend(String),
}
