use poap_types::Address;
use thiserror::Error;

use crate::role::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("{account} does not hold the {role} role")]
    Unauthorized { role: Role, account: Address },

    #[error("system is halted")]
    Halted,
}
