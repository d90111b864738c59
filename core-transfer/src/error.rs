use bridge_traits::error::BridgeError;
use core_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    /// Another long-running operation holds the admission permit.
    #[error("Another operation is already in progress")]
    Busy,

    /// The user cancelled a prompt or the operation's token was fired.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Provider error: {0}")]
    Provider(#[from] BridgeError),

    /// The interactive collaborator failed to deliver an answer.
    #[error("Prompt failed: {0}")]
    Prompt(BridgeError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transfer job ID: {0}")]
    InvalidJobId(String),

    #[error("Invalid transfer status: {0}")]
    InvalidStatus(String),

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The command worker has stopped and no longer accepts commands.
    #[error("Command queue closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, TransferError>;
