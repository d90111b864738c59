//! Error types for the local catalog provider

use thiserror::Error;

/// Local catalog provider errors
#[derive(Error, Debug)]
pub enum LocalCatalogError {
    /// The export could not be decoded or encoded
    #[error("Failed to parse catalog export: {0}")]
    ParseError(String),

    /// An entry of the export failed domain validation
    #[error("Invalid {kind} entry '{id}': {message}")]
    InvalidEntry {
        kind: String,
        id: String,
        message: String,
    },

    /// A playlist or library entry references an unknown catalog item
    #[error("Unknown {kind} referenced: {id}")]
    UnknownReference { kind: String, id: String },

    /// The user declined to name an export location
    #[error("No catalog export location given for {0}")]
    LocationMissing(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for local catalog operations
pub type Result<T> = std::result::Result<T, LocalCatalogError>;

impl From<serde_json::Error> for LocalCatalogError {
    fn from(error: serde_json::Error) -> Self {
        LocalCatalogError::ParseError(error.to_string())
    }
}

impl From<LocalCatalogError> for bridge_traits::error::BridgeError {
    fn from(error: LocalCatalogError) -> Self {
        match error {
            LocalCatalogError::ParseError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            LocalCatalogError::InvalidEntry { kind, id, message } => {
                bridge_traits::error::BridgeError::OperationFailed(format!(
                    "Invalid {} entry '{}': {}",
                    kind, id, message
                ))
            }
            LocalCatalogError::UnknownReference { kind, id } => {
                bridge_traits::error::BridgeError::RequestFailed(format!(
                    "Unknown {} referenced: {}",
                    kind, id
                ))
            }
            LocalCatalogError::LocationMissing(name) => {
                bridge_traits::error::BridgeError::NotAvailable(format!(
                    "No catalog export location given for {}",
                    name
                ))
            }
            LocalCatalogError::BridgeError(e) => e,
        }
    }
}
