use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// An entity kind string was not one of `artist`, `album`, `track`,
    /// `playlist`, or the kind is not valid for the operation.
    #[error("Invalid entity kind: {0}")]
    InvalidKind(String),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The mapping file could not be written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
