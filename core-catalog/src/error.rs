use backend_traits::error::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Not signed in")]
    Unauthenticated,

    #[error("No account found for {email}")]
    AccountNotFound { email: String },

    #[error("Account {email} is protected and cannot be revoked")]
    ProtectedAccount { email: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// The song-row delete matched zero rows. Either the song no longer
    /// exists or a server-side policy silently denied the delete; in both
    /// cases the caller must not be told deletion happened.
    #[error("Delete removed no rows for song {id}; it may not exist or the delete may have been denied")]
    DeleteIneffective { id: String },

    #[error("Malformed row in {table}: {message}")]
    Decode { table: String, message: String },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
