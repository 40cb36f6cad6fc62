use thiserror::Error;

/// I/O errors that can occur when talking to the blob or metadata store
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors produced by gallery operations
#[derive(Debug, Clone, Error)]
pub enum GalleryError {
    /// Request could not be decoded (bad multipart body, missing content type)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upload contained no file payloads
    #[error("No valid image files provided")]
    NoFiles,

    /// No record exists for the image id
    #[error("Image not found: {id}")]
    ImageNotFound { id: String },

    /// No list exists for the group label
    #[error("Group not found: {group}")]
    GroupNotFound { group: String },

    /// No blob resolved for the requested key or any of its fallbacks
    #[error("Image data not found: {key}")]
    BlobNotFound { key: String },

    /// Blob write reported success but the readback was missing or empty
    #[error("Upload verification failed for {key}: stored object is missing or empty")]
    UploadVerification { key: String },

    /// A stored metadata value could not be decoded
    #[error("Corrupt metadata at {key}: {message}")]
    CorruptRecord { key: String, message: String },

    /// Underlying store failure
    #[error("Storage error: {0}")]
    Io(#[from] IoError),
}
