use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blobway_core::{BlobwayError, Mode};
use blobway_store::BlobError;

#[derive(Debug)]
pub struct BlobwayAxumError(pub anyhow::Error);

impl From<anyhow::Error> for BlobwayAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<BlobwayError> for BlobwayAxumError {
    fn from(e: BlobwayError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<BlobError> for BlobwayAxumError {
    fn from(e: BlobError) -> Self {
        Self::from(store_error(e))
    }
}

impl BlobwayAxumError {
    /// Render for a client, redacting according to `mode`
    pub fn into_response_with(self, mode: Mode) -> Response {
        // Contexts may wrap a BlobwayError; keep its kind if one is in the chain
        let found = self
            .0
            .chain()
            .find_map(|e| e.downcast_ref::<BlobwayError>())
            .map(|e| e.sanitize_for_client(mode));
        let err = match found {
            Some(safe) => safe,
            None => BlobwayError::normalize(self.0).sanitize_for_client(mode),
        };

        let status =
            StatusCode::from_u16(err.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(err.to_json())).into_response()
    }
}

/// Classify a store failure for HTTP.
///
/// Anything caused by the address itself (missing blob, unusable namespace
/// chain) is a 404; every other failure is a 500 carrying the store error as
/// its source.
pub fn store_error(err: BlobError) -> BlobwayError {
    if err.is_not_found() {
        return BlobwayError::not_found(err.to_string());
    }
    BlobwayError::general_error("Blob store failure").with_source(anyhow::Error::new(err))
}
