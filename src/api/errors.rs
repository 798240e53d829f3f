use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use crate::errors::DocfreshError;

impl DocfreshError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DocfreshError::Config(_) | DocfreshError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DocfreshError::NotFound(_) => StatusCode::NOT_FOUND,
            DocfreshError::Conflict(_) | DocfreshError::NoPendingRequest(_) => StatusCode::CONFLICT,
            DocfreshError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DocfreshError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = match &self {
            // Client errors carry the bare message, without the variant prefix.
            DocfreshError::InvalidInput(m)
            | DocfreshError::NotFound(m)
            | DocfreshError::Conflict(m)
            | DocfreshError::NoPendingRequest(m) => m.clone(),
            _ => self.to_string(),
        };

        (status, Json(json!({"error": message}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(DocfreshError::NotFound("r".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DocfreshError::Conflict("r".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(DocfreshError::NoPendingRequest("r".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(DocfreshError::InvalidInput("r".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(DocfreshError::Database("r".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
