use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use serde::Serialize;

/// Errors coming out of the store layer. Everything the API can report to a
/// caller is a variant here; raw database failures pass through and surface
/// as 500s.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Challenge not found")]
    ChallengeNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Challenge not found for user")]
    AssignmentNotFound,
    #[error("Challenge already assigned to user")]
    AlreadyAssigned,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// JSON error response with an explicit status, in the same shape for every
/// failing route.
#[derive(Debug)]
pub struct ApiError {
    status: Status,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: Status::Conflict,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self {
            status: Status::InternalServerError,
            message: "Internal server error".to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ChallengeNotFound
            | StoreError::UserNotFound
            | StoreError::AssignmentNotFound => Self::not_found(err.to_string()),
            StoreError::AlreadyAssigned => Self::conflict(err.to_string()),
            StoreError::Database(e) => {
                rocket::error!("Database error: {e}");
                Self::internal()
            }
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string(&ErrorBody {
            error: &self.message,
        })
        .map_err(|_| Status::InternalServerError)?;

        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(body.len(), std::io::Cursor::new(body))
            .ok()
    }
}
