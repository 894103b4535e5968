use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use shared::error::{ErrorCode, ErrorResponse};
use shared::flow::Screen;
use thiserror::Error;
use crate::session::RejectedInteraction;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("The {0} screen requires a voter identity")]
    MissingVoterIdentity(Screen),
    #[error("Invalid voter identity: {0}")]
    InvalidVoterIdentity(String),
    #[error("Ballot store unavailable")]
    Unavailable,
    #[error("Ballot store error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::MissingVoterIdentity(_) => Status::BadRequest,
            ApiError::InvalidVoterIdentity(_) => Status::BadRequest,
            ApiError::Unavailable => Status::ServiceUnavailable,
            ApiError::Internal => Status::InternalServerError,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::MissingVoterIdentity(_) => ErrorCode::MissingVoterIdentity,
            ApiError::InvalidVoterIdentity(_) => ErrorCode::InvalidVoterIdentity,
            ApiError::Unavailable => ErrorCode::StoreUnavailable,
            ApiError::Internal => ErrorCode::SystemError,
        }
    }
}

impl From<RejectedInteraction> for ApiError {
    fn from(rejected: RejectedInteraction) -> Self {
        match rejected {
            RejectedInteraction::MissingVoterIdentity(screen) => ApiError::MissingVoterIdentity(screen),
            RejectedInteraction::InvalidVoterIdentity(reason) => ApiError::InvalidVoterIdentity(reason),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => ApiError::Unavailable,
            StoreError::Rejected(_) | StoreError::Inconsistent(_) => ApiError::Internal,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let body = ErrorResponse::new(self.code(), self.to_string());

        rocket::Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
