use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::fetch::FetchError;

/// Shown whenever the dashboard has no data to render.
pub const NO_DATA_MESSAGE: &str =
    "No accessibility data available. Check your MBTA API key and network connection.";

pub type RouteResult<O> = Result<O, RouteErrorResponse>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_information: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            message: None,
            detailed_information: None,
            upstream_status: None,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND).with_message(format!("{} not found.", what.into()))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_detailed_information(mut self, message: impl Into<String>) -> Self {
        self.detailed_information = Some(message.into());
        self
    }
}

impl From<FetchError> for RouteErrorResponse {
    fn from(value: FetchError) -> Self {
        let mut response = Self::new(StatusCode::BAD_GATEWAY)
            .with_message(NO_DATA_MESSAGE)
            .with_detailed_information(value.to_string());
        response.upstream_status = value.status().map(|s| s.as_u16());
        response
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}
