use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::Display;

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        data_load_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            200..=299 => (StatusCode::BAD_GATEWAY, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_input_error() -> Error {
    Error {
        code: 101,
        message: "invalid input".into(),
    }
}

pub fn env_var_error(_: env::VarError) -> Error {
    Error {
        code: 1,
        message: "environment variable error".into(),
    }
}

pub fn config_error<T: Display>(detail: T) -> Error {
    Error {
        code: 2,
        message: format!("configuration error: {}", detail),
    }
}

pub fn reqwest_error(_: reqwest::Error) -> Error {
    Error {
        code: 3,
        message: "reqwest error".into(),
    }
}

pub fn data_load_error<T: Display>(detail: T) -> Error {
    Error {
        code: 6,
        message: format!("failed to load address data: {}", detail),
    }
}

pub fn optimization_error<T: Display>(detail: T) -> Error {
    Error {
        code: 200,
        message: format!("Optimization failed: {}", detail),
    }
}

pub fn directions_error<T: Display>(detail: T) -> Error {
    Error {
        code: 201,
        message: format!("Directions generation failed: {}", detail),
    }
}

#[test]
fn upstream_errors_map_to_bad_gateway() {
    let response = optimization_error(500).into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = directions_error("no features").into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn internal_errors_hide_details() {
    let response = data_load_error("missing column").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = invalid_input_error().into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
