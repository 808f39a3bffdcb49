// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Management API client.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by [`Management`](crate::Management) and the resource managers.
#[derive(Debug, Error)]
pub enum ManagementError {
	/// Network-level error during HTTP communication.
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	/// Request timed out.
	#[error("request timed out")]
	Timeout,

	/// The API answered with an error status.
	#[error("{status} {error}: {message}")]
	Api {
		status: u16,
		error: String,
		message: String,
		error_code: Option<String>,
	},

	/// The tenant's rate limit was hit.
	#[error("rate limited: {message}")]
	RateLimited {
		retry_after: Option<Duration>,
		message: String,
	},

	/// The access token could not be obtained.
	#[error("failed to obtain access token: {message}")]
	Token { status: Option<u16>, message: String },

	/// A URI could not be built.
	#[error("invalid URL: {0}")]
	InvalidUrl(String),

	/// The request body could not be encoded.
	#[error("failed to encode request body: {0}")]
	Encode(#[source] serde_json::Error),

	/// The response body was not what the endpoint documents.
	#[error("invalid response: {0}")]
	InvalidResponse(String),

	/// A payload was rejected locally before it was sent.
	#[error("invalid email provider: {0}")]
	Validation(String),

	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Result type alias for Management API operations.
pub type Result<T> = std::result::Result<T, ManagementError>;

/// Error body returned by the Management API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
	error: Option<String>,
	message: Option<String>,
	error_code: Option<String>,
}

impl ManagementError {
	/// Build an error from a non-success response.
	///
	/// Bodies that are not the documented JSON shape are kept verbatim as
	/// the message.
	pub(crate) fn from_response(
		status: StatusCode,
		body: &str,
		retry_after: Option<Duration>,
	) -> Self {
		let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
		let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
		let raw = match body.trim() {
			"" => reason.clone(),
			trimmed => trimmed.to_string(),
		};

		let (error, message, error_code) = match parsed {
			Some(parsed) => (
				parsed.error.unwrap_or(reason),
				parsed.message.unwrap_or(raw),
				parsed.error_code,
			),
			None => (reason, raw, None),
		};

		if status == StatusCode::TOO_MANY_REQUESTS {
			return ManagementError::RateLimited {
				retry_after,
				message,
			};
		}

		ManagementError::Api {
			status: status.as_u16(),
			error,
			message,
			error_code,
		}
	}

	/// HTTP status of an API error response, if this is one.
	pub fn status(&self) -> Option<u16> {
		match self {
			ManagementError::Api { status, .. } => Some(*status),
			ManagementError::RateLimited { .. } => Some(StatusCode::TOO_MANY_REQUESTS.as_u16()),
			ManagementError::Http(e) => e.status().map(|s| s.as_u16()),
			_ => None,
		}
	}

	pub fn is_not_found(&self) -> bool {
		self.status() == Some(StatusCode::NOT_FOUND.as_u16())
	}
}

pub(crate) fn transport_error(e: reqwest::Error) -> ManagementError {
	if e.is_timeout() {
		ManagementError::Timeout
	} else {
		ManagementError::Http(e)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_documented_error_body() {
		let body = r#"{"statusCode":400,"error":"Bad Request","message":"Payload validation error: 'Missing required property: api_key'.","errorCode":"invalid_body"}"#;
		let err = ManagementError::from_response(StatusCode::BAD_REQUEST, body, None);

		match &err {
			ManagementError::Api {
				status,
				error,
				message,
				error_code,
			} => {
				assert_eq!(*status, 400);
				assert_eq!(error, "Bad Request");
				assert!(message.contains("api_key"));
				assert_eq!(error_code.as_deref(), Some("invalid_body"));
			}
			other => panic!("expected Api error, got {other:?}"),
		}
		assert_eq!(
			err.to_string(),
			"400 Bad Request: Payload validation error: 'Missing required property: api_key'."
		);
	}

	#[test]
	fn keeps_unparseable_body_as_message() {
		let err = ManagementError::from_response(
			StatusCode::BAD_GATEWAY,
			"<html>upstream down</html>\n",
			None,
		);

		match err {
			ManagementError::Api { error, message, .. } => {
				assert_eq!(error, "Bad Gateway");
				assert_eq!(message, "<html>upstream down</html>");
			}
			other => panic!("expected Api error, got {other:?}"),
		}
	}

	#[test]
	fn empty_body_falls_back_to_reason() {
		let err = ManagementError::from_response(StatusCode::UNAUTHORIZED, "  \n", None);

		match &err {
			ManagementError::Api { error, message, .. } => {
				assert_eq!(error, "Unauthorized");
				assert_eq!(message, "Unauthorized");
			}
			other => panic!("expected Api error, got {other:?}"),
		}
		assert_eq!(err.to_string(), "401 Unauthorized: Unauthorized");
	}

	#[test]
	fn too_many_requests_becomes_rate_limited() {
		let body = r#"{"statusCode":429,"error":"Too Many Requests","message":"Global limit has been reached"}"#;
		let err = ManagementError::from_response(
			StatusCode::TOO_MANY_REQUESTS,
			body,
			Some(Duration::from_secs(2)),
		);

		match &err {
			ManagementError::RateLimited {
				retry_after,
				message,
			} => {
				assert_eq!(*retry_after, Some(Duration::from_secs(2)));
				assert_eq!(message, "Global limit has been reached");
			}
			other => panic!("expected RateLimited, got {other:?}"),
		}
		assert_eq!(err.status(), Some(429));
	}

	#[test]
	fn not_found_helper() {
		let err = ManagementError::from_response(
			StatusCode::NOT_FOUND,
			r#"{"statusCode":404,"error":"Not Found","message":"There is not an email provider configured.","errorCode":"inexistent_email_provider"}"#,
			None,
		);
		assert!(err.is_not_found());
		assert!(!ManagementError::Timeout.is_not_found());
		assert_eq!(ManagementError::Validation("x".into()).status(), None);
	}
}
