// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The shared, authenticated Management API transport.

use std::time::Duration;

use auth0_common_http::{retry, RetryConfig, RetryableError};
use base64::Engine;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ManagementConfig;
use crate::email::EmailManager;
use crate::error::{transport_error, ManagementError, Result};
use crate::request::{self, RequestOption};
use crate::token::TokenSource;

const AUTH0_CLIENT_HEADER: &str = "Auth0-Client";
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// One failed attempt, tagged with whether another attempt may succeed.
#[derive(Debug)]
struct AttemptError {
	error: ManagementError,
	retryable: bool,
}

impl RetryableError for AttemptError {
	fn is_retryable(&self) -> bool {
		self.retryable
	}

	fn retry_after(&self) -> Option<Duration> {
		match &self.error {
			ManagementError::RateLimited { retry_after, .. } => *retry_after,
			_ => None,
		}
	}
}

/// Authenticated client for the Auth0 Management API.
///
/// Owned by the application and borrowed by the resource managers, which
/// only build URIs and payloads.
#[derive(Debug)]
pub struct Management {
	http_client: Client,
	api_url: Url,
	tokens: TokenSource,
	retry_config: RetryConfig,
	client_info: Option<String>,
}

impl Management {
	#[tracing::instrument(skip_all, fields(domain = %config.domain), name = "Management::new")]
	pub fn new(config: ManagementConfig) -> Result<Self> {
		config.validate()?;

		let builder = match &config.user_agent {
			Some(user_agent) => auth0_common_http::builder_with_user_agent(user_agent.clone()),
			None => auth0_common_http::builder(),
		};
		let http_client = builder.timeout(config.request_timeout).build()?;

		let client_info = config.send_client_info.then(client_info_header);

		let management = Self {
			http_client,
			api_url: config.api_url()?,
			tokens: TokenSource::from_config(&config)?,
			retry_config: config.retry_config,
			client_info,
		};

		info!(api_url = %management.api_url, "initialized management client");
		Ok(management)
	}

	/// Sets a custom retry configuration.
	pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
		self.retry_config = config;
		self
	}

	/// The email provider manager.
	pub fn email(&self) -> EmailManager<'_> {
		EmailManager::new(self)
	}

	/// Join percent-encoded path segments onto the API base URL.
	pub fn uri(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.api_url.clone();
		url
			.path_segments_mut()
			.map_err(|_| ManagementError::InvalidUrl(format!("{} cannot be a base URL", self.api_url)))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	/// Apply request options to a URI's query string.
	pub fn q(&self, url: Url, options: &[RequestOption]) -> Url {
		request::apply(url, options)
	}

	pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
		let body = self.request(Method::GET, url, None).await?;
		decode(&body)
	}

	pub async fn post<B, T>(&self, url: Url, payload: &B) -> Result<T>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let body = self.request(Method::POST, url, Some(encode(payload)?)).await?;
		decode(&body)
	}

	pub async fn patch<B, T>(&self, url: Url, payload: &B) -> Result<T>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let body = self.request(Method::PATCH, url, Some(encode(payload)?)).await?;
		decode(&body)
	}

	pub async fn delete(&self, url: Url) -> Result<()> {
		self.request(Method::DELETE, url, None).await.map(|_| ())
	}

	/// Send with retries. A 401 on a refreshable token re-authenticates once.
	async fn request(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<String> {
		let mut reauthenticated = false;

		loop {
			let outcome = retry(&self.retry_config, || {
				self.attempt(&method, &url, body.as_deref())
			})
			.await;

			match outcome {
				Ok(body) => return Ok(body),
				Err(failure)
					if failure.error.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
						&& !reauthenticated
						&& self.tokens.is_refreshable() =>
				{
					warn!(method = %method, url = %url, "access token rejected, re-authenticating");
					self.tokens.invalidate().await;
					reauthenticated = true;
				}
				Err(failure) => return Err(failure.error),
			}
		}
	}

	async fn attempt(
		&self,
		method: &Method,
		url: &Url,
		body: Option<&[u8]>,
	) -> std::result::Result<String, AttemptError> {
		let token = self
			.tokens
			.access_token(&self.http_client)
			.await
			.map_err(|e| self.classify(e))?;

		let mut request = self
			.http_client
			.request(method.clone(), url.clone())
			.bearer_auth(token.expose())
			.header(ACCEPT, "application/json");
		if let Some(info) = &self.client_info {
			request = request.header(AUTH0_CLIENT_HEADER, info);
		}
		if let Some(body) = body {
			request = request
				.header(CONTENT_TYPE, "application/json")
				.body(body.to_vec());
		}

		debug!(method = %method, url = %url, "sending management API request");

		let response = request
			.send()
			.await
			.map_err(|e| self.classify(transport_error(e)))?;

		let status = response.status();
		debug!(status = %status, "received management API response");

		if status.is_success() {
			return response
				.text()
				.await
				.map_err(|e| self.classify(transport_error(e)));
		}

		let retry_after = rate_limit_delay(response.headers());
		let text = response.text().await.unwrap_or_default();
		let error = ManagementError::from_response(status, &text, retry_after);
		error!(method = %method, url = %url, status = status.as_u16(), error = %error, "management API request failed");

		Err(self.classify(error))
	}

	fn classify(&self, error: ManagementError) -> AttemptError {
		let retryable = match &error {
			ManagementError::Timeout => true,
			ManagementError::Http(e) => e.is_timeout() || e.is_connect(),
			ManagementError::Api { status, .. }
			| ManagementError::Token {
				status: Some(status),
				..
			} => self.is_retryable_status(*status),
			ManagementError::RateLimited { .. } => self.retry_config.is_retryable_status(StatusCode::TOO_MANY_REQUESTS),
			_ => false,
		};
		AttemptError { error, retryable }
	}

	fn is_retryable_status(&self, status: u16) -> bool {
		StatusCode::from_u16(status)
			.map(|status| self.retry_config.is_retryable_status(status))
			.unwrap_or(false)
	}
}

fn encode<B: Serialize + ?Sized>(payload: &B) -> Result<Vec<u8>> {
	serde_json::to_vec(payload).map_err(ManagementError::Encode)
}

/// An empty body decodes as JSON `null`, so `Option<T>` and `()` accept it.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
	let body = body.trim();
	let body = if body.is_empty() { "null" } else { body };
	serde_json::from_str(body).map_err(|e| ManagementError::InvalidResponse(format!("JSON parse error: {e}")))
}

/// Wait requested by a rate-limited response.
///
/// `Retry-After` is in seconds; `X-RateLimit-Reset` is a unix timestamp.
fn rate_limit_delay(headers: &HeaderMap) -> Option<Duration> {
	let header = |name| headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim);

	if let Some(secs) = header(RETRY_AFTER.as_str()).and_then(|v| v.parse::<u64>().ok()) {
		return Some(Duration::from_secs(secs));
	}

	let reset = header(RATE_LIMIT_RESET_HEADER).and_then(|v| v.parse::<i64>().ok())?;
	let wait = reset - chrono::Utc::now().timestamp();
	Some(Duration::from_secs(wait.max(0) as u64))
}

fn client_info_header() -> String {
	let info = serde_json::json!({
		"name": "auth0-rust",
		"version": env!("CARGO_PKG_VERSION"),
	});
	base64::engine::general_purpose::STANDARD.encode(info.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use reqwest::header::HeaderValue;

	fn management() -> Management {
		Management::new(ManagementConfig::with_token("example.auth0.com", "tok")).unwrap()
	}

	#[test]
	fn uri_joins_and_encodes_segments() {
		let m = management();

		assert_eq!(
			m.uri(&["emails", "provider"]).unwrap().as_str(),
			"https://example.auth0.com/api/v2/emails/provider"
		);
		assert_eq!(
			m.uri(&["users", "auth0 123/x"]).unwrap().as_str(),
			"https://example.auth0.com/api/v2/users/auth0%20123%2Fx"
		);
	}

	#[test]
	fn q_applies_options() {
		let m = management();
		let url = m.q(
			m.uri(&["emails", "provider"]).unwrap(),
			&[RequestOption::fields(["name"])],
		);
		assert_eq!(
			url.as_str(),
			"https://example.auth0.com/api/v2/emails/provider?fields=name&include_fields=true"
		);
	}

	#[test]
	fn decode_treats_empty_body_as_null() {
		let value: Option<serde_json::Value> = decode("  ").unwrap();
		assert!(value.is_none());
		decode::<()>("").unwrap();
		assert!(matches!(
			decode::<serde_json::Map<String, serde_json::Value>>("not json"),
			Err(ManagementError::InvalidResponse(_))
		));
	}

	#[test]
	fn rate_limit_delay_prefers_retry_after() {
		let mut headers = HeaderMap::new();
		assert_eq!(rate_limit_delay(&headers), None);

		let reset = chrono::Utc::now().timestamp() + 120;
		headers.insert(
			RATE_LIMIT_RESET_HEADER,
			HeaderValue::from_str(&reset.to_string()).unwrap(),
		);
		let from_reset = rate_limit_delay(&headers).unwrap();
		assert!(from_reset <= Duration::from_secs(120));
		assert!(from_reset >= Duration::from_secs(118));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
		assert_eq!(rate_limit_delay(&headers), Some(Duration::from_secs(3)));
	}

	#[test]
	fn past_reset_means_no_wait() {
		let mut headers = HeaderMap::new();
		headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from_static("1"));
		assert_eq!(rate_limit_delay(&headers), Some(Duration::ZERO));
	}

	#[test]
	fn classify_follows_retry_config() {
		let m = management();

		let api = |status: u16| ManagementError::Api {
			status,
			error: String::new(),
			message: String::new(),
			error_code: None,
		};
		assert!(m.classify(api(503)).retryable);
		assert!(!m.classify(api(500)).retryable);
		assert!(!m.classify(api(400)).retryable);
		assert!(m.classify(ManagementError::Timeout).retryable);
		assert!(!m.classify(ManagementError::Validation("x".into())).retryable);

		let limited = m.classify(ManagementError::RateLimited {
			retry_after: Some(Duration::from_secs(1)),
			message: String::new(),
		});
		assert!(limited.retryable);
		assert_eq!(limited.retry_after(), Some(Duration::from_secs(1)));

		let m = m.with_retry_config(RetryConfig {
			retryable_statuses: vec![],
			..RetryConfig::default()
		});
		assert!(!m.classify(api(503)).retryable);
	}

	#[test]
	fn client_info_is_base64_json() {
		let decoded = base64::engine::general_purpose::STANDARD
			.decode(client_info_header())
			.unwrap();
		let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
		assert_eq!(value["name"], "auth0-rust");
		assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
	}
}
