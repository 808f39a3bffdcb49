// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access tokens for the Management API.

use std::time::{Duration, Instant};

use auth0_common_secret::SecretString;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::{Authentication, ManagementConfig};
use crate::error::{transport_error, ManagementError, Result};

/// Tokens are refreshed this long before they expire.
const REFRESH_LEEWAY: Duration = Duration::from_secs(60);

#[derive(Debug)]
enum Credentials {
	Static(SecretString),
	ClientCredentials {
		client_id: String,
		client_secret: SecretString,
		audience: String,
		token_url: Url,
	},
}

#[derive(Debug)]
struct CachedToken {
	access_token: SecretString,
	refresh_at: Instant,
}

#[derive(Serialize)]
struct ClientCredentialsGrant<'a> {
	grant_type: &'static str,
	client_id: &'a str,
	client_secret: &'a str,
	audience: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: SecretString,
	expires_in: u64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
	error: String,
	error_description: Option<String>,
}

/// Hands out the bearer token for each request.
///
/// Client-credential tokens are cached; the mutex is held across the fetch so
/// concurrent requests wait for one token instead of each requesting their own.
#[derive(Debug)]
pub(crate) struct TokenSource {
	credentials: Credentials,
	cache: Mutex<Option<CachedToken>>,
}

impl TokenSource {
	pub(crate) fn from_config(config: &ManagementConfig) -> Result<Self> {
		let credentials = match &config.authentication {
			Authentication::Token(token) => Credentials::Static(token.clone()),
			Authentication::ClientCredentials {
				client_id,
				client_secret,
			} => Credentials::ClientCredentials {
				client_id: client_id.clone(),
				client_secret: client_secret.clone(),
				audience: config.audience()?,
				token_url: config.token_url()?,
			},
		};

		Ok(Self {
			credentials,
			cache: Mutex::new(None),
		})
	}

	/// Whether a rejected token can be replaced by asking again.
	pub(crate) fn is_refreshable(&self) -> bool {
		matches!(self.credentials, Credentials::ClientCredentials { .. })
	}

	pub(crate) async fn access_token(&self, http_client: &Client) -> Result<SecretString> {
		let (client_id, client_secret, audience, token_url) = match &self.credentials {
			Credentials::Static(token) => return Ok(token.clone()),
			Credentials::ClientCredentials {
				client_id,
				client_secret,
				audience,
				token_url,
			} => (client_id, client_secret, audience, token_url),
		};

		let mut cache = self.cache.lock().await;
		if let Some(cached) = cache.as_ref() {
			if Instant::now() < cached.refresh_at {
				return Ok(cached.access_token.clone());
			}
			debug!("cached management API token is due for refresh");
		}

		let grant = ClientCredentialsGrant {
			grant_type: "client_credentials",
			client_id,
			client_secret: client_secret.expose(),
			audience,
		};
		let fetched = request_token(http_client, token_url, &grant).await?;
		let token = fetched.access_token.clone();
		*cache = Some(fetched);
		Ok(token)
	}

	/// Drop the cached token so the next request fetches a new one.
	pub(crate) async fn invalidate(&self) {
		self.cache.lock().await.take();
	}
}

#[instrument(skip_all, fields(client_id = %grant.client_id, audience = %grant.audience))]
async fn request_token(
	http_client: &Client,
	token_url: &Url,
	grant: &ClientCredentialsGrant<'_>,
) -> Result<CachedToken> {
	debug!(url = %token_url, "requesting management API token");

	let response = http_client
		.post(token_url.clone())
		.header(ACCEPT, "application/json")
		.json(grant)
		.send()
		.await
		.map_err(transport_error)?;

	let status = response.status();
	let body = response.text().await.map_err(transport_error)?;

	if !status.is_success() {
		let message = serde_json::from_str::<TokenErrorResponse>(&body)
			.map(|e| e.error_description.unwrap_or(e.error))
			.unwrap_or(body);
		error!(status = status.as_u16(), message = %message, "token request rejected");
		return Err(ManagementError::Token {
			status: Some(status.as_u16()),
			message,
		});
	}

	let token: TokenResponse = serde_json::from_str(&body).map_err(|e| ManagementError::Token {
		status: None,
		message: format!("failed to parse token response: {e}"),
	})?;

	debug!(expires_in = token.expires_in, "obtained management API token");

	Ok(CachedToken {
		access_token: token.access_token,
		refresh_at: Instant::now() + Duration::from_secs(token.expires_in).saturating_sub(REFRESH_LEEWAY),
	})
}
