// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Management API client.
//!
//! # Environment
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `AUTH0_DOMAIN` | Tenant domain, e.g. `example.eu.auth0.com` (required) |
//! | `AUTH0_TOKEN` / `AUTH0_TOKEN_FILE` | Pre-issued Management API token |
//! | `AUTH0_CLIENT_ID` | Machine-to-machine application client ID |
//! | `AUTH0_CLIENT_SECRET` / `AUTH0_CLIENT_SECRET_FILE` | Its client secret |
//! | `AUTH0_AUDIENCE` | Token audience, defaults to `https://{domain}/api/v2/` |
//! | `AUTH0_REQUEST_TIMEOUT_SECS` | Per-request timeout, defaults to 30 |
//!
//! A static token wins over client credentials when both are present.

use std::time::Duration;

use auth0_common_config::{
	load_env, load_secret_env, parse_env, require_secret_env, EnvParseError, RequiredSecretError,
};
use auth0_common_http::RetryConfig;
use auth0_common_secret::SecretString;
use url::Url;

pub const ENV_DOMAIN: &str = "AUTH0_DOMAIN";
pub const ENV_TOKEN: &str = "AUTH0_TOKEN";
pub const ENV_CLIENT_ID: &str = "AUTH0_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AUTH0_CLIENT_SECRET";
pub const ENV_AUDIENCE: &str = "AUTH0_AUDIENCE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "AUTH0_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("missing environment variable: {0}")]
	MissingEnvVar(String),

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error(transparent)]
	Secret(#[from] RequiredSecretError),

	#[error(transparent)]
	Parse(#[from] EnvParseError),
}

/// How the client authenticates against the Management API.
#[derive(Debug, Clone)]
pub enum Authentication {
	/// A token issued out of band, sent as-is.
	Token(SecretString),
	/// Client credentials grant against the tenant's `/oauth/token`.
	ClientCredentials {
		client_id: String,
		client_secret: SecretString,
	},
}

#[derive(Debug, Clone)]
pub struct ManagementConfig {
	/// Tenant domain. A value with an explicit `http://` or `https://`
	/// scheme is used as-is.
	pub domain: String,
	pub authentication: Authentication,
	/// Overrides the default `https://{domain}/api/v2/` audience.
	pub audience: Option<String>,
	pub request_timeout: Duration,
	pub retry_config: RetryConfig,
	/// Overrides the standard User-Agent.
	pub user_agent: Option<String>,
	/// Send the base64 `Auth0-Client` telemetry header.
	pub send_client_info: bool,
}

impl ManagementConfig {
	pub fn new(domain: impl Into<String>, authentication: Authentication) -> Self {
		Self {
			domain: domain.into(),
			authentication,
			audience: None,
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			retry_config: RetryConfig::default(),
			user_agent: None,
			send_client_info: true,
		}
	}

	pub fn with_token(domain: impl Into<String>, token: impl Into<SecretString>) -> Self {
		Self::new(domain, Authentication::Token(token.into()))
	}

	pub fn with_client_credentials(
		domain: impl Into<String>,
		client_id: impl Into<String>,
		client_secret: impl Into<SecretString>,
	) -> Self {
		Self::new(
			domain,
			Authentication::ClientCredentials {
				client_id: client_id.into(),
				client_secret: client_secret.into(),
			},
		)
	}

	/// Load configuration from the environment (see the module docs).
	pub fn from_env() -> Result<Self, ConfigError> {
		let domain =
			load_env(ENV_DOMAIN).ok_or_else(|| ConfigError::MissingEnvVar(ENV_DOMAIN.to_string()))?;
		Self::from_env_for_domain(domain)
	}

	/// Like [`from_env`](Self::from_env), with the domain supplied by the caller.
	pub fn from_env_for_domain(domain: impl Into<String>) -> Result<Self, ConfigError> {
		let token = load_secret_env(ENV_TOKEN)
			.map_err(RequiredSecretError::from)?
			.filter(|token| !token.expose().trim().is_empty());
		let authentication = match token {
			Some(token) => Authentication::Token(token),
			None => {
				let client_id = load_env(ENV_CLIENT_ID).ok_or_else(|| {
					ConfigError::MissingEnvVar(format!("{ENV_TOKEN} or {ENV_CLIENT_ID}"))
				})?;
				Authentication::ClientCredentials {
					client_id,
					client_secret: require_secret_env(ENV_CLIENT_SECRET)?,
				}
			}
		};

		let mut config = Self::new(domain, authentication);
		config.audience = load_env(ENV_AUDIENCE);
		if let Some(secs) = parse_env::<u64>(ENV_REQUEST_TIMEOUT_SECS)? {
			config.request_timeout = Duration::from_secs(secs);
		}

		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.domain.trim().is_empty() {
			return Err(ConfigError::InvalidConfig(
				"domain cannot be empty".to_string(),
			));
		}
		self.base_url()?;

		match &self.authentication {
			Authentication::Token(token) if token.expose().is_empty() => {
				return Err(ConfigError::InvalidConfig(
					"token cannot be empty".to_string(),
				));
			}
			Authentication::ClientCredentials {
				client_id,
				client_secret,
			} => {
				if client_id.is_empty() {
					return Err(ConfigError::InvalidConfig(
						"client_id cannot be empty".to_string(),
					));
				}
				if client_secret.expose().is_empty() {
					return Err(ConfigError::InvalidConfig(
						"client_secret cannot be empty".to_string(),
					));
				}
			}
			Authentication::Token(_) => {}
		}

		if self.request_timeout.is_zero() {
			return Err(ConfigError::InvalidConfig(
				"request_timeout must be greater than zero".to_string(),
			));
		}
		if self.retry_config.max_attempts == 0 {
			return Err(ConfigError::InvalidConfig(
				"retry_config.max_attempts must be at least 1".to_string(),
			));
		}
		Ok(())
	}

	/// `https://{domain}`.
	pub fn base_url(&self) -> Result<Url, ConfigError> {
		let domain = self.domain.trim().trim_end_matches('/');
		let raw = if domain.starts_with("http://") || domain.starts_with("https://") {
			domain.to_string()
		} else {
			format!("https://{domain}")
		};

		let url = Url::parse(&raw)
			.map_err(|e| ConfigError::InvalidConfig(format!("invalid domain {:?}: {e}", self.domain)))?;
		if url.host_str().is_none() {
			return Err(ConfigError::InvalidConfig(format!(
				"domain {:?} has no host",
				self.domain
			)));
		}
		Ok(url)
	}

	/// `https://{domain}/api/v2`.
	pub fn api_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&["api", "v2"])
	}

	/// `https://{domain}/oauth/token`.
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&["oauth", "token"])
	}

	pub fn audience(&self) -> Result<String, ConfigError> {
		match &self.audience {
			Some(audience) => Ok(audience.clone()),
			None => Ok(format!("{}/", self.api_url()?)),
		}
	}

	fn endpoint(&self, segments: &[&str]) -> Result<Url, ConfigError> {
		let mut url = self.base_url()?;
		url
			.path_segments_mut()
			.map_err(|_| ConfigError::InvalidConfig(format!("{:?} cannot be a base URL", self.domain)))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}
}
