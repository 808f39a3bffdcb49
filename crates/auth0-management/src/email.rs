// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The tenant's email provider configuration (`/api/v2/emails/provider`).
//!
//! A tenant has at most one email provider. It is created once, read and
//! partially updated afterwards, and deleted to fall back to Auth0's
//! built-in provider.

use std::fmt;
use std::str::FromStr;

use auth0_common_secret::{SecretString, REDACTED};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::error::{ManagementError, Result};
use crate::management::Management;
use crate::request::RequestOption;

const SES_CONFIGURATION_SET_HEADER: &str = "X-SES-Configuration-Set";

/// Credential keys masked by [`Email`]'s `Display`.
const SECRET_CREDENTIAL_KEYS: [&str; 3] = ["api_key", "secretAccessKey", "smtp_pass"];

/// Providers with documented credential requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailProvider {
	Mandrill,
	Sendgrid,
	Sparkpost,
	Ses,
	Smtp,
}

impl EmailProvider {
	pub fn as_str(&self) -> &'static str {
		match self {
			EmailProvider::Mandrill => "mandrill",
			EmailProvider::Sendgrid => "sendgrid",
			EmailProvider::Sparkpost => "sparkpost",
			EmailProvider::Ses => "ses",
			EmailProvider::Smtp => "smtp",
		}
	}
}

impl fmt::Display for EmailProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EmailProvider {
	type Err = ManagementError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"mandrill" => Ok(EmailProvider::Mandrill),
			"sendgrid" => Ok(EmailProvider::Sendgrid),
			"sparkpost" => Ok(EmailProvider::Sparkpost),
			"ses" => Ok(EmailProvider::Ses),
			"smtp" => Ok(EmailProvider::Smtp),
			other => Err(ManagementError::Validation(format!(
				"unknown provider {other:?}"
			))),
		}
	}
}

/// Credentials for the email provider. Which fields apply depends on the
/// provider; see [`Email::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCredentials {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_user: Option<String>,

	#[serde(
		default,
		with = "auth0_common_secret::exposed_option",
		skip_serializing_if = "Option::is_none"
	)]
	pub api_key: Option<SecretString>,

	#[serde(rename = "accessKeyId", default, skip_serializing_if = "Option::is_none")]
	pub access_key_id: Option<String>,

	#[serde(
		rename = "secretAccessKey",
		default,
		with = "auth0_common_secret::exposed_option",
		skip_serializing_if = "Option::is_none"
	)]
	pub secret_access_key: Option<SecretString>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub region: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub smtp_host: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub smtp_port: Option<u16>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub smtp_user: Option<String>,

	#[serde(
		default,
		with = "auth0_common_secret::exposed_option",
		skip_serializing_if = "Option::is_none"
	)]
	pub smtp_pass: Option<SecretString>,
}

impl EmailCredentials {
	/// Credentials for `mandrill`, `sendgrid` and `sparkpost`.
	pub fn with_api_key(api_key: impl Into<SecretString>) -> Self {
		Self {
			api_key: Some(api_key.into()),
			..Self::default()
		}
	}

	/// Credentials for Amazon SES.
	pub fn ses(
		access_key_id: impl Into<String>,
		secret_access_key: impl Into<SecretString>,
		region: impl Into<String>,
	) -> Self {
		Self {
			access_key_id: Some(access_key_id.into()),
			secret_access_key: Some(secret_access_key.into()),
			region: Some(region.into()),
			..Self::default()
		}
	}

	/// Credentials for a plain SMTP server.
	pub fn smtp(
		host: impl Into<String>,
		port: u16,
		user: impl Into<String>,
		pass: impl Into<SecretString>,
	) -> Self {
		Self {
			smtp_host: Some(host.into()),
			smtp_port: Some(port),
			smtp_user: Some(user.into()),
			smtp_pass: Some(pass.into()),
			..Self::default()
		}
	}

	pub fn with_api_user(mut self, api_user: impl Into<String>) -> Self {
		self.api_user = Some(api_user.into());
		self
	}

	/// SparkPost accepts only `"eu"`; SES takes an AWS region.
	pub fn with_region(mut self, region: impl Into<String>) -> Self {
		self.region = Some(region.into());
		self
	}
}

/// The email provider configuration.
///
/// Every field is optional so the same type serves create, partial update
/// and field-filtered reads. Absent fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	/// Server default is `true`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_from_address: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub credentials: Option<EmailCredentials>,

	/// Provider-specific settings, e.g. SMTP `headers`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub settings: Option<Map<String, Value>>,
}

impl Email {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			..Self::default()
		}
	}

	pub fn with_enabled(mut self, enabled: bool) -> Self {
		self.enabled = Some(enabled);
		self
	}

	pub fn with_default_from_address(mut self, address: impl Into<String>) -> Self {
		self.default_from_address = Some(address.into());
		self
	}

	pub fn with_credentials(mut self, credentials: EmailCredentials) -> Self {
		self.credentials = Some(credentials);
		self
	}

	pub fn with_settings(mut self, settings: Map<String, Value>) -> Self {
		self.settings = Some(settings);
		self
	}

	/// Tag SMTP mail with an SES configuration set through
	/// `settings.headers`, keeping any other settings and headers.
	pub fn with_ses_configuration_set(mut self, configuration_set: impl Into<String>) -> Self {
		let settings = self.settings.get_or_insert_with(Map::new);
		let headers = settings
			.entry("headers")
			.or_insert_with(|| Value::Object(Map::new()));
		if !headers.is_object() {
			*headers = Value::Object(Map::new());
		}
		if let Value::Object(headers) = headers {
			headers.insert(
				SES_CONFIGURATION_SET_HEADER.to_string(),
				Value::String(configuration_set.into()),
			);
		}
		self
	}

	/// The provider named by `name`, if it is one with known requirements.
	pub fn provider(&self) -> Option<EmailProvider> {
		self.name.as_deref().and_then(|name| name.parse().ok())
	}

	/// Check the credential requirements of known providers.
	///
	/// Unknown or absent provider names pass; the server has the final say.
	pub fn validate(&self) -> Result<()> {
		let Some(provider) = self.provider() else {
			return Ok(());
		};

		let empty = EmailCredentials::default();
		let credentials = self.credentials.as_ref().unwrap_or(&empty);

		let require = |present: bool, field: &str| {
			if present {
				Ok(())
			} else {
				Err(ManagementError::Validation(format!(
					"{provider} requires credentials.{field}"
				)))
			}
		};

		match provider {
			EmailProvider::Mandrill | EmailProvider::Sendgrid => {
				require(has_secret(&credentials.api_key), "api_key")?;
			}
			EmailProvider::Sparkpost => {
				require(has_secret(&credentials.api_key), "api_key")?;
				if let Some(region) = credentials.region.as_deref() {
					if region != "eu" {
						return Err(ManagementError::Validation(format!(
							"sparkpost region must be \"eu\" or absent, got {region:?}"
						)));
					}
				}
			}
			EmailProvider::Ses => {
				require(has_text(&credentials.access_key_id), "accessKeyId")?;
				require(
					has_secret(&credentials.secret_access_key),
					"secretAccessKey",
				)?;
				require(has_text(&credentials.region), "region")?;
			}
			EmailProvider::Smtp => {
				require(has_text(&credentials.smtp_host), "smtp_host")?;
				require(
					credentials.smtp_port.is_some_and(|port| port != 0),
					"smtp_port",
				)?;
				require(has_text(&credentials.smtp_user), "smtp_user")?;
				require(has_secret(&credentials.smtp_pass), "smtp_pass")?;
				self.validate_smtp_headers()?;
			}
		}

		Ok(())
	}

	fn validate_smtp_headers(&self) -> Result<()> {
		let Some(headers) = self.settings.as_ref().and_then(|s| s.get("headers")) else {
			return Ok(());
		};
		let Value::Object(headers) = headers else {
			return Err(ManagementError::Validation(
				"settings.headers must be an object".to_string(),
			));
		};
		match headers.get(SES_CONFIGURATION_SET_HEADER) {
			None | Some(Value::String(_)) => Ok(()),
			Some(_) => Err(ManagementError::Validation(format!(
				"settings.headers.{SES_CONFIGURATION_SET_HEADER} must be a string"
			))),
		}
	}
}

fn has_text(value: &Option<String>) -> bool {
	value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn has_secret(value: &Option<SecretString>) -> bool {
	value.as_ref().is_some_and(|v| !v.expose().is_empty())
}

/// Indented JSON with secret credentials replaced by `[REDACTED]`.
impl fmt::Display for Email {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut value = serde_json::to_value(self).map_err(|_| fmt::Error)?;
		if let Some(Value::Object(credentials)) = value.get_mut("credentials") {
			for key in SECRET_CREDENTIAL_KEYS {
				if let Some(secret) = credentials.get_mut(key) {
					*secret = Value::String(REDACTED.to_string());
				}
			}
		}
		let rendered = serde_json::to_string_pretty(&value).map_err(|_| fmt::Error)?;
		f.write_str(&rendered)
	}
}

/// Manages the tenant's email provider.
#[derive(Debug, Clone, Copy)]
pub struct EmailManager<'a> {
	management: &'a Management,
}

impl<'a> EmailManager<'a> {
	pub(crate) fn new(management: &'a Management) -> Self {
		Self { management }
	}

	/// Configure the email provider.
	///
	/// Known providers are checked for their required credentials before
	/// anything is sent.
	#[instrument(skip_all, fields(provider = email.name.as_deref().unwrap_or("")))]
	pub async fn create(&self, email: &Email) -> Result<Email> {
		email.validate()?;

		let url = self.management.uri(&["emails", "provider"])?;
		let created: Option<Email> = self.management.post(url, email).await?;

		info!("email provider created");
		Ok(created.unwrap_or_else(|| email.clone()))
	}

	/// Fetch the email provider. `options` select or exclude fields.
	#[instrument(skip_all)]
	pub async fn read(&self, options: &[RequestOption]) -> Result<Email> {
		let url = self
			.management
			.q(self.management.uri(&["emails", "provider"])?, options);
		self.management.get(url).await
	}

	/// Partially update the email provider. Only fields that are set are sent.
	#[instrument(skip_all, fields(provider = email.name.as_deref().unwrap_or("")))]
	pub async fn update(&self, email: &Email) -> Result<Email> {
		let url = self.management.uri(&["emails", "provider"])?;
		let updated: Option<Email> = self.management.patch(url, email).await?;

		info!("email provider updated");
		Ok(updated.unwrap_or_else(|| email.clone()))
	}

	/// Remove the email provider.
	#[instrument(skip_all)]
	pub async fn delete(&self) -> Result<()> {
		let url = self.management.uri(&["emails", "provider"])?;
		self.management.delete(url).await?;

		info!("email provider deleted");
		Ok(())
	}
}
