// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Environment variable helpers.
//!
//! Secrets such as `AUTH0_CLIENT_SECRET` or `AUTH0_TOKEN` may be given either
//! directly or as a path in `AUTH0_CLIENT_SECRET_FILE`, the convention used by
//! Docker and Kubernetes secret mounts.

use std::path::PathBuf;
use std::str::FromStr;
use std::{env, fs};

use auth0_common_secret::Secret;
use thiserror::Error;

/// Errors that can occur when loading secrets from environment variables.
#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Error returned when a required secret is not found.
#[derive(Debug, Error)]
pub enum RequiredSecretError {
	#[error("required secret not found: set either {var} or {file_var}")]
	Missing { var: String, file_var: String },

	#[error(transparent)]
	Load(#[from] SecretEnvError),
}

/// A plain setting was present but could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value for {var}: {value:?} ({reason})")]
pub struct EnvParseError {
	pub var: String,
	pub value: String,
	pub reason: String,
}

/// Load a secret using the `VAR` / `VAR_FILE` convention.
///
/// `VAR_FILE` wins over `VAR`. A single trailing newline is stripped from
/// file contents; everything else is kept verbatim. Returns `Ok(None)` when
/// neither is set.
///
/// ```no_run
/// use auth0_common_config::load_secret_env;
///
/// if let Some(secret) = load_secret_env("AUTH0_CLIENT_SECRET")? {
///     println!("client secret configured: {secret}"); // prints "[REDACTED]"
/// }
/// # Ok::<(), auth0_common_config::SecretEnvError>(())
/// ```
pub fn load_secret_env(var: &str) -> Result<Option<Secret<String>>, SecretEnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path_str) = env::var(&file_var) {
		if path_str.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(&path_str);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(Secret::new(secret)));
	}

	Ok(env::var(var).ok().map(Secret::new))
}

/// Like [`load_secret_env`], but a missing secret is an error.
pub fn require_secret_env(var: &str) -> Result<Secret<String>, RequiredSecretError> {
	load_secret_env(var)?.ok_or_else(|| RequiredSecretError::Missing {
		var: var.to_string(),
		file_var: format!("{var}_FILE"),
	})
}

/// Read a non-secret setting. Blank values count as unset.
pub fn load_env(var: &str) -> Option<String> {
	env::var(var)
		.ok()
		.map(|value| value.trim().to_string())
		.filter(|value| !value.is_empty())
}

/// Read and parse a non-secret setting.
pub fn parse_env<T>(var: &str) -> Result<Option<T>, EnvParseError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	let Some(value) = load_env(var) else {
		return Ok(None);
	};

	value.parse().map(Some).map_err(|e: T::Err| EnvParseError {
		var: var.to_string(),
		value,
		reason: e.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	mod load_secret_env_tests {
		use super::*;

		#[test]
		fn returns_none_when_not_set() {
			let var = "AUTH0_TEST_SECRET_UNSET";
			env::remove_var(var);
			env::remove_var(format!("{var}_FILE"));

			assert!(load_secret_env(var).unwrap().is_none());
		}

		#[test]
		fn reads_from_direct_env_var() {
			let var = "AUTH0_TEST_SECRET_DIRECT";
			env::set_var(var, "direct-secret");
			env::remove_var(format!("{var}_FILE"));

			let secret = load_secret_env(var).unwrap().unwrap();
			assert_eq!(secret.expose(), "direct-secret");

			env::remove_var(var);
		}

		#[test]
		fn file_var_takes_precedence_and_strips_newline() {
			let var = "AUTH0_TEST_SECRET_FILE";
			let mut file = NamedTempFile::new().unwrap();
			writeln!(file, "file-secret").unwrap();

			env::set_var(var, "direct-secret");
			env::set_var(format!("{var}_FILE"), file.path().to_str().unwrap());

			let secret = load_secret_env(var).unwrap().unwrap();
			assert_eq!(secret.expose(), "file-secret");

			env::remove_var(var);
			env::remove_var(format!("{var}_FILE"));
		}

		#[test]
		fn preserves_content_without_trailing_newline() {
			let var = "AUTH0_TEST_SECRET_NO_NEWLINE";
			let mut file = NamedTempFile::new().unwrap();
			write!(file, "line-one\nline-two").unwrap();

			env::set_var(format!("{var}_FILE"), file.path().to_str().unwrap());

			let secret = load_secret_env(var).unwrap().unwrap();
			assert_eq!(secret.expose(), "line-one\nline-two");

			env::remove_var(format!("{var}_FILE"));
		}

		#[test]
		fn missing_file_is_io_error() {
			let var = "AUTH0_TEST_SECRET_MISSING_FILE";
			env::set_var(format!("{var}_FILE"), "/nonexistent/auth0/secret");

			assert!(matches!(
				load_secret_env(var),
				Err(SecretEnvError::Io { .. })
			));

			env::remove_var(format!("{var}_FILE"));
		}

		#[test]
		fn empty_file_path_is_rejected() {
			let var = "AUTH0_TEST_SECRET_EMPTY_PATH";
			env::set_var(format!("{var}_FILE"), "");

			assert!(matches!(
				load_secret_env(var),
				Err(SecretEnvError::EmptyPath { .. })
			));

			env::remove_var(format!("{var}_FILE"));
		}
	}

	#[test]
	fn require_secret_env_reports_both_names() {
		let var = "AUTH0_TEST_SECRET_REQUIRED";
		env::remove_var(var);
		env::remove_var(format!("{var}_FILE"));

		let err = require_secret_env(var).unwrap_err();
		let message = err.to_string();
		assert!(message.contains("AUTH0_TEST_SECRET_REQUIRED"));
		assert!(message.contains("AUTH0_TEST_SECRET_REQUIRED_FILE"));
	}

	#[test]
	fn load_env_treats_blank_as_unset() {
		let var = "AUTH0_TEST_PLAIN_BLANK";
		env::set_var(var, "   ");
		assert!(load_env(var).is_none());

		env::set_var(var, " tenant.auth0.com ");
		assert_eq!(load_env(var).as_deref(), Some("tenant.auth0.com"));

		env::remove_var(var);
	}

	#[test]
	fn parse_env_reports_bad_values() {
		let var = "AUTH0_TEST_PLAIN_PARSE";
		env::set_var(var, "thirty");

		let err = parse_env::<u64>(var).unwrap_err();
		assert_eq!(err.var, var);
		assert_eq!(err.value, "thirty");

		env::set_var(var, "30");
		assert_eq!(parse_env::<u64>(var).unwrap(), Some(30));

		env::remove_var(var);
		assert_eq!(parse_env::<u64>(var).unwrap(), None);
	}
}
