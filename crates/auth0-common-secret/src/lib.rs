// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret wrapper for credentials that travel through the Auth0 client.
//!
//! [`Secret<T>`] holds management API tokens, client secrets and email
//! provider credentials. The wrapped value:
//!
//! - is redacted in `Debug`, `Display` and the default `Serialize` impl
//! - is zeroized when dropped
//! - is only reachable through an explicit `.expose()` call
//!
//! Request payloads that must carry the real value (for example the
//! `api_key` of an email provider) opt in per field with the
//! [`exposed`] or [`exposed_option`] serde helpers.
//!
//! ```
//! use auth0_common_secret::Secret;
//!
//! let key = Secret::new("SG.xxxxx".to_string());
//! assert_eq!(format!("{key}"), "[REDACTED]");
//! assert_eq!(key.expose(), "SG.xxxxx");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// The placeholder printed in place of a secret value.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never be logged or echoed back.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

/// Secret strings are by far the common case.
pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Access the wrapped value. Call sites that need the secret say so.
	pub fn expose(&self) -> &T {
		&self.inner
	}

	/// Clone the wrapped value out; the wrapper still zeroizes its own copy.
	pub fn into_inner(self) -> T
	where
		T: Clone,
	{
		self.inner.clone()
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

impl From<String> for Secret<String> {
	fn from(value: String) -> Self {
		Secret::new(value)
	}
}

impl From<&str> for Secret<String> {
	fn from(value: &str) -> Self {
		Secret::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

/// Serde helpers that write the real value of a [`Secret`].
///
/// Only for outbound API payloads: `#[serde(with = "auth0_common_secret::exposed")]`.
#[cfg(feature = "serde")]
pub mod exposed {
	use super::Secret;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	pub fn serialize<T, S>(secret: &Secret<T>, serializer: S) -> Result<S::Ok, S::Error>
	where
		T: Serialize + Zeroize,
		S: Serializer,
	{
		secret.expose().serialize(serializer)
	}

	pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Secret<T>, D::Error>
	where
		T: Deserialize<'de> + Zeroize,
		D: Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}

/// [`exposed`] for `Option<Secret<T>>` fields.
#[cfg(feature = "serde")]
pub mod exposed_option {
	use super::Secret;
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	pub fn serialize<T, S>(secret: &Option<Secret<T>>, serializer: S) -> Result<S::Ok, S::Error>
	where
		T: Serialize + Zeroize,
		S: Serializer,
	{
		match secret {
			Some(secret) => serializer.serialize_some(secret.expose()),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Secret<T>>, D::Error>
	where
		T: Deserialize<'de> + Zeroize,
		D: Deserializer<'de>,
	{
		Ok(Option::<T>::deserialize(deserializer)?.map(Secret::new))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let secret = SecretString::new("smtp-password-123".to_string());

		assert_eq!(format!("{secret}"), REDACTED);
		let debug = format!("{secret:?}");
		assert!(debug.contains(REDACTED));
		assert!(!debug.contains("smtp-password-123"));
	}

	#[test]
	fn option_secret_debug_is_redacted() {
		let secret: Option<SecretString> = Some("aws-secret".into());
		let debug = format!("{secret:?}");
		assert!(!debug.contains("aws-secret"));
	}

	#[test]
	fn expose_and_into_inner_return_value() {
		let secret = SecretString::from("token");
		assert_eq!(secret.expose(), "token");
		assert_eq!(secret.clone().into_inner(), "token");
		assert_eq!(secret, SecretString::from("token"));
		assert_ne!(secret, SecretString::from("other"));
	}

	#[cfg(feature = "serde")]
	mod serde_tests {
		use super::*;
		use serde::{Deserialize, Serialize};

		#[derive(Serialize, Deserialize)]
		struct Payload {
			#[serde(with = "crate::exposed")]
			api_key: SecretString,
			#[serde(
				default,
				with = "crate::exposed_option",
				skip_serializing_if = "Option::is_none"
			)]
			smtp_pass: Option<SecretString>,
			redacted: SecretString,
		}

		#[test]
		fn default_serialize_is_redacted() {
			let json = serde_json::to_string(&SecretString::from("hidden")).unwrap();
			assert_eq!(json, format!("\"{REDACTED}\""));
		}

		#[test]
		fn exposed_fields_carry_real_value() {
			let payload = Payload {
				api_key: "SG.key".into(),
				smtp_pass: Some("pass".into()),
				redacted: "never".into(),
			};

			let value = serde_json::to_value(&payload).unwrap();
			assert_eq!(value["api_key"], "SG.key");
			assert_eq!(value["smtp_pass"], "pass");
			assert_eq!(value["redacted"], REDACTED);
		}

		#[test]
		fn exposed_option_skips_and_reads_back() {
			let payload: Payload =
				serde_json::from_str(r#"{"api_key":"k","redacted":"r"}"#).unwrap();
			assert!(payload.smtp_pass.is_none());

			let json = serde_json::to_string(&payload).unwrap();
			assert!(!json.contains("smtp_pass"));

			let payload: Payload =
				serde_json::from_str(r#"{"api_key":"k","smtp_pass":"p","redacted":"r"}"#).unwrap();
			assert_eq!(payload.smtp_pass.unwrap().expose(), "p");
		}
	}

	proptest! {
		#[test]
		fn display_never_contains_secret(inner in "[a-zA-Z0-9!@#$%^&*_+=;:,.<>?/-]{3,50}") {
			prop_assume!(!REDACTED.contains(inner.as_str()));
			let secret = Secret::new(inner.clone());
			let rendered = format!("{}", secret);
			prop_assert!(!rendered.contains(&inner));
		}

		#[test]
		fn debug_never_contains_secret(inner in "[a-zA-Z0-9!@#$%^&*_+=;:,.<>?/-]{3,50}") {
			prop_assume!(!format!("{:?}", Secret::new(String::new())).contains(inner.as_str()));
			let secret = Secret::new(inner.clone());
			let rendered = format!("{:?}", secret);
			prop_assert!(!rendered.contains(&inner));
		}
	}
}
