// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by the Auth0 crates.
//!
//! - [`Secret<T>`] re-exported from [`auth0_common_secret`]
//! - [`load_secret_env`] / [`require_secret_env`] for secrets with `*_FILE`
//!   support
//! - [`load_env`] / [`parse_env`] for plain settings

pub mod env;

pub use auth0_common_secret::{Secret, SecretString, REDACTED};

pub use env::{
	load_env, load_secret_env, parse_env, require_secret_env, EnvParseError, RequiredSecretError,
	SecretEnvError,
};
