// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Auth0 Management API client.
//!
//! [`Management`] is the shared, authenticated transport: it owns the HTTP
//! client, obtains access tokens, builds API URIs and maps error responses.
//! Resource managers borrow it and stay thin. This crate ships the manager
//! for the tenant's email provider configuration, [`EmailManager`].
//!
//! # Example
//!
//! ```rust,no_run
//! use auth0_management::{Email, EmailCredentials, Management, ManagementConfig, RequestOption};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let management = Management::new(ManagementConfig::from_env()?)?;
//!
//! let provider = Email::new("sendgrid")
//!     .with_default_from_address("no-reply@example.com")
//!     .with_credentials(EmailCredentials::with_api_key("SG.xxxx"));
//! management.email().create(&provider).await?;
//!
//! let current = management
//!     .email()
//!     .read(&[RequestOption::fields(["name", "enabled"])])
//!     .await?;
//! println!("{current}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod email;
pub mod error;
pub mod management;
pub mod request;
mod token;

pub use auth0_common_http::RetryConfig;
pub use auth0_common_secret::SecretString;
pub use config::{Authentication, ConfigError, ManagementConfig};
pub use email::{Email, EmailCredentials, EmailManager, EmailProvider};
pub use error::{ManagementError, Result};
pub use management::Management;
pub use request::RequestOption;
