// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use auth0_management::{Email, Management, ManagementConfig, RequestOption};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "auth0", version, about = "Manage an Auth0 tenant from the command line", long_about = None)]
struct Cli {
	/// Tenant domain. Credentials are always read from the environment.
	#[arg(long, global = true, env = "AUTH0_DOMAIN")]
	domain: Option<String>,

	/// Log output format (logs go to stderr; filter with RUST_LOG)
	#[arg(long, global = true, value_enum, default_value = "compact")]
	log_format: LogFormat,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Manage the tenant's email provider
	#[command(subcommand)]
	Email(EmailCommand),
}

#[derive(Subcommand, Debug)]
enum EmailCommand {
	/// Print the email provider
	Get {
		/// Comma-separated fields to return
		#[arg(long, value_delimiter = ',')]
		fields: Vec<String>,

		/// Return every field except --fields
		#[arg(long, requires = "fields")]
		exclude: bool,
	},

	/// Configure the email provider from a JSON file
	Create {
		#[arg(long, short)]
		file: PathBuf,
	},

	/// Patch the email provider with the fields in a JSON file
	Update {
		#[arg(long, short)]
		file: PathBuf,
	},

	/// Remove the email provider
	Delete,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
	Json,
	Compact,
	Pretty,
}

fn init_tracing(format: LogFormat) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("auth0=info"));

	match format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().with_writer(std::io::stderr))
				.init();
		}
	}
}

fn load_config(domain: Option<String>) -> Result<ManagementConfig> {
	let config = match domain {
		Some(domain) => ManagementConfig::from_env_for_domain(domain),
		None => ManagementConfig::from_env(),
	};
	config.context("failed to load Auth0 configuration from the environment")
}

fn read_payload(path: &Path) -> Result<Email> {
	let raw = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	serde_json::from_str(&raw)
		.with_context(|| format!("{} is not a valid email provider document", path.display()))
}

fn field_options(fields: Vec<String>, exclude: bool) -> Vec<RequestOption> {
	match (fields.is_empty(), exclude) {
		(true, _) => Vec::new(),
		(false, false) => vec![RequestOption::fields(fields)],
		(false, true) => vec![RequestOption::without_fields(fields)],
	}
}

async fn run_email(management: &Management, command: EmailCommand) -> Result<()> {
	let emails = management.email();

	match command {
		EmailCommand::Get { fields, exclude } => {
			let email = emails
				.read(&field_options(fields, exclude))
				.await
				.context("failed to read the email provider")?;
			println!("{email}");
		}
		EmailCommand::Create { file } => {
			let payload = read_payload(&file)?;
			let email = emails
				.create(&payload)
				.await
				.context("failed to create the email provider")?;
			println!("{email}");
		}
		EmailCommand::Update { file } => {
			let payload = read_payload(&file)?;
			let email = emails
				.update(&payload)
				.await
				.context("failed to update the email provider")?;
			println!("{email}");
		}
		EmailCommand::Delete => {
			emails
				.delete()
				.await
				.context("failed to delete the email provider")?;
			info!("email provider removed");
		}
	}

	Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.log_format);
	debug!(command = ?cli.command, "starting");

	let management = Management::new(load_config(cli.domain)?)
		.context("failed to initialize the Management API client")?;

	match cli.command {
		Command::Email(command) => run_email(&management, command).await,
	}
}
