use std::{
	fmt::Display,
	net::{IpAddr, Ipv4Addr},
	str::FromStr,
	time::Duration,
};

use chrono::FixedOffset;
use reqwest::Url;

pub const UPSTREAM_BASE_URL: &str = "UPSTREAM_BASE_URL";
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";
pub const UPSTREAM_TIMEOUT_MS: &str = "UPSTREAM_TIMEOUT_MS";
pub const DISPLAY_UTC_OFFSET_MINUTES: &str = "DISPLAY_UTC_OFFSET_MINUTES";
pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// An error that prevents the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} is invalid: {reason}")]
	Invalid { name: &'static str, reason: String },
}

/// Runtime configuration, loaded once at startup and read-only afterwards.
#[derive(Clone, Debug)]
pub struct Config {
	/// Base URL of the content API. Post info is read from `<base>/info`.
	pub upstream_base_url: Url,
	pub host: IpAddr,
	pub port: u16,
	/// Upper bound on a single upstream call.
	pub upstream_timeout: Duration,
	/// Offset used when rendering dates for display.
	pub display_offset: FixedOffset,
	/// Whether traces and metrics are exported over OTLP.
	pub otlp_export: bool,
}

impl Config {
	/// Reads the configuration from the process environment.
	///
	/// Call [`dotenvy::dotenv`] first if a `.env` file should be honoured.
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, which returns the raw value of a variable.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let upstream_base_url = lookup(UPSTREAM_BASE_URL)
			.filter(|url| !url.is_empty())
			.ok_or(Error::Missing(UPSTREAM_BASE_URL))?;
		let upstream_base_url =
			Url::parse(&upstream_base_url).map_err(|e| invalid(UPSTREAM_BASE_URL, e))?;

		if upstream_base_url.cannot_be_a_base() {
			return Err(invalid(UPSTREAM_BASE_URL, "not a base url"));
		}

		let timeout_ms: u64 = parse_or(&lookup, UPSTREAM_TIMEOUT_MS, 10_000)?;

		if timeout_ms == 0 {
			return Err(invalid(UPSTREAM_TIMEOUT_MS, "must be greater than zero"));
		}

		let offset_minutes: i32 = parse_or(&lookup, DISPLAY_UTC_OFFSET_MINUTES, 0)?;
		let display_offset = offset_minutes
			.checked_mul(60)
			.and_then(FixedOffset::east_opt)
			.ok_or_else(|| invalid(DISPLAY_UTC_OFFSET_MINUTES, "must be within a day of UTC"))?;

		Ok(Self {
			upstream_base_url,
			host: parse_or(&lookup, HOST, IpAddr::V4(Ipv4Addr::LOCALHOST))?,
			port: parse_or(&lookup, PORT, 3000)?,
			upstream_timeout: Duration::from_millis(timeout_ms),
			display_offset,
			otlp_export: lookup(OTEL_EXPORTER_OTLP_ENDPOINT).is_some_and(|v| !v.is_empty()),
		})
	}
}

fn invalid(name: &'static str, reason: impl Display) -> Error {
	Error::Invalid {
		name,
		reason: reason.to_string(),
	}
}

fn parse_or<T>(
	lookup: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	default: T,
) -> Result<T, Error>
where
	T: FromStr,
	T::Err: Display,
{
	match lookup(name) {
		Some(value) => value.trim().parse().map_err(|e| invalid(name, e)),
		None => Ok(default),
	}
}
