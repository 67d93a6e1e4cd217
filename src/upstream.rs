use std::time::{Duration, Instant};

use axum::http::StatusCode;
use reqwest::Url;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// An error talking to the content API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("upstream request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("upstream responded with {0}")]
	Status(StatusCode),
	#[error("upstream response could not be decoded: {0}")]
	Decode(#[from] serde_json::Error),
}

/// The wrapper the content API puts around every payload.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
	pub data: T,
}

#[derive(Serialize)]
struct InfoQuery<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	slug: Option<&'a str>,
}

/// Client for the upstream content API.
///
/// Cloning is cheap, the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct Upstream {
	client: reqwest::Client,
	info_url: String,
}

impl Upstream {
	pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, Error> {
		let client = reqwest::Client::builder()
			.user_agent(USER_AGENT)
			.timeout(timeout)
			.build()?;

		Ok(Self {
			client,
			info_url: format!("{}/info", base_url.as_str().trim_end_matches('/')),
		})
	}

	/// Fetches `<base>/info?slug=<slug>` and unwraps the envelope.
	///
	/// A missing slug is not sent at all (rather than as a placeholder such as
	/// `slug=undefined`), leaving the upstream to decide what an unqualified
	/// lookup means. Whatever status it answers with is reported as
	/// [`Error::Status`].
	#[tracing::instrument(skip(self))]
	pub async fn fetch_info<T: DeserializeOwned>(&self, slug: Option<&str>) -> Result<T, Error> {
		let start = Instant::now();
		let response = self
			.client
			.get(&self.info_url)
			.query(&InfoQuery { slug })
			.send()
			.await?;

		let status = response.status();

		tracing::info!(
			%status,
			histogram.upstream_latency_ms = start.elapsed().as_secs_f64() * 1000.0,
			"upstream responded"
		);

		if !status.is_success() {
			return Err(Error::Status(status));
		}

		let body = response.bytes().await?;
		let envelope = serde_json::from_slice::<Envelope<T>>(&body)?;

		Ok(envelope.data)
	}
}
