use chrono::FixedOffset;

use crate::{
	config::Config,
	route::post::{
		model::{Post, PostDisplay},
		Error,
	},
	upstream::{self, Upstream},
};

/// Looks up posts on the content API and prepares them for display.
///
/// Holds no per-request state, so a single instance is shared by every request.
#[derive(Clone, Debug)]
pub struct PostInfoRetriever {
	upstream: Upstream,
	display_offset: FixedOffset,
}

impl PostInfoRetriever {
	pub fn new(upstream: Upstream, display_offset: FixedOffset) -> Self {
		Self {
			upstream,
			display_offset,
		}
	}

	pub fn from_config(config: &Config) -> Result<Self, upstream::Error> {
		let upstream = Upstream::new(&config.upstream_base_url, config.upstream_timeout)?;

		Ok(Self::new(upstream, config.display_offset))
	}

	/// Fetches the post with the given slug and formats its creation date.
	///
	/// Exactly one upstream call is made. Any failure, including a missing
	/// or unparseable `createdAt`, fails the lookup as a whole.
	#[tracing::instrument(skip(self))]
	pub async fn retrieve(&self, slug: Option<&str>) -> Result<PostDisplay, Error> {
		let post = self.upstream.fetch_info::<Post>(slug).await?;
		let post = post.into_display(&self.display_offset)?;

		tracing::debug!(created_at = post.created_at(), "post retrieved");

		Ok(post)
	}
}
