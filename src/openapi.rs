use aide::{openapi::Tag, transform::TransformOpenApi};

use crate::{error, extract::Json};

pub mod tag {
	pub const POST: &str = "Post";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Post Info API")
		.summary("Display-ready posts from the content API")
		.description(
			"Looks up posts on the upstream content API by slug and returns them \
			 with their creation date formatted for display.",
		)
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Post lookup".into()),
			..Default::default()
		})
		.default_response_with::<Json<Vec<error::Message<'static>>>, _>(|res| {
			res.example(
				error::Message::new("upstream_status")
					.detail("status", 404)
					.into_vec(),
			)
		})
}
