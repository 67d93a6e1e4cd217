use darling::{ast, FromMeta};
use proc_macro::TokenStream;
use quote::{format_ident, quote};

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
	#[darling(multiple)]
	response: Vec<ResponseArgs>,
}

#[derive(FromMeta)]
struct ResponseArgs {
	status: syn::LitInt,
	shape: Option<syn::Type>,
	description: Option<String>,
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match ast::NestedMeta::parse_meta_list(args.into()) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let args = match RouteArgs::from_list(&args) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let function = syn::parse_macro_input!(input as syn::ItemFn);
	let (summary, description) = match split_doc_comment(&function) {
		Ok(x) => x,
		Err(e) => return e.into_compile_error().into(),
	};

	let fn_name = format_ident!("{}_docs", function.sig.ident);
	let fn_vis = &function.vis;

	let tags = args.tag.iter();
	let responses = args.response.into_iter().map(|response| {
		let status = response.status;
		let shape = response.shape.map_or_else(|| quote!(()), |x| quote!(#x));

		match response.description {
			Some(description) => quote! {
				.response_with::<#status, #shape, _>(|res| res.description(#description))
			},
			None => quote! {
				.response::<#status, #shape>()
			},
		}
	});

	quote! {
		#function

		#fn_vis fn #fn_name(op: aide::transform::TransformOperation) -> aide::transform::TransformOperation {
			op.summary(#summary).description(#description)
				#(
					.tag(#tags)
				)*
				#(
					#responses
				)*
		}
	}
	.into()
}

/// Splits the doc comment of a handler into its summary (first line)
/// and description (everything after it).
///
/// A handler documented with a single line uses it for both.
fn split_doc_comment(function: &syn::ItemFn) -> syn::Result<(String, String)> {
	let mut lines = Vec::new();

	for attr in &function.attrs {
		let syn::Meta::NameValue(doc) = &attr.meta else {
			continue;
		};

		if !doc.path.is_ident("doc") {
			continue;
		}

		if let syn::Expr::Lit(syn::ExprLit {
			lit: syn::Lit::Str(literal),
			..
		}) = &doc.value
		{
			// rustdoc trims each line the same way
			lines.push(literal.value().trim().to_owned());
		}
	}

	let mut lines = lines.into_iter().filter(|line| !line.is_empty());

	let Some(summary) = lines.next() else {
		return Err(syn::Error::new(
			function.sig.ident.span(),
			"routes must have a doc comment, its first line is used as the summary",
		));
	};

	let description = lines.collect::<Vec<_>>().join(" ");
	let description = if description.is_empty() {
		summary.clone()
	} else {
		description
	};

	Ok((summary, description))
}
