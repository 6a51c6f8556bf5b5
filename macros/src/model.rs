use darling::{ast, FromDeriveInput, FromField, FromMeta};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Default, FromMeta)]
struct ModelArgs {
	/// Path to the tri-state wrapper used for update fields.
	patch: Option<syn::Path>,
}

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

fn is_doc(attr: &syn::Attribute) -> bool {
	attr.path().is_ident("doc")
}

/// Whether the field is never read from a request body.
fn is_server_owned(attrs: &[syn::Attribute]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
	})
}

pub fn from_input(
	args: proc_macro::TokenStream,
	input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
	let args = if args.is_empty() {
		ModelArgs::default()
	} else {
		let args = match ast::NestedMeta::parse_meta_list(args.into()) {
			Ok(x) => x,
			Err(e) => return e.into_compile_error().into(),
		};

		match ModelArgs::from_list(&args) {
			Ok(x) => x,
			Err(e) => return e.write_errors().into(),
		}
	};

	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let patch = args
		.patch
		.map_or_else(|| quote!(crate::route::model::Patch), |x| quote!(#x));

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
	let update_ident = format_ident!("Update{}", ident);

	let docs = receiver.attrs.iter().filter(|attr| is_doc(attr));

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(&input.ident, "#[model] only supports structs")
			.into_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter(|field| !is_server_owned(&field.attrs))
		.filter_map(|field| Some((field.ident.as_ref()?, field)))
		.collect::<Vec<_>>();

	let update_fields = fields.iter().map(|(ident, field)| {
		let ty = &field.ty;
		let vis = &field.vis;
		let docs = field.attrs.iter().filter(|attr| is_doc(attr));

		quote! {
			#(#docs)*
			#[serde(default)]
			#vis #ident: #patch<#ty>,
		}
	});

	let absent_checks = fields.iter().map(|(ident, _)| {
		quote! { self.#ident.is_absent() }
	});

	quote! {
		#input

		#(#docs)*
		#[derive(Debug, Default, ::serde::Deserialize, ::schemars::JsonSchema)]
		#vis struct #update_ident #generics {
			#(
				#update_fields
			)*
		}

		impl #impl_generics #update_ident #ty_generics #where_clause {
			/// Returns `true` if no field was present in the request.
			pub fn is_empty(&self) -> bool {
				true #(&& #absent_checks)*
			}
		}
	}
	.into()
}
