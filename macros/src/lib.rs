mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
///
/// The first line of the doc comment becomes the summary, the rest becomes the description.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates a new struct `UpdateX` for the model, used for partial updates.
///
/// Every field without `#[serde(skip_deserializing)]` or `#[serde(skip)]` is
/// wrapped in a `Patch`, so a field that was left out of the request can be told
/// apart from one that was sent. Only doc comments are carried over from the model.
///
/// The generated struct also gets an `is_empty` method, which is true when no field was sent.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
