use schemars::{gen::SchemaGenerator, schema::Schema, JsonSchema};
use serde::{Deserialize, Deserializer};

/// A field of a partial update.
///
/// A field that is missing from the request body (or sent as `null`) is
/// [`Patch::Absent`] and must be left untouched. Anything else, including an
/// empty string, is [`Patch::Set`] and must be written.
///
/// Use it together with `#[serde(default)]`, since serde does not call
/// [`Deserialize`] for fields that are missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
	Absent,
	Set(T),
}

impl<T> Patch<T> {
	pub fn is_absent(&self) -> bool {
		matches!(self, Self::Absent)
	}

	pub fn into_option(self) -> Option<T> {
		match self {
			Self::Absent => None,
			Self::Set(value) => Some(value),
		}
	}
}

impl<T> Default for Patch<T> {
	fn default() -> Self {
		Self::Absent
	}
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
	T: Deserialize<'de>,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Option::<T>::deserialize(deserializer)?.map_or(Self::Absent, Self::Set))
	}
}

impl<T> JsonSchema for Patch<T>
where
	T: JsonSchema,
{
	fn schema_name() -> String {
		Option::<T>::schema_name()
	}

	fn json_schema(gen: &mut SchemaGenerator) -> Schema {
		Option::<T>::json_schema(gen)
	}

	fn is_referenceable() -> bool {
		false
	}
}

#[cfg(test)]
mod test {
	use serde::Deserialize;
	use serde_json::json;

	use super::Patch;

	#[derive(Deserialize)]
	struct Input {
		#[serde(default)]
		title: Patch<String>,
		#[serde(default)]
		state: Patch<Option<serde_json::Value>>,
	}

	#[test]
	fn test_patch_missing_is_absent() {
		let input: Input = serde_json::from_value(json!({})).unwrap();

		assert!(input.title.is_absent());
		assert!(input.state.is_absent());
	}

	#[test]
	fn test_patch_null_is_absent() {
		let input: Input = serde_json::from_value(json!({ "title": null, "state": null })).unwrap();

		assert!(input.title.is_absent());
		assert!(input.state.is_absent());
	}

	#[test]
	fn test_patch_empty_string_is_set() {
		let input: Input = serde_json::from_value(json!({ "title": "" })).unwrap();

		assert_eq!(input.title, Patch::Set(String::new()));
	}

	#[test]
	fn test_patch_empty_object_is_set() {
		let input: Input = serde_json::from_value(json!({ "state": {} })).unwrap();

		assert_eq!(input.state.into_option(), Some(Some(json!({}))));
	}

	#[test]
	fn test_patch_wrong_type_is_rejected() {
		let input = serde_json::from_value::<Input>(json!({ "title": 5 }));

		assert!(input.is_err());
	}
}
