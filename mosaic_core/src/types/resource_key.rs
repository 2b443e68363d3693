use std::fmt;

/// Opaque identifier of a remote resource, as produced by
/// [`ResourceResolver`](crate::ResourceResolver).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ResourceKey {
	fn from(value: &str) -> Self {
		ResourceKey(value.to_string())
	}
}

impl From<String> for ResourceKey {
	fn from(value: String) -> Self {
		ResourceKey(value)
	}
}

impl fmt::Display for ResourceKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
