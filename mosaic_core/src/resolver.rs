//! Mapping of tile colors to resource keys.
//!
//! ```rust
//! use mosaic_core::{ResourceResolver, TileColor};
//!
//! let resolver = ResourceResolver::default();
//! assert_eq!(resolver.resolve(&TileColor::new(255, 8, 0)).as_str(), "/color/ff0800");
//! ```

use crate::{ResourceKey, TileColor};

/// Path template used by the mosaic server.
pub const DEFAULT_TEMPLATE: &str = "/color/{color}";

/// Placeholder substituted with the `rrggbb` color key.
pub const COLOR_PLACEHOLDER: &str = "{color}";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceResolver {
	template: String,
}

impl ResourceResolver {
	/// Every occurrence of `{color}` in `template` is replaced by the color key.
	/// A template without placeholder gets the key appended.
	#[must_use]
	pub fn new(template: &str) -> ResourceResolver {
		let template = if template.contains(COLOR_PLACEHOLDER) {
			template.to_string()
		} else {
			format!("{template}{COLOR_PLACEHOLDER}")
		};
		ResourceResolver { template }
	}

	#[must_use]
	pub fn template(&self) -> &str {
		&self.template
	}

	#[must_use]
	pub fn resolve(&self, color: &TileColor) -> ResourceKey {
		ResourceKey::from(self.template.replace(COLOR_PLACEHOLDER, &color.to_hex()))
	}
}

impl Default for ResourceResolver {
	fn default() -> Self {
		ResourceResolver::new(DEFAULT_TEMPLATE)
	}
}
