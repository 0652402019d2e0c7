//! Settings builder applying sources in order.

use crate::error::Result;
use crate::sources::ConfigSource;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Applies sources in the order they were added and deserializes the result.
///
/// ```
/// use lastnext_conf::{DefaultSource, EnvSource, Settings, SettingsBuilder};
///
/// let settings: Settings = SettingsBuilder::new()
///     .add_source(DefaultSource::from_serialize(&Settings::default()).unwrap())
///     .add_source(EnvSource::from_vars("LASTNEXT_", [("LASTNEXT_SERVER_ADDR", "0.0.0.0:9000")]))
///     .build()
///     .unwrap();
///
/// assert_eq!(settings.server.addr, "0.0.0.0:9000");
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// The merged tree, before deserialization.
	pub fn build_value(&self) -> Result<Map<String, Value>> {
		let mut config = Map::new();
		for source in &self.sources {
			tracing::debug!("Applying settings from {}", source.description());
			source.apply(&mut config)?;
		}
		Ok(config)
	}

	pub fn build<T: DeserializeOwned>(&self) -> Result<T> {
		let config = self.build_value()?;
		Ok(serde_json::from_value(Value::Object(config))?)
	}
}
