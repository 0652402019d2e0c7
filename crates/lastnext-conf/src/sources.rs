//! Configuration sources.
//!
//! Each source applies its values on top of the tree built by the sources
//! before it. The tree is a JSON object of sections, each section an object
//! of keys.

use crate::error::{ConfError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

/// A layer of configuration values.
pub trait ConfigSource: Send + Sync {
	/// Apply this source's values onto `config`.
	fn apply(&self, config: &mut Map<String, Value>) -> Result<()>;

	/// Human readable description, used in logs.
	fn description(&self) -> String;
}

/// Recursively merge `overlay` into `base`. Objects merge key by key, any
/// other value replaces the existing one.
pub(crate) fn merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
	for (key, value) in overlay {
		match (base.get_mut(&key), value) {
			(Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
			(_, value) => {
				base.insert(key, value);
			}
		}
	}
}

/// Fixed values, typically the serialized [`Settings::default`](crate::Settings).
#[derive(Debug, Clone, Default)]
pub struct DefaultSource {
	values: Map<String, Value>,
}

impl DefaultSource {
	pub fn new(values: Map<String, Value>) -> Self {
		Self { values }
	}

	/// Defaults built from any serializable value that serializes to an object.
	pub fn from_serialize<T: serde::Serialize>(value: &T) -> Result<Self> {
		match serde_json::to_value(value)? {
			Value::Object(values) => Ok(Self { values }),
			other => Err(ConfError::Validation(format!(
				"defaults must serialize to an object, got {}",
				other
			))),
		}
	}
}

impl ConfigSource for DefaultSource {
	fn apply(&self, config: &mut Map<String, Value>) -> Result<()> {
		merge(config, self.values.clone());
		Ok(())
	}

	fn description(&self) -> String {
		"built-in defaults".to_string()
	}
}

/// TOML file source. A missing file contributes nothing.
#[derive(Debug, Clone)]
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn apply(&self, config: &mut Map<String, Value>) -> Result<()> {
		if !self.path.is_file() {
			tracing::debug!("Settings file {} not found, skipping", self.path.display());
			return Ok(());
		}

		let content = fs::read_to_string(&self.path).map_err(|source| ConfError::Io {
			path: self.path.clone(),
			source,
		})?;
		let table: toml::Table = toml::from_str(&content).map_err(|source| ConfError::Toml {
			path: self.path.clone(),
			source,
		})?;

		if let Value::Object(values) = serde_json::to_value(table)? {
			merge(config, values);
		}
		Ok(())
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Environment variables of the form `<PREFIX><SECTION>_<KEY>`.
///
/// Only keys that already exist in the tree are overridden; the string value
/// is parsed to the type of the value it replaces.
pub struct EnvSource {
	prefix: String,
	vars: Vec<(String, String)>,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self::from_vars(prefix, std::env::vars())
	}

	/// Read from an explicit list of variables.
	pub fn from_vars<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			prefix: prefix.into(),
			vars: vars
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		}
	}

	/// Look up a single variable by its full name.
	pub fn var(&self, name: &str) -> Option<&str> {
		self.vars
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}
}

impl ConfigSource for EnvSource {
	fn apply(&self, config: &mut Map<String, Value>) -> Result<()> {
		for (name, raw) in &self.vars {
			let Some(rest) = name.strip_prefix(&self.prefix) else {
				continue;
			};
			let rest = rest.to_lowercase();
			let Some((section, key)) = rest.split_once('_') else {
				continue;
			};

			let Some(Value::Object(section_map)) = config.get_mut(section) else {
				tracing::debug!("Ignoring {}: unknown section {}", name, section);
				continue;
			};
			let Some(existing) = section_map.get(key) else {
				tracing::debug!("Ignoring {}: unknown key {}.{}", name, section, key);
				continue;
			};

			let value = coerce(name, raw, existing)?;
			section_map.insert(key.to_string(), value);
		}
		Ok(())
	}

	fn description(&self) -> String {
		format!("environment variables with prefix {}", self.prefix)
	}
}

/// Parse `raw` to the JSON type of `existing`.
fn coerce(name: &str, raw: &str, existing: &Value) -> Result<Value> {
	let invalid = |expected: &'static str| ConfError::InvalidValue {
		key: name.to_string(),
		value: raw.to_string(),
		expected,
	};

	match existing {
		Value::Bool(_) => match raw.trim().to_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
			"false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
			_ => Err(invalid("boolean")),
		},
		Value::Number(n) if n.is_u64() => raw
			.trim()
			.parse::<u64>()
			.map(Value::from)
			.map_err(|_| invalid("unsigned integer")),
		Value::Number(n) if n.is_i64() => raw
			.trim()
			.parse::<i64>()
			.map(Value::from)
			.map_err(|_| invalid("integer")),
		Value::Number(_) => raw
			.trim()
			.parse::<f64>()
			.ok()
			.and_then(serde_json::Number::from_f64)
			.map(Value::Number)
			.ok_or_else(|| invalid("number")),
		_ => Ok(Value::String(raw.to_string())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn tree() -> Map<String, Value> {
		match json!({
			"database": { "url": "sqlite://a.db", "max_connections": 1 },
			"media": { "create_dirs": true },
		}) {
			Value::Object(map) => map,
			_ => unreachable!(),
		}
	}

	#[rstest]
	fn test_merge_is_deep() {
		let mut base = tree();
		let overlay = match json!({ "database": { "url": "sqlite://b.db" } }) {
			Value::Object(map) => map,
			_ => unreachable!(),
		};

		merge(&mut base, overlay);

		assert_eq!(base["database"]["url"], "sqlite://b.db");
		assert_eq!(base["database"]["max_connections"], 1);
	}

	#[rstest]
	#[case("LASTNEXT_DATABASE_MAX_CONNECTIONS", "4", "database", "max_connections", json!(4))]
	#[case("LASTNEXT_MEDIA_CREATE_DIRS", "false", "media", "create_dirs", json!(false))]
	#[case("LASTNEXT_DATABASE_URL", "sqlite://c.db", "database", "url", json!("sqlite://c.db"))]
	fn test_env_values_take_existing_type(
		#[case] name: &str,
		#[case] raw: &str,
		#[case] section: &str,
		#[case] key: &str,
		#[case] expected: Value,
	) {
		let mut config = tree();
		let source = EnvSource::from_vars("LASTNEXT_", [(name, raw)]);

		source.apply(&mut config).unwrap();

		assert_eq!(config[section][key], expected);
	}

	#[rstest]
	fn test_env_unknown_and_foreign_keys_ignored() {
		let mut config = tree();
		let source = EnvSource::from_vars(
			"LASTNEXT_",
			[
				("LASTNEXT_ENV", "production"),
				("LASTNEXT_NOPE_KEY", "x"),
				("LASTNEXT_DATABASE_NOPE", "x"),
				("PATH", "/usr/bin"),
			],
		);

		source.apply(&mut config).unwrap();

		assert_eq!(config, tree());
	}

	#[rstest]
	fn test_env_rejects_unparsable_number() {
		let mut config = tree();
		let source = EnvSource::from_vars("LASTNEXT_", [("LASTNEXT_DATABASE_MAX_CONNECTIONS", "many")]);

		let result = source.apply(&mut config);

		assert!(matches!(result, Err(ConfError::InvalidValue { .. })));
	}
}
