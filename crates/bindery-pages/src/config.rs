//! Runtime configuration
//!
//! Both halves of the system read their options from one TOML document:
//!
//! ```toml
//! [ssr]
//! lang = "ja"
//! include_hydration_markers = true
//! root_id = "app"
//!
//! [client]
//! max_notify_depth = 16
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use crate::client::ClientOptions;
use crate::error::{Error, Result};
use crate::ssr::SsrOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

/// Combined server and client options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderyConfig {
	/// Server-side rendering options.
	pub ssr: SsrOptions,
	/// Client runtime options.
	pub client: ClientOptions,
}

impl BinderyConfig {
	/// Parses a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self> {
		toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
	}

	/// Reads and parses a TOML file.
	pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
		let path = path.as_ref();
		let source = fs::read_to_string(path)
			.map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
		let config = Self::from_toml_str(&source)?;
		debug!(path = %path.display(), "loaded configuration");
		Ok(config)
	}

	/// Serializes back to TOML.
	pub fn to_toml_string(&self) -> Result<String> {
		toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
	}
}
