use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::core::projection::{Conversion, CubemapLayout, Projection};
use crate::error::ConvertError;

/// Settings read from an optional TOML file. Command-line flags win over
/// anything set here.
///
/// ```toml
/// [conversion]
/// from = "latlong"
/// to = "cubemap"
/// layout = "separate-faces"
///
/// [render]
/// threads = 8
///
/// [output]
/// atomic_write = false
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    #[serde(default = "default_from")]
    pub from: Projection,
    #[serde(default = "default_to")]
    pub to: Projection,
    #[serde(default)]
    pub layout: CubemapLayout,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: default_to(),
            layout: CubemapLayout::Strip,
        }
    }
}

// The classic lat-long -> cubemap strip run
fn default_from() -> Projection {
    Projection::LatLong
}
fn default_to() -> Projection {
    Projection::Cubemap
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Worker threads; `None` lets rayon pick.
    #[serde(default)]
    pub threads: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_true")]
    pub atomic_write: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            atomic_write: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConvertError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConvertError::Config(format!("failed to parse TOML: {e}")))?;
        if config.render.threads == Some(0) {
            return Err(ConvertError::Config("render.threads must be at least 1".into()));
        }
        Ok(config)
    }

    pub fn conversion(&self) -> Conversion {
        Conversion {
            from: self.conversion.from,
            to: self.conversion.to,
            layout: self.conversion.layout,
        }
    }
}
