use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tg_bbcode_parser::{ClosingRequirement, TagRegistry};
use tokio::fs;
use tracing::trace;

/// Tag registry defined in toml.
///
/// ```toml
/// extend_defaults = true
///
/// [tags]
/// spoiler = "required"
/// band = "none"
/// ```
///
/// Without `extend_defaults` only tags listed here are known.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct RegistryConfig {
    /// Merge `tags` over the built-in tags.
    #[serde(default)]
    pub(crate) extend_defaults: bool,

    #[serde(default)]
    pub(crate) tags: HashMap<String, ClosingRequirement>,
}

impl RegistryConfig {
    pub(crate) fn into_registry(self) -> TagRegistry {
        let mut registry = if self.extend_defaults {
            TagRegistry::default()
        } else {
            TagRegistry::empty()
        };
        registry.extend(self.tags);
        registry
    }
}

/// Load the registry config at `path`, or the built-in registry if `path` is `None`.
pub(crate) async fn load_registry(path: Option<&str>) -> Result<TagRegistry> {
    let Some(path) = path else {
        return Ok(TagRegistry::default());
    };
    let data = fs::read_to_string(path)
        .await
        .context("when reading registry file")?;
    let config: RegistryConfig =
        toml::from_str(data.as_str()).context("invalid registry config")?;
    trace!("{config:#?}");
    Ok(config.into_registry())
}
