use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Describe whether a tag expects an end tag after it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingRequirement {
    /// Never takes content, `[hr]`.
    ///
    /// A later `[/hr]` is not treated as its end tag.
    #[default]
    None,

    /// Must be closed, `[b]...[/b]`.
    ///
    /// An unclosed one falls back to plain text.
    Required,

    /// May be closed, `[band id=1]` or `[band]...[/band]`.
    ///
    /// An unclosed one stays a tag without content.
    Optional,
}

/// Tags in the built-in registry.
const DEFAULT_TAGS: &[(&str, ClosingRequirement)] = &[
    ("album", ClosingRequirement::Optional),
    ("article", ClosingRequirement::Optional),
    ("artiest", ClosingRequirement::Optional),
    ("b", ClosingRequirement::Required),
    ("band", ClosingRequirement::Optional),
    ("bandcamp", ClosingRequirement::Required),
    ("br", ClosingRequirement::None),
    ("center", ClosingRequirement::Required),
    ("color", ClosingRequirement::Required),
    ("date", ClosingRequirement::Optional),
    ("email", ClosingRequirement::Required),
    ("font", ClosingRequirement::Required),
    ("glow", ClosingRequirement::Required),
    ("hr", ClosingRequirement::None),
    ("i", ClosingRequirement::Required),
    ("img", ClosingRequirement::Required),
    ("left", ClosingRequirement::Required),
    ("list", ClosingRequirement::Required),
    ("mention", ClosingRequirement::Optional),
    ("noparse", ClosingRequirement::Required),
    ("quote", ClosingRequirement::Required),
    ("review", ClosingRequirement::Optional),
    ("right", ClosingRequirement::Required),
    ("s", ClosingRequirement::Required),
    ("size", ClosingRequirement::Required),
    ("soundcloud", ClosingRequirement::Required),
    ("spotify", ClosingRequirement::Required),
    ("table", ClosingRequirement::Required),
    ("td", ClosingRequirement::Required),
    ("thread", ClosingRequirement::Optional),
    ("tr", ClosingRequirement::Required),
    ("url", ClosingRequirement::Required),
    ("user", ClosingRequirement::Optional),
    ("vimeo", ClosingRequirement::Required),
    ("youtube", ClosingRequirement::Required),
];

/// Known tag names and their [`ClosingRequirement`].
///
/// A tag name not in the registry is invalid, such tags are parsed as plain words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRegistry {
    tags: HashMap<String, ClosingRequirement>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        DEFAULT_TAGS
            .iter()
            .map(|(name, requirement)| (name.to_string(), *requirement))
            .collect()
    }
}

impl FromIterator<(String, ClosingRequirement)> for TagRegistry {
    fn from_iter<T: IntoIterator<Item = (String, ClosingRequirement)>>(iter: T) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

impl Extend<(String, ClosingRequirement)> for TagRegistry {
    fn extend<T: IntoIterator<Item = (String, ClosingRequirement)>>(&mut self, iter: T) {
        self.tags.extend(iter)
    }
}

impl TagRegistry {
    /// Construct a registry without any tag, every tag is invalid.
    pub fn empty() -> Self {
        Self {
            tags: HashMap::new(),
        }
    }

    /// Register `name`, replace the previous requirement if any.
    pub fn insert(&mut self, name: impl Into<String>, requirement: ClosingRequirement) {
        self.tags.insert(name.into(), requirement);
    }

    /// Builder style [`TagRegistry::insert`].
    pub fn with(mut self, name: impl Into<String>, requirement: ClosingRequirement) -> Self {
        self.insert(name, requirement);
        self
    }

    /// Check `name` is a registered tag or not.
    pub fn is_valid(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    /// Get the requirement of `name`.
    ///
    /// Unknown names are [`ClosingRequirement::None`], check [`TagRegistry::is_valid`] first.
    pub fn requirement(&self, name: &str) -> ClosingRequirement {
        self.tags.get(name).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ClosingRequirement)> {
        self.tags.iter().map(|(name, req)| (name.as_str(), *req))
    }
}
