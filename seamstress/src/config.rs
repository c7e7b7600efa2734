use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use stitch::error;
use stitch::error::{Chainable, Result};
use stitch::feed::FeedPolicy;

/// Site settings, read from [`crate::CONFIG_FILE`] at the site root.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The document holding every partial, relative to the site root.
    pub partials: String,
    /// The event feed, relative to the site root.
    pub feed: String,
    /// The `id` of the element the event feed is mounted into.
    pub container: String,
    pub locale: String,
    /// Directory of `<tag>.toml` translations.
    pub locales: PathBuf,
    /// Directory of event template overrides.
    pub templates: Option<PathBuf>,
    pub contact: String,
    pub policy: FeedPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            partials: "partials.html".into(),
            feed: "events.json".into(),
            container: "events".into(),
            locale: "en".into(),
            locales: "locales".into(),
            templates: None,
            contact: "contact.html".into(),
            policy: FeedPolicy::Upcoming,
        }
    }
}

impl Settings {
    pub fn discover(root: &Path) -> Result<Self> {
        let path = root.join(crate::CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Settings::default());
        }

        let source = std::fs::read_to_string(&path)?;
        toml::from_str(&source).chain_with(|| error! {
            "invalid config file",
            "path" => path.display(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::discover(dir.path()).unwrap(), Settings::default());

        let config = "locale = \"fr\"\ncontainer = \"upcoming\"\npolicy = { grace = 7 }\n";
        std::fs::write(dir.path().join(crate::CONFIG_FILE), config).unwrap();
        let settings = Settings::discover(dir.path()).unwrap();
        assert_eq!(settings.locale, "fr");
        assert_eq!(settings.container, "upcoming");
        assert_eq!(settings.policy, FeedPolicy::Grace(7));
        assert_eq!(settings.feed, "events.json");

        std::fs::write(dir.path().join(crate::CONFIG_FILE), "policy = \"sometimes\"").unwrap();
        assert!(Settings::discover(dir.path()).is_err());
    }
}
