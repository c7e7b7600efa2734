use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Chainable, Result};
use crate::feed::EventFeed;
use crate::fetch::Fetch;

/// The page's current locale tag, observable by any number of subscribers.
///
/// Clones share the same value.
#[derive(Debug, Clone)]
pub struct Locale {
    tx: Arc<watch::Sender<Arc<str>>>,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::new("en")
    }
}

impl Locale {
    pub fn new(tag: impl Into<Arc<str>>) -> Self {
        let (tx, _) = watch::channel(tag.into());
        Locale { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Arc<str> {
        self.tx.borrow().clone()
    }

    /// Switches to `tag`. Subscribers are only notified if the tag changed.
    /// Returns whether it did.
    pub fn set(&self, tag: impl Into<Arc<str>>) -> bool {
        let tag = tag.into();
        self.tx.send_if_modified(|current| {
            if *current == tag {
                return false;
            }

            tracing::debug!(from = %current, to = %tag, "locale changed");
            *current = tag;
            true
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<str>> {
        self.tx.subscribe()
    }
}

/// Localized text by locale tag and dotted key.
pub trait Lookup: Send + Sync {
    fn lookup(&self, locale: &str, key: &str) -> Option<String>;
}

impl<F> Lookup for F
    where F: Fn(&str, &str) -> Option<String> + Send + Sync
{
    fn lookup(&self, locale: &str, key: &str) -> Option<String> {
        self(locale, key)
    }
}

/// Translations read from `<tag>.toml` files.
///
/// Nested tables name keys by path: `[events] empty = "..."` is
/// `events.empty`, and `[events.month] 1 = "..."` is `events.month.1`.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    locales: FxHashMap<String, FxHashMap<String, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Loads every `*.toml` file directly inside `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut catalog = Catalog::new();
        let entries = std::fs::read_dir(dir)
            .chain_with(|| error!("failed to read locale directory", "path" => dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "toml") {
                continue;
            }

            let Some(tag) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            let source = std::fs::read_to_string(&path)?;
            catalog.parse(tag, &source)
                .chain_with(|| error!("invalid locale file", "path" => path.display()))?;
        }

        tracing::debug!(locales = catalog.locales.len(), "loaded locale catalog");
        Ok(catalog)
    }

    /// Adds the translations in the TOML document `source` to `tag`.
    pub fn parse(&mut self, tag: &str, source: &str) -> Result<()> {
        let table: toml::Table = toml::from_str(source)?;
        let strings = self.locales.entry(tag.to_owned()).or_default();
        flatten(&mut String::new(), &table, strings);
        Ok(())
    }

    pub fn insert(&mut self, tag: &str, key: impl Into<String>, text: impl Into<String>) {
        self.locales.entry(tag.to_owned())
            .or_default()
            .insert(key.into(), text.into());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(|tag| tag.as_str())
    }
}

fn flatten(prefix: &mut String, table: &toml::Table, into: &mut FxHashMap<String, String>) {
    for (key, value) in table {
        let len = prefix.len();
        if !prefix.is_empty() {
            prefix.push('.');
        }

        prefix.push_str(key);
        match value {
            toml::Value::Table(table) => flatten(prefix, table, into),
            toml::Value::String(text) => { into.insert(prefix.clone(), text.clone()); }
            toml::Value::Array(_) => tracing::warn!(key = %prefix, "ignoring array in locale file"),
            other => { into.insert(prefix.clone(), other.to_string()); }
        }

        prefix.truncate(len);
    }
}

impl Lookup for Catalog {
    /// Falls back from a regional tag like `fr-CA` to its language, `fr`.
    fn lookup(&self, locale: &str, key: &str) -> Option<String> {
        let language = locale.split(['-', '_']).next().unwrap_or(locale);
        [locale, language].into_iter()
            .filter_map(|tag| self.locales.get(tag))
            .find_map(|strings| strings.get(key))
            .cloned()
    }
}

/// Re-renders `feed` every time the locale it renders in changes.
///
/// Must be called from within a [`tokio::task::LocalSet`]. Each change starts
/// its own reload without waiting on earlier ones.
pub fn listen<F>(feed: Arc<EventFeed<F>>) -> JoinHandle<()>
    where F: Fetch + 'static
{
    let mut changes = feed.current_locale().subscribe();
    tokio::task::spawn_local(async move {
        while changes.changed().await.is_ok() {
            let tag = changes.borrow_and_update().clone();
            tracing::debug!(locale = %tag, "reloading event feed");

            let feed = feed.clone();
            tokio::task::spawn_local(async move {
                feed.reload().await;
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use tokio::task::LocalSet;

    use super::*;
    use crate::clock::{parse_instant, FixedClock};
    use crate::feed::FeedState;
    use crate::fetch::Response;

    struct Empty;

    impl Fetch for Empty {
        async fn fetch(&self, _: &str) -> Result<Response> {
            tokio::task::yield_now().await;
            Ok(Response::ok("[]"))
        }
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.parse("fr", r#"
            [events]
            empty = "Aucun événement à venir."

            [events.month]
            3 = "mars"
        "#).unwrap();

        catalog.insert("fr-CA", "events.empty", "Rien de prévu.");
        catalog
    }

    #[test]
    fn catalog_flattens_and_falls_back_to_language() {
        let catalog = catalog();
        assert_eq!(catalog.lookup("fr", "events.month.3").as_deref(), Some("mars"));
        assert_eq!(catalog.lookup("fr-CA", "events.empty").as_deref(), Some("Rien de prévu."));
        assert_eq!(catalog.lookup("fr-CA", "events.month.3").as_deref(), Some("mars"));
        assert_eq!(catalog.lookup("de", "events.empty"), None);
        assert_eq!(catalog.lookup("fr", "events"), None);
    }

    #[test]
    fn catalog_loads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("es.toml"), "[events]\nerror = \"Error\"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a locale").unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();
        assert_eq!(catalog.tags().collect::<Vec<_>>(), ["es"]);
        assert_eq!(catalog.lookup("es", "events.error").as_deref(), Some("Error"));

        std::fs::write(dir.path().join("bad.toml"), "[events").unwrap();
        assert!(Catalog::load(dir.path()).is_err());
    }

    #[test]
    fn locale_only_notifies_on_change() {
        let locale = Locale::default();
        let mut rx = locale.subscribe();
        assert!(!locale.set("en"));
        assert!(!rx.has_changed().unwrap());

        assert!(locale.clone().set("fr"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(&*locale.current(), "fr");
    }

    #[tokio::test]
    async fn locale_changes_rerender_feed() {
        LocalSet::new().run_until(async {
            let locale = Locale::new("en");
            let now = parse_instant("2024-06-15").unwrap();
            let feed = Arc::new(EventFeed::new(Empty, "events.json")
                .clock(FixedClock(now))
                .locale(locale.clone())
                .lookup(catalog()));

            let listener = listen(feed.clone());
            settle().await;
            assert_eq!(feed.state(), FeedState::Idle);

            locale.set("fr");
            settle().await;
            assert_eq!(feed.state(), FeedState::Empty);
            assert_eq!(&*feed.current_locale().current(), "fr");
            assert!(feed.mount().html().contains("Aucun événement à venir."));

            locale.set("fr");
            settle().await;
            assert_eq!(feed.mount().replacements(), 1);

            locale.set("fr-CA");
            settle().await;
            assert!(feed.mount().html().contains("Rien de prévu."));
            assert_eq!(feed.mount().replacements(), 2);

            listener.abort();
        }).await;
    }
}
