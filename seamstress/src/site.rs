use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;

use stitch::rayon::prelude::*;
use stitch::{err, error};
use stitch::error::{Chainable, Error, Result};
use stitch::clock::{parse_instant, Clock, FixedClock, SystemClock};
use stitch::feed::{Container, EventFeed, FeedState, FeedTemplates};
use stitch::fetch::FsFetch;
use stitch::fragment::FragmentStore;
use stitch::locale::{Catalog, Locale};
use stitch::markup::{Document, Snippet};
use stitch::page::Assembler;

use crate::config::Settings;

#[derive(Debug)]
pub struct Seamstress {
    pub input: PathBuf,
    pub settings: Settings,
    pub now: NaiveDateTime,
    pub locale: Locale,
}

/// What a build produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub pages: usize,
    pub assets: usize,
    pub feed: FeedState,
}

impl Seamstress {
    pub fn new<P: AsRef<Path>>(input: P, now: Option<&str>, locale: Option<&str>) -> Result<Self> {
        let input = input.as_ref().to_path_buf();
        if !input.is_dir() {
            return err! {
                "site root must be an existing directory",
                "path" => input.display(),
            };
        }

        let settings = Settings::discover(&input)?;
        let now = match now {
            Some(now) => parse_instant(now)?,
            None => SystemClock.now(),
        };

        let locale = Locale::new(locale.unwrap_or(&settings.locale));
        Ok(Seamstress { input, settings, now, locale })
    }

    /// The event feed for this site, reading from the site root.
    pub fn feed(&self) -> Result<EventFeed<FsFetch>> {
        let settings = &self.settings;
        let templates = match &settings.templates {
            Some(dir) => FeedTemplates::load(self.input.join(dir))?,
            None => FeedTemplates::default(),
        };

        let mut feed = EventFeed::new(FsFetch::new(&self.input), settings.feed.as_str())
            .policy(settings.policy)
            .clock(FixedClock(self.now))
            .locale(self.locale.clone())
            .templates(Arc::new(templates))
            .contact(settings.contact.as_str());

        let locales = self.input.join(&settings.locales);
        if locales.is_dir() {
            feed = feed.lookup(Catalog::load(&locales)?);
        }

        Ok(feed)
    }

    /// Runs the feed pipeline once.
    pub async fn render_events(&self) -> Result<(FeedState, Container)> {
        let feed = self.feed()?;
        let state = feed.reload().await;
        Ok((state, feed.mount().clone()))
    }

    /// Every file in the site that's part of the output, relative to the root.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let skip = |path: &Path| {
            let hidden = path.components().any(|c| match c {
                Component::Normal(name) => name.to_string_lossy().starts_with('.'),
                _ => false,
            });

            let internal = path.starts_with(&self.settings.locales)
                || self.settings.templates.as_ref().map_or(false, |dir| path.starts_with(dir));

            hidden || internal
                || path == Path::new(crate::CONFIG_FILE)
                || path == Path::new(&self.settings.partials)
        };

        let mut files = vec![];
        for entry in jwalk::WalkDir::new(&self.input).sort(true) {
            let entry = entry.map_err(Error::from_std)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&self.input)
                .map_err(|e| error!("walked outside of site root", e, "path" => path.display()))?;

            if !skip(relative) {
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Composes every page into `output` and copies everything else.
    pub async fn build<P: AsRef<Path>>(&self, output: P) -> Result<Summary> {
        let output = output.as_ref();
        let start = std::time::Instant::now();
        let files = self.discover()?;
        tracing::info!(files = files.len(), ms = start.elapsed().as_millis(), "discovered site");

        let assembler = Assembler::new().partials(self.settings.partials.as_str());
        let store = match assembler.fetch_store(&FsFetch::new(&self.input)).await {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!("pages will keep their mount points:\n{e}");
                None
            }
        };

        let (state, container) = self.render_events().await?;
        tracing::info!(?state, ms = start.elapsed().as_millis(), "rendered event feed");

        let render = std::time::Instant::now();
        let pages = files.par_iter()
            .map(|path| -> Result<bool> {
                let (from, to) = (self.input.join(path), output.join(path));
                if let Some(parent) = to.parent() {
                    std::fs::create_dir_all(parent)?;
                }

                if path.extension().map_or(true, |ext| ext != "html") {
                    std::fs::copy(&from, &to)?;
                    return Ok(false);
                }

                let html = std::fs::read_to_string(&from)?;
                let page = self.compose(&html, path, store.as_ref(), &assembler, &container);
                std::fs::write(&to, page).chain_with(|| error! {
                    "failed to write page",
                    "path" => to.display(),
                })?;

                Ok(true)
            })
            .collect::<Result<Vec<bool>>>()?;

        let summary = Summary {
            pages: pages.iter().filter(|&&page| page).count(),
            assets: pages.iter().filter(|&&page| !page).count(),
            feed: state,
        };

        tracing::info!(ms = render.elapsed().as_millis(), pages = summary.pages, "composed pages");
        tracing::info!(ms = start.elapsed().as_millis(), "total time");
        Ok(summary)
    }

    fn compose(
        &self,
        html: &str,
        path: &Path,
        store: Option<&FragmentStore>,
        assembler: &Assembler,
        container: &Container,
    ) -> String {
        let location: String = path.components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(format!("/{}", name.to_string_lossy())),
                _ => None,
            })
            .collect();

        let mut document = Document::parse(html);
        if let Some(store) = store {
            let mut host = |snippet: &Snippet| tracing::debug!(
                page = %location,
                src = snippet.src().unwrap_or("<inline>"),
                "activated snippet"
            );

            assembler.assemble_with(store, &mut document, &location, &mut host);
        }

        if container.mount_into(&mut document, &self.settings.container) {
            tracing::debug!(page = %location, "mounted event feed");
        }

        document.to_string()
    }
}
