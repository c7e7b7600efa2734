//! The event feed: fetch a list of recurring events, give each a concrete
//! date, and render the upcoming ones into a [`Container`].

mod event;
mod policy;
mod render;
mod container;

use std::sync::Arc;

use derive_more::Debug;
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::error::{Chainable, Result};
use crate::fetch::Fetch;
use crate::locale::{Locale, Lookup};
use crate::markup::{Document, Element, Node};

pub use event::*;
pub use policy::*;
pub use render::{Card, FeedTemplates, Strings, CARD_TEMPLATE, EMPTY_TEMPLATE, ERROR_TEMPLATE};
pub use container::*;

use render::{CONTACT_FALLBACK, EMPTY_FALLBACK, ERROR_FALLBACK};

/// Where the most recent run of the pipeline got to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Idle,
    Fetching,
    Rendered { cards: usize },
    Empty,
    Failed,
}

#[derive(Debug)]
pub struct EventFeed<F> {
    fetcher: F,
    source: Arc<str>,
    container: Container,
    policy: FeedPolicy,
    #[debug(ignore)]
    clock: Arc<dyn Clock>,
    locale: Locale,
    strings: Strings,
    templates: Arc<FeedTemplates>,
    contact: Arc<str>,
    state: Mutex<FeedState>,
}

impl<F: Fetch> EventFeed<F> {
    pub fn new(fetcher: F, source: impl Into<Arc<str>>) -> Self {
        EventFeed {
            fetcher,
            source: source.into(),
            container: Container::new(),
            policy: FeedPolicy::default(),
            clock: Arc::new(SystemClock),
            locale: Locale::default(),
            strings: Strings::default(),
            templates: render::BUILT_IN.clone(),
            contact: "contact.html".into(),
            state: Mutex::new(FeedState::Idle),
        }
    }

    pub fn container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    pub fn policy(mut self, policy: FeedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn lookup<L: Lookup + 'static>(mut self, lookup: L) -> Self {
        self.strings = Strings::new(lookup);
        self
    }

    pub fn templates(mut self, templates: Arc<FeedTemplates>) -> Self {
        self.templates = templates;
        self
    }

    /// The page the error message points readers at.
    pub fn contact(mut self, url: impl Into<Arc<str>>) -> Self {
        self.contact = url.into();
        self
    }

    /// The locale this feed renders in.
    pub fn current_locale(&self) -> &Locale {
        &self.locale
    }

    pub fn mount(&self) -> &Container {
        &self.container
    }

    pub fn state(&self) -> FeedState {
        *self.state.lock()
    }

    /// Runs the pipeline from the top: fetch, parse, resolve, filter, sort,
    /// render, and finally swap the output into the container.
    ///
    /// Never fails: faults are logged and rendered as an error message. Runs
    /// may overlap; the container holds the output of whichever finishes last.
    pub async fn reload(&self) -> FeedState {
        *self.state.lock() = FeedState::Fetching;

        let rendered = match self.load().await {
            Ok(events) => self.render_events(&events),
            Err(e) => Err(e),
        };

        let (state, nodes) = rendered.unwrap_or_else(|e| {
            tracing::warn!("event feed unavailable:\n{e}");
            (FeedState::Failed, self.render_failure())
        });

        self.container.replace(nodes);
        *self.state.lock() = state;
        state
    }

    async fn load(&self) -> Result<Vec<ResolvedEvent>> {
        let source = &*self.source;
        let response = self.fetcher.fetch(source).await
            .and_then(|response| response.success(source))
            .chain_with(|| error!("failed to fetch event feed", "source" => source))?;

        let events = RawEvent::read_feed(&response.body)
            .chain_with(|| error!("malformed event feed", "source" => source))?;

        let now = self.clock.now();
        let total = events.len();
        let events = self.policy.apply(events, now);
        tracing::debug!(total, shown = events.len(), %now, "resolved event feed");
        Ok(events)
    }

    fn render_events(&self, events: &[ResolvedEvent]) -> Result<(FeedState, Vec<Node>)> {
        let locale = self.locale.current();
        if events.is_empty() {
            let message = self.strings.get(&locale, "events.empty", EMPTY_FALLBACK);
            let html = self.templates.empty(&message)?;
            return Ok((FeedState::Empty, Document::parse_fragment(&html)));
        }

        let mut html = String::new();
        for event in events {
            html.push_str(&self.templates.card(&self.strings.card(&locale, event))?);
        }

        Ok((FeedState::Rendered { cards: events.len() }, Document::parse_fragment(&html)))
    }

    fn render_failure(&self) -> Vec<Node> {
        let locale = self.locale.current();
        let message = self.strings.get(&locale, "events.error", ERROR_FALLBACK);
        let contact = self.strings.get(&locale, "events.contact", CONTACT_FALLBACK);
        match self.templates.error(&message, &contact, &self.contact) {
            Ok(html) => Document::parse_fragment(&html),
            Err(e) => {
                tracing::warn!("failed to render event feed error message:\n{e}");
                let link = Element::new("a")
                    .with_attr("href", &*self.contact)
                    .with_child(contact.into_owned());

                let p = Element::new("p")
                    .with_attr("class", "events-error")
                    .with_child(format!("{message} "))
                    .with_child(link);

                vec![p.into()]
            }
        }
    }
}
