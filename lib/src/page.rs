use std::sync::Arc;

use crate::compose::{PartialComposer, SnippetHost};
use crate::error::{Chainable, Result};
use crate::fetch::Fetch;
use crate::fragment::FragmentStore;
use crate::markup::Document;
use crate::nav::{NavActivator, PageId};

/// Runs the page-load flow: partials are fetched and injected, then
/// navigation is activated for the page's location.
#[derive(Debug, Clone)]
pub struct Assembler {
    pub composer: PartialComposer,
    pub nav: NavActivator,
    pub partials: Arc<str>,
}

impl Default for Assembler {
    fn default() -> Self {
        Assembler {
            composer: PartialComposer::default(),
            nav: NavActivator::default(),
            partials: "partials.html".into(),
        }
    }
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    pub fn composer(mut self, composer: PartialComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn nav(mut self, nav: NavActivator) -> Self {
        self.nav = nav;
        self
    }

    pub fn partials(mut self, target: impl Into<Arc<str>>) -> Self {
        self.partials = target.into();
        self
    }

    /// Fetches and parses the partials document.
    ///
    /// A failure status is only logged: whatever body came back is parsed
    /// like any other, usually yielding an empty store.
    pub async fn fetch_store<F: Fetch>(&self, fetcher: &F) -> Result<FragmentStore> {
        let target = &*self.partials;
        let response = fetcher.fetch(target).await
            .chain_with(|| error!("failed to fetch partials", "target" => target))?;

        if !response.is_success() {
            tracing::warn!(partials = target, status = response.status, "partials request failed");
        }

        Ok(FragmentStore::parse(response.body.as_bytes()))
    }

    /// Composes `document` from `store` and activates its navigation.
    pub fn assemble_with<H>(
        &self,
        store: &FragmentStore,
        document: &mut Document,
        location: &str,
        host: &mut H,
    ) -> PageId
        where H: SnippetHost + ?Sized
    {
        self.composer.compose(store, document, host);
        self.nav.activate(document, location)
    }

    /// Fetches the partials and assembles `document` with them.
    ///
    /// If the partials can't be fetched at all, the failure is logged and the
    /// page is left as is, mount points included; `None` is returned.
    pub async fn assemble<F, H>(
        &self,
        fetcher: &F,
        document: &mut Document,
        location: &str,
        host: &mut H,
    ) -> Option<PageId>
        where F: Fetch, H: SnippetHost + ?Sized
    {
        match self.fetch_store(fetcher).await {
            Ok(store) => Some(self.assemble_with(&store, document, location, host)),
            Err(e) => {
                tracing::warn!("page left unassembled:\n{e}");
                None
            }
        }
    }
}
