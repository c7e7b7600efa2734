use std::fmt;
use std::sync::Arc;

use derive_more::Deref;

use crate::markup::{Document, Element};

/// The normalized page-file name of a location, e.g. `about.html`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref)]
pub struct PageId(Arc<str>);

impl PageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq<str> for PageId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

#[derive(Debug, Clone)]
pub struct NavRules {
    /// The identity of the root location.
    pub home: Arc<str>,
    /// The page-file suffix appended to bare names.
    pub suffix: Arc<str>,
    /// Class marking navigation links.
    pub link_class: Arc<str>,
    /// Class marking the current navigation link.
    pub current_class: Arc<str>,
    /// The contact page and the anchor on it that footer links point at.
    pub contact: Arc<str>,
    pub contact_anchor: Arc<str>,
    /// Class of the footer menu holding the contact link.
    pub footer_menu_class: Arc<str>,
}

impl Default for NavRules {
    fn default() -> Self {
        NavRules {
            home: "index.html".into(),
            suffix: ".html".into(),
            link_class: "nav-link".into(),
            current_class: "active".into(),
            contact: "contact.html".into(),
            contact_anchor: "privacy".into(),
            footer_menu_class: "footer-menu".into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavActivator {
    pub rules: NavRules,
}

impl NavActivator {
    pub fn new(rules: NavRules) -> Self {
        NavActivator { rules }
    }

    /// Computes the page identity of `location`: its final path segment, the
    /// home page if that's empty, with the page suffix appended if missing.
    pub fn identify(&self, location: &str) -> PageId {
        let bytes = location.as_bytes();
        let path = match memchr::memchr2(b'?', b'#', bytes) {
            Some(i) => &location[..i],
            None => location,
        };

        let segment = match memchr::memrchr(b'/', path.as_bytes()) {
            Some(i) => &path[i + 1..],
            None => path,
        };

        match segment.trim() {
            "" => PageId(self.rules.home.clone()),
            s if s.ends_with(&*self.rules.suffix) => PageId(s.into()),
            s => PageId(format!("{s}{}", self.rules.suffix).into()),
        }
    }

    /// Marks the navigation link targeting the page at `location` as current
    /// and every other as not current. On the contact page, also points footer
    /// links at the contact anchor to the same-page anchor.
    ///
    /// Must run after composition: links in mount points don't exist yet.
    pub fn activate(&self, document: &mut Document, location: &str) -> PageId {
        let page = self.identify(location);
        let marked = self.mark_current(document, &page);
        tracing::debug!(%page, links = marked, "activated navigation");

        if page == *self.rules.contact {
            let rewritten = self.rewrite_contact_links(document);
            tracing::debug!(rewritten, "pointed footer links at same-page anchor");
        }

        page
    }

    fn mark_current(&self, document: &mut Document, page: &PageId) -> usize {
        let rules = &self.rules;
        let mut marked = 0;
        document.walk_mut(&mut |nav| {
            if !nav.is("nav") {
                return;
            }

            nav.walk_mut(&mut |link: &mut Element| {
                if !link.has_class(&rules.link_class) {
                    return;
                }

                if link.attr("href") == Some(page.as_str()) {
                    link.add_class(&rules.current_class);
                    link.attrs.set("aria-current", "page");
                } else {
                    link.remove_class(&rules.current_class);
                    link.attrs.remove("aria-current");
                }

                marked += 1;
            });
        });

        marked
    }

    fn rewrite_contact_links(&self, document: &mut Document) -> usize {
        let rules = &self.rules;
        let target = format!("{}#{}", rules.contact, rules.contact_anchor);
        let anchor = format!("#{}", rules.contact_anchor);

        let mut rewritten = 0;
        document.walk_mut(&mut |footer| {
            if !footer.is("footer") {
                return;
            }

            footer.walk_mut(&mut |menu: &mut Element| {
                if !menu.has_class(&rules.footer_menu_class) {
                    return;
                }

                menu.walk_mut(&mut |a: &mut Element| {
                    if a.is("a") && a.attr("href") == Some(&*target) {
                        a.attrs.set("href", anchor.clone());
                        rewritten += 1;
                    }
                });
            });
        });

        rewritten
    }
}
