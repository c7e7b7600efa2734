#![doc = svgbobdoc::transform!(
//! A toolkit for assembling static pages from shared partials and keeping a
//! date-aware event feed rendered into them.
//!
//! # Overview
//!
//! Stitch has two halves. The first composes pages: a single _partials_
//! document holds named fragments (`<template id="tpl-NAME">`), and every
//! page marks where each goes with a _mount point_
//! (`<div data-include="NAME">`). The second fetches a JSON list of recurring
//! yearless events, dates them, and renders the upcoming ones into a shared
//! _container_, re-rendering whenever the page's locale changes.
//!
//! ```svgbob
//!  +----------------+         +---------------+
//!  | partials.html  |         |  events.json  |
//!  +-------+--------+         +-------+-------+
//!          |                          |
//!          v                          v
//!  +----------------+         +---------------+      +--------+
//!  | FragmentStore  |         |   EventFeed   |<-----+ Locale |
//!  +-------+--------+         +-------+-------+      +--------+
//!          |                          |
//!          v                          v
//!  +----------------+         +---------------+
//!  |PartialComposer |         |   Container   |
//!  +-------+--------+         +-------+-------+
//!          |                          |
//!          v                          |
//!  +----------------+                 |
//!  |  NavActivator  |                 |
//!  +-------+--------+                 |
//!          |                          |
//!          +-----------+--------------+
//!                      v
//!                 +----------+
//!                 | Document |
//!                 +----------+
//! ```
//!
//! ## Composition
//!
//! A page is assembled as follows:
//!
//! 1. The partials document is fetched and parsed into a [`FragmentStore`].
//!    Fetching is the only step that can fail; if it does, the page is left
//!    with its mount points as inert placeholders.
//! 2. Fragments are injected in a fixed order: `skip`, `preloader`, `navbar`,
//!    `footer`. Each mount point is replaced by a fresh copy of its fragment,
//!    and every script in the copy is handed to a [`SnippetHost`] as it is
//!    inserted. Unknown fragments and mounts are ignored.
//! 3. The navigation link for the current page is marked, once all fragments
//!    are in place.
//!
//! ## Events
//!
//! Every [`EventFeed::reload()`] runs the whole pipeline: fetch, parse, give
//! each `MM-DD` date a year relative to now, keep and sort the upcoming
//! events, and render them. The finished markup replaces the container's
//! contents in one step, so repeated or overlapping reloads never mix.
//! Failures never escape: they are logged and rendered as a message.
//!
//! [`FragmentStore`]: fragment::FragmentStore
//! [`SnippetHost`]: compose::SnippetHost
//! [`EventFeed::reload()`]: feed::EventFeed::reload()
)]

#[macro_use]
pub mod error;
pub mod markup;
pub mod fragment;
pub mod compose;
pub mod nav;
pub mod fetch;
pub mod clock;
pub mod feed;
pub mod locale;
pub mod page;

pub use rayon;
