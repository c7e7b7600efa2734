use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use chrono::Datelike;
use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::{Chainable, Result};
use crate::feed::event::ResolvedEvent;
use crate::locale::Lookup;

pub const CARD_TEMPLATE: &str = "event_card.html";
pub const EMPTY_TEMPLATE: &str = "events_empty.html";
pub const ERROR_TEMPLATE: &str = "events_error.html";

const CARD: &str = r#"<a class="event-card" href="{{ url }}">
  <div class="event-date"><span class="event-month">{{ month }}</span><span class="event-day">{{ day }}</span></div>
  <div class="event-info">
    <p class="event-time">{{ time }}</p>
    <p class="event-description">{{ description }}</p>
    {%- if description2 %}
    <p class="event-description2">{{ description2 }}</p>
    {%- endif %}
  </div>
</a>
"#;

const EMPTY: &str = r#"<p class="events-empty">{{ message }}</p>
"#;

const ERROR: &str = r#"<p class="events-error">{{ message }} <a href="{{ contact_url }}">{{ contact }}</a></p>
"#;

pub(crate) const EMPTY_FALLBACK: &str = "No upcoming events at the moment. Check back soon!";
pub(crate) const ERROR_FALLBACK: &str = "We couldn't load events right now. Please try again later or";
pub(crate) const CONTACT_FALLBACK: &str = "contact us";

/// One rendered event card.
#[derive(Debug, Serialize)]
pub struct Card<'a> {
    pub month: String,
    pub day: u32,
    pub time: &'a str,
    pub description: &'a str,
    pub description2: Option<&'a str>,
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    message: &'a str,
    contact: Option<&'a str>,
    contact_url: Option<&'a str>,
}

pub(crate) static BUILT_IN: Lazy<Arc<FeedTemplates>> = Lazy::new(|| Arc::new(FeedTemplates::default()));

/// The templates events are rendered with. Output is HTML-escaped.
#[derive(Debug)]
pub struct FeedTemplates {
    env: Environment<'static>,
}

impl Default for FeedTemplates {
    fn default() -> Self {
        let mut env = Environment::new();
        for (name, source) in [(CARD_TEMPLATE, CARD), (EMPTY_TEMPLATE, EMPTY), (ERROR_TEMPLATE, ERROR)] {
            env.add_template(name, source).expect("built-in templates are valid");
        }

        FeedTemplates { env }
    }
}

impl FeedTemplates {
    pub fn new() -> Self {
        FeedTemplates::default()
    }

    /// The built-in templates, each replaced by the file of the same name in
    /// `dir` if there is one.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut templates = FeedTemplates::default();
        for name in [CARD_TEMPLATE, EMPTY_TEMPLATE, ERROR_TEMPLATE] {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }

            let source = std::fs::read_to_string(&path)?;
            templates.env.add_template_owned(name, source).chain_with(|| error! {
                "invalid event template",
                "path" => path.display(),
            })?;
        }

        Ok(templates)
    }

    fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }

    pub fn card(&self, card: &Card<'_>) -> Result<String> {
        self.render(CARD_TEMPLATE, card)
    }

    pub fn empty(&self, message: &str) -> Result<String> {
        self.render(EMPTY_TEMPLATE, Message { message, contact: None, contact_url: None })
    }

    pub fn error(&self, message: &str, contact: &str, contact_url: &str) -> Result<String> {
        let message = Message { message, contact: Some(contact), contact_url: Some(contact_url) };
        self.render(ERROR_TEMPLATE, message)
    }
}

/// User-visible text: looked up for a locale, with literal fallbacks.
#[derive(Clone, Default)]
pub struct Strings {
    lookup: Option<Arc<dyn Lookup>>,
}

impl std::fmt::Debug for Strings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strings")
            .field("lookup", &self.lookup.is_some())
            .finish()
    }
}

impl Strings {
    pub fn new<L: Lookup + 'static>(lookup: L) -> Self {
        Strings { lookup: Some(Arc::new(lookup)) }
    }

    /// The text for `key` in `locale`, or `fallback`. Empty text counts as
    /// missing.
    pub fn get<'a>(&self, locale: &str, key: &str, fallback: &'a str) -> Cow<'a, str> {
        self.lookup.as_ref()
            .and_then(|lookup| lookup.lookup(locale, key))
            .filter(|text| !text.is_empty())
            .map(Cow::Owned)
            .unwrap_or(Cow::Borrowed(fallback))
    }

    /// The uppercase three-letter month abbreviation of `event`.
    pub fn month(&self, locale: &str, event: &ResolvedEvent) -> String {
        let fallback = event.date.format("%b").to_string();
        let key = format!("events.month.{}", event.date.month());
        self.get(locale, &key, &fallback).to_uppercase()
    }

    pub fn card<'e>(&self, locale: &str, event: &'e ResolvedEvent) -> Card<'e> {
        Card {
            month: self.month(locale, event),
            day: event.date.day(),
            time: &event.event.time,
            description: &event.event.description,
            description2: event.event.description2(),
            url: &event.event.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_instant;
    use crate::feed::event::RawEvent;
    use crate::markup::{to_html, Document};

    fn event(date: &str, description2: Option<&str>) -> ResolvedEvent {
        ResolvedEvent {
            event: RawEvent {
                date: String::new(),
                time: "6:30 PM".into(),
                description: "Tea & <Talk>".into(),
                description2: description2.map(Into::into),
                url: "events/tea.html".into(),
            },
            date: parse_instant(date).unwrap(),
        }
    }

    #[test]
    fn cards_escape_and_omit_missing_description2() {
        let templates = FeedTemplates::new();
        let strings = Strings::default();

        let render = |event: ResolvedEvent| {
            let html = templates.card(&strings.card("en", &event)).unwrap();
            to_html(&Document::parse_fragment(&html))
        };

        let html = render(event("2024-03-09", None));
        assert!(html.contains(r#"href="events/tea.html""#));
        assert!(html.contains(r#"<span class="event-month">MAR</span>"#));
        assert!(html.contains(r#"<span class="event-day">9</span>"#));
        assert!(html.contains("Tea &amp; &lt;Talk&gt;"));
        assert!(!html.contains("event-description2"));

        let html = render(event("2024-03-09", Some("Hall B")));
        assert!(html.contains(r#"<p class="event-description2">Hall B</p>"#));
    }

    #[test]
    fn lookups_fall_back_to_literals() {
        let strings = Strings::new(|locale: &str, key: &str| match (locale, key) {
            ("fr", "events.month.3") => Some("mars".to_string()),
            ("fr", "events.empty") => Some(String::new()),
            _ => None,
        });

        assert_eq!(strings.month("fr", &event("2024-03-09", None)), "MARS");
        assert_eq!(strings.month("de", &event("2024-03-09", None)), "MAR");
        assert_eq!(strings.get("fr", "events.empty", EMPTY_FALLBACK), EMPTY_FALLBACK);
        assert_eq!(Strings::default().get("fr", "events.error", ERROR_FALLBACK), ERROR_FALLBACK);
    }

    #[test]
    fn templates_load_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(EMPTY_TEMPLATE), "<em>{{ message }}</em>").unwrap();

        let templates = FeedTemplates::load(dir.path()).unwrap();
        assert_eq!(templates.empty("none").unwrap(), "<em>none</em>");
        assert!(templates.error("oops", "contact us", "contact.html").unwrap()
            .contains(r#"<a href="contact.html">contact us</a>"#));
    }
}
