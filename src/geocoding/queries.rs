//! Ordered search queries for one place, most specific first

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static MUSEUM_WORD: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new("museum")
        .case_insensitive(true)
        .build()
        .unwrap()
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// A category broadening: when the place name contains any keyword
/// (case-insensitive), the rendered templates are appended to the cascade.
///
/// Templates may use `{name}`, `{city}` and `{locale}`. A template that needs
/// `{locale}` is skipped when no secondary locale is configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRule {
    pub keywords: Vec<String>,
    pub templates: Vec<String>,
}

impl QueryRule {
    pub fn new(keywords: &[&str], templates: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
            templates: templates.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn matches(&self, place_name: &str) -> bool {
        let lower = place_name.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && lower.contains(&keyword.to_lowercase()))
    }
}

/// Broadenings used when the configuration does not override them
#[must_use]
pub fn default_query_rules() -> Vec<QueryRule> {
    vec![
        QueryRule::new(&["church", "matthew"], &["church {city}", "bažnyčia {locale}"]),
        QueryRule::new(&["park"], &["park {city}", "{city} regional park"]),
        QueryRule::new(&["restaurant", "cafe"], &["restaurant {city}", "cafe {city}"]),
        QueryRule::new(&["spa"], &["spa {city}", "SPA Vilnius {city}"]),
        QueryRule::new(&["stone", "puntukas"], &["Puntukas {city}", "Puntukas stone"]),
        QueryRule::new(
            &["tree", "canopy", "treetop"],
            &["treetop path {city}", "laju takas"],
        ),
    ]
}

/// Builds the query list tried for a single place
pub struct QueryCascade<'a> {
    name: &'a str,
    city: &'a str,
    locale: Option<&'a str>,
    queries: Vec<String>,
}

impl<'a> QueryCascade<'a> {
    /// Queries for `name` near `city`, in the order they should be tried.
    ///
    /// Blank queries are dropped and duplicates keep their first position.
    #[must_use]
    pub fn build(
        name: &'a str,
        city: &'a str,
        locale: Option<&'a str>,
        rules: &[QueryRule],
    ) -> Vec<String> {
        let mut cascade = Self {
            name: name.trim(),
            city: city.trim(),
            locale: locale.map(str::trim).filter(|l| !l.is_empty()),
            queries: Vec::new(),
        };

        if MUSEUM_WORD.is_match(cascade.name) {
            let without_museum = MUSEUM_WORD.replace_all(cascade.name, " ");
            let without_museum = collapse_whitespace(&without_museum);
            cascade.push_template("{stripped} {city}", &without_museum);
            cascade.push_template("{stripped} {locale}", &without_museum);
            cascade.push_template("museum {city}", &without_museum);
        }

        cascade.push_template("{name} {city}", "");
        cascade.push_template("{name} {locale}", "");
        cascade.push_template("{name}", "");

        for rule in rules.iter().filter(|rule| rule.matches(name)) {
            for template in &rule.templates {
                cascade.push_template(template, "");
            }
        }

        cascade.queries
    }

    fn push_template(&mut self, template: &str, stripped: &str) {
        let Some(query) = self.render(template, stripped) else {
            return;
        };
        if !query.is_empty() && !self.queries.contains(&query) {
            self.queries.push(query);
        }
    }

    fn render(&self, template: &str, stripped: &str) -> Option<String> {
        let mut rendered = template
            .replace("{name}", self.name)
            .replace("{city}", self.city)
            .replace("{stripped}", stripped);
        if rendered.contains("{locale}") {
            rendered = rendered.replace("{locale}", self.locale?);
        }
        Some(collapse_whitespace(&rendered))
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}
