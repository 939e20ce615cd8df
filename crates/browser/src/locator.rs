//! Serializable locator chains
//!
//! A [`Locator`] is a list of steps the bridge replays against the page, in
//! the same order Playwright's own locator API would chain them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocatorStep {
    /// CSS selector, relative to the previous step
    Css { selector: String },
    First,
    Last,
    Nth { index: usize },
    /// The parent element
    Parent,
    /// ARIA role
    Role { role: String },
    /// Element whose own text matches
    Text { text: String, exact: bool },
    /// Element with the given `title` attribute
    Title { title: String },
    /// Narrow the previous step to elements containing the text
    FilterText { text: String, exact: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator {
    steps: Vec<LocatorStep>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::default().locator(selector)
    }

    /// Element whose `id` attribute equals `id`
    pub fn id(id: &str) -> Self {
        Self::css(format!("[id={}]", quote_attr(id)))
    }

    /// Element whose `name` attribute equals `name`
    pub fn name(name: &str) -> Self {
        Self::css(format!("[name={}]", quote_attr(name)))
    }

    pub fn text(text: impl Into<String>, exact: bool) -> Self {
        Self::default().get_by_text(text, exact)
    }

    /// Descendant whose `name` attribute equals `name`
    pub fn with_name(self, name: &str) -> Self {
        self.locator(format!("[name={}]", quote_attr(name)))
    }

    pub fn locator(self, selector: impl Into<String>) -> Self {
        self.push(LocatorStep::Css {
            selector: selector.into(),
        })
    }

    pub fn first(self) -> Self {
        self.push(LocatorStep::First)
    }

    pub fn last(self) -> Self {
        self.push(LocatorStep::Last)
    }

    pub fn nth(self, index: usize) -> Self {
        self.push(LocatorStep::Nth { index })
    }

    pub fn parent(self) -> Self {
        self.push(LocatorStep::Parent)
    }

    pub fn get_by_role(self, role: impl Into<String>) -> Self {
        self.push(LocatorStep::Role { role: role.into() })
    }

    pub fn get_by_text(self, text: impl Into<String>, exact: bool) -> Self {
        self.push(LocatorStep::Text {
            text: text.into(),
            exact,
        })
    }

    pub fn get_by_title(self, title: impl Into<String>) -> Self {
        self.push(LocatorStep::Title {
            title: title.into(),
        })
    }

    pub fn filter_text(self, text: impl Into<String>, exact: bool) -> Self {
        self.push(LocatorStep::FilterText {
            text: text.into(),
            exact,
        })
    }

    pub fn steps(&self) -> &[LocatorStep] {
        &self.steps
    }

    fn push(mut self, step: LocatorStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// Quote an attribute value for a CSS attribute selector
fn quote_attr(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
