//! Scripted in-memory page shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use flowcheck::{Driver, ElementHandle, FlowError, FlowResult};

/// What the page currently shows
#[derive(Debug, Default)]
pub struct StubPage {
    pub url: String,
    /// Text of every element matching a selector, in document order
    pub elements: HashMap<String, Vec<String>>,
    pub hidden: HashSet<String>,
    pub inputs: HashMap<String, String>,
}

impl StubPage {
    pub fn show(&mut self, selector: &str, texts: &[&str]) {
        self.elements
            .insert(selector.to_string(), texts.iter().map(|t| t.to_string()).collect());
    }

    pub fn show_owned(&mut self, selector: &str, texts: Vec<String>) {
        self.elements.insert(selector.to_string(), texts);
    }

    pub fn remove(&mut self, selector: &str) {
        self.elements.remove(selector);
    }

    pub fn input(&self, selector: &str) -> &str {
        self.inputs.get(selector).map(String::as_str).unwrap_or("")
    }

    fn matches(&self, selector: &str) -> Vec<String> {
        self.elements.get(selector).cloned().unwrap_or_default()
    }
}

type Reaction = Box<dyn FnMut(&mut StubPage) + Send>;

/// Driver over a [`StubPage`] that changes the page in response to clicks,
/// selections and visits, and logs every call it receives
#[derive(Default)]
pub struct StubDriver {
    pub page: StubPage,
    pub calls: Vec<String>,
    pub waits: Vec<Duration>,
    reactions: HashMap<String, Reaction>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// React to a click on `selector`
    pub fn on_click(mut self, selector: &str, f: impl FnMut(&mut StubPage) + Send + 'static) -> Self {
        self.reactions.insert(format!("click {}", selector), Box::new(f));
        self
    }

    /// React to a click on the match of `selector` containing `text`
    pub fn on_click_text(
        mut self,
        selector: &str,
        text: &str,
        f: impl FnMut(&mut StubPage) + Send + 'static,
    ) -> Self {
        self.reactions
            .insert(format!("click {} {}", selector, text), Box::new(f));
        self
    }

    pub fn on_select(
        mut self,
        selector: &str,
        label: &str,
        f: impl FnMut(&mut StubPage) + Send + 'static,
    ) -> Self {
        self.reactions
            .insert(format!("select {} {}", selector, label), Box::new(f));
        self
    }

    pub fn on_visit(mut self, url: &str, f: impl FnMut(&mut StubPage) + Send + 'static) -> Self {
        self.reactions.insert(format!("visit {}", url), Box::new(f));
        self
    }

    pub fn with_elements(mut self, selector: &str, texts: &[&str]) -> Self {
        self.page.show(selector, texts);
        self
    }

    fn record(&mut self, call: String) {
        if let Some(reaction) = self.reactions.get_mut(&call) {
            reaction(&mut self.page);
        }
        self.calls.push(call);
    }

    fn require(&self, selector: &str) -> FlowResult<()> {
        if self.page.elements.contains_key(selector) {
            Ok(())
        } else {
            Err(FlowError::interaction(selector, "no such element"))
        }
    }
}

#[async_trait]
impl Driver for StubDriver {
    async fn visit(&mut self, url: &str, wait: Duration) -> FlowResult<()> {
        self.waits.push(wait);
        self.page.url = format!("http://shop.test{}", url);
        self.record(format!("visit {}", url));
        Ok(())
    }

    async fn find(&mut self, selector: &str, wait: Duration) -> FlowResult<Vec<ElementHandle>> {
        self.waits.push(wait);
        Ok(ElementHandle::all(selector, self.page.matches(selector).len()))
    }

    async fn type_text(&mut self, selector: &str, text: &str, _wait: Duration) -> FlowResult<()> {
        self.require(selector)?;
        self.page
            .inputs
            .entry(selector.to_string())
            .or_default()
            .push_str(text);
        self.record(format!("type {} {}", selector, text));
        Ok(())
    }

    async fn click(&mut self, selector: &str, _wait: Duration) -> FlowResult<()> {
        self.require(selector)?;
        self.record(format!("click {}", selector));
        Ok(())
    }

    async fn click_text(&mut self, selector: &str, text: &str, _wait: Duration) -> FlowResult<()> {
        self.require(selector)?;
        if !self.page.matches(selector).iter().any(|t| t.contains(text)) {
            return Err(FlowError::interaction(selector, format!("no match containing {:?}", text)));
        }
        self.record(format!("click {} {}", selector, text));
        Ok(())
    }

    async fn select(&mut self, selector: &str, label: &str, _wait: Duration) -> FlowResult<()> {
        self.require(selector)?;
        self.record(format!("select {} {}", selector, label));
        Ok(())
    }

    async fn read_text(&mut self, selector: &str, _wait: Duration) -> FlowResult<String> {
        self.page
            .matches(selector)
            .into_iter()
            .next()
            .ok_or_else(|| FlowError::interaction(selector, "no such element"))
    }

    async fn read_texts(&mut self, selector: &str, _wait: Duration) -> FlowResult<Vec<String>> {
        Ok(self.page.matches(selector))
    }

    async fn read_count(&mut self, selector: &str, _wait: Duration) -> FlowResult<usize> {
        Ok(self.page.matches(selector).len())
    }

    async fn read_visibility(&mut self, selector: &str, _wait: Duration) -> FlowResult<bool> {
        Ok(self.page.elements.contains_key(selector) && !self.page.hidden.contains(selector))
    }

    async fn current_url(&mut self) -> FlowResult<String> {
        Ok(self.page.url.clone())
    }
}

/// Page that greets whoever logs in
pub fn login_page() -> StubDriver {
    StubDriver::new()
        .with_elements("#username", &[""])
        .with_elements("#password", &[""])
        .with_elements("#login-button", &["Log in"])
        .on_click("#login-button", |page| {
            let greeting = format!("Welcome, {}", page.input("#username"));
            page.show_owned(".welcome-message", vec![greeting]);
        })
}

const CATALOGUE: &[(&str, f64)] = &[
    ("Cypress Product Alpha", 20.0),
    ("Garden Hose", 99.0),
    ("Cypress Product Beta", 35.5),
    ("Cypress Product Gamma", 12.25),
    ("Desk Lamp", 5.0),
];

fn render_products(page: &mut StubPage, items: &[(&str, f64)]) {
    page.show_owned(
        ".product-item",
        items
            .iter()
            .map(|(name, price)| format!("{} ${:.2}", name, price))
            .collect(),
    );
    page.show_owned(
        ".product-item .price",
        items.iter().map(|(_, price)| format!("${:.2}", price)).collect(),
    );
    page.show_owned(
        ".product-item .add-to-cart-button",
        items.iter().map(|_| "Add to cart".to_string()).collect(),
    );
}

fn filtered(page: &StubPage) -> Vec<(&'static str, f64)> {
    let needle = page.input("#filter-input").to_string();
    CATALOGUE
        .iter()
        .filter(|(name, _)| name.contains(needle.as_str()))
        .copied()
        .collect()
}

/// A whole storefront: login, catalogue with filter and sort, cart, checkout
/// and logout.
///
/// `sort_works` decides whether choosing "Price: High to Low" actually sorts.
pub fn storefront(sort_works: bool) -> StubDriver {
    login_page()
        .with_elements(".login-form", &[""])
        .on_click("#login-button", |page| {
            let greeting = format!("Welcome, {}", page.input("#username"));
            page.show_owned(".welcome-message", vec![greeting]);
            page.remove(".login-form");
            page.show(".menu", &["Home", "Products", "Account"]);
            page.show(".logout-button", &["Log out"]);
            page.show(".cart-items-count", &["0"]);
        })
        .on_click_text(".menu", "Products", |page| {
            page.url = "http://shop.test/products".to_string();
            page.show("#filter-input", &[""]);
            page.show("#filter-button", &["Filter"]);
            page.show("#sort-dropdown", &["Relevance"]);
            render_products(page, CATALOGUE);
        })
        .on_click("#filter-button", |page| {
            let items = filtered(page);
            render_products(page, &items);
        })
        .on_select("#sort-dropdown", "Price: High to Low", move |page| {
            let mut items = filtered(page);
            if sort_works {
                items.sort_by(|a, b| b.1.total_cmp(&a.1));
            }
            render_products(page, &items);
        })
        .on_click(".product-item .add-to-cart-button", |page| {
            page.show(".cart-items-count", &["1"]);
        })
        .on_click(".cart-items-count", |page| {
            page.url = "http://shop.test/cart".to_string();
            page.show(".checkout-button", &["Checkout"]);
        })
        .on_click(".checkout-button", |page| {
            page.url = "http://shop.test/checkout".to_string();
            for field in ["#shipping-name", "#shipping-address", "#shipping-city", "#shipping-zip"] {
                page.show(field, &[""]);
            }
            page.show("#payment-method", &["Choose"]);
            page.show("#place-order-button", &["Place order"]);
        })
        .on_select("#payment-method", "Credit Card", |page| {
            for field in ["#credit-card-number", "#credit-card-expiry", "#credit-card-cvv"] {
                page.show(field, &[""]);
            }
        })
        .on_click("#place-order-button", |page| {
            let complete = [
                "#shipping-name",
                "#shipping-address",
                "#shipping-city",
                "#shipping-zip",
                "#credit-card-number",
                "#credit-card-expiry",
                "#credit-card-cvv",
            ]
            .iter()
            .all(|field| !page.input(field).is_empty());
            let message = if complete {
                "Your order has been placed successfully."
            } else {
                "Please complete the form."
            };
            page.show(".order-confirmation-message", &[message]);
        })
        .on_click(".logout-button", |page| {
            page.elements.clear();
            page.show(".login-form", &[""]);
            page.url = "http://shop.test/".to_string();
        })
}
