//! Built-in storefront flow: login, product filtering and sorting, cart,
//! checkout and logout

use crate::ordering::SortOrder;
use crate::step::{Flow, Step};

pub const USERNAME: &str = "myusername";
pub const PASSWORD: &str = "mypassword";

/// Log in from the home page and check the greeting
pub fn login_steps(username: &str, password: &str) -> Vec<Step> {
    vec![
        Step::navigate("/"),
        Step::type_text("#username", username),
        Step::type_text("#password", password),
        Step::click("#login-button"),
        Step::assert_text(".welcome-message", format!("Welcome, {}", username)),
    ]
}

/// Filter the catalogue and check the listing is sorted by price, high to low
pub fn product_steps() -> Vec<Step> {
    vec![
        Step::click_text(".menu", "Products"),
        Step::assert_url("/products"),
        Step::type_text("#filter-input", "Cypress"),
        Step::click("#filter-button"),
        Step::select("#sort-dropdown", "Price: High to Low"),
        Step::assert_count(".product-item", 3),
        Step::assert_each_contains(".product-item", "Cypress Product"),
        Step::assert_sorted(".product-item .price", SortOrder::Descending),
    ]
}

/// Put the first listed product in the cart and place the order
pub fn checkout_steps() -> Vec<Step> {
    vec![
        Step::click(".product-item .add-to-cart-button"),
        Step::assert_text_equals(".cart-items-count", "1"),
        Step::click(".cart-items-count"),
        Step::click(".checkout-button"),
        Step::type_text("#shipping-name", "John Doe"),
        Step::type_text("#shipping-address", "123 Main St"),
        Step::type_text("#shipping-city", "New York"),
        Step::type_text("#shipping-zip", "12345"),
        Step::select("#payment-method", "Credit Card"),
        Step::type_text("#credit-card-number", "1234567890123456"),
        Step::type_text("#credit-card-expiry", "12/24"),
        Step::type_text("#credit-card-cvv", "123"),
        Step::click("#place-order-button"),
        Step::assert_text(
            ".order-confirmation-message",
            "Your order has been placed successfully.",
        ),
    ]
}

pub fn logout_steps() -> Vec<Step> {
    vec![Step::click(".logout-button"), Step::assert_visible(".login-form")]
}

/// The complete storefront journey as one flow
pub fn checkout_flow() -> Flow {
    let mut steps = login_steps(USERNAME, PASSWORD);
    steps.extend(product_steps());
    steps.extend(checkout_steps());
    steps.extend(logout_steps());

    Flow {
        name: "storefront-checkout".to_string(),
        description: "Log in, filter and sort products, check out and log out".to_string(),
        tags: vec!["storefront".to_string(), "checkout".to_string()],
        wait_ms: None,
        steps,
    }
}
