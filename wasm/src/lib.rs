//! WebAssembly module for the Catering Operations Platform
//!
//! Lets the dashboard preview the server's arithmetic before submitting:
//! - Menu margins
//! - Purchase and order totals
//! - Remaining balances
//! - Low-stock checks and ingredient draw
//!
//! Amounts cross the boundary as decimal strings so nothing is lost to
//! floating point.

use rust_decimal::Decimal;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("catering-ops wasm loaded"));
}

fn parse(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|_| format!("{} is not a number", field))
}

fn to_js(result: Result<Decimal, String>) -> Result<String, JsValue> {
    result
        .map(|d| d.normalize().to_string())
        .map_err(|e| JsValue::from_str(&e))
}

fn margin(cost: &str, selling: &str) -> Result<Decimal, String> {
    let cost = parse("cost_per_serving", cost)?;
    let selling = parse("selling_price", selling)?;
    margin_percent(cost, selling).map_err(|e| e.to_string())
}

fn purchase_total_of(lines_json: &str) -> Result<Decimal, String> {
    let lines: Vec<PurchaseLineInput> =
        serde_json::from_str(lines_json).map_err(|e| format!("Invalid lines JSON: {}", e))?;
    for line in &lines {
        line.validate().map_err(|e| e.to_string())?;
    }
    purchase_total(&lines).map_err(|e| e.to_string())
}

fn order_total_of(
    guest_count: i32,
    price_per_head: &str,
    lines_json: Option<&str>,
) -> Result<Decimal, String> {
    let price = parse("price_per_head", price_per_head)?;
    let lines: Option<Vec<OrderLineInput>> = lines_json
        .filter(|s| !s.trim().is_empty())
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| format!("Invalid lines JSON: {}", e))?;
    order_total_value(guest_count, price, lines.as_deref()).map_err(|e| e.to_string())
}

fn balance(total: &str, advance: &str) -> Result<Decimal, String> {
    let total = parse("total_value", total)?;
    let advance = parse("advance_received", advance)?;
    remaining_balance(total, advance).map_err(|e| e.to_string())
}

/// Margin percentage for a dish, rounded to two places
#[wasm_bindgen]
pub fn calculate_margin(cost_per_serving: &str, selling_price: &str) -> Result<String, JsValue> {
    to_js(margin(cost_per_serving, selling_price))
}

/// Total of a purchase from a JSON array of lines
#[wasm_bindgen]
pub fn calculate_purchase_total(lines_json: &str) -> Result<String, JsValue> {
    to_js(purchase_total_of(lines_json))
}

/// Contract value: line items when given, otherwise guests × price per head
#[wasm_bindgen]
pub fn calculate_order_total(
    guest_count: i32,
    price_per_head: &str,
    lines_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(order_total_of(guest_count, price_per_head, lines_json.as_deref()))
}

/// What the client still owes after an advance
#[wasm_bindgen]
pub fn calculate_remaining_balance(total_value: &str, advance_received: &str) -> Result<String, JsValue> {
    to_js(balance(total_value, advance_received))
}

/// Stock to draw for a number of servings
#[wasm_bindgen]
pub fn calculate_ingredient_draw(quantity_required: &str, servings: &str) -> Result<String, JsValue> {
    to_js(
        parse("quantity_required", quantity_required).and_then(|per| {
            let n = parse("servings", servings)?;
            ingredient_requirement(per, n).map_err(|e| e.to_string())
        }),
    )
}

/// Whether an item sits at or below its minimum
#[wasm_bindgen]
pub fn is_low_stock(current_stock: &str, minimum_stock: &str) -> bool {
    match (parse("current_stock", current_stock), parse("minimum_stock", minimum_stock)) {
        (Ok(current), Ok(minimum)) => current <= minimum,
        _ => false,
    }
}

/// Empty when the email is acceptable, otherwise the reason
#[wasm_bindgen]
pub fn check_email(email: &str) -> String {
    validate_email(email).err().unwrap_or_default().to_string()
}

/// Empty when the phone number is acceptable, otherwise the reason
#[wasm_bindgen]
pub fn check_phone(phone: &str) -> String {
    validate_phone(phone).err().unwrap_or_default().to_string()
}
