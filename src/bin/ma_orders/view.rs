//! Text tables of the order lists.

use itertools::Itertools;
use ma_orders::{
    decode::OrderSchema,
    state::AppState,
    types::{FeedOrder, UserOrder},
};

/// Rendering of a derived moving average whose interval is zero.
const UNDEFINED: &str = "undefined";

/// Column appended to the user orders table.
const FEED_COLUMN: &str = "priceFeed";

fn user_order_row(order: &UserOrder, feed_orders: &[FeedOrder]) -> Vec<String> {
    vec![
        order.nonce().to_string(),
        order.index_of_price_feed_order().to_string(),
        order.description().to_string(),
        order.current_amount_a().to_string(),
        order.current_amount_b().to_string(),
        order.user_initial_amount().to_string(),
        order.user_deposit_amount_a().to_string(),
        order.user_deposit_amount_b().to_string(),
        order.price_feed_address().to_string(),
        order.params_address().to_string(),
        order.nonce_before().to_string(),
        order.nonce_after().to_string(),
        order
            .feed_order(feed_orders)
            .map_or("-".to_string(), |feed| feed.description().to_string()),
    ]
}

fn moving_average(value: Option<u32>) -> String {
    value.map_or(UNDEFINED.to_string(), |v| v.to_string())
}

fn feed_order_row(order: &FeedOrder) -> Vec<String> {
    vec![
        order.index().to_string(),
        order.description().to_string(),
        order.data_feed().to_string(),
        order.params_address().to_string(),
        order.token_a().to_string(),
        order.token_b().to_string(),
        order.initial_total_amount().to_string(),
        order.current_total_amount_a().to_string(),
        order.current_total_amount_b().to_string(),
        moving_average(order.ma1()),
        moving_average(order.ma2()),
        order.ma_interval().to_string(),
        order.execution_interval().to_string(),
        order.timestamp().to_string(),
    ]
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .join(" │ ")
}

/// Renders `rows` under `headers`, each column as wide as its widest cell.
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(String::len)
                .chain([header.len()])
                .max()
                .unwrap_or_default()
        })
        .collect();
    let total = widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1);

    let mut out = format!("{:=^total$}\n", format!(" {title} "));
    out.push_str(&line(headers.iter().copied(), &widths));
    out.push('\n');
    out.push_str(&format!("{:-^total$}\n", ""));
    if rows.is_empty() {
        out.push_str("(none)\n");
    }
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

pub fn render_user_orders(state: &AppState) -> String {
    let headers: Vec<&str> = UserOrder::FIELDS.iter().copied().chain([FEED_COLUMN]).collect();
    let rows: Vec<_> = state
        .user_orders()
        .iter()
        .map(|order| user_order_row(order, state.feed_orders()))
        .collect();
    render_table("USER ORDERS", &headers, &rows)
}

pub fn render_feed_orders(state: &AppState) -> String {
    let rows: Vec<_> = state.feed_orders().iter().map(feed_order_row).collect();
    render_table("PRICE FEED ORDERS", FeedOrder::FIELDS, &rows)
}

/// Prints the account line and both tables.
pub fn print_state(state: &AppState) {
    match state.current_account() {
        Some(account) => println!("\naccount: {account}"),
        None => println!("\naccount: not connected"),
    }
    if let Some(count) = state.transaction_count() {
        println!("transactionCount: {count}");
    }
    print!("{}", render_user_orders(state));
    print!("{}", render_feed_orders(state));
}
