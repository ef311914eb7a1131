use std::fmt::Write;

use anyhow::Result;
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};
use storefront_engine::{
    data_types::{CartItem, Identity, MenuItem},
    CartStore,
    Order,
};

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

pub fn format_identity(identity: &Identity) -> String {
    format!("Signed in as {} <{}>", identity.name, identity.email)
}

pub fn format_menu(items: &[&MenuItem]) -> String {
    if items.is_empty() {
        return "Nothing on the menu matches".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["ID", "Name", "Category", "Price", "Sizes", "Add-ons"]);
    for item in items {
        let sizes = item.sizes.iter().map(|s| format!("{} (+{})", s.name, s.price)).collect::<Vec<String>>();
        let add_ons = item.available_add_ons.iter().map(|a| format!("{} (+{})", a.name, a.price)).collect::<Vec<_>>();
        table.add_row(row![
            item.id,
            item.name,
            item.category,
            r->item.base_price.to_string(),
            sizes.join(", "),
            add_ons.join(", ")
        ]);
    }
    markdown_style(&mut table);
    format!("{table}")
}

pub fn format_orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No orders yet".to_string();
    }
    let mut table = Table::new();
    table.set_titles(row!["Order", "Status", "Items", "Total", "Placed", "Updated"]);
    for order in orders {
        table.add_row(row![
            order.id.as_str(),
            order.status.label(),
            r->order.item_count(),
            r->order.total_amount.to_string(),
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.updated_at.format("%Y-%m-%d %H:%M:%S")
        ]);
    }
    markdown_style(&mut table);
    format!("{table}")
}

pub fn format_cart_line(item: &CartItem) -> String {
    let mut line = format!("{} x {}", item.quantity, item.menu_item.name);
    if let Some(size) = item.chosen_size() {
        line.push_str(&format!(" ({size})"));
    }
    if !item.add_ons.is_empty() {
        let names = item.add_ons.iter().map(|a| a.name.as_str()).collect::<Vec<&str>>();
        line.push_str(&format!(" with {}", names.join(", ")));
    }
    line
}

pub fn format_cart(cart: &CartStore) -> Result<String> {
    let mut f = String::new();
    for item in cart.items() {
        writeln!(f, "{:<50} {:>10}", format_cart_line(item), item.total_price.to_string())?;
    }
    writeln!(f, "{:-<61}", "")?;
    writeln!(f, "{:<50} {:>10}", "Subtotal", cart.subtotal().to_string())?;
    writeln!(f, "{:<50} {:>10}", "Tax", cart.tax().to_string())?;
    writeln!(f, "{:<50} {:>10}", "Total", cart.total().to_string())?;
    Ok(f)
}

pub fn format_order(order: &Order) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "Order {}  [{}]  {}", order.id, order.status.label(), order.delivery_method)?;
    writeln!(f, "Placed {}   Updated {}", order.created_at, order.updated_at)?;
    writeln!(f, "{:-<61}", "")?;
    for item in &order.items {
        writeln!(f, "{:<50} {:>10}", format_cart_line(item), item.total_price.to_string())?;
    }
    writeln!(f, "{:<50} {:>10}", "Total", order.total_amount.to_string())?;
    Ok(f)
}
