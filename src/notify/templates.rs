//! Email bodies for order lifecycle messages.

use crate::catalog::format_price;
use crate::config::MailConfig;
use crate::domain::aggregates::{Order, OrderStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn order_link(order: &Order, mail: &MailConfig) -> String {
    format!("{}/orders/{}", mail.frontend_url.trim_end_matches('/'), order.id)
}

fn line_rows(order: &Order) -> (String, String) {
    let mut html = String::new();
    let mut text = String::new();
    for line in &order.products {
        let variant: Vec<&str> = [line.size.as_deref(), line.color.as_deref()].into_iter().flatten().collect();
        let variant = if variant.is_empty() { String::new() } else { format!(" ({})", variant.join(", ")) };
        let total = format_price(Some(line.line_total()));
        html.push_str(&format!(
            "<tr><td>{}{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&line.title), escape_html(&variant), line.quantity, total
        ));
        text.push_str(&format!("- {}{} x{}  {}\n", line.title, variant, line.quantity, total));
    }
    (html, text)
}

pub fn order_confirmation(order: &Order, mail: &MailConfig) -> EmailContent {
    let (rows, lines) = line_rows(order);
    let name = &order.shipping_info.name;
    let link = order_link(order, mail);
    let discount_html = if order.discount.is_zero() {
        String::new()
    } else {
        format!("<p>Discount: -{}</p>", format_price(Some(order.discount)))
    };
    let discount_text = if order.discount.is_zero() {
        String::new()
    } else {
        format!("Discount: -{}\n", format_price(Some(order.discount)))
    };
    EmailContent {
        subject: format!("{} order confirmation {}", mail.app_name, order.order_number),
        html: format!(
            "<h2>Thank you for your order, {}!</h2>\
             <p>Order <strong>{}</strong> has been received.</p>\
             <table>{}</table>\
             <p>Subtotal: {}</p>{}<p><strong>Total: {}</strong></p>\
             <p><a href=\"{}\">View your order</a></p>",
            escape_html(name), order.order_number, rows,
            format_price(Some(order.subtotal)), discount_html, format_price(Some(order.total)), link
        ),
        text: format!(
            "Thank you for your order, {name}!\n\nOrder {} has been received.\n\n{lines}\nSubtotal: {}\n{discount_text}Total: {}\n\nView your order: {link}\n",
            order.order_number, format_price(Some(order.subtotal)), format_price(Some(order.total))
        ),
    }
}

fn status_message(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "is waiting to be processed",
        OrderStatus::Processing => "is being prepared",
        OrderStatus::Shipped => "is on its way",
        OrderStatus::Delivered => "has been delivered",
        OrderStatus::Cancelled => "has been cancelled",
    }
}

pub fn status_update(order: &Order, mail: &MailConfig) -> EmailContent {
    let message = status_message(order.status);
    let link = order_link(order, mail);
    EmailContent {
        subject: format!("{} order {} {}", mail.app_name, order.order_number, order.status),
        html: format!(
            "<h2>Hello {},</h2><p>Your order <strong>{}</strong> {}.</p><p><a href=\"{}\">Track your order</a></p>",
            escape_html(&order.shipping_info.name), order.order_number, message, link
        ),
        text: format!(
            "Hello {},\n\nYour order {} {}.\n\nTrack your order: {link}\n",
            order.shipping_info.name, order.order_number, message
        ),
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
