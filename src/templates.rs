//! HTML bodies for the emails sent to the shop.
//!
//! Everything customer-supplied is escaped before it lands in markup.

use std::fmt::Write;

use crate::domain::{Email, Order, PrintOrder, ValidatedPrint};

pub fn contact_subject(user_name: &str) -> String {
    format!("New Funko order - {user_name}")
}

/// The contact form sends ready-made HTML, which is forwarded as is.
pub fn contact_email(user_name: &str, email_content: &str) -> Email {
    Email::new(contact_subject(user_name), email_content)
}

pub fn order_email(order_id: &str, order: &Order) -> Email {
    let mut html = String::new();
    let _ = write!(html, "<h1>New Funko order</h1>");
    let _ = write!(html, "<p><strong>Order:</strong> {}</p>", escape_html(order_id));
    let _ = write!(
        html,
        "<p><strong>Customer:</strong> {} ({})</p>",
        escape_html(&order.user_name),
        escape_html(&order.user_phone)
    );
    let _ = write!(
        html,
        "<p><strong>Figure:</strong> {} / {}</p>",
        order.kind, order.variant
    );
    if !order.description.is_empty() {
        let _ = write!(
            html,
            "<p><strong>Description:</strong> {}</p>",
            escape_html(&order.description)
        );
    }
    let _ = write!(
        html,
        "<p><strong>Photo:</strong> <a href=\"{0}\">{0}</a></p>",
        escape_html(&order.photo_url)
    );

    if !order.accessories.is_empty() {
        html.push_str("<h2>Accessories</h2><ul>");
        for (key, entry) in &order.accessories {
            let _ = write!(
                html,
                "<li><strong>{}</strong>: {} <a href=\"{2}\">{2}</a></li>",
                escape_html(key),
                escape_html(&entry.description),
                escape_html(&entry.image_url)
            );
        }
        html.push_str("</ul>");
    }

    let _ = write!(
        html,
        "<p><small>Received {}</small></p>",
        order.created_at.to_rfc3339()
    );

    Email::new(contact_subject(&order.user_name), html)
}

/// Attaches the model when `attach` is set; otherwise says it was left out.
pub fn print_email(order_id: &str, order: &PrintOrder, print: &ValidatedPrint, attach: bool) -> Email {
    let customer = order.user_name.as_deref().unwrap_or(&order.user_email);

    let mut html = String::new();
    let _ = write!(html, "<h1>New 3D print order</h1>");
    let _ = write!(html, "<p><strong>Order:</strong> {}</p>", escape_html(order_id));
    let _ = write!(
        html,
        "<p><strong>Customer:</strong> {} &lt;{}&gt;</p>",
        escape_html(customer),
        escape_html(&order.user_email)
    );
    let _ = write!(
        html,
        "<p><strong>Material:</strong> {} ({})</p>",
        order.material, order.color
    );
    let _ = write!(
        html,
        "<p><strong>File:</strong> {} ({} bytes)</p>",
        escape_html(&order.file_name),
        order.file_size
    );
    if !attach {
        html.push_str("<p>The model file was too large to attach and was not included.</p>");
    }

    let email = Email::new(format!("New 3D print order - {customer}"), html);
    if attach {
        email.with_attachment(print.file.file_name.clone(), print.file.bytes.clone())
    } else {
        email
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
