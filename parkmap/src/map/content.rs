//! Info overlay markup for a parking lot marker.

use crate::parking::ParkingLot;

/// Builds the overlay HTML shown when a marker is clicked.
pub fn overlay_html(lot: &ParkingLot) -> String {
    let mut html = String::from("<div style=\"padding:5px;\">");
    html.push_str(&format!("<strong>{}</strong>", escape(&lot.name)));

    if !lot.address.is_empty() {
        html.push_str(&format!("<br>{}", escape(&lot.address)));
    }

    let spaces = match lot.available {
        Some(available) => format!("{} / {} spaces free", available, lot.capacity),
        None => format!("{} spaces", lot.capacity),
    };
    html.push_str(&format!("<br>{}", spaces));

    if let Some(hours) = &lot.operating_hours {
        html.push_str(&format!("<br>{}", escape(hours)));
    }
    if let Some(phone) = &lot.phone {
        html.push_str(&format!("<br>{}", escape(phone)));
    }

    html.push_str("</div>");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
