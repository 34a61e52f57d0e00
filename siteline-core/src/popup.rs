//! Popup markup construction.
//!
//! A pure function from a resolved [`AddressRecord`] to an HTML fragment:
//! category badges, a heading, the address line, then whichever optional
//! lines the record's details carry. Missing optionals are simply omitted;
//! there are no error conditions. Record data is escaped before it reaches
//! the markup.

use std::fmt::Write as _;

use crate::record::AddressRecord;

/// Render the popup fragment for a record.
///
/// # Examples
/// ```
/// use siteline_core::{render_popup, AddressRecord, RecordDetails, RecordKind};
///
/// let record = AddressRecord::new(
///     "rec1",
///     "Harbour Works",
///     RecordKind::Listing,
///     Some("1 Quay St, Bristol".into()),
///     RecordDetails {
///         distance_miles: Some(3.25),
///         ..RecordDetails::default()
///     },
/// );
/// let html = render_popup(&record);
/// assert!(html.contains("Harbour Works"));
/// assert!(html.contains("3.2 miles away"));
/// assert!(!html.contains("img"));
/// ```
#[must_use]
pub fn render_popup(record: &AddressRecord) -> String {
    let mut html = String::from("<div class=\"siteline-popup\">");

    for category in &record.details.categories {
        let _ = write!(
            html,
            "<span class=\"siteline-badge\">{}</span>",
            escape(category)
        );
    }

    let _ = write!(html, "<h3>{}</h3>", escape(&record.display_name));

    if let Some(address) = &record.address {
        let _ = write!(
            html,
            "<p class=\"siteline-address\">{}</p>",
            escape(address.trim())
        );
    }

    if let Some(requirement) = &record.details.linked_requirement {
        let _ = write!(
            html,
            "<p class=\"siteline-requirement\">For: {}</p>",
            escape(requirement)
        );
    }

    if let Some(miles) = record.details.distance_miles {
        let _ = write!(
            html,
            "<p class=\"siteline-distance\">{miles:.1} miles away</p>"
        );
    }

    if let Some(drive_time) = &record.details.drive_time {
        let _ = write!(
            html,
            "<p class=\"siteline-drive-time\">Drive time: {}</p>",
            escape(drive_time)
        );
    }

    if let Some(url) = &record.details.listing_url {
        let _ = write!(
            html,
            "<a class=\"siteline-visit\" href=\"{}\" target=\"_blank\">View listing</a>",
            escape(url)
        );
    }

    if let Some(image) = &record.details.image_url {
        let _ = write!(
            html,
            "<img class=\"siteline-image\" src=\"{}\" alt=\"{}\">",
            escape(image),
            escape(&record.display_name)
        );
    }

    html.push_str("</div>");
    html
}

/// Escape HTML-significant characters in record data.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
