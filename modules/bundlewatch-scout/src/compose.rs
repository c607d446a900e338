use chrono::{DateTime, Days, Duration, TimeZone};

use bundlewatch_common::{BundleDetail, NotificationPayload, OfferOffset};

/// Items shown in full before the list is cut off.
const MAX_LISTED_ITEMS: usize = 20;

/// Render the notification skeleton for one bundle. Pure and
/// deterministic given identical inputs and reference time; no side
/// effects.
///
/// `reference` is the wall-clock time at the moment the detail was
/// fetched; the offer countdown is relative to it.
pub fn compose<Tz: TimeZone>(detail: &BundleDetail, reference: DateTime<Tz>) -> NotificationPayload {
    let expiry_secs = absolute_expiry(reference, detail.offer_offset).timestamp();

    NotificationPayload {
        title_text: detail.summary.title.clone(),
        url: detail.summary.id.clone(),
        image_url: detail.image_url.clone(),
        expiry_relative_text: format!("<t:{expiry_secs}:R>"),
        expiry_absolute_text: format!("<t:{expiry_secs}:F>"),
        price_line: format!("**Price**: {}", detail.price_text),
        items_line: items_line(&detail.items),
        category_label: capitalize(&detail.summary.category),
    }
}

/// Reference time plus the offer countdown, in calendar terms: whole days
/// first (so DST transitions follow the local calendar), then hours, then
/// minutes.
pub fn absolute_expiry<Tz: TimeZone>(reference: DateTime<Tz>, offset: OfferOffset) -> DateTime<Tz> {
    reference
        .clone()
        .checked_add_days(Days::new(offset.days as u64))
        .and_then(|t| t.checked_add_signed(Duration::hours(offset.hours as i64)))
        .and_then(|t| t.checked_add_signed(Duration::minutes(offset.minutes as i64)))
        .unwrap_or(reference)
}

/// First 20 items, one per line; anything beyond that collapses into a
/// trailing count.
fn items_line(items: &[String]) -> String {
    let mut lines: Vec<String> = items.iter().take(MAX_LISTED_ITEMS).cloned().collect();
    if items.len() > MAX_LISTED_ITEMS {
        lines.push(format!("... and {} others!", items.len() - MAX_LISTED_ITEMS));
    }
    lines.join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundlewatch_common::BundleSummary;
    use chrono::Utc;

    fn detail(items: Vec<String>, offset: OfferOffset) -> BundleDetail {
        BundleDetail {
            summary: BundleSummary {
                id: "https://www.humblebundle.com/games/alpha".to_string(),
                title: "Alpha Bundle".to_string(),
                category: "games".to_string(),
            },
            image_url: "https://cdn.example.com/logo.png".to_string(),
            price_text: "€25".to_string(),
            currency_symbol: "€".to_string(),
            offer_offset: offset,
            items,
        }
    }

    #[test]
    fn expiry_is_calendar_arithmetic() {
        let reference = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let offset = OfferOffset { days: 1, hours: 2, minutes: 30 };

        let expiry = absolute_expiry(reference, offset);
        assert_eq!(expiry, Utc.with_ymd_and_hms(2024, 3, 2, 14, 30, 0).unwrap());
    }

    #[test]
    fn expiry_tokens_share_one_timestamp() {
        let reference = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let offset = OfferOffset { days: 1, hours: 2, minutes: 30 };
        let payload = compose(&detail(vec![], offset), reference);

        let secs = reference.timestamp() + 86400 + 2 * 3600 + 30 * 60;
        assert_eq!(payload.expiry_relative_text, format!("<t:{secs}:R>"));
        assert_eq!(payload.expiry_absolute_text, format!("<t:{secs}:F>"));
    }

    #[test]
    fn composition_is_deterministic() {
        let reference = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let d = detail(vec!["One".to_string()], OfferOffset::default());
        assert_eq!(compose(&d, reference), compose(&d, reference));
    }

    #[test]
    fn twenty_five_items_truncate_with_suffix() {
        let items: Vec<String> = (1..=25).map(|i| format!("Item {i}")).collect();
        let payload = compose(&detail(items, OfferOffset::default()), Utc::now());

        let lines: Vec<&str> = payload.items_line.lines().collect();
        assert_eq!(lines.len(), 21);
        assert_eq!(lines[0], "Item 1");
        assert_eq!(lines[19], "Item 20");
        assert_eq!(lines[20], "... and 5 others!");
    }

    #[test]
    fn twenty_items_render_without_suffix() {
        let items: Vec<String> = (1..=20).map(|i| format!("Item {i}")).collect();
        let payload = compose(&detail(items, OfferOffset::default()), Utc::now());

        let lines: Vec<&str> = payload.items_line.lines().collect();
        assert_eq!(lines.len(), 20);
        assert!(!payload.items_line.contains("others!"));
    }

    #[test]
    fn price_line_embeds_page_currency_verbatim() {
        let payload = compose(&detail(vec![], OfferOffset::default()), Utc::now());
        assert_eq!(payload.price_line, "**Price**: €25");
    }

    #[test]
    fn category_label_is_capitalized() {
        let payload = compose(&detail(vec![], OfferOffset::default()), Utc::now());
        assert_eq!(payload.category_label, "Games");
    }
}
