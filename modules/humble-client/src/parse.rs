use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

use bundlewatch_common::{normalize_bundle_url, BundleDetail, BundleSummary, OfferOffset};

use crate::error::{HumbleError, Result};

/// Currency-prefixed price as it appears in the tier header, e.g. "€25" or
/// "$30.56". The symbol is whatever the page serves for the visitor's
/// region.
fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([€$£])[0-9]+(?:\.[0-9]+)?").unwrap())
}

/// Parse a catalog category page into bundle summaries, page order
/// preserved.
///
/// The mosaic container must be present; its absence means the page did not
/// render and no partial catalog can be trusted.
pub fn parse_catalog(html: &str, page_url: &str, category: &str) -> Result<Vec<BundleSummary>> {
    let document = Html::parse_document(html);

    let mosaic = Selector::parse(&format!(".js-{category}-mosaic"))
        .map_err(|e| HumbleError::Parse(format!("Bad mosaic selector for {category}: {e}")))?;
    let container = document
        .select(&mosaic)
        .next()
        .ok_or_else(|| HumbleError::Parse(format!("No {category} mosaic on catalog page")))?;

    let tile = Selector::parse("a.full-tile-view").unwrap();
    let name = Selector::parse(".name").unwrap();

    let base = Url::parse(page_url)
        .map_err(|e| HumbleError::Parse(format!("Bad catalog page URL {page_url}: {e}")))?;

    let mut summaries = Vec::new();
    for element in container.select(&tile) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let title = match element.select(&name).next() {
            Some(n) => inner_text(&n),
            None => continue,
        };
        summaries.push(BundleSummary {
            id: normalize_bundle_url(resolved.as_str()),
            title,
            category: category.to_string(),
        });
    }

    Ok(summaries)
}

/// Parse a bundle detail page.
///
/// Logo and price are required; a missing countdown component defaults to
/// zero (the storefront hides the timer once an offer is in its last
/// moments).
pub fn parse_detail(html: &str, summary: &BundleSummary) -> Result<BundleDetail> {
    let document = Html::parse_document(html);

    let logo = Selector::parse(".bundle-logo").unwrap();
    let image_url = document
        .select(&logo)
        .next()
        .and_then(|e| e.value().attr("src"))
        .map(str::to_string)
        .ok_or_else(|| HumbleError::Parse(format!("No bundle logo on {}", summary.id)))?;

    let tier_header = Selector::parse(".tier-header").unwrap();
    let tier_text = document
        .select(&tier_header)
        .next()
        .map(|e| inner_text(&e))
        .ok_or_else(|| HumbleError::Parse(format!("No tier header on {}", summary.id)))?;
    let price_match = price_regex()
        .captures(&tier_text)
        .ok_or_else(|| HumbleError::Parse(format!("No price in tier header on {}", summary.id)))?;
    let price_text = price_match.get(0).unwrap().as_str().to_string();
    let currency_symbol = price_match.get(1).unwrap().as_str().to_string();

    let offer_offset = OfferOffset {
        days: countdown_component(&document, ".js-days"),
        hours: countdown_component(&document, ".js-hours"),
        minutes: countdown_component(&document, ".js-minutes"),
    };

    let item_title = Selector::parse(".item-details .item-title").unwrap();
    let items: Vec<String> = document.select(&item_title).map(|e| inner_text(&e)).collect();

    Ok(BundleDetail {
        summary: summary.clone(),
        image_url,
        price_text,
        currency_symbol,
        offer_offset,
        items,
    })
}

fn countdown_component(document: &Html, selector: &str) -> u32 {
    let sel = Selector::parse(selector).unwrap();
    document
        .select(&sel)
        .next()
        .and_then(|e| inner_text(&e).parse().ok())
        .unwrap_or(0)
}

fn inner_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str) -> BundleSummary {
        BundleSummary {
            id: id.to_string(),
            title: "Test Bundle".to_string(),
            category: "games".to_string(),
        }
    }

    const CATALOG_HTML: &str = r#"
        <div class="js-games-mosaic">
          <a class="full-tile-view" href="/games/alpha?hmb_source=tile">
            <span class="name">Alpha Bundle</span>
          </a>
          <a class="full-tile-view" href="https://www.humblebundle.com/games/beta">
            <span class="name">Beta Bundle</span>
          </a>
          <a class="full-tile-view"><span class="name">No href, skipped</span></a>
        </div>
    "#;

    #[test]
    fn catalog_resolves_and_normalizes_urls() {
        let summaries =
            parse_catalog(CATALOG_HTML, "https://www.humblebundle.com/games", "games").unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "https://www.humblebundle.com/games/alpha");
        assert_eq!(summaries[0].title, "Alpha Bundle");
        assert_eq!(summaries[1].id, "https://www.humblebundle.com/games/beta");
        assert!(summaries.iter().all(|s| s.category == "games"));
    }

    #[test]
    fn catalog_without_mosaic_is_an_error() {
        let err = parse_catalog("<div></div>", "https://www.humblebundle.com/games", "games")
            .unwrap_err();
        assert!(matches!(err, HumbleError::Parse(_)));
    }

    const DETAIL_HTML: &str = r#"
        <img class="bundle-logo" src="https://cdn.example.com/logo.png">
        <div class="tier-header">Pay €25 or more</div>
        <span class="js-days">1</span>
        <span class="js-hours">2</span>
        <span class="js-minutes">30</span>
        <div class="item-details"><div class="item-title">Game One</div></div>
        <div class="item-details"><div class="item-title">Game Two</div></div>
    "#;

    #[test]
    fn detail_extracts_all_fields() {
        let detail = parse_detail(DETAIL_HTML, &summary("https://x.test/games/a")).unwrap();
        assert_eq!(detail.image_url, "https://cdn.example.com/logo.png");
        assert_eq!(detail.price_text, "€25");
        assert_eq!(detail.currency_symbol, "€");
        assert_eq!(detail.offer_offset, OfferOffset { days: 1, hours: 2, minutes: 30 });
        assert_eq!(detail.items, vec!["Game One", "Game Two"]);
    }

    #[test]
    fn detail_missing_countdown_defaults_to_zero() {
        let html = r#"
            <img class="bundle-logo" src="https://cdn.example.com/logo.png">
            <div class="tier-header">Pay $12.50 or more</div>
        "#;
        let detail = parse_detail(html, &summary("https://x.test/games/a")).unwrap();
        assert_eq!(detail.offer_offset, OfferOffset::default());
        assert_eq!(detail.price_text, "$12.50");
        assert_eq!(detail.currency_symbol, "$");
        assert!(detail.items.is_empty());
    }

    #[test]
    fn detail_without_price_is_an_error() {
        let html = r#"
            <img class="bundle-logo" src="https://cdn.example.com/logo.png">
            <div class="tier-header">Coming soon</div>
        "#;
        let err = parse_detail(html, &summary("https://x.test/games/a")).unwrap_err();
        assert!(matches!(err, HumbleError::Parse(_)));
    }
}
