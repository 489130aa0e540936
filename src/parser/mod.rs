//! HTML extraction: one listing card → `ParsedListing`, one results page →
//! the parseable subset of its cards.
//!
//! Idealista marks each ad with an `article[data-adid]` element. The ad id is
//! the only field the parser insists on; every other field degrades to a
//! default when the markup is missing or mangled.

pub mod text;

use crate::models::ParsedListing;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

pub use text::{contains_keyword, extract_number, parse_price};

/// Keywords that flag a garage mention in title or description.
pub const GARAGE_KEYWORDS: &[&str] = &["garaje", "garage", "plaza de garaje", "parking"];
/// Keywords that flag a storage room mention in title or description.
pub const STORAGE_KEYWORDS: &[&str] = &["trastero", "almacén", "almacen", "storage"];

const TITLE_PLACEHOLDER: &str = "Sin título";

fn selector(css: &str) -> Selector {
    // Selectors here are compile-time constants, parse cannot fail.
    Selector::parse(css).unwrap()
}

fn text_of(element: ElementRef<'_>, sel: &Selector) -> Option<String> {
    element.select(sel).next().map(|el| {
        el.text().collect::<String>().trim().to_string()
    })
}

/// Parses a single listing card into a `ParsedListing`.
///
/// Returns `None` only when no element with a non-empty `data-adid` is found;
/// all other fields fall back to `None`/placeholder values. Never panics on
/// malformed fragments.
pub fn parse_property(fragment_html: &str, base_url: &str) -> Option<ParsedListing> {
    let fragment = Html::parse_fragment(fragment_html);
    let article = fragment.select(&selector("article[data-adid]")).next()?;

    let portal_id = article.value().attr("data-adid")?.trim();
    if portal_id.is_empty() {
        return None;
    }

    let title = text_of(article, &selector(".item-link"))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

    let price = text_of(article, &selector(".item-price"))
        .map(|t| parse_price(&t))
        .unwrap_or(0);

    // Detail spans carry rooms, area and bathrooms in no fixed order; each is
    // classified by keyword, first match per category wins.
    let mut rooms = None;
    let mut area_sqm = None;
    let mut bathrooms = None;
    for detail in article.select(&selector(".item-detail")) {
        let text = detail.text().collect::<String>().trim().to_lowercase();
        if text.contains("hab") {
            if rooms.is_none() {
                rooms = extract_number(&text);
            }
        } else if text.contains("m²") || text.contains("m2") {
            if area_sqm.is_none() {
                area_sqm = extract_number(&text);
            }
        } else if text.contains("baño") || text.contains("bano") {
            if bathrooms.is_none() {
                bathrooms = extract_number(&text);
            }
        }
    }

    let description = text_of(article, &selector(".item-description"))
        .filter(|d| !d.is_empty());

    let href = article
        .select(&selector(".item-link"))
        .next()
        .and_then(|el| el.value().attr("href"))
        .unwrap_or("");
    let url = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{base_url}{href}")
    };

    let photo_url = article
        .select(&selector("img"))
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(str::to_string);

    let haystack = format!("{} {}", title, description.as_deref().unwrap_or(""));
    let garage = contains_keyword(&haystack, GARAGE_KEYWORDS);
    let storage_room = contains_keyword(&haystack, STORAGE_KEYWORDS);

    Some(ParsedListing {
        portal_id: portal_id.to_string(),
        title,
        price,
        rooms,
        area_sqm,
        bathrooms,
        description,
        url,
        photo_url,
        garage,
        storage_room,
    })
}

/// Parses a full results page, returning every card that could be parsed.
///
/// Cards that fail to parse are logged and skipped; a page with no cards (or
/// one that is not HTML at all) yields an empty vector, never an error.
pub fn parse_list_page(page_html: &str, base_url: &str) -> Vec<ParsedListing> {
    let document = Html::parse_document(page_html);
    let card_selector = selector("article[data-adid]");

    let mut listings = Vec::new();
    for card in document.select(&card_selector) {
        match parse_property(&card.html(), base_url) {
            Some(listing) => listings.push(listing),
            None => warn!("skipping listing card that could not be parsed"),
        }
    }
    listings
}
