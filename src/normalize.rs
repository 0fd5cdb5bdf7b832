//! Batch cleaning of scraped listings
//!
//! Turns raw price text into a number, tidies free-text fields and drops
//! duplicate ads. Runs once over everything a scrape collected.

use crate::models::{NormalizedListing, RawListing};
use std::collections::HashSet;
use tracing::debug;

/// Digits of the price text read as one integer ("15 000 FCFA" -> 15000).
/// `None` when there are no digits or the number does not fit.
pub fn parse_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Capitalizes the first letter of every word and lower-cases the rest.
/// A word starts after any character that is not a letter.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                // only the first char of a multi-char uppercase stays upper ("ß" -> "Ss")
                let mut upper = c.to_uppercase();
                if let Some(first) = upper.next() {
                    out.push(first);
                    out.extend(upper.flat_map(char::to_lowercase));
                }
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }

    out
}

fn clean_text(text: Option<&str>) -> Option<String> {
    text.map(|t| title_case(t.trim()))
}

/// Derive the typed fields of a single listing
pub fn normalize_listing(raw: &RawListing) -> NormalizedListing {
    let price_numeric = raw.price_text.as_deref().and_then(parse_price);

    NormalizedListing {
        category: raw.category.clone(),
        description: clean_text(raw.description.as_deref()),
        price_text: raw.price_text.clone(),
        location_text: clean_text(raw.location_text.as_deref()),
        image_url: raw.image_url.clone(),
        price_raw: raw.price_text.clone(),
        has_price: price_numeric.is_some(),
        price_numeric,
        has_image: raw.image_url.is_some(),
    }
}

/// Normalize a batch and drop repeated ads.
///
/// Two rows are the same ad when description, raw price and location all
/// match after cleaning; the first one in input order is kept. The image is
/// not part of the key.
pub fn normalize(records: &[RawListing]) -> Vec<NormalizedListing> {
    let mut seen: HashSet<(Option<String>, Option<String>, Option<String>)> = HashSet::new();
    let mut cleaned = Vec::with_capacity(records.len());

    for raw in records {
        let listing = normalize_listing(raw);
        let key = (
            listing.description.clone(),
            listing.price_raw.clone(),
            listing.location_text.clone(),
        );
        if seen.insert(key) {
            cleaned.push(listing);
        }
    }

    debug!(
        "Normalized {} listings, {} duplicates removed",
        cleaned.len(),
        records.len() - cleaned.len()
    );

    cleaned
}
