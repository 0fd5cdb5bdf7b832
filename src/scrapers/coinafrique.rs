use crate::models::RawListing;
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// CSS selectors for the listing cards of a category page
#[derive(Debug, Clone)]
pub struct CardSelectors {
    pub card: String,
    pub description: String,
    pub price: String,
    pub location_container: String,
    pub location: String,
    pub image: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: "div.ad__card".to_string(),
            description: "p.ad__card-description".to_string(),
            price: "p.ad__card-price".to_string(),
            location_container: "p.ad__card-location".to_string(),
            location: "span".to_string(),
            image: "img.ad__card-img".to_string(),
        }
    }
}

/// Field of a listing card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardField {
    Description,
    Price,
    Location,
    Image,
}

impl fmt::Display for CardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardField::Description => "description",
            CardField::Price => "price",
            CardField::Location => "location",
            CardField::Image => "image",
        };
        f.write_str(name)
    }
}

/// A single field could not be located on a card
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("card {card}: {field} not found")]
pub struct ExtractionFieldError {
    pub card: usize,
    pub field: CardField,
}

/// Everything pulled out of one page
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub listings: Vec<RawListing>,
    pub missing_fields: Vec<ExtractionFieldError>,
    /// Number of card elements found
    pub cards_seen: usize,
}

struct CompiledSelectors {
    card: Selector,
    description: Selector,
    price: Selector,
    location_container: Selector,
    location: Selector,
    image: Selector,
}

/// Extracts listing cards from CoinAfrique category pages
pub struct ListingExtractor {
    selectors: CompiledSelectors,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector '{}': {}", selector, e))
}

/// Text nodes of an element, each trimmed, empty ones dropped, joined.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

impl ListingExtractor {
    /// Create an extractor for the default card layout
    pub fn new() -> Result<Self> {
        Self::with_selectors(&CardSelectors::default())
    }

    /// Create an extractor with custom selectors
    pub fn with_selectors(selectors: &CardSelectors) -> Result<Self> {
        Ok(Self {
            selectors: CompiledSelectors {
                card: compile(&selectors.card)?,
                description: compile(&selectors.description)?,
                price: compile(&selectors.price)?,
                location_container: compile(&selectors.location_container)?,
                location: compile(&selectors.location)?,
                image: compile(&selectors.image)?,
            },
        })
    }

    /// Parse one page of markup into raw listings, in document order
    pub fn extract(&self, html: &str, category: &str) -> PageExtraction {
        let document = Html::parse_document(html);
        let mut extraction = PageExtraction::default();

        for (index, card) in document.select(&self.selectors.card).enumerate() {
            extraction.cards_seen += 1;
            let listing = self.extract_card(card, index, category, &mut extraction.missing_fields);
            extraction.listings.push(listing);
        }

        debug!(
            "Extracted {} listings from {} cards",
            extraction.listings.len(),
            extraction.cards_seen
        );

        extraction
    }

    fn extract_card(
        &self,
        card: ElementRef<'_>,
        index: usize,
        category: &str,
        missing: &mut Vec<ExtractionFieldError>,
    ) -> RawListing {
        let mut record = |field: CardField, value: Option<String>| {
            if value.is_none() {
                debug!("card {}: {} not found", index, field);
                missing.push(ExtractionFieldError { card: index, field });
            }
            value
        };

        let description = record(
            CardField::Description,
            self.first_text(card, &self.selectors.description),
        );
        let price_text = record(CardField::Price, self.first_text(card, &self.selectors.price));
        let location_text = record(CardField::Location, self.location(card));
        let image_url = record(CardField::Image, self.image_src(card));

        // A card with nothing recognizable still counts as an ad
        RawListing {
            category: category.to_string(),
            description,
            price_text,
            location_text,
            image_url,
        }
    }

    fn first_text(&self, card: ElementRef<'_>, selector: &Selector) -> Option<String> {
        card.select(selector).next().map(stripped_text)
    }

    /// Location sits in a span inside the location paragraph
    fn location(&self, card: ElementRef<'_>) -> Option<String> {
        let container = card.select(&self.selectors.location_container).next()?;
        self.first_text(container, &self.selectors.location)
    }

    fn image_src(&self, card: ElementRef<'_>) -> Option<String> {
        card.select(&self.selectors.image)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string)
    }
}
