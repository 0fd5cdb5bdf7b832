use serde::{Deserialize, Serialize};

/// Placeholder written for a missing ad description
pub const DESCRIPTION_MISSING: &str = "Non spécifié";
/// Placeholder written for a missing price
pub const PRICE_MISSING: &str = "Prix non spécifié";
/// Placeholder written for a missing location
pub const LOCATION_MISSING: &str = "Adresse non spécifiée";
/// Placeholder written for a missing image
pub const IMAGE_MISSING: &str = "Image non disponible";

/// Text used when a whole column is absent from imported data
pub const UNKNOWN: &str = "unknown";

/// One scraped ad, exactly as found on the listing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawListing {
    pub category: String,
    pub description: Option<String>,
    pub price_text: Option<String>,
    pub location_text: Option<String>,
    pub image_url: Option<String>,
}

impl RawListing {
    pub fn description_or_sentinel(&self) -> &str {
        self.description.as_deref().unwrap_or(DESCRIPTION_MISSING)
    }

    pub fn price_or_sentinel(&self) -> &str {
        self.price_text.as_deref().unwrap_or(PRICE_MISSING)
    }

    pub fn location_or_sentinel(&self) -> &str {
        self.location_text.as_deref().unwrap_or(LOCATION_MISSING)
    }

    pub fn image_or_sentinel(&self) -> &str {
        self.image_url.as_deref().unwrap_or(IMAGE_MISSING)
    }
}

/// A cleaned listing with typed price and derived flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedListing {
    pub category: String,
    /// Trimmed, title-cased description
    pub description: Option<String>,
    pub price_text: Option<String>,
    /// Trimmed, title-cased location
    pub location_text: Option<String>,
    pub image_url: Option<String>,
    /// Copy of the price text before any cleaning
    pub price_raw: Option<String>,
    pub price_numeric: Option<u64>,
    pub has_price: bool,
    pub has_image: bool,
}

impl NormalizedListing {
    pub fn description_or_sentinel(&self) -> &str {
        self.description.as_deref().unwrap_or(DESCRIPTION_MISSING)
    }

    pub fn price_or_sentinel(&self) -> &str {
        self.price_text.as_deref().unwrap_or(PRICE_MISSING)
    }

    pub fn price_raw_or_sentinel(&self) -> &str {
        self.price_raw.as_deref().unwrap_or(PRICE_MISSING)
    }

    pub fn location_or_sentinel(&self) -> &str {
        self.location_text.as_deref().unwrap_or(LOCATION_MISSING)
    }

    pub fn image_or_sentinel(&self) -> &str {
        self.image_url.as_deref().unwrap_or(IMAGE_MISSING)
    }
}

/// Result of a scrape run: raw rows, or cleaned rows when normalization ran
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum Dataset {
    Raw(Vec<RawListing>),
    Cleaned(Vec<NormalizedListing>),
}

impl Dataset {
    pub fn len(&self) -> usize {
        match self {
            Dataset::Raw(rows) => rows.len(),
            Dataset::Cleaned(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_cleaned(&self) -> bool {
        matches!(self, Dataset::Cleaned(_))
    }

    /// Number of columns the dataset serializes to.
    pub fn column_count(&self) -> usize {
        match self {
            Dataset::Raw(_) => 5,
            Dataset::Cleaned(_) => 9,
        }
    }
}
