use crate::scrapers::types::ScrapeRequest;
use anyhow::{bail, Result};

/// A marketplace segment with its listing URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Label stamped on every row
    pub name: &'static str,
    /// Used in output file names
    pub slug: &'static str,
    pub url: &'static str,
}

pub const CATEGORIES: [Category; 4] = [
    Category {
        name: "Vêtements Homme",
        slug: "vetements_homme",
        url: "https://sn.coinafrique.com/categorie/vetements-homme",
    },
    Category {
        name: "Chaussures Homme",
        slug: "chaussures_homme",
        url: "https://sn.coinafrique.com/categorie/chaussures-homme",
    },
    Category {
        name: "Vêtements Enfants",
        slug: "vetements_enfants",
        url: "https://sn.coinafrique.com/categorie/vetements-enfants",
    },
    Category {
        name: "Chaussures Enfants",
        slug: "chaussures_enfants",
        url: "https://sn.coinafrique.com/categorie/chaussures-enfants",
    },
];

impl Category {
    /// Find a category by display name or slug, ignoring case.
    /// Dashes and underscores in slugs are interchangeable.
    pub fn find(query: &str) -> Option<&'static Category> {
        let query = query.trim().to_lowercase();
        let slug_query = query.replace('-', "_");
        CATEGORIES
            .iter()
            .find(|c| c.name.to_lowercase() == query || c.slug == slug_query)
    }

    pub fn request(&self, page_count: u32, clean: bool) -> ScrapeRequest {
        ScrapeRequest {
            category: self.name.to_string(),
            base_url: self.url.to_string(),
            page_count,
            clean,
        }
    }
}

/// File-name friendly form of a free-form category label
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if c.is_alphabetic() {
            // accented letters: keep the base letter when it is in Latin-1
            slug.push(match c.to_lowercase().next().unwrap_or(c) {
                'à' | 'â' | 'ä' => 'a',
                'é' | 'è' | 'ê' | 'ë' => 'e',
                'î' | 'ï' => 'i',
                'ô' | 'ö' => 'o',
                'ù' | 'û' | 'ü' => 'u',
                'ç' => 'c',
                _ => '_',
            });
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Requests for the named categories, or for all of them when none are named
pub fn resolve_requests(names: &[String], page_count: u32, clean: bool) -> Result<Vec<ScrapeRequest>> {
    if names.is_empty() {
        return Ok(CATEGORIES.iter().map(|c| c.request(page_count, clean)).collect());
    }

    let mut requests = Vec::with_capacity(names.len());
    for name in names {
        match Category::find(name) {
            Some(category) => requests.push(category.request(page_count, clean)),
            None => {
                let known: Vec<&str> = CATEGORIES.iter().map(|c| c.name).collect();
                bail!("Unknown category '{}' (known: {})", name, known.join(", "));
            }
        }
    }
    Ok(requests)
}
