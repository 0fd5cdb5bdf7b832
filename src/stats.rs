use crate::models::Dataset;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Price figures for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPrices {
    pub category: String,
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

/// Aggregate view of a dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    /// Mean of the numeric prices; raw datasets have none
    pub mean_price: Option<f64>,
    pub categories: usize,
    pub locations: usize,
    /// Ten most frequent locations, most frequent first
    pub top_locations: Vec<(String, usize)>,
    pub prices_by_category: Vec<CategoryPrices>,
}

fn mean(values: &[u64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

impl Summary {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let rows: Vec<(&str, &str, Option<u64>)> = match dataset {
            Dataset::Raw(rows) => rows
                .iter()
                .map(|r| (r.category.as_str(), r.location_or_sentinel(), None))
                .collect(),
            Dataset::Cleaned(rows) => rows
                .iter()
                .map(|r| (r.category.as_str(), r.location_or_sentinel(), r.price_numeric))
                .collect(),
        };

        let categories: BTreeSet<&str> = rows.iter().map(|(c, _, _)| *c).collect();

        let mut location_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, location, _) in &rows {
            *location_counts.entry(*location).or_default() += 1;
        }

        let mut top_locations: Vec<(String, usize)> = location_counts
            .iter()
            .map(|(location, count)| (location.to_string(), *count))
            .collect();
        // BTreeMap order already breaks ties alphabetically; the sort is stable
        top_locations.sort_by(|a, b| b.1.cmp(&a.1));
        top_locations.truncate(10);

        let mut prices: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
        for (category, _, price) in &rows {
            if let Some(price) = price {
                prices.entry(*category).or_default().push(*price);
            }
        }
        let all_prices: Vec<u64> = prices.values().flatten().copied().collect();

        let prices_by_category = prices
            .into_iter()
            .filter_map(|(category, values)| {
                Some(CategoryPrices {
                    category: category.to_string(),
                    count: values.len(),
                    min: *values.iter().min()?,
                    max: *values.iter().max()?,
                    mean: mean(&values)?,
                })
            })
            .collect();

        Self {
            total: rows.len(),
            mean_price: mean(&all_prices),
            categories: categories.len(),
            locations: location_counts.len(),
            top_locations,
            prices_by_category,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total articles: {}", self.total)?;
        match self.mean_price {
            Some(mean) => writeln!(f, "Prix moyen: {:.0} FCFA", mean)?,
            None => writeln!(f, "Prix moyen: N/A")?,
        }
        writeln!(f, "Catégories: {}", self.categories)?;
        writeln!(f, "Villes: {}", self.locations)?;

        if !self.top_locations.is_empty() {
            writeln!(f, "Top villes:")?;
            for (location, count) in &self.top_locations {
                writeln!(f, "   {:<30} {}", location, count)?;
            }
        }

        for prices in &self.prices_by_category {
            writeln!(
                f,
                "{}: {} prix, min {}, max {}, moyenne {:.0}",
                prices.category, prices.count, prices.min, prices.max, prices.mean
            )?;
        }

        Ok(())
    }
}
