//! The company directory and its queries.

use crate::company::{Category, Company};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Category filter value meaning "every category".
pub const ALL_CATEGORIES: &str = "All Categories";

/// Number of companies in the embedded dataset.
pub const BUILTIN_COMPANY_COUNT: usize = 677;

const BUILTIN_DATA: &str = include_str!("../data/companies.json");

/// All companies, grouped by category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Directory {
    categories: Vec<Category>,
}

/// A search hit: a company together with its category name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompanyMatch<'a> {
    pub category: &'a str,
    #[serde(flatten)]
    pub company: &'a Company,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub total_companies: usize,
    pub total_revenue: String,
    pub pi_pay_enabled: usize,
    pub categories: Vec<CategoryCount>,
}

/// Consistency findings for a loaded directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub total: usize,
    pub expected: Option<usize>,
    pub count_matches: bool,
    pub categories: Vec<CategoryCount>,
    /// Domains listed more than once, in first-seen order
    pub duplicate_domains: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.count_matches && self.duplicate_domains.is_empty()
    }
}

impl Directory {
    /// Build a directory from categories. Every revenue string must parse.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        for company in categories.iter().flat_map(|c| &c.companies) {
            company.revenue_billions().map_err(|e| {
                Error::InvalidInput(format!("{}: {}", company.name, e))
            })?;
        }
        Ok(Self { categories })
    }

    /// The embedded dataset.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_DATA)
    }

    /// Parse a `{"categories": [...]}` document.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Directory = serde_json::from_str(json)?;
        Self::new(raw.categories)
    }

    /// Load a dataset file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn total_companies(&self) -> usize {
        self.categories.iter().map(|c| c.companies.len()).sum()
    }

    /// Combined revenue in billions of USD.
    pub fn total_revenue_billions(&self) -> f64 {
        self.companies()
            .filter_map(|c| c.revenue_billions().ok())
            .sum()
    }

    /// Combined revenue formatted in trillions, e.g. `$16.1T+`.
    pub fn total_revenue(&self) -> String {
        format!("${:.1}T+", self.total_revenue_billions() / 1000.0)
    }

    /// Companies whose name or domain contains `query` (case-insensitive),
    /// optionally restricted to one category. An empty query matches all.
    pub fn search<'a>(&'a self, query: &str, category: Option<&str>) -> Vec<CompanyMatch<'a>> {
        let needle = query.trim().to_lowercase();
        let category = category.filter(|c| *c != ALL_CATEGORIES && !c.is_empty());

        self.categories
            .iter()
            .filter(|c| category.map_or(true, |wanted| c.name == wanted))
            .flat_map(|c| {
                c.companies.iter().map(move |company| CompanyMatch {
                    category: c.name.as_str(),
                    company,
                })
            })
            .filter(|m| m.company.matches(&needle))
            .collect()
    }

    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats {
            total_companies: self.total_companies(),
            total_revenue: self.total_revenue(),
            pi_pay_enabled: self.companies().filter(|c| c.pi_pay_enabled).count(),
            categories: self.category_counts(),
        }
    }

    /// Check the directory against an expected size and for repeated domains.
    pub fn integrity_report(&self, expected: Option<usize>) -> IntegrityReport {
        let total = self.total_companies();

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut duplicate_domains = Vec::new();
        for company in self.companies() {
            let domain = company.domain.to_lowercase();
            let count = seen.entry(domain.clone()).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicate_domains.push(domain);
            }
        }

        IntegrityReport {
            total,
            expected,
            count_matches: expected.map_or(true, |e| e == total),
            categories: self.category_counts(),
            duplicate_domains,
        }
    }

    fn companies(&self) -> impl Iterator<Item = &Company> {
        self.categories.iter().flat_map(|c| c.companies.iter())
    }

    fn category_counts(&self) -> Vec<CategoryCount> {
        self.categories
            .iter()
            .map(|c| CategoryCount {
                name: c.name.clone(),
                count: c.companies.len(),
            })
            .collect()
    }
}
