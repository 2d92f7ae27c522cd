//! Keyword-family category matching

use crate::config::{CategoryRules, KeywordFamily};
use crate::models::{CategoryRef, CategoryType};

/// Maps free text to one of the user's categories
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    families: Vec<KeywordFamily>,
}

impl CategoryMatcher {
    pub fn new(rules: &CategoryRules) -> Self {
        let families = rules
            .families
            .iter()
            .map(|f| KeywordFamily {
                name: f.name.clone(),
                keywords: f.keywords.iter().map(|k| k.to_lowercase()).collect(),
                synonyms: f.synonyms.iter().map(|s| s.to_lowercase()).collect(),
            })
            .collect();
        Self { families }
    }

    /// First family with a keyword contained in `text`
    pub fn family_for(&self, text: &str) -> Option<&KeywordFamily> {
        let text = text.to_lowercase();
        self.families
            .iter()
            .find(|f| f.keywords.iter().any(|k| text.contains(k.as_str())))
    }

    /// Resolve `text` to a category: the family's synonym match when one
    /// exists, otherwise the first expense category
    pub fn match_category<'a>(
        &self,
        text: &str,
        categories: &'a [CategoryRef],
    ) -> Option<&'a CategoryRef> {
        if let Some(family) = self.family_for(text) {
            let found = categories.iter().find(|c| {
                let name = c.name.to_lowercase();
                family.synonyms.iter().any(|s| name.contains(s.as_str()))
            });
            if let Some(category) = found {
                tracing::debug!(family = %family.name, category = %category.name, "Keyword family match");
                return Some(category);
            }
        }
        default_expense(categories)
    }
}

/// The user's default expense category (first expense-typed entry)
pub fn default_expense(categories: &[CategoryRef]) -> Option<&CategoryRef> {
    categories
        .iter()
        .find(|c| c.category_type == CategoryType::Expense)
}
