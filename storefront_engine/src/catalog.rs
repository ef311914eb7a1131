use log::*;

use crate::{data_types::MenuItem, traits::StorefrontApi};

/// The pseudo-category that matches every menu item.
pub const ALL_CATEGORIES: &str = "All";

/// The menu, as loaded once at the start of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    items: Vec<MenuItem>,
    categories: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self { items: Vec::new(), categories: vec![ALL_CATEGORIES.to_string()] }
    }
}

impl Catalog {
    /// Builds the catalog and its category list: `All`, followed by each distinct item category in the order it first
    /// appears. Items with a negative base price are not sellable and are left out.
    pub fn from_items(items: Vec<MenuItem>) -> Self {
        let items = items
            .into_iter()
            .filter(|item| {
                let valid = !item.base_price.is_negative();
                if !valid {
                    warn!("📖️ Menu item {} ({}) has a negative price and will not be shown", item.id, item.name);
                }
                valid
            })
            .collect::<Vec<MenuItem>>();
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for item in &items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        Self { items, categories }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.id.as_str() == id)
    }

    /// The items in `category` whose name or description contains `query`, ignoring case. The `All` category and an
    /// empty query match everything.
    pub fn browse(&self, category: &str, query: &str) -> Vec<&MenuItem> {
        let query = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|i| category == ALL_CATEGORIES || i.category == category)
            .filter(|i| {
                query.is_empty() ||
                    i.name.to_lowercase().contains(&query) ||
                    i.description.to_lowercase().contains(&query)
            })
            .collect()
    }
}

/// Fetches the menu from the storefront API.
///
/// A failure here never stops the storefront from working: it is logged, and an empty catalog (with only the `All`
/// category) is returned instead.
pub async fn load_catalog<A: StorefrontApi>(api: &A) -> Catalog {
    match api.fetch_menu().await {
        Ok(items) => {
            let catalog = Catalog::from_items(items);
            info!(
                "📖️ Loaded {} menu items in {} categories",
                catalog.items.len(),
                catalog.categories.len().saturating_sub(1)
            );
            catalog
        },
        Err(e) => {
            warn!("📖️ Failed to fetch the menu. Continuing with an empty catalog. {e}");
            Catalog::default()
        },
    }
}
