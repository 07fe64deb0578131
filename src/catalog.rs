//! Menu catalog model and the fetch-once catalog view.
//!
//! The catalog is read-only reference data: it drives what a waiter can add
//! to the draft order, but holds no draft state itself. It is fetched once
//! per editing session; a failed fetch falls back to an empty catalog so
//! the rest of the session stays usable.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

/// Whether a category groups meals or drinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    Meal,
    Drink,
}

/// One menu category, e.g. "Starters" or "Soft Drinks".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
}

/// One orderable menu item. The backend supplies up to four preset
/// comments per item (e.g. "no onions"); empty slots are omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: i64,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment4: Option<String>,
}

impl Food {
    /// The non-empty preset comments, in slot order.
    pub fn preset_comments(&self) -> Vec<&str> {
        [&self.comment1, &self.comment2, &self.comment3, &self.comment4]
            .into_iter()
            .filter_map(|c| c.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }
}

/// One category together with its items, as served by the menu endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSection {
    pub category: Category,
    #[serde(default)]
    pub food: Vec<Food>,
}

/// Wire shape of `GET /api/pos/menu`: one section list per category type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuResponse {
    #[serde(default)]
    pub meals: Vec<CatalogSection>,
    #[serde(default)]
    pub drinks: Vec<CatalogSection>,
}

/// Source of the menu payload. The production implementation is the HTTP
/// client; tests substitute a canned or failing source.
pub trait CatalogSource {
    fn fetch_menu(&self) -> impl Future<Output = Result<MenuResponse, ApiError>> + Send;
}

impl CatalogSource for ApiClient {
    async fn fetch_menu(&self) -> Result<MenuResponse, ApiError> {
        let body = self.fetch(Method::GET, "/api/pos/menu", None).await?;
        Ok(serde_json::from_value(body)?)
    }
}

// ---------------------------------------------------------------------------
// Fetch-once catalog view
// ---------------------------------------------------------------------------

/// Read-only catalog view for one editing session.
///
/// `load` fetches the menu at most once; repeated calls are no-ops after a
/// successful fetch. On failure the catalog stays empty and a warning is
/// logged so the UI can surface a notification.
#[derive(Debug, Default)]
pub struct MenuCatalog {
    meals: Vec<CatalogSection>,
    drinks: Vec<CatalogSection>,
    loaded: bool,
    is_loading: bool,
}

impl MenuCatalog {
    pub fn new() -> Self {
        MenuCatalog::default()
    }

    /// True while a fetch is in flight; the UI disables adds during this.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// True once a fetch has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Fetch the menu from `source` unless already loaded. Returns whether
    /// the catalog holds fetched data afterwards.
    pub async fn load<S: CatalogSource>(&mut self, source: &S) -> bool {
        if self.loaded {
            return true;
        }
        self.is_loading = true;
        let result = source.fetch_menu().await;
        self.is_loading = false;

        match result {
            Ok(menu) => {
                info!(
                    meal_sections = menu.meals.len(),
                    drink_sections = menu.drinks.len(),
                    "menu catalog loaded"
                );
                self.meals = menu.meals;
                self.drinks = menu.drinks;
                self.loaded = true;
                true
            }
            Err(e) => {
                // Draft state is unaffected; the session keeps an empty catalog.
                warn!(error = %e, "menu catalog fetch failed, falling back to empty catalog");
                self.meals.clear();
                self.drinks.clear();
                false
            }
        }
    }

    /// The sections of one category type, in backend order.
    pub fn sections(&self, category_type: CategoryType) -> &[CatalogSection] {
        match category_type {
            CategoryType::Meal => &self.meals,
            CategoryType::Drink => &self.drinks,
        }
    }

    /// Resolve a food id to its catalog entry. Linear scan; menus are small.
    pub fn find_food(&self, food_id: i64) -> Option<&Food> {
        self.meals
            .iter()
            .chain(self.drinks.iter())
            .flat_map(|section| section.food.iter())
            .find(|food| food.id == food_id)
    }
}
