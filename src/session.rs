//! One table's editing session.
//!
//! `PadSession` is the exclusive owner of the draft order, the (at most
//! one) open split editor, and the pending-submit flag. All mutation is
//! synchronous and funneled through this type; the only suspension points
//! are the catalog fetch and the order submit at the edges. The session
//! is deliberately ephemeral; navigating away discards it.

use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::catalog::{CatalogSource, MenuCatalog};
use crate::draft::DraftOrder;
use crate::orders::{order_items, OrderService};
use crate::split::{SplitEditor, SplitError};

/// Why a submit attempt did not go through.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A previous submit is still in flight; the draft is untouched.
    #[error("An order update is already in flight")]
    AlreadyPending,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The waiter-facing editing session for one table's pending order.
pub struct PadSession {
    table_id: i64,
    catalog: MenuCatalog,
    draft: DraftOrder,
    split: Option<SplitEditor>,
    is_updating_order: bool,
}

impl PadSession {
    pub fn new(table_id: i64) -> Self {
        PadSession {
            table_id,
            catalog: MenuCatalog::new(),
            draft: DraftOrder::new(),
            split: None,
            is_updating_order: false,
        }
    }

    pub fn table_id(&self) -> i64 {
        self.table_id
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    pub fn draft(&self) -> &DraftOrder {
        &self.draft
    }

    /// True while a submit is in flight; further edits and submits are
    /// blocked by the UI off this flag.
    pub fn is_updating_order(&self) -> bool {
        self.is_updating_order
    }

    /// Fetch the menu catalog (once per session). Returns whether the
    /// catalog holds data; on failure the session continues with an
    /// empty catalog.
    pub async fn load_menu<S: CatalogSource>(&mut self, source: &S) -> bool {
        self.catalog.load(source).await
    }

    // -----------------------------------------------------------------
    // Draft mutations (catalog tap -> draft line)
    // -----------------------------------------------------------------

    /// Add one unit of a catalog item with an empty comment. Returns
    /// false when the id is not in the catalog.
    pub fn add_from_catalog(&mut self, food_id: i64) -> bool {
        self.add_from_catalog_with_comment(food_id, "")
    }

    /// Add one unit of a catalog item with a comment, the path taken
    /// when the operator taps one of the item's preset comment chips.
    pub fn add_from_catalog_with_comment(&mut self, food_id: i64, comment: &str) -> bool {
        let Some(food) = self.catalog.find_food(food_id) else {
            warn!(food_id, "add ignored: food not in catalog");
            return false;
        };
        let food = food.clone();
        self.draft.add_item_with_comment(&food, comment);
        true
    }

    pub fn change_quantity(&mut self, index: usize, delta: i64) {
        self.draft.change_quantity(index, delta);
    }

    pub fn remove_item(&mut self, index: usize) {
        self.draft.remove_item(index);
    }

    /// Clear the draft and discard any open split editor.
    pub fn reset_draft(&mut self) {
        self.draft.reset();
        self.split = None;
    }

    // -----------------------------------------------------------------
    // Split editor lifecycle
    // -----------------------------------------------------------------

    /// Open the split editor for the line at `index`. Replaces any editor
    /// already open. Returns false for an out-of-range index.
    pub fn open_split(&mut self, index: usize) -> bool {
        let Some(line) = self.draft.lines().get(index) else {
            return false;
        };
        self.split = Some(SplitEditor::open(line, index));
        true
    }

    pub fn split(&self) -> Option<&SplitEditor> {
        self.split.as_ref()
    }

    pub fn split_mut(&mut self) -> Option<&mut SplitEditor> {
        self.split.as_mut()
    }

    /// Discard the split editor without touching the draft.
    pub fn cancel_split(&mut self) {
        self.split = None;
    }

    /// Validate and apply the open split: the origin line is atomically
    /// replaced by the resolved parts and the editor closes. On a
    /// validation failure the editor stays open and the draft is
    /// untouched.
    pub fn confirm_split(&mut self) -> Result<(), SplitError> {
        let Some(editor) = &self.split else {
            warn!("confirm_split ignored: no split editor open");
            return Ok(());
        };
        let parts = editor.confirm()?;
        self.draft.apply_split(editor.origin_index(), &parts);
        self.split = None;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------

    /// Submit the complete current draft as the desired order state for
    /// this table (full-replace semantics on the backend).
    ///
    /// At most one submit is in flight at a time. Success resets the
    /// draft; failure preserves it so the operator can retry manually.
    /// The session never retries on its own.
    pub async fn submit_order<S: OrderService>(&mut self, service: &S) -> Result<(), SubmitError> {
        if self.is_updating_order {
            return Err(SubmitError::AlreadyPending);
        }
        self.is_updating_order = true;

        let items = order_items(&self.draft);
        let started = Instant::now();
        let result = service.submit_order(self.table_id, &items).await;
        self.is_updating_order = false;

        match result {
            Ok(()) => {
                info!(
                    table_id = self.table_id,
                    items = items.len(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "order submitted"
                );
                self.reset_draft();
                Ok(())
            }
            Err(e) => {
                warn!(
                    table_id = self.table_id,
                    error = %e,
                    "order submit failed, draft preserved for retry"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSection, Category, CategoryType, Food, MenuResponse};
    use crate::orders::OrderItem;
    use std::sync::Mutex;

    fn food(id: i64, name: &str, price: f64) -> Food {
        Food {
            id,
            name: name.to_string(),
            price,
            comment1: None,
            comment2: None,
            comment3: None,
            comment4: None,
        }
    }

    struct CannedMenu(MenuResponse);

    impl CatalogSource for CannedMenu {
        async fn fetch_menu(&self) -> Result<MenuResponse, ApiError> {
            Ok(self.0.clone())
        }
    }

    fn sample_menu() -> CannedMenu {
        let mut burger = food(1, "Burger", 9.5);
        burger.comment1 = Some("no pickles".to_string());
        CannedMenu(MenuResponse {
            meals: vec![CatalogSection {
                category: Category {
                    id: 1,
                    name: "Mains".to_string(),
                    category_type: CategoryType::Meal,
                },
                food: vec![burger, food(2, "Pasta", 11.0)],
            }],
            drinks: vec![CatalogSection {
                category: Category {
                    id: 2,
                    name: "Soft Drinks".to_string(),
                    category_type: CategoryType::Drink,
                },
                food: vec![food(5, "Lemonade", 3.0)],
            }],
        })
    }

    async fn session_with_menu() -> PadSession {
        let mut session = PadSession::new(12);
        assert!(session.load_menu(&sample_menu()).await);
        session
    }

    /// Records every submitted item list; fails on demand.
    struct FakeOrderService {
        fail: bool,
        calls: Mutex<Vec<(i64, Vec<OrderItem>)>>,
    }

    impl FakeOrderService {
        fn new(fail: bool) -> Self {
            FakeOrderService {
                fail,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl OrderService for FakeOrderService {
        async fn submit_order(&self, table_id: i64, items: &[OrderItem]) -> Result<(), ApiError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((table_id, items.to_vec()));
            if self.fail {
                Err(ApiError::Status {
                    status: 500,
                    message: "Order server error (HTTP 500)".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn simple_order_scenario() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(1));
        assert!(session.add_from_catalog(1));

        assert_eq!(session.draft().len(), 1);
        assert_eq!(session.draft().lines()[0].quantity, 2);
        assert_eq!(session.draft().total_price(), 19.0);
    }

    #[tokio::test]
    async fn preset_comment_adds_a_distinct_line() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(1));
        assert!(session.add_from_catalog_with_comment(1, "no pickles"));

        assert_eq!(session.draft().len(), 2);
        assert_eq!(session.draft().lines()[0].quantity, 1);
        assert_eq!(session.draft().lines()[1].quantity, 1);
        assert_eq!(session.draft().lines()[1].comment, "no pickles");
    }

    #[tokio::test]
    async fn add_of_unknown_food_is_rejected() {
        let mut session = session_with_menu().await;
        assert!(!session.add_from_catalog(99));
        assert!(session.draft().is_empty());
    }

    #[tokio::test]
    async fn split_scenario_with_donor_rule() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(2));
        session.change_quantity(0, 2); // Pasta x3
        let total_before = session.draft().total_price();

        assert!(session.open_split(0));
        {
            let editor = session.split_mut().expect("editor open");
            assert!(editor.add_part());
            let second_id = editor.parts()[1].id;
            editor.set_part_comment(second_id, "for kids");
        }
        session.confirm_split().expect("valid split");

        assert!(session.split().is_none());
        assert_eq!(session.draft().len(), 2);
        assert_eq!(session.draft().lines()[0].quantity, 2);
        assert_eq!(session.draft().lines()[0].comment, "");
        assert_eq!(session.draft().lines()[1].quantity, 1);
        assert_eq!(session.draft().lines()[1].comment, "for kids");
        assert_eq!(session.draft().total_price(), total_before);
    }

    #[tokio::test]
    async fn split_to_zero_deletes_the_line() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(2));
        assert!(session.open_split(0));
        session
            .split_mut()
            .expect("editor open")
            .set_target_quantity(0);
        session.confirm_split().expect("delete-line split");

        assert!(session.draft().is_empty());
    }

    #[tokio::test]
    async fn invalid_split_keeps_editor_and_draft() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(2));
        session.change_quantity(0, 2); // x3
        assert!(session.open_split(0));
        {
            let editor = session.split_mut().expect("editor open");
            assert!(editor.add_part());
            editor.set_part_quantity(0, 3); // sum 4 over target 3
        }

        assert!(session.confirm_split().is_err());
        assert!(session.split().is_some());
        assert_eq!(session.draft().len(), 1);
        assert_eq!(session.draft().lines()[0].quantity, 3);
    }

    #[tokio::test]
    async fn cancel_split_discards_editor_only() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(1));
        assert!(session.open_split(0));
        session.cancel_split();

        assert!(session.split().is_none());
        assert_eq!(session.draft().len(), 1);
    }

    #[tokio::test]
    async fn open_split_rejects_out_of_range_index() {
        let mut session = session_with_menu().await;
        assert!(!session.open_split(0));
    }

    #[tokio::test]
    async fn successful_submit_sends_complete_draft_and_resets() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(1));
        assert!(session.add_from_catalog_with_comment(5, "no ice"));
        assert!(session.open_split(0));

        let service = FakeOrderService::new(false);
        session.submit_order(&service).await.expect("submit ok");

        let calls = service.calls.lock().expect("calls lock");
        assert_eq!(calls.len(), 1);
        let (table_id, items) = &calls[0];
        assert_eq!(*table_id, 12);
        assert_eq!(
            *items,
            vec![
                OrderItem {
                    food_id: 1,
                    quantity: 1,
                    comment: String::new(),
                },
                OrderItem {
                    food_id: 5,
                    quantity: 1,
                    comment: "no ice".to_string(),
                },
            ]
        );

        assert!(session.draft().is_empty());
        assert!(session.split().is_none());
        assert!(!session.is_updating_order());
    }

    #[tokio::test]
    async fn failed_submit_preserves_the_draft() {
        let mut session = session_with_menu().await;
        assert!(session.add_from_catalog(1));
        assert!(session.add_from_catalog_with_comment(5, "no ice"));
        let before: Vec<_> = session.draft().lines().to_vec();

        let service = FakeOrderService::new(true);
        let result = session.submit_order(&service).await;

        assert!(matches!(result, Err(SubmitError::Api(_))));
        assert_eq!(session.draft().lines(), before.as_slice());
        assert!(!session.is_updating_order());

        // Manual retry resubmits the same list.
        let expected: Vec<OrderItem> = before
            .iter()
            .map(|line| OrderItem {
                food_id: line.food_id,
                quantity: line.quantity,
                comment: line.comment.clone(),
            })
            .collect();
        let retry = FakeOrderService::new(false);
        session.submit_order(&retry).await.expect("retry ok");
        assert_eq!(retry.calls.lock().expect("calls lock")[0].1, expected);
    }
}
