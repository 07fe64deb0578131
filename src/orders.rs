//! Order submission for the draft editor.
//!
//! The order endpoint has full-replace semantics: the submitted item list
//! is the desired state for the table, not a delta. Submission therefore
//! always carries the complete current draft.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::api::{ApiClient, ApiError};
use crate::draft::DraftOrder;

/// One line of the order-for-table write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub food_id: i64,
    pub quantity: u32,
    #[serde(default)]
    pub comment: String,
}

/// Body of `POST /api/pos/tables/{id}/order`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub table_id: i64,
    pub items: Vec<OrderItem>,
    pub submitted_at: DateTime<Utc>,
}

/// Translate the draft into the complete item list for submission.
pub fn order_items(draft: &DraftOrder) -> Vec<OrderItem> {
    draft
        .lines()
        .iter()
        .map(|line| OrderItem {
            food_id: line.food_id,
            quantity: line.quantity,
            comment: line.comment.clone(),
        })
        .collect()
}

/// The order-service write consumed by the session. Only an ok/error
/// signal comes back; the session uses it to decide whether to reset
/// the draft.
pub trait OrderService {
    fn submit_order(
        &self,
        table_id: i64,
        items: &[OrderItem],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl OrderService for ApiClient {
    async fn submit_order(&self, table_id: i64, items: &[OrderItem]) -> Result<(), ApiError> {
        let submission = OrderSubmission {
            table_id,
            items: items.to_vec(),
            submitted_at: Utc::now(),
        };
        let path = format!("/api/pos/tables/{table_id}/order");
        self.fetch(Method::POST, &path, Some(serde_json::to_value(&submission)?))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Food;

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

    #[test]
    fn order_items_carry_the_complete_draft() {
        let mut draft = DraftOrder::new();
        draft.add_item(&food(1, "Burger", 9.5));
        draft.add_item(&food(1, "Burger", 9.5));
        draft.add_item_with_comment(&food(5, "Lemonade", 3.0), "no ice");

        let items = order_items(&draft);
        assert_eq!(
            items,
            vec![
                OrderItem {
                    food_id: 1,
                    quantity: 2,
                    comment: String::new(),
                },
                OrderItem {
                    food_id: 5,
                    quantity: 1,
                    comment: "no ice".to_string(),
                },
            ]
        );
    }

    #[test]
    fn order_item_wire_shape_is_camel_case() {
        let item = OrderItem {
            food_id: 5,
            quantity: 2,
            comment: "no ice".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "foodId": 5, "quantity": 2, "comment": "no ice" })
        );
    }
}
