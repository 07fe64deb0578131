//! Draft order store.
//!
//! Holds the ordered list of line items a waiter is assembling for one
//! table before submitting. Purely in-memory: every operation is a
//! synchronous, total mutation of local state, applied in the order the
//! operator issues it. Lifetime is the editing session; nothing here
//! survives a reset or a navigation away.

use crate::catalog::Food;

/// One staged row of the draft order.
///
/// `name` and `unit_price` are snapshots copied from the catalog at
/// selection time, not re-fetched live.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftLineItem {
    pub food_id: i64,
    pub name: String,
    pub unit_price: f64,
    /// Always >= 1 while the line exists; a line driven to 0 is removed.
    pub quantity: u32,
    pub comment: String,
}

/// Two lines are the same variant when both the food and the comment
/// match; variants merge on add instead of duplicating.
pub fn same_variant(line: &DraftLineItem, food_id: i64, comment: &str) -> bool {
    line.food_id == food_id && line.comment == comment
}

/// Quantity and comment of one line produced by a confirmed split.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPart {
    pub quantity: u32,
    pub comment: String,
}

/// The staged order for one table. Exclusive owner of its line items; the
/// split editor works on a copy and merges back through [`apply_split`].
///
/// [`apply_split`]: DraftOrder::apply_split
#[derive(Debug, Default)]
pub struct DraftOrder {
    lines: Vec<DraftLineItem>,
}

impl DraftOrder {
    pub fn new() -> Self {
        DraftOrder::default()
    }

    pub fn lines(&self) -> &[DraftLineItem] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `food` with an empty comment, merging into an
    /// existing uncommented line for the same food if present.
    pub fn add_item(&mut self, food: &Food) {
        self.add_item_with_comment(food, "");
    }

    /// Add one unit of `food` with `comment`, merging into an existing
    /// line with the same food and comment if present. Distinct comments
    /// keep distinct lines, so one food can appear several times.
    pub fn add_item_with_comment(&mut self, food: &Food, comment: &str) {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| same_variant(line, food.id, comment))
        {
            line.quantity += 1;
            return;
        }
        self.lines.push(DraftLineItem {
            food_id: food.id,
            name: food.name.clone(),
            unit_price: food.price,
            quantity: 1,
            comment: comment.to_string(),
        });
    }

    /// Adjust a line's quantity by `delta`, flooring at 1. Reaching 0
    /// requires an explicit [`remove_item`]; rapid minus-taps can never
    /// delete a line by accident.
    ///
    /// [`remove_item`]: DraftOrder::remove_item
    pub fn change_quantity(&mut self, index: usize, delta: i64) {
        if let Some(line) = self.lines.get_mut(index) {
            let next = i64::from(line.quantity) + delta;
            line.quantity = next.max(1) as u32;
        }
    }

    /// Delete the line at `index`. Out-of-range indexes are ignored; rows
    /// only invoke this for positions they are rendering.
    pub fn remove_item(&mut self, index: usize) {
        if index < self.lines.len() {
            self.lines.remove(index);
        }
    }

    /// Clear the whole draft. Called after a successful submit.
    pub fn reset(&mut self) {
        self.lines.clear();
    }

    /// Derived order total. Recomputed on every read; the draft is small
    /// and correctness beats caching here.
    pub fn total_price(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| f64::from(line.quantity) * line.unit_price)
            .sum()
    }

    /// Atomically replace the line at `index` with one line per resolved
    /// part, preserving the original food snapshot and adopting each
    /// part's comment. Parts with quantity 0 are dropped; an empty part
    /// list deletes the line outright.
    pub fn apply_split(&mut self, index: usize, parts: &[ResolvedPart]) {
        if index >= self.lines.len() {
            return;
        }
        let origin = self.lines.remove(index);
        let replacements = parts
            .iter()
            .filter(|part| part.quantity > 0)
            .map(|part| DraftLineItem {
                food_id: origin.food_id,
                name: origin.name.clone(),
                unit_price: origin.unit_price,
                quantity: part.quantity,
                comment: part.comment.clone(),
            });
        self.lines.splice(index..index, replacements);
    }
}
