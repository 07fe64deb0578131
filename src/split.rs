//! Split editor for one draft line item.
//!
//! Decomposes a line's quantity into comment-distinguished parts, or
//! collapses it to zero (delete). All state here is dialog-local: the
//! editor works on a copy and hands its result back only through
//! [`confirm`], so cancelling never touches the draft.
//!
//! The conservation rule is deliberate: parts must sum to the target
//! quantity before confirm is allowed, and the editor never auto-corrects
//! a mismatch. The operator stated "2 plain and 1 no-onions out of 3"
//! exactly, and gets exactly that or a blocking validation message.
//!
//! [`confirm`]: SplitEditor::confirm

use thiserror::Error;

use crate::draft::{DraftLineItem, ResolvedPart};

/// One editable slice of the target quantity. The id is a counter scoped
/// to the editor's lifetime, used for row identity only; it is never sent
/// to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPart {
    pub id: u64,
    pub quantity: u32,
    pub comment: String,
}

/// Why a confirm attempt was rejected. Local and recoverable; surfaced
/// inline and the editor state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("Part quantities add up to {sum}, but the line total is {target}")]
    SumMismatch { target: u32, sum: u32 },
    #[error("Every part needs a quantity of at least 1")]
    EmptyPart,
}

/// Editor state for splitting one draft line.
#[derive(Debug)]
pub struct SplitEditor {
    origin_index: usize,
    food_id: i64,
    name: String,
    unit_price: f64,
    target_quantity: u32,
    parts: Vec<SplitPart>,
    next_part_id: u64,
}

impl SplitEditor {
    /// Open the editor for the line at `index`. Starts with a single part
    /// mirroring the line's current quantity and comment.
    pub fn open(line: &DraftLineItem, index: usize) -> Self {
        SplitEditor {
            origin_index: index,
            food_id: line.food_id,
            name: line.name.clone(),
            unit_price: line.unit_price,
            target_quantity: line.quantity,
            parts: vec![SplitPart {
                id: 0,
                quantity: line.quantity,
                comment: line.comment.clone(),
            }],
            next_part_id: 1,
        }
    }

    pub fn origin_index(&self) -> usize {
        self.origin_index
    }

    pub fn food_id(&self) -> i64 {
        self.food_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn target_quantity(&self) -> u32 {
        self.target_quantity
    }

    pub fn parts(&self) -> &[SplitPart] {
        &self.parts
    }

    /// A target of zero means confirming will delete the line entirely.
    pub fn will_delete_line(&self) -> bool {
        self.target_quantity == 0
    }

    fn parts_sum(&self) -> u32 {
        self.parts.iter().map(|p| p.quantity).sum()
    }

    /// Set the desired total quantity, clamped at zero. With a single
    /// part the part tracks the target in lockstep, the common case of
    /// an operator adjusting overall quantity without splitting.
    pub fn set_target_quantity(&mut self, target: i64) {
        self.target_quantity = target.max(0) as u32;
        if self.parts.len() == 1 {
            self.parts[0].quantity = self.target_quantity;
        }
    }

    /// Set one part's quantity, clamped at zero. Other parts are never
    /// rebalanced automatically; a resulting mismatch blocks confirm
    /// instead, keeping the remainder distribution in the operator's hands.
    pub fn set_part_quantity(&mut self, part_id: u64, quantity: i64) {
        if let Some(part) = self.parts.iter_mut().find(|p| p.id == part_id) {
            part.quantity = quantity.max(0) as u32;
        }
    }

    pub fn set_part_comment(&mut self, part_id: u64, comment: &str) {
        if let Some(part) = self.parts.iter_mut().find(|p| p.id == part_id) {
            part.comment = comment.to_string();
        }
    }

    /// Whether a new part can be created without breaking conservation:
    /// either unassigned quantity remains, or some existing part can
    /// donate a unit.
    pub fn can_add_part(&self) -> bool {
        let sum = self.parts_sum();
        if sum < self.target_quantity {
            return true;
        }
        sum == self.target_quantity && self.parts.iter().any(|p| p.quantity > 1)
    }

    /// Create a new empty-comment part. If unassigned quantity remains
    /// the new part takes one unit of it; otherwise the first part with
    /// quantity > 1 donates one unit. Returns false when neither applies.
    pub fn add_part(&mut self) -> bool {
        let sum = self.parts_sum();
        let quantity = if sum < self.target_quantity {
            (self.target_quantity - sum).min(1)
        } else if sum == self.target_quantity {
            match self.parts.iter_mut().find(|p| p.quantity > 1) {
                Some(donor) => {
                    donor.quantity -= 1;
                    1
                }
                None => return false,
            }
        } else {
            return false;
        };

        self.parts.push(SplitPart {
            id: self.next_part_id,
            quantity,
            comment: String::new(),
        });
        self.next_part_id += 1;
        true
    }

    /// Remove one part, donating its quantity to the first remaining part
    /// so the sum is preserved. The last part cannot be removed while the
    /// target is nonzero. Returns whether a part was removed.
    pub fn remove_part(&mut self, part_id: u64) -> bool {
        if self.parts.len() == 1 && self.target_quantity > 0 {
            return false;
        }
        let Some(pos) = self.parts.iter().position(|p| p.id == part_id) else {
            return false;
        };
        let removed = self.parts.remove(pos);
        if let Some(first) = self.parts.first_mut() {
            first.quantity += removed.quantity;
        }
        true
    }

    /// The validation failure that currently blocks confirm, if any.
    pub fn validation(&self) -> Option<SplitError> {
        let sum = self.parts_sum();
        if sum != self.target_quantity {
            return Some(SplitError::SumMismatch {
                target: self.target_quantity,
                sum,
            });
        }
        if self.target_quantity > 0 && self.parts.iter().any(|p| p.quantity == 0) {
            return Some(SplitError::EmptyPart);
        }
        None
    }

    pub fn can_confirm(&self) -> bool {
        self.validation().is_none()
    }

    /// Resolve the split into the ordered parts that will replace the
    /// origin line. A zero target resolves to no parts (line deleted).
    /// Rejecting leaves the editor untouched so the operator can fix up.
    pub fn confirm(&self) -> Result<Vec<ResolvedPart>, SplitError> {
        if let Some(error) = self.validation() {
            return Err(error);
        }
        Ok(self
            .parts
            .iter()
            .filter(|p| p.quantity > 0)
            .map(|p| ResolvedPart {
                quantity: p.quantity,
                comment: p.comment.clone(),
            })
            .collect())
    }
}
