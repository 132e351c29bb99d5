//! Order detail snapshot
//!
//! One line per priced component, in a fixed order: device, product,
//! installation, room (only when the order has one), aging. `amount` is the
//! unit price at save time. The room line's `quantity` is the raw room quantity;
//! the priced multiplier is reapplied by [`reconcile_drafts`].

use rust_decimal::Decimal;
use shared::models::{ItemType, OrderDetailDraft, PricedItem};

use crate::pricing::ResolvedComponents;
use crate::pricing::calculator::{to_decimal, to_f64};
use crate::pricing::room_multiplier;

fn line(item_type: ItemType, item: &PricedItem, quantity: i64) -> OrderDetailDraft {
    OrderDetailDraft {
        item_type,
        item_id: item.id,
        description: item.name.clone(),
        amount: item.price,
        quantity,
    }
}

pub fn build_details(resolved: &ResolvedComponents) -> Vec<OrderDetailDraft> {
    let mut details = Vec::with_capacity(5);
    details.push(line(ItemType::Device, &resolved.device, 1));
    details.push(line(ItemType::Product, &resolved.product, 1));
    details.push(line(ItemType::Installation, &resolved.installation, 1));
    if let Some(room) = &resolved.room {
        details.push(line(ItemType::Room, room, resolved.room_quantity));
    }
    details.push(line(ItemType::Aging, &resolved.aging, 1));
    details
}

fn line_total(item_type: ItemType, amount: f64, quantity: i64) -> Decimal {
    let multiplier = match item_type {
        ItemType::Room => room_multiplier(quantity),
        _ => Decimal::ONE,
    };
    to_decimal(amount) * multiplier
}

/// Order total recomputed from the detail lines
pub fn reconcile_drafts(drafts: &[OrderDetailDraft]) -> f64 {
    to_f64(
        drafts
            .iter()
            .map(|d| line_total(d.item_type, d.amount, d.quantity))
            .sum(),
    )
}
