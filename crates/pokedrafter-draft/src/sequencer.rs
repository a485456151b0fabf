//! Turn sequencing: who picks after an accepted pick.
//!
//! The order snakes. Turns walk forward through `pick_order`; when the
//! participant at the end of the order has picked, the order is reversed
//! in place and the turn goes to its new first element, which is that same
//! participant. The boundary participant therefore picks twice in a row:
//!
//! ```text
//! [A, B, C]  A → B → C → (reverse: [C, B, A]) C → B → A → (reverse) A → …
//! ```

use pokedrafter_protocol::UserId;

/// Advances the turn after `current` has picked.
///
/// Mutates `pick_order` when the turn wraps. Returns the next picker, or
/// `None` if `current` is not in `pick_order`.
pub fn next_pick(pick_order: &mut [UserId], current: UserId) -> Option<UserId> {
    let index = pick_order.iter().position(|p| *p == current)?;

    if index + 1 == pick_order.len() {
        pick_order.reverse();
        return pick_order.first().copied();
    }

    Some(pick_order[index + 1])
}
