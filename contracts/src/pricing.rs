//! # Pricing Curve
//!
//! The monotonic step function from cumulative issuance count to required
//! payment. Early redemptions are free; the price then climbs through six
//! paid tiers as supply runs out.
//!
//! Amounts are denominated in the chain's smallest native unit. The tier
//! values follow the canonical pricing-table generator, including the
//! quirky 100,001 top-tier price (the generator's sibling emitted 100,000;
//! we follow the version that shipped). Scaling to display denominations
//! is an off-chain concern.
//!
//! The orchestrator evaluates `price_of(minted)` *before* incrementing the
//! supply counter, so the price a redeemer pays is the price at the index
//! their token receives.

use fission_protocol::config::MAX_SUPPLY;

/// `(first_index, price)` — each tier applies from `first_index` up to the
/// next tier's start. Must be sorted ascending by index and non-decreasing
/// by price; `price_of` depends on it, and the tests enforce it.
pub const PRICE_TIERS: &[(u64, u128)] = &[
    (0, 0),
    (80, 1),
    (320, 10),
    (1_280, 100),
    (5_120, 1_000),
    (13_000, 10_000),
    (13_070, 100_001),
];

/// The required payment for the redemption at cumulative issuance index
/// `index` (0-based).
///
/// Pure function, total over all of `u64` — indices past the supply cap
/// still price at the top tier, even though the supply governor will have
/// rejected them long before payment is checked.
pub fn price_of(index: u64) -> u128 {
    let mut price = 0;
    for &(first_index, tier_price) in PRICE_TIERS {
        if index >= first_index {
            price = tier_price;
        } else {
            break;
        }
    }
    price
}

/// Total revenue if every warhead up to the supply cap is redeemed at
/// exactly the asking price. Mostly useful for treasury sanity checks
/// and capacity planning.
pub fn max_total_revenue() -> u128 {
    (0..MAX_SUPPLY).map(price_of).sum()
}
