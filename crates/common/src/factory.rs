//! Sample product generator for tests and demo seeding

use crate::product::{Category, Product};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

const NAMES: [&str; 8] = [
    "Hat", "Pants", "Shirt", "Apple", "Banana", "Pots", "Towels", "Ford",
];

const DESCRIPTIONS: [&str; 4] = [
    "A red fedora",
    "Made in Italy",
    "Fresh from the farm",
    "Good as new",
];

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Produce a fresh, unsaved product. Successive calls cycle through names,
/// categories and availability so that bulk-created sets are varied.
pub fn sample_product() -> Product {
    let n = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let idx = n as usize;
    let cents = 100 + (n * 37 % 9_900) as i64;

    Product::new(
        format!("{} {}", NAMES[idx % NAMES.len()], n),
        DESCRIPTIONS[idx % DESCRIPTIONS.len()],
        Decimal::new(cents, 2),
        n % 2 == 0,
        Category::ALL[idx % Category::ALL.len()],
    )
}

/// Produce `count` fresh products
pub fn sample_products(count: usize) -> Vec<Product> {
    (0..count).map(|_| sample_product()).collect()
}
