//! # Balance Calculator
//!
//! Pure functions over the dish list and the host's category targets. Dishes
//! that are only `requested` never count as fulfilment.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Requested dishes excluded from current counts
//! - 1.0.0: Initial per-category progress

use crate::core::{Dish, DishCategory};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBalance {
    pub category: DishCategory,
    pub current: u32,
    pub target: u32,
    pub percentage: u32,
}

impl CategoryBalance {
    pub fn shortage(&self) -> u32 {
        self.target.saturating_sub(self.current)
    }
}

fn percentage(current: u32, target: u32) -> u32 {
    if target == 0 {
        return 0;
    }
    (f64::from(current) / f64::from(target) * 100.0).round() as u32
}

/// One entry per category in `targets`, in category order
pub fn calculate_balance(dishes: &[Dish], targets: &BTreeMap<DishCategory, u32>) -> Vec<CategoryBalance> {
    targets
        .iter()
        .map(|(&category, &target)| {
            let current = dishes
                .iter()
                .filter(|d| d.category == category && d.status.is_committed())
                .count() as u32;

            CategoryBalance {
                category,
                current,
                target,
                percentage: percentage(current, target),
            }
        })
        .collect()
}

/// Sum of `serves` over committed dishes
pub fn total_servings(dishes: &[Dish]) -> u32 {
    dishes
        .iter()
        .filter(|d| d.status.is_committed())
        .filter_map(|d| d.serves)
        .sum()
}

/// Categories still below target
pub fn needed_categories(balance: &[CategoryBalance]) -> Vec<DishCategory> {
    balance
        .iter()
        .filter(|b| b.current < b.target)
        .map(|b| b.category)
        .collect()
}

/// Category with the largest shortage; ties go to the earlier category.
/// Falls back to `side` when every target is met.
pub fn most_needed_category(balance: &[CategoryBalance]) -> DishCategory {
    let mut best: Option<&CategoryBalance> = None;
    for entry in balance.iter().filter(|b| b.shortage() > 0) {
        if best.map_or(true, |b| entry.shortage() > b.shortage()) {
            best = Some(entry);
        }
    }
    best.map(|b| b.category).unwrap_or(DishCategory::Side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DishStatus;
    use chrono::Utc;

    fn dish(category: DishCategory, status: DishStatus, serves: Option<u32>) -> Dish {
        Dish {
            id: uuid::Uuid::new_v4().to_string(),
            guest_id: "g1".to_string(),
            guest_name: "Ada".to_string(),
            category,
            dish_name: "Something".to_string(),
            serves,
            status,
            recipe: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_side_scenario() {
        let dishes = vec![
            dish(DishCategory::Side, DishStatus::Claimed, None),
            dish(DishCategory::Side, DishStatus::Requested, None),
            dish(DishCategory::Side, DishStatus::Confirmed, None),
        ];
        let targets = BTreeMap::from([(DishCategory::Side, 4)]);

        let balance = calculate_balance(&dishes, &targets);
        assert_eq!(
            balance,
            vec![CategoryBalance {
                category: DishCategory::Side,
                current: 2,
                target: 4,
                percentage: 50,
            }]
        );
    }

    #[test]
    fn test_requested_never_counts() {
        let dishes: Vec<Dish> = DishCategory::ALL
            .iter()
            .map(|&c| dish(c, DishStatus::Requested, Some(8)))
            .collect();
        let targets: BTreeMap<_, _> = DishCategory::ALL.iter().map(|&c| (c, 1)).collect();

        for entry in calculate_balance(&dishes, &targets) {
            assert_eq!(entry.current, 0);
            assert_eq!(entry.percentage, 0);
        }
        assert_eq!(total_servings(&dishes), 0);
    }

    #[test]
    fn test_zero_target_is_zero_percent() {
        let dishes = vec![dish(DishCategory::Beverage, DishStatus::Claimed, None)];
        let targets = BTreeMap::from([(DishCategory::Beverage, 0)]);

        let balance = calculate_balance(&dishes, &targets);
        assert_eq!(balance[0].current, 1);
        assert_eq!(balance[0].percentage, 0);
    }

    #[test]
    fn test_percentage_rounds_and_can_exceed_100() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 2), 250);
    }

    #[test]
    fn test_only_target_categories_reported() {
        let dishes = vec![dish(DishCategory::Main, DishStatus::Preparing, None)];
        let targets = BTreeMap::from([(DishCategory::Dessert, 2), (DishCategory::Appetizer, 1)]);

        let categories: Vec<_> = calculate_balance(&dishes, &targets)
            .into_iter()
            .map(|b| b.category)
            .collect();
        assert_eq!(categories, vec![DishCategory::Appetizer, DishCategory::Dessert]);
    }

    #[test]
    fn test_total_servings() {
        let dishes = vec![
            dish(DishCategory::Main, DishStatus::Claimed, Some(10)),
            dish(DishCategory::Side, DishStatus::Confirmed, Some(6)),
            dish(DishCategory::Side, DishStatus::Claimed, None),
            dish(DishCategory::Dessert, DishStatus::Requested, Some(12)),
        ];
        assert_eq!(total_servings(&dishes), 16);
    }

    #[test]
    fn test_most_needed_category() {
        let dishes = vec![dish(DishCategory::Main, DishStatus::Claimed, None)];
        let targets = BTreeMap::from([
            (DishCategory::Appetizer, 2),
            (DishCategory::Main, 2),
            (DishCategory::Dessert, 2),
        ]);
        let balance = calculate_balance(&dishes, &targets);

        assert_eq!(
            needed_categories(&balance),
            vec![DishCategory::Appetizer, DishCategory::Main, DishCategory::Dessert]
        );
        assert_eq!(most_needed_category(&balance), DishCategory::Appetizer);
    }

    #[test]
    fn test_most_needed_falls_back_to_side() {
        let dishes = vec![dish(DishCategory::Main, DishStatus::Claimed, None)];
        let targets = BTreeMap::from([(DishCategory::Main, 1)]);
        let balance = calculate_balance(&dishes, &targets);

        assert!(needed_categories(&balance).is_empty());
        assert_eq!(most_needed_category(&balance), DishCategory::Side);
    }
}
