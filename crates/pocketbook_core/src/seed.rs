//! Default category sets written on first launch.
//!
//! # Responsibility
//! - Produce the fixed, ordered starter categories for finance and to-dos.
//!
//! # Invariants
//! - Output order and presets are stable across calls; only ids differ.
//! - This module never touches storage. The "already seeded" check lives in
//!   `FinanceRepository::initialize`.

use crate::model::category::{Category, CategoryKind, SUB_TYPE_EXPENSE, SUB_TYPE_INCOME};

struct Preset {
    name: &'static str,
    sub_type: &'static str,
    color: &'static str,
    icon: &'static str,
}

const fn preset(
    name: &'static str,
    sub_type: &'static str,
    color: &'static str,
    icon: &'static str,
) -> Preset {
    Preset {
        name,
        sub_type,
        color,
        icon,
    }
}

const FINANCIAL_PRESETS: &[Preset] = &[
    preset("餐饮", SUB_TYPE_EXPENSE, "#FF7043", "restaurant"),
    preset("交通", SUB_TYPE_EXPENSE, "#42A5F5", "directions_car"),
    preset("购物", SUB_TYPE_EXPENSE, "#EC407A", "shopping_cart"),
    preset("娱乐", SUB_TYPE_EXPENSE, "#AB47BC", "movie"),
    preset("住房", SUB_TYPE_EXPENSE, "#8D6E63", "home"),
    preset("医疗", SUB_TYPE_EXPENSE, "#EF5350", "local_hospital"),
    preset("教育", SUB_TYPE_EXPENSE, "#5C6BC0", "school"),
    preset("其他支出", SUB_TYPE_EXPENSE, "#78909C", "more_horiz"),
    preset("工资", SUB_TYPE_INCOME, "#66BB6A", "work"),
    preset("奖金", SUB_TYPE_INCOME, "#FFCA28", "card_giftcard"),
    preset("投资", SUB_TYPE_INCOME, "#26A69A", "trending_up"),
    preset("其他收入", SUB_TYPE_INCOME, "#9CCC65", "attach_money"),
];

const TODO_PRESETS: &[Preset] = &[
    preset("工作", "WORK", "#1E88E5", "work"),
    preset("生活", "LIFE", "#43A047", "home"),
    preset("学习", "STUDY", "#FB8C00", "menu_book"),
    preset("健康", "HEALTH", "#E53935", "favorite"),
    preset("其他", "OTHER", "#757575", "label"),
];

/// Starter financial categories: expenses first, then incomes.
pub fn default_financial_categories() -> Vec<Category> {
    build(FINANCIAL_PRESETS, CategoryKind::Financial)
}

/// Starter to-do categories.
pub fn default_todo_categories() -> Vec<Category> {
    build(TODO_PRESETS, CategoryKind::Todo)
}

/// Both sets, financial first.
pub fn default_categories() -> Vec<Category> {
    let mut all = default_financial_categories();
    all.extend(default_todo_categories());
    all
}

fn build(presets: &[Preset], kind: CategoryKind) -> Vec<Category> {
    presets
        .iter()
        .map(|preset| {
            Category::new(
                preset.name,
                kind,
                preset.sub_type,
                preset.color,
                preset.icon,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{default_categories, default_financial_categories, default_todo_categories};
    use crate::model::category::CategoryKind;
    use std::collections::HashSet;

    #[test]
    fn financial_set_starts_with_expenses_and_contains_salary() {
        let financial = default_financial_categories();
        assert_eq!(financial[0].name, "餐饮");
        assert!(financial[0].is_expense());
        let salary = financial.iter().find(|c| c.name == "工资").unwrap();
        assert!(salary.is_income());
        assert!(financial.iter().all(|c| c.kind == CategoryKind::Financial));
    }

    #[test]
    fn todo_set_is_todo_kind() {
        let todo = default_todo_categories();
        assert_eq!(todo[0].name, "工作");
        assert_eq!(todo[1].name, "生活");
        assert!(todo.iter().all(|c| c.kind == CategoryKind::Todo));
    }

    #[test]
    fn every_call_yields_same_presets_with_fresh_ids() {
        let first = default_categories();
        let second = default_categories();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.color, b.color);
            assert_ne!(a.id, b.id);
        }
        let names: HashSet<_> = first.iter().map(|c| (c.kind, c.name.clone())).collect();
        assert_eq!(names.len(), first.len());
    }
}
