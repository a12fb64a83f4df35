use pocketbook_core::db::open_db_in_memory;
use pocketbook_core::model::category::SUB_TYPE_EXPENSE;
use pocketbook_core::store::{
    BudgetStore, CategoryStore, SettingsStore, SqliteBudgetStore, SqliteCategoryStore,
    SqliteSettingsStore, SqliteTodoStore, SqliteTransactionStore, TodoStore, TransactionStore,
};
use pocketbook_core::{
    Budget, BudgetFilter, BudgetPeriod, Category, CategoryFilter, CategoryKind, Page, Priority,
    RepoError, SortOrder, TimeRange, TodoFilter, TodoItem, Transaction, TransactionFilter,
    TransactionKind, UserSettings,
};
use uuid::Uuid;

const JUNE_1: i64 = 1_780_272_000_000;
const DAY_MS: i64 = 86_400_000;

fn food() -> Category {
    Category::new("餐饮", CategoryKind::Financial, SUB_TYPE_EXPENSE, "#FF5722", "restaurant")
}

#[test]
fn transaction_roundtrip_preserves_every_field() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTransactionStore::new(&conn);

    let mut tx = Transaction::new(35.5, TransactionKind::Expense, Uuid::new_v4(), "午饭", JUNE_1);
    tx.description = Some("牛肉面".to_string());
    tx.set_tags(&["餐饮", "午餐"]);
    store.insert(&tx).unwrap();

    let loaded = store.get(tx.id).unwrap().unwrap();
    assert_eq!(loaded, tx);
    assert_eq!(loaded.tags.as_deref(), Some("餐饮, 午餐"));
    assert_eq!(loaded.tag_list(), vec!["餐饮", "午餐"]);
}

#[test]
fn get_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    assert!(SqliteTransactionStore::new(&conn)
        .get(Uuid::new_v4())
        .unwrap()
        .is_none());
    assert!(SqliteTodoStore::new(&conn)
        .get(Uuid::new_v4())
        .unwrap()
        .is_none());
    assert!(SqliteCategoryStore::new(&conn)
        .get(Uuid::new_v4())
        .unwrap()
        .is_none());
    assert!(SqliteBudgetStore::new(&conn)
        .get(Uuid::new_v4())
        .unwrap()
        .is_none());
}

#[test]
fn update_and_delete_missing_rows_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTransactionStore::new(&conn);
    let ghost = Transaction::new(1.0, TransactionKind::Income, Uuid::new_v4(), "ghost", JUNE_1);

    let err = store.update(&ghost).unwrap_err();
    assert!(err.is_not_found());
    let err = store.delete(ghost.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "transaction", .. }));

    let todos = SqliteTodoStore::new(&conn);
    assert!(todos.delete(Uuid::new_v4()).unwrap_err().is_not_found());
    assert!(todos
        .set_completed(Uuid::new_v4(), true)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn duplicate_id_surfaces_as_db_error() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCategoryStore::new(&conn);
    let category = food();

    store.insert(&category).unwrap();
    let err = store.insert(&category).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn transaction_filters_and_ordering() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTransactionStore::new(&conn);
    let food_id = Uuid::new_v4();
    let salary_id = Uuid::new_v4();

    let lunch = Transaction::new(30.0, TransactionKind::Expense, food_id, "Lunch", JUNE_1);
    let dinner = Transaction::new(80.0, TransactionKind::Expense, food_id, "Dinner", JUNE_1 + 1);
    let pay = Transaction::new(
        9000.0,
        TransactionKind::Income,
        salary_id,
        "Salary",
        JUNE_1 + DAY_MS,
    );
    for tx in [&lunch, &dinner, &pay] {
        store.insert(tx).unwrap();
    }

    let newest: Vec<_> = store
        .list(&TransactionFilter::default(), &Page::default())
        .unwrap()
        .into_iter()
        .map(|tx| tx.title)
        .collect();
    assert_eq!(newest, vec!["Salary", "Dinner", "Lunch"]);

    let oldest = store
        .list(&TransactionFilter::default(), &Page::oldest_first())
        .unwrap();
    assert_eq!(oldest[0].id, lunch.id);

    let expenses = store
        .list(&TransactionFilter::of_kind(TransactionKind::Expense), &Page::default())
        .unwrap();
    assert_eq!(expenses.len(), 2);

    let in_food = store
        .list(&TransactionFilter::in_category(food_id), &Page::first(1))
        .unwrap();
    assert_eq!(in_food.len(), 1);
    assert_eq!(in_food[0].id, dinner.id);

    let first_day = TransactionFilter::within(TimeRange::new(JUNE_1, JUNE_1 + DAY_MS - 1));
    assert_eq!(store.list(&first_day, &Page::default()).unwrap().len(), 2);
    assert_eq!(store.sum_amount(&first_day).unwrap(), 110.0);

    let search = TransactionFilter {
        text: Some("din".to_string()),
        ..TransactionFilter::default()
    };
    let found = store.list(&search, &Page::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, dinner.id);
}

#[test]
fn text_search_treats_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTransactionStore::new(&conn);
    let category_id = Uuid::new_v4();
    store
        .insert(&Transaction::new(5.0, TransactionKind::Expense, category_id, "50% off", JUNE_1))
        .unwrap();
    store
        .insert(&Transaction::new(5.0, TransactionKind::Expense, category_id, "500 off", JUNE_1))
        .unwrap();

    let filter = TransactionFilter {
        text: Some("0%".to_string()),
        ..TransactionFilter::default()
    };
    let found = store.list(&filter, &Page::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "50% off");
}

#[test]
fn page_limit_is_clamped_to_store_maximum() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTransactionStore::new(&conn).with_max_page_size(3);
    let category_id = Uuid::new_v4();
    for offset in 0..5 {
        store
            .insert(&Transaction::new(
                1.0,
                TransactionKind::Expense,
                category_id,
                "coffee",
                JUNE_1 + offset,
            ))
            .unwrap();
    }

    let filter = TransactionFilter::default();
    assert_eq!(store.list(&filter, &Page::first(100)).unwrap().len(), 3);
    assert_eq!(store.list(&filter, &Page::default()).unwrap().len(), 3);

    let tail = Page {
        sort: SortOrder::OldestFirst,
        limit: Some(3),
        offset: 3,
    };
    let rest = store.list(&filter, &tail).unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0].timestamp, JUNE_1 + 3);
}

#[test]
fn todo_roundtrip_completion_and_overdue_filter() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteTodoStore::new(&conn);
    let category_id = Uuid::new_v4();

    let mut report = TodoItem::new("Write report", category_id, JUNE_1);
    report.priority = Priority::High;
    report.due_date = Some(JUNE_1 + DAY_MS);
    report.progress = 40;
    report.description = Some("Q2".to_string());
    let groceries = TodoItem::new("Groceries", category_id, JUNE_1 + 1);
    store.insert(&report).unwrap();
    store.insert(&groceries).unwrap();

    assert_eq!(store.get(report.id).unwrap().unwrap(), report);

    let overdue = store
        .list(&TodoFilter::overdue_at(JUNE_1 + 2 * DAY_MS), &Page::default())
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, report.id);

    store.set_completed(report.id, true).unwrap();
    let done = store.get(report.id).unwrap().unwrap();
    assert!(done.is_completed);
    assert_eq!(done.progress, 100);
    assert!(store
        .list(&TodoFilter::overdue_at(JUNE_1 + 2 * DAY_MS), &Page::default())
        .unwrap()
        .is_empty());

    store.set_completed(report.id, false).unwrap();
    let reopened = store.get(report.id).unwrap().unwrap();
    assert!(!reopened.is_completed);
    assert_eq!(reopened.progress, 99);

    let open = store
        .list(&TodoFilter::completed(false), &Page::default())
        .unwrap();
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].id, groceries.id);
}

#[test]
fn categories_list_in_insertion_order_and_filter_by_kind() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteCategoryStore::new(&conn);
    let work = Category::new("工作", CategoryKind::Todo, "", "#2196F3", "work");
    let mut lunch = food();
    store.insert_all(&[lunch.clone(), work.clone()]).unwrap();
    assert_eq!(store.count().unwrap(), 2);

    let all = store.list(&CategoryFilter::default()).unwrap();
    assert_eq!(all, vec![lunch.clone(), work.clone()]);

    let todo_only = store.list(&CategoryFilter::of_kind(CategoryKind::Todo)).unwrap();
    assert_eq!(todo_only, vec![work]);

    let expense_only = store
        .list(&CategoryFilter::of_sub_type(CategoryKind::Financial, SUB_TYPE_EXPENSE))
        .unwrap();
    assert_eq!(expense_only.len(), 1);

    lunch.color = "#000000".to_string();
    store.update(&lunch).unwrap();
    assert_eq!(store.get(lunch.id).unwrap().unwrap().color, "#000000");

    store.delete(lunch.id).unwrap();
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn budget_roundtrip_active_filter_and_spent() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteBudgetStore::new(&conn);
    let category_id = Uuid::new_v4();
    let june = Budget::new(
        "June food",
        category_id,
        1500.0,
        BudgetPeriod::Monthly,
        JUNE_1,
        JUNE_1 + 30 * DAY_MS - 1,
    );
    let july = Budget::new(
        "July food",
        category_id,
        1500.0,
        BudgetPeriod::Monthly,
        JUNE_1 + 30 * DAY_MS,
        JUNE_1 + 61 * DAY_MS - 1,
    );
    store.insert(&june).unwrap();
    store.insert(&july).unwrap();

    assert_eq!(store.get(june.id).unwrap().unwrap(), june);

    let listed = store
        .list(&BudgetFilter::in_category(category_id), &Page::default())
        .unwrap();
    assert_eq!(listed[0].id, july.id);

    let active = store
        .list(&BudgetFilter::active_at(JUNE_1 + DAY_MS), &Page::default())
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, june.id);

    store.set_spent(june.id, 420.0).unwrap();
    assert_eq!(store.get(june.id).unwrap().unwrap().spent, 420.0);
    assert!(store.set_spent(Uuid::new_v4(), 1.0).unwrap_err().is_not_found());
}

#[test]
fn settings_upsert_replaces_existing_row() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteSettingsStore::new(&conn);
    assert!(store.get("u1").unwrap().is_none());

    let mut settings = UserSettings::defaults_for("u1");
    store.upsert(&settings).unwrap();
    settings.theme = "dark".to_string();
    store.upsert(&settings).unwrap();

    assert_eq!(store.get("u1").unwrap(), Some(settings));
    store.delete("u1").unwrap();
    assert!(store.delete("u1").unwrap_err().is_not_found());
}
