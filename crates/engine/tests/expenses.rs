mod common;

use engine::{
    DateRange, EngineError, ExpenseCategory, ExpensePatch, MoneyCents, NewExpense, NewGoal, Patch,
};

use common::{ALICE, BOB, ROOT, as_user, day, engine_with_db};

fn lunch(user_id: &str, cents: i64, date_day: u32) -> NewExpense {
    NewExpense {
        user_id: user_id.to_string(),
        description: "Lunch".to_string(),
        amount: MoneyCents::new(cents),
        category: "food".to_string(),
        date: Some(day(2026, 3, date_day)),
        goal_id: None,
    }
}

fn march_goal(user_id: &str) -> NewGoal {
    NewGoal {
        user_id: user_id.to_string(),
        title: "March food".to_string(),
        target_amount: MoneyCents::new(10_000),
        start_date: Some(day(2026, 3, 1)),
        end_date: Some(day(2026, 3, 31)),
        ..NewGoal::default()
    }
}

#[tokio::test]
async fn create_and_read_expense() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense(lunch(ALICE, 5_000, 10), &as_user(ALICE))
        .await
        .unwrap();
    assert_eq!(created.category, ExpenseCategory::Food);

    let loaded = engine.expense(&created.id, &as_user(ALICE)).await.unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn negative_amount_is_invalid() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_expense(lunch(ALICE, -500, 10), &as_user(ALICE))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "amount", .. }));
    assert!(err.to_string().contains("positive"));
}

#[tokio::test]
async fn unknown_category_is_invalid() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_expense(
            NewExpense {
                category: "groceries".to_string(),
                ..lunch(ALICE, 500, 10)
            },
            &as_user(ALICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "category", .. }));
}

#[tokio::test]
async fn other_user_is_forbidden() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense(lunch(ALICE, 5_000, 10), &as_user(ALICE))
        .await
        .unwrap();

    assert!(matches!(
        engine.expense(&created.id, &as_user(BOB)).await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine.list_expenses_for_user(ALICE, &as_user(BOB)).await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(matches!(
        engine
            .create_expense(lunch(ALICE, 100, 10), &as_user(BOB))
            .await,
        Err(EngineError::Forbidden(_))
    ));
    assert!(engine.expense(&created.id, &as_user(ROOT)).await.is_ok());
}

#[tokio::test]
async fn list_all_is_admin_only() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_expense(lunch(ALICE, 5_000, 10), &as_user(ALICE))
        .await
        .unwrap();
    engine
        .create_expense(lunch(BOB, 1_000, 11), &as_user(BOB))
        .await
        .unwrap();

    assert_eq!(engine.list_expenses(&as_user(ROOT)).await.unwrap().len(), 2);
    assert!(matches!(
        engine.list_expenses(&as_user(ALICE)).await,
        Err(EngineError::Forbidden(_))
    ));
}

#[tokio::test]
async fn update_keeps_owner() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense(lunch(ALICE, 5_000, 10), &as_user(ALICE))
        .await
        .unwrap();

    let err = engine
        .update_expense(
            &created.id,
            ExpensePatch {
                user_id: Some(BOB.to_string()),
                ..ExpensePatch::default()
            },
            &as_user(ROOT),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Forbidden("Cannot change expense ownership".to_string())
    );

    let updated = engine
        .update_expense(
            &created.id,
            ExpensePatch {
                user_id: Some(ALICE.to_string()),
                amount: Some(MoneyCents::new(7_500)),
                category: Some("travel".to_string()),
                ..ExpensePatch::default()
            },
            &as_user(ALICE),
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, MoneyCents::new(7_500));
    assert_eq!(updated.category, ExpenseCategory::Travel);
    assert_eq!(updated.description, "Lunch");
}

#[tokio::test]
async fn update_revalidates_amount() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense(lunch(ALICE, 5_000, 10), &as_user(ALICE))
        .await
        .unwrap();
    let err = engine
        .update_expense(
            &created.id,
            ExpensePatch {
                amount: Some(MoneyCents::ZERO),
                ..ExpensePatch::default()
            },
            &as_user(ALICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "amount", .. }));

    let unchanged = engine.expense(&created.id, &as_user(ALICE)).await.unwrap();
    assert_eq!(unchanged.amount, MoneyCents::new(5_000));
}

#[tokio::test]
async fn goal_link_must_belong_to_owner() {
    let (engine, _db) = engine_with_db().await;
    let bobs_goal = engine
        .create_goal(march_goal(BOB), &as_user(BOB))
        .await
        .unwrap();

    let err = engine
        .create_expense(
            NewExpense {
                goal_id: Some(bobs_goal.id.clone()),
                ..lunch(ALICE, 500, 10)
            },
            &as_user(ALICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "goal_id", .. }));

    let err = engine
        .create_expense(
            NewExpense {
                goal_id: Some("missing".to_string()),
                ..lunch(ALICE, 500, 10)
            },
            &as_user(ALICE),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "goal_id", .. }));
}

#[tokio::test]
async fn goal_link_can_be_cleared() {
    let (engine, _db) = engine_with_db().await;
    let goal = engine
        .create_goal(march_goal(ALICE), &as_user(ALICE))
        .await
        .unwrap();
    let expense = engine
        .create_expense(
            NewExpense {
                goal_id: Some(goal.id.clone()),
                ..lunch(ALICE, 500, 10)
            },
            &as_user(ALICE),
        )
        .await
        .unwrap();
    assert_eq!(
        engine
            .list_expenses_for_goal(&goal.id, &as_user(ALICE))
            .await
            .unwrap()
            .len(),
        1
    );

    let updated = engine
        .update_expense(
            &expense.id,
            ExpensePatch {
                goal_id: Patch::Clear,
                ..ExpensePatch::default()
            },
            &as_user(ALICE),
        )
        .await
        .unwrap();
    assert_eq!(updated.goal_id, None);
    assert!(
        engine
            .list_expenses_for_goal(&goal.id, &as_user(ALICE))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn soft_delete_hides_expense() {
    let (engine, _db) = engine_with_db().await;
    let created = engine
        .create_expense(lunch(ALICE, 5_000, 10), &as_user(ALICE))
        .await
        .unwrap();
    engine
        .delete_expense(&created.id, &as_user(ALICE))
        .await
        .unwrap();

    assert!(matches!(
        engine.expense(&created.id, &as_user(ALICE)).await,
        Err(EngineError::NotFound(_))
    ));
    assert!(
        engine
            .list_expenses_for_user(ALICE, &as_user(ALICE))
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        engine.delete_expense(&created.id, &as_user(ALICE)).await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test]
async fn delete_all_for_user_counts() {
    let (engine, _db) = engine_with_db().await;
    for d in [1, 2, 3] {
        engine
            .create_expense(lunch(ALICE, 1_000, d), &as_user(ALICE))
            .await
            .unwrap();
    }
    engine
        .create_expense(lunch(BOB, 1_000, 1), &as_user(BOB))
        .await
        .unwrap();

    let deleted = engine
        .delete_expenses_for_user(ALICE, &as_user(ALICE))
        .await
        .unwrap();
    assert_eq!(deleted, 3);
    assert_eq!(
        engine
            .list_expenses_for_user(BOB, &as_user(BOB))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn range_sum_is_inclusive() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_expense(lunch(ALICE, 1_000, 1), &as_user(ALICE))
        .await
        .unwrap();
    engine
        .create_expense(lunch(ALICE, 2_000, 15), &as_user(ALICE))
        .await
        .unwrap();
    engine
        .create_expense(lunch(ALICE, 4_000, 20), &as_user(ALICE))
        .await
        .unwrap();
    engine
        .create_expense(lunch(BOB, 8_000, 15), &as_user(BOB))
        .await
        .unwrap();

    let range = DateRange::new(day(2026, 3, 1), day(2026, 3, 15)).unwrap();
    let total = engine
        .sum_by_user_and_range(ALICE, range, &as_user(ALICE))
        .await
        .unwrap();
    assert_eq!(total, MoneyCents::new(3_000));

    let listed = engine
        .list_expenses_in_range(ALICE, range, &as_user(ALICE))
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);

    let empty = DateRange::new(day(2025, 1, 1), day(2025, 1, 31)).unwrap();
    assert_eq!(
        engine
            .sum_by_user_and_range(ALICE, empty, &as_user(ALICE))
            .await
            .unwrap(),
        MoneyCents::ZERO
    );
}

#[tokio::test]
async fn oversized_amounts_are_rejected_before_summing() {
    let (engine, _db) = engine_with_db().await;
    let ctx = as_user(ALICE);
    let half = i64::MAX / 2 + 1;

    let err = engine
        .create_expense(lunch(ALICE, half, 10), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "amount", .. }));

    let ceiling = MoneyCents::MAX_AMOUNT.cents();
    let first = engine
        .create_expense(lunch(ALICE, ceiling, 10), &ctx)
        .await
        .unwrap();
    engine
        .create_expense(lunch(ALICE, ceiling, 11), &ctx)
        .await
        .unwrap();

    let err = engine
        .update_expense(
            &first.id,
            ExpensePatch {
                amount: Some(MoneyCents::new(half)),
                ..ExpensePatch::default()
            },
            &ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument { field: "amount", .. }));

    let range = DateRange::new(day(2026, 3, 1), day(2026, 3, 31)).unwrap();
    let total = engine
        .sum_by_user_and_range(ALICE, range, &ctx)
        .await
        .unwrap();
    assert_eq!(total, MoneyCents::new(2 * ceiling));
}

#[tokio::test]
async fn goal_sum_with_and_without_range() {
    let (engine, _db) = engine_with_db().await;
    let goal = engine
        .create_goal(march_goal(ALICE), &as_user(ALICE))
        .await
        .unwrap();
    for (cents, d) in [(1_000, 5), (2_000, 25)] {
        engine
            .create_expense(
                NewExpense {
                    goal_id: Some(goal.id.clone()),
                    ..lunch(ALICE, cents, d)
                },
                &as_user(ALICE),
            )
            .await
            .unwrap();
    }

    let all = engine
        .sum_by_goal_and_range(&goal.id, None, &as_user(ALICE))
        .await
        .unwrap();
    assert_eq!(all, MoneyCents::new(3_000));

    let early = DateRange::new(day(2026, 3, 1), day(2026, 3, 10)).unwrap();
    let partial = engine
        .sum_by_goal_and_range(&goal.id, Some(early), &as_user(ALICE))
        .await
        .unwrap();
    assert_eq!(partial, MoneyCents::new(1_000));

    assert!(matches!(
        engine
            .sum_by_goal_and_range(&goal.id, None, &as_user(BOB))
            .await,
        Err(EngineError::Forbidden(_))
    ));
}
