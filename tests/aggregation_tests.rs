mod common;

use common::{date, fixture, ym};
use fintrack_core::currency::Money;
use fintrack_core::ledger::{
    DateWindow, GoalConfig, OccurrenceKey, RecurrencePlan, RecurringStrategy, Tag,
};

fn strategies() -> [RecurringStrategy; 2] {
    [RecurringStrategy::Virtual, RecurringStrategy::materialized()]
}

#[test]
fn recurring_commitment_counts_from_its_month_onward() {
    for strategy in strategies() {
        let fx = fixture(date(2024, 3, 20), strategy);
        fx.recurring_expense("Gym", date(2024, 1, 15), "50");

        let history = fx.session.history().unwrap();
        assert_eq!(history.len(), 12);
        assert_eq!(history.first().unwrap().month, ym(2023, 4));
        assert_eq!(history.last().unwrap().month, ym(2024, 3));
        for point in &history {
            let expected = if point.month >= ym(2024, 1) {
                Money::from_major(50)
            } else {
                Money::ZERO
            };
            assert_eq!(point.expenses, expected, "{strategy:?} {}", point.month);
        }
    }
}

#[test]
fn march_gets_the_template_amount_without_stored_instances() {
    let fx = fixture(date(2024, 3, 20), RecurringStrategy::Virtual);
    fx.recurring_expense("Gym", date(2024, 1, 15), "50");
    assert_eq!(fx.rows().len(), 1);

    let aggregates = fx.session.get_aggregates(&DateWindow::month(ym(2024, 3))).unwrap();
    assert_eq!(aggregates.totals.expenses, Money::from_major(50));
    let march = aggregates.history.iter().find(|p| p.month == ym(2024, 3)).unwrap();
    assert_eq!(march.expenses, Money::from_major(50));
}

#[test]
fn expanded_and_replicated_history_agree() {
    for strategy in strategies() {
        let fx = fixture(date(2024, 8, 1), strategy);
        fx.recurring_expense("Streaming", date(2023, 11, 30), "19.99");
        fx.recurring_expense("Rent", date(2024, 2, 1), "900");
        fx.session
            .create_transaction(fx.income("Salary", date(2024, 5, 5), "3000"))
            .unwrap();
        fx.session
            .create_transaction(fx.expense("Groceries", date(2024, 7, 12), "245.30"))
            .unwrap();
        fx.session
            .create_transaction(
                fx.expense("Sofa", date(2024, 6, 20), "1000")
                    .with_plan(RecurrencePlan::Installment { count: 4 }),
            )
            .unwrap();

        let expanded = fx.session.history().unwrap();
        let replicated = fx.session.history_replicated().unwrap();
        assert_eq!(expanded, replicated, "{strategy:?}");
        let july = expanded.iter().find(|p| p.month == ym(2024, 7)).unwrap();
        assert_eq!(july.expenses, Money::from_cents(1999 + 90_000 + 24_530 + 25_000));
    }
}

#[test]
fn replicated_history_keeps_template_values_for_edited_months() {
    let fx = fixture(date(2024, 8, 1), RecurringStrategy::Virtual);
    let template = fx
        .session
        .create_transaction(
            fx.income("Freelance", date(2024, 3, 10), "800")
                .paid(false)
                .with_plan(RecurrencePlan::Recurring),
        )
        .unwrap()
        .primary_id()
        .unwrap();
    fx.session
        .set_paid(
            OccurrenceKey::Virtual {
                template_id: template,
                month: ym(2024, 5),
            },
            true,
        )
        .unwrap();

    let expanded = fx.session.history().unwrap();
    let replicated = fx.session.history_replicated().unwrap();
    assert_eq!(expanded.len(), replicated.len());
    for (full, replica) in expanded.iter().zip(&replicated) {
        if full.month == ym(2024, 5) {
            assert_eq!(full.income, Money::from_major(800));
            assert_eq!(replica.income, Money::ZERO);
        } else {
            assert_eq!(full, replica, "{}", full.month);
        }
    }
}

#[test]
fn hidden_rows_and_unpaid_income_stay_out_of_totals() {
    let fx = fixture(date(2024, 3, 20), RecurringStrategy::Virtual);
    fx.recurring_expense("Gym", date(2024, 1, 15), "50");
    fx.session
        .create_transaction(fx.expense("Transfer", date(2024, 3, 2), "400").hidden(true))
        .unwrap();
    fx.session
        .create_transaction(fx.income("Salary", date(2024, 3, 5), "2000"))
        .unwrap();
    fx.session
        .create_transaction(fx.income("Bonus", date(2024, 3, 25), "500").paid(false))
        .unwrap();
    fx.session
        .create_transaction(fx.expense("Market", date(2024, 3, 6), "30").paid(true))
        .unwrap();

    let totals = fx
        .session
        .get_aggregates(&DateWindow::month(ym(2024, 3)))
        .unwrap()
        .totals;
    assert_eq!(totals.income, Money::from_major(2000));
    assert_eq!(totals.expenses, Money::from_major(80));
    assert_eq!(totals.paid_expenses, Money::from_major(30));
    assert_eq!(totals.unpaid_expenses, Money::from_major(50));
}

#[test]
fn goal_overspend_reports_negative_remaining() {
    let mut fx = fixture(date(2024, 3, 20), RecurringStrategy::Virtual);
    let goals: Vec<_> = fx.session.catalog().goals_in_order().iter().map(|g| g.id).collect();
    let shares = [10, 30, 20, 20, 10, 10];
    fx.session
        .set_goal_percentages(
            goals
                .iter()
                .zip(shares)
                .map(|(goal_id, percentage)| GoalConfig {
                    goal_id: *goal_id,
                    percentage,
                })
                .collect(),
        )
        .unwrap();
    fx.session
        .create_transaction(fx.income("Salary", date(2024, 3, 5), "2000"))
        .unwrap();
    fx.session
        .create_transaction(fx.expense("Rent", date(2024, 3, 8), "650").with_goal(goals[1]))
        .unwrap();

    let progress = fx
        .session
        .get_goals_progress(&DateWindow::month(ym(2024, 3)))
        .unwrap();
    let fixed = progress.iter().find(|p| p.goal_id == goals[1]).unwrap();
    assert_eq!(fixed.ceiling, Money::from_major(600));
    assert_eq!(fixed.spent, Money::from_major(650));
    assert_eq!(fixed.remaining, Money::from_major(-50));
    assert!(fixed.over_budget);
    let freedom = progress.iter().find(|p| p.goal_id == goals[0]).unwrap();
    assert_eq!(freedom.ceiling, Money::from_major(200));
    assert_eq!(freedom.remaining, Money::from_major(200));
}

#[test]
fn tag_breakdown_uses_catalog_names() {
    let mut fx = fixture(date(2024, 3, 20), RecurringStrategy::Virtual);
    let user = fx.user;
    let food = fx.session.catalog_mut().add_tag(Tag::new(user, "Food"));
    fx.session
        .create_transaction(fx.expense("Market", date(2024, 3, 6), "30").with_tag(food))
        .unwrap();
    fx.session
        .create_transaction(fx.expense("Taxi", date(2024, 3, 7), "12"))
        .unwrap();

    let by_tag = fx
        .session
        .get_aggregates(&DateWindow::month(ym(2024, 3)))
        .unwrap()
        .by_tag;
    assert_eq!(by_tag.get("Food"), Some(&Money::from_major(30)));
    assert_eq!(by_tag.get("Uncategorized"), Some(&Money::from_major(12)));
}
