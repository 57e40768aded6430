mod common;

use common::{date, fixture, ym};
use fintrack_core::errors::FinanceError;
use fintrack_core::ledger::{
    DateWindow, DeleteScope, OccurrenceKey, RecurrencePlan, RecurringStrategy,
};

#[test]
fn this_and_future_never_touches_earlier_instances() {
    let fx = fixture(date(2024, 6, 15), RecurringStrategy::materialized());
    let template_id = fx.recurring_expense("Rent", date(2024, 1, 1), "900");
    let june = fx
        .rows()
        .into_iter()
        .find(|r| r.date == date(2024, 6, 1) && r.parent_transaction_id.is_some())
        .unwrap();

    fx.session
        .delete_transaction(OccurrenceKey::persisted(june.id), Some(DeleteScope::ThisAndFuture))
        .unwrap();

    let rows = fx.rows();
    let instances: Vec<_> = rows.iter().filter(|r| r.parent_transaction_id.is_some()).collect();
    assert_eq!(instances.len(), 5);
    assert!(instances.iter().all(|r| r.date < date(2024, 6, 1)));
    let template = rows.iter().find(|r| r.id == template_id).unwrap();
    assert_eq!(template.ends_after, Some(ym(2024, 5)));

    // Nothing is synthesized past the cut either, even beyond the stored horizon.
    let later = DateWindow::new(date(2024, 6, 1), date(2026, 12, 31)).unwrap();
    assert!(fx.session.get_effective_transactions(&later).unwrap().is_empty());
    let earlier = DateWindow::new(date(2024, 1, 1), date(2024, 5, 31)).unwrap();
    assert_eq!(fx.session.get_effective_transactions(&earlier).unwrap().len(), 5);
}

#[test]
fn only_this_removes_one_month_for_good() {
    let fx = fixture(date(2024, 6, 15), RecurringStrategy::materialized());
    fx.recurring_expense("Gym", date(2024, 1, 20), "50");
    let march = fx
        .rows()
        .into_iter()
        .find(|r| r.date == date(2024, 3, 20) && r.parent_transaction_id.is_some())
        .unwrap();

    fx.session
        .delete_transaction(OccurrenceKey::persisted(march.id), Some(DeleteScope::OnlyThis))
        .unwrap();

    assert!(fx
        .session
        .get_effective_transactions(&DateWindow::month(ym(2024, 3)))
        .unwrap()
        .is_empty());
    assert_eq!(
        fx.session
            .get_effective_transactions(&DateWindow::month(ym(2024, 4)))
            .unwrap()
            .len(),
        1
    );
    assert_eq!(fx.rows().len(), 24);
}

#[test]
fn entire_series_removes_template_and_instances() {
    let fx = fixture(date(2024, 6, 15), RecurringStrategy::materialized());
    fx.recurring_expense("Rent", date(2024, 1, 1), "900");
    fx.session
        .create_transaction(fx.expense("Coffee", date(2024, 2, 2), "4.50"))
        .unwrap();
    let instance = fx
        .rows()
        .into_iter()
        .find(|r| r.parent_transaction_id.is_some())
        .unwrap();

    fx.session
        .delete_transaction(OccurrenceKey::persisted(instance.id), Some(DeleteScope::EntireSeries))
        .unwrap();

    let rows = fx.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "Coffee");
}

#[test]
fn virtual_occurrences_cannot_be_deleted() {
    let fx = fixture(date(2024, 6, 15), RecurringStrategy::Virtual);
    let template_id = fx.recurring_expense("Gym", date(2024, 1, 20), "50");
    let key = OccurrenceKey::Virtual {
        template_id,
        month: ym(2024, 4),
    };
    let err = fx
        .session
        .delete_transaction(key, Some(DeleteScope::OnlyThis))
        .unwrap_err();
    assert!(matches!(err, FinanceError::NotDeletable(k) if k == key));
    assert_eq!(fx.rows().len(), 1);
}

#[test]
fn series_members_require_a_scope() {
    let fx = fixture(date(2024, 6, 15), RecurringStrategy::Virtual);
    fx.session
        .create_transaction(
            fx.expense("Laptop", date(2024, 1, 10), "1200")
                .with_plan(RecurrencePlan::Installment { count: 4 }),
        )
        .unwrap();
    let second = fx
        .rows()
        .into_iter()
        .find(|r| r.installment_current == Some(2))
        .unwrap();
    let err = fx
        .session
        .delete_transaction(OccurrenceKey::persisted(second.id), None)
        .unwrap_err();
    assert!(matches!(err, FinanceError::Validation(_)));
    assert_eq!(fx.rows().len(), 4);
}

#[test]
fn installment_this_and_future_keeps_earlier_rows() {
    let fx = fixture(date(2024, 6, 15), RecurringStrategy::Virtual);
    fx.session
        .create_transaction(
            fx.expense("Laptop", date(2024, 1, 10), "1200")
                .with_plan(RecurrencePlan::Installment { count: 4 }),
        )
        .unwrap();
    let second = fx
        .rows()
        .into_iter()
        .find(|r| r.installment_current == Some(2))
        .unwrap();
    fx.session
        .delete_transaction(OccurrenceKey::persisted(second.id), Some(DeleteScope::ThisAndFuture))
        .unwrap();
    let rows = fx.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].installment_current, Some(1));
}

#[test]
fn single_rows_delete_without_scope() {
    let fx = fixture(date(2024, 6, 15), RecurringStrategy::Virtual);
    let plan = fx
        .session
        .create_transaction(fx.expense("Coffee", date(2024, 2, 2), "4.50"))
        .unwrap();
    let id = plan.primary_id().unwrap();
    fx.session
        .delete_transaction(OccurrenceKey::persisted(id), None)
        .unwrap();
    assert!(fx.rows().is_empty());
    assert!(matches!(
        fx.session.delete_transaction(OccurrenceKey::persisted(id), None),
        Err(FinanceError::NotFound(missing)) if missing == id
    ));
}
