mod support;

use taskboard::filter::{filter_tasks, Criterion, FilterSpec, StatusFilter};
use taskboard::task::Priority;

use support::{at, ids, task, titled};

#[test]
fn all_criteria_at_default_return_input_unchanged() {
    let tasks = vec![
        task(3, Priority::Low, true, at(3)),
        task(1, Priority::High, false, at(1)),
        task(2, Priority::Medium, false, at(2)),
    ];
    let spec = FilterSpec::from_tokens(Some("all"), Some("all"), Some("all"), Some(""))
        .expect("tokens");
    assert_eq!(ids(filter_tasks(&tasks, &spec)), vec![3, 1, 2]);
}

#[test]
fn active_status_drops_completed_and_keeps_order() {
    let tasks = vec![
        task(1, Priority::Medium, false, at(1)),
        task(2, Priority::Medium, false, at(2)),
        task(3, Priority::Medium, true, at(3)),
    ];
    let spec = FilterSpec::default().with_status(StatusFilter::Active);
    assert_eq!(ids(filter_tasks(&tasks, &spec)), vec![1, 2]);

    let spec = FilterSpec::default().with_status(StatusFilter::Completed);
    assert_eq!(ids(filter_tasks(&tasks, &spec)), vec![3]);
}

#[test]
fn search_is_case_insensitive_substring() {
    let tasks = vec![titled(1, "Team meeting", None), titled(2, "Groceries", None)];
    let spec = FilterSpec::default().with_search("meet");
    assert_eq!(ids(filter_tasks(&tasks, &spec)), vec![1]);

    let spec = FilterSpec::default().with_search("GROC");
    assert_eq!(ids(filter_tasks(&tasks, &spec)), vec![2]);
}

#[test]
fn criteria_combine_as_conjunction() {
    let mut work_high = task(1, Priority::High, false, at(1));
    work_high.category_id = 2;
    work_high.title = "Ship release".to_string();
    let mut home_high = task(2, Priority::High, false, at(2));
    home_high.category_id = 3;
    home_high.title = "Ship parcel".to_string();
    let mut work_low = task(3, Priority::Low, false, at(3));
    work_low.category_id = 2;
    work_low.title = "Ship notes".to_string();
    let tasks = vec![work_high, home_high, work_low];

    let spec = FilterSpec::default()
        .with_priority(Priority::High)
        .with_category(2)
        .with_search("ship");
    assert_eq!(ids(filter_tasks(&tasks, &spec)), vec![1]);
    assert_eq!(
        spec.active_criteria(),
        vec![Criterion::Priority, Criterion::Category, Criterion::Search]
    );
    assert!(spec.is_filtered());
}

#[test]
fn unknown_tokens_are_rejected() {
    let err = FilterSpec::from_tokens(Some("archived"), None, None, None).expect_err("status");
    assert_eq!(err.exit_code(), 2);
}
