use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use tasktally::models::{Category, CategoryDirectory, Priority, Task, TaskId};
use tasktally::summary::{completion_rate, start_of_week, SummaryEngine, MAX_BUCKETS};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Wednesday, 2025-03-05 15:00.
fn engine() -> SummaryEngine {
    SummaryEngine::new(at(2025, 3, 5, 15))
}

fn task(category: &str, due: Option<NaiveDateTime>, completed_at: Option<NaiveDateTime>) -> Task {
    Task {
        id: TaskId::new(),
        title: "Task".into(),
        description: String::new(),
        category_id: category.into(),
        priority: Priority::Medium,
        due_date: due,
        completed: completed_at.is_some(),
        completed_at,
        created_at: at(2025, 1, 1, 0),
        archived: false,
        archived_at: None,
        is_recurring: false,
        recurring_id: None,
    }
}

fn directory() -> CategoryDirectory {
    CategoryDirectory::new(vec![
        Category {
            id: "work".into(),
            name: "Work".into(),
            color: "#3b82f6".into(),
            icon: "Briefcase".into(),
        },
        Category {
            id: "home".into(),
            name: "Home".into(),
            color: "#10b981".into(),
            icon: "Home".into(),
        },
        Category {
            id: "health".into(),
            name: "Health".into(),
            color: "#ef4444".into(),
            icon: "Heart".into(),
        },
    ])
}

#[test]
fn rate_is_zero_without_denominator() {
    assert_eq!(completion_rate(0, 0), 0.0);
    assert_eq!(completion_rate(3, 0), 0.0);
    assert_eq!(completion_rate(1, 4), 25.0);
    assert_eq!(completion_rate(5, 2), 100.0);
}

#[test]
fn week_starts_on_configured_day() {
    assert_eq!(start_of_week(day(2025, 3, 5), Weekday::Sun), day(2025, 3, 2));
    assert_eq!(start_of_week(day(2025, 3, 2), Weekday::Sun), day(2025, 3, 2));
    assert_eq!(start_of_week(day(2025, 3, 5), Weekday::Mon), day(2025, 3, 3));
    assert_eq!(start_of_week(day(2025, 3, 2), Weekday::Mon), day(2025, 2, 24));
}

#[test]
fn daily_single_task_due_and_done_today() {
    let tasks = vec![task("work", Some(at(2025, 3, 5, 0)), Some(at(2025, 3, 5, 10)))];
    let buckets = engine().daily_summary(&tasks, 1);

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].date, day(2025, 3, 5));
    assert_eq!(buckets[0].completed, 1);
    assert_eq!(buckets[0].total, 1);
    assert_eq!(buckets[0].completion_rate, 100.0);
}

#[test]
fn daily_buckets_are_ascending_and_end_today() {
    let tasks = vec![
        task("work", Some(at(2025, 3, 3, 18)), None),
        task("work", Some(at(2025, 3, 3, 9)), Some(at(2025, 3, 4, 8))),
        task("home", None, Some(at(2025, 3, 5, 23))),
        task("home", Some(at(2025, 2, 1, 0)), None),
    ];
    let buckets = engine().daily_summary(&tasks, 3);

    let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
    assert_eq!(dates, vec![day(2025, 3, 3), day(2025, 3, 4), day(2025, 3, 5)]);

    assert_eq!((buckets[0].completed, buckets[0].total), (0, 2));
    assert_eq!(buckets[0].completion_rate, 0.0);
    assert_eq!((buckets[1].completed, buckets[1].total), (1, 0));
    assert_eq!(buckets[1].completion_rate, 0.0);
    assert_eq!((buckets[2].completed, buckets[2].total), (1, 0));
    assert_eq!(buckets[0].label, "Mar 03");
}

#[test]
fn daily_zero_days_is_empty() {
    assert!(engine().daily_summary(&[], 0).is_empty());
}

#[test]
fn huge_bucket_counts_are_capped() {
    let daily = engine().daily_summary(&[], 200_000_000);
    assert_eq!(daily.len(), MAX_BUCKETS);
    assert_eq!(daily.last().unwrap().date, day(2025, 3, 5));

    let weekly = engine().weekly_summary(&[], 20_000_000);
    assert_eq!(weekly.len(), MAX_BUCKETS);
    assert_eq!(weekly.last().unwrap().date, day(2025, 3, 2));
}

#[test]
fn buckets_stop_at_earliest_date() {
    let third = NaiveDate::MIN + Duration::days(3);
    let early = SummaryEngine::new(third.and_hms_opt(12, 0, 0).unwrap());

    let daily = early.daily_summary(&[], 10);
    assert_eq!(daily.len(), 4);
    assert_eq!(daily[0].date, NaiveDate::MIN);

    let weekly = early.weekly_summary(&[], 10);
    assert_eq!(weekly.len(), 1);
    early.overall_stats(&[]);
}

#[test]
fn weekly_buckets_use_week_start() {
    let tasks = vec![
        // Week of Feb 23 (Sunday start)
        task("work", Some(at(2025, 2, 25, 0)), Some(at(2025, 2, 24, 12))),
        task("work", Some(at(2025, 3, 1, 23)), None),
        // Current week, Mar 2 - Mar 8
        task("work", Some(at(2025, 3, 2, 0)), Some(at(2025, 3, 5, 9))),
        task("work", Some(at(2025, 3, 8, 20)), None),
    ];
    let buckets = engine().weekly_summary(&tasks, 2);

    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].date, day(2025, 2, 23));
    assert_eq!(buckets[0].label, "Feb 23 - Mar 01");
    assert_eq!((buckets[0].completed, buckets[0].total), (1, 2));
    assert_eq!(buckets[0].completion_rate, 50.0);
    assert_eq!(buckets[1].date, day(2025, 3, 2));
    assert_eq!((buckets[1].completed, buckets[1].total), (1, 2));

    let monday = engine().with_week_start(Weekday::Mon).weekly_summary(&tasks, 1);
    assert_eq!(monday[0].date, day(2025, 3, 3));
    assert_eq!((monday[0].completed, monday[0].total), (1, 1));
}

#[test]
fn category_breakdown_omits_empty_categories() {
    let tasks = vec![
        task("work", None, Some(at(2025, 3, 1, 9))),
        task("work", None, None),
        task("home", None, None),
        task("garden", None, Some(at(2025, 3, 2, 9))),
    ];
    let stats = engine().category_breakdown(&tasks, &directory());

    let ids: Vec<&str> = stats.iter().map(|s| s.category_id.as_str()).collect();
    assert_eq!(ids, vec!["work", "home", "garden"]);

    assert_eq!(stats[0].name.as_deref(), Some("Work"));
    assert_eq!(stats[0].color.as_deref(), Some("#3b82f6"));
    assert_eq!((stats[0].completed, stats[0].total), (1, 2));
    assert_eq!(stats[0].completion_rate, 50.0);
    assert_eq!(stats[2].name, None);

    let sum: usize = stats.iter().map(|s| s.total).sum();
    assert_eq!(sum, tasks.len());
}

#[test]
fn overall_stats_on_empty_repository() {
    let stats = engine().overall_stats(&[]);
    assert_eq!(stats.today.completion_rate, 0.0);
    assert_eq!(stats.week.completion_rate, 0.0);
    assert_eq!(stats.overall.completion_rate, 0.0);
    assert_eq!(stats.overall.total, 0);
}

#[test]
fn overall_stats_counts_periods() {
    let tasks = vec![
        task("work", Some(at(2025, 3, 5, 0)), Some(at(2025, 3, 5, 11))),
        task("work", Some(at(2025, 3, 5, 17)), None),
        task("work", Some(at(2025, 3, 7, 0)), Some(at(2025, 3, 3, 8))),
        task("work", Some(at(2025, 3, 12, 0)), None),
        task("work", None, None),
    ];
    let stats = engine().overall_stats(&tasks);

    assert_eq!((stats.today.completed, stats.today.due), (1, 2));
    assert_eq!(stats.today.completion_rate, 50.0);
    assert_eq!((stats.week.completed, stats.week.due), (2, 3));
    assert_eq!((stats.overall.completed, stats.overall.total), (2, 5));
    assert_eq!(stats.overall.completion_rate, 40.0);
}

#[test]
fn reopened_task_still_counts_by_completed_at() {
    let mut reopened = task("work", Some(at(2025, 3, 5, 0)), Some(at(2025, 3, 5, 10)));
    reopened.completed = false;
    let stats = engine().overall_stats(&[reopened]);

    assert_eq!(stats.today.completed, 1);
    assert_eq!(stats.overall.completed, 0);
}

#[test]
fn progress_counts_pending_due_today_and_overdue() {
    let tasks = vec![
        task("work", Some(at(2025, 3, 5, 20)), None),
        task("work", Some(at(2025, 3, 4, 20)), None),
        task("work", Some(at(2025, 3, 1, 0)), Some(at(2025, 3, 2, 0))),
        task("home", None, None),
    ];
    let progress = engine().progress(&tasks);

    assert_eq!(progress.total, 4);
    assert_eq!(progress.completed, 1);
    assert_eq!(progress.due_today, 1);
    assert_eq!(progress.overdue, 1);
}

#[test]
fn pending_by_category_includes_zeros() {
    let tasks = vec![
        task("work", None, None),
        task("work", None, Some(at(2025, 3, 1, 0))),
        task("home", None, None),
    ];
    let counts = engine().pending_by_category(&tasks, &directory());

    let pairs: Vec<(&str, usize)> = counts
        .iter()
        .map(|c| (c.category_id.as_str(), c.pending))
        .collect();
    assert_eq!(pairs, vec![("work", 1), ("home", 1), ("health", 0)]);
}
