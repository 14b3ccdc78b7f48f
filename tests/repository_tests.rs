use std::sync::Arc;
use std::thread;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tasktally::clock::FixedClock;
use tasktally::models::{NewTask, Priority, Task, TaskId, TaskPatch};
use tasktally::repository::{TaskFilter, TaskRepository};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn setup() -> (Arc<FixedClock>, TaskRepository) {
    let clock = Arc::new(FixedClock::new(at(2025, 3, 5, 9, 0)));
    let repo = TaskRepository::new(clock.clone());
    (clock, repo)
}

fn new_task(title: &str, category: &str) -> NewTask {
    NewTask {
        title: title.into(),
        category_id: category.into(),
        ..NewTask::default()
    }
}

#[test]
fn create_sets_defaults() {
    let (_clock, mut repo) = setup();
    let task = repo.create(new_task("Write report", "work")).unwrap();

    assert_eq!(task.title, "Write report");
    assert_eq!(task.created_at, at(2025, 3, 5, 9, 0));
    assert_eq!(task.priority, Priority::Low);
    assert!(!task.completed);
    assert!(task.completed_at.is_none());
    assert!(!task.archived);
    assert!(task.archived_at.is_none());
    assert!(!task.is_recurring);
    assert_eq!(repo.len(), 1);
}

#[test]
fn create_generates_unique_ids() {
    let (_clock, mut repo) = setup();
    let a = repo.create(new_task("A", "work")).unwrap();
    let b = repo.create(new_task("B", "work")).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn create_requires_title_and_category() {
    let (_clock, mut repo) = setup();

    let err = repo.create(new_task("  ", "work")).unwrap_err();
    assert!(err.is_validation());

    let err = repo.create(new_task("Title", "")).unwrap_err();
    assert!(err.is_validation());

    assert!(repo.is_empty());
}

#[test]
fn completing_stamps_completed_at_with_transition_time() {
    let (clock, mut repo) = setup();
    let task = repo.create(new_task("Task", "work")).unwrap();

    clock.advance(Duration::hours(3));
    let done = repo.update(task.id, TaskPatch::completed(true)).unwrap();
    assert!(done.completed);
    assert_eq!(done.completed_at, Some(at(2025, 3, 5, 12, 0)));

    // Completing again does not move the timestamp.
    clock.advance(Duration::hours(1));
    let again = repo.update(task.id, TaskPatch::completed(true)).unwrap();
    assert_eq!(again.completed_at, Some(at(2025, 3, 5, 12, 0)));
}

#[test]
fn reopening_keeps_completed_at() {
    let (clock, mut repo) = setup();
    let task = repo.create(new_task("Task", "work")).unwrap();

    repo.toggle_complete(task.id).unwrap();
    clock.advance(Duration::days(1));
    let reopened = repo.toggle_complete(task.id).unwrap();

    assert!(!reopened.completed);
    assert_eq!(reopened.completed_at, Some(at(2025, 3, 5, 9, 0)));

    let redone = repo.toggle_complete(task.id).unwrap();
    assert_eq!(redone.completed_at, Some(at(2025, 3, 6, 9, 0)));
}

#[test]
fn update_merges_patch_fields() {
    let (_clock, mut repo) = setup();
    let task = repo
        .create(NewTask {
            due_date: Some(at(2025, 3, 10, 0, 0)),
            ..new_task("Old", "work")
        })
        .unwrap();

    let updated = repo
        .update(
            task.id,
            TaskPatch {
                title: Some("New".into()),
                priority: Some(Priority::High),
                due_date: Some(None),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "New");
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.due_date, None);
    assert_eq!(updated.category_id, "work");
    assert_eq!(updated.created_at, task.created_at);
}

#[test]
fn unknown_ids_are_not_found() {
    let (_clock, mut repo) = setup();
    let missing = TaskId::new();

    assert!(repo.update(missing, TaskPatch::default()).unwrap_err().is_not_found());
    assert!(repo.delete(missing).unwrap_err().is_not_found());
    assert!(repo.archive(missing).unwrap_err().is_not_found());
    assert!(repo.restore(missing).unwrap_err().is_not_found());
    assert!(repo.get(missing).unwrap_err().is_not_found());
}

#[test]
fn delete_removes_permanently() {
    let (_clock, mut repo) = setup();
    let task = repo.create(new_task("Task", "work")).unwrap();
    repo.delete(task.id).unwrap();
    assert!(repo.is_empty());
    assert!(repo.delete(task.id).unwrap_err().is_not_found());
}

#[test]
fn archive_then_restore_round_trips_listings() {
    let (_clock, mut repo) = setup();
    let task = repo.create(new_task("Task", "work")).unwrap();
    repo.toggle_complete(task.id).unwrap();

    let archived = repo.archive(task.id).unwrap();
    assert!(archived.archived);
    assert_eq!(archived.archived_at, Some(at(2025, 3, 5, 9, 0)));
    assert!(archived.completed, "archiving leaves completion alone");
    assert!(repo.active().is_empty());
    assert_eq!(repo.archived().len(), 1);

    let restored = repo.restore(task.id).unwrap();
    assert!(!restored.archived);
    assert!(restored.archived_at.is_none());
    assert!(restored.completed);
    assert_eq!(repo.active().len(), 1);
    assert!(repo.archived().is_empty());
}

#[test]
fn listings_are_snapshots() {
    let (_clock, mut repo) = setup();
    let task = repo.create(new_task("Task", "work")).unwrap();

    let before = repo.list(&TaskFilter::default());
    repo.update(task.id, TaskPatch::completed(true)).unwrap();
    repo.create(new_task("Other", "home")).unwrap();

    assert_eq!(before.len(), 1);
    assert!(!before[0].completed);
}

#[test]
fn filters_combine() {
    let (_clock, mut repo) = setup();
    let a = repo
        .create(NewTask {
            description: "quarterly numbers".into(),
            ..new_task("Report", "work")
        })
        .unwrap();
    repo.create(new_task("Groceries", "home")).unwrap();
    let c = repo.create(new_task("Review report", "work")).unwrap();
    repo.toggle_complete(c.id).unwrap();

    assert_eq!(repo.by_category("work").len(), 2);
    assert_eq!(repo.completed().len(), 1);
    assert_eq!(repo.pending().len(), 2);

    let found = repo.list(&TaskFilter::default().search("REPORT").completed(false));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, a.id);

    let by_description = repo.list(&TaskFilter::default().search("quarterly"));
    assert_eq!(by_description.len(), 1);
}

#[test]
fn resolve_accepts_unique_prefix() {
    let (_clock, mut repo) = setup();
    let task = repo.create(new_task("Task", "work")).unwrap();

    assert_eq!(repo.resolve(&task.id.to_string()).unwrap(), task.id);
    assert_eq!(repo.resolve(&task.id.short()).unwrap(), task.id);
    assert!(repo.resolve("zzzz").unwrap_err().is_not_found());
}

#[test]
fn append_batch_is_all_or_nothing() {
    let (_clock, mut repo) = setup();
    let existing = repo.create(new_task("Existing", "work")).unwrap();

    let good = Task {
        id: TaskId::new(),
        ..existing.clone()
    };
    let bad = Task {
        id: TaskId::new(),
        title: String::new(),
        ..existing.clone()
    };

    let err = repo.append_batch(vec![good.clone(), bad]).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(repo.len(), 1);

    let duplicate = repo.append_batch(vec![good.clone(), existing.clone()]).unwrap_err();
    assert!(duplicate.is_validation());
    assert_eq!(repo.len(), 1);

    repo.append_batch(vec![good]).unwrap();
    assert_eq!(repo.len(), 2);
}

#[test]
fn append_batch_accepts_reopened_tasks() {
    let (clock, mut repo) = setup();
    let task = repo.create(new_task("Reopen me", "work")).unwrap();
    repo.toggle_complete(task.id).unwrap();
    let reopened = repo.toggle_complete(task.id).unwrap();
    assert!(!reopened.completed && reopened.completed_at.is_some());

    let mut other = TaskRepository::new(clock);
    other.append_batch(repo.snapshot()).unwrap();
    assert_eq!(other.get(task.id).unwrap().completed_at, reopened.completed_at);

    let missing_stamp = Task {
        id: TaskId::new(),
        completed: true,
        completed_at: None,
        ..reopened
    };
    assert!(other.append_batch(vec![missing_stamp]).unwrap_err().is_validation());
    assert_eq!(other.len(), 1);
}

#[test]
fn with_tasks_rejects_duplicate_ids() {
    let (clock, mut repo) = setup();
    let task = repo.create(new_task("Task", "work")).unwrap();
    let result = TaskRepository::with_tasks(vec![task.clone(), task], clock);
    assert!(result.is_err());
}

#[test]
fn shared_repository_serializes_writers() {
    let (_clock, repo) = setup();
    let shared = repo.into_shared();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let shared = shared.clone();
            thread::spawn(move || {
                for j in 0..10 {
                    let mut repo = shared.lock().unwrap();
                    repo.create(new_task(&format!("t{}-{}", i, j), "work")).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(shared.lock().unwrap().len(), 80);
}
