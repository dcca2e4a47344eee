//! End-to-end tests of the review session against a fixture vault, with
//! the clock pinned so date- and time-dependent behavior is repeatable.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use taskline::model::{DateBucket, FilterState, Priority, TaskKey};
use taskline::ops::mutate::{Mutation, SnoozeSpec};
use taskline::ops::review::{LoadStatus, Outcome, Reviewer};
use taskline::util::dates::{Clock, FixedClock};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/vault")
}

fn fixture(name: &str) -> String {
    fs::read_to_string(fixture_dir().join(name))
        .unwrap_or_else(|e| panic!("Could not read fixture {}: {}", name, e))
}

/// Copy the fixture vault into a fresh temp dir.
fn vault() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for entry in fs::read_dir(fixture_dir()).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, tmp.path().join(path.file_name().unwrap())).unwrap();
    }
    tmp
}

fn session(dir: &Path, clock: &Rc<FixedClock>, bucket: DateBucket) -> Reviewer {
    let mut reviewer = Reviewer::new(dir)
        .with_clock(Box::new(clock.clone()))
        .with_filter(FilterState {
            bucket,
            text: String::new(),
            exclude_hourly_snooze: true,
        });
    reviewer.refresh().unwrap();
    reviewer
}

fn visible(reviewer: &Reviewer) -> Vec<String> {
    reviewer
        .visible()
        .iter()
        .map(|t| t.text.trim_start().to_string())
        .collect()
}

fn key(dir: &Path, file: &str, line_index: usize) -> TaskKey {
    TaskKey::new(dir.join(file), line_index)
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

// ============================================================================
// Loading and filtering
// ============================================================================

#[test]
fn loads_only_open_dated_lines_from_markdown() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let reviewer = session(tmp.path(), &clock, DateBucket::All);

    assert_eq!(reviewer.tasks().len(), 8);
    assert!(reviewer.tasks().iter().all(|t| !t.text.contains("Done already")));
    assert!(reviewer.tasks().iter().all(|t| !t.text.contains("Not markdown")));
}

#[test]
fn all_bucket_sorted_by_priority_with_pending_snooze_hidden() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let reviewer = session(tmp.path(), &clock, DateBucket::All);

    assert_eq!(
        visible(&reviewer),
        vec![
            "* [ ] Plan trip ⏫ 📅 2024-06-05 #travel",
            "- [ ] Buy milk 📅 2024-01-01",
            "* [ ] Bad date 📅 2024-13-45",
            "- [ ] Draft roadmap 📅 2024-06-10",
            "- [ ] Someday idea 📅 2025-01-01",
            "- [ ] Nested errand 🔽 📅 2024-06-01 #errand",
            "- [ ] Hire designer 🔽 📅 2024-06-20",
        ]
    );
}

#[test]
fn past_includes_old_date_and_today_excludes_it() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::Past);
    assert_eq!(visible(&reviewer), vec!["- [ ] Buy milk 📅 2024-01-01"]);

    reviewer.set_filter(FilterState {
        bucket: DateBucket::Today,
        ..reviewer.filter().clone()
    });
    assert_eq!(
        visible(&reviewer),
        vec!["- [ ] Nested errand 🔽 📅 2024-06-01 #errand"]
    );
}

#[test]
fn forward_windows() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::NextWeek);
    assert_eq!(visible(&reviewer), vec!["* [ ] Plan trip ⏫ 📅 2024-06-05 #travel"]);

    reviewer.set_filter(FilterState {
        bucket: DateBucket::NextMonth,
        ..reviewer.filter().clone()
    });
    assert_eq!(
        visible(&reviewer),
        vec![
            "* [ ] Plan trip ⏫ 📅 2024-06-05 #travel",
            "- [ ] Draft roadmap 📅 2024-06-10",
            "- [ ] Hire designer 🔽 📅 2024-06-20",
        ]
    );
}

#[test]
fn invalid_date_only_listed_under_all() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let reviewer = session(tmp.path(), &clock, DateBucket::TodayOrBefore);
    let texts = visible(&reviewer);
    assert!(!texts.iter().any(|t| t.contains("Bad date")));
    assert!(texts.iter().any(|t| t.contains("Buy milk")));
}

#[test]
fn text_filter_applies_after_bucket() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);
    reviewer.set_filter(FilterState {
        text: "#ERRAND".to_string(),
        ..reviewer.filter().clone()
    });
    assert_eq!(
        visible(&reviewer),
        vec!["- [ ] Nested errand 🔽 📅 2024-06-01 #errand"]
    );
}

// ============================================================================
// Hourly snooze
// ============================================================================

#[test]
fn snooze_pending_at_eight_expired_at_ten() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::Today);
    assert!(!visible(&reviewer).iter().any(|t| t.contains("Call Bob")));

    reviewer.set_filter(FilterState {
        exclude_hourly_snooze: false,
        ..reviewer.filter().clone()
    });
    assert!(visible(&reviewer).iter().any(|t| t.contains("Call Bob")));

    clock.set(FixedClock::at("2024-06-01", "10:00").now());
    let status = reviewer.refresh().unwrap();
    assert_eq!(status, LoadStatus::Loaded { tasks: 8, swept: 1 });
    assert!(read(tmp.path(), "Daily.md").contains("- [ ] Call Bob 📅 2024-06-01\n"));
}

#[test]
fn snooze_to_passed_clock_time_moves_to_tomorrow() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "14:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);

    assert!(reviewer.select(&key(tmp.path(), "Daily.md", 2)));
    let spec: SnoozeSpec = "13:00".parse().unwrap();
    assert_eq!(reviewer.apply(&Mutation::Snooze(spec)).unwrap(), Outcome::Applied);
    assert!(read(tmp.path(), "Daily.md").contains("- [ ] Buy milk 📅 2024-06-02 snz:13:00\n"));
}

#[test]
fn snooze_by_hours_forces_today() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);

    reviewer.select(&key(tmp.path(), "Projects.md", 4));
    reviewer.apply(&Mutation::Snooze(SnoozeSpec::Hours(3))).unwrap();
    assert!(read(tmp.path(), "Projects.md").contains("- [ ] Someday idea 📅 2024-06-01 snz:11:00\n"));
    assert!(!visible(&reviewer).iter().any(|t| t.contains("Someday")));
}

// ============================================================================
// Mutations and undo
// ============================================================================

#[test]
fn setting_high_replaces_low() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);

    reviewer.select(&key(tmp.path(), "Projects.md", 3));
    reviewer.apply(&Mutation::Priority(Priority::High)).unwrap();
    let projects = read(tmp.path(), "Projects.md");
    assert!(projects.contains("- [ ] Hire designer ⏫ 📅 2024-06-20\n"));
    assert!(!projects.contains('🔽'));
    // Joins the other high task at the top; the cursor followed it
    assert_eq!(reviewer.selected_row(), Some(1));
}

#[test]
fn delete_then_undo_restores_file() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);

    reviewer.select(&key(tmp.path(), "Daily.md", 4));
    reviewer.delete().unwrap();
    assert!(!read(tmp.path(), "Daily.md").contains("Plan trip"));
    assert_eq!(reviewer.tasks().len(), 7);

    reviewer.undo().unwrap();
    assert_eq!(read(tmp.path(), "Daily.md"), fixture("Daily.md"));
    assert_eq!(reviewer.tasks().len(), 8);
    assert_eq!(
        reviewer.selected().map(|t| t.text.as_str()),
        Some("* [ ] Plan trip ⏫ 📅 2024-06-05 #travel")
    );
}

#[test]
fn undoing_everything_restores_every_file() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);

    reviewer.select(&key(tmp.path(), "Daily.md", 2));
    reviewer.apply(&Mutation::Snooze(SnoozeSpec::Days(3))).unwrap();
    reviewer.select(&key(tmp.path(), "Daily.md", 7));
    reviewer.apply(&Mutation::Priority(Priority::High)).unwrap();
    reviewer.apply(&Mutation::Tag("errand".to_string())).unwrap();
    reviewer.select(&key(tmp.path(), "Projects.md", 2));
    reviewer.apply(&Mutation::Complete).unwrap();
    reviewer.select(&key(tmp.path(), "Projects.md", 4));
    reviewer.delete().unwrap();
    assert_eq!(reviewer.clear_priorities().unwrap(), 3);

    assert_ne!(read(tmp.path(), "Daily.md"), fixture("Daily.md"));
    assert_eq!(reviewer.history_len(), 8);

    while reviewer.history_len() > 0 {
        assert_eq!(reviewer.undo().unwrap(), Outcome::Applied);
    }
    assert_eq!(read(tmp.path(), "Daily.md"), fixture("Daily.md"));
    assert_eq!(read(tmp.path(), "Projects.md"), fixture("Projects.md"));
}

#[test]
fn tagging_twice_is_idempotent() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);

    reviewer.select(&key(tmp.path(), "Projects.md", 2));
    reviewer.apply(&Mutation::Tag("work".to_string())).unwrap();
    reviewer.apply(&Mutation::Tag("#work".to_string())).unwrap();
    assert!(read(tmp.path(), "Projects.md").contains("- [ ] Draft roadmap 📅 2024-06-10 #work\n"));
}

#[test]
fn crlf_files_keep_their_line_endings() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("win.md"),
        "* [ ] a 📅 2024-06-01\r\n* [ ] b 📅 2024-06-01\r\n",
    )
    .unwrap();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = session(tmp.path(), &clock, DateBucket::All);

    reviewer.select(&key(tmp.path(), "win.md", 1));
    reviewer.apply(&Mutation::Complete).unwrap();
    assert_eq!(
        read(tmp.path(), "win.md"),
        "* [ ] a 📅 2024-06-01\r\n* [x] b 📅 2024-06-01\r\n"
    );
}

#[test]
fn new_task_lands_at_top_of_inbox() {
    let tmp = vault();
    let clock = Rc::new(FixedClock::at("2024-06-01", "08:00"));
    let mut reviewer = Reviewer::new(tmp.path())
        .with_clock(Box::new(clock.clone()))
        .with_inbox("Daily.md");
    reviewer.refresh().unwrap();

    let added = reviewer.add_task("Water plants", Priority::Low).unwrap();
    assert_eq!(added, Some(key(tmp.path(), "Daily.md", 0)));
    let daily = read(tmp.path(), "Daily.md");
    assert_eq!(
        daily,
        format!("* [ ] Water plants 🔽 📅 2024-06-01\n{}", fixture("Daily.md"))
    );
}
