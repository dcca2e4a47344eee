//! Line-oriented review loop: print the filtered list, read a command,
//! apply it to the selected task, repeat.

use std::error::Error;
use std::io::{BufRead, Write};

use crate::cli::output::format_review_row;
use crate::io::usage::CounterStore;
use crate::model::filter::DateBucket;
use crate::model::task::Priority;
use crate::ops::mutate::{Mutation, SnoozeSpec};
use crate::ops::review::{LoadStatus, Outcome, Reviewer};

const ROW_WIDTH: usize = 100;

const HELP: &str = "\
  n, p                    next / previous task
  <row>                   select a row
  10m 2h 3d 3w mon 13:00 4p
                          snooze the selected task
  high, low, nopri        set priority
  done                    mark done
  del                     delete the line
  tag <name|N>            add a tag (N picks from `tags`)
  tags                    list quick tags
  clear                   remove every priority
  undo                    revert the last change
  bucket <name>           all, today, past, tomorrow, next-week,
                          next-month, today-or-before
  search [text]           text filter (empty clears)
  hourly                  toggle hiding tasks snoozed for later today
  add [--high|--low] <text>
                          new task in the inbox
  dir <path>              switch notes directory
  r                       reload from disk
  ls                      show the list
  q                       quit";

enum Step {
    Quit,
    /// Nothing changed on screen
    Stay,
    /// View changed; redraw
    Redraw,
    /// A counted action was applied
    Applied(String),
}

/// Run the loop until `q` or end of input. Usage counts are saved after
/// every applied action.
pub fn run<R: BufRead, W: Write>(
    reviewer: &mut Reviewer,
    tags: &[String],
    counters: &dyn CounterStore,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let mut counts = counters.load();
    print_list(reviewer, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line?;

        let step = match step(reviewer, tags, line.trim(), out) {
            Ok(step) => step,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                Step::Stay
            }
        };
        match step {
            Step::Quit => break,
            Step::Stay => {}
            Step::Redraw => print_list(reviewer, out)?,
            Step::Applied(label) => {
                counts.increment(&label);
                if let Err(e) = counters.save(&counts) {
                    log::warn!("could not save usage counts: {}", e);
                }
                print_list(reviewer, out)?;
            }
        }
    }
    Ok(())
}

fn print_list<W: Write>(reviewer: &Reviewer, out: &mut W) -> std::io::Result<()> {
    let filter = reviewer.filter();
    let visible = reviewer.visible();
    let mut header = format!(
        "[{}] {} of {} tasks",
        filter.bucket,
        visible.len(),
        reviewer.tasks().len()
    );
    if !filter.text.is_empty() {
        header.push_str(&format!("  search \"{}\"", filter.text));
    }
    if !filter.exclude_hourly_snooze {
        header.push_str("  (showing snoozed)");
    }
    writeln!(out, "{}", header)?;

    let selected = reviewer.selected_row();
    for (row, task) in visible.iter().enumerate() {
        writeln!(
            out,
            "{}",
            format_review_row(row, task, selected == Some(row), ROW_WIDTH)
        )?;
    }
    Ok(())
}

fn step<W: Write>(
    reviewer: &mut Reviewer,
    tags: &[String],
    input: &str,
    out: &mut W,
) -> Result<Step, Box<dyn Error>> {
    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (input, ""),
    };

    let step = match cmd.to_ascii_lowercase().as_str() {
        "" => Step::Stay,
        "q" | "quit" | "exit" => Step::Quit,
        "?" | "help" => {
            writeln!(out, "{}", HELP)?;
            Step::Stay
        }
        "ls" => Step::Redraw,
        "n" | "next" => {
            if !reviewer.select_next() {
                writeln!(out, "end of list")?;
            }
            Step::Redraw
        }
        "p" | "prev" => {
            if !reviewer.select_prev() {
                writeln!(out, "start of list")?;
            }
            Step::Redraw
        }
        "r" | "refresh" => {
            let status = reviewer.refresh()?;
            report_load(status, out)?;
            Step::Redraw
        }

        "done" | "x" => mutate(reviewer, Mutation::Complete, out)?,
        "high" => mutate(reviewer, Mutation::Priority(Priority::High), out)?,
        "low" => mutate(reviewer, Mutation::Priority(Priority::Low), out)?,
        "nopri" | "none" => mutate(reviewer, Mutation::Priority(Priority::Normal), out)?,
        "snooze" | "z" => {
            let spec: SnoozeSpec = rest.parse()?;
            mutate(reviewer, Mutation::Snooze(spec), out)?
        }
        "tag" | "t" => {
            let tag = quick_tag(tags, rest).unwrap_or(rest);
            if tag.trim_start_matches('#').is_empty() {
                writeln!(out, "usage: tag <name|N>")?;
                Step::Stay
            } else {
                mutate(reviewer, Mutation::Tag(tag.to_string()), out)?
            }
        }
        "tags" => {
            for (i, tag) in tags.iter().enumerate() {
                writeln!(out, "  {}  #{}", i + 1, tag)?;
            }
            Step::Stay
        }
        "del" | "delete" => outcome(reviewer.delete()?, "delete", out)?,
        "undo" | "u" => outcome(reviewer.undo()?, "undo", out)?,
        "clear" => {
            let changed = reviewer.clear_priorities()?;
            writeln!(out, "cleared priority on {} tasks", changed)?;
            if changed > 0 {
                Step::Applied("clear-priorities".to_string())
            } else {
                Step::Stay
            }
        }

        "bucket" | "b" => {
            let bucket: DateBucket = rest.parse()?;
            let mut filter = reviewer.filter().clone();
            filter.bucket = bucket;
            reviewer.set_filter(filter);
            Step::Redraw
        }
        "search" | "s" | "/" => {
            let mut filter = reviewer.filter().clone();
            filter.text = rest.to_string();
            reviewer.set_filter(filter);
            Step::Redraw
        }
        "hourly" => {
            let mut filter = reviewer.filter().clone();
            filter.exclude_hourly_snooze = !filter.exclude_hourly_snooze;
            reviewer.set_filter(filter);
            Step::Redraw
        }

        "add" | "a" => {
            let (priority, text) = split_priority_flag(rest);
            match reviewer.add_task(text, priority)? {
                Some(key) => {
                    writeln!(out, "added {}", key)?;
                    Step::Applied("add".to_string())
                }
                None => {
                    writeln!(out, "usage: add [--high|--low] <text>")?;
                    Step::Stay
                }
            }
        }
        "dir" => {
            if rest.is_empty() {
                writeln!(out, "{}", reviewer.dir().display())?;
                Step::Stay
            } else {
                let status = reviewer.set_directory(rest)?;
                report_load(status, out)?;
                Step::Redraw
            }
        }

        _ => {
            if rest.is_empty()
                && let Ok(row) = cmd.parse::<usize>()
            {
                if row == 0 || !reviewer.select_row(row - 1) {
                    writeln!(out, "no row {}", row)?;
                }
                Step::Redraw
            } else if let Ok(spec) = input.parse::<SnoozeSpec>() {
                mutate(reviewer, Mutation::Snooze(spec), out)?
            } else {
                writeln!(out, "unknown command '{}' (try help)", input)?;
                Step::Stay
            }
        }
    };
    Ok(step)
}

fn mutate<W: Write>(
    reviewer: &mut Reviewer,
    mutation: Mutation,
    out: &mut W,
) -> Result<Step, Box<dyn Error>> {
    let result = reviewer.apply(&mutation)?;
    outcome(result, &mutation.label(), out)
}

fn outcome<W: Write>(outcome: Outcome, label: &str, out: &mut W) -> Result<Step, Box<dyn Error>> {
    match outcome {
        Outcome::Applied => Ok(Step::Applied(label.to_string())),
        Outcome::Skipped(reason) => {
            writeln!(out, "skipped: {}", reason)?;
            Ok(Step::Stay)
        }
    }
}

fn report_load<W: Write>(status: LoadStatus, out: &mut W) -> std::io::Result<()> {
    match status {
        LoadStatus::Loaded { swept: 0, .. } => Ok(()),
        LoadStatus::Loaded { swept, .. } => writeln!(out, "cleared {} expired snoozes", swept),
        LoadStatus::NoFiles => writeln!(out, "no markdown files here; use `dir <path>`"),
    }
}

/// `tag 2` picks the second configured quick tag.
fn quick_tag<'a>(tags: &'a [String], arg: &str) -> Option<&'a str> {
    let n: usize = arg.parse().ok()?;
    tags.get(n.checked_sub(1)?).map(|s| s.as_str())
}

fn split_priority_flag(rest: &str) -> (Priority, &str) {
    if let Some(text) = rest.strip_prefix("--high") {
        (Priority::High, text.trim())
    } else if let Some(text) = rest.strip_prefix("--low") {
        (Priority::Low, text.trim())
    } else {
        (Priority::Normal, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::io::usage::MemoryCounterStore;
    use crate::util::dates::FixedClock;

    fn session(content: &str) -> (TempDir, Reviewer) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), content).unwrap();
        let clock = Rc::new(FixedClock::at("2024-06-01", "10:00"));
        let mut reviewer = Reviewer::new(tmp.path()).with_clock(Box::new(clock));
        reviewer.refresh().unwrap();
        (tmp, reviewer)
    }

    fn drive(reviewer: &mut Reviewer, store: &MemoryCounterStore, script: &str) -> String {
        let tags = vec!["drive".to_string(), "errand".to_string()];
        let mut out = Vec::new();
        run(reviewer, &tags, store, Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn done_then_undo_round_trips_file() {
        let (tmp, mut reviewer) = session("* [ ] a 📅 2024-06-01\n* [ ] b 📅 2024-06-01\n");
        let store = MemoryCounterStore::default();

        drive(&mut reviewer, &store, "n\ndone\n");
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.md")).unwrap(),
            "* [ ] a 📅 2024-06-01\n* [x] b 📅 2024-06-01\n"
        );

        drive(&mut reviewer, &store, "undo\nq\n");
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.md")).unwrap(),
            "* [ ] a 📅 2024-06-01\n* [ ] b 📅 2024-06-01\n"
        );
        let counts = store.load();
        assert_eq!(counts.get("done"), 1);
        assert_eq!(counts.get("undo"), 1);
    }

    #[test]
    fn bare_snooze_tokens_and_quick_tags() {
        let (tmp, mut reviewer) = session("* [ ] a 📅 2024-06-01\n");
        let store = MemoryCounterStore::default();
        drive(&mut reviewer, &store, "tag 2\n3d\n");
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.md")).unwrap(),
            "* [ ] a 📅 2024-06-04 #errand\n"
        );
        assert_eq!(store.load().get("3d"), 1);
        assert_eq!(store.load().get("#errand"), 1);
    }

    #[test]
    fn row_selection_and_multiword_snooze() {
        let (tmp, mut reviewer) = session("* [ ] a 📅 2024-06-01\n* [ ] b 📅 2024-06-01\n");
        let store = MemoryCounterStore::default();
        let output = drive(&mut reviewer, &store, "2\n7 hours\n");
        assert_eq!(
            fs::read_to_string(tmp.path().join("a.md")).unwrap(),
            "* [ ] a 📅 2024-06-01\n* [ ] b 📅 2024-06-01 snz:17:00\n"
        );
        assert!(output.contains("[all] 1 of 2 tasks"));
    }

    #[test]
    fn filters_and_unknown_commands() {
        let (_tmp, mut reviewer) =
            session("* [ ] a 📅 2024-05-01\n* [ ] Call Bob 📅 2024-06-01\n");
        let store = MemoryCounterStore::default();
        let output = drive(&mut reviewer, &store, "bucket past\nbogus\nbucket nowhere\n");
        assert!(output.contains("[past] 1 of 2 tasks"));
        assert!(output.contains("unknown command 'bogus'"));
        assert!(output.contains("error: unknown date bucket 'nowhere'"));

        drive(&mut reviewer, &store, "bucket all\nsearch bob\n");
        assert_eq!(reviewer.visible().len(), 1);
        assert!(store.load().is_empty());
    }

    #[test]
    fn add_with_priority_flag() {
        let (tmp, mut reviewer) = session("* [ ] a 📅 2024-05-01\n");
        let store = MemoryCounterStore::default();
        drive(&mut reviewer, &store, "add --high Pay rent\nadd\n");
        assert_eq!(
            fs::read_to_string(tmp.path().join("New Tasks.md")).unwrap(),
            "* [ ] Pay rent ⏫ 📅 2024-06-01\n"
        );
        assert_eq!(reviewer.selected().unwrap().text, "* [ ] Pay rent ⏫ 📅 2024-06-01");
    }

    #[test]
    fn skip_is_reported_not_counted() {
        let (_tmp, mut reviewer) = session("* [ ] a 📅 2024-06-01\n");
        let store = MemoryCounterStore::default();
        let output = drive(&mut reviewer, &store, "undo\n");
        assert!(output.contains("skipped: nothing to undo"));
        assert!(store.load().is_empty());
    }
}
