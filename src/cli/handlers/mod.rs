mod review;

use std::error::Error;
use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::usage::{CounterStore, JsonCounterStore};
use crate::model::config::Config;
use crate::model::filter::DateBucket;
use crate::model::task::{Priority, TaskKey};
use crate::ops::mutate::{Mutation, SnoozeSpec};
use crate::ops::review::{LoadStatus, LogNotifier, Notifier, Outcome, Reviewer};

type CmdResult = Result<(), Box<dyn Error>>;

/// Everything a command needs: the loaded config and the notes directory
/// it resolved to.
struct Context {
    config: Config,
    dir: Option<PathBuf>,
    json: bool,
}

impl Context {
    fn load(cli: &Cli) -> Result<Context, Box<dyn Error>> {
        let config = config_io::read_config(&config_io::config_path())?;
        let dir = cli
            .dir
            .clone()
            .or_else(|| config.directory.clone())
            .map(|d| resolve_dir(&d));
        Ok(Context {
            config,
            dir,
            json: cli.json,
        })
    }

    fn dir(&self) -> Result<&Path, Box<dyn Error>> {
        self.dir
            .as_deref()
            .ok_or_else(|| "no notes directory configured (run `tl dir <path>` or pass -C)".into())
    }

    /// A session over the notes directory, already loaded.
    fn reviewer(&self, notifier: Box<dyn Notifier>) -> Result<Reviewer, Box<dyn Error>> {
        let mut reviewer = Reviewer::new(self.dir()?)
            .with_inbox(self.config.inbox.clone())
            .with_filter(self.config.filter.to_state())
            .with_notifier(notifier);
        reviewer.refresh()?;
        Ok(reviewer)
    }

    fn counters(&self) -> JsonCounterStore {
        JsonCounterStore::new(config_io::config_dir().join("usage.json"))
    }
}

/// Expands `~` and makes the path absolute when it exists.
fn resolve_dir(dir: &str) -> PathBuf {
    let expanded = match dir.strip_prefix("~/") {
        Some(rest) => std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(rest))
            .unwrap_or_else(|_| PathBuf::from(dir)),
        None => PathBuf::from(dir),
    };
    std::fs::canonicalize(&expanded).unwrap_or(expanded)
}

/// Surfaces session notices on stderr.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn no_files_found(&mut self, dir: &Path) {
        eprintln!("warning: no markdown files found in {}", dir.display());
    }

    fn conflict_detected(&mut self, file: &Path) {
        eprintln!("warning: sync conflict file: {}", file.display());
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let ctx = Context::load(&cli)?;

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&ctx, args),
        Commands::Conflicts => cmd_conflicts(&ctx),
        Commands::Report => cmd_report(&ctx),
        Commands::Dir(args) => cmd_dir(&ctx, args),

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Snooze(args) => {
            let spec: SnoozeSpec = args.spec.parse()?;
            cmd_mutate(&ctx, &args.task, Mutation::Snooze(spec))
        }
        Commands::Priority(args) => {
            let priority: Priority = args.level.parse()?;
            cmd_mutate(&ctx, &args.task, Mutation::Priority(priority))
        }
        Commands::Done(args) => cmd_mutate(&ctx, &args.task, Mutation::Complete),
        Commands::Tag(args) => cmd_mutate(&ctx, &args.task, Mutation::Tag(args.tag)),
        Commands::Delete(args) => cmd_delete(&ctx, &args.task),
        Commands::ClearPriorities => cmd_clear_priorities(&ctx),
        Commands::Sweep => cmd_sweep(&ctx),

        Commands::Review => cmd_review(&ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse `<file>:<line>` (1-based) into a key under `dir`.
fn parse_task_ref(dir: &Path, task: &str) -> Result<TaskKey, Box<dyn Error>> {
    let (name, line) = task
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <file>:<line>, got '{}'", task))?;
    let line: usize = line
        .parse()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| format!("invalid line number in '{}'", task))?;
    if name.is_empty() {
        return Err(format!("missing file name in '{}'", task).into());
    }
    Ok(TaskKey::new(dir.join(name), line - 1))
}

/// Load the directory and select the addressed task.
fn select_task(ctx: &Context, task: &str) -> Result<(Reviewer, TaskKey), Box<dyn Error>> {
    let mut reviewer = ctx.reviewer(Box::new(StderrNotifier))?;
    let key = parse_task_ref(reviewer.dir(), task)?;
    if !reviewer.select(&key) {
        return Err(format!("no open task at {}", task).into());
    }
    Ok((reviewer, key))
}

/// Persist `dir` as the configured notes directory, keeping the rest of
/// the config file as written.
fn save_directory(dir: &Path) -> CmdResult {
    let config_path = config_io::config_path();
    let (_, mut doc) = config_io::read_config_doc(&config_path)?;
    config_io::set_directory(&mut doc, &dir.display().to_string());
    config_io::write_config(&config_path, &doc)?;
    log::info!("notes directory set to {}", dir.display());
    Ok(())
}

/// Bump a usage counter. Failures to persist are logged, never fatal.
fn record_usage(store: &dyn CounterStore, label: &str) {
    let mut counts = store.load();
    counts.increment(label);
    if let Err(e) = store.save(&counts) {
        log::warn!("could not save usage counts: {}", e);
    }
}

fn report_outcome(
    ctx: &Context,
    reviewer: &Reviewer,
    key: &TaskKey,
    verb: &str,
    outcome: Outcome,
) -> CmdResult {
    let task = reviewer.find(key);
    if ctx.json {
        let (applied, reason) = match outcome {
            Outcome::Applied => (true, None),
            Outcome::Skipped(r) => (false, Some(r.to_string())),
        };
        let out = ChangeJson {
            applied,
            reason,
            task: task.map(task_to_json),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    match (outcome, task) {
        (Outcome::Applied, Some(t)) => println!("{}", format_task_line(t, 0)),
        (Outcome::Applied, None) => println!("{} {}", verb, key),
        (Outcome::Skipped(reason), _) => eprintln!("skipped {}: {}", key, reason),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, args: ListArgs) -> CmdResult {
    let mut reviewer = ctx.reviewer(Box::new(StderrNotifier))?;
    let mut filter = reviewer.filter().clone();
    if let Some(bucket) = args.bucket {
        filter.bucket = bucket.parse::<DateBucket>()?;
    }
    if let Some(search) = args.search {
        filter.text = search;
    }
    if args.include_snoozed {
        filter.exclude_hourly_snooze = false;
    }
    reviewer.set_filter(filter);

    let visible = reviewer.visible();
    if ctx.json {
        let out = TaskListJson {
            directory: reviewer.dir().display().to_string(),
            bucket: reviewer.filter().bucket.to_string(),
            total: reviewer.tasks().len(),
            tasks: visible.iter().map(|t| task_to_json(t)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_task_listing(&visible) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_conflicts(ctx: &Context) -> CmdResult {
    // The listing is the report; no per-file warnings
    let reviewer = ctx.reviewer(Box::new(LogNotifier))?;
    let names: Vec<String> = reviewer.conflicts().iter().map(|p| file_name(p)).collect();
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

fn cmd_report(ctx: &Context) -> CmdResult {
    let counts = ctx.counters().load();
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&usage_to_json(&counts))?);
    } else if counts.is_empty() {
        println!("no actions recorded yet");
    } else {
        for line in format_usage(&counts) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_dir(ctx: &Context, args: DirArgs) -> CmdResult {
    let Some(path) = args.path else {
        let dir = ctx.dir()?;
        if ctx.json {
            println!("{}", serde_json::to_string(&dir.display().to_string())?);
        } else {
            println!("{}", dir.display());
        }
        return Ok(());
    };

    let dir = resolve_dir(&path);
    if !dir.is_dir() {
        return Err(format!("not a directory: {}", dir.display()).into());
    }
    save_directory(&dir)?;
    println!("{}", dir.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> CmdResult {
    let priority = match (args.high, args.low) {
        (true, _) => Priority::High,
        (_, true) => Priority::Low,
        _ => Priority::Normal,
    };
    let mut reviewer = ctx.reviewer(Box::new(LogNotifier))?;
    let key = reviewer
        .add_task(&args.text, priority)?
        .ok_or("task description is empty")?;
    record_usage(&ctx.counters(), "add");
    report_outcome(ctx, &reviewer, &key, "added", Outcome::Applied)
}

fn cmd_mutate(ctx: &Context, task: &str, mutation: Mutation) -> CmdResult {
    let (mut reviewer, key) = select_task(ctx, task)?;
    let outcome = reviewer.apply(&mutation)?;
    if outcome.applied() {
        record_usage(&ctx.counters(), &mutation.label());
    }
    report_outcome(ctx, &reviewer, &key, &mutation.label(), outcome)
}

fn cmd_delete(ctx: &Context, task: &str) -> CmdResult {
    let (mut reviewer, key) = select_task(ctx, task)?;
    let outcome = reviewer.delete()?;
    if outcome.applied() {
        record_usage(&ctx.counters(), "delete");
    }
    // The key now points at whatever moved up; report by location only
    if ctx.json {
        let out = ChangeJson {
            applied: outcome.applied(),
            reason: match outcome {
                Outcome::Skipped(r) => Some(r.to_string()),
                Outcome::Applied => None,
            },
            task: None,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match outcome {
            Outcome::Applied => println!("deleted {}", key),
            Outcome::Skipped(reason) => eprintln!("skipped {}: {}", key, reason),
        }
    }
    Ok(())
}

fn cmd_clear_priorities(ctx: &Context) -> CmdResult {
    let mut reviewer = ctx.reviewer(Box::new(StderrNotifier))?;
    let changed = reviewer.clear_priorities()?;
    if changed > 0 {
        record_usage(&ctx.counters(), "clear-priorities");
    }
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&CountJson { changed })?);
    } else {
        println!("cleared priority on {} tasks", changed);
    }
    Ok(())
}

fn cmd_sweep(ctx: &Context) -> CmdResult {
    let mut reviewer = Reviewer::new(ctx.dir()?).with_notifier(Box::new(StderrNotifier));
    let changed = match reviewer.refresh()? {
        LoadStatus::Loaded { swept, .. } => swept,
        LoadStatus::NoFiles => 0,
    };
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&CountJson { changed })?);
    } else {
        println!("cleared {} expired snoozes", changed);
    }
    Ok(())
}

fn cmd_review(ctx: &Context) -> CmdResult {
    let mut reviewer = ctx.reviewer(Box::new(StderrNotifier))?;
    let counters = ctx.counters();
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    review::run(
        &mut reviewer,
        &ctx.config.tags,
        &counters,
        stdin.lock(),
        &mut stdout,
    )?;

    // Remember a directory picked during the session
    if ctx.dir.as_deref() != Some(reviewer.dir()) && reviewer.dir().is_dir() {
        save_directory(reviewer.dir())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ref_is_one_based() {
        let key = parse_task_ref(Path::new("/notes"), "Work.md:12").unwrap();
        assert_eq!(key, TaskKey::new("/notes/Work.md", 11));
    }

    #[test]
    fn task_ref_keeps_colons_in_name() {
        let key = parse_task_ref(Path::new("/notes"), "a:b.md:1").unwrap();
        assert_eq!(key, TaskKey::new("/notes/a:b.md", 0));
    }

    #[test]
    fn task_ref_rejects_bad_input() {
        for bad in ["Work.md", "Work.md:0", "Work.md:x", ":3"] {
            assert!(parse_task_ref(Path::new("/notes"), bad).is_err(), "{}", bad);
        }
    }
}
