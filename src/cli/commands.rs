use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tl", about = concat!("taskline v", env!("CARGO_PKG_VERSION"), " - triage dated tasks across your notes"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Notes directory for this run (overrides the configured one)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List open tasks through the filter, highest priority first
    List(ListArgs),
    /// Add a task to the inbox file, due today
    Add(AddArgs),
    /// Push a task's due date or hide it until a time
    Snooze(SnoozeArgs),
    /// Set or remove a task's priority
    Priority(PriorityArgs),
    /// Mark a task done
    Done(TaskRef),
    /// Append a tag to a task
    Tag(TagArgs),
    /// Delete a task's line from its file
    Delete(TaskRef),
    /// Remove the priority from every open task
    ClearPriorities,
    /// Clear snooze markers whose time has passed
    Sweep,
    /// List sync-conflict files in the notes directory
    Conflicts,
    /// Show or set the configured notes directory
    Dir(DirArgs),
    /// Show how often each action has been used
    Report,
    /// Step through tasks interactively
    Review,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Date bucket (all, today, past, tomorrow, next-week, next-month,
    /// today-or-before); default from config
    #[arg(long)]
    pub bucket: Option<String>,
    /// Case-insensitive text filter
    #[arg(long)]
    pub search: Option<String>,
    /// Show tasks hidden by an hourly snooze
    #[arg(long)]
    pub include_snoozed: bool,
}

#[derive(Args)]
pub struct DirArgs {
    /// New notes directory (omit to print the current one)
    pub path: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

/// A task addressed as `<file>:<line>` (1-based line)
#[derive(Args)]
pub struct TaskRef {
    /// Task location, e.g. "Work.md:12"
    pub task: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task description
    pub text: String,
    /// Mark as high priority
    #[arg(long, conflicts_with = "low")]
    pub high: bool,
    /// Mark as low priority
    #[arg(long)]
    pub low: bool,
}

#[derive(Args)]
pub struct SnoozeArgs {
    /// Task location, e.g. "Work.md:12"
    pub task: String,
    /// 10m, 2h, 3d, 3w, mon..sun, 13:00, 4p
    pub spec: String,
}

#[derive(Args)]
pub struct PriorityArgs {
    /// Task location, e.g. "Work.md:12"
    pub task: String,
    /// high, low, or none
    pub level: String,
}

#[derive(Args)]
pub struct TagArgs {
    /// Task location, e.g. "Work.md:12"
    pub task: String,
    /// Tag name, with or without '#'
    pub tag: String,
}
