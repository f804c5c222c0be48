//! Interactive review loop.
//!
//! A thin presentation layer over [`ReviewSession`]: every line read from
//! the prompt maps to one session call, and every outcome is printed.

use anyhow::{Context, Result};
use colored::Colorize;
use culler_application::ReviewSession;
use culler_core::config::CullerConfig;
use culler_core::disposition::Disposition;
use culler_core::item::ItemId;
use culler_core::review::{
    CommitOutcome, RejectReason, ReviewSnapshot, SessionEvent, TagOutcome, UndoOutcome,
    ViewOutcome,
};
use culler_core::state::StateRepository;
use culler_infrastructure::{DirectoryItemStore, InMemoryStateRepository, TomlStateRepository};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::helper::ReviewHelper;

/// One parsed prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Tag(Disposition),
    Undo,
    Commit,
    Refresh,
    Goto(ItemId),
    Status,
    Help,
    Quit,
}

impl ReplCommand {
    fn parse(line: &str) -> std::result::Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let command = match verb {
            "k" | "keep" => Self::Tag(Disposition::Keep),
            "d" | "delete" => Self::Tag(Disposition::Delete),
            "u" | "undo" => Self::Undo,
            "c" | "commit" => Self::Commit,
            "r" | "refresh" => Self::Refresh,
            "g" | "goto" => {
                // Ids are relative paths and may contain spaces.
                let id = line.trim_start()[verb.len()..].trim();
                if id.is_empty() {
                    return Err(format!("Usage: {} <item id>", verb));
                }
                return Ok(Self::Goto(ItemId::from(id)));
            }
            "s" | "status" => Self::Status,
            "?" | "h" | "help" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => return Err(format!("Unknown command '{}'. Type ? for help.", other)),
        };
        match words.next() {
            Some(extra) => Err(format!("'{}' takes no argument (got '{}')", verb, extra)),
            None => Ok(command),
        }
    }
}

pub async fn run(
    dir: PathBuf,
    start: Option<String>,
    ephemeral: bool,
    config: &CullerConfig,
) -> Result<()> {
    let store = Arc::new(DirectoryItemStore::new(
        dir.clone(),
        config.library.delete_mode,
        config.library.trash_dir.clone(),
    ));
    let repository: Arc<dyn StateRepository> = if ephemeral {
        tracing::info!("[Review] Ephemeral session, nothing will be persisted");
        Arc::new(InMemoryStateRepository::new())
    } else {
        Arc::new(TomlStateRepository::for_library(&dir).await?)
    };

    let session = ReviewSession::new(store, repository, config.review.clone());
    let mut events = session.subscribe();

    let opened = session
        .open(start.map(ItemId::from))
        .await
        .with_context(|| format!("Cannot review {}", dir.display()))?;

    let mut rl: Editor<ReviewHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReviewHelper::new()));

    println!("{}", "=== culler ===".bright_magenta().bold());
    println!("{}", dir.display().to_string().bright_black());
    println!(
        "{}",
        "k keep, d delete, u undo, c commit, g ID jump, ? help, q quit".bright_black()
    );
    println!();

    drain_events(&mut events);
    print_view(&opened);
    refresh_completions(&mut rl, &session).await;

    loop {
        match rl.readline(&prompt(&session).await) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match ReplCommand::parse(trimmed) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message.yellow());
                        continue;
                    }
                };

                match command {
                    ReplCommand::Tag(direction) => {
                        report_tag(session.tag(direction).await);
                        show_current(&session).await;
                    }
                    ReplCommand::Undo => {
                        report_undo(session.undo().await);
                        show_current(&session).await;
                    }
                    ReplCommand::Commit => {
                        if confirm_commit(&mut rl, &session).await? {
                            report_commit(session.commit().await);
                            refresh_completions(&mut rl, &session).await;
                            show_current(&session).await;
                        }
                    }
                    ReplCommand::Refresh => {
                        report_view(session.refresh().await);
                        refresh_completions(&mut rl, &session).await;
                    }
                    ReplCommand::Goto(id) => report_view(session.jump_to(&id).await),
                    ReplCommand::Status => match session.snapshot().await {
                        Some(snapshot) => print_stats(&snapshot),
                        None => report_reject(RejectReason::Unavailable),
                    },
                    ReplCommand::Help => print_help(),
                    ReplCommand::Quit => break,
                }

                drain_events(&mut events);
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'q' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    if let Some(snapshot) = session.snapshot().await {
        let pending = snapshot.stats.marked_for_delete;
        if pending > 0 {
            println!(
                "{}",
                format!(
                    "{} item(s) still marked for deletion; run 'c' next time to remove them.",
                    pending
                )
                .yellow()
            );
        }
    }
    println!("{}", "Goodbye!".bright_green());

    Ok(())
}

// ============================================================================
// Prompt and rendering
// ============================================================================

async fn prompt(session: &ReviewSession) -> String {
    match session.snapshot().await {
        Some(snapshot) if snapshot.complete => format!("[done {}] > ", snapshot.len),
        Some(snapshot) => format!("[{}/{}] > ", snapshot.cursor + 1, snapshot.len),
        None => "[unavailable] > ".to_string(),
    }
}

async fn refresh_completions(
    rl: &mut Editor<ReviewHelper, DefaultHistory>,
    session: &ReviewSession,
) {
    let ids = session
        .items()
        .await
        .into_iter()
        .map(|item| item.id.to_string())
        .collect();
    if let Some(helper) = rl.helper_mut() {
        helper.set_item_ids(ids);
    }
}

async fn show_current(session: &ReviewSession) {
    if let Some(snapshot) = session.snapshot().await {
        print_snapshot(&snapshot);
    }
}

fn print_view(outcome: &ViewOutcome) {
    match outcome {
        ViewOutcome::Ready(snapshot) => print_snapshot(snapshot),
        ViewOutcome::Rejected(reason) => report_reject(*reason),
    }
}

fn print_snapshot(snapshot: &ReviewSnapshot) {
    let Some(item) = &snapshot.current else {
        if snapshot.len == 0 {
            println!("{}", "Library is empty.".bright_black());
        } else {
            println!(
                "{}",
                "Everything reviewed. 'c' commits deletions, 'u' steps back.".bright_green()
            );
        }
        return;
    };

    let marker = match snapshot.current_disposition {
        Some(Disposition::Keep) => " [keep]".green().to_string(),
        Some(Disposition::Delete) => " [delete]".red().to_string(),
        None => String::new(),
    };
    println!(
        "{} {}{}",
        item.id.to_string().bold(),
        item.sort_key.format("%Y-%m-%d %H:%M").to_string().bright_black(),
        marker
    );
    println!("  {}", item.display_ref.bright_black());
    if !snapshot.lookahead.is_empty() {
        let next: Vec<&str> = snapshot.lookahead.iter().map(|i| i.id.as_str()).collect();
        println!("  {} {}", "next:".bright_black(), next.join(", ").bright_black());
    }
}

fn print_stats(snapshot: &ReviewSnapshot) {
    let stats = &snapshot.stats;
    println!(
        "{} of {} reviewed: {} keep, {} delete, {} untagged{}",
        stats.reviewed,
        stats.total,
        stats.kept.to_string().green(),
        stats.marked_for_delete.to_string().red(),
        stats.untagged,
        if snapshot.can_undo { "" } else { " (nothing to undo)" }
    );
}

fn print_help() {
    let rows = [
        ("k, keep", "keep the current item and advance"),
        ("d, delete", "mark the current item for deletion and advance"),
        ("u, undo", "revert the last keep/delete"),
        ("c, commit", "delete every marked item now"),
        ("r, refresh", "re-read the library"),
        ("g, goto ID", "jump to an item"),
        ("s, status", "show counts"),
        ("q, quit", "leave; marks are kept for next time"),
    ];
    for (keys, text) in rows {
        println!("  {} {}", format!("{:<12}", keys).bright_cyan(), text);
    }
}

// ============================================================================
// Outcome reporting
// ============================================================================

fn report_reject(reason: RejectReason) {
    let message = match reason {
        RejectReason::ReviewComplete => "Nothing left to review.",
        RejectReason::Reconciling => "Busy applying a commit, try again.",
        RejectReason::Unavailable => "Library is not accessible.",
    };
    println!("{}", message.yellow());
}

fn report_tag(outcome: TagOutcome) {
    match outcome {
        TagOutcome::Tagged { id, disposition, .. } => match disposition {
            Disposition::Keep => println!("{} {}", "kept".green(), id),
            Disposition::Delete => println!("{} {}", "marked".red(), id),
        },
        TagOutcome::Rejected(reason) => report_reject(reason),
    }
}

fn report_undo(outcome: UndoOutcome) {
    match outcome {
        UndoOutcome::Undone { id, disposition, .. } => {
            println!("{} {} ({})", "undid".cyan(), id, disposition)
        }
        UndoOutcome::StaleEntryDiscarded => {
            println!("{}", "That step no longer applies and was skipped.".yellow())
        }
        UndoOutcome::NothingToUndo => println!("{}", "Nothing to undo.".bright_black()),
        UndoOutcome::Rejected(reason) => report_reject(reason),
    }
}

fn report_commit(result: culler_core::error::Result<CommitOutcome>) {
    match result {
        Ok(CommitOutcome::Committed(report)) => {
            println!(
                "{}",
                format!("Deleted {} item(s).", report.deleted.len()).green()
            );
            if !report.retained.is_empty() {
                println!(
                    "{}",
                    format!(
                        "{} item(s) could not be deleted and stay marked.",
                        report.retained.len()
                    )
                    .yellow()
                );
            }
        }
        Ok(CommitOutcome::NothingToCommit) => {
            println!("{}", "Nothing marked for deletion.".bright_black())
        }
        Ok(CommitOutcome::Rejected(reason)) => report_reject(reason),
        Err(e) => println!(
            "{}",
            format!("Commit failed, nothing was changed: {}", e).red()
        ),
    }
}

fn report_view(result: culler_core::error::Result<ViewOutcome>) {
    match result {
        Ok(outcome) => print_view(&outcome),
        Err(e) if e.is_not_found() => println!("{}", e.to_string().yellow()),
        Err(e) => println!("{}", e.to_string().red()),
    }
}

async fn confirm_commit(
    rl: &mut Editor<ReviewHelper, DefaultHistory>,
    session: &ReviewSession,
) -> Result<bool> {
    let pending = session
        .snapshot()
        .await
        .map(|s| s.stats.marked_for_delete)
        .unwrap_or(0);
    if pending == 0 {
        // Let the session report there is nothing to do.
        return Ok(true);
    }

    let question = format!("Delete {} item(s)? [y/N] ", pending);
    match rl.readline(&question) {
        Ok(answer) => Ok(matches!(answer.trim(), "y" | "Y" | "yes")),
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn drain_events(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::ReviewComplete) => {
                println!("{}", "Reached the end of the library.".bright_green())
            }
            Ok(SessionEvent::CollectionEmpty) => {
                println!("{}", "No photos left.".bright_black())
            }
            Ok(SessionEvent::Committed { failed, .. }) if !failed.is_empty() => {
                for id in failed {
                    println!("  {} {}", "kept back:".yellow(), id);
                }
            }
            Ok(SessionEvent::Committed { .. }) => {}
            Ok(SessionEvent::Unavailable) => {
                println!("{}", "Lost access to the library.".red())
            }
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!("[Review] Skipped {} session events", skipped)
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
