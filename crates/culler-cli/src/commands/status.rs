use anyhow::{Context, Result};
use colored::Colorize;
use culler_application::{LedgerStore, PositionMemory};
use culler_core::config::{CullerConfig, DeleteMode};
use culler_core::item::ItemStore;
use culler_core::review::ReviewState;
use culler_infrastructure::{DirectoryItemStore, TomlStateRepository};
use std::path::PathBuf;
use std::sync::Arc;

/// Prints collection and disposition counts without opening a session.
pub async fn run(dir: PathBuf, config: &CullerConfig) -> Result<()> {
    let store = DirectoryItemStore::new(
        dir.clone(),
        config.library.delete_mode,
        config.library.trash_dir.clone(),
    );
    let items = store
        .list_items()
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    let repository = Arc::new(TomlStateRepository::for_library(&dir).await?);
    let ledger = LedgerStore::new(repository.clone()).load().await;
    let last_viewed = PositionMemory::new(repository).load().await;

    let mut state = ReviewState::new(items, ledger);
    if let Some(id) = &last_viewed {
        state.seek(id);
    }
    let stats = state.stats();

    println!("{}", dir.display().to_string().bright_magenta().bold());
    println!("  items:              {}", stats.total);
    println!("  kept:               {}", stats.kept.to_string().green());
    println!(
        "  marked for delete:  {}",
        stats.marked_for_delete.to_string().red()
    );
    println!("  untagged:           {}", stats.untagged);
    match config.library.delete_mode {
        DeleteMode::Trash => println!("  trash:              {}", store.trash_dir().display()),
        DeleteMode::Remove => println!("  deletes:            {}", "permanent".red()),
    }
    if let Some(item) = state.current() {
        println!(
            "  resume at:          {} ({}/{})",
            item.id,
            state.cursor() + 1,
            stats.total
        );
    }

    Ok(())
}
