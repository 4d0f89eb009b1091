//! Deletion of orphan blobs.

use anyhow::Result;
use crossterm::tty::IsTty;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const PROMPT: &str = "Delete? (yes/no)";

/// Source of the answer to the deletion prompt.
pub trait Confirm {
    fn ask(&mut self, prompt: &str) -> Result<String>;
}

/// Reads the answer from the terminal, or from a plain line on stdin when
/// input is piped.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        if io::stdin().is_tty() {
            let answer = dialoguer::Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()?;
            return Ok(answer);
        }

        print!("{prompt} ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer)
    }
}

/// Only a literal "yes" (any case, surrounding whitespace ignored) confirms.
pub fn is_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneOutcome {
    NothingToDelete,
    Aborted,
    Finished { deleted: usize, failed: usize },
}

/// List the orphans, confirm unless `force`, then delete them one by one.
///
/// Individual failures are reported and do not stop the remaining deletions.
pub fn delete_orphans<W: Write>(
    orphans: &[PathBuf],
    force: bool,
    confirm: &mut dyn Confirm,
    out: &mut W,
) -> Result<PruneOutcome> {
    if orphans.is_empty() {
        writeln!(out, "\nNo orphan blobs found.")?;
        return Ok(PruneOutcome::NothingToDelete);
    }

    writeln!(out, "\nOrphan blobs to delete:")?;
    for path in orphans {
        writeln!(out, "  {}", display_name(path))?;
    }
    out.flush()?;

    if !force && !is_confirmed(&confirm.ask(PROMPT)?) {
        writeln!(out, "Aborted.")?;
        return Ok(PruneOutcome::Aborted);
    }

    let mut deleted = 0;
    let mut failed = 0;
    for path in orphans {
        match fs::remove_file(path) {
            Ok(()) => {
                deleted += 1;
                writeln!(out, "Deleted: {}", display_name(path))?;
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete blob");
                writeln!(out, "Failed: {} {}", path.display(), e)?;
            }
        }
    }

    writeln!(out, "Done.")?;
    Ok(PruneOutcome::Finished { deleted, failed })
}

fn display_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!("blobs/{name}")
}
