//! Review Engine: walk an operator through the chunks flagged `needs_review`.
//!
//! Flagged chunks are visited in record order. For each one the operator
//! answers a single-letter command (case-insensitive):
//!
//! | Cmd | Effect | Advances |
//! |-----|--------|----------|
//! | `a` | status → `approved` | yes |
//! | `e` | content replaced by the lines typed up to an empty line, status → `edited` | yes |
//! | `d` | status → `discarded`, content kept | yes |
//! | `s` | nothing; the chunk comes back next run | yes |
//! | `q` | save and stop; this and later chunks stay `needs_review` | no |
//!
//! Anything else re-prompts. After every approve/edit/discard the whole
//! record is saved to the reviewed namespace, so a crash loses at most the
//! chunk on screen. Running out of input behaves like `q`; an edit cut short
//! by end of input is not applied.
//!
//! The session is generic over its input and output so it runs the same
//! against a terminal or an in-memory script.

pub mod table;

use crate::chunk::{Chunk, Decision};
use crate::error::LeserError;
use crate::store::{ChunkStore, Namespace};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};

pub use table::{format_content, format_table};

const PROMPT: &str = "[a]pprove / [e]dit / [d]iscard / [s]kip / [q]uit > ";

/// An operator command at the review prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Approve,
    Edit,
    Discard,
    Skip,
    Quit,
}

impl Command {
    /// Parse one line of operator input; `None` for anything unrecognised.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "a" => Some(Command::Approve),
            "e" => Some(Command::Edit),
            "d" => Some(Command::Discard),
            "s" => Some(Command::Skip),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// What a review run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Chunks that were `needs_review` when the run started.
    pub flagged: usize,
    pub approved: usize,
    pub edited: usize,
    pub discarded: usize,
    pub skipped: usize,
    /// The run stopped early (quit command or end of input).
    pub quit: bool,
    /// Reviewed record written by this run, if any.
    pub saved_to: Option<PathBuf>,
}

impl ReviewOutcome {
    pub fn decided(&self) -> usize {
        self.approved + self.edited + self.discarded
    }
}

/// One operator's pass over one record.
pub struct ReviewSession<'a, R, W> {
    store: &'a ChunkStore,
    name: String,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> ReviewSession<'a, R, W> {
    /// `name` is the record name the reviewed copy is saved under.
    pub fn new(store: &'a ChunkStore, name: impl Into<String>, input: R, output: W) -> Self {
        Self {
            store,
            name: name.into(),
            input,
            output,
        }
    }

    /// Review `chunks` in place.
    ///
    /// Returns once every flagged chunk has been visited or the operator
    /// quits. Save failures abort the run with the error.
    pub fn run(&mut self, chunks: &mut [Chunk]) -> Result<ReviewOutcome, LeserError> {
        let flagged: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.needs_review())
            .map(|(i, _)| i)
            .collect();

        let mut outcome = ReviewOutcome {
            flagged: flagged.len(),
            ..Default::default()
        };

        if flagged.is_empty() {
            writeln!(self.output, "nothing to review")?;
            return Ok(outcome);
        }

        writeln!(
            self.output,
            "\n{} chunks need review in {}\n",
            flagged.len(),
            self.name
        )?;

        for (pos, &i) in flagged.iter().enumerate() {
            self.show(pos + 1, flagged.len(), &chunks[i])?;

            loop {
                write!(self.output, "{PROMPT}")?;
                self.output.flush()?;

                let command = match self.read_line()? {
                    Some(line) => Command::parse(&line),
                    None => Some(Command::Quit),
                };

                let decision = match command {
                    Some(Command::Approve) => Decision::Approve,
                    Some(Command::Discard) => Decision::Discard,
                    Some(Command::Edit) => {
                        writeln!(self.output, "enter corrected content (end with empty line):")?;
                        match self.read_block()? {
                            Some(text) => Decision::Edit(text),
                            None => return self.quit(chunks, outcome),
                        }
                    }
                    Some(Command::Skip) => {
                        writeln!(self.output, "skipped")?;
                        outcome.skipped += 1;
                        debug!("chunk {} skipped", i);
                        break;
                    }
                    Some(Command::Quit) => return self.quit(chunks, outcome),
                    None => {
                        writeln!(self.output, "unknown action")?;
                        continue;
                    }
                };

                let ack = match decision {
                    Decision::Approve => {
                        outcome.approved += 1;
                        "approved"
                    }
                    Decision::Edit(_) => {
                        outcome.edited += 1;
                        "saved edit"
                    }
                    Decision::Discard => {
                        outcome.discarded += 1;
                        "discarded"
                    }
                };
                chunks[i].apply(decision);
                debug!("chunk {} → {}", i, chunks[i].status);
                outcome.saved_to = Some(self.save(chunks)?);
                writeln!(self.output, "{ack}")?;
                break;
            }
        }

        outcome.saved_to = Some(self.save(chunks)?);
        writeln!(self.output, "\ndone. reviewed file saved.")?;
        info!(
            "review of {} complete: {} decided, {} skipped",
            self.name,
            outcome.decided(),
            outcome.skipped
        );
        Ok(outcome)
    }

    fn show(&mut self, pos: usize, total: usize, chunk: &Chunk) -> Result<(), LeserError> {
        writeln!(
            self.output,
            "--- [{pos}/{total}] page {} | {} ---",
            chunk.page,
            chunk.kind()
        )?;
        writeln!(self.output, "{}", format_content(chunk))?;
        writeln!(self.output)?;
        Ok(())
    }

    fn quit(
        &mut self,
        chunks: &[Chunk],
        mut outcome: ReviewOutcome,
    ) -> Result<ReviewOutcome, LeserError> {
        outcome.saved_to = Some(self.save(chunks)?);
        outcome.quit = true;
        writeln!(self.output, "saved progress, quitting")?;
        info!(
            "review of {} interrupted after {} decisions",
            self.name,
            outcome.decided()
        );
        Ok(outcome)
    }

    fn save(&self, chunks: &[Chunk]) -> Result<PathBuf, LeserError> {
        self.store.save(chunks, Namespace::Reviewed, &self.name)
    }

    /// One line without its terminator, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>, LeserError> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    /// Lines up to (not including) the first empty one, joined by newlines.
    /// `None` if input ends first.
    fn read_block(&mut self) -> Result<Option<String>, LeserError> {
        let mut lines = Vec::new();
        loop {
            match self.read_line()? {
                None => return Ok(None),
                Some(line) if line.is_empty() => return Ok(Some(lines.join("\n"))),
                Some(line) => lines.push(line),
            }
        }
    }
}

/// Review the authoritative record for `name` (reviewed copy if one exists,
/// otherwise the parsed one) and save the result as the reviewed copy.
pub fn review_record<R: BufRead, W: Write>(
    store: &ChunkStore,
    name: &str,
    input: R,
    output: W,
) -> Result<ReviewOutcome, LeserError> {
    let (ns, mut chunks) = store.resolve(name)?;
    info!("reviewing {} from {} ({} chunks)", name, ns, chunks.len());
    ReviewSession::new(store, name, input, output).run(&mut chunks)
}
