//! The shared import driver: validate, skip headers, parse line by line,
//! persist in bounded batches, report progress throughout.

use crate::categorizer::Categorizer;
use crate::db::TransactionStore;
use crate::error::{KopilkaError, Result};
use crate::models::Transaction;

use super::cursor::LineCursor;
use super::{
    CancelToken, ImportEvent, ImportSummary, LineOutcome, ProgressSink, StatementFormat,
    ValidationOutcome,
};

const TOTAL: u32 = 100;
/// Parse-phase percentage ceiling; the rest is headroom for the save phase.
const PARSE_CEILING: u32 = 70;
const PROGRESS_EVERY: usize = 10;
/// Parsed transactions are flushed to the store whenever this many are
/// buffered, so a huge statement never accumulates fully in memory.
const BATCH_SIZE: usize = 100;
const SAVE_PROGRESS_EVERY: usize = 25;

pub fn run(
    parser: &mut dyn StatementFormat,
    mut cursor: LineCursor,
    store: &dyn TransactionStore,
    categorizer: &dyn Categorizer,
    sink: &mut dyn ProgressSink,
    cancel: &CancelToken,
) -> Result<ImportSummary> {
    sink.emit(ImportEvent::Progress {
        current: 0,
        total: TOTAL,
        message: "reading statement".to_string(),
    });

    cursor.mark();
    match parser.validate(&mut cursor) {
        ValidationOutcome::Valid => {}
        ValidationOutcome::Mismatch => {
            return Err(KopilkaError::FormatMismatch(
                parser.source_name().to_string(),
            ))
        }
        ValidationOutcome::WrongSubtype(reason) => {
            return Err(KopilkaError::WrongSubtype(reason))
        }
    }
    cursor.rewind();
    parser.skip_headers(&mut cursor);

    let total_lines = cursor.remaining().max(1);
    let mut summary = ImportSummary::default();
    let mut batch: Vec<Transaction> = Vec::new();
    let mut last_percent = 0u32;
    let mut seen = 0usize;

    loop {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        let Some(line) = cursor.next_line() else { break };
        seen += 1;

        if seen % PROGRESS_EVERY == 0 {
            let percent = ((seen * PARSE_CEILING as usize / total_lines) as u32)
                .min(PARSE_CEILING)
                .max(last_percent);
            sink.emit(ImportEvent::Progress {
                current: percent,
                total: TOTAL,
                message: "parsing transactions".to_string(),
            });
            last_percent = percent;
        }

        if parser.should_skip_line(line) {
            continue;
        }
        match parser.parse_line(line) {
            LineOutcome::Parsed(parsed) => {
                let category = categorizer.classify(&parsed.title);
                batch.push(Transaction::new(
                    parsed.amount,
                    parsed.is_expense,
                    &parsed.currency,
                    parsed.date,
                    &parsed.title,
                    &category,
                    parser.source_name(),
                    parser.source_color(),
                    parsed.note,
                ));
                if batch.len() >= BATCH_SIZE {
                    persist(store, &mut batch, &mut summary, cancel);
                }
            }
            LineOutcome::Pending => {}
            LineOutcome::Rejected => summary.parse_skipped += 1,
        }
    }

    if !summary.cancelled {
        sink.emit(ImportEvent::Progress {
            current: PARSE_CEILING,
            total: TOTAL,
            message: "saving transactions".to_string(),
        });
        let to_save = batch.len().max(1);
        let mut done = 0usize;
        for tx in std::mem::take(&mut batch) {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            match store.add_transaction(&tx) {
                Ok(()) => summary.imported += 1,
                Err(_) => summary.persist_failed += 1,
            }
            done += 1;
            if done % SAVE_PROGRESS_EVERY == 0 {
                sink.emit(ImportEvent::Progress {
                    current: PARSE_CEILING + (TOTAL - PARSE_CEILING) * done as u32 / to_save as u32,
                    total: TOTAL,
                    message: "saving transactions".to_string(),
                });
            }
        }
    }

    if !summary.cancelled {
        sink.emit(ImportEvent::Progress {
            current: TOTAL,
            total: TOTAL,
            message: "finishing".to_string(),
        });
    }

    Ok(summary)
}

/// Mid-run flush. Per-transaction failures are counted, never fatal.
fn persist(
    store: &dyn TransactionStore,
    batch: &mut Vec<Transaction>,
    summary: &mut ImportSummary,
    cancel: &CancelToken,
) {
    for tx in batch.drain(..) {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            return;
        }
        match store.add_transaction(&tx) {
            Ok(()) => summary.imported += 1,
            Err(_) => summary.persist_failed += 1,
        }
    }
}
