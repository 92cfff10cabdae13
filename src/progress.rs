//! Terminal progress for the fetch stage.
//!
//! On a TTY the bar draws to stderr; otherwise it is hidden and the per-chunk
//! log lines are the only progress output.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;

fn chunk_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:<8.cyan.bold} {bar:30.green/dim} {pos:>4}/{len:4} chunks {elapsed:>4} {wide_msg:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Bar counting fetched chunks, drawn only when stderr is a terminal.
pub fn chunk_bar(total_chunks: usize) -> ProgressBar {
    let target = if std::io::stderr().is_terminal() {
        ProgressDrawTarget::stderr()
    } else {
        ProgressDrawTarget::hidden()
    };
    let pb = ProgressBar::with_draw_target(Some(total_chunks as u64), target);
    pb.set_style(chunk_style());
    pb.set_prefix("efetch");
    pb
}
