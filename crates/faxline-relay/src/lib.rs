// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay runtime for faxline.
//!
//! Wires the filesystem watcher to the relay pipeline through a bounded
//! channel, keeps the retry journal, and runs the retention sweeper. All
//! long-running loops stop on a shared [`CancellationToken`].
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod journal;
pub mod pipeline;
pub mod shutdown;
pub mod sweeper;
pub mod watcher;

pub use journal::RetryJournal;
pub use pipeline::{PipelineSettings, RelayPipeline, ReplaySummary};
pub use shutdown::install_signal_handler;
pub use sweeper::RetentionSweeper;
pub use watcher::DirectoryWatcher;
