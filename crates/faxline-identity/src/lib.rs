// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender identity resolution for scanned fax file names.

pub mod directory;
pub mod normalize;
pub mod resolver;
mod workbook;

pub use directory::{DirectoryTable, TableFormat};
pub use normalize::{directory_key, normalize_number};
pub use resolver::IdentityResolver;
