// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async I/O helpers using smol::unblock for non-blocking file operations

use std::io;
use std::path::Path;

/// Read the entire contents of a file into a bytes vector asynchronously.
///
/// Runs `std::fs::read` on smol's blocking pool, so it is safe to await from
/// any executor.
pub async fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    let path = path.to_path_buf();
    smol::unblock(move || std::fs::read(path)).await
}
