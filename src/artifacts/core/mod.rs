//! Shared utilities
//!
//! `PagerWriter` lets long command output (`log`, `global-log`) go through
//! the `minus` pager while commands keep writing to a plain `io::Write`.

use derive_new::new;
use minus::Pager;
use std::io::{self, Write};

/// `io::Write` adapter over a [`minus::Pager`]
///
/// ```ignore
/// let pager = Pager::new();
/// let writer = PagerWriter::new(pager.clone());
/// // ... hand `writer` to the repository, run the command ...
/// minus::page_all(pager)?;
/// ```
#[derive(new, Clone)]
pub struct PagerWriter {
    pager: Pager,
}

impl PagerWriter {
    pub fn pager(&self) -> &Pager {
        &self.pager
    }
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(text).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
