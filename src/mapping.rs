// Copyright 2025 Cornell University
// released under MIT License

use crate::errors::{Result, RunError};
use log::error;
use memmap2::{Mmap, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

enum Map {
    ReadOnly(Mmap),
    Writable(MmapMut),
}

/// A file whose leading bytes are mapped into memory.
///
/// Release with [`MappedFile::close`], which flushes, then unmaps, then closes
/// the file and reports what went wrong. A writable mapping dropped without
/// `close` is flushed on drop; if that flush fails the process aborts.
pub struct MappedFile {
    path: PathBuf,
    map: Option<Map>,
    file: Option<File>,
}

impl MappedFile {
    /// Maps the first `len` bytes of `path`, or the whole file for `None`.
    /// Requests longer than the file are cut to the file length.
    pub fn open(path: &Path, writable: bool, len: Option<usize>) -> Result<Self> {
        let io_err = |e| RunError::io(path, e);
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(io_err)?;
        let file_len = file.metadata().map_err(io_err)?.len();
        let file_len = usize::try_from(file_len).unwrap_or(usize::MAX);
        let len = len.map_or(file_len, |l| l.min(file_len));
        let mut options = MmapOptions::new();
        options.len(len);
        // SAFETY: the file stays open for as long as the mapping exists and
        // this process is the only writer while the tool runs.
        let map = unsafe {
            if writable {
                Map::Writable(options.map_mut(&file).map_err(io_err)?)
            } else {
                Map::ReadOnly(options.map(&file).map_err(io_err)?)
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            map: Some(map),
            file: Some(file),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.map {
            Some(Map::ReadOnly(m)) => &m[..],
            Some(Map::Writable(m)) => &m[..],
            None => &[],
        }
    }

    /// The mapped bytes, if the file was opened writable.
    pub fn as_bytes_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.map {
            Some(Map::Writable(m)) => Some(&mut m[..]),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.map, Some(Map::Writable(_)))
    }

    /// Flushes, unmaps and closes.
    pub fn close(mut self) -> Result<()> {
        if let Some(Map::Writable(m)) = &self.map {
            m.flush().map_err(|e| RunError::io(&self.path, e))?;
        }
        self.map = None;
        drop(self.file.take());
        Ok(())
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        if let Some(Map::Writable(m)) = &self.map {
            if let Err(e) = m.flush() {
                error!("failed to flush {}: {e}", self.path.display());
                std::process::abort();
            }
        }
    }
}
