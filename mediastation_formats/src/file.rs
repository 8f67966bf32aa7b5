use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memmap2::{Mmap, MmapOptions};

use crate::datum::ChunkReader;

/// A compiled script file: one length-prefixed chunk, memory-mapped.
#[derive(Debug)]
pub struct BytecodeFile {
    path: PathBuf,
    mmap: Mmap,
    body: std::ops::Range<usize>,
}

impl BytecodeFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let file = File::open(&path_buf)
            .with_context(|| format!("opening bytecode file at {}", path_buf.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("memory-mapping bytecode file {}", path_buf.display()))?;

        let body = {
            let mut reader = ChunkReader::new(&mmap);
            let body = reader
                .read_chunk()
                .with_context(|| format!("reading chunk header of {}", path_buf.display()))?;
            let start = reader.position() - body.len();
            start..reader.position()
        };

        Ok(BytecodeFile {
            path: path_buf,
            mmap,
            body,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The chunk body without its length prefix.
    pub fn body(&self) -> &[u8] {
        &self.mmap[self.body.clone()]
    }

    /// Everything in the file, including the length prefix.
    pub fn raw(&self) -> &[u8] {
        &self.mmap
    }
}
