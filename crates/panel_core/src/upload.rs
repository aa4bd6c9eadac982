use std::ops::Range;

/// Upload chunk size in bytes (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// An artwork archive the user asked to upload, plus the form fields sent on completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub options: Vec<String>,
    pub filters: Vec<String>,
    pub plex_title: String,
    pub plex_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpec {
    pub index: usize,
    pub range: Range<usize>,
}

impl ChunkSpec {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Fixed-size split of a payload into sequential chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPlan {
    total_bytes: usize,
    chunk_size: usize,
}

impl UploadPlan {
    pub fn new(total_bytes: usize, chunk_size: usize) -> Self {
        Self {
            total_bytes,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn total_chunks(&self) -> usize {
        self.total_bytes.div_ceil(self.chunk_size)
    }

    pub fn chunks(&self) -> impl Iterator<Item = ChunkSpec> + '_ {
        (0..self.total_chunks()).map(move |index| {
            let start = index * self.chunk_size;
            let end = (start + self.chunk_size).min(self.total_bytes);
            ChunkSpec {
                index,
                range: start..end,
            }
        })
    }
}

/// Progress of one transfer. `offset` only moves forward, one chunk at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    file_name: String,
    plan: UploadPlan,
    offset: usize,
}

impl UploadSession {
    pub fn new(file_name: impl Into<String>, total_bytes: usize, chunk_size: usize) -> Self {
        Self {
            file_name: file_name.into(),
            plan: UploadPlan::new(total_bytes, chunk_size),
            offset: 0,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn plan(&self) -> UploadPlan {
        self.plan
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_complete(&self) -> bool {
        self.offset >= self.plan.total_bytes()
    }

    /// The chunk starting at the current offset, if any remain.
    pub fn next_chunk(&self) -> Option<ChunkSpec> {
        if self.is_complete() {
            return None;
        }
        let start = self.offset;
        let end = (start + self.plan.chunk_size()).min(self.plan.total_bytes());
        Some(ChunkSpec {
            index: start / self.plan.chunk_size(),
            range: start..end,
        })
    }

    /// Records that `chunk` was encoded and sent.
    pub fn advance(&mut self, chunk: &ChunkSpec) {
        if chunk.range.start == self.offset {
            self.offset = chunk.range.end.max(self.offset);
        }
    }

    pub fn percent(&self) -> u8 {
        if self.plan.total_bytes() == 0 {
            return 100;
        }
        let percent = (self.offset as u128 * 100) / self.plan.total_bytes() as u128;
        percent.min(100) as u8
    }
}
