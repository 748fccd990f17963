use thiserror::Error;

pub type PageTableResult<T, E = PageTableError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum PageTableError {
    #[error("Hash exhausted: keys collide on all {depth} hash bits")]
    HashExhausted { depth: u32 },

    #[error("Directory cannot grow to 2^{depth} slots")]
    DirectoryOverflow { depth: u32 },

    #[error("Bucket index {index} out of range (directory size {len})")]
    BucketIndexOutOfRange { index: usize, len: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
