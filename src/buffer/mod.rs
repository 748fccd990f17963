pub mod page_table;

pub use page_table::PageTable;

pub type PageId = u32;
pub type FrameId = usize;
