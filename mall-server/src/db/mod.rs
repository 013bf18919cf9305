//! 数据访问层
//!
//! - `repository`: 存储契约 (async traits)
//! - `memory`: 进程内实现，单锁保证每个方法原子执行

pub mod memory;
pub mod repository;

pub use memory::MemoryStore;
pub use repository::{RepoError, RepoResult};
