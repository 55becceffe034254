//! In-process persistence adapters.
//!
//! Both stores keep their records behind a single mutex, which is what makes
//! the merge-style updates atomic: the load, mutate, and store of a partial
//! update all happen under one guard.

pub mod memory_accounts;
pub mod memory_hospitals;

pub use self::memory_accounts::InMemoryAccountRepository;
pub use self::memory_hospitals::InMemoryHospitalRepository;
