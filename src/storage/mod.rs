//! Data store strategies and in-memory host backends

pub mod builder;
pub mod in_memory;
pub mod nil;
pub mod option;
pub mod record;

pub use builder::{DataStoreBuilder, HostBackends, StoreKind};
pub use in_memory::{InMemoryOptions, InMemoryRecords};
pub use nil::NilStore;
pub use option::OptionStore;
pub use record::RecordStore;
