mod gcs_store;
mod local_store;
mod store_factory;

pub use gcs_store::GcsStagingStore;
pub use local_store::LocalStagingStore;
pub use store_factory::StagingStoreFactory;
