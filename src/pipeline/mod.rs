pub mod analysis;
pub mod batch;
pub mod catalog;
pub mod checkpoint;
pub mod extraction;
pub mod import;
