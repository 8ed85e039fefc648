pub mod orientation;
pub mod storage_reference;
pub mod video;

pub use orientation::Orientation;
pub use storage_reference::{StorageReference, StorageReferenceError};
pub use video::{CreateVideoRequest, Video};
