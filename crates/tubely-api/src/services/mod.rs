pub mod thumbnail;

pub use thumbnail::ThumbnailService;
