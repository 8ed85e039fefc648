//! Fixed values of the upload pipeline.

use std::time::Duration;

/// The only declared content type accepted by the video upload pipeline.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Declared content types accepted for thumbnails.
pub const THUMBNAIL_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Multipart field carrying the video body.
pub const VIDEO_FORM_FIELD: &str = "video";

/// Multipart field carrying the thumbnail body.
pub const THUMBNAIL_FORM_FIELD: &str = "thumbnail";

/// Bytes of secure randomness behind every generated object/file name.
pub const RANDOM_NAME_BYTES: usize = 32;

/// Default validity of a presigned GET URL on the read path.
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Issuer expected on access tokens.
pub const JWT_ISSUER: &str = "tubely-access";
