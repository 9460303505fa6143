//! Video hosting providers
//!
//! The [`VideoProvider`] trait is the capability every hosting backend offers:
//! accept an upload, report the thumbnail once processing has produced one,
//! and delete a hosted video. Streamtape and Bunny Stream are implemented; the
//! backend is selected once at startup by [`create_provider`].
//!
//! Thumbnails uploaded by clients go to an [`ImageHost`] (Cloudinary).

pub mod bunny;
pub mod cloudinary;
pub mod factory;
pub mod streamtape;
pub mod traits;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use bunny::BunnyProvider;
pub use cloudinary::CloudinaryImageHost;
pub use factory::{create_image_host, create_provider};
pub use streamtape::StreamtapeProvider;
pub use traits::{
    HostedImage, ImageHost, ProviderError, ProviderResult, ThumbnailStatus, UploadTarget,
    UploadedVideo, VideoProvider,
};
pub use vidhub_core::ProviderBackend;
