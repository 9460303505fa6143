//! Test doubles for [`crate::VideoProvider`] and [`crate::ImageHost`]

mod mock_image_host;
mod mock_provider;

pub use mock_image_host::MockImageHost;
pub use mock_provider::{MockProvider, ThumbnailStep};
