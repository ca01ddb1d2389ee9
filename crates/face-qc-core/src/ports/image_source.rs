//! Image source port.

use crate::domain::ImageInfo;

/// Port for loading decoded photos.
pub trait ImageSource: Send + Sync {
    /// Returns an iterator over decoded images.
    ///
    /// # Errors
    ///
    /// Individual items are errors when a file cannot be read or decoded;
    /// the caller reports them and moves on.
    fn images(&self) -> Box<dyn Iterator<Item = anyhow::Result<ImageInfo>> + Send + '_>;

    /// Returns the total number of images, if known up front.
    fn count_hint(&self) -> Option<usize>;
}
