//! Image binary store seam between the graphic core and the package.

use super::error::OoxmlError;
use super::types::PackagePart;
use crate::image::ImageFormat;

/// Storage of image parts referenced from the main document part.
///
/// Part handles are part names (e.g. `/word/media/image1.png`); the main
/// document refers to them through relationship ids (e.g. `rId4`).
pub trait ImagePartStore {
    /// Store `data` as a new image part and relate it to the main document.
    ///
    /// Returns the new part name and its relationship id. Fails with
    /// [`OoxmlError::UnsupportedContentType`] when `format` has no image
    /// content type.
    fn add_image_part(
        &mut self,
        data: &[u8],
        format: ImageFormat,
    ) -> Result<(String, String), OoxmlError>;

    /// Relationship id under which the main document refers to `part_name`.
    fn relationship_id_of(&self, part_name: &str) -> Option<String>;

    /// Delete a part together with the relationship pointing at it.
    ///
    /// Fails with [`OoxmlError::PartNotFound`] if the package does not own
    /// `part_name`.
    fn delete_part(&mut self, part_name: &str) -> Result<(), OoxmlError>;

    /// All image parts related to the main document, in relationship order.
    fn image_parts(&self) -> Vec<(&PackagePart, &str)>;

    /// Raw bytes of a part.
    fn part_data(&self, part_name: &str) -> Option<&[u8]>;
}
