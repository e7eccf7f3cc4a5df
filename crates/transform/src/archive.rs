//! Demultiplexing of batch result archives.
//!
//! The transform service knows nothing about garment ids. It returns a
//! ZIP whose entries are named `output_<position>_<anything>.<ext>`, where
//! `position` is the 1-based index of the garment in the submitted form.
//! The caller's ordered id list is therefore the only way back from an
//! entry to a garment.

use std::io::{Cursor, Read};

use drapely_core::image::{DecodedImage, ImageSource};
use drapely_core::types::GarmentId;
use indexmap::IndexMap;

use crate::batch::BatchTransformError;

/// File extensions accepted as rendered outputs (compared lowercase).
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp"];

/// A garment for which the archive held no rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingOutput {
    /// 1-based submission position.
    pub position: usize,
    pub garment_id: GarmentId,
}

/// Demultiplexed batch result.
///
/// `images` may hold fewer garments than were submitted; every garment that
/// is absent appears in `missing`. Whole-batch failures are never
/// represented here, they are an `Err(BatchTransformError)` instead.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub images: IndexMap<GarmentId, DecodedImage>,
    pub missing: Vec<MissingOutput>,
}

/// Attribute archive entries to `garment_ids` by submission position.
pub fn demultiplex(
    archive: &[u8],
    garment_ids: &[GarmentId],
) -> Result<BatchOutput, BatchTransformError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive))?;

    let mut names = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        names.push(zip.by_index_raw(index)?.name().to_string());
    }
    tracing::info!(entries = names.len(), ?names, "Batch archive received");

    let mut output = BatchOutput::default();

    for (index, garment_id) in garment_ids.iter().enumerate() {
        let position = index + 1;

        let Some(name) = find_output_entry(&names, position) else {
            tracing::warn!(
                garment_id = %garment_id,
                position,
                "No output image for garment in batch archive"
            );
            output.missing.push(MissingOutput {
                position,
                garment_id: garment_id.clone(),
            });
            continue;
        };

        let mut data = Vec::new();
        zip.by_name(name)?
            .read_to_end(&mut data)
            .map_err(|source| BatchTransformError::Entry {
                name: name.to_string(),
                source,
            })?;

        let image = DecodedImage::decode(&data, ImageSource::Garment(garment_id.clone()))
            .map_err(|source| BatchTransformError::Decode {
                name: name.to_string(),
                source,
            })?;

        tracing::info!(garment_id = %garment_id, entry = name, "Extracted output image");
        output.images.insert(garment_id.clone(), image);
    }

    Ok(output)
}

/// First entry (in archive order) named `output_<position>_*` with an image
/// extension.
pub fn find_output_entry(names: &[String], position: usize) -> Option<&str> {
    let prefix = format!("output_{position}_");
    names
        .iter()
        .map(String::as_str)
        .find(|name| name.starts_with(&prefix) && has_image_extension(name))
}

fn has_image_extension(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
