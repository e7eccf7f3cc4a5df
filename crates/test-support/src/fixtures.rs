use std::io::{Cursor, Write};

use drapely_core::image::{DecodedImage, ImageSource};
use drapely_core::types::{Tier, TryOnRequest};
use image::{ImageFormat, Rgb, RgbImage};
use indexmap::IndexMap;
use zip::write::SimpleFileOptions;

/// PNG bytes of a solid-colour image.
pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode fixture png");
    buf
}

/// A 2x2 solid-colour bitmap.
pub fn decoded(source: ImageSource, color: [u8; 3]) -> DecodedImage {
    DecodedImage::new(source, RgbImage::from_pixel(2, 2, Rgb(color)))
}

/// ZIP archive containing `entries` in the given order.
pub fn zip_archive(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// A request for `garments` (id, url) pairs in the given order.
pub fn request(tier: Tier, subject_url: &str, garments: &[(&str, String)]) -> TryOnRequest {
    TryOnRequest {
        owner_id: "user-42".into(),
        notify_address: "shopper@example.com".into(),
        subject_image_url: subject_url.to_string(),
        garments: garments
            .iter()
            .map(|(id, url)| (id.to_string(), url.clone()))
            .collect::<IndexMap<_, _>>(),
        tier,
    }
}
