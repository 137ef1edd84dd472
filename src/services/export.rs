//! Export packaging: restores each matched image to its upload dimensions and
//! bundles everything into one in-memory ZIP archive.

use image::imageops::FilterType;
use image::{GenericImageView, ImageError};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::canvas::encode_png;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to process image '{filename}': {source}")]
    Image {
        filename: String,
        #[source]
        source: ImageError,
    },

    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to write archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// One image selected for export.
#[derive(Debug, Clone)]
pub struct ExportItem {
    pub id: i32,
    pub filename: String,
    pub data: Vec<u8>,
    pub width: i32,
    pub height: i32,
}

/// Decodes the stored payload and scales it back to `width` x `height`.
/// Non-positive dimensions leave the canvas size untouched.
#[allow(clippy::cast_sign_loss)]
pub fn restore_dimensions(item: &ExportItem) -> Result<Vec<u8>, ExportError> {
    let wrap = |source| ExportError::Image {
        filename: item.filename.clone(),
        source,
    };

    let img = image::load_from_memory(&item.data).map_err(wrap)?;

    let img = if item.width > 0 && item.height > 0 {
        let (width, height) = (item.width as u32, item.height as u32);
        if img.dimensions() == (width, height) {
            img
        } else {
            img.resize_exact(width, height, FilterType::CatmullRom)
        }
    } else {
        img
    };

    encode_png(&img).map_err(wrap)
}

/// Builds a deflate-compressed archive with one PNG per item, keyed by the
/// original filename.
pub fn build_archive(items: &[ExportItem]) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut used = HashSet::new();

    for item in items {
        let png = restore_dimensions(item)?;
        let name = unique_entry_name(&item.filename, item.id, &mut used);

        zip.start_file(name, options)?;
        zip.write_all(&png)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// `cat.png` stays `cat.png` the first time; a later image with the same name
/// becomes `cat_<id>.png`.
fn unique_entry_name(filename: &str, id: i32, used: &mut HashSet<String>) -> String {
    let base = if filename.trim().is_empty() {
        format!("image_{id}.png")
    } else {
        filename.to_string()
    };

    if used.insert(base.clone()) {
        return base;
    }

    let path = Path::new(&base);
    let stem = path
        .file_stem()
        .map_or_else(|| base.clone(), |s| s.to_string_lossy().into_owned());
    let renamed = match path.extension() {
        Some(ext) => format!("{stem}_{id}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{id}"),
    };

    used.insert(renamed.clone());
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Read;
    use zip::ZipArchive;

    fn item(id: i32, filename: &str, width: i32, height: i32) -> ExportItem {
        let canvas = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 640, Rgb([9, 9, 9])));
        ExportItem {
            id,
            filename: filename.to_string(),
            data: encode_png(&canvas).unwrap(),
            width,
            height,
        }
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> Vec<u8> {
        let mut file = archive.by_name(name).unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn restores_upload_dimensions() {
        let png = restore_dimensions(&item(1, "a.png", 300, 200)).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.dimensions(), (300, 200));
    }

    #[test]
    fn non_positive_dimensions_keep_canvas() {
        let png = restore_dimensions(&item(1, "a.png", 0, 0)).unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.dimensions(), (640, 640));
    }

    #[test]
    fn archive_contains_every_item_by_filename() {
        let bytes = build_archive(&[item(1, "cat.png", 100, 50), item(2, "dog.jpg", 64, 64)])
            .unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let cat = read_entry(&mut archive, "cat.png");
        assert_eq!(
            image::load_from_memory(&cat).unwrap().dimensions(),
            (100, 50)
        );
        assert!(archive.by_name("dog.jpg").is_ok());
    }

    #[test]
    fn duplicate_filenames_are_suffixed_with_id() {
        let bytes = build_archive(&[
            item(3, "same.png", 10, 10),
            item(8, "same.png", 10, 10),
            item(9, "README", 10, 10),
            item(11, "README", 10, 10),
        ])
        .unwrap();

        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["README", "README_11", "same.png", "same_8.png"]);
    }

    #[test]
    fn empty_selection_builds_an_empty_archive() {
        let bytes = build_archive(&[]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn corrupt_payload_names_the_file() {
        let mut broken = item(4, "broken.png", 10, 10);
        broken.data = b"nope".to_vec();
        let err = build_archive(&[broken]).unwrap_err();
        assert!(err.to_string().contains("broken.png"));
    }
}
