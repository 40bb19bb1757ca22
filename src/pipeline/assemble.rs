//! PDF assembly: downloaded page images → one image per PDF page.
//!
//! Each page's MediaBox is the image's pixel size at 72 dpi, so a page is
//! exactly as large as its image and nothing is scaled or cropped. JPEG data
//! (what the reader serves) is embedded byte-for-byte as a `DCTDecode`
//! XObject; any other format is decoded and stored as Flate-compressed
//! 8-bit samples.
//!
//! Decoding runs in `spawn_blocking` because it is CPU-bound.

use crate::error::FetchError;
use crate::pipeline::pages::DownloadedImage;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ImageDecoder, ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An image ready to become an XObject.
struct PageImage {
    width: u32,
    height: u32,
    xobject: Stream,
}

/// Assemble `images` (in page order) into a PDF at `output_path`.
///
/// The file is written next to the destination first and renamed into place,
/// so an existing file is replaced atomically and a failed write never
/// leaves a truncated PDF behind. Returns the number of pages written.
pub async fn assemble_document(
    images: Vec<DownloadedImage>,
    output_path: &Path,
) -> Result<usize, FetchError> {
    if images.is_empty() {
        return Err(FetchError::NoImagesDownloaded { total: 0 });
    }
    let page_count = images.len();

    let pdf = tokio::task::spawn_blocking(move || build_pdf(&images))
        .await
        .map_err(|e| FetchError::Internal(format!("Assembly task panicked: {}", e)))??;

    write_atomically(output_path, &pdf).await?;
    info!(
        "Wrote {} pages ({} bytes) to {}",
        page_count,
        pdf.len(),
        output_path.display()
    );
    Ok(page_count)
}

/// Build the PDF bytes for `images`, one page per image, in slice order.
pub fn build_pdf(images: &[DownloadedImage]) -> Result<Vec<u8>, FetchError> {
    if images.is_empty() {
        return Err(FetchError::NoImagesDownloaded { total: 0 });
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(images.len());

    for img in images {
        let data = std::fs::read(&img.path).map_err(|e| {
            FetchError::Internal(format!("Failed to read {}: {}", img.path.display(), e))
        })?;
        let page = load_page_image(img.page_num, data)?;
        let (width, height) = (page.width as i64, page.height as i64);

        let image_id = doc.add_object(page.xobject);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| FetchError::PdfAssembly(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
        debug!("Page {}: {}x{} px", img.page_num, width, height);
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| FetchError::PdfAssembly(e.to_string()))?;
    Ok(buf)
}

/// Turn raw image bytes into an image XObject.
fn load_page_image(page: usize, data: Vec<u8>) -> Result<PageImage, FetchError> {
    let invalid = |detail: String| FetchError::InvalidImage { page, detail };

    let reader = ImageReader::new(Cursor::new(data.as_slice()))
        .with_guessed_format()
        .map_err(|e| invalid(e.to_string()))?;

    match reader.format() {
        // CMYK JPEGs are re-encoded below: `image` reports them as RGB, so the
        // raw DCT stream can't be labelled from the decoder's colour type.
        Some(ImageFormat::Jpeg) if jpeg_components(&data) != Some(4) => {
            // The decoder borrows `data`; drop it before the bytes move into the stream.
            let (width, height, has_color) = {
                let decoder = reader.into_decoder().map_err(|e| invalid(e.to_string()))?;
                let (w, h) = decoder.dimensions();
                (w, h, decoder.color_type().has_color())
            };
            let color_space = if has_color {
                "DeviceRGB"
            } else {
                "DeviceGray"
            };
            let xobject = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => color_space,
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                data,
            );
            Ok(PageImage {
                width,
                height,
                xobject,
            })
        }
        Some(_) => {
            let img = reader.decode().map_err(|e| invalid(e.to_string()))?;
            let (width, height) = (img.width(), img.height());
            let (samples, color_space) = if img.color().has_color() {
                (img.to_rgb8().into_raw(), "DeviceRGB")
            } else {
                (img.to_luma8().into_raw(), "DeviceGray")
            };

            let compressed =
                zlib_compress(&samples).map_err(|e| FetchError::PdfAssembly(e.to_string()))?;
            let xobject = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => color_space,
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                compressed,
            );
            Ok(PageImage {
                width,
                height,
                xobject,
            })
        }
        None => Err(invalid("unrecognised image format".into())),
    }
}

/// Number of colour components declared by the JPEG's frame header (SOFn).
fn jpeg_components(data: &[u8]) -> Option<u8> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        pos += 2;
        match marker {
            // Fill bytes.
            0xFF => pos -= 1,
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD7 => {}
            // Start of scan: no frame header seen.
            0xDA | 0xD9 => return None,
            _ => {
                let len = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
                let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
                if is_frame {
                    // length(2) precision(1) height(2) width(2) components(1)
                    return data.get(pos + 7).copied();
                }
                pos += len;
            }
        }
    }
    None
}

fn zlib_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let write_failed = |source: std::io::Error| FetchError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(write_failed)?;
    }

    let tmp_path = temp_path_for(path);
    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension("pdf.tmp")
}
