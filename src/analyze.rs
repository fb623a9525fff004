//! Content analysis and strategy suggestion
//!
//! Advisory only: the search does not consult it.

use std::fs;
use std::path::Path;

use crate::config::defaults::{
    ASSUMED_IMAGE_INCHES, HIGH_DPI_THRESHOLD, IMAGE_HEAVY_RATIO, TEXT_HEAVY_RATIO,
};
use crate::engine::{PdfEngine, SourceDocument};
use crate::error::EngineError;
use crate::model::{DocumentAnalysis, Strategy};

/// Profile the images of `document`.
///
/// The image/page area ratio is computed for every document. One with no
/// images has ratio 0 and is classed text heavy (`dpi_reduction`), not left
/// unclassified (`balanced`).
pub fn analyze<D: SourceDocument>(
    document: &D,
    file_size: u64,
) -> Result<DocumentAnalysis, EngineError> {
    let page_count = document.page_count();
    let mut image_sizes = Vec::new();
    let mut dpi_estimates = Vec::new();
    let mut image_area = 0.0_f64;
    let mut page_area = 0.0_f64;

    for index in 0..page_count {
        page_area += document.page_size(index)?.area();
        for image in document.images(index)? {
            image_sizes.push(image.encoded_len);
            if image.width > 0 && image.height > 0 {
                dpi_estimates.push(estimate_dpi(image.width, image.height));
            }
            image_area += image.width as f64 * image.height as f64;
        }
    }

    let average_dpi = if dpi_estimates.is_empty() {
        0.0
    } else {
        dpi_estimates.iter().sum::<f64>() / dpi_estimates.len() as f64
    };
    let ratio = if page_area > 0.0 {
        image_area / page_area
    } else {
        0.0
    };

    log::debug!(
        "Analyzed {} pages: {} images, image/page area ratio {:.3}",
        page_count,
        image_sizes.len(),
        ratio
    );

    Ok(DocumentAnalysis {
        page_count,
        image_count: image_sizes.len(),
        image_sizes,
        average_dpi,
        image_heavy: ratio > IMAGE_HEAVY_RATIO,
        text_heavy: ratio < TEXT_HEAVY_RATIO,
        file_size,
    })
}

/// Open `path` with `engine` and analyze it
pub fn analyze_file<E: PdfEngine>(engine: &E, path: &Path) -> Result<DocumentAnalysis, EngineError> {
    let file_size = fs::metadata(path)?.len();
    let document = engine.open(path)?;
    analyze(&document, file_size)
}

/// Rough DPI of an image, assuming its longest side spans a letter page width
pub fn estimate_dpi(width: u32, height: u32) -> f64 {
    width.max(height) as f64 / ASSUMED_IMAGE_INCHES
}

pub fn recommend(analysis: &DocumentAnalysis) -> Strategy {
    if analysis.image_heavy {
        if analysis.average_dpi > HIGH_DPI_THRESHOLD {
            Strategy::AggressiveImageCompression
        } else {
            Strategy::ModerateImageCompression
        }
    } else if analysis.text_heavy {
        Strategy::DpiReduction
    } else {
        Strategy::Balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EmbeddedImage, MemoryDocument, MemoryEngine, MemoryPage};
    use crate::model::PageSize;

    fn image(width: u32, height: u32) -> EmbeddedImage {
        EmbeddedImage {
            width,
            height,
            encoded_len: (width * height / 10) as usize,
        }
    }

    fn page_with(image: EmbeddedImage) -> MemoryPage {
        MemoryPage::with_image(PageSize::new(612.0, 792.0), image, 200)
    }

    #[test]
    fn test_estimate_dpi() {
        assert!((estimate_dpi(2550, 3300) - 3300.0 / 8.5).abs() < 1e-9);
        assert!((estimate_dpi(850, 10) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_scanned_document_is_image_heavy() {
        let document = MemoryDocument::new(vec![page_with(image(2550, 3300)); 3]);
        let analysis = analyze(&document, 9_000_000).unwrap();

        assert_eq!(analysis.page_count, 3);
        assert_eq!(analysis.image_count, 3);
        assert_eq!(analysis.image_sizes, vec![841_500; 3]);
        assert!(analysis.image_heavy);
        assert!(!analysis.text_heavy);
        assert_eq!(recommend(&analysis), Strategy::AggressiveImageCompression);
    }

    #[test]
    fn test_low_resolution_images_get_moderate_treatment() {
        // 850 px wide is 100 DPI; 850 * 800 covers most of a letter page
        let document = MemoryDocument::new(vec![page_with(image(850, 800))]);
        let analysis = analyze(&document, 100_000).unwrap();

        assert!(analysis.image_heavy);
        assert!((analysis.average_dpi - 100.0).abs() < 1e-9);
        assert_eq!(recommend(&analysis), Strategy::ModerateImageCompression);
    }

    #[test]
    fn test_text_only_document() {
        let letter = PageSize::new(612.0, 792.0);
        let document = MemoryDocument::new(vec![MemoryPage::text(letter, 4_000); 2]);
        let analysis = analyze(&document, 8_000).unwrap();

        assert_eq!(analysis.image_count, 0);
        assert_eq!(analysis.average_dpi, 0.0);
        assert!(analysis.text_heavy);
        assert_eq!(recommend(&analysis), Strategy::DpiReduction);
        assert_eq!(recommend(&analysis).to_string(), "dpi_reduction");
    }

    #[test]
    fn test_mixed_document_is_balanced() {
        // 400 * 240 px over 612 * 792 pt is a ratio of about 0.2
        let document = MemoryDocument::new(vec![page_with(image(400, 240))]);
        let analysis = analyze(&document, 50_000).unwrap();

        assert!(analysis.is_mixed());
        assert_eq!(recommend(&analysis), Strategy::Balanced);
    }

    #[test]
    fn test_zero_sized_images_are_left_out_of_dpi() {
        let document = MemoryDocument::new(vec![
            page_with(image(0, 0)),
            page_with(image(1700, 100)),
        ]);
        let analysis = analyze(&document, 1_000).unwrap();
        assert_eq!(analysis.image_count, 2);
        assert!((analysis.average_dpi - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_file_reads_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, vec![b'%'; 1234]).unwrap();
        let engine = MemoryEngine::new(MemoryDocument::new(vec![page_with(image(10, 10))]));

        let analysis = analyze_file(&engine, &path).unwrap();
        assert_eq!(analysis.file_size, 1234);
        assert_eq!(analysis.page_count, 1);
    }
}
