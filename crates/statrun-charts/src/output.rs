//! Writing a drawn chart to disk, picking the encoding from the extension.
use image::{ImageFormat, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use std::path::Path;
use svg::Document;

/// On-disk encoding of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Format for `path`, from its extension (case-insensitive).
    pub fn for_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "" => Err(format!("Output path {} has no file extension", path.display())),
            other => Err(format!("Unsupported image format: .{}", other)),
        }
    }
}

/// Write `doc` to `path`.
pub fn write(doc: &Document, path: &Path) -> Result<(), String> {
    let format = OutputFormat::for_path(path)?;
    let markup = doc.to_string();
    tracing::debug!(path = %path.display(), ?format, "writing chart");
    match format {
        OutputFormat::Svg => std::fs::write(path, markup).map_err(|e| e.to_string()),
        OutputFormat::Png => rasterize(&markup)?
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| e.to_string()),
        OutputFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(rasterize(&markup)?).to_rgb8();
            rgb.save_with_format(path, ImageFormat::Jpeg)
                .map_err(|e| e.to_string())
        }
    }
}

fn rasterize(markup: &str) -> Result<RgbaImage, String> {
    let mut options = Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = Tree::from_str(markup, &options).map_err(|e| e.to_string())?;

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| "Chart has an empty canvas".to_string())?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    // tiny-skia keeps premultiplied alpha
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(size.width(), size.height(), rgba)
        .ok_or_else(|| "Rasterized chart has an unexpected size".to_string())
}
