//! Compositor implementation backed by the `image` crate.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, RgbaImage};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::CompositorError;
use super::traits::Compositor;
use super::types::{CompositeImage, TileLayout};
use crate::fetcher::TileFile;
use crate::grid::GridSize;

/// Largest side a baseline JPEG can carry.
const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Decodes tiles, places them on a transparent canvas and encodes a JPEG.
#[derive(Debug, Clone)]
pub struct ImageCompositor {
    quality: u8,
    layout: TileLayout,
}

impl ImageCompositor {
    pub fn new(quality: u8, layout: TileLayout) -> Self {
        Self { quality, layout }
    }

    /// Compositor with quality 90 and row-major placement.
    pub fn with_defaults() -> Self {
        Self::new(90, TileLayout::RowMajor)
    }

    fn compose_blocking(
        &self,
        mut tiles: Vec<TileFile>,
        grid_size: GridSize,
        output: &Path,
    ) -> Result<CompositeImage, CompositorError> {
        let expected = grid_size.tile_count();
        if tiles.len() != expected {
            return Err(CompositorError::WrongTileCount {
                expected,
                actual: tiles.len(),
            });
        }

        let n = grid_size.get();
        let mut seen = HashSet::with_capacity(expected);
        for tile in &tiles {
            if tile.row >= n || tile.col >= n || !seen.insert(tile.position()) {
                return Err(CompositorError::InvalidPosition {
                    row: tile.row,
                    col: tile.col,
                });
            }
        }
        tiles.sort_by_key(TileFile::position);

        let first = decode_tile(&tiles[0].path)?;
        let (tile_width, tile_height) = (first.width(), first.height());
        if tile_width == 0 || tile_height == 0 {
            return Err(CompositorError::UnknownDimensions {
                path: tiles[0].path.clone(),
            });
        }

        let (width, height) = canvas_dimensions(tile_width, tile_height, n)?;

        debug!(
            width,
            height,
            tile_width,
            tile_height,
            layout = ?self.layout,
            "Compositing tiles"
        );

        // RgbaImage::new is zero-filled, i.e. fully transparent.
        let mut canvas = RgbaImage::new(width, height);
        let mut first = Some(first);
        for tile in &tiles {
            let image = match first.take() {
                Some(image) => image,
                None => decode_tile(&tile.path)?,
            };
            if image.width() != tile_width || image.height() != tile_height {
                return Err(CompositorError::MismatchedTile {
                    path: tile.path.clone(),
                    width: image.width(),
                    height: image.height(),
                    expected_width: tile_width,
                    expected_height: tile_height,
                });
            }
            let (left, top) = self
                .layout
                .offset(tile.row, tile.col, n, tile_width, tile_height);
            image::imageops::overlay(&mut canvas, &image.to_rgba8(), left as i64, top as i64);
        }

        self.write_atomically(canvas, output)?;

        Ok(CompositeImage {
            path: output.to_path_buf(),
            width,
            height,
            tile_width,
            tile_height,
            tile_count: tiles.len(),
        })
    }

    /// Encodes to a sibling temp file, then renames it over `output`.
    fn write_atomically(&self, canvas: RgbaImage, output: &Path) -> Result<(), CompositorError> {
        let partial = partial_path(output);

        let result = self.encode(canvas, &partial).and_then(|()| {
            fs::rename(&partial, output).map_err(|e| {
                CompositorError::encode_failed(format!(
                    "failed to move {} to {}: {}",
                    partial.display(),
                    output.display(),
                    e
                ))
            })
        });

        if result.is_err() {
            let _ = fs::remove_file(&partial);
        }
        result
    }

    fn encode(&self, canvas: RgbaImage, path: &Path) -> Result<(), CompositorError> {
        let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();

        let file = File::create(path)
            .map_err(|e| CompositorError::encode_failed(format!("{}: {}", path.display(), e)))?;
        let mut writer = BufWriter::new(file);

        JpegEncoder::new_with_quality(&mut writer, self.quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
            .map_err(|e| CompositorError::encode_failed(e.to_string()))?;

        writer
            .flush()
            .map_err(|e| CompositorError::encode_failed(e.to_string()))
    }
}

#[async_trait]
impl Compositor for ImageCompositor {
    fn name(&self) -> &str {
        "image"
    }

    async fn compose(
        &self,
        tiles: Vec<TileFile>,
        grid_size: GridSize,
        output: &Path,
    ) -> Result<CompositeImage, CompositorError> {
        let compositor = self.clone();
        let output = output.to_path_buf();

        // Decoding and encoding are CPU-bound.
        tokio::task::spawn_blocking(move || compositor.compose_blocking(tiles, grid_size, &output))
            .await
            .map_err(|e| CompositorError::encode_failed(format!("compositor task failed: {}", e)))?
    }
}

/// Canvas size for an `n`x`n` grid, rejected before anything is allocated
/// when the JPEG encoder could not write it.
fn canvas_dimensions(
    tile_width: u32,
    tile_height: u32,
    n: u32,
) -> Result<(u32, u32), CompositorError> {
    match (tile_width.checked_mul(n), tile_height.checked_mul(n)) {
        (Some(w), Some(h)) if w <= MAX_JPEG_DIMENSION && h <= MAX_JPEG_DIMENSION => Ok((w, h)),
        _ => Err(CompositorError::encode_failed(format!(
            "{}x{} tiles in a {}x{} grid exceed the {} pixel JPEG limit",
            tile_width, tile_height, n, n, MAX_JPEG_DIMENSION
        ))),
    }
}

/// Decodes a tile, sniffing the format from its content.
fn decode_tile(path: &Path) -> Result<DynamicImage, CompositorError> {
    let decode_failed = |reason: String| CompositorError::DecodeFailed {
        path: path.to_path_buf(),
        reason,
    };

    image::io::Reader::open(path)
        .map_err(|e| decode_failed(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_failed(e.to_string()))?
        .decode()
        .map_err(|e| decode_failed(e.to_string()))
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}
