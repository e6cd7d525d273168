//! Terminal labeler: writes a PNG preview and reads the word from input.

use glyphmatch::{GlyphMatchError, GlyphMatchResult, LabelDecision, Labeler, Raster};
use std::io::{BufRead, Write};
use std::path::Path;

/// Input line that ends a labeling session.
pub const QUIT_COMMAND: &str = ":q";

/// Prompts on `output` and reads one line per image from `input`.
///
/// An empty line skips the image; `:q` or end of input stops the session.
pub struct PromptLabeler<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptLabeler<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

fn io_err(err: impl std::fmt::Display) -> GlyphMatchError {
    GlyphMatchError::Io {
        reason: err.to_string(),
    }
}

/// Writes `raster` as a PNG file.
pub fn write_preview(raster: &Raster, path: &Path) -> GlyphMatchResult<()> {
    let width = raster.width() as u32;
    let height = raster.height() as u32;
    let data = raster.data().to_vec();
    let img = if raster.channels() == 3 {
        image::RgbImage::from_raw(width, height, data).map(image::DynamicImage::ImageRgb8)
    } else {
        image::GrayImage::from_raw(width, height, data).map(image::DynamicImage::ImageLuma8)
    }
    .ok_or(GlyphMatchError::InvalidInput("raster buffer does not fit its dimensions"))?;
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(io_err)
}

impl<R: BufRead, W: Write> Labeler for PromptLabeler<R, W> {
    fn label(&mut self, raster: &Raster, _payload: &[u8]) -> GlyphMatchResult<LabelDecision> {
        let preview = tempfile::Builder::new()
            .prefix("glyphmatch-")
            .suffix(".png")
            .tempfile()?;
        write_preview(raster, preview.path())?;
        write!(
            self.output,
            "challenge preview: {}\nword (empty to skip, {QUIT_COMMAND} to quit): ",
            preview.path().display()
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(LabelDecision::Stop);
        }
        let word = line.trim();
        Ok(match word {
            QUIT_COMMAND => LabelDecision::Stop,
            "" => LabelDecision::Skip,
            word => LabelDecision::Label(word.to_string()),
        })
    }
}
