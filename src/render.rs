//! PNG rendering of the impression line with burst markers.

use std::error::Error as StdError;
use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};
use tracing::{debug, warn};

use crate::chart::{format_value, ChartLayout};
use crate::config::RenderConfig;
use crate::detect::BurstSet;
use crate::error::RenderError;
use crate::models::Series;

const FONT_FAMILY: &str = "sans-serif";
const GOLDENROD: RGBColor = RGBColor(0xDA, 0xA5, 0x20);
const LIGHT_GRAY: RGBColor = RGBColor(0xD3, 0xD3, 0xD3);
const GRID_DASHES: usize = 80;

/// DejaVu Sans (Bitstream Vera license, see `assets/DejaVuSans-LICENSE.txt`).
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

static FONT_READY: OnceLock<bool> = OnceLock::new();

/// Register the chart font once per process. `font_path` is tried first and
/// only honoured on the first call; the bundled font is the fallback.
fn ensure_font(config: &RenderConfig) -> Result<(), RenderError> {
    let ready = *FONT_READY.get_or_init(|| {
        if let Some(path) = &config.font_path {
            match std::fs::read(path) {
                Ok(bytes) => {
                    // plotters keeps registered fonts for the life of the process.
                    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                    if register_font(FONT_FAMILY, FontStyle::Normal, bytes).is_ok() {
                        debug!(path = %path.display(), "registered chart font");
                        return true;
                    }
                    warn!(path = %path.display(), "unusable font file, using bundled font");
                }
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read font, using bundled font"
                ),
            }
        }
        register_font(FONT_FAMILY, FontStyle::Normal, BUNDLED_FONT).is_ok()
    });
    if ready {
        Ok(())
    } else {
        Err(RenderError::FontUnavailable)
    }
}

/// Draw the chart into an RGB image. Also returns the pixel anchor of the
/// final-value label.
fn render_image(
    series: &Series,
    bursts: &BurstSet,
    config: &RenderConfig,
) -> Result<(image::RgbImage, (i32, i32)), RenderError> {
    let layout = ChartLayout::new(series, bursts, config).ok_or(RenderError::EmptySeries)?;
    ensure_font(config)?;

    let (width, height) = (config.width, config.height);
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| RenderError::Draw(format!("image too large: {width}x{height}")))?;
    let mut pixels = vec![0u8; len];
    let anchor = draw(&mut pixels, &layout, config).map_err(|e| RenderError::Draw(e.to_string()))?;

    let img = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| RenderError::Draw("pixel buffer size mismatch".to_string()))?;
    debug!(
        width,
        height,
        markers = layout.markers.len(),
        ticks = layout.ticks.len(),
        final_value = %layout.final_value.text,
        "rendered chart"
    );
    Ok((img, anchor))
}

/// Render the chart and return PNG bytes.
pub fn render(
    series: &Series,
    bursts: &BurstSet,
    config: &RenderConfig,
) -> Result<Vec<u8>, RenderError> {
    let (img, _) = render_image(series, bursts, config)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Render and write the PNG to `path`, replacing any existing file.
pub fn render_to_file(
    series: &Series,
    bursts: &BurstSet,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    let bytes = render(series, bursts, config)?;
    std::fs::write(path, bytes).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "chart saved");
    Ok(())
}

fn lerp(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

fn dashed(a: (f64, f64), b: (f64, f64)) -> impl Iterator<Item = PathElement<(f64, f64)>> {
    let n = GRID_DASHES as f64;
    (0..GRID_DASHES).step_by(2).map(move |i| {
        let from = lerp(a, b, i as f64 / n);
        let to = lerp(a, b, (i + 1) as f64 / n);
        PathElement::new(vec![from, to], LIGHT_GRAY.stroke_width(1))
    })
}

fn draw(
    pixels: &mut [u8],
    layout: &ChartLayout,
    config: &RenderConfig,
) -> Result<(i32, i32), Box<dyn StdError>> {
    let root =
        BitMapBackend::with_buffer(pixels, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let label_area = config.label_font_size.saturating_mul(5);
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(layout.title, (FONT_FAMILY, config.title_font_size))
        .x_label_area_size(label_area)
        .y_label_area_size(label_area)
        .build_cartesian_2d(layout.x_range.clone(), layout.y_range.clone())?;

    let (x0, x1) = (layout.x_range.start, layout.x_range.end);
    let (y0, y1) = (layout.y_range.start, layout.y_range.end);
    for tick in &layout.ticks {
        chart.draw_series(dashed((tick.x, y0), (tick.x, y1)))?;
    }
    for step in 1..5 {
        let y = y0 + (y1 - y0) * f64::from(step) / 5.0;
        chart.draw_series(dashed((x0, y), (x1, y)))?;
    }

    // Date ticks come from the layout, so plotters' own x labels are blanked.
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(2)
        .x_label_formatter(&|_| String::new())
        .y_labels(6)
        .y_label_formatter(&|v| format_value(v.round()))
        .x_desc("Date")
        .y_desc("Impressions")
        .label_style((FONT_FAMILY, config.label_font_size))
        .axis_desc_style((FONT_FAMILY, config.label_font_size))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            layout.line.iter().copied(),
            GOLDENROD.stroke_width(2),
        ))?
        .label("Impressions")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GOLDENROD.stroke_width(2)));

    chart
        .draw_series(
            layout
                .markers
                .iter()
                .map(|&(x, y)| Cross::new((x, y), 6, RED.stroke_width(2))),
        )?
        .label(layout.legend)
        .legend(|(x, y)| Cross::new((x + 10, y), 6, RED.stroke_width(2)));

    let value_style = TextStyle::from((FONT_FAMILY, config.final_value_font_size))
        .pos(Pos::new(HPos::Center, VPos::Center));
    let fv = &layout.final_value;
    chart.draw_series(std::iter::once(Text::new(
        fv.text.clone(),
        (fv.x, fv.y),
        value_style,
    )))?;
    let anchor = chart.backend_coord(&(fv.x, fv.y));

    let marker_style = TextStyle::from((FONT_FAMILY, config.marker_font_size))
        .pos(Pos::new(HPos::Left, VPos::Bottom));
    chart.draw_series(
        layout
            .marker_labels
            .iter()
            .map(|a| Text::new(a.text.clone(), (a.x, a.y), marker_style.clone())),
    )?;

    let tick_style = TextStyle::from((FONT_FAMILY, config.label_font_size))
        .pos(Pos::new(HPos::Center, VPos::Top));
    for tick in &layout.ticks {
        let (px, py) = chart.backend_coord(&(tick.x, y0));
        root.draw(&PathElement::new(vec![(px, py), (px, py + 5)], BLACK.stroke_width(1)))?;
        root.draw(&Text::new(tick.label.clone(), (px, py + 8), tick_style.clone()))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT_FAMILY, config.label_font_size))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(anchor)
}
