use crate::error::ComposeError;
use crate::grid::{grid_shape, partition};
use crate::monitor::{virtual_desktop, MonitorRect};
use crate::Result;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale preserving aspect ratio to cover the cell, center-crop overflow.
    Fill,
    /// Scale preserving aspect ratio to fit inside the cell, letterbox the rest.
    Fit,
    /// Scale both axes independently to exactly match the cell.
    Stretch,
    /// Paste at native resolution, cropping or padding around the center.
    Center,
    /// One image fill-fitted across the whole virtual desktop.
    Span,
}

impl std::fmt::Display for FitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FitMode::Fill => "fill",
            FitMode::Fit => "fit",
            FitMode::Stretch => "stretch",
            FitMode::Center => "center",
            FitMode::Span => "span",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FitMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fill" => Ok(FitMode::Fill),
            "fit" => Ok(FitMode::Fit),
            "stretch" => Ok(FitMode::Stretch),
            "center" => Ok(FitMode::Center),
            "span" => Ok(FitMode::Span),
            other => Err(format!("unknown fit mode: {}", other)),
        }
    }
}

/// Parses an "RRGGBB" (or "#RRGGBB") hex color.
pub fn parse_color(s: &str) -> Option<Rgb<u8>> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb([r, g, b]))
}

/// Maps a source image onto a fixed-size target per the fit mode.
pub fn fit_image(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
    mode: FitMode,
    background: Rgb<u8>,
) -> RgbImage {
    let (src_w, src_h) = img.dimensions();

    match mode {
        FitMode::Stretch => img
            .resize_exact(target_w, target_h, FilterType::Lanczos3)
            .to_rgb8(),
        FitMode::Center => {
            let crop_w = src_w.min(target_w);
            let crop_h = src_h.min(target_h);
            let cropped = img
                .crop_imm((src_w - crop_w) / 2, (src_h - crop_h) / 2, crop_w, crop_h)
                .to_rgb8();

            let mut canvas = RgbImage::from_pixel(target_w, target_h, background);
            let offset_x = (target_w - crop_w) / 2;
            let offset_y = (target_h - crop_h) / 2;
            imageops::overlay(&mut canvas, &cropped, i64::from(offset_x), i64::from(offset_y));
            canvas
        }
        FitMode::Fill | FitMode::Span => {
            // Cover scale: the larger ratio guarantees no letterboxing
            let scale = (f64::from(target_w) / f64::from(src_w))
                .max(f64::from(target_h) / f64::from(src_h));
            let scaled_w = ((f64::from(src_w) * scale).round() as u32).max(target_w);
            let scaled_h = ((f64::from(src_h) * scale).round() as u32).max(target_h);

            let resized = img.resize_exact(scaled_w, scaled_h, FilterType::Lanczos3);
            let crop_x = (scaled_w - target_w) / 2;
            let crop_y = (scaled_h - target_h) / 2;
            resized.crop_imm(crop_x, crop_y, target_w, target_h).to_rgb8()
        }
        FitMode::Fit => {
            let scale = (f64::from(target_w) / f64::from(src_w))
                .min(f64::from(target_h) / f64::from(src_h));
            let scaled_w = ((f64::from(src_w) * scale).round() as u32).clamp(1, target_w);
            let scaled_h = ((f64::from(src_h) * scale).round() as u32).clamp(1, target_h);

            let resized = img
                .resize_exact(scaled_w, scaled_h, FilterType::Lanczos3)
                .to_rgb8();

            let mut canvas = RgbImage::from_pixel(target_w, target_h, background);
            let offset_x = (target_w - scaled_w) / 2;
            let offset_y = (target_h - scaled_h) / 2;
            imageops::overlay(&mut canvas, &resized, i64::from(offset_x), i64::from(offset_y));
            canvas
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollageSettings {
    pub count: usize,
    pub same_for_all: bool,
    pub fit_mode: FitMode,
    pub background: Rgb<u8>,
}

impl CollageSettings {
    pub fn new(
        count: usize,
        same_for_all: bool,
        fit_mode: FitMode,
        background: Rgb<u8>,
    ) -> Result<Self> {
        if !(1..=8).contains(&count) {
            return Err(ComposeError::InvalidCollageCount { count }.into());
        }
        Ok(Self {
            count,
            same_for_all,
            fit_mode,
            background,
        })
    }
}

/// Which drawn images go to which monitor.
#[derive(Debug, Clone)]
pub enum SelectionPlan {
    /// The same draws reused on every monitor (and the span target).
    Shared(Vec<PathBuf>),
    /// One independent batch of draws per monitor, in monitor order.
    PerMonitor(Vec<Vec<PathBuf>>),
}

impl SelectionPlan {
    pub fn for_monitor(&self, index: usize) -> &[PathBuf] {
        match self {
            SelectionPlan::Shared(images) => images,
            SelectionPlan::PerMonitor(batches) => {
                batches.get(index).map(Vec::as_slice).unwrap_or(&[])
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComposedTarget {
    pub id: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct ComposeOutcome {
    pub targets: Vec<ComposedTarget>,
    /// Per-monitor failures, as (monitor id, message).
    pub failures: Vec<(String, String)>,
    pub blank_cells: usize,
}

/// Builds one collage image per monitor (or one spanning image) and
/// writes them to the output folder.
pub struct Composer {
    settings: CollageSettings,
    output_dir: PathBuf,
}

impl Composer {
    pub fn new(settings: CollageSettings, output_dir: PathBuf) -> Self {
        Self {
            settings,
            output_dir,
        }
    }

    /// Stable, overwrite-safe output path for a target.
    pub fn output_path(&self, target_id: &str) -> PathBuf {
        self.output_dir.join(format!("collage-{}.bmp", target_id))
    }

    pub fn compose(
        &self,
        monitors: &[MonitorRect],
        plan: &SelectionPlan,
    ) -> Result<ComposeOutcome> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| ComposeError::OutputDir {
            path: self.output_dir.clone(),
            source: e,
        })?;

        if self.settings.fit_mode == FitMode::Span {
            let path = self.compose_span(monitors, plan.for_monitor(0))?;
            return Ok(ComposeOutcome {
                targets: vec![ComposedTarget {
                    id: "span".to_string(),
                    path,
                }],
                failures: Vec::new(),
                blank_cells: 0,
            });
        }

        let mut targets = Vec::new();
        let mut failures = Vec::new();
        let mut blank_cells = 0;

        for (index, monitor) in monitors.iter().enumerate() {
            match self.compose_monitor(monitor, plan.for_monitor(index)) {
                Ok((path, blanks)) => {
                    blank_cells += blanks;
                    targets.push(ComposedTarget {
                        id: monitor.id.clone(),
                        path,
                    });
                }
                Err(e) => {
                    log::error!("Failed to compose collage for monitor {}: {}", monitor.id, e);
                    failures.push((monitor.id.clone(), e.to_string()));
                }
            }
        }

        if targets.is_empty() && !monitors.is_empty() {
            return Err(ComposeError::AllTargetsFailed {
                failed: failures.len(),
            }
            .into());
        }

        Ok(ComposeOutcome {
            targets,
            failures,
            blank_cells,
        })
    }

    /// One image, fill semantics, across the whole virtual desktop.
    fn compose_span(&self, monitors: &[MonitorRect], images: &[PathBuf]) -> Result<PathBuf> {
        let bounds = virtual_desktop(monitors)?;
        let mut canvas =
            RgbImage::from_pixel(bounds.width, bounds.height, self.settings.background);

        if let Some(path) = images.first() {
            let img = image::open(path).map_err(|e| ComposeError::ImageLoad {
                path: path.clone(),
                source: e,
            })?;
            let fitted = fit_image(
                &img,
                bounds.width,
                bounds.height,
                FitMode::Span,
                self.settings.background,
            );
            imageops::overlay(&mut canvas, &fitted, 0, 0);
        } else {
            log::warn!("No image available for span target, writing background only");
        }

        let out = self.output_path("span");
        canvas.save(&out).map_err(|e| ComposeError::Encode {
            path: out.clone(),
            source: e,
        })?;
        log::info!("Composed span wallpaper -> {:?}", out);
        Ok(out)
    }

    fn compose_monitor(
        &self,
        monitor: &MonitorRect,
        images: &[PathBuf],
    ) -> Result<(PathBuf, usize)> {
        let count = self.settings.count;
        let (rows, cols) = grid_shape(count);
        let cells = partition(monitor.width, monitor.height, rows, cols);

        let mut canvas =
            RgbImage::from_pixel(monitor.width, monitor.height, self.settings.background);

        for (cell, path) in cells.iter().take(count).zip(images.iter()) {
            let img = image::open(path).map_err(|e| ComposeError::ImageLoad {
                path: path.clone(),
                source: e,
            })?;
            let fitted = fit_image(
                &img,
                cell.width,
                cell.height,
                self.settings.fit_mode,
                self.settings.background,
            );
            imageops::overlay(&mut canvas, &fitted, i64::from(cell.x), i64::from(cell.y));
        }

        let blanks = count.saturating_sub(images.len());
        if blanks > 0 {
            log::warn!(
                "Monitor {}: only {} of {} images available, leaving {} cells blank",
                monitor.id,
                images.len(),
                count,
                blanks
            );
        }

        let out = self.output_path(&monitor.id);
        canvas.save(&out).map_err(|e| ComposeError::Encode {
            path: out.clone(),
            source: e,
        })?;
        log::info!(
            "Composed {}x{} collage for monitor {} ({} rows x {} cols) -> {:?}",
            monitor.width,
            monitor.height,
            monitor.id,
            rows,
            cols,
            out
        );
        Ok((out, blanks))
    }
}
