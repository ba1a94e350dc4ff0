use crate::compose::{CollageSettings, Composer, FitMode, SelectionPlan};
use crate::monitor::{MonitorRect, MonitorSource};
use crate::pool::ImagePool;
use crate::selection::{SelectionMode, Selector};
use crate::setter::WallpaperSetter;
use crate::state::SelectionState;
use crate::Result;
use image::imageops::FilterType;
use image::RgbImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const FADE_FRAMES: u32 = 8;
const FADE_FRAME_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone)]
pub struct ApplyOptions {
    pub selection: SelectionMode,
    pub collage: CollageSettings,
    pub wallpapers_folder: PathBuf,
    pub output_folder: PathBuf,
    pub state_file: PathBuf,
    pub fade_in: bool,
}

/// Outcome of one apply. Per-monitor problems end up in `failures`
/// instead of aborting the whole run.
#[derive(Debug)]
pub struct ApplyReport {
    pub applied: Vec<(String, PathBuf)>,
    pub blank_cells: usize,
    pub failures: Vec<String>,
}

impl ApplyReport {
    pub fn nothing_applied(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Runs the full apply pipeline: resolve monitors, scan the pool, draw
/// selections, persist selection state, compose, hand the results to the
/// wallpaper setter.
///
/// One apply is a single synchronous unit; callers run it off the
/// interactive thread and serialize concurrent applies externally.
pub struct Engine<M, S> {
    monitors: M,
    setter: S,
    options: ApplyOptions,
}

impl<M: MonitorSource, S: WallpaperSetter> Engine<M, S> {
    pub fn new(monitors: M, setter: S, options: ApplyOptions) -> Self {
        Self {
            monitors,
            setter,
            options,
        }
    }

    pub fn apply(&self) -> Result<ApplyReport> {
        let monitors = self.monitors.resolve()?;
        let pool = ImagePool::scan(&self.options.wallpapers_folder)?;

        let state = SelectionState::load(&self.options.state_file);
        let mut selector = Selector::new(self.options.selection, state);

        let span = self.options.collage.fit_mode == FitMode::Span;
        let per_target = if span {
            1
        } else {
            self.options.collage.count.min(pool.len())
        };

        let plan = if span || self.options.collage.same_for_all {
            SelectionPlan::Shared(selector.draw(&pool, per_target)?)
        } else {
            let batches = monitors
                .iter()
                .map(|_| selector.draw(&pool, per_target))
                .collect::<Result<Vec<_>>>()?;
            SelectionPlan::PerMonitor(batches)
        };

        // The draw batch succeeded; write the memory back before any
        // slow image work so a mid-compose crash cannot replay draws.
        if let Err(e) = selector.state().save(&self.options.state_file) {
            log::warn!("Failed to persist selection state: {}", e);
        }

        let composer = Composer::new(
            self.options.collage.clone(),
            self.options.output_folder.clone(),
        );

        let previous = if self.options.fade_in {
            self.capture_previous(&composer, &monitors, span)
        } else {
            HashMap::new()
        };

        let outcome = composer.compose(&monitors, &plan)?;

        let mut applied = Vec::new();
        let mut failures: Vec<String> = outcome
            .failures
            .iter()
            .map(|(id, msg)| format!("monitor {}: {}", id, msg))
            .collect();

        for target in &outcome.targets {
            if let Some(old) = previous.get(&target.id) {
                self.crossfade(&target.id, &target.path, old);
            }
            match self.setter.set(&target.id, &target.path) {
                Ok(()) => applied.push((target.id.clone(), target.path.clone())),
                Err(e) => {
                    log::error!("Failed to apply wallpaper for {}: {}", target.id, e);
                    failures.push(format!("monitor {}: {}", target.id, e));
                }
            }
        }

        Ok(ApplyReport {
            applied,
            blank_cells: outcome.blank_cells,
            failures,
        })
    }

    /// Snapshots the existing output files before they are overwritten,
    /// so the crossfade has something to blend from.
    fn capture_previous(
        &self,
        composer: &Composer,
        monitors: &[MonitorRect],
        span: bool,
    ) -> HashMap<String, RgbImage> {
        let ids: Vec<String> = if span {
            vec!["span".to_string()]
        } else {
            monitors.iter().map(|m| m.id.clone()).collect()
        };

        let mut previous = HashMap::new();
        for id in ids {
            let path = composer.output_path(&id);
            if !path.exists() {
                continue;
            }
            match image::open(&path) {
                Ok(img) => {
                    previous.insert(id, img.to_rgb8());
                }
                Err(e) => {
                    log::debug!("Could not read previous output {:?}: {}", path, e);
                }
            }
        }
        previous
    }

    /// Fades from the previous composed output to the new one by
    /// applying intermediate blends. Frames alternate between two temp
    /// paths so a setter that only reacts to path changes reloads each
    /// one. Fade problems are never fatal; the final image is applied
    /// by the caller regardless.
    fn crossfade(&self, target_id: &str, new_path: &Path, old: &RgbImage) {
        let new_img = match image::open(new_path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                log::warn!("Skipping crossfade, cannot reload {:?}: {}", new_path, e);
                return;
            }
        };

        let old = if old.dimensions() != new_img.dimensions() {
            image::DynamicImage::ImageRgb8(old.clone())
                .resize_exact(new_img.width(), new_img.height(), FilterType::Lanczos3)
                .to_rgb8()
        } else {
            old.clone()
        };

        let tmp_a = self.options.output_folder.join("fade-a.bmp");
        let tmp_b = self.options.output_folder.join("fade-b.bmp");

        for i in 1..=FADE_FRAMES {
            let alpha = i as f32 / FADE_FRAMES as f32;
            let frame = blend(&old, &new_img, alpha);
            let tmp = if i % 2 == 1 { &tmp_a } else { &tmp_b };

            if let Err(e) = frame.save(tmp) {
                log::warn!("Aborting crossfade, cannot write frame: {}", e);
                break;
            }
            if let Err(e) = self.setter.set(target_id, tmp) {
                log::warn!("Aborting crossfade, setter failed: {}", e);
                break;
            }
            std::thread::sleep(FADE_FRAME_DELAY);
        }

        for tmp in [tmp_a, tmp_b] {
            let _ = std::fs::remove_file(tmp);
        }
    }
}

fn blend(old: &RgbImage, new: &RgbImage, alpha: f32) -> RgbImage {
    RgbImage::from_fn(new.width(), new.height(), |x, y| {
        let a = old.get_pixel(x, y);
        let b = new.get_pixel(x, y);
        image::Rgb([
            lerp(a[0], b[0], alpha),
            lerp(a[1], b[1], alpha),
            lerp(a[2], b[2], alpha),
        ])
    })
}

fn lerp(a: u8, b: u8, alpha: f32) -> u8 {
    (f32::from(a) * (1.0 - alpha) + f32::from(b) * alpha).round() as u8
}
