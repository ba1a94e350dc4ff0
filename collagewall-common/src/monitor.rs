use crate::error::MonitorError;
use crate::Result;
use serde::{Deserialize, Serialize};

/// One active display in virtual-desktop coordinates. Origins may be
/// negative (monitors left of or above the primary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorRect {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorRect {
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Bounding box of the whole virtual desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Minimal rectangle containing every monitor. Gaps and overlaps from
/// non-aligned layouts are fine; the box just has to cover them all.
pub fn virtual_desktop(monitors: &[MonitorRect]) -> Result<Bounds> {
    if monitors.is_empty() {
        return Err(MonitorError::NoDisplays.into());
    }

    let min_x = monitors.iter().map(|m| m.x).min().unwrap_or(0);
    let min_y = monitors.iter().map(|m| m.y).min().unwrap_or(0);
    let max_x = monitors.iter().map(MonitorRect::right).max().unwrap_or(0);
    let max_y = monitors.iter().map(MonitorRect::bottom).max().unwrap_or(0);

    Ok(Bounds {
        x: min_x,
        y: min_y,
        width: (max_x - min_x) as u32,
        height: (max_y - min_y) as u32,
    })
}

/// Source of the live display list. The real OS query is an injected
/// collaborator; tests and the shipped CLI use [`ConfiguredMonitors`].
pub trait MonitorSource {
    /// Returns the active monitors, sorted left-to-right by x then
    /// top-to-bottom by y so collage assignment is deterministic.
    fn resolve(&self) -> Result<Vec<MonitorRect>>;
}

/// Monitor layout declared in the configuration file.
#[derive(Debug, Clone)]
pub struct ConfiguredMonitors {
    monitors: Vec<MonitorRect>,
}

impl ConfiguredMonitors {
    pub fn new(monitors: Vec<MonitorRect>) -> Self {
        Self { monitors }
    }

    /// One 1920x1080 monitor at the origin, for configs with no
    /// [[monitors]] entries.
    pub fn single_default() -> Self {
        Self {
            monitors: vec![MonitorRect {
                id: "0".to_string(),
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
            }],
        }
    }
}

impl MonitorSource for ConfiguredMonitors {
    fn resolve(&self) -> Result<Vec<MonitorRect>> {
        if self.monitors.is_empty() {
            return Err(MonitorError::NoDisplays.into());
        }

        for monitor in &self.monitors {
            if monitor.width == 0 || monitor.height == 0 {
                return Err(MonitorError::InvalidGeometry {
                    id: monitor.id.clone(),
                    width: monitor.width,
                    height: monitor.height,
                }
                .into());
            }
        }

        let mut monitors = self.monitors.clone();
        monitors.sort_by_key(|m| (m.x, m.y));
        Ok(monitors)
    }
}
