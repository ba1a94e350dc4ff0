pub mod apply;
pub mod compose;
pub mod duration;
pub mod error;
pub mod grid;
pub mod monitor;
pub mod pool;
pub mod selection;
pub mod setter;
pub mod state;

pub use apply::{ApplyOptions, ApplyReport, Engine};
pub use compose::{CollageSettings, ComposeOutcome, Composer, FitMode, SelectionPlan};
pub use duration::parse_duration;
pub use error::{CollageError, ErrorReporting, Result};
pub use grid::{grid_shape, partition, CellRect};
pub use monitor::{virtual_desktop, Bounds, ConfiguredMonitors, MonitorRect, MonitorSource};
pub use pool::{ImagePool, PoolEntry};
pub use selection::{SelectionMode, Selector};
pub use setter::{CommandSetter, RecordingSetter, WallpaperSetter};
pub use state::SelectionState;
