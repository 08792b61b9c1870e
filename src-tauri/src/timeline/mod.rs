//! Time-window state machine, its rendering helpers, and the controller that
//! keeps it in sync with interval storage.

pub mod clock;
pub mod controller;
pub mod format;
pub mod layout;
pub mod repository;
pub mod ruler;
pub mod sync;
pub mod window;

pub use clock::{day_range, shift_days, Clock, ManualClock, SystemClock};
pub use controller::{
    SelectedInterval, TimelineController, TimelineSnapshot, TimelineSummary, TimelineView,
};
pub use format::format_duration;
pub use layout::{label_color, layout_track, TrackGeometry};
pub use repository::{IntervalRepository, IntervalSet, RepositoryClient};
pub use ruler::{ruler_ticks_in, RulerTick};
pub use sync::LiveSync;
pub use window::{TimeWindow, WheelOutcome};
