pub mod interval;

pub use interval::{
    Interval, IntervalCategory, NewInterval, SearchParams, SearchResult, TimeRange, DAY_MS,
    HOUR_MS, MINUTE_MS, SECOND_MS, STATUS_ONLINE,
};
