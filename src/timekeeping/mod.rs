//! Database-free time arithmetic: interval overlap, worked and break hours,
//! overtime and efficiency.

mod hours;
mod intervals;

pub use hours::{
    HoursSummary, Period, break_hours, efficiency, expected_hours, ratio, summarize, worked_hours,
};
pub use intervals::{Interval, Window};
