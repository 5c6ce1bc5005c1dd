mod maths_utils;
mod perf;
mod time_utils;

pub use maths_utils::{cyclical, lerp, round_to};
pub use time_utils::{
    TimeUtils, format_timestamp, local_now, parse_timestamp,
};
