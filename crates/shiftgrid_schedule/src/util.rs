//! Stateless helpers shared by the normalizer, grid builder and week assembler.

use std::any::Any;

use chrono::{NaiveTime, Weekday};

use crate::conf::{C_TIME_FORMAT, N_WORKERS_DEFAULT_MAX, TUP_WEEKDAY_NAMES};

/// Resolve the worker cap against available cores.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, N_WORKERS_DEFAULT_MAX),
    }
}

/// Parse strict `HH:MM`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, C_TIME_FORMAT).ok()
}

/// Render hours with at most two decimals and no trailing zeros.
pub fn format_hours_label(hours: f64) -> String {
    let c_label = format!("{hours:.2}");
    let c_label = c_label.trim_end_matches('0').trim_end_matches('.');
    match c_label {
        "-0" | "" => "0".to_string(),
        _ => c_label.to_string(),
    }
}

/// Full English weekday name.
pub fn derive_weekday_label(weekday: Weekday) -> &'static str {
    TUP_WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// `"<prefix> <week>.xlsx"`.
pub fn derive_week_file_name(file_prefix: &str, week_number: u32) -> String {
    format!("{file_prefix} {week_number}.xlsx")
}

/// Text of a caught panic payload.
pub(crate) fn derive_panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(c_msg) = payload.downcast_ref::<&str>() {
        return (*c_msg).to_string();
    }
    if let Some(c_msg) = payload.downcast_ref::<String>() {
        return c_msg.clone();
    }
    "unknown panic payload".to_string()
}
