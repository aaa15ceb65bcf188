//! `shiftgrid_schedule`:
//! attendance records to one hour-grid workbook per ISO week.
//!
//! - `conf`      : constants and default presets
//! - `spec`      : records, options, outcomes and errors
//! - `util`      : pure helper functions
//! - `report`    : run report and its builder
//! - `normalize` : attendance row parsing and the lunch rule
//! - `enrich`    : settings index and join
//! - `grid`      : per-day slot boundaries and hour states
//! - `layout`    : day sheet layout
//! - `week`      : week grouping, workbook assembly and worker fan-out
//! - `pipeline`  : `process_files` entry point
pub mod conf;
pub mod enrich;
pub mod grid;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod spec;
pub mod util;
pub mod week;

pub use conf::{
    C_FILE_PREFIX_DEFAULT, C_LABEL_LUNCH, TUP_ATTENDANCE_COLUMNS, TUP_LABELS_LEADING_DEFAULT,
    TUP_SETTINGS_COLUMNS,
};
pub use enrich::{build_settings_index, join_settings};
pub use grid::{build_day_schedule, classify_slot, derive_slot_boundaries};
pub use layout::{SpecSheetLayout, SpecStyleRegistry, write_day_sheet};
pub use normalize::{
    compute_week_number, normalize_row, normalize_rows, parse_date, parse_employee_id,
    parse_shift_window,
};
pub use pipeline::process_files;
pub use report::{ReportSchedule, ReportScheduleBuilder};
pub use spec::{
    EnumHourState, ScheduleError, SpecDaySchedule, SpecEmployeeSettings, SpecEnrichedShift,
    SpecGridOptions, SpecNormalizedBatch, SpecNormalizedShift, SpecScheduleOptions,
    SpecScheduleTheme, SpecShiftActivity, SpecShiftWindow, SpecWeekFailure, SpecWeekOutcome,
};
pub use util::{format_hours_label, parse_time_of_day};
pub use week::{
    SpecDayGroup, SpecWeekJob, SpecWeekShared, assemble_week, create_week_schedules,
    group_week_jobs,
};
