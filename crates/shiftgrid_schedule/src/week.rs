//! Week assembly: grouping, per-week workbooks and the worker fan-out.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Instant;

use chrono::{Datelike, NaiveDate};
use rayon::ThreadPoolBuilder;
use rust_xlsxwriter::Workbook;
use shiftgrid_io_xlsx::util::derive_xlsx_error;
use shiftgrid_io_xlsx::{SpecFooterTemplate, derive_unique_sheet_name};

use crate::grid::build_day_schedule;
use crate::layout::{SpecStyleRegistry, write_day_sheet};
use crate::report::ReportScheduleBuilder;
use crate::spec::{
    ScheduleError, SpecEnrichedShift, SpecGridOptions, SpecScheduleOptions, SpecScheduleTheme,
    SpecWeekOutcome,
};
use crate::util::{calculate_worker_limit, derive_panic_message, derive_week_file_name};

/// Shifts of one date.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDayGroup {
    pub date: NaiveDate,
    pub shifts: Vec<SpecEnrichedShift>,
}

/// One unit of work: a week and its days in sheet order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecWeekJob {
    pub week_number: u32,
    pub file_name: String,
    pub days: Vec<SpecDayGroup>,
}

/// Read-only state shared by all week units.
#[derive(Debug, Clone)]
pub struct SpecWeekShared {
    pub grid: SpecGridOptions,
    pub theme: SpecScheduleTheme,
    pub lunch_label: String,
    pub footer: Option<SpecFooterTemplate>,
}

/// Group shifts by ISO week (ascending), then by date.
///
/// Days are ordered Monday to Sunday, then by date. Every group is non-empty.
pub fn group_week_jobs(shifts: Vec<SpecEnrichedShift>, file_prefix: &str) -> Vec<SpecWeekJob> {
    let mut dict_weeks: BTreeMap<u32, BTreeMap<NaiveDate, Vec<SpecEnrichedShift>>> =
        BTreeMap::new();
    for shift in shifts {
        dict_weeks
            .entry(shift.shift.week_number)
            .or_default()
            .entry(shift.shift.date)
            .or_default()
            .push(shift);
    }

    dict_weeks
        .into_iter()
        .map(|(week_number, dict_days)| {
            let mut days = dict_days
                .into_iter()
                .map(|(date, shifts)| SpecDayGroup { date, shifts })
                .collect::<Vec<_>>();
            days.sort_by_key(|day| (day.date.weekday().num_days_from_monday(), day.date));
            SpecWeekJob {
                week_number,
                file_name: derive_week_file_name(file_prefix, week_number),
                days,
            }
        })
        .collect()
}

/// Build one week's workbook: one sheet per day, created in job order.
///
/// Returns the workbook bytes and the number of sheets written.
pub fn assemble_week(
    job: &SpecWeekJob,
    shared: &SpecWeekShared,
) -> Result<(Vec<u8>, usize), ScheduleError> {
    let mut workbook = Workbook::new();
    let styles = SpecStyleRegistry::from_theme(&shared.theme);
    let mut set_sheet_names = BTreeSet::new();

    for day_group in &job.days {
        let day = build_day_schedule(&day_group.shifts, &shared.grid)?;
        let c_sheet_name = derive_unique_sheet_name(&day.weekday_label, &mut set_sheet_names);
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&c_sheet_name)
            .map_err(derive_xlsx_error)?;
        write_day_sheet(
            worksheet,
            &day,
            &styles,
            shared.footer.as_ref(),
            &shared.lunch_label,
        )?;
        tracing::debug!(
            week = job.week_number,
            sheet = %c_sheet_name,
            date = %day.date_label,
            rows = day.shifts.len(),
            "wrote day sheet"
        );
    }

    let v_bytes = workbook.save_to_buffer().map_err(derive_xlsx_error)?;
    Ok((v_bytes, job.days.len()))
}

/// Builds one week's workbook bytes and sheet count.
type FnAssembleWeek = dyn Fn(&SpecWeekJob) -> Result<(Vec<u8>, usize), ScheduleError> + Send + Sync;

fn run_week_job(
    job: &SpecWeekJob,
    f_assemble: &FnAssembleWeek,
) -> Result<(Vec<u8>, usize), ScheduleError> {
    match catch_unwind(AssertUnwindSafe(|| f_assemble(job))) {
        Ok(result) => result,
        Err(payload) => Err(ScheduleError::WorkerPanic(derive_panic_message(payload.as_ref()))),
    }
}

fn apply_outcome(
    outcome: SpecWeekOutcome,
    n_sheets: usize,
    builder: &mut ReportScheduleBuilder,
) {
    match outcome.result {
        Ok(v_bytes) => {
            tracing::info!(
                week = outcome.week_number,
                file = %outcome.file_name,
                sheets = n_sheets,
                bytes = v_bytes.len(),
                "week workbook ready"
            );
            builder.add_counts(&["cnt_sheets"], n_sheets as u64);
            builder.add_workbook(outcome.file_name, v_bytes);
        }
        Err(err) => builder.add_failure(outcome.week_number, outcome.file_name, err.to_string()),
    }
}

fn derive_outcome(
    job: &SpecWeekJob,
    result: Result<(Vec<u8>, usize), ScheduleError>,
) -> (SpecWeekOutcome, usize) {
    let (result, n_sheets) = match result {
        Ok((v_bytes, n_sheets)) => (Ok(v_bytes), n_sheets),
        Err(err) => (Err(err), 0),
    };
    (
        SpecWeekOutcome {
            week_number: job.week_number,
            file_name: job.file_name.clone(),
            result,
        },
        n_sheets,
    )
}

/// Run every week job and record outcomes in `builder`.
///
/// Weeks run on a rayon pool and report back over a channel; with a deadline,
/// weeks still pending when it elapses are recorded as timed out. When the pool
/// cannot be built the jobs run serially.
pub fn create_week_schedules(
    jobs: Vec<SpecWeekJob>,
    shared: Arc<SpecWeekShared>,
    options: &SpecScheduleOptions,
    builder: &mut ReportScheduleBuilder,
) {
    if jobs.is_empty() {
        return;
    }
    let instant_deadline = options.deadline.map(|deadline| Instant::now() + deadline);
    let n_workers_max = calculate_worker_limit(options.num_workers_max).min(jobs.len());
    let f_assemble: Arc<FnAssembleWeek> =
        Arc::new(move |job: &SpecWeekJob| assemble_week(job, &shared));

    run_week_jobs(jobs, n_workers_max, instant_deadline, f_assemble, builder);
}

/// Fan `jobs` out over `n_workers_max` threads, or run them serially for one.
fn run_week_jobs(
    jobs: Vec<SpecWeekJob>,
    n_workers_max: usize,
    instant_deadline: Option<Instant>,
    f_assemble: Arc<FnAssembleWeek>,
    builder: &mut ReportScheduleBuilder,
) {
    if n_workers_max <= 1 {
        run_week_jobs_serial(jobs, f_assemble.as_ref(), instant_deadline, builder);
        return;
    }

    let thread_pool = ThreadPoolBuilder::new()
        .num_threads(n_workers_max)
        .thread_name(|n_idx| format!("shiftgrid-week-{n_idx}"))
        .build();
    let Ok(thread_pool) = thread_pool else {
        builder.add_warning(format!(
            "Failed to initialize thread pool (workers={n_workers_max}); fallback to serial generation."
        ));
        run_week_jobs_serial(jobs, f_assemble.as_ref(), instant_deadline, builder);
        return;
    };

    let (tx, rx) = mpsc::channel::<(SpecWeekOutcome, usize)>();
    let mut dict_pending = BTreeMap::new();
    for job in jobs {
        dict_pending.insert(job.week_number, job.file_name.clone());
        let tx = tx.clone();
        let f_assemble = Arc::clone(&f_assemble);
        thread_pool.spawn(move || {
            let result = run_week_job(&job, f_assemble.as_ref());
            // Receiver is gone once the deadline has passed.
            let _ = tx.send(derive_outcome(&job, result));
        });
    }
    drop(tx);

    while !dict_pending.is_empty() {
        let received = match instant_deadline {
            Some(instant) => {
                let remaining = instant.saturating_duration_since(Instant::now());
                match rx.recv_timeout(remaining) {
                    Ok(message) => Some(message),
                    Err(mpsc::RecvTimeoutError::Timeout) => None,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            },
        };
        let Some((outcome, n_sheets)) = received else {
            break;
        };
        dict_pending.remove(&outcome.week_number);
        apply_outcome(outcome, n_sheets, builder);
    }

    for (week_number, file_name) in dict_pending {
        builder.add_failure(week_number, file_name, ScheduleError::DeadlineExceeded.to_string());
    }
}

fn run_week_jobs_serial(
    jobs: Vec<SpecWeekJob>,
    f_assemble: &FnAssembleWeek,
    instant_deadline: Option<Instant>,
    builder: &mut ReportScheduleBuilder,
) {
    for job in jobs {
        if instant_deadline.is_some_and(|instant| Instant::now() >= instant) {
            builder.add_failure(
                job.week_number,
                job.file_name,
                ScheduleError::DeadlineExceeded.to_string(),
            );
            continue;
        }
        let result = run_week_job(&job, f_assemble);
        let (outcome, n_sheets) = derive_outcome(&job, result);
        apply_outcome(outcome, n_sheets, builder);
    }
}
