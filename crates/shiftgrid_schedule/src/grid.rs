//! Per-day hour grid: slot boundaries and per-employee slot states.

use chrono::{Datelike, NaiveTime, TimeDelta};

use crate::conf::{C_DATE_FORMAT, C_TIME_FORMAT, N_HOURS_LUNCH_OFFSET};
use crate::spec::{
    EnumHourState, ScheduleError, SpecDaySchedule, SpecEnrichedShift, SpecGridOptions,
    SpecShiftActivity,
};
use crate::util::{derive_weekday_label, format_hours_label};

/// Hourly boundaries from `day_start` to `day_end`.
///
/// Boundaries before `hide_before` are dropped; `day_end` is appended when it is
/// later than the last kept boundary or when none was kept.
pub fn derive_slot_boundaries(
    day_start: NaiveTime,
    day_end: NaiveTime,
    hide_before: NaiveTime,
) -> Vec<NaiveTime> {
    let mut l_boundaries = Vec::new();
    let mut t = day_start;
    while t <= day_end {
        if t >= hide_before {
            l_boundaries.push(t);
        }
        let (t_next, n_wrapped_secs) = t.overflowing_add_signed(TimeDelta::hours(1));
        if n_wrapped_secs != 0 {
            break;
        }
        t = t_next;
    }

    match l_boundaries.last() {
        Some(t_last) if *t_last >= day_end => {}
        _ => l_boundaries.push(day_end),
    }
    l_boundaries
}

/// Classify one slot start against a shift window.
pub fn classify_slot(
    slot: NaiveTime,
    start: NaiveTime,
    end: NaiveTime,
    has_lunch: bool,
    role: &str,
) -> EnumHourState {
    if slot < start || slot >= end {
        return EnumHourState::Free;
    }
    if has_lunch && slot == start + TimeDelta::hours(N_HOURS_LUNCH_OFFSET) {
        return EnumHourState::Lunch;
    }
    if role.is_empty() {
        EnumHourState::Work
    } else {
        EnumHourState::Assigned
    }
}

/// Build the grid for one date.
///
/// Shifts are sorted by `(start, end)` (stable) before rows are emitted. All rows
/// share the day's slots.
pub fn build_day_schedule(
    shifts: &[SpecEnrichedShift],
    options: &SpecGridOptions,
) -> Result<SpecDaySchedule, ScheduleError> {
    let Some(first) = shifts.first() else {
        return Err(ScheduleError::EmptyDay);
    };
    let date = first.shift.date;
    if let Some(other) = shifts.iter().find(|v| v.shift.date != date) {
        tracing::debug!(
            date = %date,
            other = %other.shift.date,
            "mixed dates passed to day grid; using the first"
        );
    }

    let mut l_sorted = shifts.iter().collect::<Vec<_>>();
    l_sorted.sort_by_key(|v| (v.shift.start_time, v.shift.end_time));

    let day_start = l_sorted
        .iter()
        .map(|v| v.shift.start_time)
        .min()
        .unwrap_or(first.shift.start_time);
    let day_end = l_sorted
        .iter()
        .map(|v| v.shift.end_time)
        .max()
        .unwrap_or(first.shift.end_time);
    let l_boundaries = derive_slot_boundaries(day_start, day_end, options.hide_before);
    let l_slot_starts = &l_boundaries[..l_boundaries.len().saturating_sub(1)];

    let mut headers = options.labels_leading.clone();
    headers.extend(l_boundaries.windows(2).map(|pair| {
        format!(
            "{}-{}",
            pair[0].format(C_TIME_FORMAT),
            pair[1].format(C_TIME_FORMAT)
        )
    }));

    let l_activities = l_sorted
        .iter()
        .map(|v| SpecShiftActivity {
            employee_id: v.shift.employee_id,
            employee_name: format!("{} {}", v.shift.first_name, v.shift.last_name),
            shift_time_label: v.shift.time_label.clone(),
            role: v.role.clone(),
            phone: v.phone.clone(),
            shift_length_label: format_hours_label(v.shift.shift_length_hours),
            hour_states: l_slot_starts
                .iter()
                .map(|slot| {
                    classify_slot(
                        *slot,
                        v.shift.start_time,
                        v.shift.end_time,
                        v.shift.has_lunch,
                        &v.role,
                    )
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    let weekday = date.weekday();
    Ok(SpecDaySchedule {
        weekday,
        weekday_label: derive_weekday_label(weekday).to_string(),
        date,
        date_label: date.format(C_DATE_FORMAT).to_string(),
        week_number: first.shift.week_number,
        headers,
        boundaries: l_boundaries,
        shifts: l_activities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_row;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn enriched(id: &str, window: &str, role: &str) -> SpecEnrichedShift {
        let row = [id, "Doe", "Jane", "Day", "2024-03-05", window, "Kitchen"]
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>();
        SpecEnrichedShift {
            shift: normalize_row(&row).unwrap(),
            role: role.to_string(),
            phone: String::new(),
        }
    }

    #[test]
    fn boundaries_hide_early_hours_and_append_day_end() {
        assert_eq!(
            derive_slot_boundaries(hm(8, 0), hm(12, 30), hm(10, 0)),
            vec![hm(10, 0), hm(11, 0), hm(12, 0), hm(12, 30)]
        );
        assert_eq!(
            derive_slot_boundaries(hm(10, 0), hm(12, 0), hm(10, 0)),
            vec![hm(10, 0), hm(11, 0), hm(12, 0)]
        );
        assert_eq!(
            derive_slot_boundaries(hm(6, 0), hm(9, 0), hm(10, 0)),
            vec![hm(9, 0)]
        );
        assert_eq!(
            derive_slot_boundaries(hm(9, 30), hm(11, 0), hm(10, 0)),
            vec![hm(10, 30), hm(11, 0)]
        );
    }

    #[test]
    fn boundaries_stop_at_midnight() {
        let l_boundaries = derive_slot_boundaries(hm(22, 0), hm(23, 30), hm(10, 0));
        assert_eq!(l_boundaries, vec![hm(22, 0), hm(23, 0), hm(23, 30)]);
    }

    #[test]
    fn scenario_a_lunch_and_work_without_role() {
        let l_shifts = [enriched("1", "09:00 - 17:00", "")];
        let day = build_day_schedule(&l_shifts, &SpecGridOptions::default()).unwrap();
        let activity = &day.shifts[0];
        assert_eq!(activity.shift_length_label, "7");
        assert_eq!(
            &day.headers[3..],
            &[
                "10:00-11:00",
                "11:00-12:00",
                "12:00-13:00",
                "13:00-14:00",
                "14:00-15:00",
                "15:00-16:00",
                "16:00-17:00"
            ]
        );
        assert_eq!(
            activity.hour_states,
            vec![
                EnumHourState::Work,
                EnumHourState::Work,
                EnumHourState::Work,
                EnumHourState::Work,
                EnumHourState::Lunch,
                EnumHourState::Work,
                EnumHourState::Work,
            ]
        );
        assert_eq!(day.weekday_label, "Tuesday");
        assert_eq!(day.date_label, "2024-03-05");
        assert_eq!(day.week_number, 10);
    }

    #[test]
    fn scenario_b_role_turns_work_into_assigned() {
        let l_shifts = [enriched("1", "09:00 - 17:00", "Chef")];
        let day = build_day_schedule(&l_shifts, &SpecGridOptions::default()).unwrap();
        let l_states = &day.shifts[0].hour_states;
        assert_eq!(l_states[4], EnumHourState::Lunch);
        assert!(
            l_states
                .iter()
                .enumerate()
                .all(|(n_idx, state)| n_idx == 4 || *state == EnumHourState::Assigned)
        );
    }

    #[test]
    fn scenario_c_union_window_shared_by_all_rows() {
        let day = build_day_schedule(
            &[
                enriched("2", "13:00 - 18:00", ""),
                enriched("1", "08:00 - 12:00", ""),
            ],
            &SpecGridOptions::default(),
        )
        .unwrap();

        assert_eq!(day.boundaries.first(), Some(&hm(10, 0)));
        assert_eq!(day.boundaries.last(), Some(&hm(18, 0)));
        assert_eq!(day.shifts[0].shift_time_label, "08:00 - 12:00");
        assert_eq!(day.shifts[0].hour_states.len(), day.shifts[1].hour_states.len());
        assert_eq!(day.shifts[0].hour_states.len(), day.headers.len() - 3);
        assert_eq!(day.shifts[0].hour_states[0], EnumHourState::Work);
        assert_eq!(day.shifts[0].hour_states[2], EnumHourState::Free);
        assert_eq!(day.shifts[1].hour_states[2], EnumHourState::Free);
        assert_eq!(day.shifts[1].hour_states[3], EnumHourState::Work);
    }

    #[test]
    fn lunch_only_when_longer_than_five_hours() {
        let day = build_day_schedule(
            &[
                enriched("1", "10:00 - 15:00", ""),
                enriched("2", "10:00 - 15:01", ""),
            ],
            &SpecGridOptions::default(),
        )
        .unwrap();
        assert!(!day.shifts[0].hour_states.contains(&EnumHourState::Lunch));
        assert_eq!(day.shifts[0].shift_length_label, "5");
        // 15:00 is a displayed slot start; the second window covers it.
        assert_eq!(day.shifts[1].hour_states[5], EnumHourState::Lunch);
        assert_eq!(day.shifts[1].shift_length_label, "4.02");
    }

    #[test]
    fn build_day_schedule_is_idempotent() {
        let shifts = [
            enriched("1", "09:00 - 17:00", "Chef"),
            enriched("2", "11:00 - 14:30", ""),
        ];
        let options = SpecGridOptions::default();
        assert_eq!(
            build_day_schedule(&shifts, &options).unwrap(),
            build_day_schedule(&shifts, &options).unwrap()
        );
    }

    #[test]
    fn hide_before_is_configurable() {
        let options = SpecGridOptions {
            hide_before: hm(0, 0),
            ..Default::default()
        };
        let day = build_day_schedule(&[enriched("1", "08:00 - 10:00", "")], &options).unwrap();
        assert_eq!(&day.headers[3..], &["08:00-09:00", "09:00-10:00"]);
    }

    #[test]
    fn empty_day_is_an_error() {
        assert!(matches!(
            build_day_schedule(&[], &SpecGridOptions::default()),
            Err(ScheduleError::EmptyDay)
        ));
    }
}
