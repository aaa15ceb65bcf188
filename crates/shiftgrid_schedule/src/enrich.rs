//! Settings index and join.

use std::collections::HashMap;

use crate::conf::TUP_SETTINGS_COLUMNS;
use crate::report::ReportScheduleBuilder;
use crate::spec::{SpecEmployeeSettings, SpecEnrichedShift, SpecNormalizedShift};

/// Build `employeeId -> settings` from the settings table (header row first).
///
/// Problems degrade to warnings: too few columns gives an empty index, extra
/// columns are ignored, rows with a non-integer id are skipped, and the first
/// row wins on duplicate ids.
pub fn build_settings_index(
    rows: &[Vec<String>],
    builder: &mut ReportScheduleBuilder,
) -> HashMap<i64, SpecEmployeeSettings> {
    let mut dict_settings = HashMap::new();

    let n_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.len() < 2 {
        builder.add_warning("Settings table is empty or has no data rows.".to_string());
        return dict_settings;
    }
    if n_cols < TUP_SETTINGS_COLUMNS.len() {
        builder.add_warning(format!(
            "Settings table has {n_cols} columns, expected {}; settings ignored.",
            TUP_SETTINGS_COLUMNS.len()
        ));
        return dict_settings;
    }
    if n_cols > TUP_SETTINGS_COLUMNS.len() {
        builder.add_warning(format!(
            "Settings table has {n_cols} columns; only the first {} are used.",
            TUP_SETTINGS_COLUMNS.len()
        ));
    }

    for (n_idx, row) in rows.iter().enumerate().skip(1) {
        let derive_cell = |n_col: usize| row.get(n_col).map_or("", |cell| cell.trim());
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let Ok(employee_id) = derive_cell(0).parse::<i64>() else {
            builder.add_warning(format!(
                "Settings row {}: employee id {:?} is not an integer; row skipped.",
                n_idx + 1,
                derive_cell(0)
            ));
            continue;
        };
        if dict_settings.contains_key(&employee_id) {
            tracing::debug!(employee_id, row = n_idx + 1, "duplicate settings row ignored");
            continue;
        }
        dict_settings.insert(
            employee_id,
            SpecEmployeeSettings {
                phone: derive_cell(1).to_string(),
                role: derive_cell(2).to_string(),
            },
        );
    }

    tracing::debug!(employees = dict_settings.len(), "built settings index");
    dict_settings
}

/// Attach role and phone to each shift; unmatched shifts get empty strings.
pub fn join_settings(
    shifts: Vec<SpecNormalizedShift>,
    dict_settings: &HashMap<i64, SpecEmployeeSettings>,
) -> Vec<SpecEnrichedShift> {
    shifts
        .into_iter()
        .map(|shift| {
            let settings = dict_settings.get(&shift.employee_id);
            SpecEnrichedShift {
                role: settings.map(|v| v.role.clone()).unwrap_or_default(),
                phone: settings.map(|v| v.phone.clone()).unwrap_or_default(),
                shift,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_row;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn build_settings_index_keeps_first_and_skips_bad_ids() {
        let rows = vec![
            row(&["employeeId", "phone", "role"]),
            row(&["1", "555-0100", "Chef"]),
            row(&["1", "555-0199", "Dishwasher"]),
            row(&["-", "555-0000", "Ghost"]),
            row(&["2", "555-0200", ""]),
        ];
        let mut builder = ReportScheduleBuilder::default();
        let dict_settings = build_settings_index(&rows, &mut builder);

        assert_eq!(dict_settings.len(), 2);
        assert_eq!(dict_settings[&1].role, "Chef");
        assert_eq!(dict_settings[&1].phone, "555-0100");
        assert_eq!(dict_settings[&2].role, "");
        assert!(!dict_settings.contains_key(&-1));
        assert_eq!(builder.warnings.len(), 1);
    }

    #[test]
    fn build_settings_index_column_count_rules() {
        let mut builder = ReportScheduleBuilder::default();
        let l_rows = [row(&["employeeId", "phone"]), row(&["1", "555"])];
        let dict_settings = build_settings_index(&l_rows, &mut builder);
        assert!(dict_settings.is_empty());
        assert_eq!(builder.warnings.len(), 1);

        let mut builder = ReportScheduleBuilder::default();
        let dict_settings = build_settings_index(
            &[
                row(&["employeeId", "phone", "role", "note"]),
                row(&["1", "555", "Bar", "extra"]),
            ],
            &mut builder,
        );
        assert_eq!(dict_settings[&1].role, "Bar");
        assert_eq!(builder.warnings.len(), 1);
    }

    #[test]
    fn join_settings_fills_empty_on_miss() {
        let shifts = vec![
            normalize_row(&row(&["1", "Doe", "Jane", "Day", "2024-03-04", "09:00 - 17:00", "K"]))
                .unwrap(),
            normalize_row(&row(&["x", "Roe", "Rick", "Day", "2024-03-04", "09:00 - 12:00", "K"]))
                .unwrap(),
        ];
        let mut dict_settings = HashMap::new();
        dict_settings.insert(
            1,
            SpecEmployeeSettings {
                phone: "555".to_string(),
                role: "Chef".to_string(),
            },
        );

        let enriched = join_settings(shifts, &dict_settings);
        assert_eq!(enriched[0].role, "Chef");
        assert_eq!(enriched[0].phone, "555");
        assert_eq!(enriched[1].role, "");
        assert_eq!(enriched[1].phone, "");
        assert_eq!(enriched[1].shift.employee_id, -1);
    }
}
