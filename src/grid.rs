use crate::bucket::date_key;
use crate::errors::CalendarError;
use crate::models::{DealsByDate, GridCell, GridDescription, YearMonth};
use chrono::{Datelike, Duration, NaiveDate};

pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn build_grid(
    year: i32,
    month: u32,
    deals_by_date: &DealsByDate,
    today: NaiveDate,
) -> Result<GridDescription, CalendarError> {
    let target = YearMonth::new(year, month)?;
    let first = target.first_day()?;
    let days_in_month = days_in_month(year, month)?;
    let blanks = leading_blanks(year, month)?;

    let mut cells = Vec::with_capacity((blanks + days_in_month) as usize);
    cells.extend((0..blanks).map(|_| GridCell::Blank));

    for offset in 0..days_in_month {
        let date = first + Duration::days(i64::from(offset));
        let key = date_key(date);
        let deal_count = deals_by_date.get(&key).map_or(0, Vec::len);
        cells.push(GridCell::Day {
            day: offset + 1,
            date: key,
            is_today: date == today,
            deal_count,
        });
    }

    Ok(GridDescription {
        year,
        month,
        label: target.label(),
        weekdays: WEEKDAYS,
        leading_blanks: blanks,
        days_in_month,
        cells,
    })
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32, CalendarError> {
    YearMonth::new(year, month)?.last_day().map(|last| last.day())
}

/// Blank cells before the 1st in a Monday-first week (0 when the 1st is a Monday).
pub fn leading_blanks(year: i32, month: u32) -> Result<u32, CalendarError> {
    let first = YearMonth::new(year, month)?.first_day()?;
    let sunday_first = first.weekday().num_days_from_sunday();
    Ok(if sunday_first == 0 { 6 } else { sunday_first - 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::bucket_in;
    use crate::models::{CustomField, Deal, FieldValue, RawDealRecord};
    use chrono::{Utc, Weekday};

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn day_cells(grid: &GridDescription) -> Vec<(u32, bool, usize)> {
        grid.cells
            .iter()
            .filter_map(|cell| match cell {
                GridCell::Day {
                    day,
                    is_today,
                    deal_count,
                    ..
                } => Some((*day, *is_today, *deal_count)),
                GridCell::Blank => None,
            })
            .collect()
    }

    #[test]
    fn leap_february_has_29_days() {
        assert_eq!(days_in_month(2024, 1).unwrap(), 29);
        assert_eq!(days_in_month(2023, 1).unwrap(), 28);
        assert_eq!(days_in_month(1900, 1).unwrap(), 28);
        assert_eq!(days_in_month(2000, 1).unwrap(), 29);

        let grid = build_grid(2024, 1, &DealsByDate::new(), day(2024, 3, 1)).unwrap();
        assert_eq!(grid.days_in_month, 29);
    }

    #[test]
    fn month_lengths_cover_30_and_31() {
        assert_eq!(days_in_month(2023, 3).unwrap(), 30);
        assert_eq!(days_in_month(2023, 11).unwrap(), 31);
        assert_eq!(days_in_month(2023, 0).unwrap(), 31);
    }

    #[test]
    fn cell_count_is_blanks_plus_days_for_every_month() {
        let today = day(2030, 6, 1);
        for year in [1999, 2023, 2024, 2025] {
            for month in 0..12 {
                let grid = build_grid(year, month, &DealsByDate::new(), today).unwrap();
                assert_eq!(
                    grid.cells.len() as u32,
                    grid.leading_blanks + grid.days_in_month
                );
                assert!(grid.leading_blanks <= 6);
                assert_eq!(grid.leading_blanks, leading_blanks(year, month).unwrap());

                let first = day(year, month + 1, 1);
                assert_eq!(grid.leading_blanks == 0, first.weekday() == Weekday::Mon);
                assert!(
                    grid.cells[..grid.leading_blanks as usize]
                        .iter()
                        .all(|cell| *cell == GridCell::Blank)
                );
            }
        }
    }

    #[test]
    fn sunday_start_needs_six_blanks() {
        // 2023-10-01 was a Sunday, 2024-01-01 a Monday.
        assert_eq!(leading_blanks(2023, 9).unwrap(), 6);
        assert_eq!(leading_blanks(2024, 0).unwrap(), 0);
    }

    #[test]
    fn today_is_marked_once_inside_month_only() {
        let inside = build_grid(2024, 4, &DealsByDate::new(), day(2024, 5, 17)).unwrap();
        let marked: Vec<u32> = day_cells(&inside)
            .into_iter()
            .filter(|(_, is_today, _)| *is_today)
            .map(|(day, _, _)| day)
            .collect();
        assert_eq!(marked, vec![17]);

        let outside = build_grid(2024, 4, &DealsByDate::new(), day(2024, 6, 17)).unwrap();
        assert!(day_cells(&outside).iter().all(|(_, is_today, _)| !is_today));
    }

    #[test]
    fn deal_counts_follow_buckets() {
        let mut deals = DealsByDate::new();
        let deal = Deal {
            id: 1,
            name: "A".to_string(),
            status_id: 0,
            price: 0.0,
        };
        deals.insert("2024-05-03".to_string(), vec![deal.clone(), deal.clone()]);
        deals.insert("2024-06-03".to_string(), vec![deal]);

        let grid = build_grid(2024, 4, &deals, day(2024, 1, 1)).unwrap();
        let counts: Vec<(u32, usize)> = day_cells(&grid)
            .into_iter()
            .filter(|(_, _, count)| *count > 0)
            .map(|(day, _, count)| (day, count))
            .collect();
        assert_eq!(counts, vec![(3, 2)]);
    }

    #[test]
    fn bucketed_timestamp_shows_in_grid() {
        let records = vec![RawDealRecord {
            id: Some(9),
            custom_fields: Some(vec![CustomField {
                field_id: Some(885453),
                values: Some(vec![FieldValue {
                    value: serde_json::json!(1_700_000_000),
                }]),
            }]),
            ..RawDealRecord::default()
        }];
        let buckets = bucket_in(&records, 885453, &Utc);
        let grid = build_grid(2023, 10, &buckets, day(2023, 11, 1)).unwrap();

        let fourteenth = day_cells(&grid)
            .into_iter()
            .find(|(day, _, _)| *day == 14)
            .unwrap();
        assert_eq!(fourteenth.2, 1);
    }

    #[test]
    fn record_without_date_field_leaves_grid_empty() {
        let records = vec![RawDealRecord {
            id: Some(1),
            custom_fields: Some(vec![CustomField {
                field_id: Some(1),
                values: Some(vec![FieldValue {
                    value: serde_json::json!(1_700_000_000),
                }]),
            }]),
            ..RawDealRecord::default()
        }];
        let buckets = bucket_in(&records, 885453, &Utc);
        let grid = build_grid(2023, 10, &buckets, day(2023, 11, 1)).unwrap();
        assert!(day_cells(&grid).iter().all(|(_, _, count)| *count == 0));
    }

    #[test]
    fn invalid_month_is_rejected() {
        let err = build_grid(2024, 12, &DealsByDate::new(), day(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidDate { year: 2024, month: 12 }));
        assert!(build_grid(i32::MAX, 0, &DealsByDate::new(), day(2024, 1, 1)).is_err());
    }

    #[test]
    fn grid_is_deterministic() {
        let today = day(2024, 2, 10);
        let a = build_grid(2024, 1, &DealsByDate::new(), today).unwrap();
        let b = build_grid(2024, 1, &DealsByDate::new(), today).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.label, "February 2024");
        assert_eq!(a.weekdays, WEEKDAYS);
    }
}
