use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::errors::AppError;
use crate::models::contact::ContactRow;

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Error, PartialEq)]
pub enum BirthdayWindowError {
    #[error("window length must not be negative (got {0})")]
    NegativeWindow(i64),

    #[error("window of {0} days starting {1} exceeds the supported calendar range")]
    OutOfRange(i64, NaiveDate),
}

impl From<BirthdayWindowError> for AppError {
    fn from(e: BirthdayWindowError) -> Self {
        AppError::InvalidArgument(e.to_string())
    }
}

/// Inclusive date range `[start, end]` used to select upcoming anniversaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthdayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl BirthdayWindow {
    pub fn new(today: NaiveDate, days: i64) -> Result<Self, BirthdayWindowError> {
        if days < 0 {
            return Err(BirthdayWindowError::NegativeWindow(days));
        }
        let end = today
            .checked_add_days(Days::new(days as u64))
            .ok_or(BirthdayWindowError::OutOfRange(days, today))?;
        Ok(Self { start: today, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Contacts whose next anniversary falls inside the window,
    /// soonest first, ties ordered by contact id.
    pub fn select(&self, contacts: Vec<ContactRow>) -> Vec<UpcomingBirthday> {
        let today = self.start;
        let mut upcoming: Vec<UpcomingBirthday> = contacts
            .into_iter()
            .filter_map(|contact| {
                let next_birthday = next_anniversary(contact.birthday, today)?;
                self.contains(next_birthday).then(|| UpcomingBirthday {
                    days_until: (next_birthday - today).num_days(),
                    next_birthday,
                    contact,
                })
            })
            .collect();

        upcoming.sort_by(|a, b| {
            a.next_birthday
                .cmp(&b.next_birthday)
                .then_with(|| a.contact.id.cmp(&b.contact.id))
        });
        upcoming
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpcomingBirthday {
    #[serde(flatten)]
    pub contact: ContactRow,
    pub next_birthday: NaiveDate,
    pub days_until: i64,
}

/// The birth month/day placed in `year`. Feb 29 rolls forward to Mar 1 in common years.
pub fn anniversary_in(birthday: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day()).or_else(|| {
        if birthday.month() == 2 && birthday.day() == 29 {
            NaiveDate::from_ymd_opt(year, 3, 1)
        } else {
            None
        }
    })
}

/// First anniversary on or after `today`, looking at this year and next.
pub fn next_anniversary(birthday: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    match anniversary_in(birthday, today.year()) {
        Some(date) if date >= today => Some(date),
        _ => anniversary_in(birthday, today.year() + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contact(first_name: &str, birthday: NaiveDate) -> ContactRow {
        ContactRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            phone_number: "555-0100".to_string(),
            birthday,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn upcoming_birthdays(
        today: NaiveDate,
        days: i64,
        contacts: Vec<ContactRow>,
    ) -> Result<Vec<UpcomingBirthday>, BirthdayWindowError> {
        Ok(BirthdayWindow::new(today, days)?.select(contacts))
    }

    fn birthdays(result: &[UpcomingBirthday]) -> Vec<(u32, u32)> {
        result
            .iter()
            .map(|u| (u.contact.birthday.month(), u.contact.birthday.day()))
            .collect()
    }

    #[test]
    fn test_scenario_week_from_june_first() {
        let contacts = vec![
            contact("Jun", date(1990, 6, 8)),
            contact("Late", date(1985, 6, 9)),
            contact("Today", date(2000, 6, 1)),
            contact("Gone", date(1970, 5, 31)),
        ];
        let result = upcoming_birthdays(date(2025, 6, 1), 7, contacts).unwrap();
        assert_eq!(birthdays(&result), vec![(6, 1), (6, 8)]);
        assert_eq!(result[0].days_until, 0);
        assert_eq!(result[1].days_until, 7);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let today = date(2025, 3, 10);
        let contacts = vec![
            contact("Start", date(1999, 3, 10)),
            contact("End", date(1999, 3, 17)),
            contact("After", date(1999, 3, 18)),
        ];
        let result = upcoming_birthdays(today, 7, contacts).unwrap();
        assert_eq!(birthdays(&result), vec![(3, 10), (3, 17)]);
    }

    #[test]
    fn test_zero_window_only_today() {
        let contacts = vec![
            contact("Today", date(1999, 3, 10)),
            contact("Tomorrow", date(1999, 3, 11)),
        ];
        let result = upcoming_birthdays(date(2025, 3, 10), 0, contacts).unwrap();
        assert_eq!(birthdays(&result), vec![(3, 10)]);
    }

    #[test]
    fn test_year_wraparound() {
        let contacts = vec![
            contact("NewYear", date(1992, 1, 2)),
            contact("Eve", date(1992, 12, 31)),
            contact("Past", date(1992, 12, 27)),
        ];
        let result = upcoming_birthdays(date(2024, 12, 28), 7, contacts).unwrap();
        assert_eq!(birthdays(&result), vec![(12, 31), (1, 2)]);
        assert_eq!(result[1].next_birthday, date(2025, 1, 2));
        assert_eq!(result[1].days_until, 5);
    }

    #[test]
    fn test_leap_day_rolls_to_march_first_in_common_year() {
        let contacts = vec![contact("Leap", date(2000, 2, 29))];
        let result = upcoming_birthdays(date(2025, 2, 25), 7, contacts).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].next_birthday, date(2025, 3, 1));
        assert_eq!(result[0].days_until, 4);
    }

    #[test]
    fn test_leap_day_kept_in_leap_year() {
        let contacts = vec![contact("Leap", date(2000, 2, 29))];
        let result = upcoming_birthdays(date(2028, 2, 25), 7, contacts).unwrap();
        assert_eq!(result[0].next_birthday, date(2028, 2, 29));
    }

    #[test]
    fn test_leap_day_after_leap_day_passed() {
        // 2024-03-01: Feb 29 has already happened this year, next one normalizes to 2025-03-01
        assert_eq!(
            next_anniversary(date(2000, 2, 29), date(2024, 3, 1)),
            Some(date(2025, 3, 1))
        );
        // 2025-03-01 is itself the normalized anniversary
        assert_eq!(
            next_anniversary(date(2000, 2, 29), date(2025, 3, 1)),
            Some(date(2025, 3, 1))
        );
    }

    #[test]
    fn test_ties_ordered_by_id() {
        let mut a = contact("A", date(1980, 7, 4));
        let mut b = contact("B", date(1991, 7, 4));
        a.id = Uuid::from_u128(2);
        b.id = Uuid::from_u128(1);
        let result = upcoming_birthdays(date(2025, 7, 1), 7, vec![a, b]).unwrap();
        assert_eq!(result[0].contact.id, Uuid::from_u128(1));
        assert_eq!(result[1].contact.id, Uuid::from_u128(2));
    }

    #[test]
    fn test_upcoming_birthday_serializes_flat() {
        let window = BirthdayWindow::new(date(2025, 6, 1), 7).unwrap();
        let result = window.select(vec![contact("Jun", date(1990, 6, 3))]);
        let value = serde_json::to_value(&result[0]).unwrap();
        assert_eq!(value["first_name"], "Jun");
        assert_eq!(value["birthday"], "1990-06-03");
        assert_eq!(value["next_birthday"], "2025-06-03");
        assert_eq!(value["days_until"], 2);
        assert!(value.get("contact").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(upcoming_birthdays(date(2025, 1, 1), 7, vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_negative_window_rejected() {
        let err = upcoming_birthdays(date(2025, 1, 1), -1, vec![]).unwrap_err();
        assert_eq!(err, BirthdayWindowError::NegativeWindow(-1));
    }

    #[test]
    fn test_huge_window_rejected_not_panicking() {
        let err = upcoming_birthdays(date(2025, 1, 1), i64::MAX, vec![]).unwrap_err();
        assert!(matches!(err, BirthdayWindowError::OutOfRange(..)));
    }

    #[test]
    fn test_full_year_window_includes_everyone_once() {
        let contacts = vec![
            contact("Yesterday", date(1990, 4, 9)),
            contact("Leap", date(1996, 2, 29)),
            contact("Today", date(1990, 4, 10)),
        ];
        let result = upcoming_birthdays(date(2025, 4, 10), 366, contacts).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].contact.first_name, "Today");
        assert_eq!(result[1].next_birthday, date(2026, 3, 1));
        assert_eq!(result[2].next_birthday, date(2026, 4, 9));
    }

    #[test]
    fn test_brute_force_agreement_for_non_leap_birthdays() {
        let today = date(2025, 11, 20);
        let n = 60;
        let window_end = today + chrono::Duration::days(n);
        let contacts: Vec<ContactRow> = (0..365)
            .map(|offset| contact("P", date(2001, 1, 1) + chrono::Duration::days(offset)))
            .collect();

        let result = upcoming_birthdays(today, n, contacts.clone()).unwrap();

        let expected = contacts
            .iter()
            .filter(|c| {
                let this = date(today.year(), c.birthday.month(), c.birthday.day());
                let next = date(today.year() + 1, c.birthday.month(), c.birthday.day());
                let candidate = if this >= today { this } else { next };
                candidate <= window_end
            })
            .count();
        assert_eq!(result.len(), expected);
        assert!(result
            .windows(2)
            .all(|w| w[0].next_birthday <= w[1].next_birthday));
    }
}
