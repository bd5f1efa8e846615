//! Chinese calendar lookups for a Gregorian date: lunar date, zodiac animal,
//! lunar festivals, solar-term days and the published legal holidays.

use chrono::{Datelike, NaiveDate};
use tyme4rs::tyme::{
    Culture,
    holiday::LegalHoliday,
    lunar::LunarDay,
    solar::SolarDay,
};

const YEAR_DIGITS: [&str; 10] = ["〇", "一", "二", "三", "四", "五", "六", "七", "八", "九"];
const MONTH_NAMES: [&str; 12] = ["正", "二", "三", "四", "五", "六", "七", "八", "九", "十", "冬", "腊"];

/// Legal holiday status for a date covered by the holiday tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Holiday {
    Off(String),
    /// Make-up working day around a holiday.
    ShiftedWorkday(String),
}

#[derive(Debug, Clone)]
pub struct CalendarDay {
    /// `二〇二五年八月十五`
    pub lunar_date: String,
    pub animal: String,
    pub lunar_day: usize,
    pub lunar_festival: Option<String>,
    /// Set only on the first day of a term.
    pub solar_term: Option<String>,
    /// `None` both for ordinary days and for years the tables do not cover;
    /// see [`CalendarDay::holidays_known`].
    pub holiday: Option<Holiday>,
    pub holidays_known: bool,
}

impl CalendarDay {
    pub fn of(date: NaiveDate) -> Option<Self> {
        let year = date.year() as isize;
        let (month, day) = (date.month() as usize, date.day() as usize);
        let solar = SolarDay::new(year, month, day).ok()?;
        let lunar = solar.get_lunar_day();

        let term_day = solar.get_term_day();
        let solar_term = (term_day.get_day_index() == 0).then(|| term_day.get_solar_term().get_name());

        let holiday = LegalHoliday::from_ymd(year, month, day).map(|h| {
            if h.is_work() {
                Holiday::ShiftedWorkday(h.get_name())
            } else {
                Holiday::Off(h.get_name())
            }
        });
        // Every covered year lists New Year's Day.
        let holidays_known = LegalHoliday::from_ymd(year, 1, 1).is_some();

        Some(Self {
            lunar_date: lunar_date(&lunar),
            animal: lunar
                .get_lunar_month()
                .get_lunar_year()
                .get_sixty_cycle()
                .get_earth_branch()
                .get_zodiac()
                .get_name(),
            lunar_day: lunar.get_day(),
            lunar_festival: lunar.get_festival().map(|f| f.get_name()),
            solar_term,
            holiday,
            holidays_known,
        })
    }

    /// Lunar 十五 or 十六.
    pub fn is_full_moon(&self) -> bool {
        matches!(self.lunar_day, 15 | 16)
    }
}

fn lunar_date(lunar: &LunarDay) -> String {
    let year: String = lunar
        .get_year()
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10).map(|d| YEAR_DIGITS[d as usize]))
        .collect();
    let month = lunar.get_lunar_month();
    let leap = if month.is_leap() { "闰" } else { "" };
    let month_name = MONTH_NAMES[(month.get_month() - 1).min(11)];
    format!("{year}年{leap}{month_name}月{}", lunar.get_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::of(NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
    }

    #[test]
    fn mid_autumn_2025() {
        let mid_autumn = day(2025, 10, 6);
        assert_eq!(mid_autumn.lunar_date, "二〇二五年八月十五");
        assert_eq!(mid_autumn.animal, "蛇");
        assert_eq!(mid_autumn.lunar_festival.as_deref(), Some("中秋节"));
        assert!(mid_autumn.is_full_moon());
        assert!(matches!(mid_autumn.holiday, Some(Holiday::Off(_))));
    }

    #[test]
    fn spring_festival_and_year_boundary() {
        let eve = day(2025, 1, 28);
        assert_eq!(eve.lunar_date, "二〇二四年腊月廿九");
        assert_eq!(eve.animal, "龙");
        assert_eq!(eve.lunar_festival.as_deref(), Some("除夕"));

        let new_year = day(2025, 1, 29);
        assert_eq!(new_year.lunar_date, "二〇二五年正月初一");
        assert_eq!(new_year.lunar_festival.as_deref(), Some("春节"));
        assert_eq!(new_year.holiday, Some(Holiday::Off("春节".to_string())));
    }

    #[test]
    fn solar_term_only_on_its_first_day() {
        assert_eq!(day(2025, 6, 21).solar_term.as_deref(), Some("夏至"));
        assert_eq!(day(2025, 6, 22).solar_term, None);
    }

    #[test]
    fn shifted_workdays_are_marked() {
        // Sunday 2025-09-28 is worked to extend the National Day break.
        assert!(matches!(day(2025, 9, 28).holiday, Some(Holiday::ShiftedWorkday(_))));
        let ordinary = day(2025, 3, 11);
        assert_eq!(ordinary.holiday, None);
        assert!(ordinary.holidays_known);
    }
}
