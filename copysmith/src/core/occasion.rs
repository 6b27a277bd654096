use chrono::{Datelike, NaiveDate};

/// Occasion value that asks for the holiday to be picked from today's date.
pub const AUTO: &str = "auto";

/// Days before a holiday during which it is used as the occasion.
const LEAD_DAYS: i64 = 14;

const HOLIDAYS: &[(u32, u32, &str)] = &[
    (1, 1, "Новый год"),
    (2, 14, "14 Февраля"),
    (2, 23, "23 Февраля"),
    (3, 8, "8 Марта"),
];

/// The nearest holiday starting within the next two weeks, if any.
pub fn upcoming_holiday(today: NaiveDate) -> Option<&'static str> {
    let mut best: Option<(i64, &'static str)> = None;
    for year in [today.year(), today.year() + 1] {
        for (month, day, name) in HOLIDAYS {
            let Some(date) = NaiveDate::from_ymd_opt(year, *month, *day) else {
                continue;
            };
            let days = (date - today).num_days();
            if (0..=LEAD_DAYS).contains(&days) && best.map_or(true, |(d, _)| days < d) {
                best = Some((days, *name));
            }
        }
    }
    best.map(|(_, name)| name)
}

/// Turns the configured occasion into the text used in descriptions.
pub fn resolve(occasion: Option<&str>, today: NaiveDate) -> Option<String> {
    let occasion = occasion.map(str::trim).filter(|o| !o.is_empty())?;
    if occasion.eq_ignore_ascii_case(AUTO) {
        let holiday = upcoming_holiday(today);
        log::info!("Automatic occasion for {}: {:?}", today, holiday);
        holiday.map(str::to_string)
    } else {
        Some(occasion.to_string())
    }
}

pub fn resolve_today(occasion: Option<&str>) -> Option<String> {
    resolve(occasion, chrono::Local::now().date_naive())
}
