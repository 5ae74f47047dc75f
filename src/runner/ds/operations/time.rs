//! Time values: milliseconds since 1970-01-01T00:00:00Z, read and written as
//! calendar fields of the proleptic Gregorian calendar.
//!
//! Snippets run with UTC as their local time zone, so the local and UTC views
//! of a time value are the same.

pub const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
/// 100 million days either side of the epoch.
const MAX_TIME: f64 = 8.64e15;

const WEEKDAYS: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September", "October",
    "November", "December",
];

pub fn weekday_name(weekday: u32, long: bool) -> &'static str {
    let name = WEEKDAYS[weekday as usize % 7];
    if long {
        name
    } else {
        &name[..3]
    }
}

pub fn month_name(month: u32, long: bool) -> &'static str {
    let name = MONTHS[month as usize % 12];
    if long {
        name
    } else {
        &name[..3]
    }
}

/// `TimeClip`: NaN outside the representable range, otherwise truncated to whole milliseconds.
pub fn time_clip(t: f64) -> f64 {
    if !t.is_finite() || t.abs() > MAX_TIME {
        f64::NAN
    } else {
        t.trunc() + 0.0
    }
}

/// Days from the epoch to `year`-`month`-`day`, `month` counted from 1.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Calendar fields of a time value. `month` counts from 0 and `weekday` 0 is Sunday.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateFields {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub weekday: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub millis: u32,
}

impl DateFields {
    /// `None` for the NaN time value of an invalid date.
    pub fn of(t: f64) -> Option<Self> {
        if !t.is_finite() {
            return None;
        }
        let t = t as i64;
        let days = t.div_euclid(86_400_000);
        let in_day = t.rem_euclid(86_400_000);
        let (year, month, day) = civil_from_days(days);
        Some(DateFields {
            year,
            month: month - 1,
            day,
            weekday: (days + 4).rem_euclid(7) as u32,
            hours: (in_day / 3_600_000) as u32,
            minutes: (in_day / 60_000 % 60) as u32,
            seconds: (in_day / 1000 % 60) as u32,
            millis: (in_day % 1000) as u32,
        })
    }

    /// Year, month, day, hours, minutes, seconds and milliseconds, in the order
    /// [`make_time`] takes them.
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.year as f64,
            self.month as f64,
            self.day as f64,
            self.hours as f64,
            self.minutes as f64,
            self.seconds as f64,
            self.millis as f64,
        ]
    }
}

/// `MakeDate(MakeDay(..), MakeTime(..))`. Out-of-range fields carry into the next
/// larger one, so month 12 is January of the following year.
pub fn make_time(fields: [f64; 7]) -> f64 {
    if fields.iter().any(|f| !f.is_finite()) {
        return f64::NAN;
    }
    let [year, month, day, hours, minutes, seconds, millis] = fields.map(f64::trunc);
    let y = year + (month / 12.0).floor();
    if y.abs() > 400_000.0 {
        return f64::NAN;
    }
    let m = month.rem_euclid(12.0);
    let days = days_from_civil(y as i64, m as i64 + 1, 1) as f64 + day - 1.0;
    let in_day = hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * 1000.0 + millis;
    time_clip(days * MS_PER_DAY + in_day)
}

fn year_text(year: i64) -> String {
    if year >= 0 {
        format!("{:04}", year)
    } else {
        format!("-{:06}", -year)
    }
}

/// `Date.prototype.toString`: "Sat Jan 20 2024 00:00:00 GMT+0000 (Coordinated Universal Time)".
pub fn to_date_string(t: f64) -> String {
    match DateFields::of(t) {
        Some(f) => format!("{} {}", date_part(&f), time_part(&f)),
        None => "Invalid Date".to_string(),
    }
}

/// `Date.prototype.toDateString`: "Sat Jan 20 2024".
pub fn to_day_string(t: f64) -> String {
    match DateFields::of(t) {
        Some(f) => date_part(&f),
        None => "Invalid Date".to_string(),
    }
}

/// `Date.prototype.toTimeString`.
pub fn to_time_string(t: f64) -> String {
    match DateFields::of(t) {
        Some(f) => time_part(&f),
        None => "Invalid Date".to_string(),
    }
}

fn date_part(f: &DateFields) -> String {
    format!(
        "{} {} {:02} {}",
        weekday_name(f.weekday, false),
        month_name(f.month, false),
        f.day,
        year_text(f.year)
    )
}

fn time_part(f: &DateFields) -> String {
    format!(
        "{:02}:{:02}:{:02} GMT+0000 (Coordinated Universal Time)",
        f.hours, f.minutes, f.seconds
    )
}

/// `Date.prototype.toUTCString`: "Sat, 20 Jan 2024 00:00:00 GMT".
pub fn to_utc_string(t: f64) -> String {
    match DateFields::of(t) {
        Some(f) => format!(
            "{}, {:02} {} {} {:02}:{:02}:{:02} GMT",
            weekday_name(f.weekday, false),
            f.day,
            month_name(f.month, false),
            year_text(f.year),
            f.hours,
            f.minutes,
            f.seconds
        ),
        None => "Invalid Date".to_string(),
    }
}

/// `Date.prototype.toISOString`, `None` for an invalid date.
pub fn to_iso_string(t: f64) -> Option<String> {
    let f = DateFields::of(t)?;
    let year = if (0..=9999).contains(&f.year) {
        format!("{:04}", f.year)
    } else if f.year < 0 {
        format!("-{:06}", -f.year)
    } else {
        format!("+{:06}", f.year)
    };
    Some(format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        f.month + 1,
        f.day,
        f.hours,
        f.minutes,
        f.seconds,
        f.millis
    ))
}

/// `Date.parse`: the ISO format first, then the informal forms people type
/// ("January 15, 2024", "Jan 15 2024 10:30", "1/15/2024"). NaN when neither fits.
pub fn parse_date(text: &str) -> f64 {
    let text = text.trim();
    parse_iso(text)
        .or_else(|| parse_informal(text))
        .map_or(f64::NAN, time_clip)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Exactly `n` ASCII digits.
    fn digits(&mut self, n: usize) -> Option<f64> {
        let end = self.pos + n;
        let slice = self.bytes.get(self.pos..end)?;
        if !slice.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos = end;
        Some(slice.iter().fold(0.0, |acc, d| acc * 10.0 + (d - b'0') as f64))
    }

    fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// `YYYY[-MM[-DD]][THH:mm[:ss[.sss]]][Z|±HH:mm]`, with `±YYYYYY` extended years.
fn parse_iso(text: &str) -> Option<f64> {
    let mut c = Cursor {
        bytes: text.as_bytes(),
        pos: 0,
    };
    let year = match c.peek()? {
        b'+' => {
            c.pos += 1;
            c.digits(6)?
        }
        b'-' => {
            c.pos += 1;
            -c.digits(6)?
        }
        _ => c.digits(4)?,
    };
    let (mut month, mut day) = (1.0, 1.0);
    if c.eat(b'-') {
        month = c.digits(2)?;
        if c.eat(b'-') {
            day = c.digits(2)?;
        }
    }
    let (mut hours, mut minutes, mut seconds, mut millis) = (0.0, 0.0, 0.0, 0.0);
    let mut offset = 0.0;
    if c.eat(b'T') || c.eat(b't') || c.eat(b' ') {
        hours = c.digits(2)?;
        if !c.eat(b':') {
            return None;
        }
        minutes = c.digits(2)?;
        if c.eat(b':') {
            seconds = c.digits(2)?;
            if c.eat(b'.') {
                let start = c.pos;
                while c.peek().map_or(false, |b| b.is_ascii_digit()) {
                    c.pos += 1;
                }
                let fraction = text.get(start..c.pos.min(start + 3))?;
                if fraction.is_empty() {
                    return None;
                }
                millis = fraction.parse::<f64>().ok()? * 10f64.powi(3 - fraction.len() as i32);
            }
        }
        match c.peek() {
            Some(b'Z') | Some(b'z') => c.pos += 1,
            Some(sign @ (b'+' | b'-')) => {
                c.pos += 1;
                let h = c.digits(2)?;
                c.eat(b':');
                let m = c.digits(2)?;
                let magnitude = h * MS_PER_HOUR + m * MS_PER_MINUTE;
                offset = if sign == b'+' { magnitude } else { -magnitude };
            }
            _ => {}
        }
    }
    if !c.at_end() {
        return None;
    }
    let valid_day = day >= 1.0 && day <= days_in_month(year as i64, month as u32) as f64;
    let midnight_24 = hours == 24.0 && minutes == 0.0 && seconds == 0.0 && millis == 0.0;
    if !(1.0..=12.0).contains(&month)
        || !valid_day
        || (hours > 23.0 && !midnight_24)
        || minutes > 59.0
        || seconds > 59.0
    {
        return None;
    }
    let t = make_time([year, month - 1.0, day, hours, minutes, seconds, millis]);
    Some(t - offset)
}

/// Matches on the first three letters, so "Sept" and "september" both work.
fn name_prefix_matches(names: &[&str], word: &str) -> Option<usize> {
    let lower = word.to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    names.iter().position(|n| n.to_ascii_lowercase().starts_with(prefix))
}

fn month_from_word(word: &str) -> Option<u32> {
    name_prefix_matches(&MONTHS, word).map(|i| i as u32)
}

fn is_weekday_word(word: &str) -> bool {
    name_prefix_matches(&WEEKDAYS, word).is_some()
}

/// Whitespace and comma separated words: month names, day, year, `h:mm[:ss]`,
/// AM/PM, `m/d/y` or `y/m/d`. Weekday names and a trailing GMT/UTC/Z are skipped.
fn parse_informal(text: &str) -> Option<f64> {
    let (mut year, mut month, mut day) = (None, None, None);
    let (mut hours, mut minutes, mut seconds) = (0.0, 0.0, 0.0);
    let mut meridiem: Option<bool> = None;
    for word in text.split(|c: char| c.is_whitespace() || c == ',').filter(|w| !w.is_empty()) {
        if word.contains(':') {
            let parts: Vec<f64> = word
                .split(':')
                .map(|p| p.parse::<f64>().ok())
                .collect::<Option<Vec<_>>>()?;
            hours = *parts.first()?;
            minutes = parts.get(1).copied().unwrap_or(0.0);
            seconds = parts.get(2).copied().unwrap_or(0.0);
        } else if word.contains('/') {
            let parts: Vec<f64> = word
                .split('/')
                .map(|p| p.parse::<f64>().ok())
                .collect::<Option<Vec<_>>>()?;
            if parts.len() != 3 {
                return None;
            }
            if word.split('/').next().map_or(false, |p| p.len() == 4) {
                year = Some(parts[0]);
                month = Some((parts[1] as u32).checked_sub(1)?);
                day = Some(parts[2]);
            } else {
                month = Some((parts[0] as u32).checked_sub(1)?);
                day = Some(parts[1]);
                year = Some(parts[2]);
            }
        } else if let Ok(n) = word.parse::<f64>() {
            if day.is_none() && n <= 31.0 && month.is_some() {
                day = Some(n);
            } else {
                year = Some(n);
            }
        } else {
            match word.to_ascii_lowercase().as_str() {
                "am" => meridiem = Some(false),
                "pm" => meridiem = Some(true),
                "gmt" | "utc" | "z" => {}
                w if is_weekday_word(w) => {}
                w => month = Some(month_from_word(w)?),
            }
        }
    }
    match meridiem {
        Some(true) if hours < 12.0 => hours += 12.0,
        Some(false) if hours == 12.0 => hours = 0.0,
        _ => {}
    }
    let month = month?;
    if month > 11 || minutes > 59.0 || seconds > 59.0 || hours > 23.0 {
        return None;
    }
    Some(make_time([
        year?,
        month as f64,
        day?,
        hours,
        minutes,
        seconds,
        0.0,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_civil_days_round_trip_known_dates() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(days_from_civil(2024, 1, 20), 19_742);
        assert_eq!(civil_from_days(19_742), (2024, 1, 20));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        assert_eq!(civil_from_days(days_from_civil(2000, 2, 29)), (2000, 2, 29));
    }

    #[test]
    fn test_fields_of_time_value() {
        let f = DateFields::of(1_705_708_800_000.0).unwrap();
        assert_eq!((f.year, f.month, f.day, f.weekday), (2024, 0, 20, 6));
        assert!(DateFields::of(f64::NAN).is_none());
    }

    #[test]
    fn test_make_time_carries_overflowing_fields() {
        let t = make_time([2023.0, 12.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(to_iso_string(t).as_deref(), Some("2024-01-01T00:00:00.000Z"));
        let t = make_time([2024.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(to_iso_string(t).as_deref(), Some("2023-12-31T00:00:00.000Z"));
    }

    #[test]
    fn test_parse_iso_forms() {
        assert_eq!(parse_date("2024-01-20"), 1_705_708_800_000.0);
        assert_eq!(parse_date("2024-01-20T10:30:00Z"), 1_705_746_600_000.0);
        assert_eq!(parse_date("2024-01-20T12:30:00+02:00"), 1_705_746_600_000.0);
        assert_eq!(parse_date("2024-01-20T10:30:00.5Z"), 1_705_746_600_500.0);
        assert_eq!(parse_date("2024"), 1_704_067_200_000.0);
        assert!(parse_date("2024-02-30").is_nan());
        assert!(parse_date("2024-13-01").is_nan());
    }

    #[test]
    fn test_parse_informal_forms() {
        let expected = 1_705_708_800_000.0;
        assert_eq!(parse_date("January 20, 2024"), expected);
        assert_eq!(parse_date("Sat Jan 20 2024"), expected);
        assert_eq!(parse_date("1/20/2024"), expected);
        assert_eq!(parse_date("Jan 20 2024 10:30 AM"), 1_705_746_600_000.0);
        assert!(parse_date("not a date").is_nan());
    }

    #[test]
    fn test_string_forms() {
        let t = 1_705_708_800_000.0;
        assert_eq!(to_date_string(t), "Sat Jan 20 2024 00:00:00 GMT+0000 (Coordinated Universal Time)");
        assert_eq!(to_day_string(t), "Sat Jan 20 2024");
        assert_eq!(to_utc_string(t), "Sat, 20 Jan 2024 00:00:00 GMT");
        assert_eq!(to_date_string(f64::NAN), "Invalid Date");
        assert!(to_iso_string(f64::NAN).is_none());
    }
}
