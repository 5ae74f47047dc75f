//! Date built-in.
//!
//! A date wraps a single time value. Local time is UTC, so every `getX` method
//! and its `getUTCX` twin return the same field. "Now" comes from
//! [`EvalContext::current_time_ms`] and moves with the timer clock.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::get_value_property;
use crate::runner::ds::operations::time::{
    make_time, month_name, parse_date, time_clip, to_date_string, to_day_string, to_iso_string, to_time_string,
    to_utc_string, weekday_name, DateFields,
};
use crate::runner::ds::operations::type_conversion::{to_number, to_primitive, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeFn};

use super::arg;

/// Register the Date built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let mut date = BuiltInObject::new("Date")
        .with_constructor(date_constructor)
        .add_static_method("now", date_now)
        .add_static_method("parse", date_parse)
        .add_static_method("UTC", date_utc)
        .add_method("getTime", date_value_of)
        .add_method("valueOf", date_value_of)
        .add_method("getDay", date_get_day)
        .add_method("getUTCDay", date_get_day)
        .add_method("getTimezoneOffset", date_get_timezone_offset)
        .add_method("setTime", date_set_time)
        .add_method("toString", date_to_string)
        .add_method("toDateString", date_to_date_string)
        .add_method("toTimeString", date_to_time_string)
        .add_method("toUTCString", date_to_utc_string)
        .add_method("toGMTString", date_to_utc_string)
        .add_method("toISOString", date_to_iso_string)
        .add_method("toJSON", date_to_json)
        .add_method("toLocaleDateString", date_to_locale_date_string)
        .add_method("toLocaleTimeString", date_to_locale_time_string)
        .add_method("toLocaleString", date_to_locale_string);

    for (local, utc, getter) in FIELD_GETTERS {
        date = date.add_method(local, getter).add_method(utc, getter);
    }
    for (local, utc, setter) in FIELD_SETTERS {
        date = date.add_method(local, setter).add_method(utc, setter);
    }

    registry.register_object(date);
}

const FIELD_GETTERS: [(&str, &str, NativeFn); 7] = [
    ("getFullYear", "getUTCFullYear", date_get_full_year),
    ("getMonth", "getUTCMonth", date_get_month),
    ("getDate", "getUTCDate", date_get_date),
    ("getHours", "getUTCHours", date_get_hours),
    ("getMinutes", "getUTCMinutes", date_get_minutes),
    ("getSeconds", "getUTCSeconds", date_get_seconds),
    ("getMilliseconds", "getUTCMilliseconds", date_get_milliseconds),
];

const FIELD_SETTERS: [(&str, &str, NativeFn); 7] = [
    ("setFullYear", "setUTCFullYear", date_set_full_year),
    ("setMonth", "setUTCMonth", date_set_month),
    ("setDate", "setUTCDate", date_set_date),
    ("setHours", "setUTCHours", date_set_hours),
    ("setMinutes", "setUTCMinutes", date_set_minutes),
    ("setSeconds", "setUTCSeconds", date_set_seconds),
    ("setMilliseconds", "setUTCMilliseconds", date_set_milliseconds),
];

fn this_date(this: &JsValue) -> Result<(JsObjectType, f64), JErrorType> {
    if let JsValue::Object(o) = this {
        if let Some(t) = o.borrow().as_date() {
            return Ok((o.clone(), t));
        }
    }
    Err(JErrorType::TypeError("this is not a Date object.".to_string()))
}

fn this_time(this: &JsValue) -> Result<f64, JErrorType> {
    this_date(this).map(|(_, t)| t)
}

fn store_time(date: &JsObjectType, t: f64) -> JsValue {
    date.borrow_mut().kind = ObjectKind::Date(t);
    JsValue::from_f64(t)
}

/// Years 0 to 99 given as separate fields mean 1900 to 1999.
fn full_year(year: f64) -> f64 {
    let y = year.trunc();
    if (0.0..=99.0).contains(&y) {
        1900.0 + y
    } else {
        year
    }
}

/// Time value from `(year, month[, day, hours, minutes, seconds, ms])` arguments.
fn time_from_fields(args: &[JsValue]) -> f64 {
    let mut fields = [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
    for (slot, a) in fields.iter_mut().zip(args.iter()) {
        *slot = to_number(a);
    }
    fields[0] = full_year(fields[0]);
    make_time(fields)
}

/// Date constructor. Without `new` it ignores its arguments and returns the current time as a string.
fn date_constructor(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let now = ctx.current_time_ms();
    let instance = match &this {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(JsValue::String(to_date_string(time_clip(now)))),
    };
    let t = match args.len() {
        0 => now,
        1 => {
            let copied = match &args[0] {
                JsValue::Object(o) => o.borrow().as_date(),
                _ => None,
            };
            match copied {
                Some(t) => t,
                None => match to_primitive(&args[0]) {
                    JsValue::String(s) => parse_date(&s),
                    p => to_number(&p),
                },
            }
        }
        _ => time_from_fields(&args),
    };
    store_time(&instance, time_clip(t));
    Ok(this)
}

/// Date.now
fn date_now(ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(ctx.current_time_ms().trunc()))
}

/// Date.parse
fn date_parse(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(parse_date(&to_string(&arg(&args, 0)))))
}

/// Date.UTC
fn date_utc(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(time_from_fields(&args)))
}

/// Date.prototype.valueOf and getTime
fn date_value_of(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(this_time(&this)?))
}

fn field_of(this: &JsValue, read: impl Fn(&DateFields) -> u32) -> Result<JsValue, JErrorType> {
    Ok(match DateFields::of(this_time(this)?) {
        Some(f) => JsValue::from_i64(read(&f) as i64),
        None => JsValue::from_f64(f64::NAN),
    })
}

macro_rules! field_getters {
    ($($fn_name:ident => |$f:ident| $read:expr),* $(,)?) => {
        $(
            fn $fn_name(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
                field_of(&this, |$f| $read)
            }
        )*
    };
}

field_getters! {
    date_get_month => |f| f.month,
    date_get_date => |f| f.day,
    date_get_day => |f| f.weekday,
    date_get_hours => |f| f.hours,
    date_get_minutes => |f| f.minutes,
    date_get_seconds => |f| f.seconds,
    date_get_milliseconds => |f| f.millis,
}

/// Date.prototype.getFullYear. Years can be negative, so this one is not a `u32` field.
fn date_get_full_year(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(match DateFields::of(this_time(&this)?) {
        Some(f) => JsValue::from_i64(f.year),
        None => JsValue::from_f64(f64::NAN),
    })
}

/// Date.prototype.getTimezoneOffset
fn date_get_timezone_offset(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let t = this_time(&this)?;
    Ok(JsValue::from_f64(if t.is_nan() { f64::NAN } else { 0.0 }))
}

/// Date.prototype.setTime
fn date_set_time(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let (date, _) = this_date(&this)?;
    Ok(store_time(&date, time_clip(to_number(&arg(&args, 0)))))
}

/// Overwrites up to `count` fields starting at `first` (0 is the year, 6 the
/// milliseconds) and stores the recomputed time.
fn set_fields(this: &JsValue, args: &[JsValue], first: usize, count: usize) -> Result<JsValue, JErrorType> {
    let (date, t) = this_date(this)?;
    // Only setFullYear can revive an invalid date.
    let base = if t.is_nan() && first == 0 { 0.0 } else { t };
    let mut fields = match DateFields::of(base) {
        Some(f) => f.to_array(),
        None => return Ok(JsValue::from_f64(f64::NAN)),
    };
    if args.is_empty() {
        fields[first] = f64::NAN;
    }
    for (i, a) in args.iter().take(count).enumerate() {
        fields[first + i] = to_number(a);
    }
    Ok(store_time(&date, make_time(fields)))
}

macro_rules! field_setters {
    ($($fn_name:ident => ($first:expr, $count:expr)),* $(,)?) => {
        $(
            fn $fn_name(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
                set_fields(&this, &args, $first, $count)
            }
        )*
    };
}

field_setters! {
    date_set_full_year => (0, 3),
    date_set_month => (1, 2),
    date_set_date => (2, 1),
    date_set_hours => (3, 4),
    date_set_minutes => (4, 3),
    date_set_seconds => (5, 2),
    date_set_milliseconds => (6, 1),
}

/// Date.prototype.toString
fn date_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(to_date_string(this_time(&this)?)))
}

/// Date.prototype.toDateString
fn date_to_date_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(to_day_string(this_time(&this)?)))
}

/// Date.prototype.toTimeString
fn date_to_time_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(to_time_string(this_time(&this)?)))
}

/// Date.prototype.toUTCString
fn date_to_utc_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(to_utc_string(this_time(&this)?)))
}

/// Date.prototype.toISOString
fn date_to_iso_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    to_iso_string(this_time(&this)?)
        .map(JsValue::String)
        .ok_or_else(|| JErrorType::RangeError("Invalid time value".to_string()))
}

/// Date.prototype.toJSON. An invalid date serializes as `null`.
fn date_to_json(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(to_iso_string(this_time(&this)?).map_or(JsValue::Null, JsValue::String))
}

/// The `Intl.DateTimeFormat` options the locale methods honour.
#[derive(Debug, Default, PartialEq)]
struct DisplayOptions {
    weekday: Option<String>,
    year: Option<String>,
    month: Option<String>,
    day: Option<String>,
}

impl DisplayOptions {
    fn read(ctx: &mut EvalContext, options: &JsValue) -> Result<Self, JErrorType> {
        let mut read_one = |key: &str| -> Result<Option<String>, JErrorType> {
            if !matches!(options, JsValue::Object(_)) {
                return Ok(None);
            }
            Ok(match get_value_property(ctx, options, key)? {
                JsValue::Undefined => None,
                v => Some(to_string(&v)),
            })
        };
        let mut read = DisplayOptions {
            weekday: read_one("weekday")?,
            year: read_one("year")?,
            month: read_one("month")?,
            day: read_one("day")?,
        };
        if read == DisplayOptions::default() {
            read.year = Some("numeric".to_string());
            read.month = Some("numeric".to_string());
            read.day = Some("numeric".to_string());
        }
        Ok(read)
    }
}

fn numeric_field(value: i64, style: &str) -> String {
    if style == "2-digit" {
        format!("{:02}", value.rem_euclid(100))
    } else {
        value.to_string()
    }
}

/// en-US date formatting: "1/20/2024", or "Saturday, January 20, 2024" once the
/// month is spelled out. Other locales format the same way.
fn format_locale_date(f: &DateFields, options: &DisplayOptions) -> String {
    let weekday = options
        .weekday
        .as_deref()
        .map(|style| weekday_name(f.weekday, style == "long").to_string());
    let year = options.year.as_deref().map(|style| numeric_field(f.year, style));
    let day = options.day.as_deref().map(|style| numeric_field(f.day as i64, style));
    let date = match options.month.as_deref() {
        Some(style @ ("long" | "short" | "narrow")) => {
            let month = match style {
                "long" => month_name(f.month, true).to_string(),
                "short" => month_name(f.month, false).to_string(),
                _ => month_name(f.month, true)[..1].to_string(),
            };
            let month_day = match day {
                Some(d) => format!("{} {}", month, d),
                None => month,
            };
            match year {
                Some(y) if options.day.is_some() => format!("{}, {}", month_day, y),
                Some(y) => format!("{} {}", month_day, y),
                None => month_day,
            }
        }
        Some(style) => {
            let month = numeric_field(f.month as i64 + 1, style);
            [Some(month), day, year].into_iter().flatten().collect::<Vec<_>>().join("/")
        }
        None => [day, year].into_iter().flatten().collect::<Vec<_>>().join("/"),
    };
    match weekday {
        Some(w) if date.is_empty() => w,
        Some(w) => format!("{}, {}", w, date),
        None => date,
    }
}

/// "12:05:09 PM"
fn format_locale_time(f: &DateFields) -> String {
    let hour = match f.hours % 12 {
        0 => 12,
        h => h,
    };
    let meridiem = if f.hours < 12 { "AM" } else { "PM" };
    format!("{}:{:02}:{:02} {}", hour, f.minutes, f.seconds, meridiem)
}

/// Date.prototype.toLocaleDateString(locale, options)
fn date_to_locale_date_string(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let t = this_time(&this)?;
    let options = DisplayOptions::read(ctx, &arg(&args, 1))?;
    Ok(JsValue::String(match DateFields::of(t) {
        Some(f) => format_locale_date(&f, &options),
        None => "Invalid Date".to_string(),
    }))
}

/// Date.prototype.toLocaleTimeString
fn date_to_locale_time_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(match DateFields::of(this_time(&this)?) {
        Some(f) => format_locale_time(&f),
        None => "Invalid Date".to_string(),
    }))
}

/// Date.prototype.toLocaleString
fn date_to_locale_string(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let t = this_time(&this)?;
    let options = DisplayOptions::read(ctx, &arg(&args, 1))?;
    Ok(JsValue::String(match DateFields::of(t) {
        Some(f) => format!("{}, {}", format_locale_date(&f, &options), format_locale_time(&f)),
        None => "Invalid Date".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(iso: &str) -> DateFields {
        DateFields::of(parse_date(iso)).unwrap()
    }

    fn options(weekday: Option<&str>, year: Option<&str>, month: Option<&str>, day: Option<&str>) -> DisplayOptions {
        DisplayOptions {
            weekday: weekday.map(String::from),
            year: year.map(String::from),
            month: month.map(String::from),
            day: day.map(String::from),
        }
    }

    #[test]
    fn test_locale_date_styles() {
        let f = fields("2024-01-20");
        let numeric = options(None, Some("numeric"), Some("numeric"), Some("numeric"));
        assert_eq!(format_locale_date(&f, &numeric), "1/20/2024");
        let long = options(None, Some("numeric"), Some("long"), Some("numeric"));
        assert_eq!(format_locale_date(&f, &long), "January 20, 2024");
        let with_weekday = options(Some("long"), Some("numeric"), Some("short"), Some("numeric"));
        assert_eq!(format_locale_date(&f, &with_weekday), "Saturday, Jan 20, 2024");
        let month_year = options(None, Some("numeric"), Some("long"), None);
        assert_eq!(format_locale_date(&f, &month_year), "January 2024");
        let padded = options(None, Some("2-digit"), Some("2-digit"), Some("2-digit"));
        assert_eq!(format_locale_date(&f, &padded), "01/20/24");
    }

    #[test]
    fn test_locale_time_is_twelve_hour() {
        assert_eq!(format_locale_time(&fields("2024-01-20T00:05:09Z")), "12:05:09 AM");
        assert_eq!(format_locale_time(&fields("2024-01-20T13:00:00Z")), "1:00:00 PM");
    }

    #[test]
    fn test_two_digit_years_are_twentieth_century() {
        assert_eq!(full_year(99.0), 1999.0);
        assert_eq!(full_year(2024.0), 2024.0);
    }
}
