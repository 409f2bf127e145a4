//! Interactive query prompt.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the prompt provides the "run `stormcast` and describe an event" UX
//!
//! Place names are resolved to coordinates with the Nominatim geocoder.

use std::io::{self, Write};

use chrono::Month;

use crate::domain::{EventQuery, days_in_month};
use crate::error::AppError;
use crate::geocode::GeocodeClient;

/// Prompt for one event query (month, day, hour, place).
///
/// Behavior:
/// - month accepts a number or a name (`4`, `April`, `apr`)
/// - invalid input re-prompts
/// - `q` (or end of input) at any prompt returns `Ok(None)`
pub fn prompt_for_query(geocoder: &GeocodeClient) -> Result<Option<EventQuery>, AppError> {
    let Some(month) = prompt_value("Month (1-12 or name, q to quit): ", parse_month)? else {
        return Ok(None);
    };

    let max_day = days_in_month(month).unwrap_or(31);
    let day_label = format!("Day (1-{max_day}): ");
    let Some(day) = prompt_value(&day_label, |raw| parse_day(raw, month))? else {
        return Ok(None);
    };

    let Some(hour) = prompt_value("Hour (0-23): ", parse_hour)? else {
        return Ok(None);
    };

    let Some((lat, lon)) = prompt_for_place(geocoder)? else {
        return Ok(None);
    };

    let query = EventQuery {
        month,
        day,
        hour,
        lat,
        lon,
    };
    query.validate().map_err(|msg| AppError::new(2, msg))?;
    Ok(Some(query))
}

/// Parse a month given as a number (1-12) or a name chrono recognizes.
pub fn parse_month(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        if (1..=12).contains(&n) {
            return Ok(n);
        }
        return Err(format!("Month out of range: {n}. Enter 1-12 or a name."));
    }
    raw.parse::<Month>()
        .map(|month| month.number_from_month())
        .map_err(|_| format!("Unrecognized month: {raw}. Enter 1-12 or a name like April."))
}

fn parse_day(raw: &str, month: u32) -> Result<u32, String> {
    let max_day = days_in_month(month).unwrap_or(31);
    let day = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Enter a day number (1-{max_day})."))?;
    if (1..=max_day).contains(&day) {
        Ok(day)
    } else {
        Err(format!("Day out of range: {day}. Enter 1-{max_day}."))
    }
}

fn parse_hour(raw: &str) -> Result<u32, String> {
    let hour = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| "Enter an hour (0-23).".to_string())?;
    if hour <= 23 {
        Ok(hour)
    } else {
        Err(format!("Hour out of range: {hour}. Enter 0-23."))
    }
}

/// Keep asking for parseable input; `None` means the user quit.
fn prompt_value<T>(
    label: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, AppError> {
    loop {
        let Some(input) = read_input(label)? else {
            return Ok(None);
        };
        match parse(&input) {
            Ok(value) => return Ok(Some(value)),
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        }
    }
}

/// Resolve a place name to coordinates, re-prompting on misses.
fn prompt_for_place(geocoder: &GeocodeClient) -> Result<Option<(f64, f64)>, AppError> {
    loop {
        let Some(place) = read_input("Place (city or town, q to quit): ")? else {
            return Ok(None);
        };
        match geocoder.lookup(&place)? {
            Some(hit) => {
                println!("Using {} ({:.4}, {:.4})", hit.name, hit.lat, hit.lon);
                return Ok(Some((hit.lat, hit.lon)));
            }
            None => {
                println!("No match for \"{place}\". Try a more specific place name.");
                continue;
            }
        }
    }
}

fn read_input(label: &str) -> Result<Option<String>, AppError> {
    print!("{label}");
    io::stdout()
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

    let mut input = String::new();
    let bytes = io::stdin()
        .read_line(&mut input)
        .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

    // End of input behaves like quitting.
    if bytes == 0 {
        return Ok(None);
    }

    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Ok(None);
    }

    Ok(Some(input.to_string()))
}
