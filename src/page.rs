use anyhow::{anyhow, Error};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

const KNOWN_EXTENSIONS: &[&str] = &[
    "mp4", "m4a", "m4p", "m4b", "m4r", "m4v", "aac", "flv", "f4v", "f4a", "f4b", "webm", "ogg",
    "ogv", "oga", "ogx", "spx", "opus", "mkv", "mka", "mk3d", "avi", "divx", "mov", "asf", "wmv",
    "wma", "3gp", "3g2", "mp3", "flac", "ape", "wav", "f4f", "f4m", "m3u8", "smil",
];

const DATE_FORMATS: &[&str] = &[
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%Y %m %d",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%b %d %Y at %H:%M",
    "%B %d %Y at %H:%M",
    "%d %B %Y at %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y %H.%M",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Returns the first non-empty capture group of the first pattern that matches.
pub fn search_regex(
    html: &str,
    patterns: &[&str],
    name: &str,
    fatal: bool,
) -> Result<Option<String>, Error> {
    for pattern in patterns {
        let regex = Regex::new(pattern)?;
        if let Some(capture) = regex.captures(html) {
            let group = capture
                .iter()
                .skip(1)
                .flatten()
                .find(|m| !m.as_str().is_empty())
                .map(|m| m.as_str().to_string());
            if group.is_some() {
                return Ok(group);
            }
        }
    }
    if fatal {
        Err(anyhow!("Unable to extract {}", name))
    } else {
        Ok(None)
    }
}

fn og_regexes(prop: &str) -> Vec<String> {
    let content = r#"content=(?:"([^"]+?)"|'([^']+?)'|\s*([^\s"'=<>`]+?))"#;
    let property = format!(
        r#"(?:name|property)=(?:'og[:-]{0}'|"og[:-]{0}"|\s*og[:-]{0}\b)"#,
        regex::escape(prop)
    );
    vec![
        format!(r#"(?s)<meta[^>]+?{}[^>]+?{}"#, property, content),
        format!(r#"(?s)<meta[^>]+?{}[^>]+?{}"#, content, property),
    ]
}

/// Looks up an Open Graph `<meta>` property, in either attribute order.
pub fn og_search_property(prop: &str, html: &str) -> Result<Option<String>, Error> {
    let regexes = og_regexes(prop);
    let patterns: Vec<&str> = regexes.iter().map(|s| s.as_str()).collect();
    let name = format!("OpenGraph {}", prop);
    Ok(search_regex(html, &patterns, &name, false)?.map(|value| unescape_html(&value)))
}

pub fn og_search_title(html: &str) -> Result<String, Error> {
    og_search_property("title", html)?.ok_or(anyhow!("Unable to extract OpenGraph title"))
}

pub fn og_search_description(html: &str) -> Result<Option<String>, Error> {
    og_search_property("description", html)
}

pub fn og_search_thumbnail(html: &str) -> Result<Option<String>, Error> {
    og_search_property("image", html)
}

pub fn unescape_html(input: &str) -> String {
    let entity_regex = Regex::new(r"&([A-Za-z]+|#[0-9]+|#[xX][0-9A-Fa-f]+);").unwrap();
    entity_regex
        .replace_all(input, |capture: &regex::Captures| {
            let entity = &capture[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16)
                        .ok()
                        .and_then(std::char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(std::char::from_u32)
                }
                _ => None,
            };
            match decoded {
                Some(c) => c.to_string(),
                None => capture[0].to_string(),
            }
        })
        .into_owned()
}

/// Extension of the resource a URL points at, lower-cased.
pub fn determine_ext(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let (_, guess) = path.rsplit_once('.')?;
    let guess = guess.to_ascii_lowercase();
    if !guess.is_empty() && guess.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(guess);
    }
    let trimmed = guess.trim_end_matches('/');
    if KNOWN_EXTENSIONS.contains(&trimmed) {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Normalizes a free-form date into `YYYYMMDD`.
pub fn unified_strdate(date: &str) -> Option<String> {
    let date = date.replace(',', " ");
    let ordinal_regex = Regex::new(r"(\d)(?:st|nd|rd|th)\b").unwrap();
    let meridiem_regex = Regex::new(r"(?i)(\d)\s*(?:AM|PM)(?:\s+[A-Z]+)?\s*$").unwrap();
    let date = ordinal_regex.replace_all(&date, "$1");
    let date = meridiem_regex.replace(&date, "$1");
    let date = date.split_whitespace().collect::<Vec<&str>>().join(" ");
    if date.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&date, format) {
            return Some(parsed.format("%Y%m%d").to_string());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&date, format) {
            return Some(parsed.format("%Y%m%d").to_string());
        }
    }
    None
}

/// Seconds described by a `[[[D:]H:]M:]S` clock string or a `1h 2m 3s` style string.
///
/// Values too large for a `u64` count of seconds give `None`.
pub fn parse_duration(duration: &str) -> Option<u64> {
    let duration = duration.trim();
    if duration.is_empty() {
        return None;
    }

    let clock_regex =
        Regex::new(r"^(?:(?:(?:(\d+):)?(\d+):)?(\d+):)?(\d+)(?:\.\d+)?$").unwrap();
    let units_regex = Regex::new(
        r"(?ix)^
        (?:(\d+)\s*d(?:ays?)?\s*)?
        (?:(\d+)\s*h(?:ours?|rs?)?\s*)?
        (?:(\d+)\s*m(?:in(?:ute)?s?)?\s*)?
        (?:(\d+)(?:\.\d+)?\s*s(?:ec(?:ond)?s?)?\s*)?
        $",
    )
    .unwrap();

    let captures = clock_regex
        .captures(duration)
        .or_else(|| units_regex.captures(duration))?;
    let mut matched = false;
    let mut seconds = 0u64;
    for (index, scale) in [(1, 86400), (2, 3600), (3, 60), (4, 1)].iter() {
        if let Some(value) = captures.get(*index) {
            let part = value.as_str().parse::<u64>().ok()?.checked_mul(*scale)?;
            seconds = seconds.checked_add(part)?;
            matched = true;
        }
    }
    if matched {
        Some(seconds)
    } else {
        None
    }
}
