//! `datetime`: strftime 格式的本地时间

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::Local;

use crate::error::ProbeError;

use super::{required, Probe, Sample};

#[derive(Debug)]
pub struct Datetime;

impl Probe for Datetime {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let format = required(argument)?;
        format_now(format)
    }
}

/// chrono 遇到非法格式时 `to_string` 会 panic, 这里先校验再写入
fn format_now(format: &str) -> Sample {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ProbeError::Format(format!("invalid time format `{}`", format)));
    }

    let mut out = String::new();
    write!(out, "{}", Local::now().format_with_items(items.into_iter()))
        .map_err(|_| ProbeError::Format(format!("cannot format time with `{}`", format)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_current_year() {
        let year = Datetime.sample(Some("%Y")).unwrap();
        assert_eq!(year.len(), 4);
        assert!(year.parse::<u32>().is_ok());
    }

    #[test]
    fn literal_text_passes_through() {
        assert_eq!(Datetime.sample(Some("at %%")).unwrap(), "at %");
    }

    #[test]
    fn invalid_format_is_a_failure() {
        assert!(matches!(Datetime.sample(Some("%Q")), Err(ProbeError::Format(_))));
        assert!(matches!(Datetime.sample(None), Err(ProbeError::MissingArgument)));
    }
}
