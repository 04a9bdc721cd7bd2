//! 字段模板: 只允许一个 `%[-][width][.precision]s`, `%%` 为字面量

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    prefix: String,
    suffix: String,
    left_align: bool,
    width: usize,
    precision: Option<usize>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::Template {
            template: source.to_string(),
            reason: reason.to_string(),
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion: Option<(bool, usize, Option<usize>)> = None;

        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            let out = if conversion.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }
            if conversion.is_some() {
                return Err(invalid("more than one conversion"));
            }

            let left_align = chars.next_if_eq(&'-').is_some();
            let width = take_number(&mut chars).unwrap_or(0);
            let precision = if chars.next_if_eq(&'.').is_some() {
                Some(take_number(&mut chars).unwrap_or(0))
            } else {
                None
            };
            match chars.next() {
                Some('s') => conversion = Some((left_align, width, precision)),
                Some(other) => return Err(invalid(&format!("unsupported conversion `%{}`", other))),
                None => return Err(invalid("dangling `%`")),
            }
        }

        let (left_align, width, precision) = conversion.ok_or_else(|| invalid("missing `%s`"))?;
        Ok(Self {
            source: source.to_string(),
            prefix,
            suffix,
            left_align,
            width,
            precision,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 用 value 替换唯一的 `%s`
    pub fn apply(&self, value: &str) -> String {
        let value: String = match self.precision {
            Some(max) => value.chars().take(max).collect(),
            None => value.to_string(),
        };
        let padding = self.width.saturating_sub(value.chars().count());

        let mut out = String::with_capacity(self.prefix.len() + value.len() + padding + self.suffix.len());
        out.push_str(&self.prefix);
        if !self.left_align {
            out.extend(std::iter::repeat(' ').take(padding));
        }
        out.push_str(&value);
        if self.left_align {
            out.extend(std::iter::repeat(' ').take(padding));
        }
        out.push_str(&self.suffix);
        out
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits.parse().ok()
}
