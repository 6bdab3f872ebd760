/*
 * printf.rs
 * Copyright (c) 2025 Austrian Centre for Digital Humanities
 */

//! printf-style formatting of single values (`format="d:05"`).
//!
//! A format is a conversion character and a flag string, rendered as
//! `%<flags><conversion>`. Flags follow the usual grammar:
//! `[-+ 0]* [width] ['.' precision]`.

use once_cell::sync::Lazy;
use regex::Regex;

static FLAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<flags>[-+ 0]*)(?P<width>\d*)(?:\.(?P<precision>\d+))?$")
        .expect("valid flags regex")
});

/// Conversion characters understood by [`Printf`].
pub const CONVERSIONS: &str = "bcdeEfFgGhHosuxX";

/// A compiled printf conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printf {
    conversion: char,
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

impl Printf {
    /// Compile a conversion with its flags. Returns `None` for an unknown
    /// conversion or malformed flags.
    pub fn new(conversion: char, flags: &str) -> Option<Self> {
        if !CONVERSIONS.contains(conversion) {
            return None;
        }
        let caps = FLAGS.captures(flags)?;
        let flag_chars = caps.name("flags").map_or("", |m| m.as_str());
        let width = match caps.name("width").map(|m| m.as_str()) {
            Some(w) if !w.is_empty() => w.parse().ok()?,
            _ => 0,
        };
        let precision = match caps.name("precision") {
            Some(p) => Some(p.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            conversion,
            left: flag_chars.contains('-'),
            plus: flag_chars.contains('+'),
            space: flag_chars.contains(' '),
            zero: flag_chars.contains('0'),
            width,
            precision,
        })
    }

    /// Format one value. Numeric conversions return `None` when the value is
    /// not a number.
    pub fn apply(&self, value: &str) -> Option<String> {
        let (sign, body) = match self.conversion {
            's' => {
                let text: String = match self.precision {
                    Some(p) => value.chars().take(p).collect(),
                    None => value.to_string(),
                };
                return Some(self.pad(String::new(), text, false));
            }
            'c' => {
                let code = integer(value)?;
                let ch = u32::try_from(code).ok().and_then(char::from_u32)?;
                return Some(ch.to_string());
            }
            'd' => {
                let n = integer(value)?;
                (self.sign(n < 0), n.unsigned_abs().to_string())
            }
            'u' => (String::new(), (integer(value)? as u64).to_string()),
            'b' => (String::new(), format!("{:b}", integer(value)? as u64)),
            'o' => (String::new(), format!("{:o}", integer(value)? as u64)),
            'x' => (String::new(), format!("{:x}", integer(value)? as u64)),
            'X' => (String::new(), format!("{:X}", integer(value)? as u64)),
            'f' | 'F' => {
                let n = number(value)?;
                let p = self.precision.unwrap_or(6);
                (self.sign(n < 0.0), format!("{:.*}", p, n.abs()))
            }
            'e' | 'E' => {
                let n = number(value)?;
                let p = self.precision.unwrap_or(6);
                let body = exponential(n.abs(), p);
                let body = if self.conversion == 'E' {
                    body.to_uppercase()
                } else {
                    body
                };
                (self.sign(n < 0.0), body)
            }
            'g' | 'G' | 'h' | 'H' => {
                let n = number(value)?;
                let body = general(n.abs(), self.precision.unwrap_or(6));
                let body = if self.conversion.is_ascii_uppercase() {
                    body.to_uppercase()
                } else {
                    body
                };
                (self.sign(n < 0.0), body)
            }
            _ => return None,
        };
        Some(self.pad(sign, body, true))
    }

    fn sign(&self, negative: bool) -> String {
        if negative {
            "-".to_string()
        } else if self.plus {
            "+".to_string()
        } else if self.space {
            " ".to_string()
        } else {
            String::new()
        }
    }

    fn pad(&self, sign: String, body: String, numeric: bool) -> String {
        let len = sign.chars().count() + body.chars().count();
        if len >= self.width {
            return sign + &body;
        }
        let fill = self.width - len;
        if self.left {
            format!("{}{}{}", sign, body, " ".repeat(fill))
        } else if self.zero && numeric {
            format!("{}{}{}", sign, "0".repeat(fill), body)
        } else if self.zero {
            format!("{}{}", "0".repeat(fill), body)
        } else {
            format!("{}{}{}", " ".repeat(fill), sign, body)
        }
    }
}

fn number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| number(trimmed).map(|n| n.trunc() as i64))
}

/// `1.234560e+3` style, with at least one exponent digit.
fn exponential(n: f64, precision: usize) -> String {
    let formatted = format!("{:.*e}", precision, n);
    match formatted.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{}e{}", mantissa, exp),
        Some((mantissa, exp)) => format!("{}e+{}", mantissa, exp),
        None => formatted,
    }
}

/// Shortest of fixed and exponential notation for `precision` significant
/// digits, without trailing zeros.
fn general(n: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if n == 0.0 {
        return "0".to_string();
    }
    let exp = n.abs().log10().floor() as i64;
    if exp < -4 || exp >= precision as i64 {
        let formatted = exponential(n, precision - 1);
        match formatted.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", strip_zeros(mantissa), exp),
            None => formatted,
        }
    } else {
        let decimals = (precision as i64 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn strip_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
