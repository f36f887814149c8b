//! printf-style message templating.
//!
//! Supported conversions: `%s`, `%d`, `%i`, `%f` (with `%.Nf` precision),
//! `%j` (compact JSON) and `%%`. Arguments may be addressed explicitly with
//! `%N$s` (1-based), which does not advance the implicit cursor.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%(?:(\d+)\$)?(?:\.(\d+))?([sdifj%])").expect("placeholder pattern compiles")
});

/// Substitute `args` into `template`.
///
/// A placeholder without a matching argument is left untouched.
pub fn format(template: &str, args: &[Value]) -> String {
    let mut cursor = 0usize;
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let conversion = &caps[3];
            if conversion == "%" {
                return "%".to_string();
            }

            let index = match caps.get(1).and_then(|m| m.as_str().parse::<usize>().ok()) {
                Some(position) if position > 0 => position - 1,
                Some(_) => return caps[0].to_string(),
                None => {
                    let index = cursor;
                    cursor += 1;
                    index
                }
            };

            let Some(arg) = args.get(index) else {
                return caps[0].to_string();
            };

            let precision = caps.get(2).and_then(|m| m.as_str().parse::<usize>().ok());
            render(conversion, arg, precision)
        })
        .into_owned()
}

fn render(conversion: &str, arg: &Value, precision: Option<usize>) -> String {
    match conversion {
        "s" => match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        "d" | "i" => match as_f64(arg) {
            Some(n) => format!("{}", n.trunc() as i64),
            None => "NaN".to_string(),
        },
        "f" => match as_f64(arg) {
            Some(n) => match precision {
                Some(p) => format!("{:.*}", p, n),
                None => format!("{}", n),
            },
            None => "NaN".to_string(),
        },
        "j" => serde_json::to_string(arg).unwrap_or_default(),
        _ => String::new(),
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}
