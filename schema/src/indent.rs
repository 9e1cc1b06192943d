/// The indentation unit used when printing values.
///
/// Every `print` routine takes one of these by reference instead of
/// consulting process-wide state, so two threads can print with different
/// settings at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indent {
    unit: String,
}

impl Indent {
    pub fn new(unit: impl Into<String>) -> Indent {
        Indent { unit: unit.into() }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Append `level` copies of the unit to `out`.
    pub fn write(&self, out: &mut String, level: usize) {
        for _ in 0..level {
            out.push_str(&self.unit);
        }
    }
}

impl Default for Indent {
    fn default() -> Indent {
        Indent::new("    ")
    }
}

/// Formats a float the way `printf("%g")` does: six significant digits,
/// trailing zeros removed, exponent form outside `1e-4 ..= 1e6`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    let scientific = format!("{:.5e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_owned()
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
