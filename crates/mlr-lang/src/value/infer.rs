use super::Value;

impl Value {
    /// Value for a field read from input text: numbers become ints or
    /// floats, the empty string is void, anything else stays a string.
    pub fn infer(s: &str) -> Value {
        if s.is_empty() {
            return Value::Void;
        }
        infer_int(s)
            .map(Value::Int)
            .or_else(|| infer_float(s).map(Value::Float))
            .unwrap_or_else(|| Value::String(s.to_string()))
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

fn infer_int(s: &str) -> Option<i64> {
    let (negative, digits) = split_sign(s);

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        // Hex literals cover the full 64-bit pattern, so 0xffffffffffffffff is -1.
        u64::from_str_radix(hex, 16).ok().map(|u| u as i64)?
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        u64::from_str_radix(bin, 2).ok().map(|u| u as i64)?
    } else if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok();
    } else {
        return None;
    };

    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

fn infer_float(s: &str) -> Option<f64> {
    let (_, body) = split_sign(s);
    if body.is_empty() {
        return None;
    }

    match body {
        "Inf" => return s.parse::<f64>().ok(),
        "NaN" => return Some(f64::NAN),
        _ => {}
    }

    // `f64::from_str` also takes "infinity", "nan" and so on in any case.
    let numeric = body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'-' | b'+'));
    let has_digit = body.bytes().any(|b| b.is_ascii_digit());
    if !numeric || !has_digit {
        return None;
    }
    s.parse::<f64>().ok()
}
