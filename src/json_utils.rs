use serde_json::Value;

// Lenient field access: absence or a type mismatch falls back to the
// declared default instead of failing the record.

/// String field, `""` when absent or not a string.
pub fn str_or_empty(v: &Value, key: &str) -> String {
    v.get(key).and_then(|x| x.as_str()).unwrap_or_default().to_string()
}

/// Boolean field, `false` when absent or not a bool.
pub fn bool_or_false(v: &Value, key: &str) -> bool {
    v.get(key).and_then(|x| x.as_bool()).unwrap_or(false)
}

/// Numeric field as f64, `0.0` when absent or not a number.
pub fn f64_or_zero(v: &Value, key: &str) -> f64 {
    v.get(key).and_then(|x| x.as_f64()).unwrap_or(0.0)
}

/// Untyped field carried through as-is, `null` when absent.
pub fn raw_or_null(v: &Value, key: &str) -> Value {
    v.get(key).cloned().unwrap_or(Value::Null)
}

/// `created_utc` is strict: the walker cannot place a record without it.
pub fn created_utc_strict(v: &Value) -> Option<i64> {
    let c = v.get("created_utc")?;
    if let Some(i) = c.as_i64() {
        return Some(i);
    }
    c.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)
}
