//! JSON number output for coordinates and sizes.
//!
//! Values are held as `f64`, but integral values are written without a
//! fractional part so that `"width": 120` in an input file is written back
//! as `120`, not `120.0`.

use serde::Serializer;

/// Largest magnitude below which every integer is exact in an `f64`.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

pub(crate) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

pub(crate) fn serialize_opt<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serialize(value, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        #[serde(serialize_with = "super::serialize")]
        value: f64,
    }

    fn written(value: f64) -> String {
        serde_json::to_string(&Sample { value }).unwrap()
    }

    #[test]
    fn test_integral_values_have_no_fraction() {
        assert_eq!(written(120.0), r#"{"value":120}"#);
        assert_eq!(written(-40.0), r#"{"value":-40}"#);
    }

    #[test]
    fn test_fractional_values_are_kept() {
        assert_eq!(written(12.5), r#"{"value":12.5}"#);
    }

    #[test]
    fn test_non_finite_values_fall_through() {
        // serde_json writes non-finite floats as null.
        assert_eq!(written(f64::NAN), r#"{"value":null}"#);
    }
}
