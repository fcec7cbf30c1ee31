use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::model::candle::Candle;

/// Full column layout of an OKX candle row.
pub const CANDLE_COLUMNS: [&str; 9] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "volCcy",
    "volCcyQuote",
    "confirm",
];

/// Columns a row must carry to become a [`Candle`].
const REQUIRED_COLUMNS: usize = 5;

/// Envelope of every OKX v5 REST response.
///
/// `code` arrives as a string ("0") but is tolerated as a number or absent.
#[derive(Debug, Deserialize)]
pub struct OkxResponse {
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl OkxResponse {
    /// `None` when the response reports success.
    pub fn error_code(&self) -> Option<String> {
        match &self.code {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() || s == "0" => None,
            Some(Value::Number(n)) if n.as_i64() == Some(0) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    pub fn into_candles(self) -> Result<Vec<Candle>, AppError> {
        if let Some(code) = self.error_code() {
            let msg = self
                .msg
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "no message".to_string());
            return Err(AppError::OkxApi { code, msg });
        }
        self.data.iter().map(|row| parse_candle_row(row)).collect()
    }
}

fn value_to_f64(value: &Value, column: &str) -> Result<f64, AppError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).ok_or_else(|| {
        AppError::MalformedPayload(format!(
            "column '{}' is not a finite number: {}",
            column, value
        ))
    })
}

/// Convert one positional OKX row into a candle.
///
/// Rows shorter than [`CANDLE_COLUMNS`] are read against the truncated schema:
/// the time and price columns are required, a missing volume counts as zero,
/// and anything after volume is ignored.
pub fn parse_candle_row(row: &[Value]) -> Result<Candle, AppError> {
    if row.len() < REQUIRED_COLUMNS {
        return Err(AppError::MalformedPayload(format!(
            "candle row has {} fields, need at least {}",
            row.len(),
            REQUIRED_COLUMNS
        )));
    }

    let ts_ms = value_to_f64(&row[0], CANDLE_COLUMNS[0])? as i64;
    let timestamp = Utc
        .timestamp_millis_opt(ts_ms)
        .single()
        .ok_or_else(|| AppError::MalformedPayload(format!("timestamp out of range: {}", ts_ms)))?;

    let volume = match row.get(5) {
        Some(v) => value_to_f64(v, CANDLE_COLUMNS[5])?,
        None => 0.0,
    };

    Ok(Candle {
        timestamp,
        open: value_to_f64(&row[1], CANDLE_COLUMNS[1])?,
        high: value_to_f64(&row[2], CANDLE_COLUMNS[2])?,
        low: value_to_f64(&row[3], CANDLE_COLUMNS[3])?,
        close: value_to_f64(&row[4], CANDLE_COLUMNS[4])?,
        volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_codes() {
        let ok: OkxResponse = serde_json::from_str(r#"{"code":0,"data":[]}"#).unwrap();
        assert_eq!(ok.error_code(), None);
        let missing: OkxResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(missing.error_code(), None);
        let bad: OkxResponse =
            serde_json::from_str(r#"{"code":"51001","msg":"Instrument ID does not exist"}"#)
                .unwrap();
        assert_eq!(bad.error_code().as_deref(), Some("51001"));
    }

    #[test]
    fn short_row_defaults_volume() {
        let row: Vec<Value> =
            serde_json::from_str(r#"["1700000000000","1","2","0.5","1.5"]"#).unwrap();
        let candle = parse_candle_row(&row).unwrap();
        assert_eq!(candle.timestamp.timestamp_millis(), 1_700_000_000_000);
        assert!((candle.close - 1.5).abs() < f64::EPSILON);
        assert!(candle.volume.abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_non_finite_values() {
        for bad in ["NaN", "inf", "-inf"] {
            let row = vec![
                Value::from("1700000000000"),
                Value::from("100"),
                Value::from("101"),
                Value::from("99"),
                Value::from(bad),
                Value::from("3"),
            ];
            assert!(
                matches!(parse_candle_row(&row), Err(AppError::MalformedPayload(_))),
                "close {} was accepted",
                bad
            );
        }
    }

    #[test]
    fn rejects_non_numeric_price() {
        let row: Vec<Value> =
            serde_json::from_str(r#"["1700000000000","x","2","0.5","1.5","3"]"#).unwrap();
        assert!(matches!(
            parse_candle_row(&row),
            Err(AppError::MalformedPayload(_))
        ));
    }
}
