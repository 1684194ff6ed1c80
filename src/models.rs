use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::{Result, SeriesError};
use crate::results::Element;
use crate::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricType {
    Counter,
    Gauge,
    Derive,
    Absolute,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricType::Counter => "COUNTER",
            MetricType::Gauge => "GAUGE",
            MetricType::Derive => "DERIVE",
            MetricType::Absolute => "ABSOLUTE",
        };
        f.write_str(name)
    }
}

/// The numeric payload of a sample, typed by the kind of metric it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueType {
    Counter(u64),
    Gauge(f64),
    Derive(i64),
    Absolute(u64),
}

impl ValueType {
    /// Builds a value of the kind matching `metric_type` from a wire number.
    ///
    /// Counter and absolute values must be non-negative integers and derive
    /// values must be integers. Integers are taken as-is, so values above 2^53
    /// keep every digit. A float is accepted for an integer kind only when it
    /// has no fractional part and fits the target type.
    pub fn compose(value: &Number, metric_type: MetricType) -> Result<Self> {
        let composed = match metric_type {
            MetricType::Counter => unsigned(value).map(ValueType::Counter),
            MetricType::Absolute => unsigned(value).map(ValueType::Absolute),
            MetricType::Derive => signed(value).map(ValueType::Derive),
            MetricType::Gauge => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(ValueType::Gauge),
        };

        composed.ok_or_else(|| {
            SeriesError::MalformedInput(format!(
                "{} is not a valid {} value",
                value, metric_type
            ))
        })
    }

    /// Wire form of the value. Integer kinds stay exact; a non-finite gauge
    /// has no JSON form and yields `None`.
    pub fn to_number(&self) -> Option<Number> {
        match *self {
            ValueType::Counter(v) | ValueType::Absolute(v) => Some(Number::from(v)),
            ValueType::Derive(v) => Some(Number::from(v)),
            ValueType::Gauge(v) => Number::from_f64(v),
        }
    }

    pub fn metric_type(&self) -> MetricType {
        match self {
            ValueType::Counter(_) => MetricType::Counter,
            ValueType::Gauge(_) => MetricType::Gauge,
            ValueType::Derive(_) => MetricType::Derive,
            ValueType::Absolute(_) => MetricType::Absolute,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            ValueType::Counter(v) | ValueType::Absolute(v) => v as f64,
            ValueType::Gauge(v) => v,
            ValueType::Derive(v) => v as f64,
        }
    }

    /// Change since `previous`.
    ///
    /// Counters subtract modulo 2^64 so a wrapped counter still yields the
    /// forward distance. Absolute values reset on every read, so their delta is
    /// the current value.
    pub fn delta(&self, previous: &ValueType) -> ValueType {
        match (*self, *previous) {
            (ValueType::Counter(cur), ValueType::Counter(prev)) => {
                ValueType::Counter(cur.wrapping_sub(prev))
            }
            (ValueType::Derive(cur), ValueType::Derive(prev)) => {
                ValueType::Derive(cur.wrapping_sub(prev))
            }
            (ValueType::Gauge(cur), ValueType::Gauge(prev)) => ValueType::Gauge(cur - prev),
            (ValueType::Absolute(cur), ValueType::Absolute(_)) => ValueType::Absolute(cur),
            (cur, prev) => ValueType::Gauge(cur.to_f64() - prev.to_f64()),
        }
    }

    pub fn divide_by(&self, divisor: i64) -> ValueType {
        ValueType::Gauge(self.to_f64() / divisor as f64)
    }
}

fn integral(value: &Number) -> Option<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
}

fn unsigned(value: &Number) -> Option<u64> {
    value.as_u64().or_else(|| {
        integral(value)
            .filter(|v| *v >= 0.0 && *v < u64::MAX as f64)
            .map(|v| v as u64)
    })
}

fn signed(value: &Number) -> Option<i64> {
    value.as_i64().or_else(|| {
        integral(value)
            .filter(|v| *v >= i64::MIN as f64 && *v < i64::MAX as f64)
            .map(|v| v as i64)
    })
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Counter(v) | ValueType::Absolute(v) => write!(f, "{}", v),
            ValueType::Gauge(v) => write!(f, "{}", v),
            ValueType::Derive(v) => write!(f, "{}", v),
        }
    }
}

/// A named thing samples are collected from (a host, an interface, ...).
///
/// Two resources with the same id are equal regardless of their attributes.
/// `attributes` distinguishes "none supplied" from an empty map.
#[derive(Debug, Clone)]
pub struct Resource {
    id: String,
    attributes: Option<HashMap<String, String>>,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: None,
        }
    }

    pub fn with_attributes(id: impl Into<String>, attributes: HashMap<String, String>) -> Self {
        Self {
            id: id.into(),
            attributes: Some(attributes),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attributes(&self) -> Option<&HashMap<String, String>> {
        self.attributes.as_ref()
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource[{}]", self.id)
    }
}

/// One measurement of a metric for a resource at an instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub resource: String,
    pub name: String,
    pub metric_type: MetricType,
    pub value: Option<ValueType>,
}

impl Sample {
    pub fn new(
        timestamp: Timestamp,
        resource: impl Into<String>,
        name: impl Into<String>,
        metric_type: MetricType,
        value: Option<ValueType>,
    ) -> Self {
        Self {
            timestamp,
            resource: resource.into(),
            name: name.into(),
            metric_type,
            value,
        }
    }
}

impl Element for Sample {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn resource(&self) -> &str {
        &self.resource
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wire form of a sample: timestamp in epoch milliseconds, value as a plain
/// JSON number (exact for the integer kinds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDto {
    pub timestamp: i64,
    pub resource: String,
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub value: Option<Number>,
}

impl From<&Sample> for SampleDto {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp.as_millis(),
            resource: sample.resource.clone(),
            name: sample.name.clone(),
            metric_type: sample.metric_type,
            value: sample.value.and_then(|v| v.to_number()),
        }
    }
}

impl TryFrom<SampleDto> for Sample {
    type Error = SeriesError;

    fn try_from(dto: SampleDto) -> Result<Self> {
        let value = dto
            .value
            .as_ref()
            .map(|v| ValueType::compose(v, dto.metric_type))
            .transpose()?;

        Ok(Sample::new(
            Timestamp::from_epoch_millis(dto.timestamp),
            dto.resource,
            dto.name,
            dto.metric_type,
            value,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_counter_delta_wraps() {
        let prev = ValueType::Counter(u64::MAX - 9);
        let cur = ValueType::Counter(10);
        assert_eq!(cur.delta(&prev), ValueType::Counter(20));
        assert_eq!(ValueType::Counter(2000).delta(&ValueType::Counter(1000)), ValueType::Counter(1000));
    }

    #[test]
    fn test_delta_by_kind() {
        assert_eq!(ValueType::Gauge(1.5).delta(&ValueType::Gauge(2.0)), ValueType::Gauge(-0.5));
        assert_eq!(ValueType::Derive(-5).delta(&ValueType::Derive(5)), ValueType::Derive(-10));
        assert_eq!(ValueType::Absolute(7).delta(&ValueType::Absolute(3)), ValueType::Absolute(7));
        assert_eq!(ValueType::Counter(10).delta(&ValueType::Gauge(4.0)), ValueType::Gauge(6.0));
    }

    #[test]
    fn test_divide_by_yields_gauge() {
        assert_eq!(ValueType::Counter(1000).divide_by(10), ValueType::Gauge(100.0));
    }

    fn number(json: &str) -> Number {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_compose() {
        assert_eq!(
            ValueType::compose(&number("42"), MetricType::Counter).unwrap(),
            ValueType::Counter(42)
        );
        assert_eq!(
            ValueType::compose(&number("-3"), MetricType::Derive).unwrap(),
            ValueType::Derive(-3)
        );
        assert_eq!(
            ValueType::compose(&number("0.25"), MetricType::Gauge).unwrap(),
            ValueType::Gauge(0.25)
        );
        assert_eq!(
            ValueType::compose(&number("7.0"), MetricType::Absolute).unwrap(),
            ValueType::Absolute(7)
        );
        assert_eq!(
            ValueType::compose(&number("18446744073709551615"), MetricType::Counter).unwrap(),
            ValueType::Counter(u64::MAX)
        );
    }

    #[test]
    fn test_compose_rejects_invalid_integer_values() {
        for (json, metric_type) in [
            ("-5.7", MetricType::Counter),
            ("1.5", MetricType::Counter),
            ("-1", MetricType::Counter),
            ("-2", MetricType::Absolute),
            ("0.5", MetricType::Absolute),
            ("2.25", MetricType::Derive),
            ("1e300", MetricType::Derive),
        ] {
            let err = ValueType::compose(&number(json), metric_type).unwrap_err();
            assert!(
                matches!(err, SeriesError::MalformedInput(_)),
                "{} as {}",
                json,
                metric_type
            );
        }
    }

    #[test]
    fn test_dto_with_fractional_counter_is_rejected() {
        let dto: SampleDto = serde_json::from_str(
            r#"{"timestamp": 1000, "resource": "r", "name": "m", "type": "COUNTER", "value": -5.7}"#,
        )
        .unwrap();
        let err = Sample::try_from(dto).unwrap_err();
        assert_eq!(err.to_string(), "malformed input: -5.7 is not a valid COUNTER value");
    }

    #[test]
    fn test_resource_equality_ignores_attributes() {
        let mut attrs = HashMap::new();
        attrs.insert("location".to_string(), "rack-4".to_string());

        let plain = Resource::new("host1");
        let tagged = Resource::with_attributes("host1", attrs);
        assert_eq!(plain, tagged);
        assert!(plain.attributes().is_none());
        assert!(Resource::with_attributes("host2", HashMap::new()).attributes().is_some());

        let mut set = HashSet::new();
        set.insert(plain);
        assert!(set.contains(&tagged));
        assert_eq!(tagged.to_string(), "Resource[host1]");
    }

    #[test]
    fn test_sample_dto_round_trip() {
        let sample = Sample::new(
            Timestamp::from_epoch_seconds(1_400_000_000),
            "localhost:eth0",
            "ifInOctets",
            MetricType::Counter,
            Some(ValueType::Counter(123_456)),
        );

        let dto = SampleDto::from(&sample);
        assert_eq!(dto.timestamp, 1_400_000_000_000);

        let json = serde_json::to_string(&dto).unwrap();
        assert!(json.contains("\"type\":\"COUNTER\""));

        let back = Sample::try_from(serde_json::from_str::<SampleDto>(&json).unwrap()).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_sample_dto_keeps_wide_integers() {
        let wide = (1u64 << 53) + 1;
        for value in [
            ValueType::Counter(wide),
            ValueType::Absolute(u64::MAX),
            ValueType::Derive(-(1i64 << 53) - 1),
        ] {
            let sample = Sample::new(
                Timestamp::from_epoch_seconds(1_400_000_000),
                "localhost:eth0",
                "ifHCInOctets",
                value.metric_type(),
                Some(value),
            );

            let json = serde_json::to_string(&SampleDto::from(&sample)).unwrap();
            let back = Sample::try_from(serde_json::from_str::<SampleDto>(&json).unwrap()).unwrap();
            assert_eq!(back, sample);
        }

        let json = serde_json::to_string(&SampleDto::from(&Sample::new(
            Timestamp::from_epoch_millis(0),
            "r",
            "m",
            MetricType::Counter,
            Some(ValueType::Counter(wide)),
        )))
        .unwrap();
        assert!(json.contains("\"value\":9007199254740993"));
    }

    #[test]
    fn test_sample_dto_null_value() {
        let dto: SampleDto = serde_json::from_str(
            r#"{"timestamp": 1000, "resource": "r", "name": "m", "type": "GAUGE", "value": null}"#,
        )
        .unwrap();
        let sample = Sample::try_from(dto).unwrap();
        assert!(sample.value.is_none());
    }
}
