//! Value and metadata model handed to the telemetry collaborator.
//!
//! Only the shape of an update lives here; the wire protocol and the
//! server connection belong to the [`PublishPort`](crate::app::ports::PublishPort)
//! adapter.

use serde::Serialize;

/// A published value.  Serialises as a bare JSON scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SkValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<bool> for SkValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u32> for SkValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i32> for SkValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f32> for SkValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

/// Descriptive metadata published alongside a path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkMetadata {
    #[serde(skip_serializing_if = "str::is_empty")]
    pub units: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub display_name: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub short_name: &'static str,
}

impl SkMetadata {
    pub const fn new(units: &'static str, description: &'static str) -> Self {
        Self {
            units,
            description,
            display_name: "",
            short_name: "",
        }
    }

    pub const fn with_names(mut self, display_name: &'static str, short_name: &'static str) -> Self {
        self.display_name = display_name;
        self.short_name = short_name;
        self
    }
}

/// One value ready for publication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkUpdate<'a> {
    pub path: &'a str,
    pub value: SkValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<&'a SkMetadata>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_serialises_compactly() {
        let meta = SkMetadata::new("K", "Study Temperature").with_names("Study Temperature", "Study Temp");
        let update = SkUpdate {
            path: "study.temperature",
            value: SkValue::from(295.5_f32),
            meta: Some(&meta),
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(
            json,
            r#"{"path":"study.temperature","value":295.5,"meta":{"units":"K","description":"Study Temperature","displayName":"Study Temperature","shortName":"Study Temp"}}"#
        );
    }

    #[test]
    fn empty_metadata_fields_are_omitted() {
        let meta = SkMetadata::new("", "Digital input 2 value");
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"description":"Digital input 2 value"}"#);
    }

    #[test]
    fn values_are_bare_scalars() {
        assert_eq!(serde_json::to_string(&SkValue::Bool(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&SkValue::from(3_u32)).unwrap(), "3");
    }
}
