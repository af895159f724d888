//! File formats understood by the directory provider.
//!
//! Every codec converts between bytes and a `serde_json::Value` document;
//! typed values go through that document on both the read and write paths.
//! A file holding only whitespace decodes to `null` in every format, which
//! leaves the target at its default.

use std::io::{Read, Write};

use serde_json::Value;
use thiserror::Error;

/// Format-level failures.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("document I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A file format bound to one or more file extensions.
pub trait FileCodec: Send + Sync {
    /// Extensions without the leading dot; the first is used for new files.
    fn extensions(&self) -> &[&'static str];

    fn decode(&self, reader: &mut dyn Read) -> Result<Value, CodecError>;

    fn encode(&self, writer: &mut dyn Write, document: &Value) -> Result<(), CodecError>;

    /// Short format name for logs.
    fn name(&self) -> &'static str;
}

/// JSON files, written pretty-printed.
#[derive(Debug, Clone)]
pub struct JsonCodec {
    indent: usize,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl JsonCodec {
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

impl FileCodec for JsonCodec {
    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Value, CodecError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn encode(&self, writer: &mut dyn Write, document: &Value) -> Result<(), CodecError> {
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, formatter);
        serde::Serialize::serialize(document, &mut serializer)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// YAML files (`.yml` or `.yaml`).
#[derive(Debug, Clone, Default)]
pub struct YamlCodec;

impl FileCodec for YamlCodec {
    fn extensions(&self) -> &[&'static str] {
        &["yml", "yaml"]
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Value, CodecError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn encode(&self, writer: &mut dyn Write, document: &Value) -> Result<(), CodecError> {
        serde_yaml::to_writer(writer, document)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "yaml"
    }
}

/// TOML files.
///
/// TOML has no null; `null` fields are dropped when written.
#[derive(Debug, Clone, Default)]
pub struct TomlCodec;

impl FileCodec for TomlCodec {
    fn extensions(&self) -> &[&'static str] {
        &["toml"]
    }

    fn decode(&self, reader: &mut dyn Read) -> Result<Value, CodecError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(toml::from_str(&content)?)
    }

    fn encode(&self, writer: &mut dyn Write, document: &Value) -> Result<(), CodecError> {
        let content = toml::to_string_pretty(&strip_nulls(document.clone()))?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "toml"
    }
}

fn strip_nulls(document: Value) -> Value {
    match document {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn encode_to_string(codec: &dyn FileCodec, document: &Value) -> String {
        let mut buf = Vec::new();
        codec.encode(&mut buf, document).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_json_uses_configured_indent() {
        let codec = JsonCodec::default().with_indent(4);
        let out = encode_to_string(&codec, &json!({"a": 1}));
        assert_eq!(out, "{\n    \"a\": 1\n}\n");
    }

    #[test]
    fn test_yaml_reads_both_extensions_and_empty_files() {
        let codec = YamlCodec;
        assert_eq!(codec.extensions(), &["yml", "yaml"]);

        let doc = codec.decode(&mut "a: 1\nb: text\n".as_bytes()).unwrap();
        assert_eq!(doc, json!({"a": 1, "b": "text"}));

        let empty = codec.decode(&mut "".as_bytes()).unwrap();
        assert_eq!(empty, Value::Null);
    }

    #[test]
    fn test_toml_drops_nulls_on_write() {
        let codec = TomlCodec;
        let out = encode_to_string(&codec, &json!({"a": 1, "b": null, "d": {"e": 2}}));
        let back = codec.decode(&mut out.as_bytes()).unwrap();
        assert_eq!(back, json!({"a": 1, "d": {"e": 2}}));
    }

    #[test]
    fn test_blank_files_decode_to_null_in_every_format() {
        let codecs: [&dyn FileCodec; 3] = [&JsonCodec::default(), &YamlCodec, &TomlCodec];
        for codec in codecs {
            let doc = codec.decode(&mut " \n".as_bytes()).unwrap();
            assert_eq!(doc, Value::Null, "{}", codec.name());
        }
        assert_eq!(
            JsonCodec::default().decode(&mut "".as_bytes()).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_malformed_input_is_reported() {
        assert!(matches!(
            JsonCodec::default().decode(&mut "{".as_bytes()),
            Err(CodecError::Json(_))
        ));
        assert!(matches!(
            TomlCodec.decode(&mut "a = ".as_bytes()),
            Err(CodecError::TomlDecode(_))
        ));
    }
}
