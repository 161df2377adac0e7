//! Front-matter parsing

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<Scalar>()? {
                vec.push(item.0);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Custom deserializer for optional scalar fields.
///
/// YAML happily types `title: 2048` as an integer and `author: yes` as a
/// boolean; both should still land as text.
fn opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Scalar>::deserialize(deserializer).map(|s| s.map(|s| s.0))
}

/// A YAML/TOML scalar rendered as text
struct Scalar(String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct ScalarVisitor;

        impl<'de> Visitor<'de> for ScalarVisitor {
            type Value = Scalar;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string, number or boolean")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Scalar, E> {
                Ok(Scalar(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Scalar, E> {
                Ok(Scalar(value))
            }

            fn visit_bool<E: de::Error>(self, value: bool) -> Result<Scalar, E> {
                Ok(Scalar(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Scalar, E> {
                Ok(Scalar(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Scalar, E> {
                Ok(Scalar(value.to_string()))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Scalar, E> {
                Ok(Scalar(value.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// Front-matter data from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "opt_scalar")]
    pub layout: Option<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub subtitle: Option<String>,
    /// Hero image(s); themes show the first one
    #[serde(rename = "cover-img", deserialize_with = "string_or_vec")]
    pub cover_img: Vec<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub author: Option<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub date: Option<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub permalink: Option<String>,
    /// Documents are published unless they opt out
    pub published: bool,

    /// Additional custom fields, in declaration order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            layout: None,
            title: None,
            subtitle: None,
            cover_img: Vec::new(),
            tags: Vec::new(),
            author: None,
            date: None,
            permalink: None,
            published: true,
            extra: IndexMap::new(),
        }
    }
}

/// Syntax of a metadata block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `---` ... `---` (or `...`)
    Yaml,
    /// `+++` ... `+++`
    Toml,
    /// leading `key: value` lines closed by `---`
    BareYaml,
}

impl FrontMatter {
    /// Split a raw file into (front_matter, body).
    ///
    /// On failure the error is a human-readable reason; callers attach the
    /// document path.
    pub fn parse(content: &str) -> Result<(Self, &str), String> {
        let (format, block, body) = split(content)?;

        let value = match format {
            Format::Toml => {
                let table = block
                    .parse::<toml::Table>()
                    .map_err(|e| format!("invalid TOML front matter: {}", e.message()))?;
                toml_to_yaml(toml::Value::Table(table))
            }
            Format::Yaml | Format::BareYaml => serde_yaml::from_str::<serde_yaml::Value>(block)
                .map_err(|e| format!("invalid YAML front matter: {}", e))?,
        };

        let value = match value {
            serde_yaml::Value::Mapping(map) => serde_yaml::Value::Mapping(map),
            // `---\n---` is an empty but well-formed block
            serde_yaml::Value::Null if format != Format::BareYaml => {
                serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
            }
            _ => return Err("front matter is not a key/value mapping".to_string()),
        };

        let fm = serde_yaml::from_value::<FrontMatter>(value)
            .map_err(|e| format!("invalid front matter field: {}", e))?;

        Ok((fm, body))
    }
}

/// Locate the metadata block. Returns (format, block, body).
fn split(content: &str) -> Result<(Format, &str, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let content = content.trim_start_matches(['\n', '\r']);

    let mut iter = lines(content);
    let (_, first_end, first) = iter
        .next()
        .ok_or_else(|| "document is empty".to_string())?;

    let (format, closers): (Format, &[&str]) = match first.trim_end() {
        "---" => (Format::Yaml, &["---", "..."]),
        "+++" => (Format::Toml, &["+++"]),
        _ => {
            // Bare block: everything up to the first `---` line
            return lines(content)
                .find(|(_, _, line)| line.trim_end() == "---")
                .map(|(start, end, _)| (Format::BareYaml, &content[..start], &content[end..]))
                .filter(|(_, block, _)| !block.trim().is_empty())
                .ok_or_else(|| "no front matter block found".to_string());
        }
    };

    for (start, end, line) in iter {
        if closers.contains(&line.trim_end()) {
            return Ok((format, &content[first_end..start], &content[end..]));
        }
    }

    Err(format!("unterminated front matter (no closing `{}`)", closers[0]))
}

/// Iterate lines as (start, end, text) where `end` is past the line break
fn lines(s: &str) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
    let mut offset = 0;
    s.split_inclusive('\n').map(move |chunk| {
        let start = offset;
        offset += chunk.len();
        (start, offset, chunk.trim_end_matches(['\n', '\r']))
    })
}

/// Convert a TOML value into the YAML value model used for front matter
fn toml_to_yaml(value: toml::Value) -> serde_yaml::Value {
    use serde_yaml::Value;

    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Value::Number(f.into()),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Sequence(items.into_iter().map(toml_to_yaml).collect()),
        toml::Value::Table(table) => {
            let mut map = serde_yaml::Mapping::new();
            for (key, value) in table {
                map.insert(Value::String(key), toml_to_yaml(value));
            }
            Value::Mapping(map)
        }
    }
}
