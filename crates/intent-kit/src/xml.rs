//! Text serialization for [`PersistableBundle`].
//!
//! A bundle is written as a standalone XML document whose single root element
//! is `<persistable_bundle>`. Every entry is one child element named after
//! its kind and carrying the key in a `name` attribute:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8" standalone="yes"?>
//! <persistable_bundle>
//!   <string name="ssid">corp-guest</string>
//!   <int name="retries" value="3"/>
//!   <long-array name="ids" num="2"><item value="1"/><item value="2"/></long-array>
//!   <pbundle_as_map name="proxy">
//!     <boolean name="enabled" value="false"/>
//!   </pbundle_as_map>
//! </persistable_bundle>
//! ```
//!
//! Decoding is strict: the first element must be the wrapper, every entry
//! must be well formed, and array lengths must match their `num` attribute.

use std::str::FromStr;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::persistable::{PersistableBundle, PersistableValue};

/// Name of the element wrapping a serialized bundle.
pub const TAG_PERSISTABLE_BUNDLE: &str = "persistable_bundle";

const TAG_NESTED_BUNDLE: &str = "pbundle_as_map";
const TAG_ITEM: &str = "item";
const TAG_NULL: &str = "null";

/// Error while encoding or decoding a bundle document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// The underlying XML reader or writer failed (syntax, mismatched tags).
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),
    /// An attribute could not be parsed.
    #[error("malformed attribute: {0}")]
    Attr(#[from] AttrError),
    /// The document does not start with the wrapper element.
    #[error("expected <persistable_bundle> as the first element, found {found}")]
    MissingWrapper { found: String },
    /// The document ended inside an element.
    #[error("unexpected end of document inside <{0}>")]
    UnexpectedEof(String),
    /// An entry element this codec does not know.
    #[error("unknown element <{0}>")]
    UnknownTag(String),
    /// A required attribute is absent.
    #[error("<{tag}> is missing the `{attr}` attribute")]
    MissingAttribute { tag: String, attr: &'static str },
    /// An attribute value does not parse as the expected kind.
    #[error("invalid {kind} value {value:?}")]
    InvalidValue { kind: &'static str, value: String },
    /// An array holds a different number of items than it declares.
    #[error("<{tag}> declares {declared} items but contains {found}")]
    LengthMismatch {
        tag: String,
        declared: usize,
        found: usize,
    },
    /// Text or markup where only entry elements are allowed.
    #[error("unexpected {0} in bundle content")]
    UnexpectedContent(String),
    /// The writer produced bytes that are not UTF-8.
    #[error("serialized document is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl PersistableBundle {
    /// Serialize this bundle into a standalone XML document.
    pub fn to_xml_string(&self) -> Result<String, XmlError> {
        to_xml_string(self)
    }

    /// Parse a document produced by [`to_xml_string`](Self::to_xml_string).
    pub fn from_xml_str(text: &str) -> Result<Self, XmlError> {
        from_xml_str(text)
    }
}

/// Serialize `bundle` into a standalone XML document.
pub fn to_xml_string(bundle: &PersistableBundle) -> Result<String, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))?;
    writer.write_event(Event::Start(BytesStart::new(TAG_PERSISTABLE_BUNDLE)))?;
    write_entries(&mut writer, bundle)?;
    writer.write_event(Event::End(BytesEnd::new(TAG_PERSISTABLE_BUNDLE)))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Parse a document whose first element is `<persistable_bundle>`.
///
/// Anything after the wrapper's closing tag is ignored.
pub fn from_xml_str(text: &str) -> Result<PersistableBundle, XmlError> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event()? {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Text(t) if is_blank(&t) => {}
            Event::Start(e) if e.name().as_ref() == TAG_PERSISTABLE_BUNDLE.as_bytes() => {
                return read_entries(&mut reader, TAG_PERSISTABLE_BUNDLE);
            }
            Event::Empty(e) if e.name().as_ref() == TAG_PERSISTABLE_BUNDLE.as_bytes() => {
                return Ok(PersistableBundle::new());
            }
            other => {
                return Err(XmlError::MissingWrapper {
                    found: describe(&other),
                })
            }
        }
    }
}

// ── Writing ─────────────────────────────────────────────────────────

fn write_entries<W: std::io::Write>(
    writer: &mut Writer<W>,
    bundle: &PersistableBundle,
) -> Result<(), XmlError> {
    for (key, value) in bundle.iter() {
        write_entry(writer, key, value)?;
    }
    Ok(())
}

fn write_entry<W: std::io::Write>(
    writer: &mut Writer<W>,
    key: &str,
    value: &PersistableValue,
) -> Result<(), XmlError> {
    match value {
        PersistableValue::String(s) => {
            writer.write_event(Event::Start(named("string", key)))?;
            writer.write_event(Event::Text(BytesText::new(s)))?;
            writer.write_event(Event::End(BytesEnd::new("string")))?;
        }
        PersistableValue::Int(v) => write_scalar(writer, "int", key, &v.to_string())?,
        PersistableValue::Long(v) => write_scalar(writer, "long", key, &v.to_string())?,
        PersistableValue::Double(v) => write_scalar(writer, "double", key, &format_double(*v))?,
        PersistableValue::Boolean(v) => write_scalar(writer, "boolean", key, format_bool(*v))?,
        PersistableValue::StringArray(items) => {
            write_array(writer, "string-array", key, items.iter().cloned())?
        }
        PersistableValue::IntArray(items) => {
            write_array(writer, "int-array", key, items.iter().map(i32::to_string))?
        }
        PersistableValue::LongArray(items) => {
            write_array(writer, "long-array", key, items.iter().map(i64::to_string))?
        }
        PersistableValue::DoubleArray(items) => {
            write_array(writer, "double-array", key, items.iter().map(|v| format_double(*v)))?
        }
        PersistableValue::BooleanArray(items) => write_array(
            writer,
            "boolean-array",
            key,
            items.iter().map(|v| format_bool(*v).to_string()),
        )?,
        PersistableValue::Bundle(nested) => {
            writer.write_event(Event::Start(named(TAG_NESTED_BUNDLE, key)))?;
            write_entries(writer, nested)?;
            writer.write_event(Event::End(BytesEnd::new(TAG_NESTED_BUNDLE)))?;
        }
    }
    Ok(())
}

fn write_scalar<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    key: &str,
    value: &str,
) -> Result<(), XmlError> {
    let mut elem = named(tag, key);
    elem.push_attribute(("value", value));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

fn write_array<W, I>(writer: &mut Writer<W>, tag: &str, key: &str, items: I) -> Result<(), XmlError>
where
    W: std::io::Write,
    I: ExactSizeIterator<Item = String>,
{
    let mut start = named(tag, key);
    start.push_attribute(("num", items.len().to_string().as_str()));
    writer.write_event(Event::Start(start))?;
    for item in items {
        let mut elem = BytesStart::new(TAG_ITEM);
        elem.push_attribute(("value", item.as_str()));
        writer.write_event(Event::Empty(elem))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn named<'a>(tag: &'a str, key: &str) -> BytesStart<'a> {
    let mut elem = BytesStart::new(tag);
    elem.push_attribute(("name", key));
    elem
}

fn format_bool(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

/// Doubles always carry a fraction (`1.0`), and non-finite values use the
/// `NaN` / `Infinity` spellings.
fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let s = if v > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

// ── Reading ─────────────────────────────────────────────────────────

fn read_entries(reader: &mut Reader<&[u8]>, tag: &str) -> Result<PersistableBundle, XmlError> {
    let mut bundle = PersistableBundle::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if let Some((key, value)) = read_entry(reader, &e, false)? {
                    bundle.insert(key, value);
                }
            }
            Event::Empty(e) => {
                if let Some((key, value)) = read_entry(reader, &e, true)? {
                    bundle.insert(key, value);
                }
            }
            // The reader rejects mismatched end tags, so this closes `tag`.
            Event::End(_) => return Ok(bundle),
            Event::Text(t) if is_blank(&t) => {}
            Event::Comment(_) | Event::PI(_) => {}
            Event::Eof => return Err(XmlError::UnexpectedEof(tag.to_string())),
            other => return Err(XmlError::UnexpectedContent(describe(&other))),
        }
    }
}

/// Read one entry whose start tag has just been consumed. `<null>` entries
/// yield `None`.
fn read_entry(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    empty: bool,
) -> Result<Option<(String, PersistableValue)>, XmlError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    if tag == TAG_NULL {
        finish_element(reader, &tag, empty)?;
        return Ok(None);
    }

    let key = required(start, &tag, "name")?;
    let value = match tag.as_str() {
        "string" => {
            let text = if empty {
                String::new()
            } else {
                read_text(reader, &tag)?
            };
            return Ok(Some((key, PersistableValue::String(text))));
        }
        TAG_NESTED_BUNDLE => {
            let nested = if empty {
                PersistableBundle::new()
            } else {
                read_entries(reader, &tag)?
            };
            return Ok(Some((key, PersistableValue::Bundle(nested))));
        }
        "int" => PersistableValue::Int(parse(&required(start, &tag, "value")?, "int")?),
        "long" => PersistableValue::Long(parse(&required(start, &tag, "value")?, "long")?),
        "double" => PersistableValue::Double(parse_double(&required(start, &tag, "value")?)?),
        "boolean" => PersistableValue::Boolean(parse_bool(&required(start, &tag, "value")?)),
        "string-array" => PersistableValue::StringArray(read_array(reader, start, &tag, empty)?),
        "int-array" => PersistableValue::IntArray(
            read_array(reader, start, &tag, empty)?
                .iter()
                .map(|s| parse(s, "int"))
                .collect::<Result<_, _>>()?,
        ),
        "long-array" => PersistableValue::LongArray(
            read_array(reader, start, &tag, empty)?
                .iter()
                .map(|s| parse(s, "long"))
                .collect::<Result<_, _>>()?,
        ),
        "double-array" => PersistableValue::DoubleArray(
            read_array(reader, start, &tag, empty)?
                .iter()
                .map(|s| parse_double(s))
                .collect::<Result<_, _>>()?,
        ),
        "boolean-array" => PersistableValue::BooleanArray(
            read_array(reader, start, &tag, empty)?
                .iter()
                .map(|s| parse_bool(s))
                .collect(),
        ),
        _ => return Err(XmlError::UnknownTag(tag)),
    };

    // Arrays consume their own end tag; scalars may be written as a
    // start/end pair instead of an empty element.
    if matches!(
        value,
        PersistableValue::Int(_)
            | PersistableValue::Long(_)
            | PersistableValue::Double(_)
            | PersistableValue::Boolean(_)
    ) {
        finish_element(reader, &tag, empty)?;
    }
    Ok(Some((key, value)))
}

fn read_text(reader: &mut Reader<&[u8]>, tag: &str) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) => return Ok(text),
            Event::Comment(_) => {}
            Event::Eof => return Err(XmlError::UnexpectedEof(tag.to_string())),
            other => return Err(XmlError::UnexpectedContent(describe(&other))),
        }
    }
}

/// Collect the raw `value` of every `<item>` and check it against `num`.
fn read_array(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    tag: &str,
    empty: bool,
) -> Result<Vec<String>, XmlError> {
    let declared: usize = parse(&required(start, tag, "num")?, "num")?;

    let mut items = Vec::with_capacity(declared.min(1024));
    if !empty {
        loop {
            match reader.read_event()? {
                Event::Empty(e) if e.name().as_ref() == TAG_ITEM.as_bytes() => {
                    items.push(required(&e, TAG_ITEM, "value")?);
                }
                Event::Start(e) if e.name().as_ref() == TAG_ITEM.as_bytes() => {
                    items.push(required(&e, TAG_ITEM, "value")?);
                    finish_element(reader, TAG_ITEM, false)?;
                }
                Event::End(_) => break,
                Event::Text(t) if is_blank(&t) => {}
                Event::Comment(_) => {}
                Event::Eof => return Err(XmlError::UnexpectedEof(tag.to_string())),
                other => return Err(XmlError::UnexpectedContent(describe(&other))),
            }
        }
    }

    if items.len() != declared {
        return Err(XmlError::LengthMismatch {
            tag: tag.to_string(),
            declared,
            found: items.len(),
        });
    }
    Ok(items)
}

/// Skip to the end tag of an element that carries no content.
fn finish_element(reader: &mut Reader<&[u8]>, tag: &str, empty: bool) -> Result<(), XmlError> {
    if empty {
        return Ok(());
    }
    loop {
        match reader.read_event()? {
            Event::End(_) => return Ok(()),
            Event::Text(t) if is_blank(&t) => {}
            Event::Comment(_) => {}
            Event::Eof => return Err(XmlError::UnexpectedEof(tag.to_string())),
            other => return Err(XmlError::UnexpectedContent(describe(&other))),
        }
    }
}

fn attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, XmlError> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required(start: &BytesStart<'_>, tag: &str, attr: &'static str) -> Result<String, XmlError> {
    attribute(start, attr)?.ok_or_else(|| XmlError::MissingAttribute {
        tag: tag.to_string(),
        attr,
    })
}

fn parse<T: FromStr>(raw: &str, kind: &'static str) -> Result<T, XmlError> {
    raw.trim().parse().map_err(|_| XmlError::InvalidValue {
        kind,
        value: raw.to_string(),
    })
}

fn parse_double(raw: &str) -> Result<f64, XmlError> {
    match raw.trim() {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        other => parse(other, "double"),
    }
}

fn parse_bool(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn describe(event: &Event<'_>) -> String {
    match event {
        Event::Start(e) | Event::Empty(e) => {
            format!("<{}>", String::from_utf8_lossy(e.name().as_ref()))
        }
        Event::End(e) => format!("</{}>", String::from_utf8_lossy(e.name().as_ref())),
        Event::Text(_) | Event::CData(_) => "text".to_string(),
        Event::Eof => "end of document".to_string(),
        _ => "markup".to_string(),
    }
}
