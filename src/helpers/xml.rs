//! quick-xml plumbing for the zipped workbook formats.
//!
//! [`XmlReader`] hands out events one by one and can gather the text of a
//! whole element in one call; [`TextRules`] says which descendants count.
use crate::error::PolicySheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),

    #[error("Attribute '{name}' has invalid value '{value}'")]
    InvalidAttribute { name: String, value: String },
}

/// Which descendants of an element make up its text.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TextRules {
    /// Text is only taken inside these elements; empty takes all text
    pub(crate) text_in: &'static [QName<'static>],
    /// Subtrees ignored entirely
    pub(crate) skip: &'static [QName<'static>],
    /// Element starting a new line once some text has been gathered
    pub(crate) line_break: Option<QName<'static>>,
    /// Element standing for a run of spaces, and the attribute holding its length
    pub(crate) spaces: Option<(QName<'static>, &'static str)>,
}

fn is_one_of(tags: &[QName<'static>], name: QName) -> bool {
    tags.iter().any(|tag| *tag == name)
}

/// Event reader over one XML part, reusing a single buffer.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);
        Self {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Next event, `None` once the document ends
    pub(crate) fn next(&mut self) -> Result<Option<Event<'_>>, PolicySheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }

    /// Gathers the text of the current element up to and including its `end` tag.
    pub(crate) fn read_text_until(&mut self, end: QName, rules: &TextRules) -> Result<String, PolicySheetError> {
        let mut text = String::new();
        let mut skipping = 0usize;
        let mut inside_text = 0usize;
        while let Some(event) = self.next()? {
            let taking = skipping == 0 && (rules.text_in.is_empty() || inside_text > 0);
            match event {
                Event::End(tag) if skipping == 0 && tag.name() == end => break,
                Event::Start(tag) if is_one_of(rules.skip, tag.name()) => skipping += 1,
                Event::End(tag) if skipping > 0 && is_one_of(rules.skip, tag.name()) => skipping -= 1,
                Event::Start(tag) if skipping == 0 => {
                    let name = tag.name();
                    if is_one_of(rules.text_in, name) {
                        inside_text += 1;
                    } else if rules.line_break.is_some_and(|line| line == name) {
                        if !text.is_empty() {
                            text.push('\n');
                        }
                    } else if let Some((_, length)) = rules.spaces.filter(|(space, _)| *space == name) {
                        let count = tag.parsed_attribute::<usize>(length)?.unwrap_or(1);
                        text.extend(std::iter::repeat(' ').take(count));
                    }
                }
                Event::End(tag) if skipping == 0 && is_one_of(rules.text_in, tag.name()) => {
                    inside_text = inside_text.saturating_sub(1);
                }
                Event::Text(content) if taking => text.push_str(&content.xml_content()?),
                Event::CData(content) if taking => text.push_str(&content.xml_content()?),
                Event::GeneralRef(reference) if taking => push_reference(&mut text, &reference.xml_content()?)?,
                _ => (),
            }
        }
        Ok(text)
    }
}

/// Appends a named entity (`&amp;`) or character reference (`&#65;`, `&#x41;`).
fn push_reference(text: &mut String, reference: &str) -> Result<(), PolicySheetError> {
    match reference.strip_prefix('#') {
        Some(code) => {
            let code = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => code.parse::<u32>()?,
            };
            text.extend(char::from_u32(code));
        }
        None => {
            let entity = resolve_xml_entity(reference).ok_or_else(|| XmlError::UnknownEntity(reference.to_owned()))?;
            text.push_str(entity);
        }
    }
    Ok(())
}

/// Attribute lookups on start tags.
pub(crate) trait StartTagExt {
    /// Unescaped value of the attribute with this qualified name
    fn attribute(&self, name: &str) -> Result<Option<Cow<'_, str>>, PolicySheetError>;

    /// Value of the first attribute with this local name, whatever its namespace prefix
    fn local_attribute(&self, local_name: &str) -> Result<Option<Cow<'_, str>>, PolicySheetError>;

    fn parsed_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, PolicySheetError>;
}

impl StartTagExt for BytesStart<'_> {
    fn attribute(&self, name: &str) -> Result<Option<Cow<'_, str>>, PolicySheetError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }

    fn local_attribute(&self, local_name: &str) -> Result<Option<Cow<'_, str>>, PolicySheetError> {
        for attribute in self.attributes() {
            let attribute = attribute?;
            if attribute.key.local_name().as_ref() == local_name.as_bytes() {
                return Ok(Some(attribute.unescape_value()?));
            }
        }
        Ok(None)
    }

    fn parsed_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, PolicySheetError> {
        match self.attribute(name)? {
            Some(value) => value.trim().parse().map(Some).map_err(|_| {
                PolicySheetError::from(XmlError::InvalidAttribute {
                    name: name.to_owned(),
                    value: value.to_string(),
                })
            }),
            None => Ok(None),
        }
    }
}

/// Loops over the remaining events of an [`XmlReader`], running the first
/// matching arm; unmatched events are ignored.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}
