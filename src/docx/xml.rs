//! Thin helpers over quick-xml for event-stream editing

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// Tokenize a part into owned events, keeping whitespace and raw escapes intact.
pub(crate) fn parse_events(bytes: &[u8]) -> Result<Vec<Event<'static>>> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(event) => events.push(event.into_owned()),
            Err(e) => {
                return Err(Error::Xml(format!(
                    "at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
        buf.clear();
    }
    Ok(events)
}

/// Serialize events back to bytes.
pub(crate) fn write_events(events: &[Event<'static>]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::with_capacity(events.len() * 32));
    for event in events {
        writer.write_event(event.clone())?;
    }
    Ok(writer.into_inner())
}

/// Unescaped value of the first attribute with the given local name.
pub(crate) fn attr(element: &BytesStart<'_>, local_name: &[u8]) -> Option<String> {
    element
        .attributes()
        .with_checks(false)
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local_name)
        .and_then(|a| {
            let raw = std::str::from_utf8(&a.value).ok()?;
            quick_xml::escape::unescape(raw).ok().map(Cow::into_owned)
        })
}

/// Qualified name (`w:drawing`) of a start, empty or end event.
pub(crate) fn qualified_name<'a>(event: &'a Event<'static>) -> Option<&'a [u8]> {
    match event {
        Event::Start(e) | Event::Empty(e) => Some(e.name().into_inner()),
        Event::End(e) => Some(e.name().into_inner()),
        _ => None,
    }
}

/// Escape text for use inside a double-quoted attribute.
pub(crate) fn escape(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}
