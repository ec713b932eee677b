//! Fragment parsing with `quick-xml`.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{Element, MarkupError, Result};

/// Parse a single-rooted markup fragment into an owned [`Element`] tree.
///
/// Declarations, comments, processing instructions and doctypes are skipped.
/// Whitespace around the root is ignored; any other content outside it is an
/// error, as is an element left open at end of input.
pub fn parse_fragment(markup: &str) -> Result<Element> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::with_capacity(8);
    let mut root: Option<Element> = None;
    let mut entity_buf = String::with_capacity(16);

    loop {
        let event = reader.read_event().map_err(|err| MarkupError::Syntax {
            position: reader.error_position() as u64,
            message: err.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                let element = element_from_start(&reader, &e)?;
                if root.is_some() {
                    return Err(MarkupError::TrailingContent(element.name));
                }
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = element_from_start(&reader, &e)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                // quick-xml has already matched the end name against the open tag.
                let element = stack.pop().ok_or_else(|| syntax(&reader, "unexpected end tag"))?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                let text = e.decode().map_err(|err| syntax(&reader, err))?;
                push_text(&text, &mut stack)?;
            }
            Event::CData(e) => {
                let text = reader.decoder().decode(&e).map_err(|err| syntax(&reader, err))?;
                push_text(&text, &mut stack)?;
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|err| syntax(&reader, err))?;
                entity_buf.clear();
                entity_buf.push('&');
                entity_buf.push_str(&name);
                entity_buf.push(';');
                let resolved =
                    quick_xml::escape::unescape(&entity_buf).map_err(|err| syntax(&reader, err))?;
                push_text(&resolved, &mut stack)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(MarkupError::Unclosed(open.name));
    }
    root.ok_or(MarkupError::Empty)
}

fn element_from_start(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element> {
    let decoder = reader.decoder();
    let qname = start.name();
    let name = decoder
        .decode(qname.as_ref())
        .map_err(|err| syntax(reader, err))?;
    let mut element = Element::new(name.as_ref());

    for attr in start.attributes() {
        let attr = attr.map_err(|err| syntax(reader, err))?;
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|err| syntax(reader, err))?;
        let raw = decoder.decode(&attr.value).map_err(|err| syntax(reader, err))?;
        let value: Cow<'_, str> =
            quick_xml::escape::unescape(&raw).map_err(|err| syntax(reader, err))?;
        element.set_attr(key.as_ref(), value.as_ref());
    }

    Ok(element)
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(MarkupError::TrailingContent(element.name)),
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(text: &str, stack: &mut [Element]) -> Result<()> {
    match stack.last_mut() {
        Some(current) => current.append_text(text),
        None if text.trim().is_empty() => {}
        None => return Err(MarkupError::TrailingContent(text.to_string())),
    }
    Ok(())
}

fn syntax(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> MarkupError {
    MarkupError::Syntax {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}
