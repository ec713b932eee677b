//! Fragment serialization with `quick-xml`.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{Element, MarkupError, Result};

pub(super) fn write_fragment(root: &Element) -> Result<String> {
    let mut writer = Writer::new(Vec::with_capacity(256));
    write_element(&mut writer, root, false)?;
    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element, with_tail: bool) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in element.attributes() {
        start.push_attribute((key, value));
    }

    let text = element.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
    } else {
        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &element.children {
            write_element(writer, child, true)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(element.name.as_str())))
            .map_err(write_error)?;
    }

    if with_tail {
        if let Some(tail) = element.tail.as_deref().filter(|t| !t.is_empty()) {
            writer
                .write_event(Event::Text(BytesText::new(tail)))
                .map_err(write_error)?;
        }
    }
    Ok(())
}

fn write_error(err: impl std::fmt::Display) -> MarkupError {
    MarkupError::Write(err.to_string())
}
