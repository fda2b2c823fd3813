//! XML to [`Node`] decoding.
//!
//! Follows the usual XML-to-dict conventions: attributes become `@name`
//! keys, text next to attributes or children becomes `#text`, repeated
//! child tags become lists and empty elements become [`Node::Null`].

use crate::errors::AppError;
use crate::value::{Fields, Node};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Root element of a successful Finstat detail response.
pub const DETAIL_RESULT: &str = "DetailResult";

struct Frame {
    name: String,
    fields: Fields,
    has_children: bool,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, AppError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut fields = Fields::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr.unescape_value()?.into_owned();
            fields.insert(key, Node::Text(value));
        }
        Ok(Self {
            name,
            fields,
            has_children: false,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Node) {
        let text = self.text.trim();
        let node = if self.fields.is_empty() && !self.has_children {
            if text.is_empty() {
                Node::Null
            } else {
                Node::Text(text.to_string())
            }
        } else {
            let mut fields = self.fields;
            if !text.is_empty() {
                fields.insert("#text", Node::Text(text.to_string()));
            }
            Node::Map(fields)
        };
        (self.name, node)
    }
}

/// Parses an XML document into a single-entry map `{root: node}`.
pub fn parse_document(xml: &str) -> Result<Fields, AppError> {
    // Text pieces around child elements are joined untrimmed and trimmed
    // once when the element closes.
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Frame> = Vec::new();
    let mut document = Fields::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                let frame = Frame::open(&start)?;
                attach(&mut stack, &mut document, frame.close());
            }
            Event::End(_) => {
                let frame = stack.pop().ok_or_else(|| {
                    AppError::ResponseFormatError("unexpected closing tag".to_string())
                })?;
                attach(&mut stack, &mut document, frame.close());
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(AppError::ResponseFormatError(
            "document ended before all elements were closed".to_string(),
        ));
    }
    if document.is_empty() {
        return Err(AppError::ResponseFormatError(
            "document has no root element".to_string(),
        ));
    }
    Ok(document)
}

fn attach(stack: &mut [Frame], document: &mut Fields, (name, node): (String, Node)) {
    match stack.last_mut() {
        Some(parent) => parent.fields.push_child(name, node),
        None => document.push_child(name, node),
    }
}

/// Decodes a Finstat response body and returns its `DetailResult` mapping.
pub fn extract_detail_result(xml: &str) -> Result<Fields, AppError> {
    let mut document = parse_document(xml)?;
    match document.shift_remove(DETAIL_RESULT) {
        Some(Node::Map(fields)) => Ok(fields),
        Some(_) => Err(AppError::ResponseFormatError(format!(
            "{} element has no content",
            DETAIL_RESULT
        ))),
        None => Err(AppError::ResponseFormatError(format!(
            "response has no {} element",
            DETAIL_RESULT
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DetailResult xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <Ico>35757442</Ico>
  <Name>Finstat s.r.o.</Name>
  <Street />
  <Activity>Software &amp; services</Activity>
  <Address>
    <City>Bratislava</City>
    <ZipCode>82109</ZipCode>
  </Address>
  <Revenue currency="EUR">1200</Revenue>
  <Phone>+421 1</Phone>
  <Phone>+421 2</Phone>
</DetailResult>"#;

    #[test]
    fn test_detail_result_structure() {
        let detail = extract_detail_result(SAMPLE).unwrap();

        assert_eq!(
            detail.get("@xmlns:xsi").and_then(Node::as_text),
            Some("http://www.w3.org/2001/XMLSchema-instance")
        );
        assert_eq!(detail.get("Ico"), Some(&Node::from("35757442")));
        assert_eq!(detail.get("Street"), Some(&Node::Null));
        assert_eq!(detail.get("Activity"), Some(&Node::from("Software & services")));

        let address = detail.get("Address").and_then(Node::as_map).unwrap();
        assert_eq!(address.get("City"), Some(&Node::from("Bratislava")));

        let revenue = detail.get("Revenue").and_then(Node::as_map).unwrap();
        assert_eq!(revenue.get("@currency"), Some(&Node::from("EUR")));
        assert_eq!(revenue.get("#text"), Some(&Node::from("1200")));

        assert_eq!(
            detail.get("Phone"),
            Some(&Node::List(vec![Node::from("+421 1"), Node::from("+421 2")]))
        );
    }

    #[test]
    fn test_keeps_document_order() {
        let detail = extract_detail_result(SAMPLE).unwrap();
        let keys: Vec<&str> = detail.keys().collect();

        assert_eq!(
            keys,
            vec!["@xmlns:xsi", "Ico", "Name", "Street", "Activity", "Address", "Revenue", "Phone"]
        );
    }

    #[test]
    fn test_cdata_is_text() {
        let detail =
            extract_detail_result("<DetailResult><Note><![CDATA[a < b]]></Note></DetailResult>")
                .unwrap();
        assert_eq!(detail.get("Note"), Some(&Node::from("a < b")));
    }

    #[test]
    fn test_mixed_content_text_is_joined_then_trimmed() {
        let detail =
            extract_detail_result("<DetailResult><A>foo <b/> bar</A></DetailResult>").unwrap();
        let a = detail.get("A").and_then(Node::as_map).unwrap();

        assert_eq!(a.get("#text"), Some(&Node::from("foo  bar")));
        assert_eq!(a.get("b"), Some(&Node::Null));
    }

    #[test]
    fn test_whitespace_between_elements_is_dropped() {
        let detail = extract_detail_result(SAMPLE).unwrap();
        let address = detail.get("Address").and_then(Node::as_map).unwrap();

        assert!(!detail.contains_key("#text"));
        assert!(!address.contains_key("#text"));
        assert_eq!(detail.get("Name"), Some(&Node::from("Finstat s.r.o.")));
    }

    #[test]
    fn test_missing_detail_result() {
        let err = extract_detail_result("<Error><Message>nope</Message></Error>").unwrap_err();
        assert!(matches!(err, AppError::ResponseFormatError(_)));
    }

    #[test]
    fn test_empty_detail_result_rejected() {
        let err = extract_detail_result("<DetailResult/>").unwrap_err();
        assert!(matches!(err, AppError::ResponseFormatError(_)));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(extract_detail_result("<DetailResult><Ico>1</Name></DetailResult>").is_err());
        assert!(extract_detail_result("<DetailResult><Ico>1</Ico>").is_err());
        assert!(extract_detail_result("not xml at all").is_err());
    }
}
