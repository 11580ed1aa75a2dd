//! Reads an SMS backup export into raw message bodies.
//!
//! The document root holds repeated `<sms>` elements. A message body is taken
//! from the `body` attribute when present, otherwise from the text of a
//! `<body>` child element:
//!
//! ```xml
//! <smses>
//!   <sms address="M-Money" body="You have received 5,000 RWF from John Doe." />
//!   <sms><body>You have received 2,000 RWF from Jane Smith.</body></sms>
//! </smses>
//! ```

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

const MESSAGE_TAG: &[u8] = b"sms";
const BODY_TAG: &[u8] = b"body";

/// One message body, tagged with its position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub index: usize,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Input document not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("Document has no root element")]
    NoRoot,
}

/// Read and parse the document at `path`.
pub fn load_file(path: &Path) -> Result<Vec<RawMessage>, SourceError> {
    let xml = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
        _ => SourceError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    parse_document(&xml)
}

/// Message under construction while its `<sms>` element is open.
struct OpenMessage {
    body: Option<String>,
    in_body: bool,
    text: String,
}

pub fn parse_document(xml: &str) -> Result<Vec<RawMessage>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut messages = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut open: Option<OpenMessage> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_error(&reader, e))?;

        match event {
            Event::Start(e) => {
                depth += 1;
                seen_root = true;
                if depth == 2 && e.name().as_ref() == MESSAGE_TAG {
                    open = Some(OpenMessage {
                        body: body_attribute(&reader, &e)?,
                        in_body: false,
                        text: String::new(),
                    });
                } else if depth == 3 && e.name().as_ref() == BODY_TAG {
                    if let Some(msg) = open.as_mut().filter(|m| m.body.is_none()) {
                        msg.in_body = true;
                    }
                }
            }
            Event::Empty(e) => {
                seen_root = true;
                if depth == 1 && e.name().as_ref() == MESSAGE_TAG {
                    let body = body_attribute(&reader, &e)?.unwrap_or_default();
                    messages.push(RawMessage {
                        index: messages.len(),
                        body,
                    });
                } else if depth == 2 && e.name().as_ref() == BODY_TAG {
                    if let Some(msg) = open.as_mut().filter(|m| m.body.is_none()) {
                        msg.body = Some(String::new());
                    }
                }
            }
            Event::Text(t) => {
                if let Some(msg) = open.as_mut().filter(|m| m.in_body) {
                    let text = t.unescape().map_err(|e| xml_error(&reader, e))?;
                    msg.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(msg) = open.as_mut().filter(|m| m.in_body) {
                    msg.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                if depth == 3 {
                    if let Some(msg) = open.as_mut().filter(|m| m.in_body) {
                        msg.in_body = false;
                        msg.body = Some(msg.text.trim().to_string());
                    }
                } else if depth == 2 {
                    if let Some(msg) = open.take() {
                        messages.push(RawMessage {
                            index: messages.len(),
                            body: msg.body.unwrap_or_default(),
                        });
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(SourceError::NoRoot);
    }
    if depth != 0 {
        return Err(SourceError::Xml {
            position: reader.buffer_position() as u64,
            message: "unexpected end of document".to_string(),
        });
    }

    Ok(messages)
}

fn body_attribute(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<Option<String>, SourceError> {
    let attr = e
        .try_get_attribute("body")
        .map_err(|err| xml_error(reader, err))?;
    match attr {
        Some(a) => {
            let value = a.unescape_value().map_err(|err| xml_error(reader, err))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> SourceError {
    SourceError::Xml {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}
