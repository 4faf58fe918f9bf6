//! XML roster reader.
//!
//! Records are `<user>` elements at any depth. Child elements map onto
//! record fields by name; absent children stay empty strings.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::models::{SourceFormat, UserRecord};

use super::{ReadError, RecordSource};

/// Offset-addressed reader for XML roster files.
pub struct XmlRecordSource {
    path: PathBuf,
}

impl XmlRecordSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open_reader(&self) -> Result<Reader<BufReader<File>>, ReadError> {
        let file = File::open(&self.path)?;
        Ok(Reader::from_reader(BufReader::new(file)))
    }
}

#[async_trait::async_trait]
impl RecordSource for XmlRecordSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Xml
    }

    fn source_path(&self) -> &Path {
        &self.path
    }

    /// Count the `<user>` elements the batch reader yields: any depth,
    /// except that a `user` nested inside an open record belongs to that
    /// record rather than starting one of its own.
    async fn total_rows(&self) -> Result<usize, ReadError> {
        let mut reader = self.open_reader()?;
        let mut buf = Vec::with_capacity(8192);
        let mut in_record = false;
        let mut count = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    if e.name().as_ref() == b"user" && !in_record {
                        in_record = true;
                        count += 1;
                    }
                }
                Event::Empty(ref e) => {
                    if e.name().as_ref() == b"user" && !in_record {
                        count += 1;
                    }
                }
                Event::End(ref e) => {
                    if e.name().as_ref() == b"user" {
                        in_record = false;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(count)
    }

    async fn read_batch(&self, offset: usize, limit: usize) -> Result<Vec<UserRecord>, ReadError> {
        let mut reader = self.open_reader()?;
        let mut buf = Vec::with_capacity(8192);
        let mut text_buf = String::new();
        let mut current_element: Option<String> = None;
        let mut current: Option<UserRecord> = None;
        let mut record_index = 0usize;
        let mut records = Vec::new();

        if limit == 0 {
            return Ok(records);
        }

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if name == "user" && current.is_none() {
                        current = Some(UserRecord::default());
                    } else if current.is_some() {
                        match name.as_str() {
                            "username" | "email" | "first_name" | "last_name" | "role" => {
                                current_element = Some(name);
                                text_buf.clear();
                            }
                            _ => {}
                        }
                    }
                }
                Event::Empty(ref e) => {
                    // A self-closing <user/> is a record with every field empty
                    if e.name().as_ref() == b"user" && current.is_none() {
                        if record_index >= offset {
                            records.push(UserRecord::default());
                        }
                        record_index += 1;
                        if records.len() == limit {
                            break;
                        }
                    }
                }
                Event::Text(ref e) => {
                    if current_element.is_some() {
                        if let Ok(text) = e.unescape() {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::CData(ref e) => {
                    if current_element.is_some() {
                        if let Ok(text) = String::from_utf8(e.to_vec()) {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    match name.as_str() {
                        "user" => {
                            if let Some(record) = current.take() {
                                if record_index >= offset {
                                    records.push(record);
                                }
                                record_index += 1;
                                if records.len() == limit {
                                    break;
                                }
                            }
                        }
                        "username" | "email" | "first_name" | "last_name" | "role" => {
                            if let Some(ref mut record) = current {
                                if current_element.as_deref() == Some(name.as_str()) {
                                    match name.as_str() {
                                        "username" => record.username = text_buf.clone(),
                                        "email" => record.email = text_buf.clone(),
                                        "first_name" => record.first_name = text_buf.clone(),
                                        "last_name" => record.last_name = text_buf.clone(),
                                        "role" => record.role = text_buf.clone(),
                                        _ => {}
                                    }
                                }
                            }
                            current_element = None;
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }

            buf.clear();
        }

        Ok(records)
    }
}
