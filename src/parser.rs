use crate::builder::{CategoryReentry, RecordBuilder};
use crate::error::{ConvertError, Result};
use crate::hierarchy::{HierarchyValidator, Level};
use crate::processors::RecordProcessor;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// What to do when the input turns out to be malformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Flush what was completed, then return the error.
    #[default]
    Propagate,
    /// Flush what was completed, log the error and report an aborted parse.
    LogAndStop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub category_reentry: CategoryReentry,
    pub error_policy: ErrorPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfInput,
    LimitReached { count: usize },
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Documents completed and handed to the pipeline.
    pub records: usize,
    pub stop: StopReason,
}

/// Routes start/end/text events through the hierarchy validator and the
/// record builder. Knows nothing about XML bytes; [`FileProcessor`] feeds it.
#[derive(Debug, Default)]
pub struct ComplexXmlHandler {
    validator: HierarchyValidator,
    builder: RecordBuilder,
    records: usize,
    pipeline_failed: bool,
    root_seen: bool,
}

impl ComplexXmlHandler {
    pub fn new(category_reentry: CategoryReentry) -> Self {
        Self {
            builder: RecordBuilder::new(category_reentry),
            ..Self::default()
        }
    }

    pub fn validator(&self) -> &HierarchyValidator {
        &self.validator
    }

    pub fn builder(&self) -> &RecordBuilder {
        &self.builder
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// True once a downstream stage failed with something other than the
    /// record limit.
    pub fn pipeline_failed(&self) -> bool {
        self.pipeline_failed
    }

    pub fn accepts_text(&self) -> bool {
        self.validator.current() == Some(Level::Field)
    }

    pub fn start_element(&mut self, name: &[u8], id: Option<&str>, position: u64) -> Result<()> {
        let level = self.validator.check_start(name, position)?;
        let require_id = || {
            id.ok_or(ConvertError::MissingAttribute {
                element: level.tag(),
                attribute: "id",
                position,
            })
        };

        match level {
            Level::Container => {}
            Level::Record => self.builder.start_record(require_id()?),
            Level::Category => self.builder.start_category(require_id()?),
            Level::Subcategory => self.builder.start_subcategory(require_id()?),
            Level::Field => self.builder.start_field(require_id()?),
            Level::LineBreak => {
                if !self.builder.line_break() {
                    return Err(ConvertError::structural(
                        "<ujsor> before any <mezo> in this <alrovat>",
                        position,
                    ));
                }
            }
        }

        if level == Level::Container {
            self.root_seen = true;
        }
        self.validator.enter(level);
        Ok(())
    }

    pub fn end_element<P>(&mut self, name: &[u8], position: u64, processor: &mut P) -> Result<()>
    where
        P: RecordProcessor + ?Sized,
    {
        let level = self.validator.check_end(name, position)?;
        let completed = match level {
            Level::Record => self.complete_record(processor),
            _ => Ok(()),
        };
        self.validator.leave();
        completed
    }

    /// Called at end of input; fails if the root never opened or some
    /// element is still open.
    pub fn end_document(&self, position: u64) -> Result<()> {
        if let Some(level) = self.validator.current() {
            return Err(ConvertError::structural(
                format!("unexpected end of input inside <{}>", level.tag()),
                position,
            ));
        }
        if !self.root_seen {
            return Err(ConvertError::structural(
                format!("no <{}> element found", Level::Container.tag()),
                position,
            ));
        }
        Ok(())
    }

    pub fn characters(&mut self, text: &str) {
        if self.accepts_text() {
            self.builder.append_text(text);
        }
    }

    fn complete_record<P>(&mut self, processor: &mut P) -> Result<()>
    where
        P: RecordProcessor + ?Sized,
    {
        let Some(document) = self.builder.finish_record() else {
            return Ok(());
        };
        self.records += 1;
        processor.process(document).inspect_err(|err| {
            if !err.is_limit_reached() {
                self.pipeline_failed = true;
            }
        })
    }
}

fn id_attribute(start: &BytesStart<'_>, decoder: Decoder) -> Result<Option<String>> {
    let Some(attr) = start
        .try_get_attribute("id")
        .map_err(quick_xml::Error::from)?
    else {
        return Ok(None);
    };
    Ok(Some(attr.decode_and_unescape_value(decoder)?.into_owned()))
}

/// Streams one complex export through the handler into a record pipeline.
#[derive(Debug)]
pub struct FileProcessor<P> {
    processor: P,
    options: ParseOptions,
}

impl<P: RecordProcessor> FileProcessor<P> {
    pub fn new(processor: P) -> Self {
        Self::with_options(processor, ParseOptions::default())
    }

    pub fn with_options(processor: P, options: ParseOptions) -> Self {
        Self { processor, options }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn into_processor(self) -> P {
        self.processor
    }

    /// Parses `input` and flushes the pipeline afterwards, whether the input
    /// ended, the record limit was hit, or the input was malformed.
    ///
    /// Failures of the pipeline itself (writing, schema lookups) skip the
    /// flush and are always returned.
    pub fn process<R: BufRead>(&mut self, input: R) -> Result<ParseOutcome> {
        let mut handler = ComplexXmlHandler::new(self.options.category_reentry);
        let parsed = self.parse(input, &mut handler);

        if handler.pipeline_failed() {
            return match parsed {
                Err(err) => Err(err),
                Ok(()) => Ok(ParseOutcome {
                    records: handler.records(),
                    stop: StopReason::EndOfInput,
                }),
            };
        }

        let flushed = self.processor.flush();
        let stop = match parsed {
            Ok(()) => StopReason::EndOfInput,
            Err(ConvertError::LimitReached { count }) => {
                tracing::info!("Stopping after {} records", count);
                StopReason::LimitReached { count }
            }
            Err(err) => {
                if let Err(flush_err) = &flushed {
                    tracing::error!("Flush after failed parse also failed: {}", flush_err);
                }
                match self.options.error_policy {
                    ErrorPolicy::Propagate => return Err(err),
                    ErrorPolicy::LogAndStop => {
                        tracing::error!("Error during parsing: {}", err);
                        StopReason::Aborted(err.to_string())
                    }
                }
            }
        };
        flushed?;

        Ok(ParseOutcome {
            records: handler.records(),
            stop,
        })
    }

    pub fn process_str(&mut self, xml: &str) -> Result<ParseOutcome> {
        self.process(xml.as_bytes())
    }

    fn parse<R: BufRead>(&mut self, input: R, handler: &mut ComplexXmlHandler) -> Result<()> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text(false);
        // nesting, end tags included, is checked by the hierarchy validator
        reader.config_mut().check_end_names = false;

        let mut buf = Vec::new();
        loop {
            let position = reader.buffer_position() as u64;
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref start) => {
                    let id = id_attribute(start, reader.decoder())?;
                    handler.start_element(start.local_name().into_inner(), id.as_deref(), position)?;
                }
                Event::Empty(ref start) => {
                    let name = start.local_name().into_inner();
                    let id = id_attribute(start, reader.decoder())?;
                    handler.start_element(name, id.as_deref(), position)?;
                    handler.end_element(name, position, &mut self.processor)?;
                }
                Event::End(ref end) => {
                    handler.end_element(end.local_name().into_inner(), position, &mut self.processor)?;
                }
                Event::Text(ref text) => {
                    if handler.accepts_text() {
                        handler.characters(&text.unescape()?);
                    }
                }
                Event::CData(ref cdata) => {
                    if handler.accepts_text() {
                        let text = reader
                            .decoder()
                            .decode(cdata)
                            .map_err(quick_xml::Error::from)?;
                        handler.characters(&text);
                    }
                }
                Event::Eof => {
                    handler.end_document(position)?;
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }
}
