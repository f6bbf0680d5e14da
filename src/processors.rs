use crate::error::{ConvertError, Result};
use crate::types::Document;

/// A pipeline stage that receives completed documents one at a time.
pub trait RecordProcessor {
    fn process(&mut self, document: Document) -> Result<()>;

    /// Pushes out anything still buffered. Called once when the input ends,
    /// however it ends.
    fn flush(&mut self) -> Result<()>;
}

/// Consumes a whole batch of documents at once.
pub trait BatchProcessor {
    fn process(&mut self, batch: Vec<Document>) -> Result<()>;
}

impl<P: RecordProcessor + ?Sized> RecordProcessor for &mut P {
    fn process(&mut self, document: Document) -> Result<()> {
        (**self).process(document)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<P: RecordProcessor + ?Sized> RecordProcessor for Box<P> {
    fn process(&mut self, document: Document) -> Result<()> {
        (**self).process(document)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Keeps every document in memory.
impl RecordProcessor for Vec<Document> {
    fn process(&mut self, document: Document) -> Result<()> {
        self.push(document);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<B: BatchProcessor + ?Sized> BatchProcessor for &mut B {
    fn process(&mut self, batch: Vec<Document>) -> Result<()> {
        (**self).process(batch)
    }
}

impl<B: BatchProcessor + ?Sized> BatchProcessor for Box<B> {
    fn process(&mut self, batch: Vec<Document>) -> Result<()> {
        (**self).process(batch)
    }
}

/// Forwards documents and reports [`ConvertError::LimitReached`] once
/// `max_records` of them went through. A limit of 0 never triggers.
#[derive(Debug)]
pub struct RecordLimiter<P> {
    inner: P,
    max_records: usize,
    record_count: usize,
}

impl<P: RecordProcessor> RecordLimiter<P> {
    pub fn new(inner: P, max_records: usize) -> Self {
        Self {
            inner,
            max_records,
            record_count: 0,
        }
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: RecordProcessor> RecordProcessor for RecordLimiter<P> {
    fn process(&mut self, document: Document) -> Result<()> {
        self.inner.process(document)?;
        self.record_count += 1;
        if self.record_count == self.max_records {
            return Err(ConvertError::LimitReached {
                count: self.record_count,
            });
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// Collects documents and hands them on in batches of `batch_size`.
#[derive(Debug)]
pub struct Batcher<B> {
    batch_processor: B,
    batch: Vec<Document>,
    batch_size: usize,
}

impl<B: BatchProcessor> Batcher<B> {
    /// A `batch_size` of 0 is treated as 1.
    pub fn new(batch_size: usize, batch_processor: B) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_processor,
            batch: Vec::with_capacity(batch_size),
            batch_size,
        }
    }

    pub fn pending(&self) -> &[Document] {
        &self.batch
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn batch_processor(&self) -> &B {
        &self.batch_processor
    }

    pub fn into_batch_processor(self) -> B {
        self.batch_processor
    }
}

impl<B: BatchProcessor> RecordProcessor for Batcher<B> {
    fn process(&mut self, document: Document) -> Result<()> {
        self.batch.push(document);
        if self.batch.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        tracing::debug!("flushing batch of {} records", self.batch.len());
        let batch = std::mem::replace(&mut self.batch, Vec::with_capacity(self.batch_size));
        self.batch_processor.process(batch)
    }
}
