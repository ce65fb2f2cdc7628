//! Doc-values writer: field dispatch and segment lifecycle.
//!
//! One writer per segment. The caller adds each field exactly once, in its
//! own order, then calls [`DocValuesWriter::finish`] to emit the metadata
//! sentinel and both stream trailers. All writes are sequential and in
//! strict program order; every offset recorded in the metadata stream is
//! the data stream's position at the moment of recording.
//!
//! Sorted and SortedSet columns are routed through the numeric pipeline
//! (their ordinals) plus the term-dictionary encoder. A SortedSet field
//! where no document has more than one value collapses to the Sorted
//! layout behind a one-byte marker.

use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use std::io::Write;

use crate::binary;
use crate::cursor::{
    BinarySource, MinValueCursor, NumericSource, SortedSetSource, SortedSource, TermCursor,
    TermDictSource, ValueCursor,
};
use crate::error::Result;
use crate::format::{
    BINARY, DATA_CODEC, DIRECT_MONOTONIC_BLOCK_SHIFT, META_CODEC, NUMERIC, SORTED, SORTED_NUMERIC,
    SORTED_SET, VERSION_CURRENT,
};
use crate::framing;
use crate::numeric;
use crate::output::{DataOutput, write_vint};
use crate::packed::MonotonicWriter;
use crate::presence::DEFAULT_DENSE_RANK_POWER;
use crate::terms;

/// Initial capacity of the shared term-dictionary scratch buffer; it grows
/// geometrically and is reused across fields.
const TERMS_DICT_SCRATCH_CAPACITY: usize = 1 << 14;

#[derive(Debug, Clone)]
pub struct DocValuesWriterConfig {
    /// Rank granularity handed to the presence-bitmap serializer.
    pub dense_rank_power: u8,
}

impl Default for DocValuesWriterConfig {
    fn default() -> Self {
        Self {
            dense_rank_power: DEFAULT_DENSE_RANK_POWER,
        }
    }
}

/// Writes the doc-values column store of one segment.
pub struct DocValuesWriter<D: Write, M: Write> {
    data: DataOutput<D>,
    meta: DataOutput<M>,
    max_doc: u32,
    dense_rank_power: u8,
    terms_dict_scratch: Vec<u8>,
}

impl<D: Write, M: Write> DocValuesWriter<D, M> {
    pub fn new(
        data: D,
        meta: M,
        segment_id: &[u8; framing::SEGMENT_ID_LEN],
        max_doc: u32,
    ) -> Result<Self> {
        Self::with_config(data, meta, segment_id, max_doc, DocValuesWriterConfig::default())
    }

    pub fn with_config(
        data: D,
        meta: M,
        segment_id: &[u8; framing::SEGMENT_ID_LEN],
        max_doc: u32,
        config: DocValuesWriterConfig,
    ) -> Result<Self> {
        let mut data = DataOutput::new(data);
        let mut meta = DataOutput::new(meta);
        framing::write_header(&mut data, DATA_CODEC, VERSION_CURRENT, segment_id)?;
        framing::write_header(&mut meta, META_CODEC, VERSION_CURRENT, segment_id)?;
        Ok(Self {
            data,
            meta,
            max_doc,
            dense_rank_power: config.dense_rank_power,
            terms_dict_scratch: Vec::with_capacity(TERMS_DICT_SCRATCH_CAPACITY),
        })
    }

    /// One signed 64-bit value per present document.
    pub fn add_numeric_field(
        &mut self,
        field_number: u32,
        source: &dyn NumericSource,
    ) -> Result<()> {
        debug!("field {}: numeric", field_number);
        self.write_field_header(field_number, NUMERIC)?;
        numeric::write_values(
            &mut self.data,
            &mut self.meta,
            source,
            self.max_doc,
            self.dense_rank_power,
            false,
        )?;
        Ok(())
    }

    /// One opaque byte string per present document.
    pub fn add_binary_field(&mut self, field_number: u32, source: &dyn BinarySource) -> Result<()> {
        debug!("field {}: binary", field_number);
        self.write_field_header(field_number, BINARY)?;
        binary::write_binary(
            &mut self.data,
            &mut self.meta,
            source,
            self.max_doc,
            self.dense_rank_power,
        )
    }

    /// One term per present document, stored as an ordinal into the field's
    /// term dictionary.
    pub fn add_sorted_field(&mut self, field_number: u32, source: &dyn SortedSource) -> Result<()> {
        debug!("field {}: sorted, {} terms", field_number, source.term_count());
        self.write_field_header(field_number, SORTED)?;
        self.write_sorted(source)
    }

    /// Zero or more signed 64-bit values per document.
    pub fn add_sorted_numeric_field(
        &mut self,
        field_number: u32,
        source: &dyn NumericSource,
    ) -> Result<()> {
        debug!("field {}: sorted numeric", field_number);
        self.write_field_header(field_number, SORTED_NUMERIC)?;
        self.write_sorted_numeric(source, false)
    }

    /// Zero or more terms per document, as ordinals into the term
    /// dictionary.
    pub fn add_sorted_set_field(
        &mut self,
        field_number: u32,
        source: &dyn SortedSetSource,
    ) -> Result<()> {
        debug!(
            "field {}: sorted set, {} terms",
            field_number,
            source.term_count()
        );
        self.write_field_header(field_number, SORTED_SET)?;

        if is_single_valued(source) {
            self.meta.write_u8(0)?; // multi_valued = false
            return self.write_sorted(&MinSortedView(source));
        }
        self.meta.write_u8(1)?; // multi_valued = true

        self.write_sorted_numeric(&OrdinalView(source), true)?;
        terms::write_terms_dict(
            &mut self.data,
            &mut self.meta,
            source,
            &mut self.terms_dict_scratch,
        )
    }

    /// Write the metadata sentinel and both trailers, returning the inner
    /// sinks. A writer that is dropped without `finish` leaves both streams
    /// without trailers, which no reader will accept.
    pub fn finish(mut self) -> Result<(D, M)> {
        self.meta.write_i32::<BigEndian>(-1)?; // end-of-fields sentinel
        framing::write_footer(&mut self.meta)?;
        framing::write_footer(&mut self.data)?;
        Ok((self.data.into_inner(), self.meta.into_inner()))
    }

    fn write_field_header(&mut self, field_number: u32, type_tag: u8) -> Result<()> {
        self.meta.write_i32::<BigEndian>(field_number as i32)?;
        self.meta.write_u8(type_tag)?;
        Ok(())
    }

    fn write_sorted(&mut self, source: &dyn SortedSource) -> Result<()> {
        numeric::write_values(
            &mut self.data,
            &mut self.meta,
            &SortedOrdinalView(source),
            self.max_doc,
            self.dense_rank_power,
            true,
        )?;
        terms::write_terms_dict(
            &mut self.data,
            &mut self.meta,
            source,
            &mut self.terms_dict_scratch,
        )
    }

    fn write_sorted_numeric(&mut self, source: &dyn NumericSource, ords: bool) -> Result<()> {
        let written = numeric::write_values(
            &mut self.data,
            &mut self.meta,
            source,
            self.max_doc,
            self.dense_rank_power,
            ords,
        )?;
        debug_assert!(written.num_values >= written.docs_with_value as u64);

        self.meta.write_i32::<BigEndian>(written.docs_with_value as i32)?;
        if written.num_values > written.docs_with_value as u64 {
            // per-doc slice boundaries into the flat value stream
            let start = self.data.position();
            self.meta.write_i64::<BigEndian>(start as i64)?;
            write_vint(&mut self.meta, DIRECT_MONOTONIC_BLOCK_SHIFT as u64)?;

            let mut addresses = MonotonicWriter::new(
                &mut self.meta,
                &mut self.data,
                written.docs_with_value as u64 + 1,
                DIRECT_MONOTONIC_BLOCK_SHIFT,
            );
            let mut addr = 0i64;
            addresses.add(addr)?;
            let mut cursor = source.cursor();
            while cursor.next_doc().is_some() {
                addr += cursor.value_count() as i64;
                addresses.add(addr)?;
            }
            addresses.finish()?;
            self.meta
                .write_i64::<BigEndian>((self.data.position() - start) as i64)?;
        }
        Ok(())
    }
}

fn is_single_valued(source: &dyn SortedSetSource) -> bool {
    let mut cursor = source.ordinals();
    while cursor.next_doc().is_some() {
        debug_assert!(cursor.value_count() > 0);
        if cursor.value_count() > 1 {
            return false;
        }
    }
    true
}

/// Ordinal stream of a Sorted source, viewed as a numeric source.
struct SortedOrdinalView<'a>(&'a dyn SortedSource);

impl NumericSource for SortedOrdinalView<'_> {
    fn cursor(&self) -> Box<dyn ValueCursor + '_> {
        self.0.ordinals()
    }
}

/// Ordinal stream of a SortedSet source, viewed as a numeric source.
struct OrdinalView<'a>(&'a dyn SortedSetSource);

impl NumericSource for OrdinalView<'_> {
    fn cursor(&self) -> Box<dyn ValueCursor + '_> {
        self.0.ordinals()
    }
}

/// Single-valued SortedSet viewed as a Sorted source over the per-doc
/// minimum ordinal.
struct MinSortedView<'a>(&'a dyn SortedSetSource);

impl TermDictSource for MinSortedView<'_> {
    fn terms(&self) -> Box<dyn TermCursor + '_> {
        self.0.terms()
    }

    fn term_count(&self) -> u64 {
        self.0.term_count()
    }
}

impl SortedSource for MinSortedView<'_> {
    fn ordinals(&self) -> Box<dyn ValueCursor + '_> {
        Box::new(MinValueCursor::new(self.0.ordinals()))
    }
}
