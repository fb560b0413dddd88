//! CSV output format writer.

use crate::classifier::Prediction;
use crate::constants::score::DECIMAL_PLACES;
use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV format output writer for classified branches.
pub struct CsvWriter {
    writer: BufWriter<File>,
}

impl CsvWriter {
    /// Create a new CSV writer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Write the header row.
    pub fn write_header(&mut self) -> Result<()> {
        writeln!(
            self.writer,
            "Taxon ID,Name,Rank,Rank level,Combined score,Vision score,Frequency score,Ancestors"
        )?;
        Ok(())
    }

    /// Write one branch level.
    pub fn write_prediction(&mut self, prediction: &Prediction) -> Result<()> {
        write!(
            self.writer,
            "{},{},{},{},{:.decimal$},{:.decimal$},",
            escape_csv(&prediction.taxon_id),
            escape_csv(&prediction.name),
            prediction.rank_name,
            prediction.rank_level,
            prediction.combined_score,
            prediction.vision_score,
            decimal = DECIMAL_PLACES,
        )?;
        if let Some(frequency) = prediction.frequency_score {
            write!(self.writer, "{frequency:.decimal$}", decimal = DECIMAL_PLACES)?;
        }
        writeln!(
            self.writer,
            ",{}",
            escape_csv(&prediction.ancestor_ids.join("|"))
        )?;
        Ok(())
    }

    /// Flush buffered rows to disk.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
