use crate::domain::model::PlatformSolicitation;
use crate::utils::error::{Result, SearchError};

const EXPORT_HEADERS: [&str; 7] = [
    "id",
    "title",
    "agency",
    "platform",
    "posted_date",
    "due_date",
    "url",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Tsv,
}

impl OutputFormat {
    fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// 將搜尋結果轉成輸出格式的位元組
pub fn render(records: &[PlatformSolicitation], format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(records)?),
        OutputFormat::Csv | OutputFormat::Tsv => render_delimited(records, format.delimiter()),
    }
}

fn render_delimited(records: &[PlatformSolicitation], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;
    for record in records {
        writer.write_record([
            record.id.as_str(),
            record.title.as_str(),
            record.agency.as_str(),
            record.platform.as_str(),
            record.posted_date.as_str(),
            record.due_date.as_deref().unwrap_or(""),
            record.url.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| SearchError::IoError(e.into_error()))
}
