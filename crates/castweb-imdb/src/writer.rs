use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsvWriterConfig {
    #[serde(default = "default_csv_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub escape: Option<char>,
    #[serde(default)]
    pub flexible: bool,
    #[serde(default = "default_csv_terminator")]
    pub terminator: CsvTerminator,
}

impl Default for CsvWriterConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            escape: None,
            flexible: false,
            terminator: CsvTerminator::Any('\n'),
        }
    }
}

fn default_csv_delimiter() -> char {
    CsvWriterConfig::default().delimiter
}

fn default_csv_terminator() -> CsvTerminator {
    CsvWriterConfig::default().terminator
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CsvTerminator {
    CRLF,
    Any(char),
}

impl From<CsvTerminator> for csv::Terminator {
    fn from(source: CsvTerminator) -> Self {
        match source {
            CsvTerminator::CRLF => Self::CRLF,
            CsvTerminator::Any(c) => Self::Any(c as u8),
        }
    }
}

impl From<&CsvWriterConfig> for csv::WriterBuilder {
    fn from(c: &CsvWriterConfig) -> Self {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(c.delimiter as u8);
        builder.terminator(c.terminator.into());
        builder.flexible(c.flexible);
        if let Some(escape) = c.escape {
            builder.double_quote(false);
            builder.escape(escape as u8);
        } else {
            builder.double_quote(true);
        }
        builder
    }
}

/// How an output file is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum FileMode {
    /// Fails if the file already exists
    #[default]
    Create,
    Append,
    Truncate,
}

impl From<FileMode> for fs_err::OpenOptions {
    fn from(mode: FileMode) -> Self {
        let mut opts = fs_err::OpenOptions::new();
        match mode {
            FileMode::Create => opts.write(true).create_new(true),
            FileMode::Append => opts.append(true).create(true),
            FileMode::Truncate => opts.write(true).create(true).truncate(true),
        };
        opts
    }
}

pub enum CsvWriter {
    File(csv::Writer<fs_err::File>),
    Stdout(csv::Writer<io::Stdout>),
}

impl CsvWriter {
    /// Opens the output table, the header row is skipped when appending to a non empty file
    pub fn open(
        path: Option<&Path>,
        mode: FileMode,
        config: &CsvWriterConfig,
    ) -> anyhow::Result<Self> {
        let mut builder = csv::WriterBuilder::from(config);
        match path {
            Some(path) => {
                let has_content = mode == FileMode::Append
                    && fs_err::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
                builder.has_headers(!has_content);
                let opts: fs_err::OpenOptions = mode.into();
                Ok(Self::File(builder.from_writer(opts.open(path)?)))
            }
            None => Ok(Self::Stdout(builder.from_writer(io::stdout()))),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(wtr) => wtr.flush(),
            Self::Stdout(wtr) => wtr.flush(),
        }
    }

    pub fn serialize<T: Serialize>(&mut self, record: T) -> csv::Result<()> {
        match self {
            Self::File(wtr) => wtr.serialize(record),
            Self::Stdout(wtr) => wtr.serialize(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Credit;

    fn write_credits(path: &Path, mode: FileMode, credits: &[Credit]) {
        let mut wtr = CsvWriter::open(Some(path), mode, &CsvWriterConfig::default()).unwrap();
        for credit in credits {
            wtr.serialize(credit).unwrap();
        }
        wtr.flush().unwrap();
    }

    #[test]
    fn header_names_both_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits.csv");

        write_credits(
            &path,
            FileMode::Create,
            &[Credit::new("Jane Doe", "Show A, the \"pilot\"")],
        );

        let content = fs_err::read_to_string(&path).unwrap();
        assert_eq!(
            "actor/actress,movie_or_TV_name\nJane Doe,\"Show A, the \"\"pilot\"\"\"\n",
            content
        );
    }

    #[test]
    fn create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits.csv");
        fs_err::write(&path, "").unwrap();

        let res = CsvWriter::open(Some(&path), FileMode::Create, &CsvWriterConfig::default());
        assert!(res.is_err());
    }

    #[test]
    fn append_skips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits.csv");

        write_credits(&path, FileMode::Append, &[Credit::new("Jane Doe", "Show A")]);
        write_credits(&path, FileMode::Append, &[Credit::new("Jane Doe", "Show B")]);

        let content = fs_err::read_to_string(&path).unwrap();
        assert_eq!(
            "actor/actress,movie_or_TV_name\nJane Doe,Show A\nJane Doe,Show B\n",
            content
        );
    }

    #[test]
    fn tab_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits.tsv");
        let config = CsvWriterConfig {
            delimiter: '\t',
            ..Default::default()
        };

        let mut wtr = CsvWriter::open(Some(&path), FileMode::Truncate, &config).unwrap();
        wtr.serialize(Credit::new("Jane Doe", "Show A")).unwrap();
        wtr.flush().unwrap();
        drop(wtr);

        let content = fs_err::read_to_string(&path).unwrap();
        assert_eq!("actor/actress\tmovie_or_TV_name\nJane Doe\tShow A\n", content);
    }
}
