use crate::store::error::LogStoreError;
use crate::types::record::{Header, Record};
use log::{debug, info};
use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const TEMP_PREFIX: &str = ".meteolog-";
const TEMP_SUFFIX: &str = ".csv.tmp";

/// The on-disk CSV log: a header row followed by one row per [`Record`].
///
/// Every write goes through a temporary file in the same directory that is
/// renamed onto the target, so readers only ever see the old or the new file.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    header: Header,
}

/// A fully written temporary copy of the log that has not yet replaced the
/// target. Dropping it without [`StagedWrite::commit`] leaves the target
/// untouched and deletes the temporary file.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically renames the staged file onto the target.
    pub fn commit(self) -> Result<(), LogStoreError> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| LogStoreError::Persist(target.clone(), e.error))?;
        Ok(())
    }
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>, header: Header) -> Self {
        Self {
            path: path.into(),
            header,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file containing only the header if it doesn't exist yet.
    /// Returns whether the file was created. An existing file is never touched.
    pub fn ensure_initialized(&self) -> Result<bool, LogStoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        let staged = self.stage(&[])?;
        match staged.temp.persist_noclobber(&self.path) {
            Ok(_) => {
                info!("Created log file {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(LogStoreError::Persist(self.path.clone(), e.error)),
        }
    }

    /// Reads every well-formed record in file order.
    ///
    /// Rows that don't have exactly three fields, or whose readings can't be
    /// parsed, are skipped. A file whose first row isn't the expected header
    /// yields [`LogStoreError::HeaderMismatch`].
    pub fn read_all(&self) -> Result<Vec<Record>, LogStoreError> {
        let file =
            fs::File::open(&self.path).map_err(|e| LogStoreError::Read(self.path.clone(), e))?;
        self.parse(BufReader::new(file))
    }

    pub fn last_record(&self) -> Result<Option<Record>, LogStoreError> {
        Ok(self.read_all()?.pop())
    }

    /// Atomically replaces the whole file with the header plus `records`.
    pub fn replace_all(&self, records: &[Record]) -> Result<(), LogStoreError> {
        self.stage(records)?.commit()?;
        debug!(
            "Rewrote {} with {} records",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    /// Writes the header plus `records` to a temporary file beside the target
    /// without touching the target itself.
    pub fn stage(&self, records: &[Record]) -> Result<StagedWrite, LogStoreError> {
        let mut temp = self.temp_file()?;
        {
            let mut writer = Self::csv_writer(&mut temp);
            writer
                .write_record(self.header.columns())
                .map_err(|e| LogStoreError::CsvWrite(self.path.clone(), e))?;
            for record in records {
                writer
                    .write_record(record.to_row())
                    .map_err(|e| LogStoreError::CsvWrite(self.path.clone(), e))?;
            }
            writer
                .flush()
                .map_err(|e| LogStoreError::Write(self.path.clone(), e))?;
        }
        self.finish_staging(temp)
    }

    /// Appends a single record, keeping every existing byte of the file as is.
    ///
    /// The current contents are copied into a temporary file, the new row is
    /// added there and the copy is renamed over the original. A missing file
    /// is created with its header first.
    pub fn append_one(&self, record: &Record) -> Result<(), LogStoreError> {
        self.ensure_initialized()?;
        let existing =
            fs::read(&self.path).map_err(|e| LogStoreError::Read(self.path.clone(), e))?;
        self.check_header(existing.as_slice())?;

        let mut temp = self.temp_file()?;
        temp.write_all(&existing)
            .map_err(|e| LogStoreError::Write(self.path.clone(), e))?;
        if !existing.is_empty() && !existing.ends_with(b"\n") {
            temp.write_all(b"\n")
                .map_err(|e| LogStoreError::Write(self.path.clone(), e))?;
        }
        {
            let mut writer = Self::csv_writer(&mut temp);
            writer
                .write_record(record.to_row())
                .map_err(|e| LogStoreError::CsvWrite(self.path.clone(), e))?;
            writer
                .flush()
                .map_err(|e| LogStoreError::Write(self.path.clone(), e))?;
        }
        self.finish_staging(temp)?.commit()
    }

    fn temp_file(&self) -> Result<NamedTempFile, LogStoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| LogStoreError::DirCreation(dir.clone(), e))?;
        tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&dir)
            .map_err(|e| LogStoreError::TempFile(self.path.clone(), e))
    }

    fn finish_staging(&self, temp: NamedTempFile) -> Result<StagedWrite, LogStoreError> {
        temp.as_file()
            .sync_all()
            .map_err(|e| LogStoreError::Write(self.path.clone(), e))?;
        Ok(StagedWrite {
            temp,
            target: self.path.clone(),
        })
    }

    fn csv_writer<W: Write>(sink: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink)
    }

    fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source)
    }

    fn check_header<R: Read>(&self, source: R) -> Result<(), LogStoreError> {
        let mut reader = Self::csv_reader(source);
        self.read_header(&mut reader)
    }

    fn read_header<R: Read>(&self, reader: &mut csv::Reader<R>) -> Result<(), LogStoreError> {
        let mut first = csv::StringRecord::new();
        let has_row = reader
            .read_record(&mut first)
            .map_err(|e| LogStoreError::CsvRead(self.path.clone(), e))?;
        if has_row && self.header.matches(first.iter()) {
            return Ok(());
        }
        Err(LogStoreError::HeaderMismatch {
            path: self.path.clone(),
            found: first.iter().map(String::from).collect(),
        })
    }

    fn parse<R: Read>(&self, source: R) -> Result<Vec<Record>, LogStoreError> {
        let mut reader = Self::csv_reader(source);
        self.read_header(&mut reader)?;

        let mut records = Vec::new();
        let mut dropped = 0usize;
        for row in reader.records() {
            match row {
                Ok(row) => match Record::from_row(&row) {
                    Some(record) => records.push(record),
                    None => {
                        dropped += 1;
                        debug!("Dropping malformed row {:?}", row);
                    }
                },
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(LogStoreError::CsvRead(self.path.clone(), e));
                }
                Err(e) => {
                    dropped += 1;
                    debug!("Dropping unreadable row: {}", e);
                }
            }
        }
        if dropped > 0 {
            debug!(
                "Skipped {} malformed rows in {}",
                dropped,
                self.path.display()
            );
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::reading::Reading;
    use tempfile::TempDir;

    const HEADER_LINE: &str = "Timestamp,Temperature (°C),Bitcoin Price (USD)\n";

    fn store_in(dir: &TempDir) -> LogStore {
        LogStore::new(dir.path().join("data_log.csv"), Header::default())
    }

    fn record(i: usize) -> Record {
        Record::new(
            format!("2025-03-01T{:02}:00:00+05:30", i % 24),
            Reading::Value(20.0 + i as f64 * 0.25),
            if i % 3 == 0 {
                Reading::Unavailable
            } else {
                Reading::Value(67000.0 + i as f64 * 0.5)
            },
        )
    }

    fn leftover_temp_files(dir: &TempDir) -> Vec<PathBuf> {
        fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(TEMP_PREFIX))
            })
            .collect()
    }

    #[test]
    fn test_ensure_initialized_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.ensure_initialized().unwrap());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), HEADER_LINE);

        store.replace_all(&[record(1)]).unwrap();
        let before = fs::read(store.path()).unwrap();
        assert!(!store.ensure_initialized().unwrap());
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert!(leftover_temp_files(&dir).is_empty());
    }

    #[test]
    fn test_ensure_initialized_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("nested/logs/data.csv"), Header::default());
        assert!(store.ensure_initialized().unwrap());
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for n in [0, 1, 2, 17] {
            let records: Vec<Record> = (0..n).map(record).collect();
            store.replace_all(&records).unwrap();
            assert_eq!(store.read_all().unwrap(), records, "n = {n}");
        }
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            store_in(&dir).read_all(),
            Err(LogStoreError::Read(..))
        ));
    }

    #[test]
    fn test_header_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(store.path(), "time,temp,btc\n2025-03-01T00:00:00+00:00,1,2\n").unwrap();
        let err = store.read_all().unwrap_err();
        assert!(err.is_header_mismatch(), "{err:?}");

        fs::write(store.path(), "").unwrap();
        assert!(store.read_all().unwrap_err().is_header_mismatch());
    }

    #[test]
    fn test_padded_header_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(
            store.path(),
            "Timestamp, Temperature (°C),Bitcoin Price (USD) \n2025-03-01T00:00:00+00:00,1,2\n",
        )
        .unwrap();
        let err = store.read_all().unwrap_err();
        assert!(err.is_header_mismatch(), "{err:?}");
        assert!(store.append_one(&record(1)).unwrap_err().is_header_mismatch());
    }

    #[test]
    fn test_malformed_rows_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let contents = format!(
            "{HEADER_LINE}\
             2025-03-01T10:00:00+05:30,21.5,67000.12\n\
             2025-03-01T11:00:00+05:30,21.6\n\
             2025-03-01T12:00:00+05:30,warm,1\n\
             \n\
             2025-03-01T13:00:00+05:30,N/A,67001,extra\n\
             2025-03-01T14:00:00+05:30,22,N/A\n"
        );
        fs::write(store.path(), contents).unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(
            records,
            vec![
                Record::new(
                    "2025-03-01T10:00:00+05:30",
                    Reading::Value(21.5),
                    Reading::Value(67000.12)
                ),
                Record::new(
                    "2025-03-01T14:00:00+05:30",
                    Reading::Value(22.0),
                    Reading::Unavailable
                ),
            ]
        );
    }

    #[test]
    fn test_quoted_header_with_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let header = Header::new("Timestamp", "Temp, °C", "Price \"USD\"");
        let store = LogStore::new(dir.path().join("q.csv"), header);
        store.replace_all(&[record(1)]).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("Timestamp,\"Temp, °C\",\"Price \"\"USD\"\"\"\n"), "{text}");
        assert_eq!(store.read_all().unwrap(), vec![record(1)]);
    }

    #[test]
    fn test_append_one_keeps_existing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        // Rows this store would drop on read must survive an append untouched.
        let original = format!("{HEADER_LINE}legacy row without enough fields");
        fs::write(store.path(), &original).unwrap();

        store.append_one(&record(2)).unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with(&original));
        assert!(text.ends_with("2025-03-01T02:00:00+05:30,20.5,67001\n"), "{text}");
        assert_eq!(store.read_all().unwrap(), vec![record(2)]);
        assert!(leftover_temp_files(&dir).is_empty());
    }

    #[test]
    fn test_append_one_initializes_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append_one(&record(1)).unwrap();
        store.append_one(&record(2)).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![record(1), record(2)]);
        assert_eq!(store.last_record().unwrap(), Some(record(2)));
    }

    #[test]
    fn test_append_one_refuses_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "a,b,c\n").unwrap();
        assert!(store.append_one(&record(1)).unwrap_err().is_header_mismatch());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "a,b,c\n");
    }

    #[test]
    fn test_crash_before_rename_leaves_original_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let original: Vec<Record> = (0..5).map(record).collect();
        store.replace_all(&original).unwrap();
        let before = fs::read(store.path()).unwrap();

        let staged = store.stage(&[record(9)]).unwrap();
        let temp_path = staged.temp_path().to_path_buf();
        assert!(temp_path.exists());
        assert_eq!(temp_path.parent(), store.path().parent());
        drop(staged);

        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.read_all().unwrap(), original);
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_failed_persist_cleans_up_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();
        let store = LogStore::new(&target, Header::default());

        let err = store.replace_all(&[record(1)]).unwrap_err();
        assert!(matches!(err, LogStoreError::Persist(..)), "{err:?}");
        assert!(leftover_temp_files(&dir).is_empty());
        assert!(target.join("keep").exists());
    }
}
