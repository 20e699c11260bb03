//! Sample Metadata Table
//!
//! An optional delimited file mapping each sample identifier to its
//! input files and descriptive attributes. The rules read it themselves;
//! the launcher only checks it so that a typo in the table fails here
//! instead of hours into a cluster job.
//!
//! ```text
//! sample    condition  fastq_1                 fastq_2
//! ctrl_1    control    data/ctrl_1_R1.fq.gz    data/ctrl_1_R2.fq.gz
//! treat_1   treated    data/treat_1_R1.fq.gz   data/treat_1_R2.fq.gz
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::model::LaunchConfig;
use crate::error::{LaunchError, Result};

/// Column every sample table must carry.
pub const SAMPLE_COLUMN: &str = "sample";

/// One row of the sample table.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub id: String,
    /// Remaining columns keyed by header name
    pub attributes: BTreeMap<String, String>,
}

impl SampleRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }
}

/// Parsed sample table, rows in file order.
#[derive(Debug, Clone)]
pub struct SampleSheet {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub samples: Vec<SampleRecord>,
}

impl SampleSheet {
    /// Reads a sample table. `.csv` files are comma separated, anything
    /// else is tab separated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let delimiter = delimiter_for(path);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| sheet_error(path, format!("cannot open: {}", e)))?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| sheet_error(path, format!("cannot read header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        let id_index = columns
            .iter()
            .position(|c| c == SAMPLE_COLUMN)
            .ok_or_else(|| sheet_error(path, format!("missing '{}' column", SAMPLE_COLUMN)))?;

        let mut samples = Vec::new();
        let mut seen = HashSet::new();

        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| sheet_error(path, e.to_string()))?;
            // Header is line 1
            let line = record.position().map_or(row as u64 + 2, |p| p.line());

            let id = record.get(id_index).unwrap_or_default().to_string();
            validate_sample_id(&id).map_err(|reason| sheet_error(path, format!("line {}: {}", line, reason)))?;

            if !seen.insert(id.clone()) {
                return Err(sheet_error(
                    path,
                    format!("line {}: duplicate sample '{}'", line, id),
                ));
            }

            let attributes = columns
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != id_index)
                .map(|(i, column)| (column.clone(), record.get(i).unwrap_or_default().to_string()))
                .collect();

            samples.push(SampleRecord { id, attributes });
        }

        debug!("Read {} sample(s) from {}", samples.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            columns,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample identifiers in file order.
    pub fn ids(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&SampleRecord> {
        self.samples.iter().find(|s| s.id == id)
    }

    /// Checks that the path columns exist and every listed file is present.
    ///
    /// Relative paths are resolved with `resolve`. Empty cells are
    /// allowed, e.g. a missing second read for single-end samples.
    pub fn check_paths<F>(&self, path_columns: &[String], resolve: F) -> Result<()>
    where
        F: Fn(&str) -> PathBuf,
    {
        for column in path_columns {
            if !self.columns.iter().any(|c| c == column) {
                return Err(sheet_error(
                    &self.path,
                    format!("path column '{}' not found in header", column),
                ));
            }
        }

        let mut missing = Vec::new();
        for sample in &self.samples {
            for column in path_columns {
                let value = sample.get(column).unwrap_or_default();
                if value.is_empty() {
                    continue;
                }
                let resolved = resolve(value);
                if !resolved.exists() {
                    missing.push(format!("{} ({}): {}", sample.id, column, resolved.display()));
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(sheet_error(
                &self.path,
                format!("{} missing file(s):\n  {}", missing.len(), missing.join("\n  ")),
            ))
        }
    }
}

/// Loads and checks the sample table named in the config, if any.
pub fn check_sample_sheet(config: &LaunchConfig) -> Result<Option<SampleSheet>> {
    let Some(samples) = config.samples.as_deref() else {
        return Ok(None);
    };

    let sheet = SampleSheet::load(config.resolve(samples))?;
    if sheet.is_empty() {
        return Err(sheet_error(&sheet.path, "no samples listed".to_string()));
    }

    sheet.check_paths(&config.sample_path_columns, |p| config.resolve(p))?;

    info!("Sample sheet OK: {} sample(s)", sheet.len());
    Ok(Some(sheet))
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Sample ids end up in file names through wildcards.
fn validate_sample_id(id: &str) -> std::result::Result<(), String> {
    if id.is_empty() {
        return Err("empty sample id".to_string());
    }
    if id.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(format!("sample id '{}' contains whitespace or '/'", id));
    }
    Ok(())
}

fn sheet_error(path: &Path, reason: String) -> LaunchError {
    LaunchError::SampleSheet {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_tsv() {
        let temp_dir = tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "samples.tsv",
            "sample\tcondition\tfastq_1\nctrl_1\tcontrol\tctrl_1.fq\ntreat_1\ttreated\ttreat_1.fq\n",
        );

        let sheet = SampleSheet::load(&path).unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.ids(), vec!["ctrl_1", "treat_1"]);
        assert_eq!(sheet.get("treat_1").unwrap().get("condition"), Some("treated"));
        assert!(sheet.get("treat_1").unwrap().get("sample").is_none());
    }

    #[test]
    fn test_load_csv_with_comments() {
        let temp_dir = tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "samples.csv",
            "sample,batch\n# cohort A\ns1,1\ns2, 2 \n",
        );

        let sheet = SampleSheet::load(&path).unwrap();
        assert_eq!(sheet.ids(), vec!["s1", "s2"]);
        assert_eq!(sheet.get("s2").unwrap().get("batch"), Some("2"));
    }

    #[test]
    fn test_missing_sample_column() {
        let temp_dir = tempdir().unwrap();
        let path = write(temp_dir.path(), "samples.tsv", "id\tcondition\ns1\tx\n");

        let err = SampleSheet::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing 'sample' column"));
    }

    #[test]
    fn test_duplicate_sample() {
        let temp_dir = tempdir().unwrap();
        let path = write(temp_dir.path(), "samples.tsv", "sample\ns1\ns2\ns1\n");

        let err = SampleSheet::load(&path).unwrap_err();
        assert!(err.to_string().contains("line 4: duplicate sample 's1'"));
    }

    #[test]
    fn test_sample_id_with_slash() {
        let temp_dir = tempdir().unwrap();
        let path = write(temp_dir.path(), "samples.tsv", "sample\nbad/id\n");
        assert!(SampleSheet::load(&path).is_err());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = write(temp_dir.path(), "samples.tsv", "sample\tbatch\ns1\t1\ts2\n");
        assert!(SampleSheet::load(&path).is_err());
    }

    #[test]
    fn test_check_paths() {
        let temp_dir = tempdir().unwrap();
        write(temp_dir.path(), "s1_R1.fq", "@r\n");
        let path = write(
            temp_dir.path(),
            "samples.tsv",
            "sample\tfastq_1\tfastq_2\ns1\ts1_R1.fq\t\ns2\ts2_R1.fq\t\n",
        );
        let sheet = SampleSheet::load(&path).unwrap();
        let base = temp_dir.path().to_path_buf();

        let err = sheet
            .check_paths(&["fastq_1".to_string(), "fastq_2".to_string()], |p| base.join(p))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1 missing file(s)"));
        assert!(message.contains("s2 (fastq_1)"));

        let err = sheet
            .check_paths(&["bam".to_string()], |p| base.join(p))
            .unwrap_err();
        assert!(err.to_string().contains("path column 'bam' not found"));
    }

    #[test]
    fn test_check_sample_sheet_from_config() {
        let temp_dir = tempdir().unwrap();
        write(temp_dir.path(), "a.fq", "@r\n");
        write(temp_dir.path(), "samples.tsv", "sample\tfastq_1\na\ta.fq\n");

        let config = LaunchConfig::new("/scratch/p", "results", "/scratch/p/smk.sif", "p", "small")
            .with_workdir(temp_dir.path().to_str().unwrap())
            .with_samples("samples.tsv", vec!["fastq_1".to_string()]);

        let sheet = check_sample_sheet(&config).unwrap().unwrap();
        assert_eq!(sheet.ids(), vec!["a"]);
    }

    #[test]
    fn test_check_sample_sheet_none_configured() {
        let config = LaunchConfig::new("/scratch/p", "results", "/scratch/p/smk.sif", "p", "small");
        assert!(check_sample_sheet(&config).unwrap().is_none());
    }

    #[test]
    fn test_check_sample_sheet_empty_table() {
        let temp_dir = tempdir().unwrap();
        write(temp_dir.path(), "samples.tsv", "sample\tbatch\n");

        let config = LaunchConfig::new("/scratch/p", "results", "/scratch/p/smk.sif", "p", "small")
            .with_workdir(temp_dir.path().to_str().unwrap())
            .with_samples("samples.tsv", vec![]);

        assert!(check_sample_sheet(&config).is_err());
    }
}
