//! Create, read, and write a row-based [`Table`].

use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zstd::stream::read::Decoder;

/// A row-based [`Table`] of generic data.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Table<T> {
    /// Names of the table columns.
    pub headers: Vec<T>,
    /// Rows of table values.
    pub rows: Vec<Vec<T>>,
    /// Optional file path for where the table was read from.
    pub path: Option<PathBuf>,
}

impl<T> Default for Table<T>
where
    T: Clone + Display + Debug + PartialEq<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Table<T>
where
    T: Clone + Display + Debug + PartialEq<T>,
{
    /// Returns a new row-based [`Table`] with empty headers and rows.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::new();
    /// table.headers = vec!["genomeID", "pangoLin"];
    /// table.add_row(["g1", "BA.2"])?;
    /// # assert_eq!(table.rows, vec![vec!["g1", "BA.2"]]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), path: None }
    }

    /// Add a new row to the table.
    ///
    /// The row must have as many values as the table has headers.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::new();
    /// table.headers = vec!["1", "2", "3"];
    /// table.add_row(["A", "B", "C"])?;
    /// assert!(table.add_row(["D", "E"]).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_row<I>(&mut self, row: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = T>,
    {
        let row = row.into_iter().collect::<Vec<T>>();
        let (new, ex) = (row.len(), self.headers.len());
        if new != ex {
            return Err(eyre!("New row size ({new}) does not match the table headers ({ex})."));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Adds a new column to the [`Table`].
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::new();
    /// table.headers = vec!["1", "2", "3"];
    /// table.add_row(["A", "B", "C"])?;
    /// table.add_column("4", vec!["D"])?;
    ///
    /// assert_eq!(table.get_column(&"4")?, [&"D"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_column<I>(&mut self, header: T, column: I) -> Result<(), Report>
    where
        I: IntoIterator<Item = T>,
    {
        let column = column.into_iter().collect::<Vec<T>>();
        let (new, ex) = (column.len(), self.rows.len());
        if ex != new {
            return Err(eyre!("New column size ({new}) does not match the existing table ({ex})."));
        }

        self.headers.push(header);
        self.rows.iter_mut().zip(column).for_each(|(row, val)| row.push(val));
        Ok(())
    }

    /// Removes a column from the [`Table`], returning its values.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::new();
    /// table.headers = vec!["1", "2"];
    /// table.add_row(["A", "B"])?;
    ///
    /// assert_eq!(table.remove_column(&"1")?, ["A"]);
    /// assert_eq!(table.headers, ["2"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn remove_column(&mut self, header: &T) -> Result<Vec<T>, Report> {
        let header_i = self.get_header_index(header)?;
        self.headers.remove(header_i);
        let column = self.rows.iter_mut().map(|row| row.remove(header_i)).collect();
        Ok(column)
    }

    /// Returns the [`Table`] value under a particular header and row index.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::new();
    /// table.headers = vec!["1", "2", "3"];
    /// table.add_row(["A", "B", "C"])?;
    ///
    /// assert_eq!(table.get(&"2", 0)?, &"B");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get(&self, header: &T, row: usize) -> Result<&T, Report> {
        let header_i = self.get_header_index(header)?;
        let row = self.get_row(row)?;
        Ok(&row[header_i])
    }

    /// Update the value under a particular header and row index.
    pub fn set(&mut self, header: &T, row: usize, value: T) -> Result<(), Report> {
        let header_i = self.get_header_index(header)?;
        let n = self.rows.len();
        let row = self
            .rows
            .get_mut(row)
            .wrap_err_with(|| format!("Row ({row}) does not exist in the table ({n} rows)."))?;
        row[header_i] = value;
        Ok(())
    }

    /// Returns a [`Vec`] of [`Table`] values under a header.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::new();
    /// table.headers = vec!["1", "2"];
    /// table.add_row(["A", "B"])?;
    /// table.add_row(["C", "D"])?;
    ///
    /// assert_eq!(table.get_column(&"1")?, [&"A", &"C"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_column(&self, header: &T) -> Result<Vec<&T>, Report> {
        let header_i = self.get_header_index(header)?;
        let column = self.rows.iter().map(|row| &row[header_i]).collect();
        Ok(column)
    }

    /// Returns the column index (0-based) of the header in the [`Table`].
    pub fn get_header_index(&self, header: &T) -> Result<usize, Report> {
        let pos =
            self.headers.iter().position(|h| h == header).ok_or_else(|| {
                eyre!("Column '{header}' was not found in table: {:?}.", self.path)
            })?;

        Ok(pos)
    }

    /// Returns true if the [`Table`] has a column with this header.
    pub fn has_header(&self, header: &T) -> bool {
        self.headers.contains(header)
    }

    /// Rename a header, returns true if the header was found.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::<&str>::new();
    /// table.headers = vec!["Virus name"];
    /// assert!(table.rename_header(&"Virus name", "genomeID"));
    /// assert!(!table.rename_header(&"strain", "genomeID"));
    /// assert_eq!(table.headers, ["genomeID"]);
    /// ```
    pub fn rename_header(&mut self, from: &T, to: T) -> bool {
        match self.headers.iter_mut().find(|h| **h == *from) {
            Some(header) => {
                *header = to;
                true
            }
            None => false,
        }
    }

    /// Return a row of [`Table`] values from a row index.
    pub fn get_row(&self, i: usize) -> Result<&[T], Report> {
        if i >= self.rows.len() {
            Err(eyre!("Row ({i}) does not exist in the table."))
        } else {
            Ok(&self.rows[i])
        }
    }

    /// Write [`Table`] to a file.
    ///
    /// If no delimiter is provided, it is chosen from the file extension.
    ///
    /// ## Examples
    ///
    /// ```
    /// let mut table = lcenv_table::Table::new();
    /// table.headers = vec!["1", "2", "3"];
    /// table.add_row(["A", "B", "C"])?;
    ///
    /// let dir = tempfile::tempdir()?;
    /// table.write(&dir.path().join("table.tsv"), None)?;
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P, delim: Option<char>) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let delim = match delim {
            Some(c) => c,
            None => get_delimiter(path)?,
        };
        let delim = u8::try_from(delim)
            .wrap_err_with(|| format!("Delimiter {delim:?} is not a single byte."))?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(delim)
            .from_path(path)
            .wrap_err_with(|| eyre!("Unable to create file: {path:?}"))?;

        writer
            .write_record(self.headers.iter().map(|h| h.to_string()))
            .wrap_err_with(|| eyre!("Unable to write table headers: {:?}", self.headers))?;

        self.rows.iter().try_for_each(|row| {
            writer
                .write_record(row.iter().map(|v| v.to_string()))
                .wrap_err_with(|| eyre!("Unable to write table row: {}", row.iter().join(",")))
        })?;

        writer.flush().wrap_err_with(|| eyre!("Unable to flush table: {path:?}"))?;

        Ok(())
    }
}

impl Table<String> {
    /// Read a TSV or CSV file into a [`Table`].
    ///
    /// The delimiter is chosen from the file extension. Files ending in `.zst`
    /// are decompressed while reading.
    ///
    /// ## Examples
    ///
    /// ```
    /// use lcenv_table::Table;
    ///
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("metadata.tsv");
    /// std::fs::write(&path, "genomeID\tpangoLin\ng1\tBA.2\n")?;
    ///
    /// let table = Table::read(&path)?;
    /// assert_eq!(table.headers, ["genomeID", "pangoLin"]);
    /// assert_eq!(table.get(&"pangoLin".to_string(), 0)?, "BA.2");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P) -> Result<Table<String>, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let delim = get_delimiter(path)?;
        let delim = u8::try_from(delim)
            .wrap_err_with(|| format!("Delimiter {delim:?} is not a single byte."))?;

        let file = File::open(path).wrap_err_with(|| eyre!("Failed to read file: {path:?}"))?;
        let reader: Box<dyn Read> = match is_zst(path) {
            true => Box::new(
                Decoder::new(file).wrap_err_with(|| eyre!("Failed to decode: {path:?}"))?,
            ),
            false => Box::new(BufReader::new(file)),
        };

        let mut reader = csv::ReaderBuilder::new().delimiter(delim).from_reader(reader);

        let mut table = Table::new();
        table.headers = reader
            .headers()
            .wrap_err_with(|| eyre!("Failed to read table headers: {path:?}"))?
            .iter()
            .map(String::from)
            .collect();

        table.rows = reader
            .records()
            .enumerate()
            .map(|(i, record)| {
                let record = record
                    .wrap_err_with(|| eyre!("Failed to parse line {} of {path:?}", i + 2))?;
                Ok(record.iter().map(String::from).collect())
            })
            .collect::<Result<_, Report>>()?;

        table.path = Some(path.as_ref().to_path_buf());

        Ok(table)
    }
}

/// Get delimiter based on file extension.
///
/// A trailing `.zst` compression extension is ignored.
///
/// - `.tsv` => `\t`
/// - `.txt` => `\t`
/// - `.csv` => `,`
///
/// ```rust
/// use lcenv_table::get_delimiter;
///
/// assert_eq!(get_delimiter(&"file.tsv")?, '\t');
/// assert_eq!(get_delimiter(&"file.csv")?, ',');
/// assert_eq!(get_delimiter(&"file.txt")?, '\t');
/// assert_eq!(get_delimiter(&"metadata.tsv.zst")?, '\t');
/// assert!(get_delimiter(&"file").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn get_delimiter<P>(path: &P) -> Result<char, Report>
where
    P: AsRef<Path> + Debug,
{
    let path = match is_zst(path) {
        true => path.as_ref().with_extension(""),
        false => path.as_ref().to_path_buf(),
    };
    let ext = path
        .extension()
        .wrap_err_with(|| format!("Failed to get file extension: {path:?}"))?
        .to_str()
        .wrap_err_with(|| format!("Failed to convert file extension to str: {path:?}"))?;
    // convert extension to the expected delimiter
    match ext {
        "tsv" | "txt" => Ok('\t'),
        "csv" => Ok(','),
        _ext => {
            Err(eyre!("Unknown file extension: {_ext:?}").suggestion("Options: tsv, csv, or txt"))
        }
    }
}

fn is_zst<P>(path: &P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref().extension().is_some_and(|ext| ext == "zst")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() -> Result<(), Report> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("env.csv");

        let mut table = Table::new();
        table.headers = vec!["mutation".to_string(), "pos".to_string()];
        table.add_row(["241_C|T".to_string(), "241".to_string()])?;
        table.add_row(["a,b".to_string(), "1".to_string()])?;
        table.write(&path, None)?;

        let observed = Table::read(&path)?;
        assert_eq!(observed.headers, table.headers);
        assert_eq!(observed.rows, table.rows);
        assert_eq!(observed.path, Some(path));
        Ok(())
    }

    #[test]
    fn read_zst() -> Result<(), Report> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("metadata.tsv.zst");
        let compressed = zstd::stream::encode_all("genomeID\tlistV\ng1\t3622_G|.\n".as_bytes(), 3)?;
        std::fs::write(&path, compressed)?;

        let table = Table::read(&path)?;
        assert_eq!(table.headers, ["genomeID", "listV"]);
        assert_eq!(table.rows, [["g1", "3622_G|."]]);
        Ok(())
    }

    #[test]
    fn read_ragged_rows_fails() -> Result<(), Report> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ragged.tsv");
        std::fs::write(&path, "a\tb\n1\t2\t3\n")?;
        assert!(Table::read(&path).is_err());
        Ok(())
    }

    #[test]
    fn remove_and_set() -> Result<(), Report> {
        let mut table = Table::new();
        table.headers = vec!["a", "b"];
        table.add_row(["1", "2"])?;
        table.set(&"b", 0, "3")?;
        assert_eq!(table.get(&"b", 0)?, &"3");
        assert!(table.set(&"b", 5, "3").is_err());
        assert_eq!(table.remove_column(&"a")?, ["1"]);
        assert!(!table.has_header(&"a"));
        Ok(())
    }
}
