//! Crime statistics CSV loading.
//!
//! The table has one row per location and year and one numeric column per
//! crime category, e.g.:
//!
//! ```text
//! Year,District,Code,Location,Robbery,Street_robbery,Injury,...
//! 2019,Mitte,10111,Tiergarten Süd,70,46,586,...
//! ```
//!
//! Column roles come from a [`DatasetLayout`]: one year column, one
//! location column, some ignored columns; everything else is a category.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use berlin_map_config::CrimeConfig;
use berlin_map_crime_models::CrimeRow;

use crate::CrimeError;

/// Which CSV columns play which role.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    /// Header of the year column.
    pub year_column: String,
    /// Header of the location column.
    pub location_column: String,
    /// Headers that are not crime categories.
    pub ignore_columns: Vec<String>,
}

impl From<&CrimeConfig> for DatasetLayout {
    fn from(config: &CrimeConfig) -> Self {
        Self {
            year_column: config.year_column.clone(),
            location_column: config.location_column.clone(),
            ignore_columns: config.ignore_columns.clone(),
        }
    }
}

/// Reads the crime CSV at `path`.
///
/// # Errors
///
/// Returns [`CrimeError`] if the file cannot be opened or its header is
/// unusable.
pub fn load_rows(path: &Path, layout: &DatasetLayout) -> Result<Vec<CrimeRow>, CrimeError> {
    log::info!("Loading crime dataset from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_rows(file, layout)
}

/// Reads crime rows from CSV data.
///
/// Rows with an unparseable year, an empty location or a non-numeric
/// count are dropped with a warning. Empty count cells count as zero.
///
/// # Errors
///
/// Returns [`CrimeError::MissingColumn`] if the year or location column is
/// absent, or [`CrimeError::Csv`] if the header cannot be read.
pub fn read_rows<R: Read>(reader: R, layout: &DatasetLayout) -> Result<Vec<CrimeRow>, CrimeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CrimeError::MissingColumn {
                column: name.to_string(),
            })
    };
    let year_idx = find(&layout.year_column)?;
    let location_idx = find(&layout.location_column)?;

    let categories: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            *idx != year_idx
                && *idx != location_idx
                && !layout.ignore_columns.iter().any(|c| c == name)
        })
        .map(|(idx, name)| (idx, name.to_string()))
        .collect();

    log::debug!(
        "Crime dataset has {} category columns: {:?}",
        categories.len(),
        categories.iter().map(|(_, n)| n.as_str()).collect::<Vec<_>>()
    );

    let mut rows = Vec::new();
    let mut dropped = 0_u64;

    for (line, record) in csv_reader.records().enumerate() {
        // Header is line 1.
        let line = line + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Dropping crime row at line {line}: {e}");
                dropped += 1;
                continue;
            }
        };

        match parse_record(&record, year_idx, location_idx, &categories) {
            Ok(row) => rows.push(row),
            Err(reason) => {
                log::warn!("Dropping crime row at line {line}: {reason}");
                dropped += 1;
            }
        }
    }

    log::info!("Loaded {} crime rows ({dropped} dropped)", rows.len());
    Ok(rows)
}

fn parse_record(
    record: &csv::StringRecord,
    year_idx: usize,
    location_idx: usize,
    categories: &[(usize, String)],
) -> Result<CrimeRow, String> {
    let year_cell = record.get(year_idx).unwrap_or("");
    let year: i32 = year_cell
        .parse()
        .map_err(|_| format!("invalid year '{year_cell}'"))?;

    let location_name = record.get(location_idx).unwrap_or("");
    if location_name.is_empty() {
        return Err("empty location".to_string());
    }

    let mut counts = BTreeMap::new();
    for (idx, name) in categories {
        let cell = record.get(*idx).unwrap_or("");
        let count: u64 = if cell.is_empty() {
            0
        } else {
            cell.parse()
                .map_err(|_| format!("invalid count '{cell}' in column '{name}'"))?
        };
        counts.insert(name.clone(), count);
    }

    Ok(CrimeRow {
        location_name: location_name.to_string(),
        year,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> DatasetLayout {
        DatasetLayout {
            year_column: "Year".to_string(),
            location_column: "Location".to_string(),
            ignore_columns: vec!["District".to_string(), "Code".to_string()],
        }
    }

    const SAMPLE: &str = "\
Year,District,Code,Location,Robbery,Theft,Graffiti
2019,Mitte,10111,Tiergarten Süd,70,2277,133
2019,Mitte,10112,Regierungsviertel,65,3489,208
2018,Pankow,30101,Buch,4,293,21
";

    #[test]
    fn reads_categories_from_remaining_columns() {
        let rows = read_rows(SAMPLE.as_bytes(), &layout()).unwrap();

        assert_eq!(rows.len(), 3);
        let first = &rows[0];
        assert_eq!(first.location_name, "Tiergarten Süd");
        assert_eq!(first.year, 2019);
        let columns: Vec<&str> = first.counts.keys().map(String::as_str).collect();
        assert_eq!(columns, ["Graffiti", "Robbery", "Theft"]);
        assert_eq!(first.total(), 70 + 2277 + 133);
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let data = "\
Year,Location,Robbery,Theft
2020,Mitte,1,2
twenty,Pankow,1,2
2020,,1,2
2020,Wedding,lots,2
2020,Moabit,,5
";
        let rows = read_rows(data.as_bytes(), &layout()).unwrap();

        let names: Vec<&str> = rows.iter().map(|r| r.location_name.as_str()).collect();
        assert_eq!(names, ["Mitte", "Moabit"]);
        assert_eq!(rows[1].counts["Robbery"], 0);
    }

    #[test]
    fn short_rows_count_missing_cells_as_zero() {
        let data = "Year,Location,Robbery\n2020,Mitte\n2020,Pankow,3\n";
        let rows = read_rows(data.as_bytes(), &layout()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total(), 0);
    }

    #[test]
    fn missing_location_column_is_an_error() {
        let data = "Year,Bezirk,Robbery\n2020,Mitte,1\n";
        let err = read_rows(data.as_bytes(), &layout()).unwrap_err();
        assert!(matches!(err, CrimeError::MissingColumn { ref column } if column == "Location"));
    }

    #[test]
    fn cells_are_trimmed() {
        let data = "Year , Location , Robbery\n 2021 , Kreuzberg , 12 \n";
        let rows = read_rows(data.as_bytes(), &layout()).unwrap();
        assert_eq!(rows[0].year, 2021);
        assert_eq!(rows[0].location_name, "Kreuzberg");
        assert_eq!(rows[0].counts["Robbery"], 12);
    }
}
