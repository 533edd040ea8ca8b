//! Dataframe formats: csv, parquet, xlsx.

use crate::{CodecError, CodecOptions, CodecRegistry, Loader, Payload, Result, Saver};
use calamine::{Data, Reader, Xlsx};
use polars::prelude::*;
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Read, Write};

const DEFAULT_SHEET_NAME: &str = "Sheet1";

pub(super) fn register(registry: &mut CodecRegistry) {
    registry.insert_loader("csv", Loader::binary(|reader, options| read_csv(reader, options)));
    registry.insert_saver(
        "csv",
        Saver::binary(|payload, writer, options| {
            let mut frame = frame_of(payload)?;
            CsvWriter::new(writer)
                .include_header(options.get_bool("has_header", true)?)
                .with_separator(separator(options)?)
                .finish(&mut frame)
                .map_err(CodecError::library)
        }),
    );

    registry.insert_loader(
        "parquet",
        Loader::binary(|reader, _options| {
            let frame = ParquetReader::new(buffered(reader)?)
                .finish()
                .map_err(CodecError::library)?;
            Ok(Payload::Table(frame))
        }),
    );
    registry.insert_saver(
        "parquet",
        Saver::binary(|payload, writer, _options| {
            let mut frame = frame_of(payload)?;
            ParquetWriter::new(writer)
                .finish(&mut frame)
                .map_err(CodecError::library)?;
            Ok(())
        }),
    );

    registry.insert_loader("xlsx", Loader::binary(|reader, options| read_xlsx(reader, options)));
    registry.insert_saver(
        "xlsx",
        Saver::binary(|payload, writer, options| {
            let Payload::Table(frame) = payload else {
                return Err(payload.mismatch("table"));
            };
            let bytes = write_xlsx(frame, options)?;
            writer.write_all(&bytes)?;
            Ok(())
        }),
    );
}

fn frame_of(payload: &Payload) -> Result<DataFrame> {
    match payload {
        Payload::Table(frame) => Ok(frame.clone()),
        other => Err(other.mismatch("table")),
    }
}

/// The polars readers want a seekable source
fn buffered(reader: &mut dyn Read) -> Result<Cursor<Vec<u8>>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(Cursor::new(bytes))
}

fn separator(options: &CodecOptions) -> Result<u8> {
    match options.get("separator") {
        None => Ok(b','),
        Some("tab") | Some("\\t") => Ok(b'\t'),
        Some(value) if value.len() == 1 => Ok(value.as_bytes()[0]),
        Some(value) => Err(CodecError::invalid_option("separator", value)),
    }
}

fn read_csv(reader: &mut dyn Read, options: &CodecOptions) -> Result<Payload> {
    let separator = separator(options)?;
    let frame = CsvReadOptions::default()
        .with_has_header(options.get_bool("has_header", true)?)
        .map_parse_options(|parse| parse.with_separator(separator))
        .into_reader_with_file_handle(buffered(reader)?)
        .finish()
        .map_err(CodecError::library)?;
    Ok(Payload::Table(frame))
}

fn read_xlsx(reader: &mut dyn Read, options: &CodecOptions) -> Result<Payload> {
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(buffered(reader)?)
        .map_err(CodecError::library)?;

    let sheet = options.get("sheet");
    let range = match sheet.map(|value| (value, value.parse::<usize>())) {
        Some((name, Err(_))) => workbook.worksheet_range(name),
        Some((_, Ok(index))) => workbook
            .worksheet_range_at(index)
            .ok_or_else(|| CodecError::Malformed(format!("workbook has no sheet {index}")))?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| CodecError::Malformed("workbook has no sheets".to_string()))?,
    }
    .map_err(CodecError::library)?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(index, cell)| match cell {
                Data::Empty => format!("column_{index}"),
                other => other.to_string(),
            })
            .collect(),
        None => return Ok(Payload::Table(DataFrame::empty())),
    };
    let body: Vec<&[Data]> = rows.collect();

    let columns = headers
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(index).unwrap_or(&Data::Empty))
                .collect();
            infer_column(name, &cells)
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Read xlsx sheet with {} columns and {} rows",
        columns.len(),
        body.len()
    );
    let frame = DataFrame::new(columns).map_err(CodecError::library)?;
    Ok(Payload::Table(frame))
}

/// Narrowest column type that holds every non-empty cell:
/// integer, then float, then boolean, falling back to string.
fn infer_column(name: &str, cells: &[&Data]) -> Column {
    let name = PlSmallStr::from(name);
    let present = || cells.iter().filter(|cell| !matches!(cell, Data::Empty));

    let integral = |cell: &Data| match cell {
        Data::Int(value) => Some(*value),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            Some(*value as i64)
        }
        _ => None,
    };

    if present().all(|cell| integral(cell).is_some()) {
        let values: Vec<Option<i64>> = cells.iter().map(|cell| integral(cell)).collect();
        return Column::new(name, values);
    }
    if present().all(|cell| matches!(cell, Data::Int(_) | Data::Float(_))) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Int(value) => Some(*value as f64),
                Data::Float(value) => Some(*value),
                _ => None,
            })
            .collect();
        return Column::new(name, values);
    }
    if present().all(|cell| matches!(cell, Data::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|cell| match cell {
                Data::Bool(value) => Some(*value),
                _ => None,
            })
            .collect();
        return Column::new(name, values);
    }
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|cell| match cell {
            Data::Empty => None,
            other => Some(other.to_string()),
        })
        .collect();
    Column::new(name, values)
}

fn write_xlsx(frame: &DataFrame, options: &CodecOptions) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name(options.get("sheet").unwrap_or(DEFAULT_SHEET_NAME))
        .map_err(CodecError::library)?;

    for (index, column) in frame.get_columns().iter().enumerate() {
        let col = u16::try_from(index)
            .map_err(|_| CodecError::Malformed("too many columns for a worksheet".to_string()))?;
        sheet
            .write_string(0, col, column.name().as_str())
            .map_err(CodecError::library)?;

        let series = column.as_materialized_series();
        match series.dtype() {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => {
                let values = series.cast(&DataType::Float64).map_err(CodecError::library)?;
                let values = values.f64().map_err(CodecError::library)?;
                for (row, value) in values.into_iter().enumerate() {
                    if let Some(value) = value {
                        sheet
                            .write_number(row_index(row)?, col, value)
                            .map_err(CodecError::library)?;
                    }
                }
            }
            DataType::Boolean => {
                let values = series.bool().map_err(CodecError::library)?;
                for (row, value) in values.into_iter().enumerate() {
                    if let Some(value) = value {
                        sheet
                            .write_boolean(row_index(row)?, col, value)
                            .map_err(CodecError::library)?;
                    }
                }
            }
            _ => {
                let values = series.cast(&DataType::String).map_err(CodecError::library)?;
                let values = values.str().map_err(CodecError::library)?;
                for (row, value) in values.into_iter().enumerate() {
                    if let Some(value) = value {
                        sheet
                            .write_string(row_index(row)?, col, value)
                            .map_err(CodecError::library)?;
                    }
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(CodecError::library)
}

/// Worksheet row for a frame row; row 0 holds the header
fn row_index(row: usize) -> Result<u32> {
    u32::try_from(row + 1)
        .map_err(|_| CodecError::Malformed("too many rows for a worksheet".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df!(
            "a" => [1i64, 2, 3],
            "b" => ["x", "y", "z"],
        )
        .unwrap()
    }

    fn round_trip(extension: &str, frame: DataFrame, options: &CodecOptions) -> DataFrame {
        let registry = CodecRegistry::builtin();
        let mut bytes = Vec::new();
        registry
            .resolve_saver(extension)
            .unwrap()
            .encode(&Payload::Table(frame), &mut bytes, options)
            .unwrap();
        let loaded = registry
            .resolve_loader(extension)
            .unwrap()
            .decode(&mut bytes.as_slice(), options)
            .unwrap();
        DataFrame::try_from(loaded).unwrap()
    }

    fn column_names(frame: &DataFrame) -> Vec<String> {
        frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn test_csv_round_trip() {
        let loaded = round_trip("csv", sample(), &CodecOptions::new());
        assert_eq!(column_names(&loaded), vec!["a", "b"]);
        assert_eq!(loaded.height(), 3);
        assert!(loaded.equals(&sample()));
    }

    #[test]
    fn test_csv_separator() {
        let options = CodecOptions::new().with("separator", ";");
        let registry = CodecRegistry::builtin();
        let mut bytes = Vec::new();
        registry
            .resolve_saver("csv")
            .unwrap()
            .encode(&Payload::Table(sample()), &mut bytes, &options)
            .unwrap();

        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("a;b\n"));
    }

    #[test]
    fn test_csv_bad_separator() {
        let options = CodecOptions::new().with("separator", "::");
        let registry = CodecRegistry::builtin();
        let result = registry
            .resolve_loader("csv")
            .unwrap()
            .decode(&mut "a,b\n1,2\n".as_bytes(), &options);
        assert!(matches!(result, Err(CodecError::InvalidOption { .. })));
    }

    #[test]
    fn test_parquet_round_trip() {
        let loaded = round_trip("parquet", sample(), &CodecOptions::new());
        assert!(loaded.equals(&sample()));
    }

    #[test]
    fn test_xlsx_round_trip() {
        let frame = df!(
            "a" => [1i64, 2, 3],
            "b" => ["x", "y", "z"],
            "c" => [0.5f64, 1.5, 2.5],
            "d" => [true, false, true],
        )
        .unwrap();
        let loaded = round_trip("xlsx", frame.clone(), &CodecOptions::new());

        assert_eq!(column_names(&loaded), vec!["a", "b", "c", "d"]);
        assert!(loaded.equals(&frame));
    }

    #[test]
    fn test_xlsx_named_sheet() {
        let options = CodecOptions::new().with("sheet", "Report");
        let loaded = round_trip("xlsx", sample(), &options);
        assert_eq!(loaded.height(), 3);
    }

    #[test]
    fn test_xlsx_missing_sheet_index() {
        let registry = CodecRegistry::builtin();
        let mut bytes = Vec::new();
        registry
            .resolve_saver("xlsx")
            .unwrap()
            .encode(&Payload::Table(sample()), &mut bytes, &CodecOptions::new())
            .unwrap();

        let result = registry
            .resolve_loader("xlsx")
            .unwrap()
            .decode(&mut bytes.as_slice(), &CodecOptions::new().with("sheet", "4"));
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }
}
