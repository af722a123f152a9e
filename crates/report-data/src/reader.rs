//! CSV decoding into positional [`Row`]s.

use std::io::Read;

use csv::ByteRecord;
use report_core::models::Row;
use tracing::debug;

use crate::error::FetchError;

/// Number of positional fields a transaction record must carry.
pub const ROW_FIELDS: usize = 4;

const FIELD_NAMES: [&str; ROW_FIELDS] = ["date", "product", "quantity", "unit price"];

/// Decode comma-separated records into rows.
///
/// The first line is returned as row 0; header handling is the aggregator's
/// call. Extra trailing fields are ignored, and records shorter
/// than [`ROW_FIELDS`] fail with [`FetchError::ShortRecord`].
///
/// The product column is never interpreted, so it is decoded lossily. Date,
/// quantity and unit price must be UTF-8 or the record fails with
/// [`FetchError::InvalidUtf8`]. Record 0 may be a header or title line: it
/// is exempt from both checks, padded with empty fields and decoded lossily.
pub fn decode_rows<R: Read>(reader: R) -> Result<Vec<Row>, FetchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in rdr.byte_records().enumerate() {
        let record = record?;
        let row = if index == 0 {
            lossy_row(&record)
        } else {
            strict_row(index, &record)?
        };
        rows.push(row);
    }

    debug!(rows = rows.len(), "decoded CSV records");
    Ok(rows)
}

fn field(record: &ByteRecord, i: usize) -> &[u8] {
    record.get(i).unwrap_or_default()
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn lossy_row(record: &ByteRecord) -> Row {
    Row::new(
        lossy(field(record, 0)),
        lossy(field(record, 1)),
        lossy(field(record, 2)),
        lossy(field(record, 3)),
    )
}

fn strict_row(row: usize, record: &ByteRecord) -> Result<Row, FetchError> {
    if record.len() < ROW_FIELDS {
        return Err(FetchError::ShortRecord {
            row,
            found: record.len(),
        });
    }

    let text = |i: usize| -> Result<String, FetchError> {
        std::str::from_utf8(field(record, i))
            .map(str::to_string)
            .map_err(|_| FetchError::InvalidUtf8 {
                row,
                field: FIELD_NAMES[i],
            })
    };

    Ok(Row::new(
        text(0)?,
        lossy(field(record, 1)),
        text(2)?,
        text(3)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rows_keeps_header_as_first_row() {
        let csv = b"\
Date,Product,Quantity,Price
01/15/24,X,2,10.00
02/01/24,Y,1,5.00
";
        let rows = decode_rows(&csv[..]).unwrap();
        assert_eq!(
            rows,
            vec![
                Row::new("Date", "Product", "Quantity", "Price"),
                Row::new("01/15/24", "X", "2", "10.00"),
                Row::new("02/01/24", "Y", "1", "5.00"),
            ]
        );
    }

    #[test]
    fn test_decode_rows_trims_and_ignores_extra_fields() {
        let csv = b"01/15/24,  X , 2 ,10.00,note\n";
        let rows = decode_rows(&csv[..]).unwrap();
        assert_eq!(rows, vec![Row::new("01/15/24", "X", "2", "10.00")]);
    }

    #[test]
    fn test_decode_rows_quoted_fields() {
        let csv = b"01/15/24,\"Widget, large\",1,3.50\n";
        let rows = decode_rows(&csv[..]).unwrap();
        assert_eq!(rows[0].product_id, "Widget, large");
    }

    #[test]
    fn test_decode_rows_short_record() {
        let csv = b"\
Date,Product,Quantity,Price
01/15/24,X,2
";
        let err = decode_rows(&csv[..]).unwrap_err();
        assert!(matches!(err, FetchError::ShortRecord { row: 1, found: 3 }));
    }

    #[test]
    fn test_decode_rows_empty_input() {
        let rows = decode_rows(&b""[..]).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_decode_rows_tolerates_non_utf8_product() {
        let csv = b"Date,Product,Quantity,Price\n01/15/24,Caf\xe9 au lait,2,10.00\n";
        let rows = decode_rows(&csv[..]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].product_id, "Caf\u{FFFD} au lait");
        assert_eq!(rows[1].quantity, "2");
        assert_eq!(rows[1].unit_price, "10.00");
    }

    #[test]
    fn test_decode_rows_rejects_non_utf8_numeric_field() {
        let csv = b"Date,Product,Quantity,Price\n01/15/24,X,2,1\xff0\n";
        let err = decode_rows(&csv[..]).unwrap_err();
        assert!(matches!(
            err,
            FetchError::InvalidUtf8 {
                row: 1,
                field: "unit price"
            }
        ));
    }

    #[test]
    fn test_decode_rows_rejects_non_utf8_date() {
        let csv = b"Date,Product,Quantity,Price\n\xff1/15/24,X,2,10\n";
        let err = decode_rows(&csv[..]).unwrap_err();
        assert!(matches!(
            err,
            FetchError::InvalidUtf8 {
                row: 1,
                field: "date"
            }
        ));
    }

    // ── First record ──────────────────────────────────────────────────────────

    #[test]
    fn test_decode_rows_short_title_line_is_padded() {
        let csv = b"Monthly export\n01/15/24,X,2,10.00\n";
        let rows = decode_rows(&csv[..]).unwrap();
        assert_eq!(
            rows,
            vec![
                Row::new("Monthly export", "", "", ""),
                Row::new("01/15/24", "X", "2", "10.00"),
            ]
        );
    }

    #[test]
    fn test_decode_rows_header_decoded_lossily() {
        let csv = b"D\xe4tum,Produkt,Menge,Preis\n01/15/24,X,2,10.00\n";
        let rows = decode_rows(&csv[..]).unwrap();
        assert_eq!(rows[0].date, "D\u{FFFD}tum");
        assert_eq!(rows.len(), 2);
    }
}
