use std::env;
use std::fs;
use std::io;
use std::process;

use csv_dialect::{
    needs_quotes, Dialect, DialectBuilder, EscapeMode, PartialDialect,
    QuoteStyle, ReadStatus, Reader, ReaderBuilder, Record, Writer,
    WriterBuilder,
};
use serde::{Deserialize, Serialize};

fn reader(data: &str, dialect: Dialect) -> Reader<&[u8]> {
    ReaderBuilder::new().dialect(dialect).from_reader(data.as_bytes())
}

fn write_string(dialect: Dialect, records: &[Vec<&str>]) -> String {
    let mut wtr = WriterBuilder::new().dialect(dialect).from_writer(vec![]);
    for record in records {
        wtr.write_record(record).unwrap();
    }
    String::from_utf8(wtr.into_inner().unwrap()).unwrap()
}

#[test]
fn scenario_a_simple_record_then_end() {
    let mut rdr = reader("a,b,c\n", Dialect::default());
    let mut rec = Record::new();
    assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::Record);
    assert_eq!(rec, vec!["a", "b", "c"]);
    assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::End);
    assert!(rec.is_empty());
}

#[test]
fn scenario_b_quoted_fields_and_trailing_empty_field() {
    let data = "\"Rob\",\"Pike\",\nKen,Thompson,ken\n";
    let records = reader(data, Dialect::default()).read_all().unwrap();
    assert_eq!(records, vec![
        vec!["Rob", "Pike", ""],
        vec!["Ken", "Thompson", "ken"],
    ]);
}

#[test]
fn scenario_c_minimal_quoting_space_delimiter() {
    let dialect = DialectBuilder::new()
        .delimiter(' ')
        .quote_style(QuoteStyle::Necessary)
        .build()
        .unwrap();
    let got = write_string(dialect, &[vec!["a", "b c", "d"]]);
    assert_eq!(got, "a \"b c\" d\n");
}

#[test]
fn scenario_d_escape_char_mode() {
    let dialect = DialectBuilder::new()
        .escape_mode(EscapeMode::EscapeChar)
        .build()
        .unwrap();
    let got = write_string(dialect.clone(), &[vec!["a\"b"]]);
    assert_eq!(got, "\"a\\\"b\"\n");

    let records = reader(&got, dialect).read_all().unwrap();
    assert_eq!(records, vec![vec!["a\"b"]]);
}

#[test]
fn scenario_e_comments() {
    let dialect = DialectBuilder::new().comment(Some('#')).build().unwrap();
    let data = "#-,-,-\n   #aa\na,b,c\n\t#aa#aaaa\nd,e,f\n";
    let records = reader(data, dialect).read_all().unwrap();
    assert_eq!(records, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
}

#[test]
fn comment_marker_after_content_is_data() {
    let dialect = DialectBuilder::new().comment(Some('#')).build().unwrap();
    let data = "x#,y\n  x #\n#skipped\n";
    let records = reader(data, dialect).read_all().unwrap();
    assert_eq!(records, vec![vec!["x#", "y"], vec!["  x #"]]);
}

#[test]
fn minimal_quoting_is_exact() {
    let dialect = DialectBuilder::new().terminator("\r\n").build().unwrap();
    let plain = ["", "abc", "a b", "a\rb", "a\nb", "a\\b", "'x'", "☃"];
    for field in &plain {
        assert!(!needs_quotes(field, &dialect), "{:?}", field);
    }
    let special = ["a,b", ",", "\"", "x\"", "a\r\nb", "\r\n"];
    for field in &special {
        assert!(needs_quotes(field, &dialect), "{:?}", field);
    }
}

#[test]
fn non_numeric_rejects_numeric_structure() {
    let err = DialectBuilder::new()
        .delimiter('.')
        .quote_style(QuoteStyle::NonNumeric)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("numeric"), "{}", err);

    // With minimal quoting the same delimiter round-trips.
    let dialect = DialectBuilder::new().delimiter('.').build().unwrap();
    let got = write_string(dialect.clone(), &[vec!["1.5", "x"]]);
    assert_eq!(got, "\"1.5\".x\n");
    let records = reader(&got, dialect).read_all().unwrap();
    assert_eq!(records, vec![vec!["1.5", "x"]]);
}

#[test]
fn blank_comment_is_rejected() {
    let err = DialectBuilder::new().comment(Some('\t')).build().unwrap_err();
    assert_eq!(err.to_string(), "invalid dialect: comment character '\\t' is blank");
}

/// Counts writes that reach the underlying writer.
#[derive(Default)]
struct CountingSink {
    data: Vec<u8>,
    writes: usize,
    flushes: usize,
}

impl io::Write for CountingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[test]
fn flush_is_idempotent() {
    let mut wtr = Writer::from_writer(CountingSink::default());
    wtr.write_record(&["a", "b"]).unwrap();
    wtr.flush().unwrap();
    let (data, writes) = (wtr.get_ref().data.clone(), wtr.get_ref().writes);
    assert_eq!(data, b"a,b\n");

    wtr.flush().unwrap();
    wtr.flush().unwrap();
    assert_eq!(wtr.get_ref().data, data);
    assert_eq!(wtr.get_ref().writes, writes);
    assert_eq!(wtr.get_ref().flushes, 3);
}

#[test]
fn write_all_matches_write_record() {
    let records = vec![
        vec!["a", "b,c", ""],
        vec!["multi\nline", "say \"hi\""],
        vec![""],
    ];

    let mut one = Writer::from_writer(vec![]);
    for record in &records {
        one.write_record(record).unwrap();
    }
    let mut all = Writer::from_writer(vec![]);
    all.write_all(&records).unwrap();
    // write_all flushes, so the output is visible without into_inner.
    let all_data = all.get_ref().clone();

    assert_eq!(one.into_inner().unwrap(), all_data);
}

#[test]
fn partial_record_on_unterminated_quote() {
    let mut rdr = reader("a,b\nc,\"d\ne", Dialect::default());
    let mut rec = Record::new();
    assert_eq!(rdr.read_record(&mut rec).unwrap(), ReadStatus::Record);
    let err = rdr.read_record(&mut rec).unwrap_err();
    assert_eq!(rec, vec!["c", "d\ne"]);
    assert_eq!(
        err.to_string(),
        "CSV parse error: record 1 (line 2, byte 4): \
         input ended inside a quoted field"
    );
}

#[cfg(feature = "serde")]
#[test]
fn dialect_from_json_config() {
    let partial: PartialDialect = serde_json::from_str(
        r#"{"delimiter": ";", "comment": "%", "quote_style": "non_numeric"}"#,
    )
    .unwrap();
    let dialect = partial.resolve().unwrap();
    assert_eq!(dialect.delimiter(), ';');
    assert_eq!(dialect.comment(), Some('%'));
    assert_eq!(dialect.terminator(), "\n");

    let got = write_string(dialect.clone(), &[vec!["x", "1"]]);
    assert_eq!(got, "\"x\";1\n");
    let records = reader("% note\nx;1\n", dialect).read_all().unwrap();
    assert_eq!(records, vec![vec!["x", "1"]]);

    let bad: Result<Dialect, _> =
        serde_json::from_str(r#"{"delimiter": "\"", "quote": "\""}"#);
    assert!(bad.is_err());
}

#[cfg(feature = "serde")]
#[derive(Debug, Deserialize, PartialEq, Serialize)]
struct City {
    name: String,
    latitude: f64,
    population: Option<u64>,
    capital: bool,
}

#[cfg(feature = "serde")]
#[test]
fn serde_round_trip() {
    let cities = vec![
        City {
            name: "Boston, MA".into(),
            latitude: 42.36,
            population: Some(4628910),
            capital: true,
        },
        City {
            name: "Concord".into(),
            latitude: 43.2,
            population: None,
            capital: false,
        },
    ];
    let dialect = DialectBuilder::new()
        .delimiter('\t')
        .quote_style(QuoteStyle::NonNumericNonEmpty)
        .build()
        .unwrap();

    let mut wtr = WriterBuilder::new().dialect(dialect.clone()).from_writer(vec![]);
    for city in &cities {
        wtr.serialize(city).unwrap();
    }
    let data = wtr.into_inner().unwrap();

    let mut rdr = ReaderBuilder::new().dialect(dialect).from_reader(&data[..]);
    let got: Vec<City> =
        rdr.deserialize().collect::<csv_dialect::Result<_>>().unwrap();
    assert_eq!(got, cities);
}

#[test]
fn files() {
    let path = env::temp_dir()
        .join(format!("csv-dialect-files-{}.csv", process::id()));
    let dialect = DialectBuilder::new().terminator("\r\n").build().unwrap();

    let mut wtr = WriterBuilder::new().dialect(dialect.clone()).from_path(&path).unwrap();
    wtr.write_record(&["a", "b\r\nc"]).unwrap();
    wtr.flush().unwrap();
    drop(wtr);

    let mut rdr = ReaderBuilder::new().dialect(dialect).from_path(&path).unwrap();
    let records = rdr.read_all().unwrap();
    fs::remove_file(&path).unwrap();
    assert_eq!(records, vec![vec!["a", "b\r\nc"]]);
}
