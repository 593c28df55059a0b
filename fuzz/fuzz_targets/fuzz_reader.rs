#![no_main]
use libfuzzer_sys::fuzz_target;

use csv_dialect::{DialectBuilder, EscapeMode, ReaderBuilder, WriterBuilder};

fuzz_target!(|data: &[u8]| {
    // The first byte picks the dialect, the rest is CSV data.
    let (knobs, data) = match data.split_first() {
        Some((&knobs, data)) => (knobs, data),
        None => return,
    };
    let mut builder = DialectBuilder::new();
    if knobs & 1 == 1 {
        builder.escape_mode(EscapeMode::EscapeChar);
    }
    if knobs & 2 == 2 {
        builder.terminator("\r\n");
    }
    if knobs & 4 == 4 {
        builder.comment(Some('#'));
    }
    let dialect = match builder.build() {
        Ok(dialect) => dialect,
        Err(_) => return,
    };

    let mut rdr = ReaderBuilder::new()
        .dialect(dialect.clone())
        .buffer_capacity(1 + (knobs >> 3) as usize)
        .from_reader(data);
    let records = match rdr.read_all() {
        Ok(records) => records,
        Err(_) => return,
    };

    // Anything that parses must survive a round trip.
    let mut wtr = WriterBuilder::new().dialect(dialect.clone()).from_writer(vec![]);
    wtr.write_all(&records).unwrap();
    let written = wtr.into_inner().unwrap();
    let again = ReaderBuilder::new()
        .dialect(dialect)
        .from_reader(&written[..])
        .read_all()
        .unwrap();
    assert_eq!(records, again);
});
