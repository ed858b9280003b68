/// Splits one comma-delimited line into trimmed fields.
///
/// Each line is read on its own, so an unterminated quote runs to the end of that line and
/// never into the next one. A quote only opens a quoted field at the very start of the
/// field; elsewhere it is plain text.
pub(crate) fn split_fields(line: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        _ => vec![String::new()],
    }
}
