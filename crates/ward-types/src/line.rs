//! The `patient_data_line` text encoding.
//!
//! A record is written as `<id> <name> <True|False> [<d1>,<d2>,...]`. Name and
//! disease text is percent-escaped for the characters that would break the
//! field structure (`%`, space, `,`, `[`, `]`, CR, LF). Text without those
//! characters is written verbatim, so unescaped legacy lines parse unchanged.
//!
//! Disease elements are never empty: `[]` is the empty list, and an empty
//! element between commas is rejected.

use crate::{ParseError, PatientData};

/// Render `record` as a single line (no trailing newline).
pub fn encode(record: &PatientData) -> String {
    let diseases: Vec<String> = record.diseases.iter().map(|d| escape(d)).collect();
    format!(
        "{} {} {} [{}]",
        record.id,
        escape(&record.name),
        if record.cured { "True" } else { "False" },
        diseases.join(",")
    )
}

/// Parse a line produced by [`encode`]. Surrounding whitespace is ignored.
pub fn decode(line: &str) -> Result<PatientData, ParseError> {
    let line = line.trim_matches(|c| c == '\n' || c == '\r');
    let mut parts = line.splitn(4, ' ');

    let id_str = parts.next().ok_or(ParseError::MissingField("id"))?;
    let id = id_str
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidId(id_str.to_string()))?;
    let name = unescape(parts.next().ok_or(ParseError::MissingField("name"))?)?;
    let cured = match parts.next().ok_or(ParseError::MissingField("cured"))? {
        "True" => true,
        "False" => false,
        other => return Err(ParseError::InvalidCured(other.to_string())),
    };
    let diseases_str = parts
        .next()
        .ok_or(ParseError::MissingField("diseases"))?
        .trim_end();
    let inner = diseases_str
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| ParseError::InvalidDiseases(diseases_str.to_string()))?;

    let diseases = if inner.is_empty() {
        Vec::new()
    } else {
        inner
            .split(',')
            .map(|d| {
                if d.is_empty() {
                    Err(ParseError::InvalidDiseases(diseases_str.to_string()))
                } else {
                    unescape(d)
                }
            })
            .collect::<Result<_, _>>()?
    };

    Ok(PatientData {
        id,
        name,
        cured,
        diseases,
    })
}

/// Percent-escape the characters that carry structure in a record line.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            ',' => out.push_str("%2C"),
            '[' => out.push_str("%5B"),
            ']' => out.push_str("%5D"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape`]. Only the escapes it writes are accepted.
pub fn unescape(text: &str) -> Result<String, ParseError> {
    if !text.contains('%') {
        return Ok(text.to_string());
    }

    let bad = || ParseError::InvalidEscape(text.to_string());
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3).ok_or_else(bad)?;
        out.push(match code.to_ascii_uppercase().as_str() {
            "25" => '%',
            "20" => ' ',
            "2C" => ',',
            "5B" => '[',
            "5D" => ']',
            "0A" => '\n',
            "0D" => '\r',
            _ => return Err(bad()),
        });
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);

    Ok(out)
}
