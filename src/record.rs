use thiserror::Error;

/// One labeled observation from a results log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub parameter: String,
    pub image: Option<String>,
    pub expected: bool,
    pub detected: bool,
}

/// Which historical results layout a line matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    /// `parameter expected detected`
    Plain,
    /// `parameter image expected detected`
    Imaged,
    /// `parameter expected detected expected_box detected_box`
    Boxed,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseError {
    #[error("expected 3, 4 or 5 tab-separated fields, found {0}")]
    FieldCount(usize),
    #[error("empty parameter")]
    EmptyParameter,
}

impl Record {
    pub fn new(parameter: impl Into<String>, expected: bool, detected: bool) -> Self {
        Self {
            parameter: parameter.into(),
            image: None,
            expected,
            detected,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Loose truthiness used by the results writers: `""` and `"0"` are false.
pub fn truthy(token: &str) -> bool {
    !matches!(token.trim(), "" | "0")
}

fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut fields: Vec<&str> = line.split('\t').collect();
    // Window-level writers end their 4-column rows with a tab. Only a fifth
    // empty column is dropped; in a 4-column row it is the `detected` token.
    if fields.len() == 5 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Parse a single results line into a record and the layout it matched.
pub fn parse_line(line: &str) -> Result<(Record, LineShape), ParseError> {
    let fields = split_fields(line);

    let (parameter, image, expected, detected, shape) = match fields.as_slice() {
        [p, e, d] => (*p, None, *e, *d, LineShape::Plain),
        [p, i, e, d] => (*p, Some(*i), *e, *d, LineShape::Imaged),
        [p, e, d, _, _] => (*p, None, *e, *d, LineShape::Boxed),
        other => return Err(ParseError::FieldCount(other.len())),
    };

    let parameter = parameter.trim();
    if parameter.is_empty() {
        return Err(ParseError::EmptyParameter);
    }

    let mut record = Record::new(parameter, truthy(expected), truthy(detected));
    if let Some(image) = image.map(str::trim).filter(|i| !i.is_empty()) {
        record = record.with_image(image);
    }
    Ok((record, shape))
}

/// True when the line is the column header the results writers emit first.
pub fn is_header(line: &str) -> bool {
    let fields = split_fields(line);
    let (expected, detected) = match fields.as_slice() {
        [_, e, d] | [_, e, d, _, _] => (*e, *d),
        [_, _, e, d] => (*e, *d),
        _ => return false,
    };
    expected.trim().eq_ignore_ascii_case("expected")
        && detected.trim().eq_ignore_ascii_case("detected")
}
