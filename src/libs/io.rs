use crate::libs::error::SyntenyError;
use anyhow::Context;
use std::io::{BufRead, BufReader};

/// Opens a plain or gzipped file, or `stdin`.
///
/// ```
/// use std::io::BufRead;
/// let reader = synteny::reader("tests/synteny/sp1.genes.filtered").unwrap();
/// assert_eq!(reader.lines().count(), 10);
///
/// assert!(synteny::reader("tests/synteny/not_there").is_err());
/// ```
pub fn reader(input: &str) -> anyhow::Result<Box<dyn BufRead>> {
    let reader: Box<dyn BufRead> = if input == "stdin" {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let path = std::path::Path::new(input);
        let file = std::fs::File::open(path)
            .with_context(|| format!("could not open {}", path.display()))?;

        if path.extension() == Some(std::ffi::OsStr::new("gz")) {
            Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        }
    };

    Ok(reader)
}

/// Iterates over data lines as `(line_number, fields)`, skipping blank lines and `#` comments.
pub fn data_lines(
    input: &str,
) -> anyhow::Result<impl Iterator<Item = anyhow::Result<(usize, Vec<String>)>>> {
    let path = input.to_string();
    let reader = reader(input)?;

    Ok(reader
        .lines()
        .enumerate()
        .filter_map(move |(i, line)| match line {
            Err(e) => Some(Err(anyhow::Error::new(e).context(format!("reading {}", path)))),
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    None
                } else {
                    let fields = trimmed.split_whitespace().map(|s| s.to_string()).collect();
                    Some(Ok((i + 1, fields)))
                }
            }
        }))
}

/// Parses a score column. `NaN` and infinities are refused along with
/// anything that is not a number.
pub fn parse_score(path: &str, line_no: usize, field: &str) -> Result<f64, SyntenyError> {
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SyntenyError::parse(path, line_no, format!("invalid score {}", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("a", 1, "42.5").unwrap(), 42.5);
        assert_eq!(parse_score("a", 1, "-3").unwrap(), -3.0);

        for field in ["NaN", "nan", "inf", "-inf", "infinity", "x1"] {
            let err = parse_score("hits.tsv", 7, field).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Parse error in hits.tsv at line 7: invalid score {}", field)
            );
        }
    }
}
