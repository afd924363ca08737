use super::error::BboxParseError;
use super::BoundingBox;

/// Parses a box serialized as a bracketed numeric array, e.g. `"[100.  200.   300.  400.]"`.
///
/// The exporter pads values with a varying number of spaces, so any run of
/// whitespace or commas is accepted as a separator.
pub fn parse_bbox(text: &str) -> Result<BoundingBox, BboxParseError> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| BboxParseError::MissingBrackets(text.to_string()))?;

    let values = inner
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(parse_value)
        .collect::<Result<Vec<f32>, _>>()?;

    match values[..] {
        [x1, y1, x2, y2] => Ok(BoundingBox::new(x1, y1, x2, y2)),
        _ => Err(BboxParseError::WrongArity(values.len())),
    }
}

fn parse_value(token: &str) -> Result<f32, BboxParseError> {
    token
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| BboxParseError::InvalidNumber(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_space_and_irregular_gaps() {
        let bbox = parse_bbox("[ 10.  20.   30.  40.]").unwrap();
        assert_eq!(bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_exporter_formats() {
        let expected = BoundingBox::new(100.0, 200.0, 300.0, 400.0);
        for text in [
            "[100.  200.   300.  400.]",
            "[100 200 300 400]",
            "[100, 200, 300, 400]",
            "  [100.0\t200.0\n300.0 400.0]  ",
            "[1.e+02 2.e+02 3.e+02 4.e+02]",
        ] {
            assert_eq!(parse_bbox(text).unwrap(), expected, "{text}");
        }
    }

    #[test]
    fn test_fractional_values() {
        let bbox = parse_bbox("[1254.72  1432.3    1564.95 1530.04]").unwrap();
        assert!((bbox.x1 - 1254.72).abs() < 1e-3);
        assert!((bbox.y2 - 1530.04).abs() < 1e-3);
        assert_eq!(bbox.corners(), ((1254, 1432), (1564, 1530)));
    }

    #[test]
    fn test_reparse_is_stable() {
        let first = parse_bbox("[  5.5   6.25 7.  8.]").unwrap();
        let text = format!("[{} {} {} {}]", first.x1, first.y1, first.x2, first.y2);
        assert_eq!(parse_bbox(&text).unwrap(), first);
    }

    #[test]
    fn test_malformed_text() {
        assert_eq!(
            parse_bbox("10 20 30 40"),
            Err(BboxParseError::MissingBrackets("10 20 30 40".to_string()))
        );
        assert_eq!(parse_bbox("[10 20 30]"), Err(BboxParseError::WrongArity(3)));
        assert_eq!(parse_bbox("[]"), Err(BboxParseError::WrongArity(0)));
        assert_eq!(
            parse_bbox("[10 twenty 30 40]"),
            Err(BboxParseError::InvalidNumber("twenty".to_string()))
        );
        assert_eq!(
            parse_bbox("[10 nan 30 40]"),
            Err(BboxParseError::InvalidNumber("nan".to_string()))
        );
    }
}
