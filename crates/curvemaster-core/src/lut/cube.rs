//! Adobe/Resolve `.cube` text format.
//!
//! ```text
//! # Comment
//! TITLE "Warm fade"
//! LUT_3D_SIZE 33
//! DOMAIN_MIN 0.0 0.0 0.0
//! DOMAIN_MAX 1.0 1.0 1.0
//! 0.000000 0.000000 0.000000
//! ...
//! ```
//!
//! Data lines list red varying fastest, then green, then blue. Only 3D LUTs
//! over the unit domain are supported.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{debug, trace};

use super::{Lut3D, LutError, LutResult};

/// Serialize a LUT. An empty `title` omits the `TITLE` line.
pub fn write_cube(lut: &Lut3D, title: &str) -> String {
    let size = lut.resolution();
    let mut out = String::with_capacity(size.pow(3) * 27 + 128);

    out.push_str(&header(size, title));
    for rgb in file_order(lut) {
        out.push_str(&entry_line(rgb));
    }

    out
}

/// Stream a LUT as `.cube` text into `writer`.
pub fn write_cube_to<W: Write>(mut writer: W, lut: &Lut3D, title: &str) -> io::Result<()> {
    writer.write_all(header(lut.resolution(), title).as_bytes())?;
    for rgb in file_order(lut) {
        writer.write_all(entry_line(rgb).as_bytes())?;
    }
    writer.flush()
}

fn header(size: usize, title: &str) -> String {
    let mut out = String::from("# Created by curvemaster\n");
    if !title.is_empty() {
        // Quotes would end the title early
        out.push_str(&format!("TITLE \"{}\"\n", title.replace('"', "'")));
    }
    out.push_str(&format!("LUT_3D_SIZE {}\n", size));
    out.push_str("DOMAIN_MIN 0.0 0.0 0.0\n");
    out.push_str("DOMAIN_MAX 1.0 1.0 1.0\n\n");
    out
}

/// Entries with red varying fastest.
fn file_order(lut: &Lut3D) -> impl Iterator<Item = [f32; 3]> + '_ {
    let size = lut.resolution();
    (0..size).flat_map(move |b| {
        (0..size).flat_map(move |g| (0..size).map(move |r| lut.at(r, g, b)))
    })
}

fn entry_line([r, g, b]: [f32; 3]) -> String {
    format!("{:.6} {:.6} {:.6}\n", r, g, b)
}

/// Parse `.cube` text.
///
/// Comments, blank lines, `TITLE` and unknown keywords are skipped.
pub fn parse_cube(text: &str) -> LutResult<Lut3D> {
    let mut size: Option<usize> = None;
    let mut data: Vec<[f32; 3]> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            continue;
        };

        match head {
            "TITLE" => continue,
            "LUT_3D_SIZE" => {
                let value = parts.next().ok_or_else(|| parse_error(line_no, "missing size"))?;
                let n: usize = value
                    .parse()
                    .map_err(|_| parse_error(line_no, format!("invalid size {:?}", value)))?;
                size = Some(n);
                data.reserve(n.saturating_pow(3).min(super::MAX_RESOLUTION.pow(3)));
            }
            "LUT_1D_SIZE" => {
                return Err(LutError::Unsupported("1D LUTs are not supported".into()));
            }
            "DOMAIN_MIN" => check_domain(parts, 0.0, line_no)?,
            "DOMAIN_MAX" => check_domain(parts, 1.0, line_no)?,
            keyword if keyword.starts_with(|c: char| c.is_ascii_alphabetic()) => {
                trace!(keyword, line = line_no, "Skipping unknown .cube keyword");
            }
            _ => data.push(parse_rgb(head, parts, line_no)?),
        }
    }

    let size = size.ok_or(LutError::MissingSize)?;
    if !(super::MIN_RESOLUTION..=super::MAX_RESOLUTION).contains(&size) {
        return Err(LutError::InvalidResolution(size));
    }
    let expected = size.pow(3);
    if data.len() != expected {
        return Err(LutError::DataLength {
            expected,
            got: data.len(),
        });
    }

    // File order is red fastest, memory order is blue fastest
    let mut reordered = vec![[0.0f32; 3]; expected];
    for (file_index, entry) in data.into_iter().enumerate() {
        let r = file_index % size;
        let g = (file_index / size) % size;
        let b = file_index / (size * size);
        reordered[(r * size + g) * size + b] = entry;
    }

    debug!(resolution = size, "Parsed .cube LUT");
    Lut3D::from_data(size, reordered)
}

/// Read a `.cube` file.
pub fn read_cube<P: AsRef<Path>>(path: P) -> LutResult<Lut3D> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_cube(&text)
}

/// Write a `.cube` file.
pub fn write_cube_file<P: AsRef<Path>>(path: P, lut: &Lut3D, title: &str) -> LutResult<()> {
    let file = File::create(path.as_ref())?;
    write_cube_to(BufWriter::new(file), lut, title)?;
    debug!(path = %path.as_ref().display(), resolution = lut.resolution(), "Wrote .cube LUT");
    Ok(())
}

fn parse_error(line: usize, message: impl Into<String>) -> LutError {
    LutError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_float(token: &str, line: usize) -> LutResult<f32> {
    token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number {:?}", token)))
}

fn parse_rgb<'a>(
    first: &str,
    mut rest: impl Iterator<Item = &'a str>,
    line: usize,
) -> LutResult<[f32; 3]> {
    let g = rest.next().ok_or_else(|| parse_error(line, "expected 3 values"))?;
    let b = rest.next().ok_or_else(|| parse_error(line, "expected 3 values"))?;
    if rest.next().is_some() {
        return Err(parse_error(line, "expected 3 values"));
    }
    Ok([
        parse_float(first, line)?,
        parse_float(g, line)?,
        parse_float(b, line)?,
    ])
}

fn check_domain<'a>(
    mut parts: impl Iterator<Item = &'a str>,
    expected: f32,
    line: usize,
) -> LutResult<()> {
    for _ in 0..3 {
        let token = parts
            .next()
            .ok_or_else(|| parse_error(line, "domain needs 3 values"))?;
        let value = parse_float(token, line)?;
        if (value - expected).abs() > 1e-6 {
            return Err(LutError::Unsupported(format!(
                "domain bound {} (only the unit cube is supported)",
                value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveModel;
    use crate::lut::{Channel, ChannelCurves};

    const RED_FASTEST: &str = r#"
# Test LUT
TITLE "Test Grade"
LUT_3D_SIZE 2
DOMAIN_MIN 0.0 0.0 0.0
DOMAIN_MAX 1.0 1.0 1.0

0.0 0.0 0.0
1.0 0.0 0.0
0.0 1.0 0.0
1.0 1.0 0.0
0.0 0.0 1.0
1.0 0.0 1.0
0.0 1.0 1.0
1.0 1.0 1.0
"#;

    #[test]
    fn test_parse_identity_cube() {
        let lut = parse_cube(RED_FASTEST).unwrap();
        assert_eq!(lut.resolution(), 2);
        assert_eq!(lut, Lut3D::identity(2));
        assert_eq!(lut.get(1, 0, 0), Some([1.0, 0.0, 0.0]));
        assert_eq!(lut.get(0, 0, 1), Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_write_then_parse() {
        let curves = ChannelCurves::new()
            .with_composite(CurveModel::new())
            .with_channel(Channel::Red, CurveModel::parse_or_identity("0,20;255,230"));
        let lut = Lut3D::build(&curves, 5);

        let text = write_cube(&lut, "Warm");
        assert!(text.contains("TITLE \"Warm\""));
        assert!(text.contains("LUT_3D_SIZE 5"));

        let parsed = parse_cube(&text).unwrap();
        assert_eq!(parsed.resolution(), 5);
        for (a, b) in lut.as_slice().iter().zip(parsed.as_slice()) {
            for c in 0..3 {
                assert!((a[c] - b[c]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_write_orders_red_fastest() {
        let text = write_cube(&Lut3D::identity(2), "");
        assert!(!text.contains("TITLE"));
        let data: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        assert_eq!(data.len(), 8);
        assert_eq!(data[1], "1.000000 0.000000 0.000000");
        assert_eq!(data[4], "0.000000 0.000000 1.000000");
    }

    #[test]
    fn test_write_to_matches_string() {
        let lut = Lut3D::identity(3);
        let mut buf = Vec::new();
        write_cube_to(&mut buf, &lut, "Same").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), write_cube(&lut, "Same"));
    }

    #[test]
    fn test_write_to_propagates_errors() {
        struct Full;

        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::WriteZero, "disk full"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = write_cube_to(Full, &Lut3D::identity(2), "").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_unknown_keywords_skipped() {
        let text = RED_FASTEST.replace("TITLE", "LUT_3D_INPUT_RANGE 0.0 1.0\nTITLE");
        assert!(parse_cube(&text).is_ok());
    }

    #[test]
    fn test_missing_size() {
        let text = "0.0 0.0 0.0\n";
        assert!(matches!(parse_cube(text), Err(LutError::MissingSize)));
    }

    #[test]
    fn test_wrong_entry_count() {
        let text = RED_FASTEST
            .trim_end()
            .strip_suffix("1.0 1.0 1.0")
            .unwrap();
        assert!(matches!(
            parse_cube(text),
            Err(LutError::DataLength { expected: 8, got: 7 })
        ));
    }

    #[test]
    fn test_rejects_1d_and_domain() {
        assert!(matches!(
            parse_cube("LUT_1D_SIZE 3\n"),
            Err(LutError::Unsupported(_))
        ));

        let text = RED_FASTEST.replace("DOMAIN_MAX 1.0 1.0 1.0", "DOMAIN_MAX 2.0 2.0 2.0");
        assert!(matches!(parse_cube(&text), Err(LutError::Unsupported(_))));
    }

    #[test]
    fn test_bad_data_line_reports_line() {
        let text = RED_FASTEST.replace("1.0 1.0 0.0", "1.0 x 0.0");
        match parse_cube(&text) {
            Err(LutError::Parse { line, .. }) => assert_eq!(line, 11),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_size_out_of_range() {
        assert!(matches!(
            parse_cube("LUT_3D_SIZE 1\n0 0 0\n"),
            Err(LutError::InvalidResolution(1))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("curvemaster-{}.cube", std::process::id()));
        let lut = Lut3D::identity(3);

        write_cube_file(&path, &lut, "Identity").unwrap();
        let loaded = read_cube(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert!(loaded.is_identity(1e-6));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let result = read_cube("/nonexistent/curvemaster/missing.cube");
        assert!(matches!(result, Err(LutError::Io(_))));
    }
}
