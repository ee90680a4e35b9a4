use std::io::Cursor;

use crate::domain::{CaptureHints, Timestamp};

/// Pre-extract capture hints from an image payload's EXIF block.
///
/// Returns `None` when the payload has no readable EXIF data or none of the
/// fields of interest are present.
pub fn capture_hints(bytes: &[u8]) -> Option<CaptureHints> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let date_taken = [
        exif::Tag::DateTimeOriginal,
        exif::Tag::DateTimeDigitized,
        exif::Tag::DateTime,
    ]
    .iter()
    .filter_map(|tag| ascii_field(&exif, *tag))
    .map(|text| Timestamp::parse(&text))
    .find(Timestamp::is_valid);

    let camera = camera_name(
        ascii_field(&exif, exif::Tag::Make),
        ascii_field(&exif, exif::Tag::Model),
    );

    let latitude = gps_coordinate(&exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef);
    let longitude = gps_coordinate(&exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef);
    let location = match (latitude, longitude) {
        (Some(lat), Some(lng)) => Some(format!("{lat:.6}, {lng:.6}")),
        _ => None,
    };

    let hints = CaptureHints {
        date_taken,
        location,
        camera,
        latitude: latitude.filter(|_| longitude.is_some()),
        longitude: longitude.filter(|_| latitude.is_some()),
    };

    if hints == CaptureHints::default() {
        None
    } else {
        Some(hints)
    }
}

/// First ASCII value of a primary-IFD field, trimmed of padding.
fn ascii_field(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    match &field.value {
        exif::Value::Ascii(values) => {
            let text = String::from_utf8_lossy(values.first()?);
            let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

/// "Make Model", without repeating the make when the model already starts with it.
fn camera_name(make: Option<String>, model: Option<String>) -> Option<String> {
    match (make, model) {
        (Some(make), Some(model)) => {
            if model.to_lowercase().starts_with(&make.to_lowercase()) {
                Some(model)
            } else {
                Some(format!("{make} {model}"))
            }
        }
        (None, Some(model)) => Some(model),
        (Some(make), None) => Some(make),
        (None, None) => None,
    }
}

/// Decimal degrees from a degrees/minutes/seconds triple; S and W are negative.
fn gps_coordinate(exif: &exif::Exif, coord_tag: exif::Tag, ref_tag: exif::Tag) -> Option<f64> {
    let field = exif.get_field(coord_tag, exif::In::PRIMARY)?;
    let parts = match &field.value {
        exif::Value::Rational(parts) if parts.len() >= 3 => parts,
        _ => return None,
    };

    let decimal = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;
    if !decimal.is_finite() {
        return None;
    }

    match ascii_field(exif, ref_tag).as_deref() {
        Some("S") | Some("W") => Some(-decimal),
        _ => Some(decimal),
    }
}
