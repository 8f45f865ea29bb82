//! EXIF geotag extraction from images.

use exif::{Exif, In, Reader, Tag, Value};
use image::ImageFormat;
use std::io::Cursor;

use super::coordinates::{normalize_on_axis, Axis, Hemisphere};
use crate::error::CoordinateError;
use crate::types::Coordinates;

/// One raw GPS axis as stored in the image.
#[derive(Debug, Clone, PartialEq)]
pub struct DmsReading {
    /// Degrees, minutes, seconds (normally exactly three)
    pub components: Vec<f64>,
    /// Hemisphere reference text (`N`, `S`, `E`, `W`)
    pub reference: String,
}

/// Raw geotag read from an image, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTag {
    pub latitude: DmsReading,
    pub longitude: DmsReading,
}

impl GeoTag {
    /// Normalize both axes into a validated position.
    pub fn to_coordinates(&self) -> Result<Coordinates, CoordinateError> {
        let lat = Self::axis_value(&self.latitude, Axis::Latitude)?;
        let lng = Self::axis_value(&self.longitude, Axis::Longitude)?;
        Coordinates::new(lat, lng)
    }

    fn axis_value(reading: &DmsReading, axis: Axis) -> Result<f64, CoordinateError> {
        let hemisphere: Hemisphere = reading.reference.parse()?;
        normalize_on_axis(&reading.components, hemisphere, axis)
    }
}

/// Result of looking for a geotag.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// GPS latitude and longitude were found
    Tagged(GeoTag),
    /// No EXIF block, or EXIF without GPS position
    NotPresent,
    /// EXIF was there but unreadable or inconsistent
    Failed(String),
}

/// Extracts geotags from image bytes.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Read the GPS position embedded in an image.
    ///
    /// Most images have no geotag, so `NotPresent` is the common case.
    /// Corrupt containers and half-written GPS blocks are `Failed`.
    pub fn extract(bytes: &[u8]) -> Extraction {
        if !Self::may_carry_exif(bytes) {
            return Extraction::NotPresent;
        }

        let mut cursor = Cursor::new(bytes);
        let exif = match Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return Extraction::NotPresent,
            Err(e) => return Extraction::Failed(e.to_string()),
        };

        let latitude = Self::get_reading(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef);
        let longitude = Self::get_reading(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef);

        match (latitude, longitude) {
            (Reading::Absent, Reading::Absent) => Extraction::NotPresent,
            (Reading::Present(latitude), Reading::Present(longitude)) => {
                Extraction::Tagged(GeoTag {
                    latitude,
                    longitude,
                })
            }
            (Reading::Invalid(message), _) | (_, Reading::Invalid(message)) => {
                Extraction::Failed(message)
            }
            (Reading::Absent, Reading::Present(_)) => {
                Extraction::Failed("GPS longitude without latitude".to_string())
            }
            (Reading::Present(_), Reading::Absent) => {
                Extraction::Failed("GPS latitude without longitude".to_string())
            }
        }
    }

    /// Whether the container is one the EXIF reader can look inside.
    ///
    /// GIF, BMP and the other simple raster formats have no EXIF block at
    /// all. Unrecognized containers are left to the reader.
    fn may_carry_exif(bytes: &[u8]) -> bool {
        match image::guess_format(bytes) {
            Ok(
                ImageFormat::Jpeg
                | ImageFormat::Png
                | ImageFormat::Tiff
                | ImageFormat::WebP
                | ImageFormat::Avif,
            ) => true,
            Ok(_) => false,
            Err(_) => true,
        }
    }

    /// Pair a GPS coordinate tag with its hemisphere reference tag.
    fn get_reading(exif: &Exif, coord_tag: Tag, ref_tag: Tag) -> Reading {
        let coord = exif.get_field(coord_tag, In::PRIMARY);
        let reference = exif.get_field(ref_tag, In::PRIMARY);

        let (coord, reference) = match (coord, reference) {
            (None, None) => return Reading::Absent,
            (Some(coord), Some(reference)) => (coord, reference),
            (Some(_), None) => return Reading::Invalid(format!("{coord_tag} without {ref_tag}")),
            (None, Some(_)) => return Reading::Invalid(format!("{ref_tag} without {coord_tag}")),
        };

        let components = match &coord.value {
            Value::Rational(values) => values.iter().map(|r| r.to_f64()).collect(),
            other => {
                return Reading::Invalid(format!("{coord_tag} has unexpected type {other:?}"))
            }
        };

        let reference = match &reference.value {
            Value::Ascii(values) => values
                .first()
                .map(|v| String::from_utf8_lossy(v).trim().to_string())
                .unwrap_or_default(),
            other => {
                return Reading::Invalid(format!("{ref_tag} has unexpected type {other:?}"))
            }
        };

        Reading::Present(DmsReading {
            components,
            reference,
        })
    }
}

enum Reading {
    Absent,
    Present(DmsReading),
    Invalid(String),
}
