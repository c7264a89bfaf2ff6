use crate::error::ParseError;
use crate::pipeline::parse::Parser;
use crate::types::activity::{Track, TrackPoint};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

pub struct GpxParser;

impl Parser for GpxParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Track>, ParseError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut doc = DocumentState::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = local_name(&e)?;
                    doc.open(&name, &e)?;
                    doc.path.push(name);
                }
                Ok(Event::Empty(e)) => {
                    let name = local_name(&e)?;
                    doc.open(&name, &e)?;
                    doc.close(&name);
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| ParseError::InvalidGpx(e.to_string()))?;
                    doc.text(&text);
                }
                Ok(Event::CData(e)) => {
                    let text = std::str::from_utf8(&e)
                        .map_err(|e| ParseError::InvalidGpx(e.to_string()))?;
                    doc.text(text);
                }
                Ok(Event::End(_)) => {
                    if let Some(name) = doc.path.pop() {
                        doc.close(&name);
                    }
                }
                Ok(Event::Eof) => {
                    if !doc.path.is_empty() {
                        return Err(ParseError::InvalidGpx(
                            "unexpected end of document".to_string(),
                        ));
                    }
                    break;
                }
                Err(e) => return Err(ParseError::InvalidGpx(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        doc.finish()
    }
}

#[derive(Default)]
struct DocumentState {
    path: Vec<String>,
    tracks: Vec<Track>,
    metadata_name: Option<String>,
    point: Option<TrackPoint>,
    has_root: bool,
}

impl DocumentState {
    fn open(&mut self, name: &str, start: &BytesStart) -> Result<(), ParseError> {
        match name {
            "gpx" if self.path.is_empty() => self.has_root = true,
            "trk" => self.tracks.push(Track::default()),
            "trkseg" => {
                if let Some(track) = self.tracks.last_mut() {
                    track.segments.push(Vec::new());
                }
            }
            "trkpt" if !self.tracks.is_empty() => {
                self.point = Some(parse_position(start)?);
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &str) {
        if name != "trkpt" {
            return;
        }
        let (Some(point), Some(track)) = (self.point.take(), self.tracks.last_mut()) else {
            return;
        };
        match track.segments.last_mut() {
            Some(segment) => segment.push(point),
            None => track.segments.push(vec![point]),
        }
    }

    fn text(&mut self, text: &str) {
        let Some(current) = self.path.last() else {
            return;
        };
        let text = text.trim();

        if let Some(point) = self.point.as_mut() {
            match current.as_str() {
                "ele" => point.elevation = text.parse().ok().filter(|v: &f64| v.is_finite()),
                "time" => point.time = parse_time(text),
                "steps" => point.steps = text.parse().ok(),
                _ => {}
            }
            return;
        }

        if current == "name" {
            let parent = self.path.len().checked_sub(2).map(|i| self.path[i].as_str());
            match parent {
                Some("trk") => {
                    if let Some(track) = self.tracks.last_mut() {
                        track.name = text.to_string();
                    }
                }
                Some("metadata") => self.metadata_name = Some(text.to_string()),
                _ => {}
            }
        }
    }

    fn finish(self) -> Result<Vec<Track>, ParseError> {
        if !self.has_root {
            return Err(ParseError::InvalidGpx("missing <gpx> root element".to_string()));
        }

        let fallback_name = self.metadata_name.unwrap_or_default();
        Ok(self
            .tracks
            .into_iter()
            .map(|mut track| {
                if track.name.is_empty() {
                    track.name = fallback_name.clone();
                }
                track
            })
            .collect())
    }
}

fn local_name(e: &BytesStart) -> Result<String, ParseError> {
    let name = e.local_name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_string)
        .map_err(|e| ParseError::InvalidGpx(e.to_string()))
}

fn parse_position(e: &BytesStart) -> Result<TrackPoint, ParseError> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| ParseError::InvalidGpx(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| ParseError::InvalidGpx(e.to_string()))?;
        let value = std::str::from_utf8(&attr.value)
            .map_err(|e| ParseError::InvalidGpx(e.to_string()))?;

        match key {
            "lat" => lat = Some(parse_degrees(value, 90.0, "lat")?),
            "lon" => lon = Some(parse_degrees(value, 180.0, "lon")?),
            _ => {}
        }
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(TrackPoint::new(lat, lon)),
        _ => Err(ParseError::InvalidGpx(
            "trkpt is missing lat or lon".to_string(),
        )),
    }
}

/// RFC 3339 timestamps, or zoneless ones read as UTC.
fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    text.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| text.parse::<NaiveDateTime>().ok().map(|t| t.and_utc()))
}

fn parse_degrees(value: &str, limit: f64, attr: &str) -> Result<f64, ParseError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
        .ok_or_else(|| ParseError::InvalidGpx(format!("invalid {attr} value {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(xml: &str) -> Result<Vec<Track>, ParseError> {
        GpxParser.parse(xml.as_bytes())
    }

    #[test]
    fn reads_tracks_segments_and_points() {
        let tracks = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns:ns3="http://www.garmin.com/xmlschemas/TrackPointExtension/v1">
  <trk>
    <name>Morning Run</name>
    <trkseg>
      <trkpt lat="37.7749" lon="-122.4194">
        <ele>12.5</ele>
        <time>2024-03-10T07:30:00Z</time>
        <extensions><ns3:TrackPointExtension><ns3:steps>42</ns3:steps></ns3:TrackPointExtension></extensions>
      </trkpt>
      <trkpt lat="37.7750" lon="-122.4195"/>
    </trkseg>
    <trkseg>
      <trkpt lat="37.7760" lon="-122.4200"><ele>14</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#,
        )
        .unwrap();

        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.name, "Morning Run");
        assert_eq!(track.segments.len(), 2);
        assert_eq!(track.segments[0].len(), 2);

        let first = &track.segments[0][0];
        assert_eq!(first.lat, 37.7749);
        assert_eq!(first.lon, -122.4194);
        assert_eq!(first.elevation, Some(12.5));
        assert_eq!(
            first.time,
            Some(Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap())
        );
        assert_eq!(first.steps, Some(42));

        assert_eq!(track.segments[0][1], TrackPoint::new(37.7750, -122.4195));
        assert_eq!(track.segments[1][0].elevation, Some(14.0));
    }

    #[test]
    fn falls_back_to_metadata_name() {
        let tracks = parse(
            r#"<gpx><metadata><name>Lunch &amp; Loop</name></metadata>
<trk><trkseg><trkpt lat="1" lon="2"/></trkseg></trk></gpx>"#,
        )
        .unwrap();
        assert_eq!(tracks[0].name, "Lunch & Loop");
    }

    #[test]
    fn waypoint_names_do_not_leak_into_tracks() {
        let tracks = parse(
            r#"<gpx><wpt lat="1" lon="1"><name>Water</name></wpt>
<trk><name>Hills</name><trkseg><trkpt lat="1" lon="2"><name>pt</name></trkpt></trkseg></trk></gpx>"#,
        )
        .unwrap();
        assert_eq!(tracks[0].name, "Hills");
        assert_eq!(tracks[0].point_count(), 1);
    }

    #[test]
    fn zoneless_times_are_read_as_utc() {
        let tracks = parse(
            r#"<gpx><trk><trkseg>
<trkpt lat="1" lon="2"><time>2024-03-10T07:30:00</time></trkpt>
<trkpt lat="1" lon="2.001"><time>2024-03-10T07:31:00.250</time></trkpt>
<trkpt lat="1" lon="2.002"><time>2024-03-10T09:31:00+02:00</time></trkpt>
</trkseg></trk></gpx>"#,
        )
        .unwrap();

        let times: Vec<_> = tracks[0].points().map(|p| p.time).collect();
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap();
        assert_eq!(
            times,
            vec![
                Some(start),
                Some(start + chrono::Duration::milliseconds(60_250)),
                Some(start + chrono::Duration::seconds(60)),
            ]
        );

        let timing = crate::pipeline::temporal::summarize_timing(&tracks[0]);
        assert_eq!(timing.duration_seconds, 60.0);
    }

    #[test]
    fn no_tracks_is_not_a_decode_error() {
        let tracks = parse(r#"<gpx version="1.1"><metadata/></gpx>"#).unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn bad_optional_values_are_dropped() {
        let tracks = parse(
            r#"<gpx><trk><trkseg><trkpt lat="1" lon="2"><ele>high</ele><time>yesterday</time><steps>-3</steps></trkpt></trkseg></trk></gpx>"#,
        )
        .unwrap();
        assert_eq!(tracks[0].segments[0][0], TrackPoint::new(1.0, 2.0));
    }

    #[test]
    fn rejects_invalid_coordinates() {
        assert!(parse(r#"<gpx><trk><trkseg><trkpt lat="95" lon="2"/></trkseg></trk></gpx>"#).is_err());
        assert!(parse(r#"<gpx><trk><trkseg><trkpt lat="1"/></trkseg></trk></gpx>"#).is_err());
        assert!(parse(r#"<gpx><trk><trkseg><trkpt lat="x" lon="2"/></trkseg></trk></gpx>"#).is_err());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse("<gpx><trk></gpx>").is_err());
        assert!(parse("<gpx><trk><trkseg>").is_err());
        assert!(parse("not xml at all").is_err());
        assert!(parse(r#"<kml><Placemark/></kml>"#).is_err());
    }
}
