//! SRT station names.

use std::fmt;

use super::ValidationError;

/// Station names accepted by the SRT search form.
///
/// Names must match the site's spelling exactly, including the
/// parenthesised suffixes (e.g. `김천(구미)`).
pub const STATIONS: &[&str] = &[
    "수서",
    "동탄",
    "평택지제",
    "천안아산",
    "오송",
    "대전",
    "김천(구미)",
    "서대구",
    "동대구",
    "경주",
    "신경주",
    "울산(통도사)",
    "부산",
    "포항",
    "밀양",
    "진영",
    "창원중앙",
    "창원",
    "마산",
    "진주",
    "공주",
    "익산",
    "정읍",
    "광주송정",
    "나주",
    "목포",
    "전주",
    "남원",
    "곡성",
    "구례구",
    "순천",
    "여천",
    "여수EXPO",
];

/// Which end of the journey a station was given for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationRole {
    Departure,
    Arrival,
}

impl fmt::Display for StationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationRole::Departure => f.write_str("departure"),
            StationRole::Arrival => f.write_str("arrival"),
        }
    }
}

/// A station known to the SRT booking site.
///
/// Any `Station` value is a member of [`STATIONS`] by construction.
///
/// # Examples
///
/// ```
/// use srt_reserve::domain::{Station, StationRole};
///
/// let dongtan = Station::parse("동탄", StationRole::Departure).unwrap();
/// assert_eq!(dongtan.as_str(), "동탄");
///
/// // Not an SRT station
/// assert!(Station::parse("서울", StationRole::Arrival).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Station(&'static str);

impl Station {
    /// Look up a station by its exact site spelling.
    pub fn parse(name: &str, role: StationRole) -> Result<Self, ValidationError> {
        STATIONS
            .iter()
            .find(|known| **known == name)
            .map(|known| Station(known))
            .ok_or_else(|| ValidationError::InvalidStationName {
                role,
                name: name.to_string(),
            })
    }

    /// Returns the station name as typed into the search form.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station({})", self.0)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_stations() {
        for name in STATIONS {
            let station = Station::parse(name, StationRole::Departure).unwrap();
            assert_eq!(station.as_str(), *name);
        }
    }

    #[test]
    fn reject_unknown_station() {
        let err = Station::parse("서울", StationRole::Arrival).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidStationName {
                role: StationRole::Arrival,
                name: "서울".into(),
            }
        );
    }

    #[test]
    fn reject_partial_name() {
        // The suffix is part of the name the site expects
        assert!(Station::parse("김천", StationRole::Departure).is_err());
        assert!(Station::parse("울산", StationRole::Departure).is_err());
        assert!(Station::parse("", StationRole::Departure).is_err());
        assert!(Station::parse(" 동탄", StationRole::Departure).is_err());
    }

    #[test]
    fn role_is_reported() {
        let err = Station::parse("Seoul", StationRole::Departure).unwrap_err();
        assert_eq!(err.to_string(), "unknown departure station 'Seoul'");
    }

    #[test]
    fn display_and_debug() {
        let station = Station::parse("수서", StationRole::Departure).unwrap();
        assert_eq!(format!("{}", station), "수서");
        assert_eq!(format!("{:?}", station), "Station(수서)");
    }

    #[test]
    fn station_list_has_no_duplicates() {
        use std::collections::HashSet;
        let unique: HashSet<_> = STATIONS.iter().collect();
        assert_eq!(unique.len(), STATIONS.len());
    }
}
