//! SAME header records and wire format
//!
//! The [`SameHeader`] is the structured form of the digital header
//! which precedes a SAME/EAS voice message. Its wire format is fixed
//! by FCC Part 11:
//!
//! ```txt
//! ZCZC-ORG-EEE-PSSCCC[-PSSCCC...]+TTTT-JJJHHMM-LLLLLLLL-
//! ```
//!
//! A `SameHeader` may be built from its fields (for transmission) or
//! parsed from a received string (for reception). `Display` always
//! emits the exact wire representation.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use arrayvec::{ArrayString, ArrayVec};
#[cfg(feature = "chrono")]
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::samecodes::{self, EventCode, Originator};

/// Maximum number of location codes in one header
pub const MAX_LOCATIONS: usize = 31;

/// Maximum wire length of a header, in bytes
///
/// A header with all 31 location codes populated is exactly this
/// long. Anything longer is structurally invalid.
pub const MAX_HEADER_LENGTH: usize = 252;

/// Wire prefix which begins every header burst
pub const PREFIX_HEADER: &str = "ZCZC-";

/// Wire literal for the end-of-message burst
pub const PREFIX_EOM: &str = "NNNN";

/// A malformed or out-of-range header field
///
/// Returned by [`SameHeader::validate()`] and the field constructors.
/// Each variant names the offending field via
/// [`field()`](ValidationError::field). Encoders must treat any
/// `ValidationError` as fatal to the call: no audio may be generated
/// from an invalid header.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Originator code absent from the registry or not transmittable
    #[error("originator \"{0}\" may not be transmitted")]
    Originator(String),

    /// Event code absent from the registry
    #[error("event code \"{0}\" is not in the registry")]
    Event(String),

    /// Too few or too many location codes
    #[error("got {0} location codes; a header carries 1 to 31")]
    LocationCount(usize),

    /// A location code that is not six digits with a known state code
    #[error("location code \"{0}\" is malformed or unregistered")]
    Location(String),

    /// A duration of zero, or one that does not fit the TTTT field
    #[error("valid duration must be positive and at most 99 h 59 min")]
    Duration,

    /// Julian day outside 1–366 or time outside the 24-hour clock
    #[error("issue time must be a valid Julian day and 24-hour time")]
    IssueTime,

    /// Station id empty, too long, or holding a forbidden character
    #[error("station id \"{0}\" is not a valid SAME callsign field")]
    StationId(String),

    /// No issue time was given and no clock is available
    #[error("an issue time is required (crate built without `chrono`)")]
    MissingIssueTime,
}

impl ValidationError {
    /// Name of the header field that failed validation
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Originator(_) => "originator",
            ValidationError::Event(_) => "event_code",
            ValidationError::LocationCount(_) | ValidationError::Location(_) => "location_codes",
            ValidationError::Duration => "valid_duration",
            ValidationError::IssueTime | ValidationError::MissingIssueTime => "issue_time",
            ValidationError::StationId(_) => "station_id",
        }
    }
}

/// Error decoding a received header string
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageDecodeErr {
    /// The starting prefix of the burst was not recognized
    #[error("invalid SAME header: unrecognized prefix")]
    UnrecognizedPrefix,

    /// Header contains non-ASCII characters
    #[error("invalid SAME header: message contains non-ASCII characters")]
    NotAscii,

    /// Header is shorter than the minimum length for a valid message
    #[error("invalid SAME header: decoded message too short")]
    TooShort,

    /// Header does not match the required wire pattern
    #[error("invalid SAME header: message text does not match required pattern")]
    Malformed,
}

/// An invalid issuance time
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
#[error("message issuance time not valid for its receive time")]
pub struct InvalidDateErr {}

/// A six-digit SAME/FIPS location code, `PSSCCC`
///
/// - `P`: part of county, or zero for the entire county
/// - `SS`: FIPS state code
/// - `CCC`: FIPS county code
///
/// ```
/// use samewave::LocationCode;
///
/// let loc: LocationCode = "039173".parse().unwrap();
/// assert_eq!("0", loc.part_str());
/// assert_eq!("39", loc.state_str());
/// assert_eq!("173", loc.county_str());
/// assert!(loc.is_registered());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationCode(ArrayString<6>);

impl LocationCode {
    /// Six-digit string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// County subdivision digit
    pub fn part_str(&self) -> &str {
        &self.0[0..1]
    }

    /// FIPS state code
    pub fn state_str(&self) -> &str {
        &self.0[1..3]
    }

    /// FIPS county code
    pub fn county_str(&self) -> &str {
        &self.0[3..6]
    }

    /// True if the state code is in the registry
    ///
    /// Structurally-valid codes with unknown state codes parse fine;
    /// encoders use this check to refuse them.
    pub fn is_registered(&self) -> bool {
        samecodes::is_state_code(self.state_str())
    }
}

impl FromStr for LocationCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::Location(s.to_owned()));
        }
        Ok(Self(ArrayString::from(s).expect("length checked")))
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for LocationCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Message validity duration: the `TTTT` field
///
/// Wire format is hours and minutes, so `+0045` is 45 minutes and
/// `+0130` is 1 hour 30 minutes. This is the validity time of the
/// *message*, not the expected duration of the hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValidDuration {
    hours: u8,
    minutes: u8,
}

impl ValidDuration {
    /// New duration from hours and minutes
    ///
    /// The duration must be positive and fit the four-digit field.
    pub fn new(hours: u8, minutes: u8) -> Result<Self, ValidationError> {
        if (hours == 0 && minutes == 0) || hours > 99 || minutes > 59 {
            return Err(ValidationError::Duration);
        }
        Ok(Self { hours, minutes })
    }

    /// New duration from a total count of minutes
    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        if minutes == 0 || minutes > 99 * 60 + 59 {
            return Err(ValidationError::Duration);
        }
        Ok(Self {
            hours: (minutes / 60) as u8,
            minutes: (minutes % 60) as u8,
        })
    }

    /// Duration fields as (`hours`, `minutes`)
    pub fn fields(&self) -> (u8, u8) {
        (self.hours, self.minutes)
    }

    /// Total duration in minutes
    pub fn total_minutes(&self) -> u32 {
        self.hours as u32 * 60 + self.minutes as u32
    }

    /// Duration as a chrono type
    #[cfg(feature = "chrono")]
    pub fn to_duration(&self) -> Duration {
        Duration::hours(self.hours as i64) + Duration::minutes(self.minutes as i64)
    }

    // Parse from the four-digit wire field
    fn from_wire(s: &str) -> Result<Self, ValidationError> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::Duration);
        }
        Self::new(
            s[0..2].parse().expect("digits checked"),
            s[2..4].parse().expect("digits checked"),
        )
    }
}

impl fmt::Display for ValidDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.hours, self.minutes)
    }
}

/// Message issuance time: the `JJJHHMM` field
///
/// - `JJJ`: ordinal (Julian) day of the year, 1–366. It is up to the
///   receiving station to know what the current year is.
/// - `HHMM`: UTC time of day on a 24-hour clock. These are **not**
///   local times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IssueTime {
    day: u16,
    hour: u8,
    minute: u8,
}

impl IssueTime {
    /// New issuance time from its wire fields
    pub fn new(day: u16, hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if !(1..=366).contains(&day) || hour > 23 || minute > 59 {
            return Err(ValidationError::IssueTime);
        }
        Ok(Self { day, hour, minute })
    }

    /// Issuance fields as (`day`, `hour`, `minute`)
    pub fn fields(&self) -> (u16, u8, u8) {
        (self.day, self.hour, self.minute)
    }

    /// Issuance time of a UTC timestamp, truncated to the minute
    #[cfg(feature = "chrono")]
    pub fn from_datetime(when: &DateTime<Utc>) -> Self {
        Self {
            day: when.ordinal() as u16,
            hour: when.hour() as u8,
            minute: when.minute() as u8,
        }
    }

    /// Estimated issuance datetime (UTC)
    ///
    /// SAME headers omit the year, so the true UTC time must be
    /// estimated from the time the message was `received`. The
    /// `received` estimate may be off by up to ±90 days without
    /// affecting the result.
    ///
    /// An error is returned if no valid timestamp exists—for
    /// example, a day-366 message projected into a non-leap year.
    #[cfg(feature = "chrono")]
    pub fn to_datetime(&self, received: &DateTime<Utc>) -> Result<DateTime<Utc>, InvalidDateErr> {
        calculate_issue_time(
            (self.day, self.hour, self.minute),
            (received.year(), received.ordinal()),
        )
    }

    // Parse from the seven-digit wire field
    fn from_wire(s: &str) -> Result<Self, ValidationError> {
        if s.len() != 7 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::IssueTime);
        }
        Self::new(
            s[0..3].parse().expect("digits checked"),
            s[3..5].parse().expect("digits checked"),
            s[5..7].parse().expect("digits checked"),
        )
    }
}

impl fmt::Display for IssueTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}{:02}{:02}", self.day, self.hour, self.minute)
    }
}

/// Event, area, time, and originator information
///
/// Build one for transmission:
///
/// ```
/// use samewave::{IssueTime, Originator, SameHeader, ValidDuration};
///
/// let hdr = SameHeader::new(
///     Originator::WeatherService,
///     "TOR",
///     &["039173"],
///     ValidDuration::from_minutes(45).unwrap(),
///     Some(IssueTime::new(12, 14, 15).unwrap()),
///     "KEAS",
/// ).unwrap();
///
/// assert_eq!(
///     "ZCZC-WXR-TOR-039173+0045-0121415-KEAS    -",
///     &hdr.to_string()
/// );
/// ```
///
/// or parse one from a received burst with
/// [`parse()`](SameHeader::parse). Parsing performs only *structural*
/// validation; [`validate()`](SameHeader::validate) adds the registry
/// checks an encoder must pass.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SameHeader {
    // originator and event are stored as their wire strings so that
    // received headers round-trip even when unregistered
    org: ArrayString<3>,
    event: ArrayString<3>,
    locations: ArrayVec<LocationCode, MAX_LOCATIONS>,
    duration: ValidDuration,
    issue: Option<IssueTime>,
    station: ArrayString<8>,
}

impl SameHeader {
    /// New header from its fields
    ///
    /// `event` is the three-character SAME event code. `locations`
    /// holds 1 to 31 six-digit location codes. The `station` id may
    /// be 1 to 8 characters and is space-padded on the wire; minus
    /// signs are not allowed in it (senders substitute `/`).
    ///
    /// Pass `None` for `issue` to have the encoder stamp the header
    /// from the wall clock at encode time.
    ///
    /// Everything except registry membership is checked here;
    /// registry membership is checked by
    /// [`validate()`](Self::validate), which the encoder always
    /// calls.
    pub fn new<E, L, S>(
        originator: Originator,
        event: E,
        locations: &[L],
        duration: ValidDuration,
        issue: Option<IssueTime>,
        station: S,
    ) -> Result<Self, ValidationError>
    where
        E: AsRef<str>,
        L: AsRef<str>,
        S: AsRef<str>,
    {
        if !originator.is_transmittable() {
            return Err(ValidationError::Originator(
                originator.as_str().to_owned(),
            ));
        }

        let event = ArrayString::from(event.as_ref())
            .map_err(|_| ValidationError::Event(event.as_ref().to_owned()))?;
        if event.len() != 3 {
            return Err(ValidationError::Event(event.to_string()));
        }

        if locations.is_empty() || locations.len() > MAX_LOCATIONS {
            return Err(ValidationError::LocationCount(locations.len()));
        }
        let mut locs = ArrayVec::new();
        for loc in locations {
            locs.push(loc.as_ref().parse::<LocationCode>()?);
        }

        Ok(Self {
            org: ArrayString::from(originator.as_str()).expect("originator codes are 3 chars"),
            event,
            locations: locs,
            duration,
            issue,
            station: station_field(station.as_ref())?,
        })
    }

    /// Parse a received header string
    ///
    /// The string must begin with `ZCZC-` and match the general wire
    /// pattern. Trailing garbage after the final dash is ignored.
    /// Only structural validation is performed: unregistered
    /// originator, event, and state codes all parse successfully,
    /// because a receiver should not discard a message it merely
    /// does not recognize.
    pub fn parse(message: &str) -> Result<Self, MessageDecodeErr> {
        if !message.is_ascii() {
            return Err(MessageDecodeErr::NotAscii);
        }
        if !message.starts_with(PREFIX_HEADER) {
            return Err(MessageDecodeErr::UnrecognizedPrefix);
        }
        if message.len() < MIN_HEADER_LENGTH {
            return Err(MessageDecodeErr::TooShort);
        }

        lazy_static! {
            static ref RE: Regex = Regex::new(
                r"^ZCZC-([A-Z]{3})-([A-Z0-9]{3})((?:-[0-9]{6})+)\+([0-9]{4})-([0-9]{7})-(.{1,8}?) *-"
            )
            .expect("bad SAME regexp");
        }

        let caps = RE.captures(message).ok_or(MessageDecodeErr::Malformed)?;

        let mut locations = ArrayVec::new();
        for loc in caps
            .get(3)
            .expect("group 3 always captured")
            .as_str()
            .split('-')
            .skip(1)
        {
            if locations.is_full() {
                return Err(MessageDecodeErr::Malformed);
            }
            locations.push(
                loc.parse::<LocationCode>()
                    .map_err(|_| MessageDecodeErr::Malformed)?,
            );
        }

        let duration = ValidDuration::from_wire(caps.get(4).expect("captured").as_str())
            .map_err(|_| MessageDecodeErr::Malformed)?;
        let issue = IssueTime::from_wire(caps.get(5).expect("captured").as_str())
            .map_err(|_| MessageDecodeErr::Malformed)?;
        let station = station_field(caps.get(6).expect("captured").as_str())
            .map_err(|_| MessageDecodeErr::Malformed)?;

        Ok(Self {
            org: ArrayString::from(caps.get(1).expect("captured").as_str())
                .expect("regex guarantees 3 chars"),
            event: ArrayString::from(caps.get(2).expect("captured").as_str())
                .expect("regex guarantees 3 chars"),
            locations,
            duration,
            issue: Some(issue),
            station,
        })
    }

    /// Registry validation, required before transmission
    ///
    /// Checks the originator, event code, and every location code
    /// against the [code registry](crate::samecodes). Structural
    /// invariants are established at construction; this adds the
    /// semantic checks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.originator().is_transmittable() {
            return Err(ValidationError::Originator(self.org.to_string()));
        }

        samecodes::require_event(&self.event)
            .map_err(|e| ValidationError::Event(e.0))?;

        for loc in &self.locations {
            if !loc.is_registered() {
                return Err(ValidationError::Location(loc.as_str().to_owned()));
            }
        }

        Ok(())
    }

    /// Originator code
    pub fn originator(&self) -> Originator {
        Originator::from(self.org.as_str())
    }

    /// Originator code, as its three-character wire string
    pub fn originator_str(&self) -> &str {
        &self.org
    }

    /// Event code, decoded against the registry
    ///
    /// Unregistered codes return an event whose
    /// [phenomenon](crate::Phenomenon) is `Unrecognized`; such a
    /// message is still valid and should not be discarded.
    pub fn event(&self) -> EventCode {
        EventCode::from(self.event.as_str())
    }

    /// Event code, as its three-character wire string
    pub fn event_str(&self) -> &str {
        &self.event
    }

    /// Location codes, in message order
    pub fn locations(&self) -> &[LocationCode] {
        &self.locations
    }

    /// Message validity duration
    pub fn valid_duration(&self) -> ValidDuration {
        self.duration
    }

    /// Message issuance day/time, if set
    pub fn issue_time(&self) -> Option<IssueTime> {
        self.issue
    }

    /// Sending station callsign field, without wire padding
    pub fn station_id(&self) -> &str {
        self.station.trim_end_matches(' ')
    }

    /// Sending station callsign field, space-padded to 8 characters
    pub fn station_id_padded(&self) -> String {
        format!("{:<8}", self.station)
    }

    /// A copy of this header with the given issuance time
    pub fn with_issue_time(&self, issue: IssueTime) -> Self {
        let mut out = self.clone();
        out.issue = Some(issue);
        out
    }

    /// Is the message expired?
    ///
    /// Given the current time, determine if this message's validity
    /// period has elapsed. An expired message may still refer to an
    /// *ongoing hazard*; expiration merely means the message should
    /// not be relayed or alerted to anymore.
    #[cfg(feature = "chrono")]
    pub fn is_expired_at(&self, now: &DateTime<Utc>) -> bool {
        match self.issue.map(|i| i.to_datetime(now)) {
            Some(Ok(issue_ts)) => issue_ts + self.duration.to_duration() < *now,
            _ => false,
        }
    }
}

impl fmt::Display for SameHeader {
    /// Emits the exact wire representation
    ///
    /// An unset issuance time is rendered as `0000000`; the encoder
    /// never transmits one, because it stamps the header first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZCZC-{}-{}", self.org, self.event)?;
        for loc in &self.locations {
            write!(f, "-{}", loc)?;
        }
        write!(f, "+{}-", self.duration)?;
        match &self.issue {
            Some(issue) => write!(f, "{}", issue)?,
            None => write!(f, "0000000")?,
        }
        write!(f, "-{:<8}-", self.station.as_str())
    }
}

impl TryFrom<&str> for SameHeader {
    type Error = MessageDecodeErr;

    fn try_from(inp: &str) -> Result<Self, Self::Error> {
        Self::parse(inp)
    }
}

/// Validate a header for transmission
///
/// Convenience for [`SameHeader::validate()`]; part of the crate's
/// top-level API surface.
pub fn validate_header(header: &SameHeader) -> Result<(), ValidationError> {
    header.validate()
}

// Minimum length of a plausible header: one location and a
// single-character callsign field
const MIN_HEADER_LENGTH: usize = 35;

// Build the 8-character station field
//
// SAME callsign fields pad short callsigns with trailing spaces.
// Minus signs would break dash framing and are forbidden; senders
// substitute `/` (e.g. `KLOX/NWS`).
fn station_field(s: &str) -> Result<ArrayString<8>, ValidationError> {
    let trimmed = s.trim_end_matches(' ');
    if trimmed.is_empty()
        || trimmed.len() > 8
        || !trimmed
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'/' || b == b' ')
    {
        return Err(ValidationError::StationId(s.to_owned()));
    }

    Ok(ArrayString::from(trimmed).expect("length checked"))
}

// Calculate message issuance time
//
// Calculate the Utc datetime of message issuance from the fields
// encoded into the `message` and a local estimate of when the
// message was `received`.
#[cfg(feature = "chrono")]
fn calculate_issue_time(
    message: (u16, u8, u8),
    received: (i32, u32),
) -> Result<DateTime<Utc>, InvalidDateErr> {
    let (day_of_year, hour, minute) = message;
    let (rx_year, rx_day_of_year) = received;

    let daydiff = rx_day_of_year as i32 - day_of_year as i32;
    let msg_year = if daydiff >= 180 {
        // the UTC new year has likely arrived; this message is from
        // next year
        rx_year.saturating_add(1)
    } else if daydiff <= -180 {
        // more likely a message from last UTC year than a very stale
        // one
        rx_year.saturating_sub(1)
    } else {
        rx_year
    };

    Ok(chrono::NaiveDate::from_yo_opt(msg_year, day_of_year as u32)
        .ok_or(InvalidDateErr {})?
        .and_hms_opt(hour as u32, minute as u32, 0)
        .ok_or(InvalidDateErr {})?
        .and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "chrono")]
    use chrono::TimeZone;

    use crate::samecodes::{Phenomenon, SignificanceLevel};

    fn header_with_locations(count: usize) -> Result<SameHeader, ValidationError> {
        let locs: Vec<String> = (0..count).map(|i| format!("0390{:02}", i % 100)).collect();
        SameHeader::new(
            Originator::WeatherService,
            "RWT",
            &locs,
            ValidDuration::from_minutes(15).unwrap(),
            Some(IssueTime::new(1, 11, 22).unwrap()),
            "NOCALL00",
        )
    }

    #[test]
    fn test_concrete_scenario() {
        let hdr = SameHeader::new(
            Originator::WeatherService,
            "TOR",
            &["039173"],
            ValidDuration::from_minutes(45).unwrap(),
            Some(IssueTime::new(12, 14, 15).unwrap()),
            "KEAS    ",
        )
        .expect("valid header");

        assert_eq!("ZCZC-WXR-TOR-039173+0045-0121415-KEAS    -", &hdr.to_string());
        assert!(hdr.validate().is_ok());
        assert_eq!("KEAS", hdr.station_id());
        assert_eq!("KEAS    ", hdr.station_id_padded());
    }

    #[test]
    fn test_parse_round_trip() {
        const WIRE: &str = "ZCZC-WXR-RWT-012345-567890-888990+0015-0321115-KLOX/NWS-";

        let hdr = SameHeader::parse(WIRE).expect("parse");
        assert_eq!(Originator::WeatherService, hdr.originator());
        assert_eq!("RWT", hdr.event_str());
        assert_eq!(Phenomenon::RequiredWeeklyTest, hdr.event().phenomenon());
        assert_eq!(SignificanceLevel::Test, hdr.event().significance());
        assert_eq!(3, hdr.locations().len());
        assert_eq!("012345", hdr.locations()[0].as_str());
        assert_eq!((0, 15), hdr.valid_duration().fields());
        assert_eq!((32, 11, 15), hdr.issue_time().unwrap().fields());
        assert_eq!("KLOX/NWS", hdr.station_id());

        assert_eq!(WIRE, &hdr.to_string());
    }

    #[test]
    fn test_parse_trailing_garbage() {
        const WIRE: &str = "ZCZC-EAS-DMO-999000+0015-0011122-NOCALL00-} x7T";

        let hdr = SameHeader::parse(WIRE).expect("parse");
        assert_eq!("ZCZC-EAS-DMO-999000+0015-0011122-NOCALL00-", &hdr.to_string());
    }

    #[test]
    fn test_parse_short_station_pads() {
        const WIRE: &str = "ZCZC-CIV-CEM-011001+0100-0351700-KAB     -";

        let hdr = SameHeader::parse(WIRE).expect("parse");
        assert_eq!("KAB", hdr.station_id());
        // short callsigns re-pad to the full eight characters
        assert_eq!(WIRE, &hdr.to_string());
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(
            Err(MessageDecodeErr::UnrecognizedPrefix),
            SameHeader::parse("NNNN")
        );
        assert_eq!(
            Err(MessageDecodeErr::TooShort),
            SameHeader::parse("ZCZC-WXR-TOR-")
        );
        assert_eq!(
            Err(MessageDecodeErr::Malformed),
            SameHeader::parse("ZCZC-WXR-TOR-03917+0045-0121415-KEAS    -")
        );
        assert_eq!(
            Err(MessageDecodeErr::Malformed),
            SameHeader::parse("ZCZC-WXR-TOR-039173-0045-0121415-KEAS    -")
        );
        // hour 25 is structurally numeric but not a valid clock time
        assert_eq!(
            Err(MessageDecodeErr::Malformed),
            SameHeader::parse("ZCZC-WXR-TOR-039173+0045-0122515-KEAS    -")
        );
        assert_eq!(
            Err(MessageDecodeErr::NotAscii),
            SameHeader::parse("ZCZC-WXR-TÖR-039173+0045-0121415-KEAS    -")
        );
    }

    #[test]
    fn test_location_bounds() {
        assert!(header_with_locations(1).is_ok());
        assert!(header_with_locations(MAX_LOCATIONS).is_ok());
        assert_eq!(
            Err(ValidationError::LocationCount(0)),
            header_with_locations(0)
        );
        assert_eq!(
            Err(ValidationError::LocationCount(32)),
            header_with_locations(32)
        );

        // a maximum-length header is exactly MAX_HEADER_LENGTH bytes
        let hdr = header_with_locations(MAX_LOCATIONS).unwrap();
        assert_eq!(MAX_HEADER_LENGTH, hdr.to_string().len());
    }

    #[test]
    fn test_validation_errors_name_fields() {
        let bad_event = SameHeader::new(
            Originator::CivilAuthority,
            "XXX",
            &["039173"],
            ValidDuration::from_minutes(15).unwrap(),
            None,
            "NOCALL00",
        )
        .unwrap();
        let err = bad_event.validate().unwrap_err();
        assert_eq!(ValidationError::Event("XXX".to_owned()), err);
        assert_eq!("event_code", err.field());

        // state code 99 is not registered; structural parse accepts it
        let bad_loc = SameHeader::new(
            Originator::CivilAuthority,
            "CEM",
            &["199173"],
            ValidDuration::from_minutes(15).unwrap(),
            None,
            "NOCALL00",
        )
        .unwrap();
        let err = bad_loc.validate().unwrap_err();
        assert_eq!(ValidationError::Location("199173".to_owned()), err);
        assert_eq!("location_codes", err.field());

        assert_eq!(
            "valid_duration",
            ValidationError::Duration.field()
        );
    }

    #[test]
    fn test_field_constructors() {
        assert!(ValidDuration::from_minutes(0).is_err());
        assert!(ValidDuration::from_minutes(45).is_ok());
        assert_eq!("0130", &ValidDuration::from_minutes(90).unwrap().to_string());
        assert!(ValidDuration::new(0, 0).is_err());
        assert!(ValidDuration::new(12, 60).is_err());

        assert!(IssueTime::new(0, 0, 0).is_err());
        assert!(IssueTime::new(367, 0, 0).is_err());
        assert!(IssueTime::new(366, 23, 59).is_ok());
        assert_eq!("0121415", &IssueTime::new(12, 14, 15).unwrap().to_string());

        assert!("03917a".parse::<LocationCode>().is_err());
        assert!("39173".parse::<LocationCode>().is_err());
        assert!("039173".parse::<LocationCode>().is_ok());

        assert!(station_field("KLOX/NWS").is_ok());
        assert!(station_field("K-BAD").is_err());
        assert!(station_field("").is_err());
        assert!(station_field("WAYTOOLONG").is_err());
    }

    #[test]
    #[cfg(feature = "chrono")]
    fn test_calculate_issue_time() {
        let d = calculate_issue_time((83, 2, 53), (2021, 1)).unwrap();
        assert_eq!(d, Utc.with_ymd_and_hms(2021, 3, 24, 2, 53, 0).unwrap());

        // bumps to next year
        let d = calculate_issue_time((1, 10, 00), (2021, 200)).unwrap();
        assert_eq!(d, Utc.with_ymd_and_hms(2022, 1, 1, 10, 0, 0).unwrap());

        // reverts to previous year, with leap year support
        let d = calculate_issue_time((366, 10, 00), (2021, 1)).unwrap();
        assert_eq!(d, Utc.with_ymd_and_hms(2020, 12, 31, 10, 0, 0).unwrap());

        // does not work at all if the target year is not a leap year
        calculate_issue_time((366, 10, 00), (1971, 364)).expect_err("should not succeed");
    }

    #[test]
    #[cfg(feature = "chrono")]
    fn test_expiry() {
        let hdr = SameHeader::parse("ZCZC-WXR-RWT-012345+0030-0011200-NOCALL00-").unwrap();
        let rx = Utc.with_ymd_and_hms(2021, 1, 1, 12, 10, 0).unwrap();
        assert!(!hdr.is_expired_at(&rx));
        let late = Utc.with_ymd_and_hms(2021, 1, 1, 12, 31, 0).unwrap();
        assert!(hdr.is_expired_at(&late));
    }
}
