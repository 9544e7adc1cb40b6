//! SAME/EAS code registry
//!
//! Read-only tables of originator codes, event codes, and FIPS state
//! codes. All tables are built at compile time and require no
//! synchronization: concurrent readers are safe by construction.
//!
//! Event codes for the United States are given in
//! [NWSI 10-1712](https://www.nws.noaa.gov/directives/sym/pd01017012curr.pdf)
//! and <https://docs.fcc.gov/public/attachments/FCC-16-80A1.pdf>.

use std::fmt;
use std::str::FromStr;

use phf::{phf_map, phf_set};
use strum::EnumMessage;
use thiserror::Error;

/// SAME message originator code
///
/// Originator codes may be converted `from()` their SAME string
/// representations. Using them `.as_ref()` or via `Display` will
/// show a human-readable string.
///
/// ```
/// use samewave::Originator;
///
/// let orig = Originator::from("WXR");
/// assert_eq!(Originator::WeatherService, orig);
/// assert_eq!("WXR", orig.as_ref());
/// assert_eq!("National Weather Service", &format!("{}", orig));
///
/// assert_eq!(Originator::Unknown, Originator::from("HUH"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage)]
pub enum Originator {
    /// An unknown (and probably invalid) Originator code
    ///
    /// Per NWSI 10-172, receivers should accept any originator code.
    /// Encoders, on the other hand, must not transmit one.
    #[strum(serialize = "OOO", detailed_message = "Unknown Originator")]
    Unknown,

    /// Primary Entry Point station for national activations
    #[strum(serialize = "PEP", detailed_message = "Primary Entry Point System")]
    PrimaryEntryPoint,

    /// Civil authorities (usu. state and local government)
    #[strum(serialize = "CIV", detailed_message = "Civil authorities")]
    CivilAuthority,

    /// National Weather Service or Environment Canada
    #[strum(serialize = "WXR", detailed_message = "National Weather Service")]
    WeatherService,

    /// EAS participant (usu. broadcast station)
    #[strum(
        serialize = "EAS",
        detailed_message = "Broadcast station or cable system"
    )]
    BroadcastStation,
}

impl Originator {
    /// Human-readable string representation
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }

    /// SAME string representation
    ///
    /// Returns the three-character SAME code for this `Originator`
    pub fn as_str(&self) -> &'static str {
        self.get_serializations()[0]
    }

    /// True if this code may be placed in a transmitted header
    pub fn is_transmittable(&self) -> bool {
        !matches!(self, Originator::Unknown)
    }
}

impl FromStr for Originator {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Originator, Self::Err> {
        match s {
            "OOO" => Ok(Originator::Unknown),
            "PEP" => Ok(Originator::PrimaryEntryPoint),
            "CIV" => Ok(Originator::CivilAuthority),
            "WXR" => Ok(Originator::WeatherService),
            "EAS" => Ok(Originator::BroadcastStation),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}

impl From<&str> for Originator {
    fn from(s: &str) -> Originator {
        Originator::from_str(s).unwrap_or(Originator::Unknown)
    }
}

impl AsRef<str> for Originator {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Originator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_display_str().fmt(f)
    }
}

/// SAME message significance level
///
/// Three-letter SAME codes usually use the last letter to indicate
/// *significance* or severity.
///
/// | Code    | Significance  |
/// |---------|---------------|
/// | `xxT`   | Test          |
/// | `xxM`   | Message       |
/// | `xxS`   | Statement     |
/// | `xxE`   | Emergency     |
/// | `xxA`   | Watch         |
/// | `xxW`   | Warning       |
///
/// There are message codes which do not follow this convention—and
/// some even contradict it. The [event codebook](EventCode) knows the
/// correct significance for these special cases.
///
/// Significance levels are `Ord`. Lower significance levels represent
/// less urgent messages, such as tests and statements. Unrecognized
/// levels are represented as [`SignificanceLevel::Unknown`], which
/// clients are encouraged to treat as a Warning.
///
/// ```
/// use samewave::SignificanceLevel;
///
/// assert!(SignificanceLevel::Test < SignificanceLevel::Warning);
/// assert_eq!(SignificanceLevel::Watch, SignificanceLevel::from("A"));
/// assert!(SignificanceLevel::Unknown >= SignificanceLevel::Warning);
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::EnumMessage,
)]
#[repr(u8)]
pub enum SignificanceLevel {
    /// Test: "This is only a test."
    #[strum(serialize = "T", detailed_message = "Test")]
    Test,

    /// A non-emergency message
    #[strum(serialize = "M", detailed_message = "Message")]
    Message,

    /// Follow-up information to a warning, watch, or emergency
    #[strum(serialize = "S", detailed_message = "Statement")]
    Statement,

    /// An event that indirectly threatens public safety
    #[strum(serialize = "E", detailed_message = "Emergency")]
    Emergency,

    /// Meets warning classification, but onset or location uncertain
    #[strum(serialize = "A", detailed_message = "Watch")]
    Watch,

    /// A significant threat to public safety and/or property
    #[strum(serialize = "W", detailed_message = "Warning")]
    Warning,

    /// Unrecognized significance; treat like a Warning
    #[strum(serialize = "?", detailed_message = "Unrecognized Event")]
    Unknown,
}

impl SignificanceLevel {
    /// Human-readable string representation
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }

    /// SAME string representation
    ///
    /// The one-character SAME code for this `SignificanceLevel`.
    /// While this is *usually* the last character of the event code,
    /// there are exceptions to this rule.
    pub fn as_code_str(&self) -> &'static str {
        self.get_serializations()[0]
    }
}

impl FromStr for SignificanceLevel {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<SignificanceLevel, Self::Err> {
        match s {
            "T" => Ok(SignificanceLevel::Test),
            "M" => Ok(SignificanceLevel::Message),
            "S" => Ok(SignificanceLevel::Statement),
            "E" => Ok(SignificanceLevel::Emergency),
            "A" => Ok(SignificanceLevel::Watch),
            "W" => Ok(SignificanceLevel::Warning),
            "?" => Ok(SignificanceLevel::Unknown),
            _ => Err(strum::ParseError::VariantNotFound),
        }
    }
}

impl From<&str> for SignificanceLevel {
    /// Convert from the last character of the given string
    fn from(s: &str) -> Self {
        match last_ascii_character(s) {
            Some(c) => SignificanceLevel::from_str(c).unwrap_or(SignificanceLevel::Unknown),
            None => SignificanceLevel::Unknown,
        }
    }
}

impl AsRef<str> for SignificanceLevel {
    fn as_ref(&self) -> &'static str {
        self.as_code_str()
    }
}

impl fmt::Display for SignificanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.as_code_str().fmt(f)
        } else {
            self.as_display_str().fmt(f)
        }
    }
}

/// What is happening?
///
/// The *phenomenon* part of a SAME [event code](EventCode): what is
/// occurring, without regard to how severe it is. Use
/// [`Display`](fmt::Display) for a human-readable description.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::EnumMessage, strum_macros::EnumIter,
)]
#[non_exhaustive]
pub enum Phenomenon {
    /// A code not in this registry
    #[strum(detailed_message = "Unrecognized")]
    Unrecognized,

    #[strum(detailed_message = "National Emergency Message")]
    NationalEmergency,
    #[strum(detailed_message = "National Information Center")]
    NationalInformationCenter,
    #[strum(detailed_message = "National Periodic Test")]
    NationalPeriodicTest,
    #[strum(detailed_message = "Required Monthly Test")]
    RequiredMonthlyTest,
    #[strum(detailed_message = "Required Weekly Test")]
    RequiredWeeklyTest,
    #[strum(detailed_message = "Practice/Demo Warning")]
    PracticeDemo,

    #[strum(detailed_message = "Administrative Message")]
    AdministrativeMessage,
    #[strum(detailed_message = "Avalanche")]
    Avalanche,
    #[strum(detailed_message = "Blue Alert")]
    BlueAlert,
    #[strum(detailed_message = "Child Abduction Emergency")]
    ChildAbduction,
    #[strum(detailed_message = "Civil Danger")]
    CivilDanger,
    #[strum(detailed_message = "Civil Emergency")]
    CivilEmergency,
    #[strum(detailed_message = "Earthquake")]
    Earthquake,
    #[strum(detailed_message = "Evacuation Immediate")]
    Evacuation,
    #[strum(detailed_message = "Fire")]
    Fire,
    #[strum(detailed_message = "Hazardous Materials")]
    HazardousMaterials,
    #[strum(detailed_message = "Law Enforcement Warning")]
    LawEnforcement,
    #[strum(detailed_message = "Local Area Emergency")]
    LocalAreaEmergency,
    #[strum(detailed_message = "911 Telephone Outage")]
    TelephoneOutage,
    #[strum(detailed_message = "Nuclear Power Plant")]
    NuclearPowerPlant,
    #[strum(detailed_message = "Radiological Hazard")]
    RadiologicalHazard,
    #[strum(detailed_message = "Shelter In-Place")]
    ShelterInPlace,
    #[strum(detailed_message = "Volcano")]
    Volcano,

    #[strum(detailed_message = "Blizzard")]
    Blizzard,
    #[strum(detailed_message = "Coastal Flood")]
    CoastalFlood,
    #[strum(detailed_message = "Dust Storm")]
    DustStorm,
    #[strum(detailed_message = "Extreme Wind")]
    ExtremeWind,
    #[strum(detailed_message = "Flash Flood")]
    FlashFlood,
    #[strum(detailed_message = "Flood")]
    Flood,
    #[strum(detailed_message = "Freeze")]
    Freeze,
    #[strum(detailed_message = "High Wind")]
    HighWind,
    #[strum(detailed_message = "Hurricane")]
    Hurricane,
    #[strum(detailed_message = "Hurricane Local Statement")]
    HurricaneLocalStatement,
    #[strum(detailed_message = "Severe Thunderstorm")]
    SevereThunderstorm,
    #[strum(detailed_message = "Severe Weather")]
    SevereWeather,
    #[strum(detailed_message = "Special Marine")]
    SpecialMarine,
    #[strum(detailed_message = "Special Weather Statement")]
    SpecialWeatherStatement,
    #[strum(detailed_message = "Snow Squall")]
    SnowSquall,
    #[strum(detailed_message = "Storm Surge")]
    StormSurge,
    #[strum(detailed_message = "Tornado")]
    Tornado,
    #[strum(detailed_message = "Tropical Storm")]
    TropicalStorm,
    #[strum(detailed_message = "Tsunami")]
    Tsunami,
    #[strum(detailed_message = "Winter Storm")]
    WinterStorm,
}

impl Phenomenon {
    /// Human-readable string representation
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }

    /// True if the phenomenon is not in the registry
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Phenomenon::Unrecognized)
    }
}

impl fmt::Display for Phenomenon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_display_str().fmt(f)
    }
}

/// A fully-parsed SAME event code
///
/// An `EventCode` pairs a [`Phenomenon`] ("Tornado") with a
/// [`SignificanceLevel`] ("Warning"). Construct one by parsing the
/// three-character code from a SAME header:
///
/// ```
/// use samewave::{EventCode, Phenomenon, SignificanceLevel};
///
/// let evt = EventCode::from("TOR");
/// assert_eq!(Phenomenon::Tornado, evt.phenomenon());
/// assert_eq!(SignificanceLevel::Warning, evt.significance());
/// assert_eq!("Tornado Warning", &format!("{}", evt));
/// ```
///
/// Codes which are not in the registry parse with an
/// [`Unrecognized`](Phenomenon::Unrecognized) phenomenon. If the last
/// character is a conventional significance level, it is still
/// honored; this helps clients react correctly if new codes are added
/// in the future.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventCode {
    phenomenon: Phenomenon,
    significance: SignificanceLevel,
}

impl EventCode {
    /// What is occurring
    pub fn phenomenon(&self) -> Phenomenon {
        self.phenomenon
    }

    /// How severe or intrusive the event is
    pub fn significance(&self) -> SignificanceLevel {
        self.significance
    }

    /// True if the three-character code is in the registry
    pub fn is_recognized(&self) -> bool {
        !self.phenomenon.is_unrecognized()
    }
}

impl From<&str> for EventCode {
    /// Parse from a three-character SAME code like "`TOR`"
    fn from(code: &str) -> Self {
        lookup_event(code).unwrap_or(EventCode {
            phenomenon: Phenomenon::Unrecognized,
            significance: SignificanceLevel::from(code),
        })
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.phenomenon, self.significance) {
            (Phenomenon::Unrecognized, sig) => sig.as_display_str().fmt(f),
            // phenomena whose name already carries the significance
            (Phenomenon::HurricaneLocalStatement, _)
            | (Phenomenon::SpecialWeatherStatement, _)
            | (Phenomenon::NationalEmergency, _)
            | (Phenomenon::NationalInformationCenter, _)
            | (Phenomenon::NationalPeriodicTest, _)
            | (Phenomenon::RequiredMonthlyTest, _)
            | (Phenomenon::RequiredWeeklyTest, _)
            | (Phenomenon::PracticeDemo, _)
            | (Phenomenon::AdministrativeMessage, _) => self.phenomenon.fmt(f),
            (phen, sig) => write!(f, "{} {}", phen, sig.as_display_str()),
        }
    }
}

/// An event code which is not in the registry
///
/// Returned by [`require_event()`] when strict (encode-side)
/// validation is requested. Decoders should *not* treat this as
/// grounds to discard a message.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("event code \"{0}\" is not in the registry")]
pub struct UnrecognizedEventCode(pub String);

/// Strict registry lookup, for encoders
///
/// Unlike `EventCode::from()`, which degrades gracefully, this lookup
/// refuses codes that are absent from the registry. Transmitting an
/// unregistered event code would produce a header that most receivers
/// display as "Unrecognized."
pub fn require_event(code: &str) -> Result<EventCode, UnrecognizedEventCode> {
    match lookup_event(code) {
        Some(evt) if evt.is_recognized() => Ok(evt),
        _ => Err(UnrecognizedEventCode(code.to_owned())),
    }
}

// Codebook of three-character SAME event codes
//
// All three-character codes imply a significance level: the RWT will
// always have a significance of Test.
static CODEBOOK3: phf::Map<&'static str, (Phenomenon, SignificanceLevel)> = phf_map! {
    // national activations
    "EAN" => (Phenomenon::NationalEmergency, SignificanceLevel::Warning),
    "NIC" => (Phenomenon::NationalInformationCenter, SignificanceLevel::Statement),

    // tests
    "DMO" => (Phenomenon::PracticeDemo, SignificanceLevel::Warning),
    "NPT" => (Phenomenon::NationalPeriodicTest, SignificanceLevel::Test),
    "RMT" => (Phenomenon::RequiredMonthlyTest, SignificanceLevel::Test),
    "RWT" => (Phenomenon::RequiredWeeklyTest, SignificanceLevel::Test),

    // civil authority codes
    "ADR" => (Phenomenon::AdministrativeMessage, SignificanceLevel::Statement),
    "BLU" => (Phenomenon::BlueAlert, SignificanceLevel::Warning),
    "CAE" => (Phenomenon::ChildAbduction, SignificanceLevel::Emergency),
    "CDW" => (Phenomenon::CivilDanger, SignificanceLevel::Warning),
    "CEM" => (Phenomenon::CivilEmergency, SignificanceLevel::Warning),
    "EQW" => (Phenomenon::Earthquake, SignificanceLevel::Warning),
    "EVI" => (Phenomenon::Evacuation, SignificanceLevel::Warning),
    "FRW" => (Phenomenon::Fire, SignificanceLevel::Warning),
    "HMW" => (Phenomenon::HazardousMaterials, SignificanceLevel::Warning),
    "LAE" => (Phenomenon::LocalAreaEmergency, SignificanceLevel::Emergency),
    "LEW" => (Phenomenon::LawEnforcement, SignificanceLevel::Warning),
    "NUW" => (Phenomenon::NuclearPowerPlant, SignificanceLevel::Warning),
    "RHW" => (Phenomenon::RadiologicalHazard, SignificanceLevel::Warning),
    "SPW" => (Phenomenon::ShelterInPlace, SignificanceLevel::Warning),
    "TOE" => (Phenomenon::TelephoneOutage, SignificanceLevel::Emergency),
    "VOW" => (Phenomenon::Volcano, SignificanceLevel::Warning),

    // weather codes that don't follow the two-character convention
    "HLS" => (Phenomenon::HurricaneLocalStatement, SignificanceLevel::Statement),
    "SPS" => (Phenomenon::SpecialWeatherStatement, SignificanceLevel::Statement),
    "SVR" => (Phenomenon::SevereThunderstorm, SignificanceLevel::Warning),
    "SVS" => (Phenomenon::SevereWeather, SignificanceLevel::Statement),
    "TOR" => (Phenomenon::Tornado, SignificanceLevel::Warning),
};

// Codebook of two-character (plus significance) SAME codes
//
// Two-character codes follow the National Weather Service
// convention: the last character is the significance level.
static CODEBOOK2: phf::Map<&'static str, Phenomenon> = phf_map! {
    "AV" => Phenomenon::Avalanche,
    "BZ" => Phenomenon::Blizzard,
    "CF" => Phenomenon::CoastalFlood,
    "DS" => Phenomenon::DustStorm,
    "EW" => Phenomenon::ExtremeWind,
    "FF" => Phenomenon::FlashFlood,
    "FL" => Phenomenon::Flood,
    "FZ" => Phenomenon::Freeze,
    "HU" => Phenomenon::Hurricane,
    "HW" => Phenomenon::HighWind,
    "SM" => Phenomenon::SpecialMarine,
    "SQ" => Phenomenon::SnowSquall,
    "SS" => Phenomenon::StormSurge,
    "SV" => Phenomenon::SevereThunderstorm,
    "TO" => Phenomenon::Tornado,
    "TR" => Phenomenon::TropicalStorm,
    "TS" => Phenomenon::Tsunami,
    "WS" => Phenomenon::WinterStorm,
};

// ANSI FIPS 5-2 state and territory codes, plus the NWS marine
// area codes, as used in the SS field of a location code.
static STATE_CODES: phf::Set<&'static str> = phf_set! {
    "00", // national/whole-state wildcard transmissions
    "01", "02", "04", "05", "06", "08", "09", "10", "11", "12", "13",
    "15", "16", "17", "18", "19", "20", "21", "22", "23", "24", "25",
    "26", "27", "28", "29", "30", "31", "32", "33", "34", "35", "36",
    "37", "38", "39", "40", "41", "42", "44", "45", "46", "47", "48",
    "49", "50", "51", "53", "54", "55", "56",
    // territories
    "60", "64", "66", "68", "69", "70", "72", "74", "78",
    // marine areas
    "57", "58", "59", "61", "65", "73", "75", "77", "91", "92", "93",
    "94", "96", "97", "98",
};

/// Lookup a three-character SAME event code in the registry
///
/// Tries the full three-character code first, then the two-character
/// code with a conventional significance suffix. Returns `None` if
/// neither matches.
fn lookup_event(code: &str) -> Option<EventCode> {
    if code.len() != 3 || !code.is_ascii() {
        return None;
    }

    if let Some(&(phenomenon, significance)) = CODEBOOK3.get(code) {
        return Some(EventCode {
            phenomenon,
            significance,
        });
    }

    let phenomenon = *CODEBOOK2.get(code.get(0..2)?)?;
    let significance = SignificanceLevel::from_str(code.get(2..3)?).ok()?;
    Some(EventCode {
        phenomenon,
        significance,
    })
}

/// Is `ss` a known FIPS state, territory, or marine area code?
pub fn is_state_code(ss: &str) -> bool {
    STATE_CODES.contains(ss)
}

// Last character of `s`, as an ASCII str
fn last_ascii_character(s: &str) -> Option<&str> {
    if s.is_empty() {
        return None;
    }
    s.get(s.len() - 1..)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    #[test]
    fn test_originator() {
        assert_eq!(Originator::WeatherService, Originator::from("WXR"));
        assert_eq!(Originator::CivilAuthority, Originator::from("CIV"));
        assert_eq!(Originator::PrimaryEntryPoint, Originator::from("PEP"));
        assert_eq!(Originator::BroadcastStation, Originator::from("EAS"));
        assert_eq!(Originator::Unknown, Originator::from("XYZ"));
        assert_eq!("WXR", Originator::WeatherService.as_str());
        assert!(!Originator::Unknown.is_transmittable());
        assert!(Originator::WeatherService.is_transmittable());
    }

    #[test]
    fn test_significance_ordering() {
        assert!(SignificanceLevel::Test < SignificanceLevel::Statement);
        assert!(SignificanceLevel::Statement < SignificanceLevel::Watch);
        assert!(SignificanceLevel::Watch < SignificanceLevel::Warning);
        assert!(SignificanceLevel::Unknown > SignificanceLevel::Warning);
        assert_eq!(SignificanceLevel::Warning, SignificanceLevel::from("TOW"));
        assert_eq!(SignificanceLevel::Unknown, SignificanceLevel::from(""));
    }

    #[test]
    fn test_event_lookup() {
        // three-character exact
        let evt = EventCode::from("TOR");
        assert_eq!(Phenomenon::Tornado, evt.phenomenon());
        assert_eq!(SignificanceLevel::Warning, evt.significance());

        // two-character plus significance
        let evt = EventCode::from("TOA");
        assert_eq!(Phenomenon::Tornado, evt.phenomenon());
        assert_eq!(SignificanceLevel::Watch, evt.significance());

        let evt = EventCode::from("FFW");
        assert_eq!(Phenomenon::FlashFlood, evt.phenomenon());
        assert_eq!("Flash Flood Warning", &format!("{}", evt));

        // tests carry Test significance regardless of suffix
        let evt = EventCode::from("RWT");
        assert_eq!(SignificanceLevel::Test, evt.significance());
        assert_eq!("Required Weekly Test", &format!("{}", evt));

        // unknown code with conventional suffix
        let evt = EventCode::from("XXW");
        assert!(!evt.is_recognized());
        assert_eq!(SignificanceLevel::Warning, evt.significance());

        // unknown code, unknown suffix
        let evt = EventCode::from("XXX");
        assert!(!evt.is_recognized());
        assert_eq!(SignificanceLevel::Unknown, evt.significance());
    }

    #[test]
    fn test_require_event() {
        assert!(require_event("TOR").is_ok());
        assert!(require_event("WSA").is_ok());
        assert_eq!(
            Err(UnrecognizedEventCode("XXX".to_owned())),
            require_event("XXX")
        );
        assert!(require_event("").is_err());
    }

    #[test]
    fn test_state_codes() {
        assert!(is_state_code("39")); // Ohio
        assert!(is_state_code("06")); // California
        assert!(is_state_code("75")); // marine
        assert!(!is_state_code("03"));
        assert!(!is_state_code("99"));
        assert!(!is_state_code("5"));
    }

    // ensure the codebooks are populated correctly
    #[test]
    fn check_codebooks() {
        let mut covered = HashSet::new();

        for (key, val) in CODEBOOK3.entries() {
            assert!(key.is_ascii());
            assert_eq!(key.len(), 3);
            assert_ne!(Phenomenon::Unrecognized, val.0);
            assert_ne!(SignificanceLevel::Unknown, val.1);
            covered.insert(val.0);
        }

        for (key, val) in CODEBOOK2.entries() {
            assert!(key.is_ascii());
            assert_eq!(key.len(), 2);
            assert_ne!(&Phenomenon::Unrecognized, val);
            covered.insert(*val);
        }

        // every phenomenon is reachable from at least one codebook entry
        for phen in Phenomenon::iter() {
            if phen.is_unrecognized() {
                continue;
            }
            assert!(
                covered.contains(&phen),
                "phenomenon {} not covered by any codebook entry",
                phen
            );
        }
    }
}
