//! Booking channel attribution.
//!
//! Channels stamp their domain into each entry's `UID`
//! (`abc123@airbnb.com`) and serve feeds from their own hosts, which is
//! enough to name where a blocked range came from.

use url::Url;

/// Label for entries whose channel cannot be identified.
pub const DEFAULT_CHANNEL_LABEL: &str = "External Calendar";

/// Known channels as (domain, label).
const KNOWN_CHANNELS: &[(&str, &str)] = &[
    ("airbnb.com", "Airbnb"),
    ("vrbo.com", "VRBO"),
    ("booking.com", "Booking.com"),
    ("homeaway.com", "HomeAway"),
];

/// Names the channel of an entry from its `UID`.
pub fn channel_for_uid(uid: &str) -> Option<&'static str> {
    let uid = uid.to_ascii_lowercase();
    KNOWN_CHANNELS
        .iter()
        .find(|(domain, _)| uid.contains(&format!("@{}", domain)))
        .map(|(_, label)| *label)
}

/// Names the channel serving a feed URL, from its host.
pub fn channel_for_url(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    KNOWN_CHANNELS
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{}", domain)))
        .map(|(_, label)| *label)
}
