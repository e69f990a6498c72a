use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

pub const MAX_ATTEMPTS: u32 = 10;

/// The single persisted record for a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(default)]
    pub balance: u64,
    #[serde(default)]
    pub tokens: u64,
    pub attempts_left: u32,
    #[serde(with = "timestamp")]
    pub last_reset_time: DateTime<Utc>,
    #[serde(default)]
    pub total_wins: u64,
    #[serde(default)]
    pub total_losses: u64,
}

impl PlayerState {
    /// A fresh player with a full set of attempts and a cooldown window
    /// anchored at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            balance: 0,
            tokens: 0,
            attempts_left: MAX_ATTEMPTS,
            last_reset_time: now,
            total_wins: 0,
            total_losses: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.attempts_left > MAX_ATTEMPTS {
            return Err(format!(
                "attempts_left {} exceeds maximum {}",
                self.attempts_left, MAX_ATTEMPTS
            ));
        }
        Ok(())
    }
}

// RFC 3339 on write. Reads also take offset-less ISO-8601 local timestamps,
// which older save files contain.
mod timestamp {
    use chrono::{
        DateTime,
        Local,
        NaiveDateTime,
        SecondsFormat,
        TimeZone,
        Utc,
    };
    use serde::{
        Deserialize,
        Deserializer,
        Serializer,
        de::Error,
    };

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        let naive = raw.parse::<NaiveDateTime>().ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
    }
}
