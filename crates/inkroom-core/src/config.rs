//! Transport configuration.
//!
//! The relay address comes from the environment. A relative address is
//! resolved against the page origin (`http` becomes `ws`, `https` becomes
//! `wss`) and the room is passed as the `roomId` query parameter.

use thiserror::Error;
use url::Url;

/// Environment variable holding the relay base address.
pub const BASE_URL_ENV: &str = "INKROOM_WS_BASE_URL";
/// Environment variable overriding the room used when none is given.
pub const DEFAULT_ROOM_ENV: &str = "INKROOM_DEFAULT_ROOM";
/// Base address used when the environment does not provide one.
pub const DEFAULT_BASE_URL: &str = "/ws/canvas";
/// Room joined when none is specified.
pub const DEFAULT_ROOM: &str = "default";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("relative relay address {0:?} needs a page origin")]
    MissingOrigin(String),
    #[error("invalid relay address: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unsupported relay scheme: {0}")]
    UnsupportedScheme(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where to reach the relay and which room to use by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub default_room: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_room: DEFAULT_ROOM.to_string(),
        }
    }
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for each variable; blank values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            base_url: read(BASE_URL_ENV).unwrap_or(defaults.base_url),
            default_room: read(DEFAULT_ROOM_ENV).unwrap_or(defaults.default_room),
        }
    }

    /// Room to join for an optional user-supplied room identifier.
    pub fn room_or_default<'a>(&'a self, room: Option<&'a str>) -> &'a str {
        match room {
            Some(room) if !room.trim().is_empty() => room,
            _ => &self.default_room,
        }
    }

    /// Full connection address for `room`.
    ///
    /// `page_origin` is only consulted when the configured base is relative.
    pub fn room_url(&self, room: Option<&str>, page_origin: Option<&Url>) -> ConfigResult<Url> {
        let mut url = match Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let origin =
                    page_origin.ok_or_else(|| ConfigError::MissingOrigin(self.base_url.clone()))?;
                origin.join(&self.base_url)?
            }
            Err(e) => return Err(e.into()),
        };

        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }

        let room = self.room_or_default(room).to_string();
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "roomId")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (k, v) in &kept {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("roomId", &room);
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_ws_url() {
        let config = TransportConfig::new("ws://relay.local:8080/ws/canvas");
        let url = config.room_url(Some("team"), None).unwrap();
        assert_eq!(url.as_str(), "ws://relay.local:8080/ws/canvas?roomId=team");
    }

    #[test]
    fn test_default_room() {
        let config = TransportConfig::new("ws://relay.local/ws/canvas");
        let url = config.room_url(None, None).unwrap();
        assert_eq!(url.query(), Some("roomId=default"));
        let url = config.room_url(Some("  "), None).unwrap();
        assert_eq!(url.query(), Some("roomId=default"));
    }

    #[test]
    fn test_relative_url_uses_page_origin() {
        let config = TransportConfig::default();
        let origin = Url::parse("https://board.example.com/room/abc").unwrap();
        let url = config.room_url(Some("abc"), Some(&origin)).unwrap();
        assert_eq!(url.as_str(), "wss://board.example.com/ws/canvas?roomId=abc");

        let origin = Url::parse("http://localhost:5173/").unwrap();
        let url = config.room_url(Some("abc"), Some(&origin)).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:5173/ws/canvas?roomId=abc");
    }

    #[test]
    fn test_relative_url_without_origin() {
        let config = TransportConfig::default();
        assert!(matches!(
            config.room_url(Some("abc"), None),
            Err(ConfigError::MissingOrigin(_))
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        let config = TransportConfig::new("ftp://relay.local/ws");
        assert!(matches!(
            config.room_url(None, None),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_existing_room_param_replaced() {
        let config = TransportConfig::new("ws://relay.local/ws/canvas?v=2&roomId=old");
        let url = config.room_url(Some("new room"), None).unwrap();
        assert_eq!(url.query(), Some("v=2&roomId=new+room"));
    }

    #[test]
    fn test_from_lookup() {
        let config = TransportConfig::from_lookup(|key| match key {
            BASE_URL_ENV => Some("ws://example.test/ws".to_string()),
            DEFAULT_ROOM_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.base_url, "ws://example.test/ws");
        assert_eq!(config.default_room, DEFAULT_ROOM);
    }
}
