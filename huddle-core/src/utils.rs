use crate::model::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";

/// The always-on STUN entry used when nothing else is configured.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig {
        urls: [
            DEFAULT_STUN_ADDR,
            DEFAULT_STUN_ADDR_2,
            DEFAULT_STUN_ADDR_3,
            DEFAULT_STUN_ADDR_4,
        ]
        .iter()
        .map(|url| (*url).to_owned())
        .collect(),
        username: None,
        credential: None,
    }]
}
