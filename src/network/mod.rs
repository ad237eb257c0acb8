//! Network configuration module
//!
//! Handles the netplan-style v2 `network-config` document found on the seed
//! volume. Only the `ethernets` keys rd-init translates are modelled.

pub mod render;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::net::IpAddr;
use tracing::warn;

use crate::RdInitError;
use crate::datasources::{Document, nocloud::parse_yaml};

/// Network configuration (v2 format)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub version: u32,
    /// Interfaces in document order
    #[serde(default, deserialize_with = "ordered_map")]
    pub ethernets: Vec<(String, EthernetConfig)>,
}

/// Ethernet interface configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EthernetConfig {
    #[serde(rename = "match")]
    pub match_config: MatchConfig,
    pub dhcp4: bool,
    pub set_name: Option<String>,
    pub dhcp4_overrides: Dhcp4Overrides,
    /// `mac` or `duid`; anything else is rejected when rendering
    pub dhcp_identifier: Option<String>,
    pub nameservers: NameserverConfig,
}

/// Interface matching configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub macaddress: Option<String>,
}

/// DHCPv4 lease overrides
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Dhcp4Overrides {
    pub route_metric: Option<u32>,
}

/// Nameserver configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NameserverConfig {
    pub addresses: Vec<IpAddr>,
}

impl EthernetConfig {
    /// MAC address to match on, if set and non-empty
    pub fn mac_address(&self) -> Option<&str> {
        self.match_config
            .macaddress
            .as_deref()
            .filter(|mac| !mac.is_empty())
    }

    /// Rename target, if set and non-empty
    pub fn rename_to(&self) -> Option<&str> {
        self.set_name.as_deref().filter(|name| !name.is_empty())
    }
}

impl NetworkConfig {
    /// Parse and validate network config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, RdInitError> {
        let config: NetworkConfig = parse_yaml(Document::NetworkConfig, yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject renames that have nothing stable to match on
    pub fn validate(&self) -> Result<(), RdInitError> {
        if self.version != 2 {
            warn!(version = self.version, "Unexpected network-config version");
        }

        for (name, ethernet) in &self.ethernets {
            if let Some(set_name) = ethernet.rename_to()
                && ethernet.mac_address().is_none()
            {
                return Err(RdInitError::validation(format!(
                    "network interface {:?} has set-name={:?} but no match",
                    name, set_name
                )));
            }
        }
        Ok(())
    }

    /// Whether any interface is configured
    pub fn has_interfaces(&self) -> bool {
        !self.ethernets.is_empty()
    }
}

/// Deserialize a mapping into a `Vec` of pairs, keeping document order
fn ordered_map<'de, D>(deserializer: D) -> Result<Vec<(String, EthernetConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedMap;

    impl<'de> Visitor<'de> for OrderedMap {
        type Value = Vec<(String, EthernetConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of interface names to interface settings")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries: Vec<(String, EthernetConfig)> = Vec::new();
            while let Some((name, config)) = map.next_entry::<String, EthernetConfig>()? {
                if entries.iter().any(|(existing, _)| *existing == name) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate interface {:?}",
                        name
                    )));
                }
                entries.push((name, config));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(OrderedMap)
}
