//! systemd-networkd renderer
//!
//! Generates `.link` files for interface renames and `.network` files for
//! addressing, DHCP and DNS.

use crate::RdInitError;
use crate::network::{EthernetConfig, NetworkConfig};
use crate::paths::Paths;
use crate::systemd::unit::{RenderedFile, UnitFile};

/// Section order used in `.network` files
const NETWORK_SECTIONS: &[&str] = &["Match", "Network", "DHCPv4"];

/// systemd-networkd renderer
pub struct NetworkdRenderer<'a> {
    paths: &'a Paths,
}

impl<'a> NetworkdRenderer<'a> {
    pub fn new(paths: &'a Paths) -> Self {
        Self { paths }
    }

    /// Render every interface; nothing is written here
    ///
    /// Interfaces are rendered in document order. Any invalid interface
    /// fails the whole render.
    pub fn render(&self, config: &NetworkConfig) -> Result<Vec<RenderedFile>, RdInitError> {
        let mut files = Vec::new();

        for (name, ethernet) in &config.ethernets {
            if let Some(link) = self.render_link(name, ethernet)? {
                files.push(RenderedFile::new(self.paths.link_file(name), link.render()));
            }

            let network = self.render_network(name, ethernet)?;
            if !network.is_empty() {
                files.push(RenderedFile::new(
                    self.paths.network_file(name),
                    network.render(),
                ));
            }
        }

        Ok(files)
    }

    /// `.link` file renaming the interface matched by MAC address
    pub fn render_link(
        &self,
        name: &str,
        ethernet: &EthernetConfig,
    ) -> Result<Option<UnitFile>, RdInitError> {
        let Some(set_name) = ethernet.rename_to() else {
            return Ok(None);
        };
        let mac = ethernet.mac_address().ok_or_else(|| {
            RdInitError::validation(format!(
                "network interface {:?} has set-name={:?} but no match",
                name, set_name
            ))
        })?;

        let mut link = UnitFile::new();
        link.set("Match", "MACAddress", mac)
            // An empty NamePolicy stops udev's predictable naming from
            // overriding the explicit Name.
            .set("Link", "NamePolicy", "")
            .set("Link", "Name", set_name);
        Ok(Some(link))
    }

    /// `.network` file; empty when the interface sets nothing
    pub fn render_network(
        &self,
        name: &str,
        ethernet: &EthernetConfig,
    ) -> Result<UnitFile, RdInitError> {
        let mut network = UnitFile::with_sections(NETWORK_SECTIONS);

        if let Some(mac) = ethernet.mac_address() {
            network.set("Match", "MACAddress", mac);
        }
        if ethernet.dhcp4 {
            network.set("Network", "DHCP", "ipv4");
        }
        if let Some(metric) = ethernet.dhcp4_overrides.route_metric
            && metric != 0
        {
            network.set("DHCPv4", "RouteMetric", metric.to_string());
        }
        match ethernet.dhcp_identifier.as_deref() {
            None | Some("") => {}
            Some(id @ ("mac" | "duid")) => {
                network.set("DHCPv4", "ClientIdentifier", id);
            }
            Some(other) => {
                return Err(RdInitError::validation(format!(
                    "ethernet {:?} has invalid DHCP client identifier {:?}",
                    name, other
                )));
            }
        }
        if !ethernet.nameservers.addresses.is_empty() {
            let servers: Vec<String> = ethernet
                .nameservers
                .addresses
                .iter()
                .map(|addr| addr.to_string())
                .collect();
            network.set("Network", "DNS", servers.join(" "));
        }

        Ok(network)
    }
}
