use std::collections::BTreeMap;
use std::error::Error;
use std::net::IpAddr;

use ini::Ini;
use serde::Serialize;

use crate::utils::types::Address;

/// Deployment table mapping node ids to local ports, read from an ini
/// file:
///
/// ```ini
/// [network]
/// host = localhost
/// ip = 127.0.0.1
///
/// [nodes]
/// 0 = 8100
/// 1 = 8101
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub host: String,
    pub ip: IpAddr,
    pub ports: BTreeMap<u32, u16>,
}

impl Config {
    pub fn load(path: &str) -> Result<Config, Box<dyn Error>> {
        let ini = Ini::load_from_file(path)?;

        let network = ini.section(Some("network")).ok_or("missing [network] section")?;
        let host = network.get("host").unwrap_or("localhost").to_string();
        let ip: IpAddr = network.get("ip").unwrap_or("127.0.0.1").parse()?;

        let nodes = ini.section(Some("nodes")).ok_or("missing [nodes] section")?;
        let mut ports = BTreeMap::new();
        for (id, port) in nodes.iter() {
            ports.insert(id.parse()?, port.parse()?);
        }
        Ok(Config { host, ip, ports })
    }

    pub fn address_of(&self, id: u32) -> Option<Address> {
        self.ports
            .get(&id)
            .map(|port| Address::new(&self.host, self.ip, *port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("chord-ring-config-{}.ini", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn config_resolves_ids_to_addresses() {
        let path = write_temp_config("[network]\nhost = localhost\nip = 127.0.0.1\n\n[nodes]\n0 = 8100\n1 = 8101\n");
        let config = Config::load(path.to_str().unwrap()).unwrap();

        let address = config.address_of(1).unwrap();
        assert_eq!(address.to_string(), "localhost/127.0.0.1:8101");
        assert!(config.address_of(7).is_none());

        std::fs::remove_file(path).unwrap();
    }
}
