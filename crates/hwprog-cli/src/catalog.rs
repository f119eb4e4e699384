use std::{fs, io, path::Path};

use serde::Deserialize;

/// Hardware servers a programming host knows about.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ServerCatalog {
    pub(crate) xilinx_hw_servers: Vec<CatalogServer>,
    pub(crate) proasic_servers: Vec<CatalogServer>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CatalogServer {
    pub(crate) name: String,
    pub(crate) address: String,
    #[serde(default)]
    pub(crate) targets: Vec<CatalogTarget>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CatalogTarget {
    pub(crate) target: String,
    #[serde(default)]
    pub(crate) device: Option<String>,
}

impl ServerCatalog {
    /// Missing file means no servers are configured.
    pub(crate) fn load(path: &Path) -> io::Result<Self> {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn servers(&self) -> impl Iterator<Item = (&'static str, &CatalogServer)> {
        self.xilinx_hw_servers
            .iter()
            .map(|server| ("xilinx", server))
            .chain(self.proasic_servers.iter().map(|server| ("proasic", server)))
    }

    /// Address for a catalog name; anything else is taken as an address already.
    pub(crate) fn resolve(&self, selection: &str) -> String {
        self.servers()
            .find(|(_, server)| server.name == selection)
            .map(|(_, server)| server.address.clone())
            .unwrap_or_else(|| selection.to_string())
    }

    pub(crate) fn targets_for(&self, address: &str) -> &[CatalogTarget] {
        self.xilinx_hw_servers
            .iter()
            .find(|server| server.address == address)
            .map(|server| server.targets.as_slice())
            .unwrap_or(&[])
    }
}
