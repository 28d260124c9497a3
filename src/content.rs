//! Static service catalog: the cards, the tabs and the info blocks they open.
//!
//! Cards and tabs are both generated from this list in the same order, which
//! is what the transition's positional pairing relies on.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{glog_debug, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    /// Short text used on the card and the tab. Defaults to the id.
    #[serde(default)]
    pub label: String,
    /// Pre-authored HTML shown in the info panel.
    pub content: String,
}

impl Service {
    fn builtin(id: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(rename = "service")]
    services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn builtin() -> Self {
        Self {
            services: vec![
                Service::builtin("Bhim UPI", include_str!("../assets/services/bhim-upi.html")),
                Service::builtin("DigiLocker", include_str!("../assets/services/digilocker.html")),
                Service::builtin("NVSP", include_str!("../assets/services/nvsp.html")),
                Service::builtin("UMANG", include_str!("../assets/services/umang.html")),
                Service::builtin("mAadhaar", include_str!("../assets/services/maadhaar.html")),
                Service::builtin("mParivahan", include_str!("../assets/services/mparivahan.html")),
                Service::builtin("IRCTC", include_str!("../assets/services/irctc.html")),
                Service::builtin(
                    "Voter Helpline",
                    include_str!("../assets/services/voter-helpline.html"),
                ),
                Service::builtin("Ayushman", include_str!("../assets/services/ayushman.html")),
                Service::builtin("MyGov", include_str!("../assets/services/mygov.html")),
            ],
        }
    }

    /// Load a catalog from TOML (`[[service]]` tables).
    pub fn load(path: &Path) -> Result<Self> {
        glog_debug!("ServiceCatalog::load path={}", path.display());
        let mut catalog: Self = toml::from_str(&fs::read_to_string(path)?)?;
        for service in &mut catalog.services {
            if service.label.trim().is_empty() {
                service.label = service.id.clone();
            }
        }
        catalog.validate()?;
        glog_debug!("ServiceCatalog loaded {} services", catalog.len());
        Ok(catalog)
    }

    /// Builtin catalog unless `path` names a file to load instead.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::builtin()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(Error::Validation("service catalog is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for service in &self.services {
            if service.id.trim().is_empty() {
                return Err(Error::Validation("service with empty id".to_string()));
            }
            if !seen.insert(service.id.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate service id '{}'",
                    service.id
                )));
            }
        }
        Ok(())
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn get(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Service> {
        self.services.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.services.iter().position(|s| s.id == id)
    }

    /// Info block for a service; empty when the id is unknown.
    pub fn content_for(&self, id: &str) -> &str {
        self.get(id).map(|s| s.content.as_str()).unwrap_or("")
    }

    pub fn labels(&self) -> Vec<String> {
        self.services.iter().map(|s| s.label.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
