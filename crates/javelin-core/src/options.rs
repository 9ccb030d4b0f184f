//! Linking configuration and the per-VM link context

use std::sync::Arc;

use javelin_sdk::NativeRegistry;
use serde::{Deserialize, Serialize};

use crate::builtins::BuiltinTable;

/// Libraries `System.loadLibrary` accepts without a host library behind them
pub const DEFAULT_BUILTIN_LIBRARIES: &[&str] =
    &["zip", "net", "nio", "awt", "fontmanager", "management", "jsound"];

/// Options controlling how members are linked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkOptions {
    /// Library names `System.loadLibrary` treats as already loaded.
    /// Any other name raises `UnsatisfiedLinkError`.
    pub builtin_libraries: Vec<String>,

    /// Populate the builtin override table with the stock overrides
    pub install_default_builtins: bool,

    /// Give native `registerNatives()V` / `initIDs()V` a permanent no-op body
    pub stub_init_hooks: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            builtin_libraries: DEFAULT_BUILTIN_LIBRARIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            install_default_builtins: true,
            stub_init_hooks: true,
        }
    }
}

impl LinkOptions {
    /// Options with no builtin overrides installed
    pub fn bare() -> Self {
        Self {
            install_default_builtins: false,
            ..Default::default()
        }
    }

    /// Replace the accepted library list
    pub fn with_builtin_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtin_libraries = libraries.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the init-hook stubs
    pub fn with_stub_init_hooks(mut self, enabled: bool) -> Self {
        self.stub_init_hooks = enabled;
        self
    }

    /// Load options from a JSON document; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-VM tables consulted while linking members.
///
/// Each VM instance owns one; nothing here is process-global, so several
/// VMs in one process stay isolated.
#[derive(Debug, Clone)]
pub struct LinkContext {
    options: Arc<LinkOptions>,
    builtins: Arc<BuiltinTable>,
    natives: Arc<NativeRegistry>,
}

impl LinkContext {
    /// Build a context with fresh tables
    pub fn new(options: LinkOptions) -> Self {
        let builtins = if options.install_default_builtins {
            BuiltinTable::with_defaults(&options)
        } else {
            BuiltinTable::new()
        };
        Self {
            options: Arc::new(options),
            builtins: Arc::new(builtins),
            natives: Arc::new(NativeRegistry::new()),
        }
    }

    /// Build a context around existing tables
    pub fn with_tables(
        options: LinkOptions,
        builtins: Arc<BuiltinTable>,
        natives: Arc<NativeRegistry>,
    ) -> Self {
        Self {
            options: Arc::new(options),
            builtins,
            natives,
        }
    }

    /// Linking options
    pub fn options(&self) -> &LinkOptions {
        &self.options
    }

    /// Builtin override table
    pub fn builtins(&self) -> &Arc<BuiltinTable> {
        &self.builtins
    }

    /// Dynamic native registry
    pub fn natives(&self) -> &Arc<NativeRegistry> {
        &self.natives
    }
}

impl Default for LinkContext {
    fn default() -> Self {
        Self::new(LinkOptions::default())
    }
}
