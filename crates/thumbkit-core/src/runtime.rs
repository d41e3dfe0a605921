//! Process-wide collaborator setup.
//!
//! Call [`init`] once during startup, before transforms run on other
//! threads. Later calls return the first runtime unchanged.

use std::sync::OnceLock;

use crate::codec::RasterCodec;
use crate::config::{DecodeLimits, TransformConfig};
use crate::metadata::ExifStore;
use crate::pipeline::Transformer;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Shared state the codec and metadata collaborators are built from.
#[derive(Debug)]
pub struct Runtime {
    limits: DecodeLimits,
}

/// Initialize the runtime, or return the existing one.
pub fn init(limits: DecodeLimits) -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tracing::debug!(
            max_width = limits.max_width,
            max_height = limits.max_height,
            max_alloc_bytes = limits.max_alloc_bytes,
            "Initializing runtime"
        );
        Runtime { limits }
    })
}

/// The runtime, if [`init`] has run.
pub fn runtime() -> Option<&'static Runtime> {
    RUNTIME.get()
}

impl Runtime {
    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    pub fn codec(&self) -> RasterCodec {
        RasterCodec::new(self.limits)
    }

    pub fn metadata(&self) -> ExifStore {
        ExifStore
    }

    /// A transformer over this runtime's collaborators.
    pub fn transformer(&self, config: TransformConfig) -> Transformer<RasterCodec, ExifStore> {
        Transformer::new(self.codec(), self.metadata(), config)
    }
}
