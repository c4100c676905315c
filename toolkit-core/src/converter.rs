//! Strategies that turn discovered tools into framework-specific values.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use toolkit_kernel::AsyncInitializer;
use toolkit_mcp::McpClient;
use toolkit_primitives::{McpTool, ToolkitError, ToolkitResult};

/// Converts the allowed remote tools into the collection a framework expects.
///
/// Implementations are pure: they receive the filtered descriptors and a
/// [`ToolRunner`] that converted callables use to reach the server.
pub trait ToolConverter: Send + Sync {
    /// Collection handed to the framework.
    type Tools: Send + Sync;

    /// Value exposed before initialization and after close.
    fn empty(&self) -> Self::Tools;

    /// Builds the collection from the allowed descriptors.
    fn convert(&self, tools: &[McpTool], runner: &ToolRunner) -> Self::Tools;
}

pub(crate) struct Shared {
    pub(crate) client: McpClient,
    pub(crate) initializer: AsyncInitializer<ToolkitError>,
}

/// Cloneable handle used by converted tools to invoke remote operations.
///
/// Calls fail with [`ToolkitError::NotInitialized`] once the owning toolkit
/// is closed.
#[derive(Clone)]
pub struct ToolRunner {
    shared: Arc<Shared>,
}

impl fmt::Debug for ToolRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRunner")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl ToolRunner {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    /// Returns `true` while the owning toolkit is initialized.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.initializer.is_initialized()
    }

    /// Invokes `name` on the server.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotInitialized`] when the toolkit is not
    /// initialized, otherwise whatever the client reports.
    pub async fn run(
        &self,
        name: &str,
        args: Map<String, Value>,
        customer: Option<&str>,
    ) -> ToolkitResult<String> {
        if !self.is_initialized() {
            return Err(ToolkitError::NotInitialized);
        }
        self.shared.client.call_tool(name, args, customer).await
    }
}

/// Exposes the descriptors unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughConverter;

impl ToolConverter for PassthroughConverter {
    type Tools = Vec<McpTool>;

    fn empty(&self) -> Self::Tools {
        Vec::new()
    }

    fn convert(&self, tools: &[McpTool], _runner: &ToolRunner) -> Self::Tools {
        tools.to_vec()
    }
}
