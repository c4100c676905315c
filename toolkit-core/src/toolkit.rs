//! Framework-agnostic toolkit lifecycle.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use toolkit_config::Configuration;
use toolkit_kernel::AsyncInitializer;
use toolkit_mcp::{McpClient, McpClientConfig, McpTransport};
use toolkit_policy::filter_tools;
use toolkit_primitives::{ToolkitError, ToolkitResult};
use tracing::{debug, info};

use crate::converter::{Shared, ToolConverter, ToolRunner};

/// Connects to the MCP server, filters the catalog through the capability
/// configuration, and hands the result to a [`ToolConverter`].
pub struct ToolkitCore<C: ToolConverter> {
    runner: ToolRunner,
    configuration: Configuration,
    converter: C,
    tools: RwLock<Arc<C::Tools>>,
}

impl<C: ToolConverter> fmt::Debug for ToolkitCore<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolkitCore")
            .field("client", self.client())
            .field("configuration", &self.configuration)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl<C: ToolConverter> ToolkitCore<C> {
    /// Creates a toolkit talking to the default MCP endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Configuration`] if the key is empty or malformed.
    pub fn new(
        secret_key: impl Into<String>,
        configuration: Configuration,
        converter: C,
    ) -> ToolkitResult<Self> {
        let client = McpClient::new(client_config(secret_key, &configuration))?;
        Ok(Self::from_client(client, configuration, converter))
    }

    /// Creates a toolkit over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Configuration`] if the key is empty or malformed.
    pub fn with_transport(
        secret_key: impl Into<String>,
        configuration: Configuration,
        converter: C,
        transport: Arc<dyn McpTransport>,
    ) -> ToolkitResult<Self> {
        let client =
            McpClient::with_transport(client_config(secret_key, &configuration), transport)?;
        Ok(Self::from_client(client, configuration, converter))
    }

    /// Wraps an already configured client.
    #[must_use]
    pub fn from_client(client: McpClient, configuration: Configuration, converter: C) -> Self {
        let empty = Arc::new(converter.empty());
        let shared = Arc::new(Shared {
            client,
            initializer: AsyncInitializer::new(),
        });
        Self {
            runner: ToolRunner::new(shared),
            configuration,
            converter,
            tools: RwLock::new(empty),
        }
    }

    /// Underlying protocol client.
    #[must_use]
    pub fn client(&self) -> &McpClient {
        &self.runner.shared().client
    }

    /// Configuration supplied at construction.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Conversion strategy.
    #[must_use]
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Handle for invoking tools outside the toolkit.
    #[must_use]
    pub fn runner(&self) -> ToolRunner {
        self.runner.clone()
    }

    /// Returns `true` after a successful [`initialize`](Self::initialize).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.runner.is_initialized()
    }

    /// Connects, filters, and converts the remote catalog.
    ///
    /// Concurrent callers share one attempt. Calling this on an initialized
    /// toolkit does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Connection`] if discovery fails; the next call
    /// retries.
    pub async fn initialize(&self) -> ToolkitResult<()> {
        self.runner
            .shared()
            .initializer
            .initialize(|| self.load())
            .await
    }

    async fn load(&self) -> ToolkitResult<()> {
        let client = self.client();
        client.connect().await?;

        let remote = client.get_tools()?;
        let allowed = filter_tools(&remote, &self.configuration);
        let converted = self.converter.convert(&allowed, &self.runner);
        *self.tools.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(converted);

        info!(
            discovered = remote.len(),
            exposed = allowed.len(),
            "toolkit initialized"
        );
        Ok(())
    }

    /// Returns the converted tools.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotInitialized`] before initialization.
    pub fn get_tools(&self) -> ToolkitResult<Arc<C::Tools>> {
        if !self.is_initialized() {
            return Err(ToolkitError::NotInitialized);
        }
        Ok(Arc::clone(
            &self.tools.read().unwrap_or_else(PoisonError::into_inner),
        ))
    }

    /// Invokes a remote tool by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::NotInitialized`] before initialization and
    /// [`ToolkitError::ToolExecution`] when the call fails.
    pub async fn run_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
        customer: Option<&str>,
    ) -> ToolkitResult<String> {
        self.runner.run(name, args, customer).await
    }

    /// Disconnects and restores the empty tool collection.
    ///
    /// Safe to call any number of times; the toolkit can be initialized again.
    pub fn close(&self) {
        if !self.is_initialized() {
            return;
        }
        self.client().disconnect();
        self.runner.shared().initializer.reset();
        *self.tools.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(self.converter.empty());
        debug!("toolkit closed");
    }
}

/// Builds a toolkit and initializes it.
///
/// # Errors
///
/// Returns [`ToolkitError::Configuration`] for a bad key and
/// [`ToolkitError::Connection`] if discovery fails.
pub async fn create_toolkit<C: ToolConverter>(
    secret_key: impl Into<String>,
    configuration: Configuration,
    converter: C,
) -> ToolkitResult<ToolkitCore<C>> {
    let toolkit = ToolkitCore::new(secret_key, configuration, converter)?;
    toolkit.initialize().await?;
    Ok(toolkit)
}

fn client_config(secret_key: impl Into<String>, configuration: &Configuration) -> McpClientConfig {
    McpClientConfig::new(secret_key).with_context(&configuration.context_or_default())
}
