//! Snapshot of everything a policy decision depends on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use custodian_policy::{ConnectionContext, PolicySet};
use custodian_schema::DataTypeDescriptorSet;
use tracing::debug;

use crate::connection::{
    same_node, ConnectionName, ConnectionProvider, ManagedDataType, ProcessorNode,
};
use crate::error::ContextError;

/// Connection providers, processor nodes, policies and ambient context.
///
/// A context is immutable; `with_*` methods return an updated copy that
/// shares the providers and policies.
#[derive(Clone)]
pub struct ChronicleContext {
    providers: Vec<Arc<dyn ConnectionProvider>>,
    nodes: Vec<Arc<dyn ProcessorNode>>,
    policy_set: Arc<PolicySet>,
    dtds: Arc<DataTypeDescriptorSet>,
    connection_context: ConnectionContext,
    by_connection: HashMap<ConnectionName, usize>,
}

impl ChronicleContext {
    /// Index the providers by the connections they serve.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::ConnectionAmbiguity`] if two providers serve
    /// the same connection
    pub fn new(
        providers: impl IntoIterator<Item = Arc<dyn ConnectionProvider>>,
        policy_set: Arc<PolicySet>,
        dtds: Arc<DataTypeDescriptorSet>,
    ) -> Result<Self, ContextError> {
        let providers: Vec<Arc<dyn ConnectionProvider>> = providers.into_iter().collect();
        let mut by_connection = HashMap::new();
        for (index, provider) in providers.iter().enumerate() {
            for name in &provider.data_type().connection_names {
                if let Some(&existing) = by_connection.get(name) {
                    let first: &Arc<dyn ConnectionProvider> = &providers[existing];
                    return Err(ContextError::ConnectionAmbiguity {
                        connection: name.to_string(),
                        first: first.data_type().descriptor.name.clone(),
                        second: provider.data_type().descriptor.name.clone(),
                    });
                }
                by_connection.insert(name.clone(), index);
            }
        }
        debug!(
            providers = providers.len(),
            connections = by_connection.len(),
            "indexed connection providers"
        );
        Ok(Self {
            providers,
            nodes: Vec::new(),
            policy_set,
            dtds,
            connection_context: ConnectionContext::new(),
            by_connection,
        })
    }

    /// Copy of this context that also knows `node`
    #[must_use]
    pub fn with_node(&self, node: Arc<dyn ProcessorNode>) -> Self {
        let mut next = self.clone();
        if !next.knows_node(node.as_ref()) {
            next.nodes.push(node);
        }
        next
    }

    /// Whether an equal node is already registered
    #[must_use]
    pub fn knows_node(&self, node: &dyn ProcessorNode) -> bool {
        self.nodes.iter().any(|known| same_node(known.as_ref(), node))
    }

    /// Copy of this context with a different ambient context
    #[must_use]
    pub fn with_connection_context(&self, connection_context: ConnectionContext) -> Self {
        Self {
            connection_context,
            ..self.clone()
        }
    }

    /// Provider serving `connection`
    #[must_use]
    pub fn find_connection_provider(
        &self,
        connection: &ConnectionName,
    ) -> Option<&Arc<dyn ConnectionProvider>> {
        self.by_connection
            .get(connection)
            .and_then(|&index| self.providers.get(index))
    }

    /// Data type reached through `connection`
    #[must_use]
    pub fn find_data_type(&self, connection: &ConnectionName) -> Option<&ManagedDataType> {
        self.find_connection_provider(connection)
            .map(|provider| provider.data_type())
    }

    /// Data types of every provider
    pub fn data_types(&self) -> impl Iterator<Item = &ManagedDataType> {
        self.providers.iter().map(|provider| provider.data_type())
    }

    /// Connection providers
    #[must_use]
    pub fn connection_providers(&self) -> &[Arc<dyn ConnectionProvider>] {
        &self.providers
    }

    /// Processor nodes seen so far
    #[must_use]
    pub fn processor_nodes(&self) -> &[Arc<dyn ProcessorNode>] {
        &self.nodes
    }

    /// Policies
    #[must_use]
    pub fn policy_set(&self) -> &PolicySet {
        &self.policy_set
    }

    /// Descriptors
    #[must_use]
    pub fn dtds(&self) -> &DataTypeDescriptorSet {
        &self.dtds
    }

    /// Ambient key/value context of the connection
    #[must_use]
    pub fn connection_context(&self) -> &ConnectionContext {
        &self.connection_context
    }
}

impl fmt::Debug for ChronicleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChronicleContext")
            .field("providers", &self.providers.len())
            .field("nodes", &self.nodes.len())
            .field("policies", &self.policy_set.len())
            .field("connection_context", &self.connection_context)
            .finish_non_exhaustive()
    }
}
