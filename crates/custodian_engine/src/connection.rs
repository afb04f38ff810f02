//! Connections, the data types behind them, and the processors that ask
//! for them.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use custodian_policy::{ManagementStrategy, Policy, UsageType};
use custodian_schema::DataTypeDescriptor;
use serde::{Deserialize, Serialize};

/// Identifies one way of reading or writing a managed data type
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConnectionName {
    /// Read access
    Reader(String),
    /// Write access
    Writer(String),
}

impl ConnectionName {
    /// Reader connection with this name
    #[must_use]
    pub fn reader(name: impl Into<String>) -> Self {
        Self::Reader(name.into())
    }

    /// Writer connection with this name
    #[must_use]
    pub fn writer(name: impl Into<String>) -> Self {
        Self::Writer(name.into())
    }

    /// Bare connection name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Reader(name) | Self::Writer(name) => name,
        }
    }

    /// Whether this connection writes
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Writer(_))
    }
}

impl fmt::Display for ConnectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader(name) => write!(f, "Reader({name})"),
            Self::Writer(name) => write!(f, "Writer({name})"),
        }
    }
}

/// A data type together with how it is stored and the connections that
/// reach it
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedDataType {
    /// Schema of the data
    pub descriptor: DataTypeDescriptor,
    /// How the data is retained
    pub management_strategy: ManagementStrategy,
    /// Connections serving the data
    pub connection_names: BTreeSet<ConnectionName>,
}

impl ManagedDataType {
    /// Describe a managed data type
    #[must_use]
    pub fn new(
        descriptor: DataTypeDescriptor,
        management_strategy: ManagementStrategy,
        connection_names: impl IntoIterator<Item = ConnectionName>,
    ) -> Self {
        Self {
            descriptor,
            management_strategy,
            connection_names: connection_names.into_iter().collect(),
        }
    }

    /// Whether any connection writes
    #[must_use]
    pub fn is_write_capable(&self) -> bool {
        self.connection_names.iter().any(ConnectionName::is_write)
    }

    /// Reader connections
    pub fn readers(&self) -> impl Iterator<Item = &ConnectionName> {
        self.connection_names.iter().filter(|c| !c.is_write())
    }

    /// Writer connections
    pub fn writers(&self) -> impl Iterator<Item = &ConnectionName> {
        self.connection_names.iter().filter(|c| c.is_write())
    }
}

/// Supplies the connections of one managed data type
pub trait ConnectionProvider: Send + Sync {
    /// The data type served
    fn data_type(&self) -> &ManagedDataType;
}

impl ConnectionProvider for ManagedDataType {
    fn data_type(&self) -> &ManagedDataType {
        self
    }
}

/// A consumer of governed data
pub trait ProcessorNode: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Connections the node declares it needs
    fn required_connection_names(&self) -> &BTreeSet<ConnectionName>;

    /// How the node consumes the data it reads
    fn usage_type(&self) -> UsageType {
        UsageType::Egress
    }
}

/// Whether two nodes are the same participant: equal name, declared
/// connections and usage
#[must_use]
pub fn same_node(a: &dyn ProcessorNode, b: &dyn ProcessorNode) -> bool {
    a.name() == b.name()
        && a.usage_type() == b.usage_type()
        && a.required_connection_names() == b.required_connection_names()
}

/// A processor node described entirely by data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredProcessorNode {
    name: String,
    required: BTreeSet<ConnectionName>,
    usage: UsageType,
}

impl DeclaredProcessorNode {
    /// Node requiring the given connections, consuming for egress
    #[must_use]
    pub fn new(name: impl Into<String>, required: impl IntoIterator<Item = ConnectionName>) -> Self {
        Self {
            name: name.into(),
            required: required.into_iter().collect(),
            usage: UsageType::Egress,
        }
    }

    /// Set the usage type
    #[must_use]
    pub fn usage(mut self, usage: UsageType) -> Self {
        self.usage = usage;
        self
    }
}

impl ProcessorNode for DeclaredProcessorNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_connection_names(&self) -> &BTreeSet<ConnectionName> {
        &self.required
    }

    fn usage_type(&self) -> UsageType {
        self.usage
    }
}

/// Runs a node inside a sandbox: same connections, sandbox usage
#[derive(Clone)]
pub struct SandboxProcessorNode {
    inner: Arc<dyn ProcessorNode>,
}

impl SandboxProcessorNode {
    /// Sandbox the given node
    #[must_use]
    pub fn new(inner: Arc<dyn ProcessorNode>) -> Self {
        Self { inner }
    }

    /// The wrapped node
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn ProcessorNode> {
        &self.inner
    }
}

impl ProcessorNode for SandboxProcessorNode {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn required_connection_names(&self) -> &BTreeSet<ConnectionName> {
        self.inner.required_connection_names()
    }

    fn usage_type(&self) -> UsageType {
        UsageType::Sandbox
    }
}

impl fmt::Debug for SandboxProcessorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SandboxProcessorNode({})", self.inner.name())
    }
}

/// A processor asking for a connection under a policy
#[derive(Clone)]
pub struct ConnectionRequest {
    /// Connection asked for
    pub connection_name: ConnectionName,
    /// Node asking
    pub requester: Arc<dyn ProcessorNode>,
    /// Policy the data will be consumed under
    pub policy: Option<Policy>,
}

impl ConnectionRequest {
    /// Build a request
    #[must_use]
    pub fn new(
        connection_name: ConnectionName,
        requester: Arc<dyn ProcessorNode>,
        policy: Option<Policy>,
    ) -> Self {
        Self {
            connection_name,
            requester,
            policy,
        }
    }

    /// Whether the request reads
    #[must_use]
    pub fn is_read(&self) -> bool {
        !self.connection_name.is_write()
    }
}

impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("connection_name", &self.connection_name)
            .field("requester", &self.requester.name())
            .field("policy", &self.policy.as_ref().map(|p| p.name.as_str()))
            .finish()
    }
}
