//! The runtime facade that grants connections.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use custodian_cantrip::{Cantrip, CantripCache, CantripFactory, CantripResult, MultiCantrip};
use custodian_core::Value;
use custodian_policy::{
    ConnectionContext, DefaultPolicyConformanceCheck, PolicyConformanceCheck,
};
use custodian_schema::DataTypeDescriptor;
use tracing::{error, info, warn};

use crate::config::{CustodianConfig, PolicyMode};
use crate::connection::{ConnectionName, ConnectionRequest, ProcessorNode};
use crate::context::ChronicleContext;
use crate::engine::{ChroniclePolicyEngine, PolicyEngine};
use crate::error::{CustodianError, CustodianResult};

/// Access granted to one connection
#[derive(Debug, Clone)]
pub struct ConnectionGrant {
    /// Connection granted
    pub connection_name: ConnectionName,
    /// Schema of the data behind it
    pub descriptor: DataTypeDescriptor,
    /// Redaction to apply to everything read through it
    pub cantrip: Arc<MultiCantrip>,
}

impl ConnectionGrant {
    /// Redact data read through the connection, dropping omitted entities
    ///
    /// # Errors
    ///
    /// Returns the first error an operation throws
    pub fn redact_all(&self, data: &[Value]) -> CantripResult<Vec<Value>> {
        self.cantrip.apply_all(data)
    }
}

/// Validates connection requests against the policy set and hands out
/// [`ConnectionGrant`]s.
///
/// The context is swapped atomically on update; requests in flight keep
/// the snapshot they started with.
pub struct Custodian {
    config: CustodianConfig,
    engine: Arc<dyn PolicyEngine>,
    factory: CantripFactory,
    cache: CantripCache,
    context: RwLock<Arc<ChronicleContext>>,
}

impl Custodian {
    /// Start a runtime with the default engine and conformance check.
    ///
    /// # Errors
    ///
    /// See [`Custodian::with_engine`]
    pub fn new(
        config: CustodianConfig,
        context: ChronicleContext,
        factory: CantripFactory,
    ) -> CustodianResult<Self> {
        Self::with_engine(
            config,
            context,
            factory,
            Arc::new(ChroniclePolicyEngine::new()),
            &DefaultPolicyConformanceCheck,
        )
    }

    /// Start a runtime with a custom engine and conformance check.
    ///
    /// # Errors
    ///
    /// - [`CustodianError::Conformance`] if conformance is enforced and the
    ///   policy set is malformed
    /// - [`CustodianError::PolicyViolation`] if a write connection breaks
    ///   every policy governing it and the mode is [`PolicyMode::Strict`]
    pub fn with_engine(
        config: CustodianConfig,
        context: ChronicleContext,
        factory: CantripFactory,
        engine: Arc<dyn PolicyEngine>,
        conformance: &dyn PolicyConformanceCheck,
    ) -> CustodianResult<Self> {
        if config.enforce_conformance {
            if let Err(err) = conformance.check_policies_conform(context.policy_set().as_slice()) {
                error!(error = %err, "policy set is malformed");
                return Err(err.into());
            }
        }

        let custodian = Self {
            config,
            engine,
            factory,
            cache: CantripCache::new(),
            context: RwLock::new(Arc::new(context)),
        };

        let writes = custodian.engine.check_write_connections(&custodian.context());
        if let Some(message) = writes.message() {
            custodian.tolerate(CustodianError::PolicyViolation { message })?;
        }

        let context = custodian.context();
        info!(
            mode = ?custodian.config.policy_mode,
            providers = context.connection_providers().len(),
            policies = context.policy_set().len(),
            "custodian started"
        );
        Ok(custodian)
    }

    /// Validate a request and grant the connection.
    ///
    /// Checks, in order: the requester declares the connection, a provider
    /// serves it, the policy is part of the set, a read carries a policy,
    /// and the policy allows the read. Under [`PolicyMode::Log`] the last
    /// three are logged instead of failing the request.
    ///
    /// # Errors
    ///
    /// Returns the first failed check, or the error building the cantrip
    pub fn check_request(&self, request: &ConnectionRequest) -> CustodianResult<ConnectionGrant> {
        let context = self.context();
        let connection = &request.connection_name;

        if !request
            .requester
            .required_connection_names()
            .contains(connection)
        {
            return Err(CustodianError::ConnectionNotDeclared {
                connection: connection.to_string(),
                requester: request.requester.name().to_string(),
            });
        }

        let descriptor = context
            .find_data_type(connection)
            .map(|data_type| data_type.descriptor.clone())
            .ok_or_else(|| CustodianError::ConnectionProviderNotFound {
                connection: connection.to_string(),
            })?;

        let policy_index = match &request.policy {
            Some(policy) => {
                let index = context.policy_set().position(policy);
                if index.is_none() {
                    self.tolerate(CustodianError::PolicyNotFound {
                        name: policy.name.clone(),
                    })?;
                }
                index
            }
            None => None,
        };

        let context = self.remember(&request.requester);
        if request.is_read() {
            match &request.policy {
                None => self.tolerate(CustodianError::MissingReadPolicy {
                    connection: connection.to_string(),
                })?,
                Some(policy) => {
                    let result = self.engine.check_policy(policy, request, &context);
                    if let Some(message) = result.message() {
                        self.tolerate(CustodianError::PolicyViolation { message })?;
                    }
                }
            }
        }

        let cantrip = if !request.is_read() {
            Arc::new(MultiCantrip::no_op())
        } else {
            let usage = request.requester.usage_type();
            let policy = request.policy.as_ref();
            let build = || self.factory.build_cantrip(&descriptor, policy, usage);
            if policy.is_some() && policy_index.is_none() {
                Arc::new(build()?)
            } else {
                self.cache
                    .get_or_build(policy_index, &descriptor.name, usage, build)?
            }
        };

        Ok(ConnectionGrant {
            connection_name: connection.clone(),
            descriptor,
            cantrip,
        })
    }

    /// Replace the ambient connection context
    pub fn update_connection_context(&self, connection_context: ConnectionContext) {
        let mut context = self
            .context
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *context = Arc::new(context.with_connection_context(connection_context));
    }

    /// Reader and writer connections serving `dtd_name`
    #[must_use]
    pub fn available_connections(&self, dtd_name: &str) -> BTreeSet<ConnectionName> {
        self.context()
            .data_types()
            .filter(|data_type| data_type.descriptor.name == dtd_name)
            .flat_map(|data_type| data_type.connection_names.iter().cloned())
            .collect()
    }

    /// Current context snapshot
    #[must_use]
    pub fn context(&self) -> Arc<ChronicleContext> {
        Arc::clone(&self.context.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Runtime configuration
    #[must_use]
    pub fn config(&self) -> &CustodianConfig {
        &self.config
    }

    /// Cantrips built so far
    #[must_use]
    pub fn cache(&self) -> &CantripCache {
        &self.cache
    }

    /// Add the requester to the context, returning the updated snapshot
    fn remember(&self, node: &Arc<dyn ProcessorNode>) -> Arc<ChronicleContext> {
        let mut context = self
            .context
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !context.knows_node(node.as_ref()) {
            *context = Arc::new(context.with_node(Arc::clone(node)));
        }
        Arc::clone(&context)
    }

    fn tolerate(&self, err: CustodianError) -> CustodianResult<()> {
        match self.config.policy_mode {
            PolicyMode::Strict => {
                error!(error = %err, "rejected by policy");
                Err(err)
            }
            PolicyMode::Log => {
                warn!(error = %err, "policy violation tolerated");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Custodian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custodian")
            .field("config", &self.config)
            .field("context", &self.context())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{DeclaredProcessorNode, ManagedDataType};
    use crate::connection::ConnectionProvider;
    use custodian_cantrip::OperationLibrary;
    use custodian_core::{Duration, Record};
    use custodian_optics::OpticsManifest;
    use custodian_policy::{
        ManagementStrategy, Policy, PolicyBuilder, PolicyContextRule, PolicySet, StorageMedia,
        StorageMedium, UsageType,
    };
    use custodian_schema::{DataTypeDescriptorSet, FieldType};

    fn person() -> DataTypeDescriptor {
        DataTypeDescriptor::builder("Person")
            .field("name", FieldType::String)
            .field("age", FieldType::Integer)
            .build()
            .unwrap()
    }

    fn policy() -> Policy {
        PolicyBuilder::new("Ages", "Analytics")
            .description("hides ages on egress")
            .allowed_context(PolicyContextRule::key_present("consent"))
            .target(&person(), Duration::from_days(1), |t| {
                t.retention(StorageMedium::Ram, false)
                    .field("name", |f| f.raw_usage(UsageType::Egress))
                    .field("age", |f| {
                        f.raw_usage(UsageType::Join)
                            .conditional_usage("EMPTY", UsageType::Egress)
                    })
            })
            .build()
            .unwrap()
    }

    fn custodian(mode: PolicyMode, policies: Vec<Policy>) -> CustodianResult<Custodian> {
        let provider: Arc<dyn ConnectionProvider> = Arc::new(ManagedDataType::new(
            person(),
            ManagementStrategy::stored(false, StorageMedia::Memory, Some(Duration::from_hours(1))),
            [ConnectionName::reader("people"), ConnectionName::writer("people")],
        ));
        let dtds = DataTypeDescriptorSet::new([person()]).unwrap();
        let factory = CantripFactory::new(
            Arc::new(OpticsManifest::from_descriptors(dtds.clone()).unwrap()),
            Arc::new(OperationLibrary::with_defaults()),
        );
        let context =
            ChronicleContext::new([provider], Arc::new(PolicySet::new(policies)), Arc::new(dtds))?;
        Custodian::new(
            CustodianConfig::default().policy_mode(mode),
            context,
            factory,
        )
    }

    fn reader() -> Arc<dyn ProcessorNode> {
        Arc::new(DeclaredProcessorNode::new(
            "Uploader",
            [ConnectionName::reader("people")],
        ))
    }

    #[test]
    fn test_grant_carries_redaction() {
        let custodian = custodian(PolicyMode::Strict, vec![policy()]).unwrap();
        custodian.update_connection_context(ConnectionContext::new().with("consent", true));

        let request = ConnectionRequest::new(ConnectionName::reader("people"), reader(), Some(policy()));
        let grant = custodian.check_request(&request).unwrap();
        assert_eq!(grant.descriptor.name, "Person");
        assert_eq!(grant.cantrip.len(), 1);

        let larry: Value = Record::new("Person").with("name", "Larry").with("age", 42).into();
        let redacted = grant.redact_all(&[larry]).unwrap();
        assert_eq!(redacted[0].field("age"), Some(&Value::Int(0)));
        assert_eq!(redacted[0].field("name"), Some(&Value::from("Larry")));

        custodian.check_request(&request).unwrap();
        assert_eq!(custodian.cache().len(), 1);
        assert_eq!(custodian.context().processor_nodes().len(), 1);
    }

    #[test]
    fn test_request_checks_in_order() {
        let custodian = custodian(PolicyMode::Strict, vec![policy()]).unwrap();

        let undeclared = ConnectionRequest::new(ConnectionName::writer("people"), reader(), None);
        assert!(matches!(
            custodian.check_request(&undeclared),
            Err(CustodianError::ConnectionNotDeclared { .. })
        ));

        let ghost_reader: Arc<dyn ProcessorNode> = Arc::new(DeclaredProcessorNode::new(
            "Ghost",
            [ConnectionName::reader("ghosts")],
        ));
        let unserved = ConnectionRequest::new(ConnectionName::reader("ghosts"), ghost_reader, None);
        assert!(matches!(
            custodian.check_request(&unserved),
            Err(CustodianError::ConnectionProviderNotFound { .. })
        ));

        let stranger = PolicyBuilder::new("Stranger", "Analytics").build().unwrap();
        let unknown =
            ConnectionRequest::new(ConnectionName::reader("people"), reader(), Some(stranger));
        assert!(matches!(
            custodian.check_request(&unknown),
            Err(CustodianError::PolicyNotFound { .. })
        ));

        let missing = ConnectionRequest::new(ConnectionName::reader("people"), reader(), None);
        assert!(matches!(
            custodian.check_request(&missing),
            Err(CustodianError::MissingReadPolicy { .. })
        ));

        let no_consent =
            ConnectionRequest::new(ConnectionName::reader("people"), reader(), Some(policy()));
        let err = custodian.check_request(&no_consent).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Policy violation: [Connection context fails to meet required policy conditions]"
        );
    }

    #[test]
    fn test_equal_requesters_are_remembered_once() {
        let custodian = custodian(PolicyMode::Strict, vec![policy()]).unwrap();
        custodian.update_connection_context(ConnectionContext::new().with("consent", true));

        for _ in 0..5 {
            let request =
                ConnectionRequest::new(ConnectionName::reader("people"), reader(), Some(policy()));
            custodian.check_request(&request).unwrap();
        }
        assert_eq!(custodian.context().processor_nodes().len(), 1);
        assert_eq!(custodian.cache().len(), 1);
    }

    #[test]
    fn test_same_named_policies_get_their_own_cantrips() {
        let open = PolicyBuilder::new("Ages", "Analytics")
            .allowed_context(PolicyContextRule::key_present("consent"))
            .target(&person(), Duration::from_days(1), |t| {
                t.retention(StorageMedium::Ram, false)
                    .field("name", |f| f.raw_usage(UsageType::Egress))
                    .field("age", |f| f.raw_usage(UsageType::Egress))
            })
            .build()
            .unwrap();
        let custodian = custodian(PolicyMode::Strict, vec![open.clone(), policy()]).unwrap();
        custodian.update_connection_context(ConnectionContext::new().with("consent", true));
        let larry: Value = Record::new("Person").with("name", "Larry").with("age", 42).into();

        let raw = custodian
            .check_request(&ConnectionRequest::new(
                ConnectionName::reader("people"),
                reader(),
                Some(open),
            ))
            .unwrap();
        assert!(raw.cantrip.is_no_op());
        assert_eq!(raw.redact_all(&[larry.clone()]).unwrap()[0].field("age"), Some(&Value::Int(42)));

        let redacting = custodian
            .check_request(&ConnectionRequest::new(
                ConnectionName::reader("people"),
                reader(),
                Some(policy()),
            ))
            .unwrap();
        assert_eq!(redacting.cantrip.len(), 1);
        assert_eq!(redacting.redact_all(&[larry]).unwrap()[0].field("age"), Some(&Value::Int(0)));
        assert_eq!(custodian.cache().len(), 2);
    }

    #[test]
    fn test_writes_skip_policy_check() {
        let custodian = custodian(PolicyMode::Strict, vec![policy()]).unwrap();
        let writer: Arc<dyn ProcessorNode> = Arc::new(DeclaredProcessorNode::new(
            "Collector",
            [ConnectionName::writer("people")],
        ));
        let grant = custodian
            .check_request(&ConnectionRequest::new(ConnectionName::writer("people"), writer, None))
            .unwrap();
        assert!(grant.cantrip.is_no_op());
    }

    #[test]
    fn test_log_mode_tolerates_violations() {
        let custodian = custodian(PolicyMode::Log, vec![policy()]).unwrap();
        let missing = ConnectionRequest::new(ConnectionName::reader("people"), reader(), None);
        let grant = custodian.check_request(&missing).unwrap();
        assert!(grant.cantrip.is_no_op());

        let no_consent =
            ConnectionRequest::new(ConnectionName::reader("people"), reader(), Some(policy()));
        assert_eq!(custodian.check_request(&no_consent).unwrap().cantrip.len(), 1);
    }

    #[test]
    fn test_startup_write_check() {
        let err = custodian(PolicyMode::Strict, Vec::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Policy violation: [Person must have a corresponding policy]"
        );
        assert!(custodian(PolicyMode::Log, Vec::new()).is_ok());
    }

    #[test]
    fn test_available_connections() {
        let custodian = custodian(PolicyMode::Strict, vec![policy()]).unwrap();
        let connections = custodian.available_connections("Person");
        assert_eq!(connections.len(), 2);
        assert!(connections.contains(&ConnectionName::writer("people")));
        assert!(custodian.available_connections("Pet").is_empty());
    }
}
