//! Compiled-in service port table.

/// Port of the single edge endpoint that serves every service.
pub const DEFAULT_EDGE_PORT: u16 = 4566;

/// One dedicated port per service identifier.
pub const LEGACY_PORTS: &[(&str, u16)] = &[
    ("apigateway", 4567),
    ("cloudformation", 4581),
    ("cloudwatch", 4582),
    ("lambda", 4574),
    ("dynamodb", 4569),
    ("kinesis", 4568),
    ("route53", 4580),
    ("firehose", 4573),
    ("stepfunctions", 4585),
    ("es", 4578),
    ("s3", 4572),
    ("ses", 4579),
    ("sns", 4575),
    ("sqs", 4576),
    ("sts", 4592),
    ("iam", 4593),
];

/// How ports are assigned to services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortTable {
    /// Every service on its own port from [`LEGACY_PORTS`].
    Legacy,
    /// Every service on one shared port.
    Edge(u16),
}

impl PortTable {
    /// Known service identifiers, lower-case.
    pub fn services() -> impl Iterator<Item = &'static str> {
        LEGACY_PORTS.iter().map(|(name, _)| *name)
    }

    /// Port for `service`, or `None` for services outside the table.
    pub fn port_for(&self, service: &str) -> Option<u16> {
        let legacy = LEGACY_PORTS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(service))
            .map(|(_, port)| *port)?;
        match self {
            PortTable::Legacy => Some(legacy),
            PortTable::Edge(port) => Some(*port),
        }
    }

    /// Port used for the loopback connectivity probe.
    pub fn probe_port(&self) -> u16 {
        match self {
            PortTable::Legacy => DEFAULT_EDGE_PORT,
            PortTable::Edge(port) => *port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_lookup() {
        assert_eq!(PortTable::Legacy.port_for("S3"), Some(4572));
        assert_eq!(PortTable::Edge(4566).port_for("s3"), Some(4566));
        assert_eq!(PortTable::Legacy.port_for("redshift"), None);
        assert_eq!(PortTable::services().count(), LEGACY_PORTS.len());
    }
}
