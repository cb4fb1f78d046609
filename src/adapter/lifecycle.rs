//! Native handle lifecycle: connect, disconnect, reconnect

use super::{parking, Adapter};
use crate::error::Result;
use tracing::{info, warn};

impl Adapter {
    /// Open the handles unless they already exist
    ///
    /// Returns true when this call established the connection. Parameters
    /// are validated before anything is opened.
    pub fn connect(&mut self) -> Result<bool> {
        if self.handles.is_some() {
            return Ok(false);
        }
        self.config.validate()?;

        if self.config.persistent {
            let key = parking::slot_key(&self.connector, &self.config);
            if let Some(handles) = parking::reclaim(&key) {
                info!("Reusing persistent connection {}", key);
                self.handles = Some(handles);
                return Ok(true);
            }
        }

        let handles = self
            .topology
            .open(self.connector.as_ref(), &self.config)
            .map_err(|err| {
                warn!("Connection failed: {}", err);
                err
            })?;
        info!("Connected ({:?} topology)", self.topology);
        self.handles = Some(handles);
        Ok(true)
    }

    /// Close and discard the handles; false if there were none
    ///
    /// Persistent handles are parked for the next connect instead.
    pub fn disconnect(&mut self) -> bool {
        let mut handles = match self.handles.take() {
            Some(handles) => handles,
            None => return false,
        };

        if self.config.persistent {
            parking::park(parking::slot_key(&self.connector, &self.config), handles);
            info!("Parked persistent connection");
        } else {
            handles.close();
            info!("Disconnected");
        }
        true
    }

    pub fn reconnect(&mut self) -> Result<&mut Self> {
        self.disconnect();
        self.connect()?;
        Ok(self)
    }

    /// True when handles exist, no liveness probe
    pub fn is_connected(&self) -> bool {
        self.handles.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::super::parking;
    use super::*;
    use crate::config::ConnectionConfig;
    use crate::error::ErrorKind;
    use crate::native::{Connector, MemoryConnector};
    use std::sync::Arc;

    fn memory_adapter(config: ConnectionConfig) -> (Adapter, Arc<MemoryConnector>) {
        let connector = Arc::new(MemoryConnector::new());
        (Adapter::new(config, connector.clone()), connector)
    }

    #[test]
    fn test_connect_disconnect_idempotent() {
        let (mut adapter, _) = memory_adapter(ConnectionConfig::memory("n1"));
        assert!(!adapter.is_connected());
        assert!(adapter.connect().unwrap());
        assert!(!adapter.connect().unwrap());
        assert!(adapter.is_connected());

        assert!(adapter.disconnect());
        assert!(!adapter.disconnect());
        assert!(!adapter.is_connected());
    }

    #[test]
    fn test_host_and_socket_is_configuration_error() {
        let mut config = ConnectionConfig::memory("n1");
        config.socket = Some("/tmp/redis.sock".into());
        let (mut adapter, connector) = memory_adapter(config);

        let err = adapter.connect().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!adapter.is_connected());

        let endpoint = ConnectionConfig::memory("n1").endpoint().unwrap();
        assert_eq!(connector.node(&endpoint).lock().clients().count(), 0);
    }

    #[test]
    fn test_neither_host_nor_socket_is_configuration_error() {
        let config = ConnectionConfig::default();
        let (mut adapter, _) = memory_adapter(config);
        assert_eq!(adapter.connect().err().unwrap().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_unrepresentable_timeout_fails_before_opening() {
        for secs in [1e20, f64::NAN, -0.5] {
            let config = ConnectionConfig::memory("n1").with_timeouts(Some(secs), Some(secs));
            let (mut adapter, connector) = memory_adapter(config);

            let err = adapter.connect().err().unwrap();
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert!(err.message().starts_with("Invalid connect_timeout"));

            let endpoint = ConnectionConfig::memory("n1").endpoint().unwrap();
            assert_eq!(connector.node(&endpoint).lock().clients().count(), 0);
        }
    }

    #[test]
    fn test_zero_timeouts_connect() {
        let config = ConnectionConfig::memory("n1").with_timeouts(Some(0.0), Some(0.0));
        let (mut adapter, _) = memory_adapter(config);
        assert!(adapter.connect().unwrap());
        assert_eq!(adapter.config().connect_timeout(), None);
        assert_eq!(adapter.config().read_timeout(), None);
    }

    #[test]
    fn test_refused_connection_keeps_root_cause() {
        let config = ConnectionConfig::memory("down");
        let (mut adapter, connector) = memory_adapter(config.clone());
        connector.set_reachable(&config.endpoint().unwrap(), false);

        let err = adapter.connect().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.message(), "Failed to connect to down:6379");
        assert_eq!(err.root_cause().unwrap().message(), "Connection refused");
    }

    #[test]
    fn test_reconnect_opens_new_handle() {
        let (mut adapter, connector) = memory_adapter(ConnectionConfig::memory("n1"));
        adapter.connect().unwrap();
        assert!(adapter.reconnect().unwrap().is_connected());

        let endpoint = adapter.config().endpoint().unwrap();
        let node = connector.node(&endpoint);
        let ids: Vec<u64> = node.lock().clients().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_persistent_handle_is_parked_and_reused() {
        let config = ConnectionConfig::memory("persistent-node").persistent(true);
        let connector: Arc<dyn Connector> = Arc::new(MemoryConnector::new());
        let key = parking::slot_key(&connector, &config);

        let mut first = Adapter::new(config.clone(), connector.clone());
        first.connect().unwrap();
        assert!(first.disconnect());
        assert_eq!(parking::parked(&key), 1);

        let mut second = Adapter::new(config, connector);
        assert!(second.connect().unwrap());
        assert_eq!(parking::parked(&key), 0);
    }

    #[test]
    fn test_parked_handle_not_reused_with_other_password() {
        let connector: Arc<dyn Connector> =
            Arc::new(MemoryConnector::new().with_credentials(None, "secret"));
        let config = ConnectionConfig::memory("locked-node").persistent(true);
        let right = config.clone().with_credentials(None, "secret");
        let wrong = config.with_credentials(None, "guess");

        let mut first = Adapter::new(right.clone(), connector.clone());
        first.connect().unwrap();
        first.disconnect();
        assert_eq!(parking::parked(&parking::slot_key(&connector, &right)), 1);

        let mut second = Adapter::new(wrong, connector.clone());
        let err = second.connect().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert!(err.message().contains("WRONGPASS"));
        assert_eq!(parking::parked(&parking::slot_key(&connector, &right)), 1);
    }

    #[test]
    fn test_drop_closes_transient_handle() {
        let (mut adapter, connector) = memory_adapter(ConnectionConfig::memory("n1"));
        adapter.connect().unwrap();
        let endpoint = adapter.config().endpoint().unwrap();
        drop(adapter);
        assert_eq!(connector.node(&endpoint).lock().clients().count(), 0);
    }
}
