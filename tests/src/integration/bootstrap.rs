//! # Service Bootstrap
//!
//! Startup order for a service on the pack: logging first, then the secret
//! store for layered config, falling back to compiled-in defaults when the
//! store cannot be reached.

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use shared_types::{DomainError, ErrorKind};
    use sp_02_events::{StartPolicy, SubscriberConfig};
    use sp_04_secret_store::{SecretStoreError, VaultClient, VaultConfig};
    use sp_telemetry::{build_filter, init_logging, log_event, TelemetryConfig, TelemetryError};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ProjectorSettings {
        subject: String,
        durable_name: String,
        start_at: String,
    }

    impl Default for ProjectorSettings {
        fn default() -> Self {
            Self {
                subject: "inventory.stock.commit".into(),
                durable_name: "projector".into(),
                start_at: "since:1h".into(),
            }
        }
    }

    async fn settings(client: &VaultClient) -> ProjectorSettings {
        let defaults = ProjectorSettings::default();
        match client.load_config("projector", &defaults).await {
            Ok(loaded) => loaded,
            Err(e) => {
                let err = DomainError::from(e);
                log_event!(warn, "bootstrap", "using default settings", kind = %err.kind(), error = %err);
                defaults
            }
        }
    }

    // Only one test in this binary installs the global subscriber.
    #[test]
    fn test_logging_installs_once() {
        let config = TelemetryConfig {
            console_output: false,
            ..TelemetryConfig::for_service("projector")
        };
        assert!(build_filter(&config).is_ok());

        let guard = init_logging(&config).expect("first init");
        assert_eq!(guard.service_name(), "projector");
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_bad_vault_address_is_not_initialized() {
        let err = VaultClient::new(VaultConfig {
            address: "vault without scheme".into(),
            ..VaultConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, SecretStoreError::NotInitialized(_)));

        let err = DomainError::from(err);
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
        assert_eq!(err.message(), "client_has_not_been_initiated");
    }

    #[tokio::test]
    async fn test_unreachable_vault_falls_back_to_defaults() {
        let client = VaultClient::new(VaultConfig {
            address: "http://127.0.0.1:1".into(),
            token: "root".into(),
            timeout_secs: 2,
        })
        .unwrap();

        let loaded = settings(&client).await;
        assert_eq!(loaded, ProjectorSettings::default());

        let subscriber = SubscriberConfig::new(
            loaded.subject,
            "projectors",
            loaded.durable_name,
            loaded.start_at.clone(),
        );
        assert_eq!(subscriber.queue_group, "projectors");
        assert!(matches!(
            StartPolicy::parse(&loaded.start_at),
            Ok(StartPolicy::Since(d)) if d.as_secs() == 3600
        ));
    }
}
