use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{LedgerRepository, RepositoryError};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is passed through to that
/// factory unchanged; its meaning is entirely backend-specific.
///
/// | backend    | connection_string examples          |
/// |------------|-------------------------------------|
/// | `sqlite`   | `books.db`, `:memory:`              |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// One implementation per database backend. Each backend crate exports a
/// single unit struct that implements this trait and is registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) a connection and return a ready-to-use repository.
    /// Implementations are free to run migrations or warm connection pools
    /// inside this method.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn LedgerRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory. A factory with the same name silently
    /// replaces the previous one.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] — no factory registered under
    ///   the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn LedgerRepository>, RepositoryError> {
        let factory = self.factories.get(config.backend.as_str()).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            ))
        })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, Utc};

    use crate::db::repository::DuplicateInvoiceGroup;
    use crate::models::{FederalWithholding, FilingStatus, StateWithholding};

    use super::*;

    // Every method is `unimplemented!()` — the tests never call them; they
    // only verify that the registry routes to the correct factory.
    struct StubRepository;

    #[async_trait]
    impl LedgerRepository for StubRepository {
        async fn get_federal_withholding(
            &self,
            _tax_year: i32,
            _filing_status: FilingStatus,
        ) -> Result<FederalWithholding, RepositoryError> {
            unimplemented!()
        }
        async fn replace_federal_withholding(
            &self,
            _table: &FederalWithholding,
        ) -> Result<usize, RepositoryError> {
            unimplemented!()
        }
        async fn get_state_withholding(
            &self,
            _state: &str,
        ) -> Result<StateWithholding, RepositoryError> {
            unimplemented!()
        }
        async fn upsert_state_withholding(
            &self,
            _config: &StateWithholding,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_states(&self) -> Result<Vec<String>, RepositoryError> {
            unimplemented!()
        }
        async fn reconciliation_count(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn latest_sync_at(&self) -> Result<Option<DateTime<Utc>>, RepositoryError> {
            unimplemented!()
        }
        async fn unsent_invoice_count(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn unmatched_deposit_count(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn overdue_invoice_count(&self) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn unpaid_bill_count_due_before(
            &self,
            _cutoff: NaiveDate,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn failed_payment_count(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn pending_refund_count(&self) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn large_payment_count(
            &self,
            _year: i32,
            _month: u32,
            _threshold_cents: i64,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn duplicate_invoice_groups(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<Vec<DuplicateInvoiceGroup>, RepositoryError> {
            unimplemented!()
        }
        async fn invoice_numbers(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<Vec<String>, RepositoryError> {
            unimplemented!()
        }
        async fn invoice_total_cents(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn bill_total_cents(
            &self,
            _year: i32,
            _month: u32,
        ) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn outstanding_receivable_cents(&self) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn outstanding_payable_cents(&self) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
        async fn bank_balance_cents(&self) -> Result<i64, RepositoryError> {
            unimplemented!()
        }
    }

    struct StubFactory {
        name: &'static str,
        created: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn LedgerRepository>, RepositoryError> {
            self.created.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    #[tokio::test]
    async fn registry_routes_to_matching_factory() {
        let created = Arc::new(AtomicBool::new(false));
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(StubFactory {
            name: "stub",
            created: created.clone(),
        }));

        let config = DbConfig {
            backend: "stub".to_string(),
            connection_string: String::new(),
        };
        let result = registry.create(&config).await;

        assert!(result.is_ok());
        assert!(created.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_is_a_configuration_error() {
        let registry = RepositoryRegistry::new();

        let result = registry.create(&DbConfig::default()).await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }

    #[test]
    fn available_backends_are_sorted() {
        let mut registry = RepositoryRegistry::new();
        for name in ["zeta", "alpha"] {
            registry.register(Box::new(StubFactory {
                name,
                created: Arc::new(AtomicBool::new(false)),
            }));
        }

        assert_eq!(registry.available_backends(), vec!["alpha", "zeta"]);
    }
}
