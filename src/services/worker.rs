use crate::models::{MAX_CONCURRENT_OPERATIONS_PER_KIND, OperationKind};
use crate::services::error::InstallError;
use crate::services::installer::{
    CancelHandle, ImportRequest, Imported, InstallRequest, InstallationController, Installed,
    Uninstalled,
};
use crate::services::process::{BaseExtractor, GameClient};
use indexmap::IndexMap;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Runs controller operations as background tasks.
///
/// Each [`OperationKind`] owns a single-permit semaphore. Submitting while
/// the slot is taken fails immediately with
/// [`InstallError::AlreadyRunning`]; requests are never queued.
pub struct OperationWorker<E, C> {
    controller: Arc<InstallationController<E, C>>,
    runtime: Handle,
    slots: IndexMap<OperationKind, Arc<Semaphore>>,
}

impl<E, C> OperationWorker<E, C>
where
    E: BaseExtractor + 'static,
    C: GameClient + 'static,
{
    pub fn new(controller: Arc<InstallationController<E, C>>, runtime: Handle) -> Self {
        let slots = OperationKind::ALL
            .into_iter()
            .map(|kind| {
                (
                    kind,
                    Arc::new(Semaphore::new(MAX_CONCURRENT_OPERATIONS_PER_KIND)),
                )
            })
            .collect();
        Self {
            controller,
            runtime,
            slots,
        }
    }

    pub fn controller(&self) -> &Arc<InstallationController<E, C>> {
        &self.controller
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.controller.cancel_handle()
    }

    /// Whether an operation of `kind` is in flight.
    pub fn is_running(&self, kind: OperationKind) -> bool {
        self.slots
            .get(&kind)
            .is_some_and(|slot| slot.available_permits() == 0)
    }

    fn submit<F, Fut, T>(
        &self,
        kind: OperationKind,
        operation: F,
    ) -> Result<JoinHandle<Result<T, InstallError>>, InstallError>
    where
        F: FnOnce(Arc<InstallationController<E, C>>) -> Fut,
        Fut: Future<Output = Result<T, InstallError>> + Send + 'static,
        T: Send + 'static,
    {
        let slot = self
            .slots
            .get(&kind)
            .ok_or(InstallError::AlreadyRunning(kind))?;
        let permit = Arc::clone(slot).try_acquire_owned().map_err(|_| {
            tracing::warn!("Rejected {} request: one is already running", kind);
            InstallError::AlreadyRunning(kind)
        })?;

        let task = operation(Arc::clone(&self.controller));
        Ok(self.runtime.spawn(async move {
            let _permit = permit;
            task.await
        }))
    }

    pub fn install(
        &self,
        request: InstallRequest,
    ) -> Result<JoinHandle<Result<Installed, InstallError>>, InstallError> {
        self.submit(OperationKind::Install, move |controller| async move {
            controller.install(request).await
        })
    }

    pub fn import(
        &self,
        request: ImportRequest,
    ) -> Result<JoinHandle<Result<Imported, InstallError>>, InstallError> {
        self.submit(OperationKind::Import, move |controller| async move {
            controller.import(request).await
        })
    }

    pub fn uninstall(
        &self,
        version: String,
        delete_profile: bool,
    ) -> Result<JoinHandle<Result<Uninstalled, InstallError>>, InstallError> {
        self.submit(OperationKind::Uninstall, move |controller| async move {
            controller.uninstall(&version, delete_profile).await
        })
    }
}
