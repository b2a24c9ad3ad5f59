use bytes::Bytes;

use crate::error::ImportError;

/// Turns one complete payload into host scene objects.
///
/// Called on the host's primary thread from
/// [`IngestionController::poll_once`](crate::IngestionController::poll_once),
/// never from the listener thread.
pub trait PayloadImporter: Send + Sync + 'static {
    fn import(&self, payload: &Bytes) -> Result<(), ImportError>;
}

/// [`PayloadImporter`] backed by a closure.
pub struct FnImporter<F>(F);

/// Wrap a closure as a [`PayloadImporter`].
pub fn importer_fn<F>(f: F) -> FnImporter<F>
where
    F: Fn(&Bytes) -> Result<(), ImportError> + Send + Sync + 'static,
{
    FnImporter(f)
}

impl<F> PayloadImporter for FnImporter<F>
where
    F: Fn(&Bytes) -> Result<(), ImportError> + Send + Sync + 'static,
{
    fn import(&self, payload: &Bytes) -> Result<(), ImportError> {
        (self.0)(payload)
    }
}

impl<T: PayloadImporter + ?Sized> PayloadImporter for Box<T> {
    fn import(&self, payload: &Bytes) -> Result<(), ImportError> {
        (**self).import(payload)
    }
}
