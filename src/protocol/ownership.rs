use super::{Error, LedgerMode};
use crate::datastore::{DataStoreReadWrite, LedgerError, Ownership, TransferEvent};

/// Registers a first holder, or moves the key to `event.receiver` when the
/// owning inscription is transferred.
pub(crate) async fn process_pending<N: DataStoreReadWrite>(
  store: &N,
  mode: LedgerMode,
  event: &TransferEvent,
) -> Result<(), Error<N>> {
  log::debug!("{} ownership event: {:?}", event.protocol, event);
  let holder = store
    .get_owner(event.protocol, &event.subject)
    .await
    .map_err(|e| Error::DataStore(e))?;

  match (&event.sender, holder) {
    (None, Some(_)) => {
      return Err(Error::Ledger(LedgerError::DuplicateRegistration(
        event.subject.clone(),
      )))
    }
    (None, None) => {}
    (Some(_), None) => {
      return Err(Error::Ledger(LedgerError::OwnershipNotFound(
        event.subject.clone(),
      )))
    }
    (Some(_), Some(holder)) => {
      if holder.inscription_id != event.inscription_id {
        return Err(Error::Ledger(LedgerError::NotOwner {
          key: event.subject.clone(),
          inscription_id: event.inscription_id,
        }));
      }
      store
        .remove_ownership(&holder)
        .await
        .map_err(|e| Error::DataStore(e))?;
    }
  }

  store
    .insert_ownership(&Ownership {
      protocol: event.protocol,
      key: event.subject.clone(),
      address: event.receiver.clone(),
      inscription_id: event.inscription_id,
      pending: mode == LedgerMode::Streaming,
      timestamp: event.timestamp,
    })
    .await
    .map_err(|e| Error::DataStore(e))?;

  Ok(())
}

pub(crate) async fn process_confirm<N: DataStoreReadWrite>(
  store: &N,
  event: &TransferEvent,
) -> Result<(), Error<N>> {
  let holder = store
    .get_owner(event.protocol, &event.subject)
    .await
    .map_err(|e| Error::DataStore(e))?
    .filter(|holder| {
      holder.address == event.receiver && holder.inscription_id == event.inscription_id
    })
    .ok_or_else(|| LedgerError::OwnershipNotFound(event.subject.clone()))?;

  store
    .insert_ownership(&holder.confirm())
    .await
    .map_err(|e| Error::DataStore(e))?;

  Ok(())
}
