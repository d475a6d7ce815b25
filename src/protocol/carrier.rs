use super::{scheduler::Candidate, BlockContext, ChunkWalker, Content, Inscription};
use crate::datastore::{address_from_script, Carrier, DataStoreReadWrite};
use bitcoin::{OutPoint, Transaction};

/// Address owning output 0 of `tx`.
pub(crate) fn output_owner(tx: &Transaction, context: BlockContext) -> Option<String> {
  address_from_script(&tx.output.first()?.script_pubkey, context.network)
}

/// Starts tracking the output that carries a freshly revealed inscription.
/// Incomplete chunked inscriptions are carried by the tail of their chain.
pub(crate) async fn watch<N: DataStoreReadWrite>(
  store: &N,
  context: BlockContext,
  walker: &ChunkWalker,
  tx: &Transaction,
  inscription: &Inscription,
) -> Result<(), N::Error> {
  if !inscription.is_watched() {
    return Ok(());
  }

  let carrier_tx = match &inscription.content {
    Content::Chunked(asset) => asset.tail().and_then(|txid| walker.transaction(&txid)),
    _ => Some(tx),
  };

  let Some(carrier_tx) = carrier_tx else {
    log::debug!("no carrier transaction for {}", inscription.id);
    return Ok(());
  };

  let Some(address) = output_owner(carrier_tx, context) else {
    log::debug!(
      "carrier of {} pays to a script without address, not watched",
      inscription.id
    );
    return Ok(());
  };

  let outpoint = OutPoint {
    txid: carrier_tx.txid(),
    vout: 0,
  };

  store
    .insert_carrier(
      &outpoint,
      &Carrier {
        inscription_id: inscription.id,
        address,
      },
    )
    .await
}

/// Handles `spender` spending `outpoint`. Returns the transfer candidate the
/// spend raises, if any. A carrier record is consumed exactly once.
pub(crate) async fn detect_spend<N: DataStoreReadWrite>(
  store: &N,
  context: BlockContext,
  walker: &ChunkWalker,
  spender: &Transaction,
  tx_index: u32,
  input_index: u32,
) -> Result<Option<Candidate>, N::Error> {
  let Some(outpoint) = spender
    .input
    .get(input_index as usize)
    .map(|input| input.previous_output)
  else {
    return Ok(None);
  };

  let Some(carrier) = store.get_carrier(&outpoint).await? else {
    return Ok(None);
  };
  store.remove_carrier(&outpoint).await?;

  let Some(mut inscription) = store.get_inscription(&carrier.inscription_id).await? else {
    log::debug!(
      "carrier {}:{} points to unknown inscription {}",
      outpoint.txid,
      outpoint.vout,
      carrier.inscription_id
    );
    return Ok(None);
  };

  if let Content::Chunked(asset) = &mut inscription.content {
    if !asset.complete {
      let chain = walker.walk(spender, false);
      asset.extend(chain.txids, chain.complete);
      let complete = asset.complete;
      let tail = asset.tail().and_then(|txid| walker.transaction(&txid));

      store.save_inscription(&inscription).await?;

      let Some(tail) = tail else {
        return Ok(None);
      };
      let Some(owner) = output_owner(tail, context) else {
        log::debug!("tail of {} pays to a script without address", inscription.id);
        return Ok(None);
      };

      store
        .insert_carrier(
          &OutPoint {
            txid: tail.txid(),
            vout: 0,
          },
          &Carrier {
            inscription_id: inscription.id,
            address: owner.clone(),
          },
        )
        .await?;

      if !complete {
        return Ok(None);
      }

      log::debug!("chunked inscription {} completed", inscription.id);
      return Ok(Some(Candidate {
        inscription,
        tx_index,
        input_index,
        receiver: owner,
        sender: None,
      }));
    }
  }

  let Some(receiver) = output_owner(spender, context) else {
    log::debug!(
      "transfer of {} to a script without address skipped",
      inscription.id
    );
    return Ok(None);
  };

  Ok(Some(Candidate {
    inscription,
    tx_index,
    input_index,
    receiver,
    sender: Some(carrier.address),
  }))
}
