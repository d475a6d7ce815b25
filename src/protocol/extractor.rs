use super::{
  dns::Registration,
  dogemap::Claim,
  drc20::Operation,
  envelope::{tokenize, Envelope},
  BlockContext, ChunkWalker, ChunkedAsset, Content, Inscription, ProtocolKind,
};
use crate::{Config, InscriptionId};
use bitcoin::Transaction;
use serde_json::{Map, Value};

/// Media types that may carry JSON or dogemap payloads.
pub const TEXT_MEDIA_TYPES: [&str; 2] = ["text/plain", "application/json"];

/// Fields that must hold JSON strings when present.
const STRING_FIELDS: [&str; 8] = ["p", "op", "max", "lim", "amt", "tick", "type", "name"];

/// Reads the inscription, if any, revealed by the first input of `tx`.
pub fn extract(
  tx: &Transaction,
  context: BlockContext,
  walker: &ChunkWalker,
  config: &Config,
) -> Option<Inscription> {
  if tx.is_coin_base() {
    return None;
  }

  let envelope = Envelope::from_tokens(&tokenize(&tx.input.first()?.script_sig))?;
  let content = classify(&envelope, tx, walker);

  let inscription = Inscription {
    id: InscriptionId::from(tx.txid()),
    content_type: envelope.content_type,
    height: context.blockheight,
    timestamp: context.blocktime,
    content,
  };

  if !config.is_protocol_enabled(inscription.protocol()) {
    log::debug!(
      "skip {} inscription {}: protocol disabled",
      inscription.protocol(),
      inscription.id
    );
    return None;
  }

  Some(inscription)
}

fn classify(envelope: &Envelope, tx: &Transaction, walker: &ChunkWalker) -> Content {
  let text = TEXT_MEDIA_TYPES.contains(&envelope.media_type());

  if text {
    if let Some(json) = string_fields_object(&envelope.payload) {
      match Operation::from_json(&json) {
        Ok(operation) => return Content::Token(operation),
        Err(e) => log::trace!("not a drc20 payload: {e}"),
      }
      match Registration::from_json(&json) {
        Ok(registration) => return Content::Name(registration),
        Err(e) => log::trace!("not a dns payload: {e}"),
      }
    }

    if let Some(claim) = Claim::parse(&envelope.payload) {
      return Content::Numbered(claim);
    }
  }

  let chain = walker.walk(tx, true);
  Content::Chunked(ChunkedAsset {
    txids: chain.txids,
    complete: chain.complete,
  })
}

fn string_fields_object(payload: &str) -> Option<Map<String, Value>> {
  match serde_json::from_str::<Value>(payload).ok()? {
    Value::Object(map)
      if STRING_FIELDS
        .iter()
        .all(|field| map.get(*field).map_or(true, Value::is_string)) =>
    {
      Some(map)
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{protocol::drc20::Num, Network};
  use bitcoin::{
    absolute::LockTime,
    block::{Header, Version},
    hashes::Hash,
    script::{Builder, PushBytesBuf},
    Block, BlockHash, CompactTarget, OutPoint, ScriptBuf, Sequence, TxIn, hash_types::TxMerkleNode, TxOut,
    Txid, Witness,
  };
  use std::sync::Arc;

  fn push(bytes: &[u8]) -> PushBytesBuf {
    PushBytesBuf::try_from(bytes.to_vec()).unwrap()
  }

  fn reveal(content_type: &str, payload: &str) -> Transaction {
    let script_sig = Builder::new()
      .push_slice(push(b"ord"))
      .push_int(1)
      .push_slice(push(content_type.as_bytes()))
      .push_int(0)
      .push_slice(push(payload.as_bytes()))
      .into_script();

    Transaction {
      version: 1,
      lock_time: LockTime::ZERO,
      input: vec![TxIn {
        previous_output: OutPoint {
          txid: Txid::from_byte_array([9; 32]),
          vout: 0,
        },
        script_sig,
        sequence: Sequence::MAX,
        witness: Witness::new(),
      }],
      output: vec![TxOut {
        value: 100_000,
        script_pubkey: ScriptBuf::new(),
      }],
    }
  }

  fn run(tx: &Transaction, config: &Config) -> Option<Inscription> {
    let walker = ChunkWalker::new(Arc::new(Block {
      header: Header {
        version: Version::ONE,
        prev_blockhash: BlockHash::all_zeros(),
        merkle_root: TxMerkleNode::all_zeros(),
        time: 0,
        bits: CompactTarget::from_consensus(0),
        nonce: 0,
      },
      txdata: vec![tx.clone()],
    }));
    let context = BlockContext {
      network: Network::Mainnet,
      blockheight: 100,
      blocktime: 1_700_000_000,
    };
    extract(tx, context, &walker, config)
  }

  fn protocol(content_type: &str, payload: &str) -> Option<ProtocolKind> {
    run(&reveal(content_type, payload), &Config::default()).map(|i| i.protocol())
  }

  #[test]
  fn test_token_mint() {
    let tx = reveal(
      "text/plain;charset=utf-8",
      r#"{"p":"drc-20","op":"mint","tick":"DOGI","amt":"10"}"#,
    );
    let inscription = run(&tx, &Config::default()).unwrap();
    assert_eq!(inscription.id, InscriptionId::from(tx.txid()));
    assert_eq!(inscription.content_type, "text/plain;charset=utf-8");
    assert_eq!(inscription.height, 100);
    match inscription.content {
      Content::Token(Operation::Mint(mint)) => {
        assert_eq!(mint.tick.as_str(), "dogi");
        assert_eq!(mint.amt, Num::from(10));
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn test_routing() {
    assert_eq!(
      protocol("application/json", r#"{"p":"dns","op":"reg","name":"wow.doge"}"#),
      Some(ProtocolKind::Name)
    );
    assert_eq!(
      protocol("text/plain", "1234.dogemap"),
      Some(ProtocolKind::Numbered)
    );
    assert_eq!(protocol("image/png", "binary"), Some(ProtocolKind::Chunked));
  }

  #[test]
  fn test_json_on_other_media_type_is_chunked() {
    assert_eq!(
      protocol(
        "image/svg+xml",
        r#"{"p":"drc-20","op":"mint","tick":"dogi","amt":"10"}"#
      ),
      Some(ProtocolKind::Chunked)
    );
  }

  #[test]
  fn test_invalid_token_falls_through() {
    assert_eq!(
      protocol("text/plain", r#"{"p":"drc-20","op":"mint","tick":"dogi","amt":"-1"}"#),
      Some(ProtocolKind::Chunked)
    );
  }

  #[test]
  fn test_non_string_field_is_not_token() {
    assert_eq!(
      protocol("text/plain", r#"{"p":"drc-20","op":"mint","tick":"dogi","amt":10}"#),
      Some(ProtocolKind::Chunked)
    );
  }

  #[test]
  fn test_disabled_protocol_does_not_fall_through() {
    let config = Config {
      protocols: vec![ProtocolKind::Chunked],
      ..Default::default()
    };
    let tx = reveal("text/plain", "7.dogemap");
    assert_eq!(run(&tx, &config), None);

    let tx = reveal("image/png", "x");
    assert!(run(&tx, &config).is_some());
  }

  #[test]
  fn test_no_envelope() {
    let mut tx = reveal("text/plain", "x");
    tx.input[0].script_sig = ScriptBuf::new();
    assert_eq!(run(&tx, &Config::default()), None);
  }

  #[test]
  fn test_single_chunk_is_complete() {
    let inscription = run(&reveal("image/png", "x"), &Config::default()).unwrap();
    match inscription.content {
      Content::Chunked(asset) => assert!(asset.complete),
      other => panic!("unexpected {other:?}"),
    }
  }
}
