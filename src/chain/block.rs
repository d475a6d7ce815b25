use crate::Result;
use bitcoin::{
  block::Header, consensus::Decodable, Block, BlockHash, Transaction, hash_types::TxMerkleNode,
};
use std::io::Cursor;

/// Set in the version of merge-mined headers, which are followed by a proof
/// of work from the parent chain.
const AUXPOW_VERSION_FLAG: i32 = 1 << 8;

/// Decodes a serialized Dogecoin block, skipping the AuxPoW section of
/// merge-mined blocks.
pub fn decode_block(bytes: &[u8]) -> Result<Block> {
  let mut cursor = Cursor::new(bytes);
  let header = Header::consensus_decode(&mut cursor)?;

  if header.version.to_consensus() & AUXPOW_VERSION_FLAG != 0 {
    // parent coinbase, parent hash, coinbase branch, chain branch, parent header
    Transaction::consensus_decode(&mut cursor)?;
    BlockHash::consensus_decode(&mut cursor)?;
    Vec::<TxMerkleNode>::consensus_decode(&mut cursor)?;
    u32::consensus_decode(&mut cursor)?;
    Vec::<TxMerkleNode>::consensus_decode(&mut cursor)?;
    u32::consensus_decode(&mut cursor)?;
    Header::consensus_decode(&mut cursor)?;
  }

  let txdata = Vec::<Transaction>::consensus_decode(&mut cursor)?;

  Ok(Block { header, txdata })
}

#[cfg(test)]
mod tests {
  use super::*;
  use bitcoin::{
    absolute::LockTime,
    block::Version,
    consensus::{serialize, Encodable},
    hashes::Hash,
    CompactTarget, OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Witness,
  };

  fn header(version: i32) -> Header {
    Header {
      version: Version::from_consensus(version),
      prev_blockhash: BlockHash::from_byte_array([1; 32]),
      merkle_root: TxMerkleNode::from_byte_array([2; 32]),
      time: 1_700_000_000,
      bits: CompactTarget::from_consensus(0x1e0f_ffff),
      nonce: 7,
    }
  }

  fn transaction(n: u8) -> Transaction {
    Transaction {
      version: 1,
      lock_time: LockTime::ZERO,
      input: vec![TxIn {
        previous_output: OutPoint::null(),
        script_sig: ScriptBuf::from_bytes(vec![n, n]),
        sequence: Sequence::MAX,
        witness: Witness::new(),
      }],
      output: vec![TxOut {
        value: 5_000,
        script_pubkey: ScriptBuf::new(),
      }],
    }
  }

  #[test]
  fn test_plain_block() {
    let block = Block {
      header: header(2),
      txdata: vec![transaction(1), transaction(2)],
    };
    assert_eq!(decode_block(&serialize(&block)).unwrap(), block);
  }

  #[test]
  fn test_merge_mined_block() {
    let header = header(0x0062_0104);
    let txdata = vec![transaction(1), transaction(2)];

    let mut bytes = Vec::new();
    header.consensus_encode(&mut bytes).unwrap();
    transaction(9).consensus_encode(&mut bytes).unwrap();
    BlockHash::from_byte_array([3; 32])
      .consensus_encode(&mut bytes)
      .unwrap();
    vec![TxMerkleNode::from_byte_array([4; 32])]
      .consensus_encode(&mut bytes)
      .unwrap();
    0u32.consensus_encode(&mut bytes).unwrap();
    Vec::<TxMerkleNode>::new()
      .consensus_encode(&mut bytes)
      .unwrap();
    0u32.consensus_encode(&mut bytes).unwrap();
    self::header(0x2000_0000)
      .consensus_encode(&mut bytes)
      .unwrap();
    txdata.consensus_encode(&mut bytes).unwrap();

    let block = decode_block(&bytes).unwrap();
    assert_eq!(block.header, header);
    assert_eq!(block.txdata, txdata);
    assert_eq!(block.block_hash(), header.block_hash());
  }

  #[test]
  fn test_truncated_block() {
    let bytes = serialize(&header(2));
    assert!(decode_block(&bytes[..40]).is_err());
  }
}
