use super::envelope::{tokenize, ScriptToken};
use bitcoin::{Block, OutPoint, Transaction, Txid};
use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

/// Transactions of a chunked payload found so far, in chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkChain {
  pub txids: Vec<Txid>,
  pub complete: bool,
}

impl ChunkChain {
  pub fn tail(&self) -> Option<Txid> {
    self.txids.last().copied()
  }
}

/// Follows chunk chains within one block. A chain continues into the
/// transaction whose first input spends output 0 of the current one.
pub struct ChunkWalker {
  block: Arc<Block>,
  positions: HashMap<Txid, usize>,
  spenders: HashMap<OutPoint, usize>,
}

impl ChunkWalker {
  pub fn new(block: Arc<Block>) -> Self {
    let mut positions = HashMap::new();
    let mut spenders = HashMap::new();

    for (index, tx) in block.txdata.iter().enumerate() {
      positions.insert(tx.txid(), index);
      if let Some(input) = tx.input.first() {
        spenders.entry(input.previous_output).or_insert(index);
      }
    }

    Self {
      block,
      positions,
      spenders,
    }
  }

  pub fn transaction(&self, txid: &Txid) -> Option<&Transaction> {
    self
      .positions
      .get(txid)
      .and_then(|index| self.block.txdata.get(*index))
  }

  pub fn walk(&self, tx: &Transaction, genesis: bool) -> ChunkChain {
    let mut txids = Vec::new();
    let mut visited = HashSet::new();
    let mut current = tx;
    let mut genesis = genesis;

    loop {
      let txid = current.txid();
      if !visited.insert(txid) {
        return ChunkChain {
          txids,
          complete: false,
        };
      }
      txids.push(txid);

      let numbers = chunk_numbers(current, genesis);
      if numbers.len() <= 2 {
        break;
      }

      let stride = numbers[0] - numbers[1];
      let mut last = numbers[0];
      for number in &numbers[1..] {
        if *number != last - stride {
          break;
        }
        last = *number;
      }

      if last <= 0 {
        break;
      }

      match self
        .spenders
        .get(&OutPoint { txid, vout: 0 })
        .and_then(|index| self.block.txdata.get(*index))
      {
        Some(next) => {
          current = next;
          genesis = false;
        }
        None => {
          return ChunkChain {
            txids,
            complete: false,
          }
        }
      }
    }

    ChunkChain {
      txids,
      complete: true,
    }
  }
}

/// Numeric tokens of the first input at odd positions for a genesis and even
/// positions for a continuation.
fn chunk_numbers(tx: &Transaction, genesis: bool) -> Vec<i64> {
  let Some(input) = tx.input.first() else {
    return Vec::new();
  };

  tokenize(&input.script_sig)
    .iter()
    .enumerate()
    .filter(|(position, _)| (position % 2 == 1) == genesis)
    .filter_map(|(_, token)| ScriptToken::as_number(token))
    .collect()
}
