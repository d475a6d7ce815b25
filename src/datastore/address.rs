use crate::Network;
use bitcoin::{base58, Script};

/// Renders the Dogecoin address paying to `script`. Only P2PKH and P2SH
/// outputs have one.
pub fn address_from_script(script: &Script, network: Network) -> Option<String> {
  let bytes = script.as_bytes();

  let (prefix, hash) = if script.is_p2pkh() {
    (network.p2pkh_prefix(), &bytes[3..23])
  } else if script.is_p2sh() {
    (network.p2sh_prefix(), &bytes[2..22])
  } else {
    return None;
  };

  let mut payload = Vec::with_capacity(21);
  payload.push(prefix);
  payload.extend_from_slice(hash);

  Some(base58::encode_check(&payload))
}

#[cfg(test)]
mod tests {
  use super::*;
  use bitcoin::{hashes::Hash, PubkeyHash, ScriptBuf, ScriptHash};

  #[test]
  fn test_p2pkh_mainnet() {
    let hash = PubkeyHash::from_byte_array([7; 20]);
    let script = ScriptBuf::new_p2pkh(&hash);
    let address = address_from_script(&script, Network::Mainnet).unwrap();
    assert!(address.starts_with('D'));

    let decoded = base58::decode_check(&address).unwrap();
    assert_eq!(decoded[0], 0x1e);
    assert_eq!(&decoded[1..], &[7; 20]);
  }

  #[test]
  fn test_p2pkh_testnet() {
    let script = ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([7; 20]));
    let address = address_from_script(&script, Network::Testnet).unwrap();
    assert_eq!(base58::decode_check(&address).unwrap()[0], 0x71);
  }

  #[test]
  fn test_p2sh_mainnet() {
    let script = ScriptBuf::new_p2sh(&ScriptHash::from_byte_array([9; 20]));
    let address = address_from_script(&script, Network::Mainnet).unwrap();

    let decoded = base58::decode_check(&address).unwrap();
    assert_eq!(decoded[0], 0x16);
    assert_eq!(&decoded[1..], &[9; 20]);
  }

  #[test]
  fn test_unsupported_script() {
    assert_eq!(address_from_script(&ScriptBuf::new(), Network::Mainnet), None);
  }
}
