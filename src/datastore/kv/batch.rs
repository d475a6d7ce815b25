use std::collections::BTreeMap;

/// Writes buffered between `begin_block` and `commit_block`. `None` marks a
/// deletion, so reads through the batch shadow the committed data.
#[derive(Debug, Default)]
pub(crate) struct Batch {
  pub(crate) strings: BTreeMap<String, Option<String>>,
  pub(crate) hashes: BTreeMap<(String, String), Option<String>>,
  pub(crate) sets: BTreeMap<(String, String), bool>,
  pub(crate) zsets: BTreeMap<(String, String), Option<f64>>,
}

fn entries<'a, V>(
  map: &'a BTreeMap<(String, String), V>,
  key: &'a str,
) -> impl Iterator<Item = (&'a str, &'a V)> + 'a {
  map
    .range((key.to_string(), String::new())..)
    .take_while(move |((k, _), _)| k == key)
    .map(|((_, member), value)| (member.as_str(), value))
}

impl Batch {
  pub(crate) fn set(&mut self, key: &str, value: Option<&str>) {
    self
      .strings
      .insert(key.to_string(), value.map(str::to_string));
  }

  pub(crate) fn hash_set(&mut self, key: &str, field: &str, value: Option<&str>) {
    self.hashes.insert(
      (key.to_string(), field.to_string()),
      value.map(str::to_string),
    );
  }

  pub(crate) fn set_member(&mut self, key: &str, member: &str, present: bool) {
    self
      .sets
      .insert((key.to_string(), member.to_string()), present);
  }

  pub(crate) fn sorted_set_member(&mut self, key: &str, member: &str, score: Option<f64>) {
    self
      .zsets
      .insert((key.to_string(), member.to_string()), score);
  }

  /// `Some` when the batch holds a write for `key`.
  pub(crate) fn get(&self, key: &str) -> Option<Option<String>> {
    self.strings.get(key).cloned()
  }

  pub(crate) fn hash_get(&self, key: &str, field: &str) -> Option<Option<String>> {
    self
      .hashes
      .get(&(key.to_string(), field.to_string()))
      .cloned()
  }

  pub(crate) fn merge_hash(
    &self,
    key: &str,
    committed: Vec<(String, String)>,
  ) -> Vec<(String, String)> {
    let mut fields = committed.into_iter().collect::<BTreeMap<_, _>>();
    for (field, value) in entries(&self.hashes, key) {
      match value {
        Some(value) => fields.insert(field.to_string(), value.clone()),
        None => fields.remove(field),
      };
    }
    fields.into_iter().collect()
  }

  pub(crate) fn merge_set(&self, key: &str, committed: Vec<String>) -> Vec<String> {
    let mut members = committed
      .into_iter()
      .collect::<std::collections::BTreeSet<_>>();
    for (member, present) in entries(&self.sets, key) {
      if *present {
        members.insert(member.to_string());
      } else {
        members.remove(member);
      }
    }
    members.into_iter().collect()
  }

  /// Merges a committed score range with the buffered members of `key`. A
  /// buffered member replaces its committed entry, in or out of the range.
  pub(crate) fn merge_sorted_set(
    &self,
    key: &str,
    min: f64,
    max: f64,
    committed: Vec<(String, f64)>,
  ) -> Vec<(String, f64)> {
    let buffered = entries(&self.zsets, key).collect::<BTreeMap<_, _>>();
    let mut members = committed
      .into_iter()
      .filter(|(member, _)| !buffered.contains_key(member.as_str()))
      .collect::<Vec<_>>();
    for (member, score) in buffered {
      if let Some(score) = score {
        if *score >= min && *score <= max {
          members.push((member.to_string(), *score));
        }
      }
    }
    members
  }
}
