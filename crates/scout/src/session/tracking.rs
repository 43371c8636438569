use chrono::NaiveDate;

use crate::search::Candidate;
use crate::userdata::TrackedPerson;

const DEFAULT_PHOTO_IDS: [u32; 6] = [774909, 2379004, 1239291, 1681010, 1043471, 1181686];

/// Stable stand-in photo for candidates without one, picked from the name.
pub fn default_profile_photo(name: &str) -> String {
  let id = DEFAULT_PHOTO_IDS[(name_hash(name) % DEFAULT_PHOTO_IDS.len() as u64) as usize];
  format!(
    "https://images.pexels.com/photos/{id}/pexels-photo-{id}.jpeg?auto=compress&cs=tinysrgb&w=150&h=150&fit=crop"
  )
}

fn name_hash(name: &str) -> u64 {
  name.chars().map(|c| c as u64).sum()
}

/// Score used when the backend sent no behavioral data: somewhere in
/// `floor..floor + 40`, derived from the identity key so it never changes.
fn fallback_score(key: &str, floor: u8, salt: u64) -> u8 {
  floor + ((name_hash(key).wrapping_add(salt)) % 40) as u8
}

/// Build the entry created the first time a candidate is tracked.
pub fn tracked_person_from(candidate: &Candidate, query: &str, today: NaiveDate) -> TrackedPerson {
  let key = candidate.identity_key().to_string();
  let date = today.format("%Y-%m-%d").to_string();
  let scores = candidate.behavioral_data.as_ref().map(|b| &b.scores);

  TrackedPerson {
    id: key.clone(),
    name: candidate.name.clone(),
    title: candidate.title.clone(),
    company: candidate.company.clone(),
    profile_photo: candidate
      .profile_photo_url
      .clone()
      .filter(|url| !url.is_empty())
      .unwrap_or_else(|| default_profile_photo(&candidate.name)),
    tracked_since: date.clone(),
    last_event: date,
    is_tracking: true,
    tracking_reason: format!("Added from search: \"{query}\""),
    cmi: scores.map(|s| s.cmi.score).unwrap_or_else(|| fallback_score(&key, 60, 0)),
    rbfs: scores.map(|s| s.rbfs.score).unwrap_or_else(|| fallback_score(&key, 30, 1)),
    ias: scores.map(|s| s.ias.score).unwrap_or_else(|| fallback_score(&key, 60, 2)),
  }
}

/// Flip or create the entry for `candidate`. Returns the changed record.
pub fn toggle(
  tracked: &mut Vec<TrackedPerson>,
  candidate: &Candidate,
  query: &str,
  today: NaiveDate,
) -> TrackedPerson {
  let key = candidate.identity_key();
  if let Some(existing) = tracked.iter_mut().find(|p| p.id == key) {
    existing.is_tracking = !existing.is_tracking;
    return existing.clone();
  }

  let person = tracked_person_from(candidate, query, today);
  tracked.push(person.clone());
  person
}
