use chrono::{DateTime, Local, Utc};
use colored::*;

use crate::integrations::Integration;
use crate::output;
use crate::search::{Candidate, EvidenceStats, EvidenceUrl, FinderStatus, SearchRecord};
use crate::session::SessionState;
use crate::userdata::{Exclusion, HistoryItem, TrackedPerson};

const WIDTH: usize = 80;

/// Convert UTC timestamp to a readable local time
pub fn format_timestamp(utc_time: DateTime<Utc>) -> String {
  let local_time: DateTime<Local> = utc_time.into();
  local_time.format("%A, %B %d, %Y at %I:%M %p").to_string()
}

/// First and last initials, or `?` for an empty name.
pub fn initials(name: &str) -> String {
  let parts: Vec<&str> = name.split_whitespace().collect();
  let first_char = |s: &str| s.chars().next().map(|c| c.to_uppercase().collect::<String>()).unwrap_or_default();

  match parts.as_slice() {
    [] => "?".to_string(),
    [only] => first_char(only),
    [first, .., last] => format!("{}{}", first_char(first), first_char(last)),
  }
}

/// Only http, https and mailto links are ever printed as links.
pub fn is_safe_url(raw: &str) -> bool {
  url::Url::parse(raw).is_ok_and(|url| matches!(url.scheme(), "http" | "https" | "mailto"))
}

/// Drop anything that looks like markup from backend-supplied text.
pub fn strip_markup(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut in_tag = false;
  for c in text.chars() {
    match c {
      '<' => in_tag = true,
      '>' if in_tag => in_tag = false,
      _ if !in_tag => out.push(c),
      _ => {}
    }
  }
  out
}

fn score_bar(score: u8) -> String {
  let filled = (score.min(100) as usize) / 5;
  format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled))
}

fn colored_score(score: u8) -> ColoredString {
  let text = format!("{score:>3}");
  match score {
    80..=u8::MAX => text.green().bold(),
    60..=79 => text.yellow(),
    _ => text.red(),
  }
}

pub fn display_search_record(record: &SearchRecord, state: &SessionState) {
  output::announce(&format!("Results for \"{}\"", strip_markup(&record.prompt)));

  if let Some(filters) = &record.filters {
    if !filters.reasoning.is_empty() {
      output::info(&strip_markup(&filters.reasoning));
    }
  }
  if let Some(count) = record.estimated_count {
    output::info(&format!("Estimated matching profiles: {count}"));
  }

  if record.candidates.is_empty() {
    output::warn("No candidates found for this search");
    return;
  }

  for (index, candidate) in record.candidates.iter().enumerate() {
    display_candidate(index + 1, candidate, state.is_tracking(candidate));
  }
}

pub fn display_candidate(position: usize, candidate: &Candidate, tracking: bool) {
  let marker = if tracking { "[tracking]".green().to_string() } else { String::new() };
  let header = format!(
    "#{position} ({}) {} | {} at {} {marker}",
    initials(&candidate.name),
    strip_markup(&candidate.name).bold(),
    strip_markup(&candidate.title),
    strip_markup(&candidate.company),
  );
  output::as_banner(|msg| println!("{msg}"), header.trim_end(), WIDTH, '-');

  println!("Match: {}%  Key: {}", colored_score(candidate.accuracy), candidate.identity_key());
  if let Some(location) = &candidate.location {
    println!("Location: {}", strip_markup(location));
  }
  if let Some(email) = candidate.email.as_deref().filter(|e| is_safe_url(&format!("mailto:{e}"))) {
    println!("Email: {email}");
  }
  if let Some(linkedin) = candidate.linkedin_url.as_deref().filter(|u| is_safe_url(u)) {
    println!("LinkedIn: {linkedin}");
  }

  if !candidate.reasons.is_empty() {
    println!("Why:");
    for reason in &candidate.reasons {
      println!("  - {}", strip_markup(reason));
    }
  }

  if let Some(behavioral) = &candidate.behavioral_data {
    if !behavioral.behavioral_insight.is_empty() {
      println!("Insight: {}", strip_markup(&behavioral.behavioral_insight));
    }
    let scores = &behavioral.scores;
    for (label, score) in [("CMI ", &scores.cmi), ("RBFS", &scores.rbfs), ("IAS ", &scores.ias)] {
      println!("  {label} {} {}  {}", colored_score(score.score), score_bar(score.score), strip_markup(&score.explanation));
    }
  }

  display_evidence(candidate);
}

fn display_evidence(candidate: &Candidate) {
  if candidate.evidence_urls.is_empty() {
    return;
  }

  let confidence = candidate.evidence_confidence.map(|c| format!(" ({:.0}% confidence)", c * 100.0)).unwrap_or_default();
  println!("Evidence{confidence}:");
  if let Some(summary) = &candidate.evidence_summary {
    println!("  {}", strip_markup(summary));
  }
  for evidence in &candidate.evidence_urls {
    display_evidence_url(evidence);
  }
}

fn display_evidence_url(evidence: &EvidenceUrl) {
  let link = if is_safe_url(&evidence.url) { evidence.url.as_str() } else { "(link withheld)" };
  println!(
    "  * [{}|{:?}] {} - {}",
    evidence.evidence_type.as_str(),
    evidence.confidence_level,
    strip_markup(&evidence.title),
    link
  );
  if !evidence.supporting_explanation.is_empty() {
    println!("      {}", strip_markup(&evidence.supporting_explanation));
  }
}

pub fn display_history(items: &[HistoryItem]) {
  if items.is_empty() {
    output::info("No search history yet");
    return;
  }

  output::announce("Search History");
  for item in items {
    let status = match (&item.results, &item.error) {
      (Some(record), _) => format!("{} candidates", record.candidates.len()).green(),
      (None, Some(_)) => "failed".red(),
      (None, None) => "no results stored".dimmed(),
    };
    println!("{}  {}  \"{}\"  {}", item.id.dimmed(), format_timestamp(item.timestamp), item.query, status);
  }
}

pub fn display_tracked(people: &[TrackedPerson]) {
  if people.is_empty() {
    output::info("Nobody is being tracked");
    return;
  }

  output::announce("Tracked People");
  for person in people {
    let status = if person.is_tracking { "tracking".green() } else { "paused".yellow() };
    println!("({}) {} | {} at {} [{}]", initials(&person.name), person.name.bold(), person.title, person.company, status);
    println!(
      "    id: {}  since {}  last event {}  CMI {} RBFS {} IAS {}",
      person.id, person.tracked_since, person.last_event, person.cmi, person.rbfs, person.ias
    );
    println!("    {}", person.tracking_reason.dimmed());
  }
}

pub fn display_stats(stats: &EvidenceStats) {
  output::announce("Evidence Finder");
  let status = match stats.finder_status {
    FinderStatus::Available => "available".green(),
    FinderStatus::Degraded => "degraded".yellow(),
    FinderStatus::Unavailable => "unavailable".red(),
  };
  println!("Status: {status}");
  println!(
    "Domains: {}  Sources: {}  Coverage: {:.1}%",
    stats.diversity_metrics.total_domains,
    stats.diversity_metrics.unique_sources,
    stats.diversity_metrics.domain_coverage * 100.0
  );

  let perf = &stats.performance_metrics;
  println!(
    "Avg processing: {:.1}s  Success rate: {:.1}%  Evidence found: {}",
    perf.average_processing_time,
    perf.success_rate * 100.0,
    perf.total_evidence_found
  );

  let mut distribution: Vec<_> = perf.evidence_types_distribution.iter().collect();
  distribution.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
  for (kind, count) in distribution {
    println!("  {kind}: {count}");
  }
  println!("Last updated: {}", format_timestamp(stats.last_updated));
}

pub fn display_exclusions(exclusions: &[Exclusion]) {
  if exclusions.is_empty() {
    output::info("No excluded profiles");
    return;
  }

  output::announce("Excluded Profiles");
  for exclusion in exclusions {
    println!("{}  (since {})", exclusion.linkedin_url, format_timestamp(exclusion.created_at));
  }
}

pub fn display_integrations(integrations: &[Integration]) {
  output::announce("Integrations");
  for integration in integrations {
    let status = if integration.is_connected { "connected".green() } else { "not connected".dimmed() };
    println!("{} ({}) [{}]", integration.name.bold(), integration.id, status);
    println!("    {}", integration.description);
  }
}
